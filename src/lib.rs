//! Core library for the clientbook-tools command line application.
//!
//! The library turns legacy client workbooks into one reconciled client list.
//! Responsibilities are kept narrow and composable: the in-memory sheet model and
//! typed cell readers live under [`clientbook::tools::sheet`], the per-version field
//! tables in [`clientbook::tools::schema`], the tab and ledger extractors in
//! [`clientbook::tools::extract`], reconciliation in [`clientbook::tools::merge`],
//! IO adapters under [`clientbook::tools::io`], and the end-to-end pipelines under
//! [`clientbook::tools::sync`].

pub mod clientbook;

pub use clientbook::tools::{
    Result, ToolError, error, extract, flatten, io, merge, model, schema, sheet, sync,
};
