//! Extractors turning materialized sheets into per-source record lists.

pub mod ledger;
pub mod tabs;

pub use ledger::{LOOKAHEAD_ROWS, LedgerLayout, scan_ledger, seek_block_start};
pub use tabs::{is_client_tab, parse_client_tab, parse_client_tabs};
