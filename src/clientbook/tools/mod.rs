pub mod error;
pub mod extract;
pub mod flatten;
pub mod io;
pub mod merge;
pub mod model;
pub mod schema;
pub mod sheet;
pub mod sync;

pub use error::{Result, ToolError};
