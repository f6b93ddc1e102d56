pub mod cli;
pub mod context;
pub mod error;
pub mod model;
pub mod output;
pub mod process;
pub mod record;

pub use context::Context;
pub use error::{Operation, ProcessError};
pub use process::{Backend, Process, ProcessFields};
