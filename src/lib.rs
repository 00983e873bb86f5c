pub mod backend;
pub mod browser;
pub mod cli;
pub mod error;
pub mod helpers;
pub mod reconcile;
pub mod report;
pub mod scenario;
pub mod settings;
pub mod trace;

pub use error::{SuiteError, SuiteResult};
