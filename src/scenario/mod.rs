pub mod context;
pub mod runner;
pub mod scenario_model;

pub use runner::ScenarioRunner;
pub use scenario_model::{ScenarioResult, ScenarioSpec};
