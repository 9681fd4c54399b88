pub mod pool;
pub mod scenarios;

pub use pool::WorkerPool;
pub use scenarios::{run_scenarios, Scenario, ScenarioOutcome};
