pub mod loader;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use loader::FileLoader;
pub use policy::TradingStrategy;
pub use seeds::resolve_seed_inputs;
pub use simulation::{RunRecord, StrategyResult, StrategyRunner};
