pub mod common;
pub mod data_loader;
pub mod errors;
pub mod export;
pub mod flow;
pub mod plan;
pub mod plan_execution;
