// src/alerting/mod.rs - Alert decisions and forecast evaluation

pub mod evaluator;
pub mod policy;

pub use evaluator::{Evaluation, ForecastEvaluator};
pub use policy::{percentage_error, AlertDecision, AlertLevel, AlertPolicy, TierScheme};
