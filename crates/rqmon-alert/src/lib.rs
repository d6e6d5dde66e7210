//! Threshold evaluation and alert lifecycle tracking for queue monitoring.
//!
//! [`engine`] holds the pure evaluation functions: one queue snapshot plus
//! its thresholds in, zero or more [`engine::Condition`]s out, with no side
//! effects. [`tracker`] owns the per-key state machine that decides whether
//! a condition is actually emitted (cooldown suppression) and when a
//! previously alerting queue has recovered.

pub mod engine;
pub mod tracker;


pub use engine::{
    classify_trend, evaluate, evaluate_system, queue_health, Condition, QueueHealth, QueueTrend,
    SystemThresholds,
};
pub use tracker::{AlertTracker, FireOutcome, ResolvedAlert};
