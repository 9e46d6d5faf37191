//! Rule-Based Override System
//!
//! Fixed sensor thresholds that, when they fire, replace the simulator
//! model's verdict. When nothing fires the model decides.

mod rules;

pub use rules::{Condition, OverrideOutcome, OverridePolicy, RuleOverrideEngine, ThresholdRule, LABEL_SEPARATOR};
