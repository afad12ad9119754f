//! Everything after scoring: adjustment, verdict, explanations, comparison

pub mod adjust;
pub mod compare;
pub mod explain;
mod summary;

pub use adjust::{adjust, adjust_at, applicable_adjustments};
pub use compare::compare;
pub use explain::{explain, MAX_FACTORS};
pub use summary::summarize;
