pub mod grading_coordinator;
pub mod grading_ctx;

pub use grading_coordinator::{merge_results, GradingCoordinator, PreparedBatch};
pub use grading_ctx::{GradingCtx, GradingMode};
