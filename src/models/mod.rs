pub mod attempt_log;
pub mod exam;
pub mod grading;
pub mod loaders;
pub mod review;

pub use attempt_log::{AttemptLog, AttemptOutcome, LogContext};
pub use exam::{Answer, Exam, ExamQuestion, Submission, SubmissionStatus};
pub use grading::{BatchGradingCall, GradeRequestItem, GradeResult, RubricLevel, FALLBACK_FEEDBACK};
pub use review::{AnswerReview, ReviewChange, ReviewRecord};
pub use loaders::{load_all_submission_bundles, load_submission_bundle, SubmissionBundle};
