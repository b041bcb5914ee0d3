pub mod grading_client;
pub mod interaction_logger;
pub mod llm_service;
pub mod prompt_builder;
pub mod response_extractor;
pub mod score_normalizer;
pub mod submission_store;

pub use grading_client::{GradingClient, RetryPolicy};
pub use interaction_logger::{InteractionLogger, JsonlFileSink, LogSink, MemorySink};
pub use llm_service::{CompletionBackend, OpenAiBackend};
pub use submission_store::{JsonDirStore, MemoryStore, SubmissionStore};
