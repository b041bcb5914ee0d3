pub mod toml_loader;

pub use toml_loader::{load_all_submission_bundles, load_submission_bundle, SubmissionBundle};
