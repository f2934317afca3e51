mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestCase, TestStep, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{
    read_script_sources_from_dir, read_test_case, RuleSource, ScriptSource, SubstitutionsSource,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to parse script {path}: {source}")]
    ParseScript {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .script.json files under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("Script error: {0}")]
    Script(#[from] cr_core::ScriptError),
    #[error("Step {step_index} names unregistered script \"{script}\".")]
    UnknownScript { step_index: usize, script: String },
    #[error("Expected event count {expected}, actual {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event mismatch at index {index}. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize event for diff: {0}")]
    EventSerialize(serde_json::Error),
}
