pub mod error;
pub mod types;
pub mod value;

pub use error::{FormatError, ResolutionCause, ResolutionError, RuleSignatureError, ScriptError};
pub use types::*;
pub use value::*;
