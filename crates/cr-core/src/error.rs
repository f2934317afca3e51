use thiserror::Error;

use crate::types::RuleOrigin;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleSignatureError {
    pub name: String,
    pub message: String,
}

impl RuleSignatureError {
    pub fn not_callable(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            message: format!("{} begins with '{}' but is not callable.", name, prefix),
        }
    }

    pub fn wrong_shape(name: &str, declarator: &str) -> Self {
        Self {
            name: name.to_string(),
            message: format!(
                "{} was not declared with {}() or it has the wrong number of arguments.",
                name, declarator
            ),
        }
    }

    pub fn code(&self) -> &'static str {
        "RULE_SIGNATURE_INVALID"
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing key \"{key}\" in match groups")]
    MissingKey { key: String },
    #[error("positional field \"{{{field}}}\" has no positional arguments to read")]
    PositionalField { field: String },
    #[error("field \"{field}\" uses attribute or index access, which replies do not support")]
    FieldAccess { field: String },
    #[error("single '}}' encountered in format string")]
    StrayClosingBrace,
    #[error("single '{{' encountered in format string")]
    UnclosedBrace,
    #[error("unknown conversion specifier \"{conversion}\"")]
    UnknownConversion { conversion: String },
    #[error("invalid format specifier \"{spec}\" for field \"{field}\"")]
    InvalidSpec { field: String, spec: String },
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingKey { .. } => "RESOLUTION_FORMAT_MISSING_KEY",
            Self::PositionalField { .. } => "RESOLUTION_FORMAT_POSITIONAL",
            Self::FieldAccess { .. } => "RESOLUTION_FORMAT_FIELD_ACCESS",
            Self::StrayClosingBrace | Self::UnclosedBrace => "RESOLUTION_FORMAT_BRACE",
            Self::UnknownConversion { .. } => "RESOLUTION_FORMAT_CONVERSION",
            Self::InvalidSpec { .. } => "RESOLUTION_FORMAT_SPEC",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionCause {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("weighted reply options total {total} exceeds the supported range")]
    WeightOverflow { total: u128 },
}

impl ResolutionCause {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Format(error) => error.code(),
            Self::WeightOverflow { .. } => "RESOLUTION_WEIGHT_OVERFLOW",
        }
    }
}

/// Failure while turning a candidate into a reply. `origin` is filled in by the
/// rule wrapper with the rule body that produced the candidate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{cause}{}", origin_suffix(.origin))]
pub struct ResolutionError {
    pub cause: ResolutionCause,
    pub origin: Option<RuleOrigin>,
}

fn origin_suffix(origin: &Option<RuleOrigin>) -> String {
    match origin {
        Some(origin) => format!(" in choose processing return value from {}", origin),
        None => String::new(),
    }
}

impl ResolutionError {
    pub fn with_origin(mut self, origin: RuleOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn code(&self) -> &'static str {
        self.cause.code()
    }
}

impl From<FormatError> for ResolutionError {
    fn from(error: FormatError) -> Self {
        ResolutionCause::from(error).into()
    }
}

impl From<ResolutionCause> for ResolutionError {
    fn from(cause: ResolutionCause) -> Self {
        Self {
            cause,
            origin: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error(transparent)]
    Signature(#[from] RuleSignatureError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("uservars for user \"{user}\" have no \"__topic__\" entry")]
    MissingTopic { user: String },
    #[error("uservars for user \"{user}\" hold a {found} \"__topic__\", expected string")]
    InvalidTopic { user: String, found: String },
    #[error("script \"{name}\" is already registered")]
    DuplicateScript { name: String },
    #[error("script \"{script}\" has no method named \"{method}\"")]
    UnknownMethod { script: String, method: String },
    #[error("{origin} is not a {expected} method")]
    WrongMethodKind {
        origin: RuleOrigin,
        expected: &'static str,
    },
}

impl ScriptError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Signature(error) => error.code(),
            Self::Resolution(error) => error.code(),
            Self::MissingTopic { .. } => "CONTEXT_TOPIC_MISSING",
            Self::InvalidTopic { .. } => "CONTEXT_TOPIC_INVALID",
            Self::DuplicateScript { .. } => "REGISTRY_DUPLICATE_SCRIPT",
            Self::UnknownMethod { .. } => "SCRIPT_METHOD_NOT_FOUND",
            Self::WrongMethodKind { .. } => "SCRIPT_METHOD_KIND",
        }
    }

    pub fn origin(&self) -> Option<&RuleOrigin> {
        match self {
            Self::Resolution(error) => error.origin.as_ref(),
            Self::WrongMethodKind { origin, .. } => Some(origin),
            _ => None,
        }
    }
}
