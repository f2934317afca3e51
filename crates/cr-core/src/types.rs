use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::VarValue;

pub const DEFAULT_TOPIC: &str = "all";
pub const TOPIC_VAR: &str = "__topic__";
pub const RULE_PREFIX: &str = "rule";
pub const SUBSTITUTIONS_PREFIX: &str = "substitutions";
pub const DEFAULT_RULE_WEIGHT: i64 = 1;

/// Named groups captured by the pattern matcher for the rule being invoked.
pub type MatchGroups = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleOrigin {
    pub module: String,
    pub name: String,
}

impl RuleOrigin {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub pattern: String,
    #[serde(default)]
    pub previous: String,
    #[serde(default = "default_rule_weight")]
    pub weight: i64,
}

fn default_rule_weight() -> i64 {
    DEFAULT_RULE_WEIGHT
}

impl RuleMetadata {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            previous: String::new(),
            weight: DEFAULT_RULE_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionsMetadata {
    pub name: String,
    #[serde(default)]
    pub person: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub default: Option<VarValue>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<VarValue>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// Call shape of a script method: ordered parameters plus optional
/// variadic-positional and variadic-keyword catch-alls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    pub var_positional: Option<String>,
    pub var_keyword: Option<String>,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            var_positional: None,
            var_keyword: None,
        }
    }

    pub fn for_rule(metadata: &RuleMetadata) -> Self {
        Self::new(vec![
            Param::required("self"),
            Param::with_default("pattern", metadata.pattern.as_str()),
            Param::with_default("previous", metadata.previous.as_str()),
            Param::with_default("weight", metadata.weight),
        ])
    }

    pub fn for_substitutions(metadata: &SubstitutionsMetadata) -> Self {
        Self::new(vec![
            Param::required("self"),
            Param::with_default("name", metadata.name.as_str()),
            Param::with_default("person", metadata.person),
        ])
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|param| param.name.as_str()).collect()
    }

    pub fn default_count(&self) -> usize {
        self.params
            .iter()
            .filter(|param| param.default.is_some())
            .count()
    }

    pub fn default_of(&self, name: &str) -> Option<&VarValue> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .and_then(|param| param.default.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyOption {
    Plain(String),
    Weighted(String, i64),
}

impl ReplyOption {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Weighted(text, _) => text.as_str(),
        }
    }

    pub fn weight(&self) -> Option<i64> {
        match self {
            Self::Plain(_) => None,
            Self::Weighted(_, weight) => Some(*weight),
        }
    }
}

/// Raw value returned by a rule body, before it becomes a reply string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidate {
    #[default]
    Empty,
    Text(String),
    List(Vec<ReplyOption>),
}

impl From<()> for Candidate {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<&str>> for Candidate {
    fn from(values: Vec<&str>) -> Self {
        Self::List(
            values
                .into_iter()
                .map(|value| ReplyOption::Plain(value.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<String>> for Candidate {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(ReplyOption::Plain).collect())
    }
}

impl From<Vec<(&str, i64)>> for Candidate {
    fn from(values: Vec<(&str, i64)>) -> Self {
        Self::List(
            values
                .into_iter()
                .map(|(text, weight)| ReplyOption::Weighted(text.to_string(), weight))
                .collect(),
        )
    }
}

impl From<Vec<(String, i64)>> for Candidate {
    fn from(values: Vec<(String, i64)>) -> Self {
        Self::List(
            values
                .into_iter()
                .map(|(text, weight)| ReplyOption::Weighted(text, weight))
                .collect(),
        )
    }
}

impl From<Vec<ReplyOption>> for Candidate {
    fn from(values: Vec<ReplyOption>) -> Self {
        Self::List(values)
    }
}

impl<T: Into<Candidate>> From<Option<T>> for Candidate {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}
