use cr_core::{MatchGroups, VarMap};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "cr-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_random_seed")]
    pub random_seed: u32,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

fn default_random_seed() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TestStep {
    SetUser {
        user: String,
        uservars: VarMap,
    },
    SetTopic {
        topic: String,
    },
    Reply {
        script: String,
        rule: String,
        #[serde(default, rename = "match")]
        groups: MatchGroups,
    },
    Substitutions {
        script: String,
        method: String,
    },
}

impl TestStep {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SetUser { .. } => "setUser",
            Self::SetTopic { .. } => "setTopic",
            Self::Reply { .. } => "reply",
            Self::Substitutions { .. } => "substitutions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Topic {
        topic: Option<String>,
    },
    Reply {
        text: String,
    },
    Substitutions {
        table: Vec<(String, String)>,
    },
    Error {
        code: String,
        #[serde(default)]
        origin: Option<String>,
    },
}
