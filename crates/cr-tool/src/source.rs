use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cr_core::{Candidate, RuleMetadata, SubstitutionsMetadata, DEFAULT_TOPIC};
use cr_runtime::{rule, substitutions, ScriptClass};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::{CrToolError, TestCase, TESTCASE_SCHEMA_V1};

const SCRIPT_SUFFIX: &str = ".script.json";

/// A data-driven script: every rule replies with a fixed candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSource {
    pub module: String,
    pub name: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSource>,
    #[serde(default)]
    pub substitutions: BTreeMap<String, SubstitutionsSource>,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSource {
    #[serde(flatten)]
    pub metadata: RuleMetadata,
    #[serde(default)]
    pub reply: Candidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionsSource {
    #[serde(flatten)]
    pub metadata: SubstitutionsMetadata,
    #[serde(default)]
    pub table: Vec<(String, String)>,
}

impl ScriptSource {
    pub fn into_class(self) -> ScriptClass {
        let mut builder = ScriptClass::builder(self.module, self.name).topic(self.topic);
        for (name, source) in self.rules {
            let RuleSource { metadata, reply } = source;
            let decl = rule(metadata.pattern)
                .previous(metadata.previous)
                .weight(metadata.weight);
            builder = builder.rule(&name, decl, move |_| reply.clone());
        }
        for (name, source) in self.substitutions {
            let SubstitutionsSource { metadata, table } = source;
            let decl = substitutions(metadata.name).person(metadata.person);
            builder = builder.substitutions(&name, decl, move || table.clone());
        }
        builder.build()
    }
}

/// Reads every `*.script.json` under `fixture_dir`, in file-name order.
pub fn read_script_sources_from_dir(
    fixture_dir: &Path,
) -> Result<Vec<ScriptSource>, CrToolError> {
    let mut scripts = Vec::new();

    for entry in WalkDir::new(fixture_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(SCRIPT_SUFFIX) {
            continue;
        }

        let raw = fs::read_to_string(path).map_err(|source| CrToolError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: ScriptSource =
            serde_json::from_str(&raw).map_err(|source| CrToolError::ParseScript {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), script = %parsed.name, "script source loaded");
        scripts.push(parsed);
    }

    if scripts.is_empty() {
        return Err(CrToolError::SourceEmpty {
            path: fixture_dir.to_path_buf(),
        });
    }

    Ok(scripts)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, CrToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| CrToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| CrToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(CrToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
