use std::path::Path;

use cr_core::ScriptError;
use cr_runtime::{ScriptContext, ScriptContextOptions, ScriptRegistry};
use tracing::debug;

use crate::source::{read_script_sources_from_dir, read_test_case};
use crate::{CrToolError, ExpectedEvent, TestCase, TestStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub registered_scripts: usize,
}

/// Declares the fixture's scripts into a fresh registry and plays the case's
/// steps against a seeded context, one event per step.
pub fn run_case(fixture_dir: &Path, case: &TestCase) -> Result<RunReport, CrToolError> {
    let mut registry = ScriptRegistry::new();
    for source in read_script_sources_from_dir(fixture_dir)? {
        registry.declare(source.into_class())?;
    }

    let mut context = ScriptContext::new(ScriptContextOptions {
        random_seed: Some(case.random_seed),
        ..ScriptContextOptions::default()
    });

    let mut observed_events = Vec::with_capacity(case.steps.len());
    for (step_index, step) in case.steps.iter().enumerate() {
        debug!(step_index, kind = step.kind_name(), "running step");
        let event = match step {
            TestStep::SetUser { user, uservars } => {
                match context.set_user(user.clone(), uservars.clone()) {
                    Ok(()) => topic_event(&context),
                    Err(error) => error_event(&error),
                }
            }
            TestStep::SetTopic { topic } => {
                context.set_topic(topic.clone());
                topic_event(&context)
            }
            TestStep::Reply {
                script,
                rule,
                groups,
            } => {
                let class =
                    registry
                        .get(script)
                        .ok_or_else(|| CrToolError::UnknownScript {
                            step_index,
                            script: script.clone(),
                        })?;
                context.set_match(groups.clone());
                match class.reply(rule, &mut context) {
                    Ok(text) => ExpectedEvent::Reply { text },
                    Err(error) => error_event(&error),
                }
            }
            TestStep::Substitutions { script, method } => {
                let class =
                    registry
                        .get(script)
                        .ok_or_else(|| CrToolError::UnknownScript {
                            step_index,
                            script: script.clone(),
                        })?;
                match class.substitution_table(method) {
                    Ok(table) => ExpectedEvent::Substitutions { table },
                    Err(error) => error_event(&error),
                }
            }
        };
        observed_events.push(event);
    }

    Ok(RunReport {
        observed_events,
        registered_scripts: registry.len(),
    })
}

fn topic_event(context: &ScriptContext) -> ExpectedEvent {
    ExpectedEvent::Topic {
        topic: context.current_topic().map(str::to_string),
    }
}

fn error_event(error: &ScriptError) -> ExpectedEvent {
    ExpectedEvent::Error {
        code: error.code().to_string(),
        origin: error.origin().map(ToString::to_string),
    }
}

pub fn assert_case(fixture_dir: &Path, case_path: &Path) -> Result<(), CrToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(fixture_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(CrToolError::EventSerialize)?;
        return Err(CrToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(CrToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(CrToolError::EventSerialize)?;
            return Err(CrToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
