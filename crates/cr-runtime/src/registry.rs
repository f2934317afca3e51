use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use cr_core::{
    Candidate, RuleOrigin, ScriptError, VarValue, DEFAULT_TOPIC, RULE_PREFIX,
    SUBSTITUTIONS_PREFIX,
};
use tracing::{debug, warn};

use crate::context::ScriptContext;
use crate::rule::{Method, RuleDecl, SubstitutionsDecl};
use crate::signature::{get_rule_spec, get_substitutions_spec, RuleSpec};

/// Module that owns the base script. Classes declared here are never
/// registered.
pub const BASE_SCRIPT_MODULE: &str = module_path!();
pub const BASE_SCRIPT_NAME: &str = "Script";

#[derive(Debug, Clone)]
pub enum ScriptMember {
    Method(Method),
    Attribute(VarValue),
}

#[derive(Debug, Clone)]
pub struct ScriptClass {
    module: String,
    name: String,
    topic: String,
    members: BTreeMap<String, ScriptMember>,
}

impl ScriptClass {
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> ScriptClassBuilder {
        ScriptClassBuilder {
            class: ScriptClass {
                module: module.into(),
                name: name.into(),
                topic: DEFAULT_TOPIC.to_string(),
                members: BTreeMap::new(),
            },
        }
    }

    /// The base script every author script extends: topic `"all"`, no rules.
    pub fn base() -> Self {
        Self::builder(BASE_SCRIPT_MODULE, BASE_SCRIPT_NAME).build()
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module, self.name)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_base(&self) -> bool {
        self.module == BASE_SCRIPT_MODULE
    }

    pub fn members(&self) -> &BTreeMap<String, ScriptMember> {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&ScriptMember> {
        self.members.get(name)
    }

    /// Validated rules in scan order, with the metadata each one carries.
    pub fn rules(&self) -> Result<Vec<(&str, RuleSpec<'_>)>, ScriptError> {
        let mut rules = Vec::new();
        for (name, member) in &self.members {
            if name.starts_with(RULE_PREFIX) {
                rules.push((name.as_str(), get_rule_spec(name, member)?));
            }
        }
        Ok(rules)
    }

    /// Invokes the named method as a rule and returns the resolved reply.
    pub fn reply(
        &self,
        method: &str,
        context: &mut ScriptContext,
    ) -> Result<String, ScriptError> {
        match self.members.get(method) {
            Some(ScriptMember::Method(method)) => method.reply(context),
            _ => Err(ScriptError::UnknownMethod {
                script: self.qualified_name(),
                method: method.to_string(),
            }),
        }
    }

    pub fn substitution_table(&self, method: &str) -> Result<Vec<(String, String)>, ScriptError> {
        match self.members.get(method) {
            Some(ScriptMember::Method(method)) => method.substitution_table(),
            _ => Err(ScriptError::UnknownMethod {
                script: self.qualified_name(),
                method: method.to_string(),
            }),
        }
    }

    fn validate(&self) -> Result<(), ScriptError> {
        for (name, member) in &self.members {
            if name.starts_with(RULE_PREFIX) {
                get_rule_spec(name, member)?;
            } else if name.starts_with(SUBSTITUTIONS_PREFIX) {
                get_substitutions_spec(name, member)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScriptClassBuilder {
    class: ScriptClass,
}

impl ScriptClassBuilder {
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.class.topic = topic.into();
        self
    }

    /// Adds a rule method. Names should begin with `rule` to be picked up
    /// by the rule scan.
    pub fn rule<F, C>(self, name: &str, decl: RuleDecl, body: F) -> Self
    where
        F: Fn(&mut ScriptContext) -> C + Send + Sync + 'static,
        C: Into<Candidate>,
    {
        let origin = RuleOrigin::new(self.class.module.clone(), name);
        self.method(name, decl.wrap(origin, body))
    }

    pub fn substitutions<F, I, K, V>(self, name: &str, decl: SubstitutionsDecl, body: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let origin = RuleOrigin::new(self.class.module.clone(), name);
        self.method(name, decl.wrap(origin, body))
    }

    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.class
            .members
            .insert(name.into(), ScriptMember::Method(method));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.class
            .members
            .insert(name.into(), ScriptMember::Attribute(value.into()));
        self
    }

    pub fn build(self) -> ScriptClass {
        self.class
    }
}

/// Declared script classes in declaration order.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    classes: Vec<Arc<ScriptClass>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends `class`. Returns `Ok(false)` for the base script,
    /// which is never registered.
    pub fn declare(&mut self, class: ScriptClass) -> Result<bool, ScriptError> {
        if class.is_base() {
            warn!(script = %class.qualified_name(), "base script is not registered");
            return Ok(false);
        }
        let qualified_name = class.qualified_name();
        if self
            .classes
            .iter()
            .any(|existing| existing.qualified_name() == qualified_name)
        {
            return Err(ScriptError::DuplicateScript {
                name: qualified_name,
            });
        }
        class.validate()?;

        debug!(script = %qualified_name, topic = %class.topic(), "script registered");
        self.classes.push(Arc::new(class));
        Ok(true)
    }

    pub fn classes(&self) -> &[Arc<ScriptClass>] {
        &self.classes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScriptClass>> {
        self.classes.iter()
    }

    /// Looks a class up by plain or qualified name; the first declared wins.
    pub fn get(&self, name: &str) -> Option<&Arc<ScriptClass>> {
        self.classes
            .iter()
            .find(|class| class.name() == name || class.qualified_name() == name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn clear(&mut self) {
        debug!(count = self.classes.len(), "script registry cleared");
        self.classes.clear();
    }
}

pub fn global_registry() -> &'static Mutex<ScriptRegistry> {
    static REGISTRY: OnceLock<Mutex<ScriptRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(ScriptRegistry::new()))
}

/// Declares `class` into the process-wide registry.
pub fn declare_script(class: ScriptClass) -> Result<bool, ScriptError> {
    global_registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .declare(class)
}
