use cr_core::{Candidate, MatchGroups, ResolutionError, ScriptError, VarMap, TOPIC_VAR};
use tracing::debug;

use crate::resolver::choose;
use crate::rng::ReplyRng;

#[derive(Debug, Clone, Default)]
pub struct ScriptContextOptions {
    pub botvars: VarMap,
    pub random_seed: Option<u32>,
}

/// Per-conversation state handed to every rule body: the active user, their
/// variables, the current topic and the groups captured by the last match.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    user_id: Option<String>,
    uservars: VarMap,
    botvars: VarMap,
    current_topic: Option<String>,
    match_groups: MatchGroups,
    rng: ReplyRng,
}

impl Default for ScriptContext {
    fn default() -> Self {
        Self::new(ScriptContextOptions::default())
    }
}

impl ScriptContext {
    pub fn new(options: ScriptContextOptions) -> Self {
        Self {
            user_id: None,
            uservars: VarMap::new(),
            botvars: options.botvars,
            current_topic: None,
            match_groups: MatchGroups::new(),
            rng: ReplyRng::from_seed(options.random_seed),
        }
    }

    /// Makes `user` the active user. `uservars` must carry a string
    /// `"__topic__"` entry; on error the context is left untouched.
    pub fn set_user(
        &mut self,
        user: impl Into<String>,
        uservars: VarMap,
    ) -> Result<(), ScriptError> {
        let user = user.into();
        let topic = match uservars.get(TOPIC_VAR) {
            None => return Err(ScriptError::MissingTopic { user }),
            Some(value) => match value.as_string() {
                Some(topic) => topic.to_string(),
                None => {
                    return Err(ScriptError::InvalidTopic {
                        user,
                        found: value.type_name().to_string(),
                    })
                }
            },
        };
        debug!(user = %user, topic = %topic, "active user set");
        self.user_id = Some(user);
        self.uservars = uservars;
        self.current_topic = Some(topic);
        Ok(())
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        debug!(topic = %topic, "topic changed");
        self.current_topic = Some(topic);
    }

    pub fn set_match(&mut self, groups: MatchGroups) {
        self.match_groups = groups;
    }

    pub fn set_botvars(&mut self, botvars: VarMap) {
        self.botvars = botvars;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn uservars(&self) -> &VarMap {
        &self.uservars
    }

    pub fn uservars_mut(&mut self) -> &mut VarMap {
        &mut self.uservars
    }

    pub fn botvars(&self) -> &VarMap {
        &self.botvars
    }

    pub fn current_topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    pub fn match_groups(&self) -> &MatchGroups {
        &self.match_groups
    }

    /// Resolves `candidate` against this context's match groups.
    pub fn choose(&mut self, candidate: &Candidate) -> Result<String, ResolutionError> {
        choose(candidate, &self.match_groups, &mut self.rng)
    }
}
