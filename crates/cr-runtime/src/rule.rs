use std::fmt;
use std::sync::Arc;

use cr_core::{
    Candidate, RuleMetadata, RuleOrigin, ScriptError, Signature, SubstitutionsMetadata,
};
use tracing::debug;

use crate::context::ScriptContext;

pub type ReplyBody = Arc<dyn Fn(&mut ScriptContext) -> Candidate + Send + Sync>;
pub type SubstitutionsBody = Arc<dyn Fn() -> Vec<(String, String)> + Send + Sync>;

#[derive(Clone)]
pub enum MethodBody {
    Reply(ReplyBody),
    Substitutions(SubstitutionsBody),
}

impl MethodBody {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Reply(_) => "reply",
            Self::Substitutions(_) => "substitutions",
        }
    }
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodBody::{}", self.kind_name())
    }
}

/// A script method: the body plus the call shape it was declared with.
#[derive(Debug, Clone)]
pub struct Method {
    origin: RuleOrigin,
    signature: Signature,
    body: MethodBody,
}

impl Method {
    pub fn new(origin: RuleOrigin, signature: Signature, body: MethodBody) -> Self {
        Self {
            origin,
            signature,
            body,
        }
    }

    pub fn origin(&self) -> &RuleOrigin {
        &self.origin
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    /// Runs a reply body and resolves its candidate. Resolution failures carry
    /// this method's origin.
    pub fn reply(&self, context: &mut ScriptContext) -> Result<String, ScriptError> {
        let MethodBody::Reply(body) = &self.body else {
            return Err(ScriptError::WrongMethodKind {
                origin: self.origin.clone(),
                expected: "reply",
            });
        };
        let candidate = body(context);
        debug!(rule = %self.origin, "resolving rule candidate");
        context
            .choose(&candidate)
            .map_err(|error| error.with_origin(self.origin.clone()).into())
    }

    pub fn substitution_table(&self) -> Result<Vec<(String, String)>, ScriptError> {
        match &self.body {
            MethodBody::Substitutions(body) => Ok(body()),
            MethodBody::Reply(_) => Err(ScriptError::WrongMethodKind {
                origin: self.origin.clone(),
                expected: "substitutions",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDecl {
    metadata: RuleMetadata,
}

/// Starts a rule declaration for `pattern`, with an empty previous pattern
/// and weight 1.
pub fn rule(pattern: impl Into<String>) -> RuleDecl {
    RuleDecl {
        metadata: RuleMetadata::new(pattern),
    }
}

impl RuleDecl {
    pub fn previous(mut self, previous: impl Into<String>) -> Self {
        self.metadata.previous = previous.into();
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.metadata.weight = weight;
        self
    }

    pub fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    pub fn wrap<F, C>(self, origin: RuleOrigin, body: F) -> Method
    where
        F: Fn(&mut ScriptContext) -> C + Send + Sync + 'static,
        C: Into<Candidate>,
    {
        let body: ReplyBody = Arc::new(move |context: &mut ScriptContext| body(context).into());
        Method::new(
            origin,
            Signature::for_rule(&self.metadata),
            MethodBody::Reply(body),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionsDecl {
    metadata: SubstitutionsMetadata,
}

/// Starts a substitutions-table declaration named `name`.
pub fn substitutions(name: impl Into<String>) -> SubstitutionsDecl {
    SubstitutionsDecl {
        metadata: SubstitutionsMetadata {
            name: name.into(),
            person: false,
        },
    }
}

impl SubstitutionsDecl {
    pub fn person(mut self, person: bool) -> Self {
        self.metadata.person = person;
        self
    }

    pub fn metadata(&self) -> &SubstitutionsMetadata {
        &self.metadata
    }

    pub fn wrap<F, I, K, V>(self, origin: RuleOrigin, body: F) -> Method
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let body: SubstitutionsBody = Arc::new(move || {
            body()
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect()
        });
        Method::new(
            origin,
            Signature::for_substitutions(&self.metadata),
            MethodBody::Substitutions(body),
        )
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;
    use crate::context::ScriptContextOptions;
    use cr_core::{MatchGroups, VarValue};

    fn context() -> ScriptContext {
        ScriptContext::new(ScriptContextOptions {
            random_seed: Some(1),
            ..ScriptContextOptions::default()
        })
    }

    #[test]
    fn rule_wrap_exposes_metadata_as_signature_defaults() {
        let method = rule("hello *")
            .previous("what is your name")
            .weight(3)
            .wrap(RuleOrigin::new("bot", "rule_hello"), |_| "hi");

        assert_eq!(
            method.signature().param_names(),
            vec!["self", "pattern", "previous", "weight"]
        );
        assert_eq!(
            method.signature().default_of("pattern"),
            Some(&VarValue::from("hello *"))
        );
        assert_eq!(
            method.signature().default_of("previous"),
            Some(&VarValue::from("what is your name"))
        );
        assert_eq!(
            method.signature().default_of("weight"),
            Some(&VarValue::Integer(3))
        );
    }

    #[test]
    fn rule_defaults_match_declaration_shape() {
        let decl = rule("hi");
        assert_eq!(decl.metadata().previous, "");
        assert_eq!(decl.metadata().weight, 1);
    }

    #[test]
    fn reply_pipes_body_through_choose() {
        let method = rule("my name is *").wrap(RuleOrigin::new("bot", "rule_name"), |context| {
            let name = context.match_groups().get("name").cloned().unwrap_or_default();
            vec![format!("nice to meet you {}", name)]
        });

        let mut context = context();
        let mut groups = MatchGroups::new();
        groups.insert("name".to_string(), "Sam".to_string());
        context.set_match(groups);

        assert_eq!(
            method.reply(&mut context).expect("reply should pass"),
            "nice to meet you Sam"
        );
    }

    #[test]
    fn reply_body_can_change_topic() {
        let method = rule("bye").wrap(RuleOrigin::new("bot", "rule_bye"), |context| {
            context.set_topic("farewell");
            "see you"
        });
        let mut context = context();
        assert_eq!(method.reply(&mut context).expect("reply should pass"), "see you");
        assert_eq!(context.current_topic(), Some("farewell"));
    }

    #[test]
    fn reply_error_names_rule_module_and_name() {
        let method = rule("hi").wrap(RuleOrigin::new("bot::greeting", "rule_hi"), |_| {
            "hi {name}"
        });
        let error = method
            .reply(&mut context())
            .expect_err("missing key should fail");

        assert_eq!(
            error.origin(),
            Some(&RuleOrigin::new("bot::greeting", "rule_hi"))
        );
        assert!(error
            .to_string()
            .ends_with("in choose processing return value from bot::greeting::rule_hi"));
    }

    #[test]
    fn substitutions_wrap_returns_table() {
        let method = substitutions("person")
            .person(true)
            .wrap(RuleOrigin::new("bot", "substitutions_person"), || {
                vec![("i am", "you are"), ("you are", "I am")]
            });

        assert_eq!(
            method.signature().param_names(),
            vec!["self", "name", "person"]
        );
        assert_eq!(
            method.signature().default_of("person"),
            Some(&VarValue::Bool(true))
        );
        let table = method.substitution_table().expect("table should load");
        assert_eq!(table[0], ("i am".to_string(), "you are".to_string()));
        assert!(matches!(
            method.reply(&mut context()),
            Err(ScriptError::WrongMethodKind { .. })
        ));
    }

    #[test]
    fn substitution_table_rejects_reply_methods() {
        let method = rule("hi").wrap(RuleOrigin::new("bot", "rule_hi"), |_| "hi");
        let error = method
            .substitution_table()
            .expect_err("reply method has no table");
        assert_eq!(error.code(), "SCRIPT_METHOD_KIND");
    }
}
