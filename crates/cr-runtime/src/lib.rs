mod context;
mod format;
mod registry;
mod resolver;
mod rng;
mod rule;
mod signature;

pub use context::{ScriptContext, ScriptContextOptions};
pub use format::format_reply;
pub use registry::{
    declare_script, global_registry, ScriptClass, ScriptClassBuilder, ScriptMember,
    ScriptRegistry, BASE_SCRIPT_MODULE, BASE_SCRIPT_NAME,
};
pub use resolver::choose;
pub use rng::ReplyRng;
pub use rule::{
    rule, substitutions, Method, MethodBody, ReplyBody, RuleDecl, SubstitutionsBody,
    SubstitutionsDecl,
};
pub use signature::{get_rule_spec, get_substitutions_spec, RuleSpec, SubstitutionsSpec};
