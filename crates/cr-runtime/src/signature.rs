use cr_core::{
    RuleMetadata, RuleSignatureError, Signature, SubstitutionsMetadata, VarValue, RULE_PREFIX,
    SUBSTITUTIONS_PREFIX,
};

use crate::registry::ScriptMember;

const RULE_PARAMS: [&str; 4] = ["self", "pattern", "previous", "weight"];
const SUBSTITUTIONS_PARAMS: [&str; 3] = ["self", "name", "person"];

/// A validated rule method: its call shape and the metadata carried by the
/// shape's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec<'a> {
    pub signature: &'a Signature,
    pub metadata: RuleMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionsSpec<'a> {
    pub signature: &'a Signature,
    pub metadata: SubstitutionsMetadata,
}

/// Checks that `member` has the exact shape produced by `rule()`:
/// `(self, pattern=P, previous=Q, weight=W)` with no variadics.
pub fn get_rule_spec<'a>(
    name: &str,
    member: &'a ScriptMember,
) -> Result<RuleSpec<'a>, RuleSignatureError> {
    let signature = checked_signature(name, member, RULE_PREFIX, &RULE_PARAMS, "rule")?;
    let wrong_shape = || RuleSignatureError::wrong_shape(name, "rule");

    let metadata = RuleMetadata {
        pattern: string_default(signature, "pattern").ok_or_else(wrong_shape)?,
        previous: string_default(signature, "previous").ok_or_else(wrong_shape)?,
        weight: signature
            .default_of("weight")
            .and_then(VarValue::as_integer)
            .ok_or_else(wrong_shape)?,
    };
    Ok(RuleSpec {
        signature,
        metadata,
    })
}

/// Checks that `member` has the shape produced by `substitutions()`:
/// `(self, name=N, person=B)` with no variadics.
pub fn get_substitutions_spec<'a>(
    name: &str,
    member: &'a ScriptMember,
) -> Result<SubstitutionsSpec<'a>, RuleSignatureError> {
    let signature = checked_signature(
        name,
        member,
        SUBSTITUTIONS_PREFIX,
        &SUBSTITUTIONS_PARAMS,
        "substitutions",
    )?;
    let wrong_shape = || RuleSignatureError::wrong_shape(name, "substitutions");

    let metadata = SubstitutionsMetadata {
        name: string_default(signature, "name").ok_or_else(wrong_shape)?,
        person: signature
            .default_of("person")
            .and_then(VarValue::as_bool)
            .ok_or_else(wrong_shape)?,
    };
    Ok(SubstitutionsSpec {
        signature,
        metadata,
    })
}

fn checked_signature<'a>(
    name: &str,
    member: &'a ScriptMember,
    prefix: &str,
    expected_params: &[&str],
    declarator: &str,
) -> Result<&'a Signature, RuleSignatureError> {
    let ScriptMember::Method(method) = member else {
        return Err(RuleSignatureError::not_callable(name, prefix));
    };
    let signature = method.signature();

    let shape_matches = signature.param_names() == expected_params
        && signature.var_positional.is_none()
        && signature.var_keyword.is_none()
        && signature.default_count() == expected_params.len() - 1
        && signature.params.first().is_some_and(|param| param.default.is_none());
    if !shape_matches {
        return Err(RuleSignatureError::wrong_shape(name, declarator));
    }
    Ok(signature)
}

fn string_default(signature: &Signature, name: &str) -> Option<String> {
    signature
        .default_of(name)
        .and_then(VarValue::as_string)
        .map(str::to_string)
}
