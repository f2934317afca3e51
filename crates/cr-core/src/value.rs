use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type VarMap = BTreeMap<String, VarValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Array(Vec<VarValue>),
    Map(BTreeMap<String, VarValue>),
}

impl VarValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn untagged_deserialize_prefers_integer_over_number() {
        let parsed: Vec<VarValue> =
            serde_json::from_str(r#"[null, true, 3, 2.5, "x", [1], {"k": "v"}]"#)
                .expect("values should deserialize");

        assert_eq!(parsed[0], VarValue::Null);
        assert_eq!(parsed[1], VarValue::Bool(true));
        assert_eq!(parsed[2], VarValue::Integer(3));
        assert_eq!(parsed[3], VarValue::Number(2.5));
        assert_eq!(parsed[4].as_string(), Some("x"));
        assert_eq!(parsed[5].type_name(), "array");
        assert_eq!(parsed[6].type_name(), "map");
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(VarValue::from(7).as_integer(), Some(7));
        assert_eq!(VarValue::from("7").as_integer(), None);
        assert_eq!(VarValue::from(false).as_bool(), Some(false));
        assert_eq!(VarValue::Number(1.0).as_string(), None);
    }
}
