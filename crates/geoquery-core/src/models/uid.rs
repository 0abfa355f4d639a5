use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity in a dataset; the service accepts strings or integers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniqueId {
    Int(i64),
    Str(String),
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueId::Int(id) => write!(f, "{}", id),
            UniqueId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for UniqueId {
    fn from(id: i64) -> Self {
        UniqueId::Int(id)
    }
}

impl From<&str> for UniqueId {
    fn from(id: &str) -> Self {
        UniqueId::Str(id.to_string())
    }
}

impl From<String> for UniqueId {
    fn from(id: String) -> Self {
        UniqueId::Str(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_serialization() {
        let ids = vec![UniqueId::from("aaa"), UniqueId::from(7)];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"["aaa",7]"#);

        let parsed: Vec<UniqueId> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ids);
    }
}
