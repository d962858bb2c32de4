use serde::{Deserialize, Serialize};

/// Account classification controlling which screens a session may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Consumer,
    Creator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Consumer => "consumer",
            Role::Creator => "creator",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "consumer" => Some(Role::Consumer),
            "creator" => Some(Role::Creator),
            _ => None,
        }
    }

    /// The other role, used when cycling the role picker on the register form.
    pub fn toggled(&self) -> Self {
        match self {
            Role::Consumer => Role::Creator,
            Role::Creator => Role::Consumer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("Creator"), Some(Role::Creator));
        assert_eq!(Role::parse(" consumer "), Some(Role::Consumer));
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Creator).unwrap(), "\"creator\"");
        let role: Role = serde_json::from_str("\"consumer\"").unwrap();
        assert_eq!(role, Role::Consumer);
    }
}
