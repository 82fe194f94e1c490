//! Validated identifiers for groups, roles and members

use std::fmt;

use serde::Serialize;

use super::errors::{ModelError, ModelResult};

/// Prefix marker used by chat platforms for mentions
pub const MENTION_PREFIX: char = '@';

/// Opaque group identity. Roles are scoped to exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Parse a group id, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyGroupId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for GroupId {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized role name.
///
/// `"Admin"`, `"admin "` and `"ADMIN"` all parse to `admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyRoleName);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ModelError::InvalidRoleName(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A username belonging to a role.
///
/// Stored without the mention prefix. No case folding: `Alice` and `alice`
/// are distinct members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    /// Parse a handle, stripping one leading `@`.
    ///
    /// A handle that still starts with `@` after the strip is rejected, so
    /// the stored form always parses back to the same member.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        let handle = trimmed.strip_prefix(MENTION_PREFIX).unwrap_or(trimmed);
        if handle.is_empty() {
            return Err(ModelError::EmptyMember);
        }
        if handle.chars().any(char::is_whitespace) {
            return Err(ModelError::InvalidMember(handle.to_string()));
        }
        if handle.starts_with(MENTION_PREFIX) {
            return Err(ModelError::RepeatedPrefix(handle.to_string()));
        }
        Ok(Self(handle.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Handle rendered as a mention (`@name`)
    pub fn mention(&self) -> String {
        format!("{}{}", MENTION_PREFIX, self.0)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_normalization() {
        let a = RoleName::parse("Admin").unwrap();
        let b = RoleName::parse("admin ").unwrap();
        let c = RoleName::parse("ADMIN").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "admin");
    }

    #[test]
    fn test_role_name_rejects_empty_and_multiword() {
        assert_eq!(RoleName::parse("   "), Err(ModelError::EmptyRoleName));
        assert!(matches!(
            RoleName::parse("on call"),
            Err(ModelError::InvalidRoleName(_))
        ));
    }

    #[test]
    fn test_member_strips_single_prefix() {
        assert_eq!(Member::parse("@alice").unwrap().as_str(), "alice");
        assert_eq!(Member::parse(" bob ").unwrap().as_str(), "bob");
    }

    #[test]
    fn test_member_rejects_repeated_prefix() {
        assert_eq!(
            Member::parse("@@carol"),
            Err(ModelError::RepeatedPrefix("@carol".into()))
        );
        assert!(Member::parse("@@").is_err());
    }

    #[test]
    fn test_member_parse_is_stable_on_its_own_output() {
        for raw in ["@alice", "Bob", "@名前", "a\"b", "x@y"] {
            let member = Member::parse(raw).unwrap();
            assert_eq!(Member::parse(member.as_str()).unwrap(), member);
        }
    }

    #[test]
    fn test_member_preserves_case() {
        let upper = Member::parse("Alice").unwrap();
        let lower = Member::parse("alice").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_member_rejects_empty() {
        assert_eq!(Member::parse("@"), Err(ModelError::EmptyMember));
        assert_eq!(Member::parse(""), Err(ModelError::EmptyMember));
    }

    #[test]
    fn test_member_mention() {
        assert_eq!(Member::parse("dave").unwrap().mention(), "@dave");
    }

    #[test]
    fn test_group_id_from_chat_id() {
        assert_eq!(GroupId::from(-1001234_i64).as_str(), "-1001234");
        assert_eq!(GroupId::parse(" g1 ").unwrap().as_str(), "g1");
        assert_eq!(GroupId::parse(""), Err(ModelError::EmptyGroupId));
    }
}
