//! Wire records exchanged with the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::{DirectoryEntry, EntryError, ReferenceKind};

/// Group attributes writable through `<group>/<attribute>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAttribute {
    /// Group administrators (`owner`)
    Owner,
    /// Internal users (`member`)
    Member,
    /// External email addresses (`rfc822mail`)
    ExternalMember,
    /// Alternate names (`cn`)
    Alias,
    /// Nested groups (`groupMember`)
    MemberGroup,
}

impl GroupAttribute {
    /// Attribute name as used in gateway paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
            Self::ExternalMember => "rfc822mail",
            Self::Alias => "cn",
            Self::MemberGroup => "groupMember",
        }
    }
}

impl fmt::Display for GroupAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group record as returned by `GET groups/<name>/`.
///
/// `owner` is required here; reads that do not look at owners decode
/// [`GroupAttributes`] directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupRecord {
    /// Owner entries
    pub owner: Vec<String>,
    /// Every other attribute
    #[serde(flatten)]
    pub attributes: GroupAttributes,
}

impl GroupRecord {
    /// Bare identifiers of every owner.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if any owner entry is malformed.
    pub fn owner_ids(&self) -> Result<Vec<String>, EntryError> {
        self.owner
            .iter()
            .map(|entry| DirectoryEntry::parse(entry).map(DirectoryEntry::into_identifier))
            .collect()
    }
}

/// Optional group attributes, each defaulting to empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupAttributes {
    /// Member entries
    #[serde(default)]
    pub member: Vec<String>,
    /// External member addresses
    #[serde(default)]
    pub rfc822mail: Vec<String>,
    /// Group names and aliases
    #[serde(default)]
    pub cn: Vec<String>,
    /// Nested group entries
    #[serde(default, rename = "groupMember")]
    pub group_member: Vec<String>,
}

impl GroupAttributes {
    /// Bare identifiers of `uid` member entries.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if any member entry is malformed.
    pub fn member_ids(&self) -> Result<Vec<String>, EntryError> {
        ids_of_kind(&self.member, ReferenceKind::User)
    }

    /// Bare identifiers of `cn` nested group entries.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if any nested group entry is malformed.
    pub fn member_group_ids(&self) -> Result<Vec<String>, EntryError> {
        ids_of_kind(&self.group_member, ReferenceKind::Group)
    }
}

fn ids_of_kind(entries: &[String], kind: ReferenceKind) -> Result<Vec<String>, EntryError> {
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let parsed = DirectoryEntry::parse(entry)?;
        if parsed.is_kind(kind) {
            ids.push(parsed.into_identifier());
        }
    }
    Ok(ids)
}

/// Form body for `POST groups/` (group reservation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveGroupRequest {
    /// Display name
    pub cn: String,
    /// Group email, which is also the group name
    #[serde(rename = "umichGroupEmail")]
    pub group_email: String,
    /// Initial owner entry
    pub owner: String,
    /// Group description
    #[serde(rename = "umichDescription")]
    pub description: String,
}

/// Form body for `POST groups/<name>/<attribute>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddValueRequest<'a> {
    /// Value to add
    pub add: &'a str,
}

#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_optional_attributes_default_to_empty() {
        let record: GroupRecord = serde_json::from_value(json!({
            "owner": ["uid=owner1,ou=People,dc=umich,dc=edu"]
        }))
        .unwrap();

        assert_eq!(record.owner.len(), 1);
        assert_eq!(record.attributes, GroupAttributes::default());
    }

    #[test]
    fn record_requires_owner() {
        let result = serde_json::from_value::<GroupRecord>(json!({ "member": [] }));
        assert!(result.is_err());
    }

    #[test]
    fn attributes_decode_without_owner() {
        let attributes: GroupAttributes = serde_json::from_value(json!({
            "member": ["uid=member1,ou=People,dc=umich,dc=edu"],
            "rfc822mail": ["external@example.com"]
        }))
        .unwrap();

        assert_eq!(attributes.member_ids().unwrap(), vec!["member1"]);
        assert_eq!(attributes.rfc822mail, vec!["external@example.com"]);
        assert!(attributes.cn.is_empty());
    }

    #[test]
    fn record_decodes_identifiers() {
        let record: GroupRecord = serde_json::from_value(json!({
            "owner": [
                "uid=owner1,ou=People,dc=umich,dc=edu",
                "cn=collab-app-admins,ou=User Groups,ou=Groups,dc=umich,dc=edu"
            ],
            "member": [
                "uid=member1,ou=People,dc=umich,dc=edu",
                "cn=stray,ou=User Groups,ou=Groups,dc=umich,dc=edu"
            ],
            "groupMember": [
                "cn=group1,ou=User Groups,ou=Groups,dc=umich,dc=edu",
                "uid=stray,ou=People,dc=umich,dc=edu"
            ]
        }))
        .unwrap();

        assert_eq!(
            record.owner_ids().unwrap(),
            vec!["owner1", "collab-app-admins"]
        );
        assert_eq!(record.attributes.member_ids().unwrap(), vec!["member1"]);
        assert_eq!(record.attributes.member_group_ids().unwrap(), vec!["group1"]);
    }

    #[test]
    fn record_with_malformed_owner_fails() {
        let record = GroupRecord {
            owner: vec!["owner1".to_string()],
            ..GroupRecord::default()
        };
        assert!(matches!(
            record.owner_ids(),
            Err(EntryError::MissingSuffix(_))
        ));
    }

    #[test]
    fn attribute_names() {
        assert_eq!(GroupAttribute::Owner.as_str(), "owner");
        assert_eq!(GroupAttribute::Member.as_str(), "member");
        assert_eq!(GroupAttribute::ExternalMember.as_str(), "rfc822mail");
        assert_eq!(GroupAttribute::Alias.to_string(), "cn");
        assert_eq!(GroupAttribute::MemberGroup.to_string(), "groupMember");
    }

    #[test]
    fn token_response_tolerates_missing_access() {
        let response: TokenResponse = serde_json::from_value(json!({ "refresh": "r" })).unwrap();
        assert!(response.access.is_none());
    }
}
