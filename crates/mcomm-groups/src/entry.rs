//! Directory entry parsing for group attribute values.
//!
//! The gateway encodes references to users and groups as directory entries such as
//! `uid=jdoe,ou=People,dc=umich,dc=edu`. Only the leading value is meaningful to callers;
//! the suffix is fixed by the [`DirectoryLayout`] and rebuilt on write.

use std::fmt;
use std::str::FromStr;

use mcomm_core::config::DirectoryLayout;
use mcomm_core::error::Error as CoreError;
use thiserror::Error;

/// Errors that can occur when parsing a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    /// The entry was empty.
    #[error("directory entry cannot be empty")]
    Empty,
    /// The leading component had no `=` separator.
    #[error("directory entry component has no `=`: {0}")]
    MissingSeparator(String),
    /// The entry had no `,` and therefore no organizational suffix.
    #[error("directory entry has no suffix: {0}")]
    MissingSuffix(String),
    /// The leading component had nothing to the left of the `=`.
    #[error("directory entry component missing attribute: {0}")]
    MissingKey(String),
    /// The leading component had nothing to the right of the `=`.
    #[error("directory entry component missing value for attribute {0}")]
    MissingValue(String),
    /// The entry ended with an escape character.
    #[error("directory entry contains an unterminated escape sequence")]
    UnterminatedEscape,
    /// A `\XX` escape was not a hex pair, or the decoded bytes were not UTF-8.
    #[error("directory entry value has an invalid escape sequence: {0}")]
    InvalidEscape(String),
}

impl From<EntryError> for CoreError {
    fn from(err: EntryError) -> Self {
        CoreError::InvalidEntry(err.to_string())
    }
}

/// Kind of object a directory entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A person, keyed by `uid`.
    User,
    /// A group, keyed by `cn`.
    Group,
}

impl ReferenceKind {
    /// Attribute that carries the identifier for this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::User => "uid",
            Self::Group => "cn",
        }
    }

    /// Organizational suffix for this kind in the given layout.
    #[must_use]
    pub fn base(self, layout: &DirectoryLayout) -> &str {
        match self {
            Self::User => &layout.people_base,
            Self::Group => &layout.group_base,
        }
    }

    /// Builds the full directory entry referencing `identifier`.
    #[must_use]
    pub fn entry(self, identifier: &str, layout: &DirectoryLayout) -> String {
        format!(
            "{}={},{}",
            self.key(),
            escape(identifier),
            self.base(layout)
        )
    }
}

/// A parsed directory entry: leading `key=identifier` plus the untouched suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    key: String,
    identifier: String,
    suffix: String,
}

impl DirectoryEntry {
    /// Parses a directory entry from a string.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if the entry is empty, has no suffix, or its leading component is
    /// not a `key=value` pair.
    pub fn parse(input: impl AsRef<str>) -> std::result::Result<Self, EntryError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() {
            return Err(EntryError::Empty);
        }

        let comma = find_unescaped(raw, ',')?
            .ok_or_else(|| EntryError::MissingSuffix(raw.to_string()))?;
        let head = &raw[..comma];
        let suffix = raw[comma + 1..].trim();
        if suffix.is_empty() {
            return Err(EntryError::MissingSuffix(raw.to_string()));
        }

        let equals = find_unescaped(head, '=')?
            .ok_or_else(|| EntryError::MissingSeparator(head.to_string()))?;
        let key = head[..equals].trim();
        let value = &head[equals + 1..];

        if key.is_empty() {
            return Err(EntryError::MissingKey(head.to_string()));
        }
        if value.is_empty() {
            return Err(EntryError::MissingValue(key.to_string()));
        }

        Ok(Self {
            key: key.to_string(),
            identifier: unescape(value)?,
            suffix: suffix.to_string(),
        })
    }

    /// Attribute of the leading component (e.g. `uid`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bare identifier carried by the leading component.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Everything after the first component.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns true if the leading attribute matches the key for `kind` (case-insensitive).
    #[must_use]
    pub fn is_kind(&self, kind: ReferenceKind) -> bool {
        self.key.eq_ignore_ascii_case(kind.key())
    }

    /// Consumes the entry, returning its identifier.
    #[must_use]
    pub fn into_identifier(self) -> String {
        self.identifier
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={},{}", self.key, escape(&self.identifier), self.suffix)
    }
}

impl FromStr for DirectoryEntry {
    type Err = EntryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Extracts the bare identifier from a directory entry.
///
/// # Errors
///
/// Returns [`EntryError`] when the entry is malformed.
pub fn extract_identifier(entry: &str) -> std::result::Result<String, EntryError> {
    DirectoryEntry::parse(entry).map(DirectoryEntry::into_identifier)
}

fn find_unescaped(input: &str, delimiter: char) -> std::result::Result<Option<usize>, EntryError> {
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if escape {
            escape = false;
            continue;
        }

        if ch == '\\' {
            escape = true;
            continue;
        }

        if ch == delimiter {
            return Ok(Some(i));
        }
    }

    if escape {
        return Err(EntryError::UnterminatedEscape);
    }
    Ok(None)
}

/// Decodes `\<char>` and `\XX` hex escapes. Hex pairs are raw bytes, so a multi-byte
/// character arrives as consecutive pairs (`\C3\A9`).
fn unescape(value: &str) -> std::result::Result<String, EntryError> {
    let invalid = || EntryError::InvalidEscape(value.to_string());
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars();
    let mut buf = [0u8; 4];

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let next = chars.next().ok_or(EntryError::UnterminatedEscape)?;
        match next.to_digit(16) {
            Some(high) => {
                let low = chars
                    .next()
                    .and_then(|c| c.to_digit(16))
                    .ok_or_else(invalid)?;
                bytes.push(u8::try_from((high << 4) | low).map_err(|_| invalid())?);
            }
            None => bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes()),
        }
    }

    String::from_utf8(bytes).map_err(|_| invalid())
}

fn escape(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in value.chars().enumerate() {
        let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (idx == 0 && (ch == ' ' || ch == '#'))
            || (idx == last && ch == ' ');

        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_entry() {
        let entry = DirectoryEntry::parse("uid=owner1,ou=People,dc=umich,dc=edu").unwrap();
        assert_eq!(entry.key(), "uid");
        assert_eq!(entry.identifier(), "owner1");
        assert_eq!(entry.suffix(), "ou=People,dc=umich,dc=edu");
        assert!(entry.is_kind(ReferenceKind::User));
        assert!(!entry.is_kind(ReferenceKind::Group));
    }

    #[test]
    fn parse_group_entry_with_spaces_in_suffix() {
        let entry =
            DirectoryEntry::parse("cn=group1,ou=User Groups,ou=Groups,dc=umich,dc=edu").unwrap();
        assert!(entry.is_kind(ReferenceKind::Group));
        assert_eq!(entry.identifier(), "group1");
        assert_eq!(entry.suffix(), "ou=User Groups,ou=Groups,dc=umich,dc=edu");
    }

    #[test]
    fn parse_entry_with_escaped_comma() {
        let entry = DirectoryEntry::parse("cn=Smith\\, John,ou=People,dc=example,dc=com").unwrap();
        assert_eq!(entry.identifier(), "Smith, John");
        assert_eq!(
            entry.to_string(),
            "cn=Smith\\, John,ou=People,dc=example,dc=com"
        );
    }

    #[test]
    fn parse_entry_with_hex_escapes() {
        assert_eq!(
            extract_identifier("cn=Smith\\2C John,ou=Groups,dc=x").unwrap(),
            "Smith, John"
        );
        assert_eq!(
            extract_identifier("cn=Jos\\C3\\A9,ou=Groups,dc=x").unwrap(),
            "José"
        );

        let entry = DirectoryEntry::parse("cn=Smith\\2c John,ou=Groups,dc=x").unwrap();
        assert_eq!(entry.to_string(), "cn=Smith\\, John,ou=Groups,dc=x");
    }

    #[test]
    fn malformed_hex_escapes_are_errors() {
        assert!(matches!(
            DirectoryEntry::parse("cn=a\\2,dc=x").unwrap_err(),
            EntryError::InvalidEscape(_)
        ));
        assert!(matches!(
            DirectoryEntry::parse("cn=a\\2Z,dc=x").unwrap_err(),
            EntryError::InvalidEscape(_)
        ));
        assert!(matches!(
            DirectoryEntry::parse("cn=a\\FF,dc=x").unwrap_err(),
            EntryError::InvalidEscape(_)
        ));
    }

    #[test]
    fn value_may_contain_escaped_equals() {
        let entry = DirectoryEntry::parse("cn=a\\=b,dc=example").unwrap();
        assert_eq!(entry.identifier(), "a=b");
    }

    #[test]
    fn missing_separator_is_an_error() {
        let err = DirectoryEntry::parse("owner1,ou=People,dc=umich,dc=edu").unwrap_err();
        assert_eq!(err, EntryError::MissingSeparator("owner1".to_string()));
    }

    #[test]
    fn missing_suffix_is_an_error() {
        let err = DirectoryEntry::parse("uid=owner1").unwrap_err();
        assert!(matches!(err, EntryError::MissingSuffix(_)));

        let err = DirectoryEntry::parse("uid=owner1,").unwrap_err();
        assert!(matches!(err, EntryError::MissingSuffix(_)));
    }

    #[test]
    fn empty_parts_are_errors() {
        assert_eq!(DirectoryEntry::parse("  ").unwrap_err(), EntryError::Empty);
        assert!(matches!(
            DirectoryEntry::parse("=owner1,dc=edu").unwrap_err(),
            EntryError::MissingKey(_)
        ));
        assert_eq!(
            DirectoryEntry::parse("uid=,dc=edu").unwrap_err(),
            EntryError::MissingValue("uid".to_string())
        );
        assert_eq!(
            DirectoryEntry::parse("uid=owner\\").unwrap_err(),
            EntryError::UnterminatedEscape
        );
    }

    #[test]
    fn entry_error_converts_to_core_error() {
        let err: CoreError = EntryError::Empty.into();
        assert!(matches!(err, CoreError::InvalidEntry(_)));
    }

    #[test]
    fn user_reference_round_trip() {
        let layout = DirectoryLayout::default();
        let entry = ReferenceKind::User.entry("jdoe", &layout);
        assert_eq!(entry, "uid=jdoe,ou=People,dc=umich,dc=edu");
        assert_eq!(extract_identifier(&entry).unwrap(), "jdoe");
    }

    #[test]
    fn group_reference_round_trip() {
        let layout = DirectoryLayout::default();
        let entry = ReferenceKind::Group.entry("collab-app-admins", &layout);
        assert_eq!(
            entry,
            "cn=collab-app-admins,ou=User Groups,ou=Groups,dc=umich,dc=edu"
        );

        let parsed = DirectoryEntry::parse(&entry).unwrap();
        assert!(parsed.is_kind(ReferenceKind::Group));
        assert_eq!(parsed.identifier(), "collab-app-admins");
    }

    #[test]
    fn reference_escapes_special_characters() {
        let layout = DirectoryLayout::new("dc=example", "ou=Groups,dc=example");
        let entry = ReferenceKind::Group.entry("R&D, West", &layout);
        assert_eq!(entry, "cn=R&D\\, West,ou=Groups,dc=example");
        assert_eq!(extract_identifier(&entry).unwrap(), "R&D, West");
    }
}
