//! Group handle and attribute reconciliation.

use mcomm_core::Error;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::diff;
use crate::entry::ReferenceKind;
use crate::models::{
    AddValueRequest, GroupAttribute, GroupAttributes, GroupRecord, ReserveGroupRequest,
};
use crate::session::Session;
use crate::Result;

/// Owners with identifiers up to this many characters are written as users.
pub const USER_OWNER_MAX_LEN: usize = 8;

/// Classifies an owner identifier as a user or group reference by its length.
///
/// Identifiers longer than [`USER_OWNER_MAX_LEN`] characters are treated as groups, shorter
/// non-empty ones as users. Empty identifiers are not written at all. This is a lexical
/// heuristic matching the directory's naming conventions, not a lookup.
#[must_use]
pub fn classify_owner(identifier: &str) -> Option<ReferenceKind> {
    match identifier.chars().count() {
        0 => None,
        len if len > USER_OWNER_MAX_LEN => Some(ReferenceKind::Group),
        _ => Some(ReferenceKind::User),
    }
}

enum ReadOutcome<T> {
    Found(T),
    Missing { status: StatusCode, body: String },
}

/// Handle on one named directory group.
///
/// The attribute lists hold the snapshot read when the handle was opened and double as the
/// desired state: callers edit them and then run one of the `apply_*` operations, each of
/// which re-reads the group and adds whatever is missing. Nothing is ever removed.
#[derive(Debug, Clone)]
pub struct GroupHandle<'a> {
    session: &'a Session,
    name: String,
    uri: Url,
    exists: bool,
    /// Owner identifiers (users or groups)
    pub owners: Vec<String>,
    /// Internal member user identifiers
    pub members: Vec<String>,
    /// External member email addresses
    pub external_members: Vec<String>,
    /// Group aliases
    pub aliases: Vec<String>,
    /// Nested member group identifiers
    pub member_groups: Vec<String>,
}

impl<'a> GroupHandle<'a> {
    /// Opens a handle on `name`, reading its current attributes.
    ///
    /// A group the gateway does not return is not an error: the handle reports
    /// [`exists`](Self::exists) as `false` and every list is empty.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the gateway cannot be reached, and a parse error if a
    /// found group carries a malformed record.
    pub async fn open(session: &'a Session, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let uri = session.endpoint(&["groups", &name])?;
        let mut handle = Self {
            session,
            name,
            uri,
            exists: false,
            owners: Vec::new(),
            members: Vec::new(),
            external_members: Vec::new(),
            aliases: Vec::new(),
            member_groups: Vec::new(),
        };
        handle.refresh().await?;
        Ok(handle)
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL of the group resource.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Whether the last read found the group.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Re-reads the group, replacing the snapshot and any local edits.
    ///
    /// # Errors
    ///
    /// See [`GroupHandle::open`].
    pub async fn refresh(&mut self) -> Result<()> {
        match self.fetch::<GroupRecord>().await? {
            ReadOutcome::Found(record) => self.load(record),
            ReadOutcome::Missing { status, .. } => {
                if status != StatusCode::NOT_FOUND {
                    warn!(
                        group = %self.name,
                        %status,
                        "group read failed; treating group as absent"
                    );
                }
                self.exists = false;
                self.owners.clear();
                self.members.clear();
                self.external_members.clear();
                self.aliases.clear();
                self.member_groups.clear();
                Ok(())
            }
        }
    }

    /// Adds every local alias the group does not have yet.
    ///
    /// Returns the number of writes issued.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DirectoryRead`] if the group cannot be re-read and with
    /// [`Error::DirectoryWrite`] on the first rejected write.
    pub async fn apply_alias_diff(&self) -> Result<usize> {
        let remote = self.read_remote::<GroupAttributes>().await?;
        self.add_missing(GroupAttribute::Alias, &self.aliases, &remote.cn, |alias| {
            Some(alias.to_string())
        })
        .await
    }

    /// Adds every local owner the group does not have yet.
    ///
    /// Owners are written as user or group references according to [`classify_owner`].
    /// Returns the number of writes issued.
    ///
    /// # Errors
    ///
    /// See [`GroupHandle::apply_alias_diff`]; malformed remote owner entries fail with
    /// [`Error::InvalidEntry`].
    pub async fn apply_ownership_diff(&self) -> Result<usize> {
        let remote = self.read_remote::<GroupRecord>().await?.owner_ids()?;
        let layout = self.session.layout();
        self.add_missing(GroupAttribute::Owner, &self.owners, &remote, |owner| {
            classify_owner(owner).map(|kind| kind.entry(owner, layout))
        })
        .await
    }

    /// Adds every local member, external member and member group the group lacks.
    ///
    /// The three lists are reconciled in that order. Returns the total number of writes.
    ///
    /// # Errors
    ///
    /// See [`GroupHandle::apply_alias_diff`]; malformed remote member or nested group
    /// entries fail with [`Error::InvalidEntry`].
    pub async fn apply_membership_diff(&self) -> Result<usize> {
        let remote = self.read_remote::<GroupAttributes>().await?;
        let remote_members = remote.member_ids()?;
        let remote_groups = remote.member_group_ids()?;
        let layout = self.session.layout();

        let mut written = self
            .add_missing(
                GroupAttribute::Member,
                &self.members,
                &remote_members,
                |member| Some(ReferenceKind::User.entry(member, layout)),
            )
            .await?;
        written += self
            .add_missing(
                GroupAttribute::ExternalMember,
                &self.external_members,
                &remote.rfc822mail,
                |email| Some(email.to_string()),
            )
            .await?;
        written += self
            .add_missing(
                GroupAttribute::MemberGroup,
                &self.member_groups,
                &remote_groups,
                |group| Some(ReferenceKind::Group.entry(group, layout)),
            )
            .await?;

        Ok(written)
    }

    /// Creates the group, owned by the session's application group.
    ///
    /// On success the handle is refreshed from the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reservation`] unless the gateway answers `201 Created`.
    pub async fn reserve(&mut self) -> Result<()> {
        let url = self.session.endpoint(&["groups"])?;
        let request = ReserveGroupRequest {
            cn: self.session.full_name().to_string(),
            group_email: self.name.clone(),
            owner: ReferenceKind::Group.entry(self.session.app_id(), self.session.layout()),
            description: String::new(),
        };

        info!(group = %self.name, "Reserving group");

        let response = self.session.post(url).form(&request).send().await?;
        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(self.rejected(Error::Reservation {
                status: status.as_u16(),
                body,
            }));
        }

        self.refresh().await
    }

    async fn add_missing<F>(
        &self,
        attribute: GroupAttribute,
        desired: &[String],
        remote: &[String],
        encode: F,
    ) -> Result<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pending = diff::missing(desired, remote);
        debug!(
            group = %self.name,
            %attribute,
            pending = pending.len(),
            "computed attribute diff"
        );

        let mut written = 0;
        for value in pending {
            if let Some(payload) = encode(value) {
                self.write_attribute(attribute, &payload).await?;
                written += 1;
            }
        }
        Ok(written)
    }

    async fn write_attribute(&self, attribute: GroupAttribute, value: &str) -> Result<()> {
        let url = self
            .session
            .endpoint(&["groups", &self.name, attribute.as_str()])?;

        info!(group = %self.name, %attribute, "Adding attribute value");

        let response = self
            .session
            .post(url)
            .form(&AddValueRequest { add: value })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(self.rejected(Error::DirectoryWrite {
            status: status.as_u16(),
            body,
        }))
    }

    async fn fetch<T: DeserializeOwned>(&self) -> Result<ReadOutcome<T>> {
        info!(group = %self.name, "Fetching group");

        let response = self.session.get(self.uri.clone()).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(ReadOutcome::Missing { status, body });
        }

        let record = response.json::<T>().await?;
        Ok(ReadOutcome::Found(record))
    }

    async fn read_remote<T: DeserializeOwned>(&self) -> Result<T> {
        match self.fetch::<T>().await? {
            ReadOutcome::Found(record) => Ok(record),
            ReadOutcome::Missing { status, body } => Err(self.rejected(Error::DirectoryRead {
                status: status.as_u16(),
                body,
            })),
        }
    }

    fn rejected(&self, err: Error) -> Error {
        if err.should_log() {
            warn!(
                group = %self.name,
                code = err.error_code(),
                status = ?err.status(),
                "gateway rejected request"
            );
        } else {
            debug!(
                group = %self.name,
                code = err.error_code(),
                status = ?err.status(),
                "gateway request failed"
            );
        }
        err
    }

    fn load(&mut self, record: GroupRecord) -> Result<()> {
        let owners = record.owner_ids()?;
        let attributes = record.attributes;
        let members = attributes.member_ids()?;
        let member_groups = attributes.member_group_ids()?;

        self.owners = owners;
        self.members = members;
        self.member_groups = member_groups;
        self.external_members = attributes.rfc822mail;
        self.aliases = attributes.cn;
        self.exists = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_classification_boundary() {
        assert_eq!(classify_owner(""), None);
        assert_eq!(classify_owner("a"), Some(ReferenceKind::User));
        assert_eq!(classify_owner("eightchr"), Some(ReferenceKind::User));
        assert_eq!(classify_owner("ninechars"), Some(ReferenceKind::Group));
        assert_eq!(
            classify_owner("collab-app-admins"),
            Some(ReferenceKind::Group)
        );
    }

    #[test]
    fn owner_classification_counts_characters() {
        // eight characters, more than eight bytes
        assert_eq!(classify_owner("josé-ñam"), Some(ReferenceKind::User));
    }
}
