//! Group gateway client for MCommunity.
//!
//! This crate authenticates against the gateway, reads directory groups and adds missing
//! owners, members, aliases and nested groups without ever removing anything.

#![deny(missing_docs)]

mod diff;
mod entry;
mod group;
mod models;
mod session;

pub use entry::{extract_identifier, DirectoryEntry, EntryError, ReferenceKind};
pub use group::{classify_owner, GroupHandle, USER_OWNER_MAX_LEN};
pub use models::{
    AddValueRequest, GroupAttribute, GroupAttributes, GroupRecord, ReserveGroupRequest,
};
pub use session::Session;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = mcomm_core::Result<T>;
