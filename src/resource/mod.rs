use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

pub mod files;
#[cfg(test)]
pub mod fixture;
pub mod manifest;
pub mod memory;
pub mod service;

/// Classification of a stored file. Only `External` files may be handed out by access token.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileResourceDomain {
    DataValue,
    PushAnalysis,
    Document,
    MessageAttachment,
    UserAvatar,
    OrgUnit,
    External,
}

impl fmt::Display for FileResourceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataValue => "DATA_VALUE",
            Self::PushAnalysis => "PUSH_ANALYSIS",
            Self::Document => "DOCUMENT",
            Self::MessageAttachment => "MESSAGE_ATTACHMENT",
            Self::UserAvatar => "USER_AVATAR",
            Self::OrgUnit => "ORG_UNIT",
            Self::External => "EXTERNAL",
        };
        f.write_str(name)
    }
}

/// Metadata describing a piece of stored binary content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    pub uid: String,
    pub name: String,
    pub content_type: String,
    pub content_length: u64,
    pub domain: FileResourceDomain,
    pub storage_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// A token-addressable share of a `FileResource`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFileResource {
    pub access_token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
    pub file_resource: FileResource,
}

impl ExternalFileResource {
    /// A share without an expiry date never expires.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires, Some(expires) if expires < now)
    }

    pub fn is_public(&self) -> bool {
        self.file_resource.domain == FileResourceDomain::External
    }
}
