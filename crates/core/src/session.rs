use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SessionId, ShareCode};

/// The three kinds of content a session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    Text,
    Link,
    File,
}

impl ShareKind {
    /// Stable lower-case name used in storage keys and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a blob owned by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Blob store location of the payload.
    pub storage_path: String,
    /// Name supplied by the uploader, suggested back on download.
    pub original_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// Session content. The variant fixes the session's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SharePayload {
    Text(String),
    Link(String),
    File(FileDescriptor),
}

impl SharePayload {
    #[must_use]
    pub fn kind(&self) -> ShareKind {
        match self {
            Self::Text(_) => ShareKind::Text,
            Self::Link(_) => ShareKind::Link,
            Self::File(_) => ShareKind::File,
        }
    }

    /// The blob descriptor, for file payloads.
    #[must_use]
    pub fn file(&self) -> Option<&FileDescriptor> {
        match self {
            Self::File(descriptor) => Some(descriptor),
            Self::Text(_) | Self::Link(_) => None,
        }
    }
}

/// A stored share awaiting retrieval or expiry.
///
/// Sessions are immutable once created. They end either when retrieved or
/// when `expires_at` passes, whichever happens first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub code: ShareCode,
    pub kind: ShareKind,
    pub payload: SharePayload,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session that expires `ttl` after `now`.
    #[must_use]
    pub fn new(code: ShareCode, payload: SharePayload, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            code,
            kind: payload.kind(),
            payload,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.kind, self.code.clone())
    }
}

/// Lookup key for a session: the code scoped by its kind.
///
/// A code issued for one kind never matches a lookup for another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub kind: ShareKind,
    pub code: ShareCode,
}

impl SessionKey {
    #[must_use]
    pub fn new(kind: ShareKind, code: ShareCode) -> Self {
        Self { kind, code }
    }

    /// Render as `kind:code`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.code)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_payload() -> SharePayload {
        SharePayload::File(FileDescriptor {
            storage_path: "1700000000000-abc.txt".into(),
            original_name: "a.txt".into(),
            size_bytes: 5,
            mime_type: "text/plain".into(),
        })
    }

    #[test]
    fn kind_follows_payload() {
        let now = Utc::now();
        let text = Session::new(
            "abc123".into(),
            SharePayload::Text("hi".into()),
            Duration::minutes(5),
            now,
        );
        assert_eq!(text.kind, ShareKind::Text);

        let file = Session::new("abc123".into(), file_payload(), Duration::minutes(5), now);
        assert_eq!(file.kind, ShareKind::File);
        assert!(file.payload.file().is_some());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let session = Session::new(
            "abc123".into(),
            SharePayload::Link("https://example.com".into()),
            Duration::seconds(300),
            now,
        );
        assert!(!session.is_expired_at(now));
        assert!(!session.is_expired_at(now + Duration::seconds(299)));
        assert!(session.is_expired_at(now + Duration::seconds(300)));
    }

    #[test]
    fn key_canonical_form() {
        let key = SessionKey::new(ShareKind::Link, "x7q2p9".into());
        assert_eq!(key.canonical(), "link:x7q2p9");
        assert_eq!(key.to_string(), key.canonical());
    }

    #[test]
    fn kinds_do_not_share_keys() {
        let text = SessionKey::new(ShareKind::Text, "x7q2p9".into());
        let file = SessionKey::new(ShareKind::File, "x7q2p9".into());
        assert_ne!(text, file);
        assert_ne!(text.canonical(), file.canonical());
    }

    #[test]
    fn session_serde_roundtrip() {
        let session = Session::new("abc123".into(), file_payload(), Duration::minutes(5), Utc::now());
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"kind\":\"file\""));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
