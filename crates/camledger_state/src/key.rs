//! Namespaced world-state keys.
//!
//! Every entity kind owns a namespace, so a `deviceID`, a `contentID` and a
//! derived log id can share a spelling without ever sharing a store key.
//! Encoded keys are `<namespace> 0x00 <id>`; identifiers may therefore not
//! contain NUL.

use crate::error::{StateError, StateResult};
use std::fmt;

const SEPARATOR: u8 = 0x00;

/// Entity namespace of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Camera device identity records.
    Camera,
    /// Access-log audit records.
    AccessLog,
    /// Video content anchors.
    Video,
}

impl Namespace {
    /// All namespaces.
    pub const ALL: [Namespace; 3] = [Namespace::Camera, Namespace::AccessLog, Namespace::Video];

    /// Namespace tag as it appears at the front of an encoded key.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Namespace::Camera => "camera",
            Namespace::AccessLog => "log",
            Namespace::Video => "video",
        }
    }

    fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.tag().as_bytes() == tag)
    }

    /// Returns `true` if the encoded `key` lives in this namespace.
    #[must_use]
    pub fn contains(self, key: &[u8]) -> bool {
        let tag = self.tag().as_bytes();
        key.len() > tag.len() && key.starts_with(tag) && key[tag.len()] == SEPARATOR
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed world-state key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    namespace: Namespace,
    id: String,
}

impl StateKey {
    /// Creates a key in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidKey`] if `id` is empty or contains NUL.
    pub fn new(namespace: Namespace, id: impl Into<String>) -> StateResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(StateError::InvalidKey(format!("empty {namespace} id")));
        }
        if id.as_bytes().contains(&SEPARATOR) {
            return Err(StateError::InvalidKey(format!(
                "{namespace} id {id:?} contains NUL"
            )));
        }
        Ok(Self { namespace, id })
    }

    /// Key of a camera record.
    ///
    /// # Errors
    ///
    /// See [`StateKey::new`].
    pub fn camera(device_id: &str) -> StateResult<Self> {
        Self::new(Namespace::Camera, device_id)
    }

    /// Key of an access-log record.
    ///
    /// # Errors
    ///
    /// See [`StateKey::new`].
    pub fn access_log(log_id: &str) -> StateResult<Self> {
        Self::new(Namespace::AccessLog, log_id)
    }

    /// Key of a video content record.
    ///
    /// # Errors
    ///
    /// See [`StateKey::new`].
    pub fn video(content_id: &str) -> StateResult<Self> {
        Self::new(Namespace::Video, content_id)
    }

    /// Parses an encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidKey`] if the bytes are not a namespaced key.
    pub fn from_bytes(bytes: &[u8]) -> StateResult<Self> {
        let split = bytes
            .iter()
            .position(|b| *b == SEPARATOR)
            .ok_or_else(|| StateError::InvalidKey("missing namespace separator".into()))?;
        let namespace = Namespace::from_tag(&bytes[..split]).ok_or_else(|| {
            StateError::InvalidKey(format!(
                "unknown namespace {:?}",
                String::from_utf8_lossy(&bytes[..split])
            ))
        })?;
        let id = std::str::from_utf8(&bytes[split + 1..])
            .map_err(|_| StateError::InvalidKey("id is not UTF-8".into()))?;
        Self::new(namespace, id)
    }

    /// Encodes the key for the store.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let tag = self.namespace.tag().as_bytes();
        let mut out = Vec::with_capacity(tag.len() + 1 + self.id.len());
        out.extend_from_slice(tag);
        out.push(SEPARATOR);
        out.extend_from_slice(self.id.as_bytes());
        out
    }

    /// The key's namespace.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The entity identifier within the namespace.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_different_namespaces_differ() {
        let camera = StateKey::camera("X-1").unwrap();
        let video = StateKey::video("X-1").unwrap();
        assert_ne!(camera.to_bytes(), video.to_bytes());
    }

    #[test]
    fn encoded_layout() {
        let key = StateKey::camera("CAM-1").unwrap();
        assert_eq!(key.to_bytes(), b"camera\0CAM-1".to_vec());
        assert_eq!(key.to_string(), "camera/CAM-1");
    }

    #[test]
    fn parse_back() {
        let key = StateKey::access_log("LOG-CAM-1-tx9").unwrap();
        let parsed = StateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.namespace(), Namespace::AccessLog);
        assert_eq!(parsed.id(), "LOG-CAM-1-tx9");
    }

    #[test]
    fn namespace_contains() {
        let key = StateKey::video("V-1").unwrap().to_bytes();
        assert!(Namespace::Video.contains(&key));
        assert!(!Namespace::Camera.contains(&key));
        // A bare tag with no id is not a key in the namespace.
        assert!(!Namespace::Video.contains(b"video"));
        assert!(!Namespace::Video.contains(b"videos\0x"));
    }

    #[test]
    fn reject_bad_ids() {
        assert!(matches!(StateKey::camera(""), Err(StateError::InvalidKey(_))));
        assert!(matches!(
            StateKey::camera("a\0b"),
            Err(StateError::InvalidKey(_))
        ));
    }

    #[test]
    fn reject_unknown_namespace() {
        assert!(StateKey::from_bytes(b"widget\0W-1").is_err());
        assert!(StateKey::from_bytes(b"CAM-1").is_err());
    }
}
