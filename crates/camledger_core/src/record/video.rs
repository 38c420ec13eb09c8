use super::{DocType, FieldReader, Record, RecordCodec};
use crate::error::{CoreError, CoreResult};
use camledger_codec::Value;
use camledger_state::StateKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Open key/value mapping attached to a video anchor.
///
/// Always a map. Well-known keys have typed accessors; any other key is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata(Value);

impl VideoMetadata {
    /// Empty metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::empty_map())
    }

    /// Wraps a map value; `None` for anything else.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        if value.as_map().is_some() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The underlying map.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.as_map().map_or(0, <[_]>::len)
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up an arbitrary key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `resolution`, e.g. `"1080p"`.
    #[must_use]
    pub fn resolution(&self) -> Option<&str> {
        self.get("resolution").and_then(Value::as_text)
    }

    /// `fps`.
    #[must_use]
    pub fn fps(&self) -> Option<f64> {
        self.get("fps").and_then(Value::as_float)
    }

    /// `faces_detected`, the number of faces found in the content.
    #[must_use]
    pub fn faces_detected(&self) -> Option<i64> {
        self.get("faces_detected").and_then(Value::as_integer)
    }

    /// `faces_blurred`, how many of the detected faces were blurred.
    #[must_use]
    pub fn faces_blurred(&self) -> Option<i64> {
        self.get("faces_blurred").and_then(Value::as_integer)
    }
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for VideoMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VideoMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(Value::from(json))
            .ok_or_else(|| serde::de::Error::custom("metadata must be an object"))
    }
}

/// Reference to video content stored outside the ledger.
///
/// Read-only once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoContent {
    /// Caller-supplied identifier; the record's key.
    #[serde(rename = "contentID")]
    pub content_id: String,
    /// Opaque locator of the content in the blob store.
    #[serde(rename = "ipfsCID")]
    pub content_locator: String,
    /// Camera that produced the content.
    #[serde(rename = "cameraID")]
    pub camera_id: String,
    /// Transaction timestamp.
    pub timestamp: String,
    /// Length in seconds; NaN when the caller's value was not numeric.
    pub duration: f64,
    /// Hash of the content encryption key.
    #[serde(rename = "encryptionKeyHash")]
    pub encryption_key_hash: String,
    /// Extra attributes.
    #[serde(default)]
    pub metadata: VideoMetadata,
}

impl RecordCodec for VideoContent {
    const DOC_TYPE: DocType = DocType::VideoContent;

    fn state_key(&self) -> CoreResult<StateKey> {
        Ok(StateKey::video(&self.content_id)?)
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("contentID", Value::from(self.content_id.as_str())),
            ("ipfsCID", Value::from(self.content_locator.as_str())),
            ("cameraID", Value::from(self.camera_id.as_str())),
            ("timestamp", Value::from(self.timestamp.as_str())),
            ("duration", Value::Float(self.duration)),
            (
                "encryptionKeyHash",
                Value::from(self.encryption_key_hash.as_str()),
            ),
            ("metadata", self.metadata.as_value().clone()),
        ]
    }

    fn from_fields(fields: &FieldReader<'_>) -> CoreResult<Self> {
        let metadata = match fields.optional("metadata") {
            None | Some(Value::Null) => VideoMetadata::empty(),
            Some(value) => VideoMetadata::from_value(value.clone())
                .ok_or_else(|| CoreError::corrupt_record("video metadata is not a map"))?,
        };
        Ok(Self {
            content_id: fields.text("contentID")?,
            content_locator: fields.text_or_empty("ipfsCID")?,
            camera_id: fields.text("cameraID")?,
            timestamp: fields.text_or_empty("timestamp")?,
            duration: fields.float("duration")?,
            encryption_key_hash: fields.text_or_empty("encryptionKeyHash")?,
            metadata,
        })
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::VideoContent(video) => Some(video),
            _ => None,
        }
    }
}
