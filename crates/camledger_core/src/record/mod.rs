//! Ledger records.
//!
//! Three entity kinds share the world state. Each stored value is the
//! canonical CBOR map of one record plus a `docType` discriminator, and
//! decodes into the [`Record`] sum type.

mod access_log;
mod camera;
mod video;

pub use access_log::AccessLog;
pub use camera::{CameraDevice, CameraStatus};
pub use video::{VideoContent, VideoMetadata};

use crate::error::{CoreError, CoreResult};
use camledger_codec::{from_cbor, to_canonical_cbor, Value};
use camledger_state::{Namespace, StateKey};
use std::fmt;

/// Name of the discriminator field.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Discriminator naming a record's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    /// [`CameraDevice`].
    Camera,
    /// [`AccessLog`].
    AccessLog,
    /// [`VideoContent`].
    VideoContent,
}

impl DocType {
    /// Wire spelling of the discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DocType::Camera => "camera",
            DocType::AccessLog => "accesslog",
            DocType::VideoContent => "videocontent",
        }
    }

    /// Parses the wire spelling.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "camera" => Some(DocType::Camera),
            "accesslog" => Some(DocType::AccessLog),
            "videocontent" => Some(DocType::VideoContent),
            _ => None,
        }
    }

    /// Key namespace records of this kind are stored under.
    #[must_use]
    pub const fn namespace(self) -> Namespace {
        match self {
            DocType::Camera => Namespace::Camera,
            DocType::AccessLog => Namespace::AccessLog,
            DocType::VideoContent => Namespace::Video,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for record types stored in the world state.
///
/// Implementors list their fields; the discriminator and the canonical
/// encoding are handled here, so every kind is written the same way.
pub trait RecordCodec: Sized {
    /// Discriminator of this kind.
    const DOC_TYPE: DocType;

    /// Store key of this record.
    fn state_key(&self) -> CoreResult<StateKey>;

    /// Field name/value pairs, without the discriminator.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Builds the record from a decoded map.
    fn from_fields(fields: &FieldReader<'_>) -> CoreResult<Self>;

    /// Extracts this kind from the tagged union.
    fn from_record(record: Record) -> Option<Self>;

    /// The record as a canonical map, discriminator included.
    fn to_value(&self) -> Value {
        let mut fields = self.fields();
        fields.push((DOC_TYPE_FIELD, Value::from(Self::DOC_TYPE.as_str())));
        Value::from_fields(fields)
    }

    /// Encodes the record to canonical CBOR bytes.
    ///
    /// Identical records produce identical bytes on every node.
    fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(to_canonical_cbor(&self.to_value())?)
    }

    /// Decodes a record of exactly this kind.
    fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Record::decode(bytes).and_then(|record| {
            let found = record.doc_type();
            Self::from_record(record).ok_or_else(|| {
                CoreError::corrupt_record(format!(
                    "expected {} record, found {found}",
                    Self::DOC_TYPE
                ))
            })
        })
    }
}

/// A decoded record of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A camera device.
    Camera(CameraDevice),
    /// An access log entry.
    AccessLog(AccessLog),
    /// A video content anchor.
    VideoContent(VideoContent),
}

impl Record {
    /// Decodes stored bytes, dispatching on `docType`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not canonical CBOR, carry no known
    /// discriminator, or lack a required field.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let value = from_cbor(bytes)?;
        let doc_type = value
            .get(DOC_TYPE_FIELD)
            .and_then(Value::as_text)
            .ok_or_else(|| CoreError::corrupt_record("missing docType"))?;
        let doc_type = DocType::parse(doc_type)
            .ok_or_else(|| CoreError::corrupt_record(format!("unknown docType {doc_type:?}")))?;

        let reader = FieldReader::new(&value, doc_type)?;
        Ok(match doc_type {
            DocType::Camera => Record::Camera(CameraDevice::from_fields(&reader)?),
            DocType::AccessLog => Record::AccessLog(AccessLog::from_fields(&reader)?),
            DocType::VideoContent => Record::VideoContent(VideoContent::from_fields(&reader)?),
        })
    }

    /// Discriminator of the contained record.
    #[must_use]
    pub fn doc_type(&self) -> DocType {
        match self {
            Record::Camera(_) => DocType::Camera,
            Record::AccessLog(_) => DocType::AccessLog,
            Record::VideoContent(_) => DocType::VideoContent,
        }
    }
}

/// Typed field access over a decoded record map.
pub struct FieldReader<'a> {
    value: &'a Value,
    doc_type: DocType,
}

impl<'a> FieldReader<'a> {
    fn new(value: &'a Value, doc_type: DocType) -> CoreResult<Self> {
        if value.as_map().is_none() {
            return Err(CoreError::corrupt_record(format!(
                "{doc_type} record is not a map"
            )));
        }
        Ok(Self { value, doc_type })
    }

    fn field(&self, name: &str) -> CoreResult<&'a Value> {
        self.value.get(name).ok_or_else(|| {
            CoreError::corrupt_record(format!("{} record missing {name}", self.doc_type))
        })
    }

    fn mismatch(&self, name: &str, expected: &str) -> CoreError {
        CoreError::corrupt_record(format!(
            "{} record field {name} is not {expected}",
            self.doc_type
        ))
    }

    /// Required text field.
    pub fn text(&self, name: &str) -> CoreResult<String> {
        self.field(name)?
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(name, "text"))
    }

    /// Text field that may be absent; absent reads as empty.
    pub fn text_or_empty(&self, name: &str) -> CoreResult<String> {
        match self.value.get(name) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(v) => v
                .as_text()
                .map(str::to_string)
                .ok_or_else(|| self.mismatch(name, "text")),
        }
    }

    /// Required boolean field.
    pub fn bool(&self, name: &str) -> CoreResult<bool> {
        self.field(name)?
            .as_bool()
            .ok_or_else(|| self.mismatch(name, "a boolean"))
    }

    /// Required numeric field.
    pub fn float(&self, name: &str) -> CoreResult<f64> {
        self.field(name)?
            .as_float()
            .ok_or_else(|| self.mismatch(name, "a number"))
    }

    /// Optional field, raw.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&'a Value> {
        self.value.get(name)
    }
}
