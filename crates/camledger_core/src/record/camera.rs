use super::{DocType, FieldReader, Record, RecordCodec};
use crate::error::{CoreError, CoreResult};
use camledger_codec::Value;
use camledger_state::StateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operational status of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    /// Accepts access logs and video anchors.
    Active,
    /// Temporarily out of service.
    Inactive,
    /// Permanently withdrawn.
    Revoked,
}

impl CameraStatus {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CameraStatus::Active => "active",
            CameraStatus::Inactive => "inactive",
            CameraStatus::Revoked => "revoked",
        }
    }

    /// Returns `true` for [`CameraStatus::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, CameraStatus::Active)
    }
}

impl FromStr for CameraStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CameraStatus::Active),
            "inactive" => Ok(CameraStatus::Inactive),
            "revoked" => Ok(CameraStatus::Revoked),
            other => Err(CoreError::invalid_argument(format!(
                "unknown camera status {other:?}, expected active, inactive or revoked"
            ))),
        }
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered surveillance device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Caller-supplied device identifier; the record's key.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Device public key, opaque.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Identity of the registering caller.
    #[serde(rename = "registeredBy")]
    pub registered_by: String,
    /// Transaction timestamp of the registration.
    #[serde(rename = "registrationTime")]
    pub registration_time: String,
    /// Physical location.
    pub location: String,
    /// Hardware model.
    pub model: String,
    /// Current status.
    pub status: CameraStatus,
}

impl RecordCodec for CameraDevice {
    const DOC_TYPE: DocType = DocType::Camera;

    fn state_key(&self) -> CoreResult<StateKey> {
        Ok(StateKey::camera(&self.device_id)?)
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("deviceID", Value::from(self.device_id.as_str())),
            ("publicKey", Value::from(self.public_key.as_str())),
            ("registeredBy", Value::from(self.registered_by.as_str())),
            ("registrationTime", Value::from(self.registration_time.as_str())),
            ("location", Value::from(self.location.as_str())),
            ("model", Value::from(self.model.as_str())),
            ("status", Value::from(self.status.as_str())),
        ]
    }

    fn from_fields(fields: &FieldReader<'_>) -> CoreResult<Self> {
        let status = fields.text("status")?;
        let status = status
            .parse()
            .map_err(|_| CoreError::corrupt_record(format!("camera status {status:?}")))?;
        Ok(Self {
            device_id: fields.text("deviceID")?,
            public_key: fields.text_or_empty("publicKey")?,
            registered_by: fields.text_or_empty("registeredBy")?,
            registration_time: fields.text_or_empty("registrationTime")?,
            location: fields.text_or_empty("location")?,
            model: fields.text_or_empty("model")?,
            status,
        })
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Camera(camera) => Some(camera),
            _ => None,
        }
    }
}
