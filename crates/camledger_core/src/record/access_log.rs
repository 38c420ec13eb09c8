use super::{DocType, FieldReader, Record, RecordCodec};
use crate::error::CoreResult;
use camledger_codec::Value;
use camledger_state::StateKey;
use serde::{Deserialize, Serialize};

/// One access to a camera, kept for audit.
///
/// Never mutated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLog {
    /// Derived identifier, `LOG-<cameraID>-<txID>`.
    #[serde(rename = "logID")]
    pub log_id: String,
    /// Camera that was accessed.
    #[serde(rename = "cameraID")]
    pub camera_id: String,
    /// Who accessed it.
    #[serde(rename = "accessorID")]
    pub accessor_id: String,
    /// Transaction timestamp.
    pub timestamp: String,
    /// Free-form action label.
    pub action: String,
    /// Always `true` for now.
    pub approved: bool,
}

impl AccessLog {
    /// Log identifier for an access recorded by transaction `tx_id`.
    #[must_use]
    pub fn derive_id(camera_id: &str, tx_id: &str) -> String {
        format!("LOG-{camera_id}-{tx_id}")
    }
}

impl RecordCodec for AccessLog {
    const DOC_TYPE: DocType = DocType::AccessLog;

    fn state_key(&self) -> CoreResult<StateKey> {
        Ok(StateKey::access_log(&self.log_id)?)
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("logID", Value::from(self.log_id.as_str())),
            ("cameraID", Value::from(self.camera_id.as_str())),
            ("accessorID", Value::from(self.accessor_id.as_str())),
            ("timestamp", Value::from(self.timestamp.as_str())),
            ("action", Value::from(self.action.as_str())),
            ("approved", Value::from(self.approved)),
        ]
    }

    fn from_fields(fields: &FieldReader<'_>) -> CoreResult<Self> {
        Ok(Self {
            log_id: fields.text("logID")?,
            camera_id: fields.text("cameraID")?,
            accessor_id: fields.text_or_empty("accessorID")?,
            timestamp: fields.text_or_empty("timestamp")?,
            action: fields.text_or_empty("action")?,
            approved: fields.bool("approved")?,
        })
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::AccessLog(log) => Some(log),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_id() {
        assert_eq!(AccessLog::derive_id("CAM-1", "tx42"), "LOG-CAM-1-tx42");
    }

    #[test]
    fn encode_decode() {
        let log = AccessLog {
            log_id: AccessLog::derive_id("CAM-1", "tx42"),
            camera_id: "CAM-1".into(),
            accessor_id: "userX".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            action: "VIEW".into(),
            approved: true,
        };
        let bytes = log.encode().unwrap();
        assert_eq!(AccessLog::decode(&bytes).unwrap(), log);
        assert_eq!(
            log.state_key().unwrap().to_bytes(),
            b"log\0LOG-CAM-1-tx42".to_vec()
        );
    }
}
