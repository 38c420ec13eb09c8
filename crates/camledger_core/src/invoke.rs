//! String-argument invocation of ledger operations.
//!
//! This is the call shape a gateway sees: a function name plus a fixed
//! number of string arguments in, a JSON payload out. Non-string values
//! (metadata, duration) arrive as text and are parsed by the operation.

use crate::context::TxContext;
use crate::error::{CoreError, CoreResult};
use crate::ledger::{Ledger, VideoAnchor};
use crate::record::RecordCodec;
use camledger_codec::Value;
use camledger_state::WorldState;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A ledger operation addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `InitLedger()`
    InitLedger,
    /// `RegisterCamera(deviceID, publicKey, location, model)`
    RegisterCamera,
    /// `ReadCamera(deviceID)`
    ReadCamera,
    /// `UpdateCameraStatus(deviceID, newStatus)`
    UpdateCameraStatus,
    /// `LogAccess(cameraID, accessorID, action)`
    LogAccess,
    /// `AnchorVideoContent(contentID, ipfsCID, cameraID, duration, encryptionKeyHash, metadata)`
    AnchorVideoContent,
    /// `ReadVideoContent(contentID)`
    ReadVideoContent,
    /// `GetCameraVideos(cameraID)`
    GetCameraVideos,
    /// `GetAllCameras()`
    GetAllCameras,
    /// `GetCameraAccessLogs(cameraID)`
    GetCameraAccessLogs,
    /// `CameraExists(deviceID)`
    CameraExists,
    /// `DeleteCamera(deviceID)`
    DeleteCamera,
}

impl Function {
    /// Every function.
    pub const ALL: [Function; 12] = [
        Function::InitLedger,
        Function::RegisterCamera,
        Function::ReadCamera,
        Function::UpdateCameraStatus,
        Function::LogAccess,
        Function::AnchorVideoContent,
        Function::ReadVideoContent,
        Function::GetCameraVideos,
        Function::GetAllCameras,
        Function::GetCameraAccessLogs,
        Function::CameraExists,
        Function::DeleteCamera,
    ];

    /// Invocation name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Function::InitLedger => "InitLedger",
            Function::RegisterCamera => "RegisterCamera",
            Function::ReadCamera => "ReadCamera",
            Function::UpdateCameraStatus => "UpdateCameraStatus",
            Function::LogAccess => "LogAccess",
            Function::AnchorVideoContent => "AnchorVideoContent",
            Function::ReadVideoContent => "ReadVideoContent",
            Function::GetCameraVideos => "GetCameraVideos",
            Function::GetAllCameras => "GetAllCameras",
            Function::GetCameraAccessLogs => "GetCameraAccessLogs",
            Function::CameraExists => "CameraExists",
            Function::DeleteCamera => "DeleteCamera",
        }
    }

    /// Number of string arguments.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Function::InitLedger | Function::GetAllCameras => 0,
            Function::ReadCamera
            | Function::ReadVideoContent
            | Function::GetCameraVideos
            | Function::GetCameraAccessLogs
            | Function::CameraExists
            | Function::DeleteCamera => 1,
            Function::UpdateCameraStatus => 2,
            Function::LogAccess => 3,
            Function::RegisterCamera => 4,
            Function::AnchorVideoContent => 6,
        }
    }

    /// Returns `true` for queries, which never write.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Function::ReadCamera
                | Function::ReadVideoContent
                | Function::GetCameraVideos
                | Function::GetAllCameras
                | Function::GetCameraAccessLogs
                | Function::CameraExists
        )
    }
}

impl FromStr for Function {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown function {s:?}")))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_arity<A: AsRef<str>>(function: Function, args: &[A]) -> CoreResult<Vec<&str>> {
    if args.len() != function.arity() {
        return Err(CoreError::invalid_argument(format!(
            "{function} takes {} argument(s), got {}",
            function.arity(),
            args.len()
        )));
    }
    Ok(args.iter().map(AsRef::as_ref).collect())
}

fn record_json<R: RecordCodec>(record: &R) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(&record.to_value())?)
}

fn records_json<R: RecordCodec>(records: &[R]) -> CoreResult<Vec<u8>> {
    let values: Vec<Value> = records.iter().map(RecordCodec::to_value).collect();
    Ok(serde_json::to_vec(&values)?)
}

fn unit_json() -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(&())?)
}

impl<S: WorldState> Ledger<S> {
    /// Invokes `function` by name and returns its result as JSON.
    ///
    /// Records are returned as their stored field maps, `docType`
    /// included; unit results are `null`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidArgument`] for an unknown function or the wrong
    /// number of arguments, otherwise whatever the operation returns.
    pub fn invoke<A: AsRef<str>>(
        &mut self,
        ctx: &TxContext,
        function: &str,
        args: &[A],
    ) -> CoreResult<Vec<u8>> {
        let function: Function = function.parse()?;
        let a = check_arity(function, args)?;
        debug!(%function, tx_id = ctx.tx_id(), "submit");

        match function {
            Function::InitLedger => {
                self.init_ledger(ctx)?;
                unit_json()
            }
            Function::RegisterCamera => {
                record_json(&self.register_camera(ctx, a[0], a[1], a[2], a[3])?)
            }
            Function::UpdateCameraStatus => {
                record_json(&self.update_camera_status(ctx, a[0], a[1])?)
            }
            Function::LogAccess => record_json(&self.log_access(ctx, a[0], a[1], a[2])?),
            Function::AnchorVideoContent => {
                let anchor = VideoAnchor {
                    content_id: a[0],
                    content_locator: a[1],
                    camera_id: a[2],
                    duration: a[3],
                    encryption_key_hash: a[4],
                    metadata: a[5],
                };
                record_json(&self.anchor_video_content(ctx, anchor)?)
            }
            Function::DeleteCamera => {
                self.delete_camera(ctx, a[0])?;
                unit_json()
            }
            Function::ReadCamera
            | Function::ReadVideoContent
            | Function::GetCameraVideos
            | Function::GetAllCameras
            | Function::GetCameraAccessLogs
            | Function::CameraExists => self.evaluate(function.name(), args),
        }
    }

    /// Invokes a query by name and returns its result as JSON.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidArgument`] if `function` is unknown, takes the
    /// wrong number of arguments, or would write.
    pub fn evaluate<A: AsRef<str>>(&self, function: &str, args: &[A]) -> CoreResult<Vec<u8>> {
        let function: Function = function.parse()?;
        if !function.is_read_only() {
            return Err(CoreError::invalid_argument(format!(
                "{function} writes to the ledger and must be submitted"
            )));
        }
        let a = check_arity(function, args)?;
        debug!(%function, "evaluate");

        match function {
            Function::ReadCamera => record_json(&self.read_camera(a[0])?),
            Function::ReadVideoContent => record_json(&self.read_video_content(a[0])?),
            Function::GetCameraVideos => records_json(&self.get_camera_videos(a[0])?),
            Function::GetAllCameras => records_json(&self.get_all_cameras()?),
            Function::GetCameraAccessLogs => records_json(&self.get_camera_access_logs(a[0])?),
            Function::CameraExists => Ok(serde_json::to_vec(&self.camera_exists(a[0])?)?),
            _ => Err(CoreError::invalid_argument(format!(
                "{function} writes to the ledger and must be submitted"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use camledger_state::InMemoryWorldState;
    use chrono::{TimeZone, Utc};

    fn ctx(tx_id: &str) -> TxContext {
        TxContext::new(
            "Org2MSP",
            tx_id,
            Utc.with_ymd_and_hms(2025, 2, 2, 8, 30, 0).unwrap(),
        )
    }

    fn json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn names_round_trip() {
        for function in Function::ALL {
            assert_eq!(function.name().parse::<Function>().unwrap(), function);
        }
        assert!("registerCamera".parse::<Function>().is_err());
    }

    #[test]
    fn submit_and_query() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        let out = ledger
            .invoke(&ctx("t1"), "RegisterCamera", &["CAM-1", "PK", "Dock", "Pi"])
            .unwrap();
        assert_eq!(json(&out)["registeredBy"], "Org2MSP");
        assert_eq!(json(&out)["docType"], "camera");

        let out = ledger.evaluate("CameraExists", &["CAM-1"]).unwrap();
        assert_eq!(out, b"true");
        let out = ledger.evaluate("GetAllCameras", &[] as &[&str]).unwrap();
        assert_eq!(json(&out).as_array().unwrap().len(), 1);

        let out = ledger.invoke(&ctx("t2"), "DeleteCamera", &["CAM-1"]).unwrap();
        assert_eq!(out, b"null");
        let out = ledger.invoke(&ctx("t3"), "CameraExists", &["CAM-1"]).unwrap();
        assert_eq!(out, b"false");
    }

    #[test]
    fn anchor_through_invoke() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        ledger
            .invoke(&ctx("t1"), "RegisterCamera", &["CAM-2", "PK", "Dock", "Pi"])
            .unwrap();
        let out = ledger
            .invoke(
                &ctx("t2"),
                "AnchorVideoContent",
                &["V-1", "QmX", "CAM-2", "42.5", "KH", r#"{"fps":30}"#],
            )
            .unwrap();
        let value = json(&out);
        assert_eq!(value["ipfsCID"], "QmX");
        assert_eq!(value["duration"], 42.5);
        assert_eq!(value["metadata"]["fps"], 30);
    }

    #[test]
    fn wrong_arity() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        let err = ledger
            .invoke(&ctx("t"), "RegisterCamera", &["CAM-1"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(ledger.state().is_empty().unwrap());

        let err = ledger.evaluate("ReadCamera", &[] as &[&str]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn unknown_function() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        let err = ledger
            .invoke(&ctx("t"), "DropAll", &[] as &[&str])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn evaluate_refuses_writes() {
        let ledger = Ledger::new(InMemoryWorldState::new());
        let err = ledger.evaluate("InitLedger", &[] as &[&str]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn errors_pass_through() {
        let ledger = Ledger::new(InMemoryWorldState::new());
        let err = ledger.evaluate("ReadCamera", &["ghost"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
