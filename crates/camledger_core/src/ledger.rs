//! The transaction processor.

use crate::config::Config;
use crate::context::TxContext;
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::record::{AccessLog, CameraDevice, CameraStatus, VideoContent};
use crate::scan::Scanner;
use crate::transaction::Transaction;
use crate::validate::{
    camera_exists, load_camera, parse_duration, parse_metadata, parse_status, require_active,
    require_non_empty,
};
use camledger_state::{StateKey, WorldState};
use tracing::{debug, info};

/// Arguments of [`Ledger::anchor_video_content`], as the caller sent them.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoAnchor<'a> {
    /// Identifier of the new content record.
    pub content_id: &'a str,
    /// Opaque blob-store locator.
    pub content_locator: &'a str,
    /// Camera that produced the content.
    pub camera_id: &'a str,
    /// Duration in seconds, as text.
    pub duration: &'a str,
    /// Hash of the content encryption key.
    pub encryption_key_hash: &'a str,
    /// Metadata as JSON text.
    pub metadata: &'a str,
}

/// Camera registry and audit ledger over a world state.
///
/// Write operations take `&mut self` and a [`TxContext`]. Each runs inside
/// a [`Transaction`]; its writes reach the world state only if the whole
/// operation succeeded, so a failed call leaves the state untouched.
///
/// # Example
///
/// ```rust
/// use camledger_core::{Ledger, TxContext};
/// use camledger_state::InMemoryWorldState;
/// use chrono::{TimeZone, Utc};
///
/// let mut ledger = Ledger::new(InMemoryWorldState::new());
/// let ctx = TxContext::new("Org1MSP", "tx-1", Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
///
/// ledger.register_camera(&ctx, "CAM-1", "PK", "Gate 3", "Pi 5").unwrap();
/// assert!(ledger.camera_exists("CAM-1").unwrap());
/// assert_eq!(ledger.read_camera("CAM-1").unwrap().registered_by, "Org1MSP");
/// ```
pub struct Ledger<S: WorldState> {
    state: S,
    config: Config,
}

impl<S: WorldState> Ledger<S> {
    /// Creates a ledger with default configuration.
    pub fn new(state: S) -> Self {
        Self::with_config(state, Config::default())
    }

    /// Creates a ledger with custom configuration.
    pub fn with_config(state: S, config: Config) -> Self {
        Self { state, config }
    }

    /// The underlying world state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the ledger, returning the world state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Runs `op` in a transaction and commits its writes if it succeeds.
    fn execute<T, F>(&mut self, ctx: &TxContext, operation: &str, op: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction<'_, S>, &Config) -> CoreResult<T>,
    {
        let (out, writes) = {
            let mut tx = Transaction::new(&self.state);
            let out = op(&mut tx, &self.config)?;
            (out, tx.into_writes())
        };
        let count = writes.len();
        writes.apply(&mut self.state)?;
        info!(
            operation,
            tx_id = ctx.tx_id(),
            caller = ctx.caller(),
            writes = count,
            "transaction committed"
        );
        Ok(out)
    }

    fn read<T, F>(&self, op: F) -> CoreResult<T>
    where
        F: FnOnce(&Transaction<'_, S>) -> CoreResult<T>,
    {
        op(&Transaction::new(&self.state))
    }

    fn scanner(&self) -> Scanner<'_, S> {
        Scanner::new(&self.state, self.config.scan_warn_threshold)
    }

    /// Seeds the configured demonstration camera.
    ///
    /// An existing record under the same id is overwritten.
    pub fn init_ledger(&mut self, ctx: &TxContext) -> CoreResult<()> {
        self.execute(ctx, "InitLedger", |tx, config| {
            let genesis = &config.genesis_camera;
            let camera = CameraDevice {
                device_id: genesis.device_id.clone(),
                public_key: genesis.public_key.clone(),
                registered_by: genesis.registered_by.clone(),
                registration_time: ctx.timestamp_string(),
                location: genesis.location.clone(),
                model: genesis.model.clone(),
                status: CameraStatus::Active,
            };
            tx.put_record(&camera)?;
            Ok(())
        })
    }

    /// Registers a new, active camera owned by the caller.
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyExists`] if `device_id` is taken.
    pub fn register_camera(
        &mut self,
        ctx: &TxContext,
        device_id: &str,
        public_key: &str,
        location: &str,
        model: &str,
    ) -> CoreResult<CameraDevice> {
        require_non_empty("deviceID", device_id)?;
        self.execute(ctx, "RegisterCamera", |tx, _| {
            if camera_exists(tx, device_id)? {
                return Err(CoreError::already_exists(EntityKind::Camera, device_id));
            }
            let camera = CameraDevice {
                device_id: device_id.to_string(),
                public_key: public_key.to_string(),
                registered_by: ctx.caller().to_string(),
                registration_time: ctx.timestamp_string(),
                location: location.to_string(),
                model: model.to_string(),
                status: CameraStatus::Active,
            };
            tx.put_record(&camera)?;
            Ok(camera)
        })
    }

    /// Reads a camera.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if there is no such camera.
    pub fn read_camera(&self, device_id: &str) -> CoreResult<CameraDevice> {
        require_non_empty("deviceID", device_id)?;
        debug!(device_id, "read camera");
        self.read(|tx| load_camera(tx, device_id))
    }

    /// Sets a camera's status.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidArgument`] for an unknown status,
    /// [`CoreError::NotFound`] if there is no such camera.
    pub fn update_camera_status(
        &mut self,
        ctx: &TxContext,
        device_id: &str,
        new_status: &str,
    ) -> CoreResult<CameraDevice> {
        require_non_empty("deviceID", device_id)?;
        let status = parse_status(new_status)?;
        self.execute(ctx, "UpdateCameraStatus", |tx, _| {
            let mut camera = load_camera(tx, device_id)?;
            camera.status = status;
            tx.put_record(&camera)?;
            Ok(camera)
        })
    }

    /// Records an access to an active camera.
    ///
    /// The log id is derived from the transaction id, so replaying the
    /// same transaction cannot add a second entry.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if there is no such camera,
    /// [`CoreError::PreconditionFailed`] if it is not active,
    /// [`CoreError::AlreadyExists`] if this transaction already logged an
    /// access to it.
    pub fn log_access(
        &mut self,
        ctx: &TxContext,
        camera_id: &str,
        accessor_id: &str,
        action: &str,
    ) -> CoreResult<AccessLog> {
        require_non_empty("cameraID", camera_id)?;
        self.execute(ctx, "LogAccess", |tx, _| {
            let camera = load_camera(tx, camera_id)?;
            require_active(&camera)?;

            let log_id = AccessLog::derive_id(camera_id, ctx.tx_id());
            if tx.exists(&StateKey::access_log(&log_id)?)? {
                return Err(CoreError::already_exists(EntityKind::AccessLog, log_id));
            }
            let log = AccessLog {
                log_id,
                camera_id: camera_id.to_string(),
                accessor_id: accessor_id.to_string(),
                timestamp: ctx.timestamp_string(),
                action: action.to_string(),
                approved: true,
            };
            tx.put_record(&log)?;
            Ok(log)
        })
    }

    /// Anchors off-ledger video content to an active camera.
    ///
    /// Malformed metadata is stored as an empty mapping.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidArgument`] for a negative duration,
    /// [`CoreError::NotFound`] if there is no such camera,
    /// [`CoreError::PreconditionFailed`] if it is not active,
    /// [`CoreError::AlreadyExists`] if `content_id` is taken.
    pub fn anchor_video_content(
        &mut self,
        ctx: &TxContext,
        anchor: VideoAnchor<'_>,
    ) -> CoreResult<VideoContent> {
        require_non_empty("contentID", anchor.content_id)?;
        require_non_empty("cameraID", anchor.camera_id)?;
        let duration = parse_duration(anchor.duration)?;

        self.execute(ctx, "AnchorVideoContent", |tx, _| {
            let camera = load_camera(tx, anchor.camera_id)?;
            require_active(&camera)?;

            let key = StateKey::video(anchor.content_id)?;
            if tx.exists(&key)? {
                return Err(CoreError::already_exists(
                    EntityKind::VideoContent,
                    anchor.content_id,
                ));
            }
            let video = VideoContent {
                content_id: anchor.content_id.to_string(),
                content_locator: anchor.content_locator.to_string(),
                camera_id: anchor.camera_id.to_string(),
                timestamp: ctx.timestamp_string(),
                duration,
                encryption_key_hash: anchor.encryption_key_hash.to_string(),
                metadata: parse_metadata(anchor.metadata),
            };
            tx.put_record(&video)?;
            Ok(video)
        })
    }

    /// Reads a video content record.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if there is no such record.
    pub fn read_video_content(&self, content_id: &str) -> CoreResult<VideoContent> {
        require_non_empty("contentID", content_id)?;
        debug!(content_id, "read video content");
        self.read(|tx| {
            tx.get_record(&StateKey::video(content_id)?)?
                .ok_or_else(|| CoreError::not_found(EntityKind::VideoContent, content_id))
        })
    }

    /// All video content anchored to `camera_id`, in scan order.
    pub fn get_camera_videos(&self, camera_id: &str) -> CoreResult<Vec<VideoContent>> {
        self.scanner()
            .scan_where(|video: &VideoContent| video.camera_id == camera_id)
    }

    /// All registered cameras, in scan order.
    pub fn get_all_cameras(&self) -> CoreResult<Vec<CameraDevice>> {
        self.scanner().scan_all()
    }

    /// All access logs for `camera_id`, in scan order.
    pub fn get_camera_access_logs(&self, camera_id: &str) -> CoreResult<Vec<AccessLog>> {
        self.scanner()
            .scan_where(|log: &AccessLog| log.camera_id == camera_id)
    }

    /// Returns `true` if a camera is registered under `device_id`.
    ///
    /// An id that cannot name a camera (empty, say) is simply absent.
    pub fn camera_exists(&self, device_id: &str) -> CoreResult<bool> {
        let Ok(key) = StateKey::camera(device_id) else {
            return Ok(false);
        };
        self.read(|tx| tx.exists(&key))
    }

    /// Removes a camera record.
    ///
    /// Its access logs and video anchors are kept.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if there is no such camera.
    pub fn delete_camera(&mut self, ctx: &TxContext, device_id: &str) -> CoreResult<()> {
        require_non_empty("deviceID", device_id)?;
        self.execute(ctx, "DeleteCamera", |tx, _| {
            let key = StateKey::camera(device_id)?;
            if !tx.exists(&key)? {
                return Err(CoreError::not_found(EntityKind::Camera, device_id));
            }
            tx.delete(&key);
            Ok(())
        })
    }
}
