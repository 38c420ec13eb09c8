//! Input and state validation shared by the ledger operations.
//!
//! Identifiers and statuses are checked strictly. Video metadata is the
//! one lenient input: anything that is not a JSON object, or that nests too
//! deep to be stored, is replaced by an empty mapping rather than failing
//! the transaction.

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::record::{CameraDevice, CameraStatus, VideoMetadata};
use crate::transaction::Transaction;
use camledger_codec::{from_json_str, MAX_DEPTH};
use camledger_state::{StateKey, WorldState};
use tracing::warn;

/// Returns `true` if a camera is stored under `device_id`.
pub fn camera_exists<S: WorldState + ?Sized>(
    tx: &Transaction<'_, S>,
    device_id: &str,
) -> CoreResult<bool> {
    tx.exists(&StateKey::camera(device_id)?)
}

/// Loads the camera stored under `device_id`.
///
/// # Errors
///
/// [`CoreError::NotFound`] if there is none.
pub fn load_camera<S: WorldState + ?Sized>(
    tx: &Transaction<'_, S>,
    device_id: &str,
) -> CoreResult<CameraDevice> {
    tx.get_record(&StateKey::camera(device_id)?)?
        .ok_or_else(|| CoreError::not_found(EntityKind::Camera, device_id))
}

/// Fails unless `camera` is active.
pub fn require_active(camera: &CameraDevice) -> CoreResult<()> {
    if camera.status.is_active() {
        Ok(())
    } else {
        Err(CoreError::precondition_failed(format!(
            "camera {} is not active (status: {})",
            camera.device_id, camera.status
        )))
    }
}

/// Fails if an identifier used as a key is empty.
pub fn require_non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() {
        Err(CoreError::invalid_argument(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Parses a requested camera status.
pub fn parse_status(raw: &str) -> CoreResult<CameraStatus> {
    raw.parse()
}

/// Parses caller-supplied metadata JSON.
///
/// Never fails: malformed JSON, a non-object value, or an object nested
/// deeper than a stored record may be yields empty metadata and a warning.
#[must_use]
pub fn parse_metadata(raw: &str) -> VideoMetadata {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return VideoMetadata::empty();
    }
    match from_json_str(trimmed) {
        // The metadata map sits one level below the record itself.
        Ok(value) if value.nesting() >= MAX_DEPTH => {
            warn!(
                nesting = value.nesting(),
                max = MAX_DEPTH - 1,
                "video metadata nested too deep, storing empty metadata"
            );
            VideoMetadata::empty()
        }
        Ok(value) => VideoMetadata::from_value(value).unwrap_or_else(|| {
            warn!("video metadata is not a JSON object, storing empty metadata");
            VideoMetadata::empty()
        }),
        Err(err) => {
            warn!(error = %err, "malformed video metadata, storing empty metadata");
            VideoMetadata::empty()
        }
    }
}

/// Parses a duration in seconds.
///
/// Reads the longest numeric prefix after leading whitespace, so `"12.5s"`
/// is `12.5` and `"abc"` is NaN. `Infinity` is accepted.
///
/// # Errors
///
/// [`CoreError::InvalidArgument`] for a finite negative duration.
pub fn parse_duration(raw: &str) -> CoreResult<f64> {
    let duration = parse_float_prefix(raw);
    if duration.is_finite() && duration < 0.0 {
        return Err(CoreError::invalid_argument(format!(
            "duration must not be negative, got {raw:?}"
        )));
    }
    Ok(duration)
}

fn parse_float_prefix(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}
