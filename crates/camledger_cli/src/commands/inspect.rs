//! Inspect command implementation.

use camledger_core::{DocType, Record};
use camledger_state::{FileWorldState, Namespace, StateError, WorldState};
use serde::Serialize;
use std::path::Path;

/// Ledger inspection result.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct InspectResult {
    /// Journal path.
    pub path: String,
    /// Journal size in bytes.
    pub journal_size: u64,
    /// Number of live keys.
    pub live_keys: usize,
    /// Camera records.
    pub cameras: usize,
    /// Access log records.
    pub access_logs: usize,
    /// Video content records.
    pub videos: usize,
    /// Values that do not decode as a record of their namespace's kind.
    pub undecodable: usize,
    /// Keys outside every namespace.
    pub foreign_keys: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No ledger found at {}", path.display()).into());
    }

    let state = FileWorldState::open(path)?;
    let mut result = inspect(&state)?;
    result.path = path.display().to_string();
    result.journal_size = state.journal_len();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Ledger: {}", result.path);
            println!();
            println!("Journal:");
            println!("  Size:        {} bytes", result.journal_size);
            println!("  Live keys:   {}", result.live_keys);
            println!();
            println!("Records:");
            println!("  Cameras:     {}", result.cameras);
            println!("  Access logs: {}", result.access_logs);
            println!("  Videos:      {}", result.videos);
            if result.undecodable > 0 || result.foreign_keys > 0 {
                println!();
                println!("Anomalies:");
                println!("  Undecodable: {}", result.undecodable);
                println!("  Foreign:     {}", result.foreign_keys);
            }
        }
    }

    Ok(())
}

/// Classifies every entry of `state`.
pub fn inspect<S: WorldState + ?Sized>(state: &S) -> Result<InspectResult, StateError> {
    let mut result = InspectResult::default();

    for entry in state.scan_all()? {
        let (key, value) = entry?;
        result.live_keys += 1;

        let Some(namespace) = Namespace::ALL.into_iter().find(|ns| ns.contains(&key)) else {
            result.foreign_keys += 1;
            continue;
        };
        match Record::decode(&value).map(|r| r.doc_type()) {
            Ok(doc_type) if doc_type.namespace() == namespace => match doc_type {
                DocType::Camera => result.cameras += 1,
                DocType::AccessLog => result.access_logs += 1,
                DocType::VideoContent => result.videos += 1,
            },
            _ => result.undecodable += 1,
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camledger_core::{Ledger, TxContext, VideoAnchor};
    use camledger_state::{InMemoryWorldState, StateKey};
    use chrono::Utc;

    #[test]
    fn counts_by_kind() {
        let ctx = TxContext::new("Org1MSP", "t1", Utc::now());
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        ledger.register_camera(&ctx, "CAM-1", "PK", "Lab", "Pi").unwrap();
        ledger.log_access(&ctx, "CAM-1", "userX", "VIEW").unwrap();
        ledger
            .anchor_video_content(
                &ctx,
                VideoAnchor {
                    content_id: "V-1",
                    camera_id: "CAM-1",
                    duration: "1",
                    ..VideoAnchor::default()
                },
            )
            .unwrap();

        let mut state = ledger.into_state();
        state
            .put(&StateKey::video("BAD").unwrap().to_bytes(), b"garbage")
            .unwrap();
        state.put(b"stray", b"x").unwrap();

        let result = inspect(&state).unwrap();
        assert_eq!(result.live_keys, 5);
        assert_eq!(result.cameras, 1);
        assert_eq!(result.access_logs, 1);
        assert_eq!(result.videos, 1);
        assert_eq!(result.undecodable, 1);
        assert_eq!(result.foreign_keys, 1);
    }
}
