//! End-to-end ledger scenarios.

use camledger_core::{
    AccessLog, CameraStatus, CoreError, EntityKind, ErrorKind, Ledger, RecordCodec, TxContext,
    VideoAnchor,
};
use camledger_state::{FileWorldState, InMemoryWorldState, StateKey, WorldState};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap()
}

fn ctx(n: i64) -> TxContext {
    TxContext::new("Org1MSP", format!("tx{n}"), epoch() + Duration::milliseconds(n))
}

fn memory_ledger() -> Ledger<InMemoryWorldState> {
    Ledger::new(InMemoryWorldState::new())
}

#[test]
fn duplicate_registration_keeps_first() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-1", "PK-A", "North Gate", "Pi 5")
        .unwrap();
    let before = ledger.state().snapshot();

    let err = ledger
        .register_camera(&ctx(2), "CAM-1", "PK-B", "South Gate", "Pi 4")
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::AlreadyExists {
            kind: EntityKind::Camera,
            ..
        }
    ));
    assert_eq!(ledger.state().snapshot(), before);

    let camera = ledger.read_camera("CAM-1").unwrap();
    assert_eq!(camera.public_key, "PK-A");
    assert_eq!(camera.location, "North Gate");
}

#[test]
fn invalid_status_leaves_state_unchanged() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
        .unwrap();
    let before = ledger.state().snapshot();

    for bad in ["paused", "ACTIVE", ""] {
        let err = ledger
            .update_camera_status(&ctx(2), "CAM-1", bad)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert_eq!(ledger.state().snapshot(), before);

    for status in ["inactive", "revoked", "active"] {
        let camera = ledger
            .update_camera_status(&ctx(3), "CAM-1", status)
            .unwrap();
        assert_eq!(camera.status.as_str(), status);
    }
}

#[test]
fn no_log_against_inactive_or_revoked_camera() {
    for status in ["inactive", "revoked"] {
        let mut ledger = memory_ledger();
        ledger
            .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
            .unwrap();
        ledger
            .update_camera_status(&ctx(2), "CAM-1", status)
            .unwrap();
        let before = ledger.state().snapshot();

        let err = ledger
            .log_access(&ctx(3), "CAM-1", "userX", "VIEW")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(ledger.state().snapshot(), before);
    }
}

#[test]
fn anchor_against_missing_camera() {
    let mut ledger = memory_ledger();
    let err = ledger
        .anchor_video_content(
            &ctx(1),
            VideoAnchor {
                content_id: "V-1",
                content_locator: "QmX",
                camera_id: "GHOST",
                duration: "10",
                encryption_key_hash: "KH",
                metadata: "{}",
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(ledger.state().is_empty().unwrap());
}

#[test]
fn all_cameras_is_exactly_the_registered_set() {
    let mut ledger = memory_ledger();
    for (n, id) in ["A", "B", "C"].into_iter().enumerate() {
        ledger
            .register_camera(&ctx(n as i64), id, "PK", "Lab", "Pi")
            .unwrap();
    }
    // Other record kinds share the keyspace.
    ledger.log_access(&ctx(9), "A", "userX", "VIEW").unwrap();

    let ids: BTreeSet<_> = ledger
        .get_all_cameras()
        .unwrap()
        .into_iter()
        .map(|c| c.device_id)
        .collect();
    assert_eq!(
        ids,
        BTreeSet::from(["A".to_string(), "B".to_string(), "C".to_string()])
    );
}

#[test]
fn camera_lifecycle_audit_trail() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-1", "PK", "Lobby", "Pi 5")
        .unwrap();
    ledger.log_access(&ctx(2), "CAM-1", "userX", "VIEW").unwrap();
    ledger
        .update_camera_status(&ctx(3), "CAM-1", "revoked")
        .unwrap();

    let err = ledger
        .log_access(&ctx(4), "CAM-1", "userY", "VIEW")
        .unwrap_err();
    assert!(matches!(err, CoreError::PreconditionFailed { .. }));

    let logs = ledger.get_camera_access_logs("CAM-1").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].accessor_id, "userX");
    assert_eq!(logs[0].action, "VIEW");
    assert_eq!(logs[0].log_id, AccessLog::derive_id("CAM-1", "tx2"));
    assert_eq!(logs[0].timestamp, "2025-04-01T10:00:00.002Z");
}

#[test]
fn anchored_video_reads_back() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-2", "PK", "Dock", "Pi 5")
        .unwrap();
    ledger
        .anchor_video_content(
            &ctx(2),
            VideoAnchor {
                content_id: "V-1",
                content_locator: "QmVideo",
                camera_id: "CAM-2",
                duration: "93.25",
                encryption_key_hash: "sha256:abcd",
                metadata: r#"{"resolution":"1080p","faces_detected":3}"#,
            },
        )
        .unwrap();

    let video = ledger.read_video_content("V-1").unwrap();
    assert_eq!(video.metadata.resolution(), Some("1080p"));
    assert_eq!(video.metadata.faces_detected(), Some(3));
    assert_eq!(video.duration, 93.25);
    assert_eq!(video.content_locator, "QmVideo");

    let videos = ledger.get_camera_videos("CAM-2").unwrap();
    assert_eq!(videos, vec![video]);
    assert!(ledger.get_camera_videos("CAM-1").unwrap().is_empty());
}

#[test]
fn malformed_metadata_and_duration_are_absorbed() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-2", "PK", "Dock", "Pi 5")
        .unwrap();
    let video = ledger
        .anchor_video_content(
            &ctx(2),
            VideoAnchor {
                content_id: "V-2",
                content_locator: "QmVideo",
                camera_id: "CAM-2",
                duration: "about a minute",
                encryption_key_hash: "KH",
                metadata: "{resolution: 1080p",
            },
        )
        .unwrap();
    assert!(video.metadata.is_empty());
    assert!(video.duration.is_nan());

    let stored = ledger.read_video_content("V-2").unwrap();
    assert!(stored.metadata.is_empty());
    assert!(stored.duration.is_nan());
}

#[test]
fn deeply_nested_metadata_still_reads_back() {
    let mut ledger = memory_ledger();
    ledger
        .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
        .unwrap();
    let metadata = format!("{}1{}", r#"{"a":"#.repeat(70), "}".repeat(70));
    ledger
        .anchor_video_content(
            &ctx(2),
            VideoAnchor {
                content_id: "V-1",
                content_locator: "QmVideo",
                camera_id: "CAM-1",
                duration: "30",
                encryption_key_hash: "KH",
                metadata: &metadata,
            },
        )
        .unwrap();

    let stored = ledger.read_video_content("V-1").unwrap();
    assert!(stored.metadata.is_empty());
    assert_eq!(stored.duration, 30.0);
    assert_eq!(ledger.get_camera_videos("CAM-1").unwrap().len(), 1);
}

#[test]
fn corrupt_entries_do_not_break_queries() {
    let mut state = InMemoryWorldState::new();
    state
        .put(&StateKey::camera("JUNK").unwrap().to_bytes(), &[0xff, 0x00])
        .unwrap();
    state.put(b"legacy-key", b"{}").unwrap();
    let mut ledger = Ledger::new(state);
    ledger
        .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
        .unwrap();

    let cameras = ledger.get_all_cameras().unwrap();
    assert_eq!(cameras.len(), 1);
    assert_eq!(cameras[0].device_id, "CAM-1");
    // Point reads of a corrupt value do fail.
    assert_eq!(ledger.read_camera("JUNK").unwrap_err().kind(), ErrorKind::Internal);
}

fn replay(ledger: &mut Ledger<InMemoryWorldState>) {
    ledger.init_ledger(&ctx(0)).unwrap();
    for n in 1..=5 {
        let id = format!("CAM-{n}");
        ledger
            .register_camera(&ctx(n), &id, "PK", "Site", "Pi")
            .unwrap();
        ledger
            .log_access(&ctx(100 + n), &id, "auditor", "VIEW")
            .unwrap();
    }
    ledger
        .anchor_video_content(
            &ctx(200),
            VideoAnchor {
                content_id: "V-1",
                content_locator: "Qm",
                camera_id: "CAM-3",
                duration: "NaN",
                encryption_key_hash: "KH",
                metadata: r#"{"fps":29.97,"resolution":"4k","tags":["night","gate"]}"#,
            },
        )
        .unwrap();
    ledger
        .update_camera_status(&ctx(201), "CAM-2", "inactive")
        .unwrap();
    ledger.delete_camera(&ctx(202), "CAM-5").unwrap();
    // Failures in the stream must not perturb either node.
    assert!(ledger.log_access(&ctx(203), "CAM-2", "x", "VIEW").is_err());
}

#[test]
fn independent_nodes_write_identical_bytes() {
    let mut node_a = memory_ledger();
    let mut node_b = memory_ledger();
    replay(&mut node_a);
    replay(&mut node_b);

    assert_eq!(node_a.state().snapshot(), node_b.state().snapshot());
}

#[test]
fn stored_values_are_canonical() {
    let mut ledger = memory_ledger();
    replay(&mut ledger);
    for (_, value) in ledger.state().snapshot() {
        let reencoded = camledger_codec::to_canonical_cbor(
            &camledger_codec::from_cbor(&value).unwrap(),
        )
        .unwrap();
        assert_eq!(reencoded, value);
    }
}

#[test]
fn file_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.journal");

    {
        let mut ledger = Ledger::new(FileWorldState::open(&path).unwrap());
        ledger
            .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
            .unwrap();
        ledger.log_access(&ctx(2), "CAM-1", "userX", "VIEW").unwrap();
        ledger
            .update_camera_status(&ctx(3), "CAM-1", "inactive")
            .unwrap();
    }

    let ledger = Ledger::new(FileWorldState::open(&path).unwrap());
    let camera = ledger.read_camera("CAM-1").unwrap();
    assert_eq!(camera.status, CameraStatus::Inactive);
    assert_eq!(ledger.get_camera_access_logs("CAM-1").unwrap().len(), 1);
}

#[test]
fn file_and_memory_states_agree() {
    let dir = tempfile::tempdir().unwrap();
    let mut file_ledger = Ledger::new(FileWorldState::open(&dir.path().join("l.journal")).unwrap());
    let mut mem_ledger = memory_ledger();

    for ledger_ctx in [ctx(1), ctx(2)] {
        let id = format!("CAM-{}", ledger_ctx.tx_id());
        file_ledger
            .register_camera(&ledger_ctx, &id, "PK", "Lab", "Pi")
            .unwrap();
        mem_ledger
            .register_camera(&ledger_ctx, &id, "PK", "Lab", "Pi")
            .unwrap();
    }

    let mut from_file: Vec<_> = file_ledger
        .state()
        .scan_all()
        .unwrap()
        .map(Result::unwrap)
        .collect();
    from_file.sort();
    assert_eq!(from_file, mem_ledger.state().snapshot());
}

#[test]
fn record_bytes_ignore_field_construction_order() {
    let mut ledger = memory_ledger();
    let camera = ledger
        .register_camera(&ctx(1), "CAM-1", "PK", "Lab", "Pi")
        .unwrap();
    let stored = ledger
        .state()
        .get(&StateKey::camera("CAM-1").unwrap().to_bytes())
        .unwrap()
        .unwrap();
    assert_eq!(stored, camera.encode().unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn registered_ids_are_all_listed(ids in prop::collection::btree_set("[A-Z]{1,3}-[0-9]{1,3}", 0..12)) {
        let mut ledger = memory_ledger();
        for (n, id) in ids.iter().enumerate() {
            ledger.register_camera(&ctx(n as i64), id, "PK", "Lab", "Pi").unwrap();
        }
        let listed: BTreeSet<_> = ledger
            .get_all_cameras()
            .unwrap()
            .into_iter()
            .map(|c| c.device_id)
            .collect();
        prop_assert_eq!(listed, ids);
    }
}
