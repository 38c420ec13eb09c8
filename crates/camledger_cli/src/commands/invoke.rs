//! Runs one ledger operation.

use camledger_core::{Ledger, TxContext};
use camledger_state::{FileWorldState, WorldState};
use std::path::Path;

/// Opens the journal at `path`, runs `function` and returns its result as
/// pretty-printed JSON.
///
/// With `read_only`, write operations are refused.
pub fn run(
    path: &Path,
    ctx: &TxContext,
    function: &str,
    args: &[String],
    read_only: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new(FileWorldState::open(path)?);
    execute(&mut ledger, ctx, function, args, read_only)
}

/// Runs `function` against `ledger`.
pub fn execute<S: WorldState>(
    ledger: &mut Ledger<S>,
    ctx: &TxContext,
    function: &str,
    args: &[String],
    read_only: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let payload = if read_only {
        ledger.evaluate(function, args)?
    } else {
        ledger.invoke(ctx, function, args)?
    };
    let json: serde_json::Value = serde_json::from_slice(&payload)?;
    Ok(serde_json::to_string_pretty(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camledger_state::InMemoryWorldState;
    use chrono::{TimeZone, Utc};

    fn ctx() -> TxContext {
        TxContext::new(
            "Org1MSP",
            "cli-tx",
            Utc.with_ymd_and_hms(2025, 5, 5, 5, 5, 5).unwrap(),
        )
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn submit_then_query() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        let out = execute(
            &mut ledger,
            &ctx(),
            "RegisterCamera",
            &args(&["CAM-1", "PK", "Lab", "Pi"]),
            false,
        )
        .unwrap();
        assert!(out.contains("\"deviceID\": \"CAM-1\""));

        let out = execute(&mut ledger, &ctx(), "CameraExists", &args(&["CAM-1"]), true).unwrap();
        assert_eq!(out, "true");
    }

    #[test]
    fn query_refuses_writes() {
        let mut ledger = Ledger::new(InMemoryWorldState::new());
        assert!(execute(&mut ledger, &ctx(), "InitLedger", &[], true).is_err());
        assert!(ledger.state().is_empty().unwrap());
    }

    #[test]
    fn run_persists_between_processes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.journal");

        run(&path, &ctx(), "InitLedger", &[], false).unwrap();
        let out = run(&path, &ctx(), "GetAllCameras", &[], true).unwrap();
        assert!(out.contains("RPI5-TEST-001"));
    }
}
