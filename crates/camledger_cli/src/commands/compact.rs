//! Compact command implementation.

use camledger_state::{FileWorldState, WorldState};
use std::path::Path;
use tracing::info;

/// Runs the compact command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No ledger found at {}", path.display()).into());
    }

    let mut state = FileWorldState::open(path)?;
    let before = state.journal_len();
    let live = state.len()?;
    state.compact()?;
    let after = state.journal_len();

    info!(live, before, after, "compaction finished");
    println!("Compacted {}", path.display());
    println!("  Live keys:   {live}");
    println!("  Size before: {before} bytes");
    println!("  Size after:  {after} bytes");
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        before.saturating_sub(after),
        if before > 0 {
            (before.saturating_sub(after) as f64 / before as f64) * 100.0
        } else {
            0.0
        }
    );
    Ok(())
}
