//! CLI `reset` command: forget all decisions after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use vigil::config::VigilConfig;
use vigil::persist::PersistedSnapshot;

/// Replace the snapshot with an empty one after user confirmation.
pub fn reset(config: &VigilConfig) -> Result<()> {
    let manager = super::persistence(config);

    println!("WARNING: This will permanently delete ALL remembered decisions and statistics.");
    println!("Memory file: {}", manager.path().display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    manager.save(&PersistedSnapshot::empty())?;

    println!("All decisions forgotten. Memory reset complete.");
    Ok(())
}
