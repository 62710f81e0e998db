use anyhow::Result;

use vigil::config::VigilConfig;

/// Export the memory snapshot as JSON to stdout.
pub fn export(config: &VigilConfig) -> Result<()> {
    let snapshot = super::load_snapshot(config)?;

    let json = serde_json::to_string_pretty(&snapshot)?;
    println!("{json}");

    eprintln!(
        "Exported {} short-term events ({} decisions all-time).",
        snapshot.short_term.len(),
        snapshot.long_term.total_events
    );

    Ok(())
}
