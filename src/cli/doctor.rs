//! CLI `doctor` command: inspect the memory snapshot and configuration.

use anyhow::Result;

use vigil::config::VigilConfig;
use vigil::error::PersistError;
use vigil::persist::SCHEMA_VERSION;

/// Check the snapshot file and print a health report.
pub fn doctor(config: &VigilConfig) -> Result<()> {
    let manager = super::persistence(config);
    let path = manager.path();

    println!("Vigil Health Report");
    println!("===================");
    println!();
    println!("Memory file:       {}", path.display());

    if !manager.exists() {
        println!("Status:            not found (created on first `vigil serve` or `vigil decide`)");
    } else {
        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!("File size:         {}", format_bytes(file_size));

        match manager.try_load() {
            Ok(Some(snapshot)) => {
                println!("Schema version:    {}", snapshot.schema_version);
                println!("Short-term:        {} / {}", snapshot.short_term.len(), config.memory.short_term_capacity);
                println!("Total decisions:   {}", snapshot.long_term.total_events);
                println!("Mean score:        {:.2}", snapshot.long_term.running_mean_score);
                if snapshot.short_term.len() > config.memory.short_term_capacity {
                    println!("  NOTE: more events than capacity; oldest will be dropped on next start.");
                }
                println!("Status:            OK");
            }
            Ok(None) => println!("Status:            not found"),
            Err(e) => {
                println!("Status:            UNUSABLE ({e})");
                println!();
                println!("The server will start with empty memory and overwrite this file.");
                println!("Recovery steps:");
                if matches!(e, PersistError::UnsupportedSchema { .. }) {
                    println!("  This build reads schema version {SCHEMA_VERSION}; upgrade vigil to keep this data.");
                }
                println!("  1. Keep a copy: cp {} {}.bak", path.display(), path.display());
                println!("  2. Start fresh: vigil reset");
            }
        }
    }

    let tmp = {
        let mut name = path.as_os_str().to_owned();
        name.push(".tmp");
        std::path::PathBuf::from(name)
    };
    if tmp.exists() {
        println!("  NOTE: leftover {} from an interrupted write (safe to delete).", tmp.display());
    }

    println!();
    println!("Similarity:        {} ({}, {} dims)", config.similarity.provider, config.similarity.metric, config.similarity.dimensions);
    let reasoning_ready = config.reasoning.provider != "openai" || !config.reasoning.api_key.is_empty();
    println!(
        "Reasoning:         {}{}",
        config.reasoning.provider,
        if reasoning_ready { "" } else { " (no API key, template fallback)" }
    );
    println!("Responders:");
    println!("  n8n webhook:     {}", configured(config.responders.n8n_webhook_url.as_deref()));
    println!("  Slack webhook:   {}", configured(config.responders.slack_webhook_url.as_deref()));
    println!("  Event log:       {}", config.responders.events_db_path.as_deref().unwrap_or("(not set)"));

    Ok(())
}

fn configured(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "configured",
        _ => "(not set)",
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
