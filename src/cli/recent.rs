use anyhow::Result;

use vigil::config::VigilConfig;

/// Print the short-term ring, most recent first.
pub fn recent(config: &VigilConfig, limit: usize) -> Result<()> {
    let store = super::load_store(config)?;
    let events = store.recent_events(limit);

    if events.is_empty() {
        println!("No decisions in short-term memory.");
        return Ok(());
    }

    println!("{:<6} {:<26} {:<9} {:>5}  {:<7} {}", "SEQ", "TIME", "TYPE", "SCORE", "ACTION", "SIGNAL");
    for event in &events {
        let record = &event.record;
        println!(
            "{:<6} {:<26} {:<9} {:>5}  {:<7} {}",
            event.seq,
            record.timestamp().format("%Y-%m-%d %H:%M:%S UTC"),
            record.input_kind(),
            record.combined_score(),
            record.action(),
            event.signal.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
        );
        println!("       {}", super::truncate(record.reason(), 100));
    }
    println!();
    println!("{} of {} slots used.", store.len(), store.capacity());
    Ok(())
}
