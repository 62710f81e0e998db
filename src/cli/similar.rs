//! CLI `similar` command: nearest past decisions to a query.

use anyhow::Result;

use vigil::analysis::InputKind;
use vigil::config::VigilConfig;

pub fn similar(config: &VigilConfig, kind: &str, query: &str, k: usize) -> Result<()> {
    let kind: InputKind = kind.parse()?;
    let store = super::load_store(config)?;
    let query = store.query_for_text(kind, query);
    let matches = store.similar(&query, k);

    match (&query.signal, query.key.is_some()) {
        (Some(signal), true) => println!("Query signal: {signal} (vector search)"),
        (Some(signal), false) => println!("Query signal: {signal} (exact match)"),
        (None, true) => println!("Query: vector search"),
        (None, false) => println!("Query: no signal and no similarity key"),
    }

    if matches.is_empty() {
        println!("No similar decisions found.");
        return Ok(());
    }

    for (rank, m) in matches.iter().enumerate() {
        let record = &m.event.record;
        println!(
            "{}. [seq {}] {:.4}  {} score={} action={}",
            rank + 1,
            m.event.seq,
            m.distance,
            record.input_kind(),
            record.combined_score(),
            record.action(),
        );
        println!("   {}", super::truncate(record.reason(), 100));
    }
    Ok(())
}
