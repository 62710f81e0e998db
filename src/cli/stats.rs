use anyhow::Result;

use vigil::config::VigilConfig;
use vigil::decision::classify::Action;

/// Display long-term memory statistics in the terminal.
pub fn stats(config: &VigilConfig, top: usize) -> Result<()> {
    let snapshot = super::load_snapshot(config)?;
    let stats = &snapshot.long_term;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total decisions:     {}", stats.total_events);
    println!("  Mean risk score:     {:.2}", stats.running_mean_score);
    println!("  Short-term events:   {}", snapshot.short_term.len());
    println!();

    println!("By Action:");
    for action in Action::ALL {
        println!("  {:<12} {}", action.as_str(), stats.action_count(action));
    }
    println!();

    println!("Top malicious domains:");
    let urls = stats.top_malicious_urls(top);
    if urls.is_empty() {
        println!("  (none)");
    }
    for (domain, count) in urls {
        println!("  {:<32} {}", domain, count);
    }
    println!();

    println!("Password weaknesses:");
    let weaknesses = stats.top_password_weaknesses(top);
    if weaknesses.is_empty() {
        println!("  (none)");
    }
    for (category, count) in weaknesses {
        println!("  {:<32} {}", category, count);
    }

    Ok(())
}
