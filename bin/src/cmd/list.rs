//! Signal and constraint listing.

use anyhow::Result;
use cadiz_optimize::Constraint;
use cadiz_signals::{SignalCategory, registry::available_signals};

use super::banner;

/// List the available signals by category, then the constraint names.
pub(crate) fn list(category: Option<String>, verbose: bool) -> Result<()> {
    banner("Available Signals");

    let categories = [
        (SignalCategory::Momentum, "Momentum"),
        (SignalCategory::Reversion, "Reversion"),
        (SignalCategory::Risk, "Risk"),
    ];
    let signals = available_signals();

    for (cat, cat_name) in categories {
        if let Some(ref filter) = category
            && !cat_name.to_lowercase().contains(&filter.to_lowercase())
        {
            continue;
        }

        println!("{cat_name}:");
        println!("{}", "-".repeat(60));
        if verbose {
            println!("  {}", cat.description());
        }
        for info in signals.iter().filter(|s| s.category == cat) {
            if verbose {
                println!(
                    "  {:12} - {} (lookback: {} days)",
                    info.name, info.description, info.typical_lookback
                );
            } else {
                println!("  {}", info.name);
            }
        }
        println!();
    }

    println!("Constraints:");
    println!("{}", "-".repeat(60));
    for constraint in Constraint::ALL {
        println!("  {constraint}");
    }
    println!("  (no_margin is accepted for no_buying_on_margin)");
    println!();

    if !verbose {
        println!("Use --verbose for signal descriptions.\n");
    }
    Ok(())
}
