//! CLI subcommand modules.
//!
//! This module contains the implementations for all cadiz CLI subcommands.

pub(crate) mod blend;
pub(crate) mod covariance;
pub(crate) mod list;
pub(crate) mod optimize;
pub(crate) mod paper;
pub(crate) mod signals;

/// Print a boxed section title.
pub(crate) fn banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}
