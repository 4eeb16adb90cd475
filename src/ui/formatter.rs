//! Pure formatting functions for UI output.
//!
//! Functions here only print; nothing reads user input.

use console::style;

use crate::cli::BuildOutcome;
use crate::index::ReconcileOutcome;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display the records indexed by a build and what became of each index.
///
/// # Arguments
/// * `outcome` - The finished build
pub fn display_build_summary(outcome: &BuildOutcome) {
    if outcome.modules.is_empty() {
        return;
    }

    println!("\n{}", style("Modules:").bold());
    for record in &outcome.modules {
        println!(
            "  {} {}",
            style(record.key()).cyan(),
            style(&record.sha256sum).dim()
        );
    }

    for (label, index) in [
        ("development index", outcome.development),
        ("release index", outcome.release),
    ] {
        if let Some(index) = index {
            println!("  {}: {}", label, describe_index(index));
        }
    }
}

fn describe_index(outcome: ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::Created { modules } => format!("created with {} modules", modules),
        ReconcileOutcome::Updated { modules } => format!("updated, {} modules", modules),
        ReconcileOutcome::Unchanged => "unchanged".to_string(),
    }
}
