//! Output formatting
//!
//! User-facing result listings and error display. Progress messages go
//! through `tracing`; this module owns what ends up on stdout.

use crate::core::artifact::Artifact;

/// Print the produced artifact listing
pub fn print_artifacts(artifacts: &[Artifact], json: bool) {
    if json {
        match serde_json::to_string_pretty(artifacts) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => tracing::error!("Failed to render artifact list: {e}"),
        }
        return;
    }

    if artifacts.is_empty() {
        println!("No artifacts produced.");
        return;
    }
    println!("Wrote:");
    for artifact in artifacts {
        println!("  {}", artifact.path.display());
    }
}

/// Display an error chain to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}
