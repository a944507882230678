//! Atom Artifact Uploader - pushes a finished build's release assets to S3,
//! packagecloud, and GitHub releases.
//!
//! Exit status is 0 on success and 1 on any failure, including the
//! no-assets precondition.

use atom_artifact_uploader::cli;
use atom_artifact_uploader::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new();
            output.error(&format!("An error occurred while uploading the release: {e}"));

            // Show recovery suggestions for critical errors
            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
