// src/main.rs

use color_eyre::eyre::Result;
use tracing::{error, info};

mod core;
mod logging;
mod settings;

use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = logging::initialize_logging() {
        // Still worth running: the archive is the real output.
        eprintln!("failed to initialize logging: {e:#}");
    }

    let settings = Settings::from_env();
    match core::analyzer::run(&settings).await {
        Ok(summary) => {
            info!(
                tasks = summary.tasks,
                blobs = summary.blobs,
                errors = summary.errors,
                "Run complete."
            );
            println!(
                "Wrote {} entries ({} task errors) to {}",
                summary.blobs,
                summary.errors,
                settings.archive_path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Run did not produce a complete archive.");
            Err(e)
        }
    }
}
