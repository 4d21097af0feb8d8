//! Clear command - remove cached files

use crate::config::Settings;
use crate::coordinator::DownloadCoordinator;
use crate::error::ScaffoldResult;
use console::style;

/// Execute the clear command
pub async fn execute(settings: &Settings) -> ScaffoldResult<()> {
    let coordinator = DownloadCoordinator::new(settings);
    coordinator.clear().await?;

    println!(
        "{} Cleared {}",
        style("[OK]").green(),
        coordinator.layout().root().display()
    );
    Ok(())
}
