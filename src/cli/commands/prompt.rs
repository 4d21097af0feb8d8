//! Prompt command - print the template prompt

use crate::config::Settings;
use crate::coordinator::DownloadCoordinator;
use crate::error::ScaffoldResult;

/// Execute the prompt command
pub async fn execute(settings: &Settings) -> ScaffoldResult<()> {
    let coordinator = DownloadCoordinator::new(settings);
    let text = coordinator.prompt_text().await;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}
