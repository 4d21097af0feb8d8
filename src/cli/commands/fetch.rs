//! Fetch command - ensure resources are cached

use crate::cli::args::{FetchArgs, OutputFormat};
use crate::config::Settings;
use crate::coordinator::DownloadCoordinator;
use crate::error::ScaffoldResult;
use crate::resources::DownloadResult;
use console::style;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, settings: &Settings) -> ScaffoldResult<()> {
    let coordinator = DownloadCoordinator::new(settings);
    let result = coordinator.ensure_resources().await?;

    match args.format {
        OutputFormat::Text => print_result(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn print_result(result: &DownloadResult) {
    println!(
        "{} {}",
        style("Template:").bold(),
        result.template_dir.display()
    );

    if result.documents.is_empty() {
        println!("{}", style("No API documents available").yellow());
        return;
    }

    println!("{}", style("API documents:").bold());
    for doc in &result.documents {
        println!("  {:<12} {}", style(&doc.id).cyan(), doc.path.display());
        println!("  {:<12} {}", "", style(&doc.description).dim());
    }
}
