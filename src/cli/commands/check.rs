//! Environment check.

use console::style;

use crate::analysis::TextExtractor;
use crate::config::Config;
use crate::llm::LlmClient;

/// Report external extraction tools and model configuration.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tools").bold());
    println!("{}", "-".repeat(50));
    let mut all_found = true;
    for (tool, available) in TextExtractor::check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    if !all_found {
        println!(
            "  {}",
            style("PDF uploads need Poppler (apt install poppler-utils / brew install poppler)").dim()
        );
    }

    println!("\n{}", style("Model").bold());
    println!("{}", "-".repeat(50));
    println!(
        "  {:<15} {} ({})",
        "backend",
        config.llm.resolved_provider().as_str(),
        config.llm.model
    );
    match LlmClient::from_config(config.llm.clone()) {
        Ok(_) => println!("  {:<15} {}", "status", style(config.llm.availability_hint()).green()),
        Err(e) => println!("  {:<15} {}", "status", style(e).red()),
    }

    println!("\n{}", style("Services").bold());
    println!("{}", "-".repeat(50));
    let settings = config.to_settings();
    println!("  {:<15} {}", "database", settings.database_url());
    println!("  {:<15} {}", "public url", settings.public_url);
    println!(
        "  {:<15} {}",
        "pub/sub",
        config.notify.endpoint.as_deref().unwrap_or("log only")
    );
    println!(
        "  {:<15} {}",
        "email",
        config.email.endpoint.as_deref().unwrap_or("log only")
    );
    println!();
    Ok(())
}
