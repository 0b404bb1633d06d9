//! Initialize command.

use console::style;

use crate::config::Config;

/// Create the data directory and database schema.
pub async fn cmd_init(config: &Config) -> anyhow::Result<()> {
    let settings = config.to_settings();
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized Sovereign database at {}",
        style("✓").green(),
        settings.database_url()
    );
    if config.source_path.is_none() {
        println!(
            "  {} No config file found; using defaults and environment",
            style("!").yellow()
        );
    }
    Ok(())
}
