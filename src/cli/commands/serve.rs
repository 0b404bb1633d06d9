//! Web server command.

use console::style;

use crate::config::{Config, DEFAULT_BIND};
use crate::server::AppState;

/// Start the web server.
pub async fn cmd_serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let settings = config.to_settings();
    let bind = parse_bind_address(bind.unwrap_or(settings.bind.as_str()))?;

    println!("{} Preparing database...", style("→").cyan());
    let state = match AppState::from_config(config).await {
        Ok(state) => {
            println!("  {} Database ready", style("✓").green());
            state
        }
        Err(e) => {
            eprintln!("  {} Startup failed: {}", style("✗").red(), e);
            return Err(e);
        }
    };

    println!(
        "{} Starting Sovereign API at http://{} (model backend: {})",
        style("→").cyan(),
        bind,
        state.pipeline.llm().backend_name()
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(state, &bind).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<String> {
    let (default_host, default_port) = DEFAULT_BIND
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid default bind address"))?;

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(format!("{}:{}", default_host, port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if port_str.parse::<u16>().is_ok() {
            return Ok(format!("{}:{}", host, port_str));
        }
        anyhow::bail!("invalid port in bind address '{}'", bind);
    }

    Ok(format!("{}:{}", bind, default_port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(parse_bind_address("8080").unwrap(), "127.0.0.1:8080");
        assert_eq!(parse_bind_address("0.0.0.0").unwrap(), "0.0.0.0:3030");
        assert_eq!(parse_bind_address("0.0.0.0:9000").unwrap(), "0.0.0.0:9000");
        assert!(parse_bind_address("localhost:http").is_err());
    }
}
