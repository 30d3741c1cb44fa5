use clap::Args;

use paranoid_daemon::state::{AppState, StoreConfig};

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.paranoid_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                lines.push(format!("  api_port:     {}", state.config.api_port));
                lines.push(format!("  base_path:    {}", state.config.base_path));
                let store = match &state.config.store {
                    StoreConfig::Keybase { binary } => format!("keybase ({})", binary.display()),
                    StoreConfig::Memory { username } => format!("memory (as {})", username),
                };
                lines.push(format!("  store:        {}", store));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check daemon liveness, readiness and who it runs as
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();
        let status_url = |path: &str| {
            format!(
                "{}/_status/{}",
                base.as_str().trim_end_matches('/'),
                path
            )
        };

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for check in ["livez", "readyz"] {
            match client.get(status_url(check)).send().await {
                Ok(resp) if resp.status().is_success() => {
                    lines.push(format!("  {:<8} OK", format!("{}:", check)));
                }
                Ok(resp) => {
                    lines.push(format!(
                        "  {:<8} UNHEALTHY ({})",
                        format!("{}:", check),
                        resp.status()
                    ));
                }
                Err(_) => {
                    lines.push(format!("  {:<8} NOT REACHABLE", format!("{}:", check)));
                }
            }
        }

        if let Ok(resp) = client.get(status_url("identity")).send().await {
            if let Ok(body) = resp.json::<serde_json::Value>().await {
                if let Some(username) = body.get("username").and_then(|v| v.as_str()) {
                    lines.push(format!("  user:    {}", username));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}
