use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::utils::output;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct HealthArgs {
    #[arg(long, env = "NOTES_API_URL", default_value = "http://localhost:8085", help = "Server base URL")]
    pub url: String,
}

pub async fn handle(args: HealthArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let response = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await.context("health response was not JSON")?;

    let healthy = status.is_success();
    let message = if healthy {
        format!("{} is healthy", args.url)
    } else {
        format!("{} is degraded ({})", args.url, status)
    };
    output(&output_format, healthy, &message, body.get("data").cloned())?;

    if !healthy {
        anyhow::bail!("server reported {}", status);
    }
    Ok(())
}
