use anyhow::Result;
use clap::Parser;
use deep_research_rs::cli::{self, Args};
use deep_research_rs::progress::TracingSink;
use deep_research_rs::service::{EnvelopeStatus, ResearchService};
use deep_research_rs::{CancellationToken, RunOptions, Tone};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let query_arg = args.query.clone();
    let tone_arg = args.tone.clone();
    let sources_only = args.sources_only;
    let config = args.into_config()?;

    let default_level = if cli::wants_debug_logging(&config) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let query = cli::resolve_query(query_arg.as_deref(), &config)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 收到中断信号，正在取消研究任务...");
            trigger.cancel();
        }
    });

    let service = ResearchService::from_config(config)?;
    let options = RunOptions::default()
        .with_sink(Arc::new(TracingSink))
        .with_cancel(cancel);

    let failed = if sources_only {
        let envelope = service.get_sources(&query, options).await;
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        envelope.status == EnvelopeStatus::Error
    } else {
        let tone = tone_arg
            .as_deref()
            .map(Tone::parse_or_default)
            .unwrap_or_default();
        let envelope = service.run(&query, tone, options).await;
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        envelope.status == EnvelopeStatus::Error
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
