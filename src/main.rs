use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use labsite_cms::{
    Content,
    cache::{Cache, Clock, MemoryStore, Store},
    config::Config,
    fetch::{ContentSource, HttpFetcher},
};
use tracing::error;

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Articles,
    People,
    Pi,
    Research,
    Projects,
    Publications,
    Opportunities,
    Media,
    Home,
    About,
    Contact,
}

#[derive(Parser)]
struct Opts {
    /// YAML config. Falls back to LABSITE_* environment variables.
    #[clap(short, long, env = "LABSITE_CONFIG")]
    config: Option<PathBuf>,
    /// Skip the persistent cache and always fetch.
    #[clap(long)]
    no_cache: bool,
    #[clap(value_enum)]
    kind: Kind,
}

async fn dump<F, S, C>(content: &Content<F, S, C>, kind: Kind) -> anyhow::Result<serde_json::Value>
where
    F: ContentSource,
    S: Store,
    C: Clock,
{
    let value = match kind {
        Kind::Articles => serde_json::to_value(content.articles().await?)?,
        Kind::People => serde_json::to_value(content.people().await?)?,
        Kind::Pi => serde_json::to_value(content.principal_investigator().await?)?,
        Kind::Research => serde_json::to_value(content.research_topics().await?)?,
        Kind::Projects => serde_json::to_value(content.projects().await?)?,
        Kind::Publications => serde_json::to_value(content.publications().await?)?,
        Kind::Opportunities => serde_json::to_value(content.opportunities().await?)?,
        Kind::Media => serde_json::to_value(content.media().await?)?,
        Kind::Home => serde_json::to_value(content.home().await?)?,
        Kind::About => serde_json::to_value(content.about().await?)?,
        Kind::Contact => serde_json::to_value(content.contact().await?)?,
    };
    Ok(value)
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => {
            let src = tokio::fs::read_to_string(path)
                .await
                .with_context(|| "read config")?;
            Config::from_yaml(&src)
                .with_context(|| format!("parse config from {}", path.display()))?
        }
        None => Config::from_env().with_context(|| "load config from environment")?,
    };
    let value = if opts.no_cache {
        let source = HttpFetcher::from_config(&config).with_context(|| "build http client")?;
        let content = Content::new(
            source,
            Cache::new(MemoryStore::default()),
            config.placeholder_image(),
        );
        dump(&content, opts.kind).await?
    } else {
        let content = Content::open(&config)
            .await
            .with_context(|| "open content layer")?;
        dump(&content, opts.kind).await?
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = run(opts).await {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}
