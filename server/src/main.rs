use anyhow::Result;
use axum::Router;
use clap::Parser;
use medrank_core::Bm25Params;
use medrank_server::{build_app, AppConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file (.json or .jsonl)
    #[arg(long, default_value = "./data/documents.json")]
    corpus: String,
    /// Relevance judgments enabling /evaluate
    #[arg(long)]
    judgments: Option<String>,
    /// Prevalence/category tables; built-in tables when omitted
    #[arg(long)]
    tables: Option<String>,
    #[arg(long, default_value_t = medrank_core::config::DEFAULT_K1)]
    k1: f64,
    #[arg(long, default_value_t = medrank_core::config::DEFAULT_B)]
    b: f64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = AppConfig {
        corpus: args.corpus,
        judgments: args.judgments,
        tables: args.tables,
        params: Bm25Params::new(args.k1, args.b)?,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
