//! lumserp - fetch SERP data through the Luminati proxy
//!
//! Looks up a keyword, optionally checks where a URL ranks for it, and
//! prints the result and request metadata as JSON on stdout.

use std::process;

use clap::Parser;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use lumserp::cli::Cli;
use lumserp::client::Client;
use lumserp::serps::OutputFormat;

/// Sends log output to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = cli.query_options()?;
    let mut client = Client::new(cli.client_config()?)?;
    if let Some(cache) = cli.cache_store()? {
        client = client.with_cache(cache);
    }

    // Ctrl-C aborts the in-flight request.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let output = match OutputFormat::from(cli.format) {
        OutputFormat::Html => {
            let fetched = client.html(&options, &cancel).await?;
            let mut meta = fetched.meta;
            meta.raw_body.clear();
            json!({ "meta": meta, "html": fetched.payload })
        }
        OutputFormat::Json => {
            let fetched = client.json(&options, &cancel).await?;
            let mut meta = fetched.meta;
            meta.raw_body.clear();
            let domain = cli.url.as_deref().map(|url| fetched.payload.check_url(url));
            json!({ "meta": meta, "serps": fetched.payload, "domain": domain })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
