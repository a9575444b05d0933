use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use unfurl::{Config, Extractor};

/// Print link-preview metadata for each URL as JSON.
#[derive(Parser, Debug)]
#[command(name = "unfurl", version, about)]
struct Args {
    /// Pages to extract; fetched concurrently.
    #[arg(required = true)]
    urls: Vec<String>,

    /// Pretty-print each result instead of one JSON object per line.
    #[arg(long)]
    pretty: bool,

    /// Emit logs as JSON on stderr.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("unfurl=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = Config::from_env()?;
    let extractor = Extractor::new(config)?;

    let results = join_all(args.urls.iter().map(|url| extractor.extract(url))).await;

    let mut failed = false;
    for (url, result) in args.urls.iter().zip(results) {
        match result {
            Ok(preview) => {
                let json = if args.pretty {
                    serde_json::to_string_pretty(&preview)?
                } else {
                    serde_json::to_string(&preview)?
                };
                println!("{json}");
            }
            Err(e) => {
                failed = true;
                eprintln!("{url}: {e}");
            }
        }
    }

    extractor.shutdown().await?;

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
