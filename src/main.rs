//! market-proxy: cached, rate-limited Financial Modeling Prep lookups.
//!
//! Prints stock/crypto chart history or a stock detail record as JSON.
//! Failures print the error body a client would receive and exit non-zero.

mod config;

use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};

use common::Error;
use fmp_client::HttpTransport;
use market_data::MarketData;

/// Cached FMP market data proxy
#[derive(Parser)]
#[command(name = "market-proxy", about = "Cached, rate-limited FMP market data lookups")]
struct Cli {
    /// Run the same lookup this many times against one service.
    #[arg(long, global = true, default_value_t = 1)]
    repeat: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chart history for a stock ticker.
    StockHistory {
        #[arg(long)]
        symbol: String,
        /// 1 for intraday, otherwise daily.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Chart history for a crypto id (e.g. bitcoin).
    CryptoHistory {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Quote, profile and key metrics for a stock ticker.
    StockDetail {
        #[arg(long)]
        symbol: String,
    },
}

async fn lookup(svc: &MarketData<HttpTransport>, command: &Command) -> Result<Value, Error> {
    let value = match command {
        Command::StockHistory { symbol, days } => {
            serde_json::to_value(svc.stock_history(symbol, *days).await?)?
        }
        Command::CryptoHistory { id, days } => {
            serde_json::to_value(svc.crypto_history(id, *days).await?)?
        }
        Command::StockDetail { symbol } => serde_json::to_value(svc.stock_detail(symbol).await?)?,
    };
    Ok(value)
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}

fn fail(e: &Error) -> ! {
    let response = e.to_response();
    error!("Lookup failed ({}): {}", response.status, e);
    print_json(&response.body);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "market_proxy=info,fmp_client=info,market_data=info".into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => fail(&e),
    };
    info!(
        "FMP: {} (cache {}s, spacing {}ms, backoff {}ms)",
        cfg.fmp_base_url,
        cfg.cache.ttl_secs,
        cfg.rate_limit.min_interval_ms,
        cfg.rate_limit.backoff_ms
    );

    let svc = match MarketData::<HttpTransport>::from_config(&cfg) {
        Ok(svc) => svc,
        Err(e) => fail(&e),
    };

    let repeat = cli.repeat.max(1);
    let mut last = Value::Null;
    for round in 1..=repeat {
        let started = Instant::now();
        match lookup(&svc, &cli.command).await {
            Ok(value) => {
                info!(
                    "Lookup {}/{} finished in {}ms ({} cached responses)",
                    round,
                    repeat,
                    started.elapsed().as_millis(),
                    svc.client().fetcher().cache().len()
                );
                last = value;
            }
            Err(e) => fail(&e),
        }
    }

    print_json(&last);
}
