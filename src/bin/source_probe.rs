// src/bin/source_probe.rs
use arbiter::config::ArbiterConfig;
use arbiter::providers;
use clap::Parser;

/// Query one exchange's three market calls once and print the results.
#[derive(Debug, Parser)]
struct Args {
    /// binance | bybit | mexc
    exchange: String,
    #[arg(default_value = "BTCUSDT")]
    pair: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = ArbiterConfig::load(None)?;
    cfg.exchanges = vec![args.exchange.to_lowercase()];
    let pair = args.pair.trim().to_uppercase();

    let sources = providers::build(&cfg)?;
    let Some(src) = sources.first() else {
        anyhow::bail!("no adapter for {}", args.exchange);
    };

    match src.funding_rate(&pair).await {
        Ok(f) => println!("{} {} funding={} next_ms={}", src.name(), pair, f.rate, f.next_funding_ms),
        Err(e) => println!("{} {} funding error: {e}", src.name(), pair),
    }
    match src.spread(&pair).await {
        Ok(s) => println!("{} {} bid={} ask={} spread_pct={:.6}", src.name(), pair, s.bid, s.ask, s.pct_of_bid()),
        Err(e) => println!("{} {} spread error: {e}", src.name(), pair),
    }
    match src.order_book_depth(&pair).await {
        Ok(d) => println!("{} {} bid_depth={:.2} ask_depth={:.2}", src.name(), pair, d.bid_depth, d.ask_depth),
        Err(e) => println!("{} {} depth error: {e}", src.name(), pair),
    }
    Ok(())
}
