//! Client example exercising every endpoint against a local gateway.
//!
//! The gateway runs with an in-memory rate table instead of Open Exchange
//! Rates, so no upstream credentials are needed.
//!
//! Run with: cargo run -p exchange-app --example client_example

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpListener;

use exchange_client::{ClientError, ExchangeClient};
use exchange_hex::{
    ExchangeService, RequestAuthenticator,
    inbound::{AppState, HttpServer},
};
use exchange_types::{CurrencyCode, CurrencyList, ProviderError, RateProvider, RateSet, Secret};

const API_NAME: &str = "demo";
const SECRET: &str = "demo-secret";

/// USD-based rate table; other bases are derived as cross rates.
const USD_RATES: [(&str, &str, f64); 4] = [
    ("EUR", "Euro", 0.9205),
    ("GBP", "British Pound Sterling", 0.7874),
    ("ISK", "Icelandic Króna", 138.9),
    ("USD", "United States Dollar", 1.0),
];

struct DemoProvider;

#[async_trait]
impl RateProvider for DemoProvider {
    async fn currencies(&self) -> Result<CurrencyList, ProviderError> {
        USD_RATES
            .iter()
            .map(|(code, name, _)| Ok((parse(code)?, name.to_string())))
            .collect()
    }

    async fn latest(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RateSet, ProviderError> {
        let base_rate = USD_RATES
            .iter()
            .find(|(code, _, _)| *code == base.as_str())
            .map(|(_, _, rate)| *rate)
            .ok_or_else(|| ProviderError::Status {
                status: 400,
                message: format!("Invalid base {}", base),
            })?;

        let mut rates = RateSet::new();
        for (code, _, rate) in USD_RATES {
            let code = parse(code)?;
            if symbols.is_empty() || symbols.contains(&code) {
                rates.insert(code, rate / base_rate);
            }
        }
        Ok(rates)
    }
}

fn parse(code: &str) -> Result<CurrencyCode, ProviderError> {
    code.parse()
        .map_err(|_| ProviderError::InvalidResponse(format!("bad code {}", code)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;

    println!("🚀 Starting gateway on {addr}...");

    let authenticator = RequestAuthenticator::new(Some(API_NAME.into()), Some(Secret::from(SECRET)));
    let state = AppState::new(ExchangeService::new(DemoProvider), authenticator);
    let router = HttpServer::new(state).router();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server error: {e}");
        }
    });

    let base_url = format!("http://{addr}");
    let client = ExchangeClient::new(&base_url).with_credentials(API_NAME, SECRET);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Health and currency list
    // ─────────────────────────────────────────────────────────────────────────

    let health = client.health().await?;
    println!("\n🩺 Health: {} at {}", health.status, health.time);

    let currencies = client.list().await?;
    println!("\n📋 {} currencies:", currencies.len());
    for (code, name) in &currencies {
        println!("   {code}  {name}");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Rates and conversion
    // ─────────────────────────────────────────────────────────────────────────

    let rates = client.rates("ISK", &["EUR", "USD"]).await?;
    println!("\n💱 ISK rates:");
    for (code, rate) in &rates {
        println!("   1 ISK = {rate:.6} {code}");
    }

    let amounts = [3345.0, 323_259.0, 7126.5];
    let converted = client.convert("ISK", "EUR", &amounts).await?;
    println!("\n🔁 ISK → EUR:");
    for (amount, result) in amounts.iter().zip(&converted) {
        println!("   {amount} ISK = {result} EUR");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Error handling
    // ─────────────────────────────────────────────────────────────────────────

    match client.rates("XYZ", &[]).await {
        Err(ClientError::Api { status, message }) => {
            println!("\n⚠️  Unknown currency rejected ({status}): {message}");
        }
        other => println!("\n⚠️  Unexpected result: {other:?}"),
    }

    let unsigned = ExchangeClient::new(&base_url);
    match unsigned.list().await {
        Err(ClientError::Api { status, message }) => {
            println!("🔒 Unsigned request rejected ({status}): {message}");
        }
        other => println!("🔒 Unexpected result: {other:?}"),
    }

    println!("\n✅ Done");
    Ok(())
}
