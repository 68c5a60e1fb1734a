//! Exchange CLI
//!
//! Command-line interface for the currency exchange gateway.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use exchange_client::ExchangeClient;

#[derive(Parser)]
#[command(name = "exchange")]
#[command(author, version, about = "Currency exchange gateway CLI client", long_about = None)]
struct Cli {
    /// Base URL of the exchange gateway
    #[arg(long, env = "EXCHANGE_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// API name the requests are signed as
    #[arg(long, env = "API_NAME")]
    api_name: Option<String>,

    /// Shared secret used to sign requests
    #[arg(long, env = "SHARED_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported currencies
    List,
    /// Show exchange rates for a base currency
    Rates {
        /// Base currency code
        base: String,
        /// Restrict to these currencies (comma-separated)
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// Convert amounts between currencies
    Convert {
        /// Currency the amounts are in
        base: String,
        /// Currency to convert into
        currency: String,
        /// Amounts to convert
        #[arg(required = true, allow_negative_numbers = true)]
        amounts: Vec<f64>,
    },
    /// Check gateway health
    Health,
    /// Print the signature headers for a request sent now
    Sign,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = ExchangeClient::new(&cli.api_url);
    if let (Some(name), Some(secret)) = (cli.api_name, cli.secret) {
        client = client.with_credentials(name, secret);
    }

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            if health.status != "OK" {
                std::process::exit(1);
            }
        }

        Commands::List => {
            let currencies = client.list().await?;
            println!("{}", serde_json::to_string_pretty(&currencies)?);
        }

        Commands::Rates { base, symbols } => {
            let symbols: Vec<&str> = symbols
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            let rates = client.rates(&base, &symbols).await?;
            println!("{}", serde_json::to_string_pretty(&rates)?);
        }

        Commands::Convert {
            base,
            currency,
            amounts,
        } => {
            let converted = client.convert(&base, &currency, &amounts).await?;
            for (amount, result) in amounts.iter().zip(&converted) {
                println!("{} {} = {} {}", amount, base, result, currency);
            }
        }

        Commands::Sign => {
            let Some((date, signature)) = client.signature_headers(Utc::now()) else {
                anyhow::bail!("API_NAME and SHARED_SECRET are required to sign requests");
            };
            println!("{}: {}", exchange_types::DATE_HEADER, date);
            println!("{}: {}", exchange_types::SIGNATURE_HEADER, signature);
        }
    }

    Ok(())
}
