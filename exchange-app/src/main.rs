//! # Exchange Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the upstream adapters (Consul, Open Exchange Rates)
//! - Create the rate cache, exchange service and authenticator
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exchange_hex::{
    ExchangeService, RateCache, RequestAuthenticator,
    inbound::{AppState, HealthCheck, HttpServer},
};
use exchange_rates::FreshnessPolicy;
use exchange_types::{AgentStatus, Secret};
use exchange_upstream::build_upstream;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("exchange-gateway"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // OpenTelemetry export only when a collector is configured
    let otel = match std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Some(_) => Some(init_tracer()?),
        None => None,
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,exchange_app=debug,exchange_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting exchange gateway on port {}", config.port);
    tracing::info!(
        consul = %config.consul_endpoint,
        provider = %config.provider_base_url,
        debug = config.debug,
        "Upstream configuration"
    );
    if config.api_name.is_none() || config.shared_secret.is_none() {
        tracing::warn!("API_NAME or SHARED_SECRET not set; signed requests will be refused");
    }

    // Build upstream adapters (no network calls yet)
    let upstream = build_upstream(&config.upstream())?;

    // Create the cache and exchange service
    let policy = FreshnessPolicy::new(config.cache_refresh_minutes, config.cache_grace_minutes);
    let service = ExchangeService::with_cache(RateCache::new(upstream.provider, policy));

    let authenticator = RequestAuthenticator::new(
        config.api_name.clone(),
        config.shared_secret.clone().map(Secret::from),
    )
    .with_timeout(config.signature_timeout_secs)
    .with_required_date(config.require_date);

    let agent: Option<Arc<dyn AgentStatus>> = if config.consul_enabled {
        Some(upstream.consul.clone())
    } else {
        None
    };
    let health = HealthCheck {
        agent_on: config.consul_enabled,
        agent,
        agent_addr: config.consul_endpoint.clone(),
    };

    // Create and run the HTTP server
    let state = AppState::new(service, authenticator)
        .with_debug(config.debug)
        .with_health(health);
    let server = HttpServer::new(state);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    Ok(())
}
