use civic_pulse::{
    classifier::LlmClassifier,
    config::Config,
    enrichment::{init_enrichment_metrics, spawn_workers, EnrichmentConsumer},
    messaging::{init_messaging_metrics, EventPublisher, MessageProducer, MessagingService},
    outbox::OutboxRelay,
    state::create_store,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("civic_pulse={}", config.observability.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Failed to load configuration; using defaults");
    }

    tracing::info!("Starting Civic Pulse v{}", env!("CARGO_PKG_VERSION"));

    let metrics_enabled = config.observability.prometheus_enabled;
    if metrics_enabled {
        init_messaging_metrics();
        init_enrichment_metrics();
        tracing::info!("Prometheus metrics initialized");
    }

    // Storage
    tracing::info!(backend = ?config.state.backend, "Initializing storage backend");
    let store = create_store(&config.state)?;

    // Event channel
    tracing::info!(
        backend = ?config.messaging.backend,
        topic = %config.messaging.topic,
        "Initializing event channel"
    );
    let mut messaging_config = config.messaging.clone();
    messaging_config.enable_metrics &= metrics_enabled;
    let messaging = Arc::new(MessagingService::new(messaging_config)?);
    let publisher = EventPublisher::new(messaging.clone(), config.messaging.topic.clone());

    // Classifier
    let classifier = Arc::new(LlmClassifier::new(config.classifier.clone())?);
    tracing::info!(
        endpoint = %config.classifier.endpoint,
        model = %config.classifier.model,
        "Classifier initialized"
    );

    let mut consumer =
        EnrichmentConsumer::new(store.clone(), classifier, config.enrichment.clone())
            .with_metrics(metrics_enabled);
    if let Some(topic) = config.messaging.dead_letter_topic() {
        consumer = consumer.with_dead_letter(messaging.clone(), topic);
        tracing::info!(dlq_topic = %topic, "Dead letter topic enabled");
    }
    let consumer = Arc::new(consumer);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Outbox relay
    let relay = OutboxRelay::new(store.clone(), publisher, config.outbox.clone())
        .with_metrics(metrics_enabled);
    let relay_shutdown = shutdown_rx.clone();
    let relay_handle = tokio::spawn(async move { relay.run(relay_shutdown).await });

    // Enrichment workers
    let workers = spawn_workers(
        consumer,
        messaging.clone(),
        &config.messaging.topic,
        config.enrichment.workers,
        shutdown_rx,
    )
    .await?;
    tracing::info!(workers = workers.len(), "Enrichment workers started");
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    let mut handled = 0;
    for worker in workers {
        match worker.await {
            Ok(count) => handled += count,
            Err(e) => tracing::error!(error = %e, "Enrichment worker panicked"),
        }
    }
    if let Err(e) = relay_handle.await {
        tracing::error!(error = %e, "Outbox relay panicked");
    }

    if let Err(e) = messaging.close().await {
        tracing::warn!(error = %e, "Failed to flush event channel");
    }

    if metrics_enabled {
        let mut buffer = Vec::new();
        if TextEncoder::new().encode(&prometheus::gather(), &mut buffer).is_ok() {
            tracing::debug!(metrics = %String::from_utf8_lossy(&buffer), "Final metrics");
        }
    }

    tracing::info!(handled, "Shut down gracefully");
    Ok(())
}
