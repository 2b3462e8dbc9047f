use anyhow::Context;
use civic_pulse::{
    config::Config,
    intake::IntakeService,
    messaging::{EventPublisher, MessageProducer, MessagingBackend, MessagingService},
    models::{Incident, NewIncident},
    outbox::OutboxRelay,
    state::create_store,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "civic-pulse-cli")]
#[command(about = "Civic Pulse incident CLI", long_about = None)]
struct Cli {
    /// Print full JSON records instead of one line per incident
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an incident report
    Report {
        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        image_url: Option<String>,

        /// Relay pending outbox rows to the event channel right away
        #[arg(short, long)]
        publish: bool,
    },

    /// List incidents, newest first
    List,

    /// Show incident details
    Show {
        #[arg(value_name = "INCIDENT_ID")]
        id: Uuid,
    },
}

fn summary(incident: &Incident) -> String {
    format!(
        "{}  {}  {:<10} {:<14} {:<7} {}",
        incident.id,
        incident.created_at.format("%Y-%m-%d %H:%M:%S"),
        incident.status,
        incident.category(),
        incident.priority(),
        incident.description
    )
}

/// Relaying from a short-lived CLI process only makes sense on a durable channel
fn check_publish(backend: MessagingBackend, publish: bool) -> anyhow::Result<()> {
    if publish && !backend.is_durable() {
        anyhow::bail!(
            "--publish requires a durable messaging backend; {:?} events would be lost \
             when the CLI exits. Leave the row in the outbox for the server relay instead",
            backend
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let store = create_store(&config.state).context("Failed to open incident store")?;
    let messaging = Arc::new(
        MessagingService::new(config.messaging.clone())
            .context("Failed to initialize event channel")?,
    );
    let publisher = EventPublisher::new(messaging.clone(), config.messaging.topic.clone());
    let intake = IntakeService::new(store.clone(), publisher.clone());

    match cli.command {
        Commands::Report {
            description,
            image_url,
            publish,
        } => {
            check_publish(config.messaging.backend, publish)?;

            let incident = intake
                .report(NewIncident {
                    description,
                    image_url,
                })
                .await?;

            if publish {
                let relay = OutboxRelay::new(store, publisher, config.outbox.clone())
                    .with_metrics(config.observability.prometheus_enabled);
                let relayed = relay.run_once().await?;
                messaging.close().await?;
                eprintln!("Relayed {} event(s) to {}", relayed, config.messaging.topic);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&incident)?);
            } else {
                println!("{}", incident.id);
            }
        }

        Commands::List => {
            let incidents = intake.list().await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&incidents)?);
            } else {
                for incident in &incidents {
                    println!("{}", summary(incident));
                }
            }
        }

        Commands::Show { id } => {
            let incident = intake.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&incident)?);
        }
    }

    Ok(())
}
