use change_relay::dynamodb::StreamEvent;
use change_relay::{Relay, Result, Settings};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "change-relay")]
#[command(about = "Republishes DynamoDB stream changes to Firehose or a message bus", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE", default_value = "-", help = "Stream event JSON, - for stdin")]
    event: PathBuf,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    info!(
        region = %settings.region,
        config_uri = %settings.config_uri,
        sink = ?settings.sink,
        "Configuration summary"
    );

    let relay = Relay::from_settings(&settings).await?;
    let event = read_event(&args.event).await?;

    match relay.handle(&event).await {
        Ok(summary) => {
            info!(
                records = summary.records,
                publishes = summary.publishes,
                "Invocation complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("Invocation failed: {}", e);
            Err(e)
        }
    }
}

async fn read_event(path: &Path) -> Result<StreamEvent> {
    let data = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        buf
    } else {
        tokio::fs::read(path).await?
    };

    Ok(serde_json::from_slice(&data)?)
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("change_relay=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("change_relay=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
