//! courier replay tool
//!
//! Feeds newline-delimited JSON `Inbound` values through a hub and reports
//! what the dispatcher did with them.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use courier::{
    AudioMessage, AudioMessageHandler, ContactStore, DispatchConfig, DocumentMessage,
    DocumentMessageHandler, Handler, Hub, ImageMessage, ImageMessageHandler, InMemoryContactStore,
    Inbound, LiveLocationMessage, LiveLocationMessageHandler, LocationMessage,
    LocationMessageHandler, ObserverBuilder, RawEnvelope, RawMessageHandler, SessionError,
    StatusHandler, TextMessage, TextMessageHandler, VideoMessage, VideoMessageHandler,
};

/// Replay configuration
struct Config {
    /// Delivery pool settings
    dispatch: DispatchConfig,
    /// How long to wait for deliveries after the last input line
    drain: Duration,
    /// Input file; stdin when absent
    input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            drain: Duration::from_millis(5_000),
            input: None,
        }
    }
}

fn value_of(args: &[String], i: usize, flag: &str) -> String {
    if let Some(v) = args.get(i + 1) {
        v.clone()
    } else {
        eprintln!("error: {flag} requires a value");
        std::process::exit(1);
    }
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config {
        dispatch: DispatchConfig::from_env().unwrap_or_else(|err| {
            eprintln!("error: {err}");
            std::process::exit(1);
        }),
        ..Config::default()
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--workers" | "-w" => {
                let raw = value_of(&args, i, "--workers");
                config.dispatch.workers = raw.parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid worker count: {raw}");
                    std::process::exit(1);
                });
                i += 2;
            }
            "--drain-ms" => {
                let raw = value_of(&args, i, "--drain-ms");
                let ms: u64 = raw.parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid drain timeout: {raw}");
                    std::process::exit(1);
                });
                config.drain = Duration::from_millis(ms);
                i += 2;
            }
            "--input" | "-i" => {
                config.input = Some(PathBuf::from(value_of(&args, i, "--input")));
                i += 2;
            }
            "--help" | "-h" => {
                println!("courier-replay - replay session input through the dispatcher");
                println!();
                println!("USAGE:");
                println!("    courier-replay [OPTIONS] < input.ndjson");
                println!();
                println!("OPTIONS:");
                println!("    -w, --workers <N>        Delivery worker threads [default: 4]");
                println!("        --drain-ms <MS>      Drain timeout after input ends [default: 5000]");
                println!("    -i, --input <FILE>       Read from FILE instead of stdin");
                println!("    -h, --help               Print help information");
                println!();
                println!("Log output is controlled by RUST_LOG (e.g. RUST_LOG=courier=debug).");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
    }

    config
}

/// Logs every delivery it receives.
struct LoggingObserver;

impl Handler for LoggingObserver {
    fn handle_error(&self, err: SessionError) {
        tracing::info!(target: "courier_replay", error = %err, "error");
    }
}

impl StatusHandler for LoggingObserver {
    fn handle_status(&self, status: String) {
        tracing::info!(target: "courier_replay", %status, "status");
    }
}

impl TextMessageHandler for LoggingObserver {
    fn handle_text_message(&self, message: TextMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            chat = %message.info.remote_jid,
            text = %message.text,
            "text"
        );
    }
}

impl ImageMessageHandler for LoggingObserver {
    fn handle_image_message(&self, message: ImageMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            caption = %message.caption,
            "image"
        );
    }
}

impl VideoMessageHandler for LoggingObserver {
    fn handle_video_message(&self, message: VideoMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            seconds = message.length_seconds,
            "video"
        );
    }
}

impl AudioMessageHandler for LoggingObserver {
    fn handle_audio_message(&self, message: AudioMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            ptt = message.ptt,
            "audio"
        );
    }
}

impl DocumentMessageHandler for LoggingObserver {
    fn handle_document_message(&self, message: DocumentMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            file = %message.file_name,
            "document"
        );
    }
}

impl LocationMessageHandler for LoggingObserver {
    fn handle_location_message(&self, message: LocationMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            lat = message.latitude,
            lon = message.longitude,
            "location"
        );
    }
}

impl LiveLocationMessageHandler for LoggingObserver {
    fn handle_live_location_message(&self, message: LiveLocationMessage) {
        tracing::info!(
            target: "courier_replay",
            id = %message.info.id,
            seq = message.sequence_number,
            "live location"
        );
    }
}

impl RawMessageHandler for LoggingObserver {
    fn handle_raw_message(&self, envelope: RawEnvelope) {
        tracing::debug!(
            target: "courier_replay",
            id = %envelope.key.id,
            chat = %envelope.key.remote_jid,
            "raw envelope"
        );
    }
}

fn open_input(path: Option<&PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = parse_args();

    let contacts = Arc::new(InMemoryContactStore::new());
    let hub = Hub::builder()
        .config(config.dispatch)
        .contact_store(Arc::clone(&contacts) as Arc<dyn ContactStore>)
        .build()?;

    hub.register(
        ObserverBuilder::new(LoggingObserver)
            .name("replay-logger")
            .status()
            .text()
            .image()
            .video()
            .audio()
            .document()
            .location()
            .live_location()
            .raw()
            .build(),
    );

    let reader = open_input(config.input.as_ref())?;
    let mut lines = 0usize;
    let mut rejected = 0usize;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        lines += 1;
        match serde_json::from_str::<Inbound>(&line) {
            Ok(value) => hub.dispatch(value),
            Err(err) => {
                rejected += 1;
                tracing::warn!(
                    target: "courier_replay",
                    line = n + 1,
                    error = %err,
                    "skipping malformed input line"
                );
            }
        }
    }

    hub.wait_idle(config.drain)?;

    let report = serde_json::json!({
        "lines": lines,
        "rejected": rejected,
        "contacts": contacts.len()?,
        "stats": hub.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
