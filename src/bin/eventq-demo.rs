//! Interactive host for the event queue.
//!
//! Reads commands from stdin, prints the queue's event stream, and stores the
//! session on Ctrl-C or `quit`.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use eventq::{
    persist::file::FileSnapshotStore,
    runtime::handle::{spawn_event_queue, EventQueueHandle, RuntimeConfig},
    upload::{
        http::HttpUploader,
        resolver::{DebugUrlResolver, DEFAULT_DEBUG_BASE},
    },
};

#[derive(Debug, Parser)]
#[command(name = "eventq-demo", about = "Track events from stdin and flush them to a collector")]
struct Args {
    /// Collector endpoint receiving the form-encoded batches.
    #[arg(long, env = "EVENTQ_SERVER_URL")]
    server_url: String,

    /// Directory holding the session snapshot.
    #[arg(long, env = "EVENTQ_STORAGE_DIR", default_value = ".")]
    storage_dir: PathBuf,

    /// JSON runtime config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    cooldown_ms: Option<u64>,

    #[arg(long)]
    backup_every: Option<usize>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Base of the status-echo service used in debug mode.
    #[arg(long, default_value = DEFAULT_DEBUG_BASE)]
    debug_base: String,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventq=debug,info".parse().expect("valid env filter")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match RuntimeConfig::from_json_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, path = %path.display(), "failed to load config");
                std::process::exit(2);
            }
        },
        None => RuntimeConfig::default(),
    };
    if let Some(ms) = args.cooldown_ms {
        config.cooldown_before_send_ms = ms;
    }
    if let Some(n) = args.backup_every {
        config.backup_every_events = n;
    }

    let resolver = Arc::new(DebugUrlResolver::with_debug_base(
        args.server_url.clone(),
        args.debug_base.clone(),
    ));
    resolver.set_debug_mode(args.debug);

    let uploader = match HttpUploader::with_resolver(resolver.clone(), args.timeout_ms) {
        Ok(uploader) => uploader,
        Err(err) => {
            error!(error = %err, "failed to build uploader");
            std::process::exit(2);
        }
    };

    let store = FileSnapshotStore::in_dir(&args.storage_dir);
    info!(path = %store.path().display(), "using snapshot file");
    let queue = spawn_event_queue(Box::new(store), Arc::new(uploader), config);

    let mut events = queue.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("{event:?}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !run_command(&queue, &resolver, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(err) = queue.shutdown().await {
        error!(error = %err, "session not stored");
    }
}

async fn run_command(queue: &EventQueueHandle, resolver: &DebugUrlResolver, line: &str) -> bool {
    let mut parts = line.splitn(3, ' ');
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();

    match cmd {
        "" => {}
        "level" => match arg.parse() {
            Ok(level) => queue.track_level_start(level),
            Err(_) => warn!(arg, "level must be a number"),
        },
        "reward" => queue.track_reward_claim(arg),
        "coins" => match arg.parse() {
            Ok(coins) => queue.track_coins_spending(coins),
            Err(_) => warn!(arg, "coins must be a number"),
        },
        "track" => queue.track(arg, rest),
        "pending" => match queue.pending().await {
            Ok(pending) => println!("{pending:?}"),
            Err(err) => warn!(error = %err, "pending query failed"),
        },
        "state" => match queue.flush_state().await {
            Ok(state) => println!("{state:?}"),
            Err(err) => warn!(error = %err, "state query failed"),
        },
        "debug" => resolver.set_debug_mode(arg == "on"),
        "fail" => resolver.set_failed_request(arg == "on"),
        "long" => resolver.set_long_request(arg == "on"),
        "quit" | "exit" => return false,
        other => warn!(command = other, "unknown command"),
    }
    true
}
