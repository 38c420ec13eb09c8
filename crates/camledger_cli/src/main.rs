//! camledger CLI
//!
//! Runs one ledger transaction per process against a journal file.
//!
//! # Commands
//!
//! - `init`, `register`, `set-status`, `log-access`, `anchor`, `delete` -
//!   submit a write
//! - `camera`, `video`, `cameras`, `videos`, `access-logs`, `exists` -
//!   evaluate a query
//! - `invoke` / `query` - call any operation by name with string arguments
//! - `inspect` - journal and record statistics
//! - `compact` - rewrite the journal with one frame per live key

mod commands;

use camledger_core::TxContext;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// camledger surveillance ledger tools.
#[derive(Parser)]
#[command(name = "camledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ledger journal
    #[arg(global = true, short, long)]
    state: Option<PathBuf>,

    /// Identity submitting the transaction
    #[arg(global = true, long, default_value = "Org1MSP")]
    caller: String,

    /// Transaction id (random if omitted)
    #[arg(global = true, long)]
    tx_id: Option<String>,

    /// Transaction timestamp, RFC 3339 (now if omitted)
    #[arg(global = true, long)]
    timestamp: Option<DateTime<Utc>>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the demonstration camera
    Init,

    /// Register a new camera
    Register {
        /// Device identifier
        device_id: String,
        /// Device public key
        public_key: String,
        /// Physical location
        location: String,
        /// Hardware model
        model: String,
    },

    /// Read one camera
    Camera {
        /// Device identifier
        device_id: String,
    },

    /// Change a camera's status (active, inactive, revoked)
    SetStatus {
        /// Device identifier
        device_id: String,
        /// New status
        status: String,
    },

    /// Record an access to a camera
    LogAccess {
        /// Camera identifier
        camera_id: String,
        /// Who accessed it
        accessor_id: String,
        /// What they did
        action: String,
    },

    /// Anchor off-ledger video content to a camera
    Anchor {
        /// Content identifier
        content_id: String,
        /// Blob-store locator
        locator: String,
        /// Camera identifier
        camera_id: String,
        /// Duration in seconds
        duration: String,
        /// Hash of the encryption key
        key_hash: String,
        /// Metadata as a JSON object
        #[arg(short, long, default_value = "{}")]
        metadata: String,
    },

    /// Read one video content record
    Video {
        /// Content identifier
        content_id: String,
    },

    /// List all cameras
    Cameras,

    /// List video content of a camera
    Videos {
        /// Camera identifier
        camera_id: String,
    },

    /// List access logs of a camera
    AccessLogs {
        /// Camera identifier
        camera_id: String,
    },

    /// Check whether a camera is registered
    Exists {
        /// Device identifier
        device_id: String,
    },

    /// Delete a camera record
    Delete {
        /// Device identifier
        device_id: String,
    },

    /// Submit any operation by name
    Invoke {
        /// Operation name, e.g. RegisterCamera
        function: String,
        /// String arguments
        args: Vec<String>,
    },

    /// Evaluate a read-only operation by name
    Query {
        /// Operation name, e.g. GetAllCameras
        function: String,
        /// String arguments
        args: Vec<String>,
    },

    /// Display journal and record statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the journal with one frame per live key
    Compact,

    /// Show version information
    Version,
}

impl Commands {
    /// Operation name and arguments for commands that map to one ledger
    /// call.
    fn call(self) -> Option<(String, Vec<String>)> {
        let (function, args) = match self {
            Commands::Init => ("InitLedger", vec![]),
            Commands::Register {
                device_id,
                public_key,
                location,
                model,
            } => ("RegisterCamera", vec![device_id, public_key, location, model]),
            Commands::Camera { device_id } => ("ReadCamera", vec![device_id]),
            Commands::SetStatus { device_id, status } => {
                ("UpdateCameraStatus", vec![device_id, status])
            }
            Commands::LogAccess {
                camera_id,
                accessor_id,
                action,
            } => ("LogAccess", vec![camera_id, accessor_id, action]),
            Commands::Anchor {
                content_id,
                locator,
                camera_id,
                duration,
                key_hash,
                metadata,
            } => (
                "AnchorVideoContent",
                vec![content_id, locator, camera_id, duration, key_hash, metadata],
            ),
            Commands::Video { content_id } => ("ReadVideoContent", vec![content_id]),
            Commands::Cameras => ("GetAllCameras", vec![]),
            Commands::Videos { camera_id } => ("GetCameraVideos", vec![camera_id]),
            Commands::AccessLogs { camera_id } => ("GetCameraAccessLogs", vec![camera_id]),
            Commands::Exists { device_id } => ("CameraExists", vec![device_id]),
            Commands::Delete { device_id } => ("DeleteCamera", vec![device_id]),
            Commands::Invoke { function, args } | Commands::Query { function, args } => {
                return Some((function, args))
            }
            Commands::Inspect { .. } | Commands::Compact | Commands::Version => return None,
        };
        Some((function.to_string(), args))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.state.ok_or("Ledger path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Compact => {
            let path = cli.state.ok_or("Ledger path required for compact")?;
            commands::compact::run(&path)?;
        }
        Commands::Version => {
            println!("camledger CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("camledger Core v{}", camledger_core::VERSION);
        }
        command => {
            let read_only = matches!(command, Commands::Query { .. });
            let path = cli.state.ok_or("Ledger path required")?;
            let (function, args) = command.call().ok_or("not a ledger operation")?;
            let ctx = TxContext::new(
                cli.caller,
                cli.tx_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                cli.timestamp.unwrap_or_else(Utc::now),
            );
            let output = commands::invoke::run(&path, &ctx, &function, &args, read_only)?;
            println!("{output}");
        }
    }

    Ok(())
}
