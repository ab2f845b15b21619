use anyhow::Result;
use clap::Parser;
use proxytcp::{
    Role, Tunnel, TunnelConfig,
    config::{DEFAULT_KEY, DEFAULT_LISTEN_ADDR, DEFAULT_REMOTE_ADDR},
};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "proxytcp", author, version, about = "tcp proxy server", long_about = None)]
struct Args {
    /// Enable server mode, wins over --client
    #[arg(short, long)]
    server: bool,

    /// Enable client mode (the default)
    #[arg(short, long)]
    client: bool,

    /// Proxy server listen address
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Remote server address
    #[arg(short, long, default_value = DEFAULT_REMOTE_ADDR)]
    remoteaddr: String,

    /// Encryption key, 16, 24 or 32 bytes
    #[arg(short, long, default_value = DEFAULT_KEY)]
    key: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// role picks server when -s is given, client otherwise
    fn role(&self) -> Role {
        if self.server {
            Role::Server
        } else {
            Role::Client
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let role = args.role();

    // Every connection will fail to key its session, but keep serving
    if !matches!(args.key.len(), 16 | 24 | 32) {
        warn!(
            "key is {} bytes; AES needs 16, 24 or 32 so every connection will be dropped",
            args.key.len()
        );
    }

    let config = TunnelConfig::new(role, args.listen, args.remoteaddr, args.key);

    // Run it
    Tunnel::new(config).run().await
}
