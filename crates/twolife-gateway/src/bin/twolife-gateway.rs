//! TwoLifeCar Gateway Binary
//!
//! # Usage
//! ```bash
//! twolife-gateway [--config gateway.toml] [--port 5000] [--host 127.0.0.1] [--verbose]
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twolife_gateway::{Environment, Gateway, GatewayConfig};

/// TwoLifeCar Gateway - lead capture API and admin backend
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON or TOML config file, applied before environment variables
    #[arg(short, long, env = "TWOLIFE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long)]
    database: Option<String>,

    /// Run as production regardless of NODE_ENV/APP_ENV
    #[arg(long)]
    production: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "twolife_gateway=debug,twolife_core=debug,tower_http=debug"
    } else {
        "twolife_gateway=info,twolife_core=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_target(args.verbose))
        .init();

    let base = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    let mut config = base.with_env().context("reading environment")?;

    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(host) = args.host {
        config = config.with_host(host);
    }
    if let Some(database) = args.database {
        config = config.with_database_path(database);
    }
    if args.production {
        config = config.with_environment(Environment::Production);
    }

    print_banner(&config);

    let gateway = Gateway::open(config).context("starting gateway")?;
    if gateway.provision_admin().await.context("provisioning admin")? {
        tracing::warn!("Default admin created; change its password before going live");
    }

    gateway.start().await?;
    Ok(())
}

fn print_banner(config: &GatewayConfig) {
    println!();
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║                                                               ║");
    println!("║              🚗  TWOLIFECAR GATEWAY  🚗                       ║");
    println!("║                                                               ║");
    println!("║          Lead capture API and admin backend                   ║");
    println!("║                                                               ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("📡 HTTP Server");
    println!("   └─ http://{}:{}  ({})", config.host, config.port, config.environment.as_str());
    println!();
    println!("🔗 HTTP Endpoints");
    println!("   ├─ GET    /                           Service info");
    println!("   ├─ GET    /api/health                 Health check");
    println!("   ├─ POST   /api/leads                  Submit lead");
    println!("   ├─ GET    /api/leads                  List leads (auth)");
    println!("   ├─ DELETE /api/leads/:id              Delete lead (auth)");
    println!("   ├─ POST   /api/leads/:id/reply        Reply to lead (auth)");
    println!("   ├─ POST   /api/login                  Operator login");
    println!("   ├─ GET    /api/verification/status    Verification status");
    println!("   └─ GET    /api/notifications/status   Notification status");
    println!();
    println!("─────────────────────────────────────────────────────────────────");
    println!("Press Ctrl+C to stop the gateway");
    println!();
}
