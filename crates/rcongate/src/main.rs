mod args;
mod audit;
mod banlist;
mod catalogue;
mod config;
mod dispatch;
mod gate;
mod interpret;
mod policy;
mod registry;
mod session;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};

use crate::audit::{AuditConfig, AuditLog, AuditSink};
use crate::config::GateFile;
use crate::dispatch::{Gateway, GatewayConfig};
use crate::session::PavlovClient;

fn usage_and_exit() -> ! {
    eprintln!(
        "rcongate (rcon admin command gateway)\n\n\
USAGE:\n  rcongate [--bind HOST:PORT] [--config PATH] [--rcon-timeout-ms N]\n\n\
ENV:\n  RCONGATE_BIND                    default 127.0.0.1:4300 (intent endpoint, JSON lines)\n  RCONGATE_CONFIG_PATH             default config.json\n  RCONGATE_RCON_TIMEOUT_MS         default 5000\n  RCONGATE_AUDIT_ENABLED           optional; default 0\n  RCONGATE_AUDIT_SPOOL_DIR         optional; default locks/audit\n  RCONGATE_AUDIT_FLUSH_INTERVAL_S  optional; default 60\n"
    );
    std::process::exit(2);
}

#[derive(Clone, Debug)]
struct Config {
    bind: SocketAddr,
    config_path: PathBuf,
    rcon_timeout: Duration,
    audit: AuditConfig,
}

fn parse_args() -> Config {
    let mut bind: SocketAddr = std::env::var("RCONGATE_BIND")
        .unwrap_or_else(|_| "127.0.0.1:4300".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());
    let mut config_path: PathBuf = std::env::var("RCONGATE_CONFIG_PATH")
        .unwrap_or_else(|_| "config.json".to_string())
        .into();
    let mut rcon_timeout_ms: u64 = std::env::var("RCONGATE_RCON_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);

    let mut audit = AuditConfig::default();
    audit.enabled = std::env::var("RCONGATE_AUDIT_ENABLED")
        .ok()
        .is_some_and(|v| v == "1");
    if let Ok(v) = std::env::var("RCONGATE_AUDIT_SPOOL_DIR") {
        if !v.trim().is_empty() {
            audit.spool_dir = v.into();
        }
    }
    audit.flush_interval_s = std::env::var("RCONGATE_AUDIT_FLUSH_INTERVAL_S")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(audit.flush_interval_s);

    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--bind" => {
                let v = it.next().unwrap_or_else(|| usage_and_exit());
                bind = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "--config" => {
                config_path = it.next().unwrap_or_else(|| usage_and_exit()).into();
            }
            "--rcon-timeout-ms" => {
                let v = it.next().unwrap_or_else(|| usage_and_exit());
                rcon_timeout_ms = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            _ => usage_and_exit(),
        }
    }
    if rcon_timeout_ms == 0 {
        usage_and_exit();
    }

    Config {
        bind,
        config_path,
        rcon_timeout: Duration::from_millis(rcon_timeout_ms),
        audit,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rcongate=info".into()),
        )
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let mut cfg = parse_args();
    let file = GateFile::load(&cfg.config_path)?;
    cfg.audit.dest = file.audit_dest();

    let registry = Arc::new(file.registry()?);
    let policy = Arc::new(file.policy());
    if policy.privileged_roles().is_empty() {
        warn!("required_roles is empty; privileged actions are open to everyone");
    }

    let audit_log = Arc::new(AuditLog::new(cfg.audit.clone()));
    let audit: Arc<dyn AuditSink> = audit_log.clone();
    let gw = Arc::new(Gateway::new(
        registry.clone(),
        policy,
        Arc::new(PavlovClient),
        audit,
        file.ban_list(cfg.rcon_timeout)?,
        GatewayConfig {
            rcon_timeout: cfg.rcon_timeout,
            version: file.bot_version.clone(),
        },
    ));

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;

    let rcon_timeout_ms = u64::try_from(cfg.rcon_timeout.as_millis()).unwrap_or(u64::MAX);
    info!(
        bind = %cfg.bind,
        config = %cfg.config_path.display(),
        servers = registry.len(),
        rcon_timeout_ms,
        audit_enabled = cfg.audit.enabled,
        audit_spool_dir = %cfg.audit.spool_dir.display(),
        version = %file.bot_version,
        "rcongate starting"
    );

    let res = tokio::select! {
        r = gate::gate_server_task(listener, gw.clone()) => r,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };

    // Connection tasks may still hold the gateway; only drain the spool when
    // this is the last handle.
    drop(gw);
    match Arc::try_unwrap(audit_log) {
        Ok(log) => log.shutdown().await,
        Err(_) => warn!("audit log still in use; unflushed records may be lost"),
    }
    res
}
