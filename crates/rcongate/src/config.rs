use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;

use crate::banlist::BanListFetcher;
use crate::policy::RolePolicy;
use crate::registry::{ServerDescriptor, ServerRegistry};

fn default_bot_version() -> String {
    "1.0.0".to_string()
}

/// On-disk gateway configuration (`config.json`).
#[derive(Deserialize)]
pub struct GateFile {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
    #[serde(default)]
    pub required_roles: Vec<String>,
    #[serde(default = "default_bot_version")]
    pub bot_version: String,
    /// Chat channel that receives audit records; a number or a string.
    #[serde(default)]
    pub log_channel_id: Option<Value>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for GateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateFile")
            .field("servers", &self.servers)
            .field("required_roles", &self.required_roles)
            .field("bot_version", &self.bot_version)
            .field("log_channel_id", &self.log_channel_id)
            .field("api_url", &self.api_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Deserialize)]
pub struct ServerEntry {
    pub ip: String,
    pub port: PortField,
    pub password: String,
}

impl std::fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerEntry")
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortField {
    Num(u64),
    Text(String),
}

impl PortField {
    fn port(&self) -> Option<u16> {
        match self {
            PortField::Num(n) => u16::try_from(*n).ok(),
            PortField::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl GateFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let f: GateFile = serde_json::from_str(raw)?;
        f.registry()?;
        Ok(f)
    }

    pub fn registry(&self) -> anyhow::Result<ServerRegistry> {
        let mut out = Vec::with_capacity(self.servers.len());
        for (name, s) in &self.servers {
            if name.trim().is_empty() {
                bail!("server with empty name");
            }
            if s.ip.trim().is_empty() {
                bail!("server {name}: empty ip");
            }
            let Some(port) = s.port.port().filter(|p| *p != 0) else {
                bail!("server {name}: bad port {:?}", s.port);
            };
            out.push(ServerDescriptor {
                name: name.clone(),
                address: s.ip.trim().to_string(),
                port,
                secret: s.password.clone(),
            });
        }
        Ok(ServerRegistry::new(out))
    }

    pub fn policy(&self) -> RolePolicy {
        RolePolicy::new(
            self.required_roles
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        )
    }

    pub fn ban_list(&self, timeout: Duration) -> anyhow::Result<BanListFetcher> {
        BanListFetcher::new(
            self.api_url.clone(),
            self.access_token.clone(),
            format!("rcongate/{}", self.bot_version),
            timeout,
        )
        .context("build ban list http client")
    }

    /// Audit destination as text; empty when unset.
    pub fn audit_dest(&self) -> String {
        match &self.log_channel_id {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
