use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gate_core::{Access, CommandRequest, Embed, EmbedColor, Reply};
use rconproto::{CommandLine, FailureKind, RconFailure, RconOutcome};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::args::Args;
use crate::audit::{AuditRecord, AuditSink};
use crate::banlist::{BanListFetcher, lookup_message};
use crate::catalogue::{self, ActionSpec, CATALOGUE, Handler, ListShape, Messages, SERVER_ARG};
use crate::interpret::{self, Interpreted};
use crate::policy::RolePolicy;
use crate::registry::ServerRegistry;
use crate::session::SessionClient;

pub const DENIED: &str = "You do not have the required role to use this command.";
pub const LANGUAGE: &str = "Rust";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub rcon_timeout: Duration,
    pub version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rcon_timeout: Duration::from_millis(5000),
            version: "1.0.0".to_string(),
        }
    }
}

/// Turns one `CommandRequest` into one `Reply`.
pub struct Gateway<C> {
    registry: Arc<ServerRegistry>,
    policy: Arc<RolePolicy>,
    client: Arc<C>,
    audit: Arc<dyn AuditSink>,
    banlist: BanListFetcher,
    cfg: GatewayConfig,
    next_req: AtomicU64,
}

impl<C: SessionClient> Gateway<C> {
    pub fn new(
        registry: Arc<ServerRegistry>,
        policy: Arc<RolePolicy>,
        client: Arc<C>,
        audit: Arc<dyn AuditSink>,
        banlist: BanListFetcher,
        cfg: GatewayConfig,
    ) -> Self {
        Self {
            registry,
            policy,
            client,
            audit,
            banlist,
            cfg,
            next_req: AtomicU64::new(1),
        }
    }

    pub fn version(&self) -> &str {
        &self.cfg.version
    }

    /// Every call yields exactly one audit record and one reply.
    pub async fn dispatch(&self, req: CommandRequest) -> Reply {
        let id = self.next_req.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("dispatch", req = id, action = %req.action);
        self.dispatch_one(id, req).instrument(span).await
    }

    async fn dispatch_one(&self, id: u64, req: CommandRequest) -> Reply {
        self.audit.record(AuditRecord::from_request(id, &req));

        let Some(spec) = catalogue::lookup(&req.action) else {
            info!(action=%req.action, user=%req.identity.display, "unknown action");
            return Reply::text(format!("Unknown command '{}'.", req.action));
        };

        if !self.policy.permits(&req.identity, spec.access) {
            info!(action=%spec.name, user=%req.identity.display, "denied");
            return Reply::text(DENIED);
        }

        let args = match Args::validate(spec.args, &req.args) {
            Ok(a) => a,
            Err(e) => return Reply::text(e.to_string()),
        };

        match spec.handler {
            Handler::Relay { verb, msgs } => self.relay(spec, verb, msgs, &args).await,
            Handler::List { verb, shape } => self.list(spec, verb, &shape, &args).await,
            Handler::CheckUnban => {
                let username = args.get("username").unwrap_or_default();
                let res = self.banlist.lookup(username).await;
                Reply::text(lookup_message(username, &res))
            }
            Handler::Debug => Reply::embed(self.debug_embed()),
            Handler::Help => Reply::embed(self.help_embed()),
        }
    }

    async fn relay(&self, spec: &ActionSpec, verb: &str, msgs: Messages, args: &Args) -> Reply {
        let (ok, failed) = match msgs.bare {
            Some(bare) if args.optionals_omitted(spec.args) => bare,
            _ => (msgs.ok, msgs.failed),
        };
        match self.run(spec, verb, args).await {
            Ok(RconOutcome::Success(payload)) => {
                Reply::text(format!("{}\nResponse: {payload}", args.render(ok)))
            }
            Ok(RconOutcome::Failure(f)) => Reply::text(failure_text(&args.render(failed), &f)),
            Err(reply) => reply,
        }
    }

    async fn list(&self, spec: &ActionSpec, verb: &str, shape: &ListShape, args: &Args) -> Reply {
        let payload = match self.run(spec, verb, args).await {
            Ok(RconOutcome::Success(payload)) => payload,
            Ok(RconOutcome::Failure(f)) => {
                return Reply::text(failure_text(&args.render(shape.failed), &f));
            }
            Err(reply) => return reply,
        };
        match interpret::list(&payload, shape) {
            Interpreted::StructuredList { lines, .. } if lines.is_empty() => {
                Reply::text(args.render(shape.empty))
            }
            Interpreted::StructuredList { label, lines } => {
                debug!(action=%spec.name, label, entries = lines.len(), "list reply");
                Reply::text(format!(
                    "{}\n```\n{}\n```",
                    args.render(shape.heading),
                    lines.join("\n")
                ))
            }
            Interpreted::DecodeError(e) => {
                warn!(action=%spec.name, err=%e, "undecodable list reply");
                Reply::text(shape.parse_failed)
            }
        }
    }

    /// Resolve the target, build the line and run one exchange. `Err` is a
    /// finished reply for a request that never reached a server.
    async fn run(&self, spec: &ActionSpec, verb: &str, args: &Args) -> Result<RconOutcome, Reply> {
        let server = args.get(SERVER_ARG).unwrap_or_default();
        let Some(target) = self.registry.resolve(server) else {
            debug!(server=%server, "server not found");
            return Err(Reply::text(format!("Server '{server}' not found.")));
        };

        // The server name selects the target; it is not part of the line.
        let line = build_line(verb, args.ordered().skip(1)).map_err(|e| {
            info!(action=%spec.name, err=%e, "rejected argument");
            Reply::text(format!("Invalid argument: {e}."))
        })?;
        if line.splits_tokens() {
            warn!(action=%spec.name, verb=%line.verb(), "argument will be split into several tokens");
        }

        let client = Arc::clone(&self.client);
        let target = target.clone();
        let command = line.into_string();
        let wait = self.cfg.rcon_timeout;
        let mut task = tokio::spawn(async move { client.exchange(&target, &command).await });

        let outcome = match tokio::time::timeout(wait, &mut task).await {
            Ok(Ok(o)) => o,
            Ok(Err(e)) => {
                RconOutcome::Failure(RconFailure::new(FailureKind::Aborted, e.to_string()))
            }
            Err(_) => {
                task.abort();
                RconOutcome::Failure(RconFailure::timed_out(wait))
            }
        };
        if let RconOutcome::Failure(f) = &outcome {
            warn!(action=%spec.name, server=%server, err=%f, "rcon exchange failed");
        }
        Ok(outcome)
    }

    fn debug_embed(&self) -> Embed {
        let servers = self.registry.names();
        let commands = CATALOGUE.iter().map(|a| a.name).collect::<Vec<_>>();
        Embed::new("Debug Information", EmbedColor::Blue)
            .field("Version", &self.cfg.version, false)
            .field("Programming Language", LANGUAGE, false)
            .field("Servers", or_none(&servers.join(", ")), false)
            .field("API URL", self.banlist.url().unwrap_or("None"), false)
            .field("Commands", commands.join(", "), false)
            .field("Bot Status", "Ready", false)
    }

    fn help_embed(&self) -> Embed {
        let roles = self.policy.privileged_roles();
        let mut e = Embed::new("Help - Command List", EmbedColor::Green);
        for a in CATALOGUE {
            let access = match a.access {
                Access::Privileged if !roles.is_empty() => {
                    format!("Required role: {}", roles.join(", "))
                }
                _ => "No required role".to_string(),
            };
            e = e.field(
                format!("/{}", a.name),
                format!("{}. {access}", a.description),
                false,
            );
        }
        e
    }
}

fn or_none(s: &str) -> &str {
    if s.is_empty() { "None" } else { s }
}

fn build_line<'a>(
    verb: &str,
    values: impl Iterator<Item = Option<&'a str>>,
) -> Result<CommandLine, rconproto::ProtoError> {
    let mut line = CommandLine::new(verb)?;
    for v in values {
        line = line.opt_arg(v)?;
    }
    Ok(line)
}

fn failure_text(msg: &str, f: &RconFailure) -> String {
    match &f.payload {
        Some(p) => format!("{msg}\nResponse: {p}"),
        None => msg.to_string(),
    }
}
