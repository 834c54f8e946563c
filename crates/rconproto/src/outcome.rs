use std::time::Duration;

/// Result of one RCON exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RconOutcome {
    Success(String),
    Failure(RconFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Auth,
    Io,
    Timeout,
    EmptyReply,
    Aborted,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Connect => "connect",
            FailureKind::Auth => "auth",
            FailureKind::Io => "io",
            FailureKind::Timeout => "timeout",
            FailureKind::EmptyReply => "empty_reply",
            FailureKind::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconFailure {
    pub kind: FailureKind,
    pub detail: String,
    /// Raw reply text, when the server answered something despite the failure.
    pub payload: Option<String>,
}

impl RconFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("no reply within {}ms", after.as_millis()),
        )
    }
}

impl std::fmt::Display for RconFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

impl std::error::Error for RconFailure {}

impl RconOutcome {
    /// Normalise a raw reply: an empty or whitespace-only reply is a failure.
    pub fn from_reply(raw: &[u8]) -> Self {
        let s = String::from_utf8_lossy(raw);
        let s = s.trim_end_matches('\0').trim();
        if s.is_empty() {
            return RconOutcome::Failure(RconFailure::new(
                FailureKind::EmptyReply,
                "server sent an empty reply",
            ));
        }
        RconOutcome::Success(s.to_string())
    }
}
