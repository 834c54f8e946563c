//! `rconproto`: the text RCON dialect spoken by the game-server backends.
//!
//! One session carries exactly one exchange:
//! - server sends a `Password:` prompt,
//! - client answers with the lowercase md5 hex of the shared secret,
//! - server answers `Authenticated=1` (anything else is a rejection),
//! - client sends one command line `<Verb>[ <arg>...]`,
//! - server sends one reply (a JSON document or a text line),
//! - client sends `Disconnect` and closes.
//!
//! Arguments are joined with single spaces and are never quoted, so an
//! argument containing whitespace reaches the server as several tokens.

pub mod auth;
pub mod command;
pub mod outcome;

pub use command::CommandLine;
pub use outcome::{FailureKind, RconFailure, RconOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    EmptyVerb,
    BadVerb(String),
    ControlChar { arg: String },
}

impl std::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtoError::EmptyVerb => write!(f, "empty command verb"),
            ProtoError::BadVerb(v) => write!(f, "command verb must be one token: {v:?}"),
            ProtoError::ControlChar { arg } => {
                write!(f, "argument contains a control character: {arg:?}")
            }
        }
    }
}

impl std::error::Error for ProtoError {}
