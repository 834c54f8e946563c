//! gate_core
//!
//! Types shared by the gateway and its clients: the JSON-lines intent protocol,
//! invoking identities, and the chat-neutral reply object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Mention or display name, used only for audit.
    pub display: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One invocation, as handed to the dispatcher and the audit sink.
#[derive(Clone, Debug)]
pub struct CommandRequest {
    pub action: String,
    pub args: Map<String, Value>,
    pub identity: Identity,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}

impl CommandRequest {
    pub fn new(
        action: impl Into<String>,
        args: Map<String, Value>,
        identity: Identity,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            args,
            identity,
            channel: channel.into(),
            created_at: Utc::now(),
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Anyone may run it.
    Open,
    /// Caller must hold one of the configured privileged roles.
    Privileged,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Str,
    Int,
    Bool,
}

impl ArgKind {
    pub fn describe(self) -> &'static str {
        match self {
            ArgKind::Str => "a string",
            ArgKind::Int => "an integer",
            ArgKind::Bool => "true or false",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArgInfo {
    pub name: String,
    pub kind: ArgKind,
    pub required: bool,
    pub description: String,
}

/// Catalogue entry exported for slash-command registration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
    pub access: Access,
    pub args: Vec<ArgInfo>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbedColor {
    Blue,
    Green,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub color: EmbedColor,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: EmbedColor) -> Self {
        Self {
            title: title.into(),
            color,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// What the chat side should show the invoker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    /// Visible only to the invoker.
    #[serde(default)]
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: true,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
            ephemeral: true,
        }
    }

    /// Plain-text rendering for terminals and logs.
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        if let Some(c) = &self.content {
            out.push_str(c);
        }
        if let Some(e) = &self.embed {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&e.title);
            for f in &e.fields {
                out.push_str(&format!("\n{}: {}", f.name, f.value));
            }
        }
        out
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateReq {
    Invoke {
        action: String,
        #[serde(default)]
        args: Map<String, Value>,
        identity: Identity,
        #[serde(default)]
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<DateTime<Utc>>,
    },
    Catalogue {},
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateResp {
    Reply {
        reply: Reply,
    },
    Catalogue {
        version: String,
        actions: Vec<ActionInfo>,
    },
    Err {
        message: String,
    },
}
