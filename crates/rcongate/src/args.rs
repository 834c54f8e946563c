use gate_core::ArgKind;
use serde_json::{Map, Value};

use crate::catalogue::ArgSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    Missing(&'static str),
    WrongKind { name: &'static str, kind: ArgKind },
}

impl std::fmt::Display for ArgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgError::Missing(name) => write!(f, "Missing required argument '{name}'."),
            ArgError::WrongKind { name, kind } => {
                write!(f, "Argument '{name}' must be {}.", kind.describe())
            }
        }
    }
}

impl std::error::Error for ArgError {}

/// Arguments checked against a schema, kept in schema order as wire text.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(&'static str, Option<String>)>,
}

impl Args {
    pub fn validate(schema: &[ArgSpec], raw: &Map<String, Value>) -> Result<Self, ArgError> {
        let mut values = Vec::with_capacity(schema.len());
        for spec in schema {
            let v = match raw.get(spec.name) {
                None | Some(Value::Null) => None,
                Some(v) => coerce(v, spec.kind).ok_or(ArgError::WrongKind {
                    name: spec.name,
                    kind: spec.kind,
                })?,
            };
            // An empty string counts as "not given".
            let v = v.filter(|s| !s.is_empty());
            if spec.required && v.is_none() {
                return Err(ArgError::Missing(spec.name));
            }
            values.push((spec.name, v));
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Values in schema order, `None` for omitted optionals.
    pub fn ordered(&self) -> impl Iterator<Item = Option<&str>> {
        self.values.iter().map(|(_, v)| v.as_deref())
    }

    /// True if the schema has optional arguments and none was given.
    pub fn optionals_omitted(&self, schema: &[ArgSpec]) -> bool {
        let mut any = false;
        for spec in schema.iter().filter(|s| !s.required) {
            any = true;
            if self.get(spec.name).is_some() {
                return false;
            }
        }
        any
    }

    /// Substitute `{name}` placeholders with argument values.
    /// One pass over the template; substituted values are never rescanned.
    /// Braces that do not name an argument are copied through.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };
            let key = &tail[1..close];
            match self.values.iter().find(|(n, _)| *n == key) {
                Some((_, v)) => out.push_str(v.as_deref().unwrap_or_default()),
                None => out.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

fn coerce(v: &Value, kind: ArgKind) -> Option<Option<String>> {
    let s = match (kind, v) {
        (ArgKind::Str, Value::String(s)) => s.clone(),
        (ArgKind::Str, Value::Number(n)) => n.to_string(),
        (ArgKind::Str, Value::Bool(b)) => b.to_string(),
        (ArgKind::Int, Value::Number(n)) => n.as_i64()?.to_string(),
        (ArgKind::Int, Value::String(s)) => s.trim().parse::<i64>().ok()?.to_string(),
        (ArgKind::Bool, Value::Bool(b)) => b.to_string(),
        (ArgKind::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => "true".to_string(),
            "false" => "false".to_string(),
            _ => return None,
        },
        _ => return None,
    };
    Some(Some(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{opt, req};
    use serde_json::json;

    const SCHEMA: &[ArgSpec] = &[
        req("server_name", ArgKind::Str, "server"),
        req("max_players", ArgKind::Int, "max"),
        opt("pin", ArgKind::Str, "pin"),
    ];

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn validates_in_schema_order() {
        let a = Args::validate(
            SCHEMA,
            &map(json!({"pin": "1234", "max_players": 24, "server_name": "eu-1"})),
        )
        .unwrap();
        let v = a.ordered().collect::<Vec<_>>();
        assert_eq!(v, vec![Some("eu-1"), Some("24"), Some("1234")]);
        assert!(!a.optionals_omitted(SCHEMA));
    }

    #[test]
    fn missing_and_wrong_kind() {
        let e = Args::validate(SCHEMA, &map(json!({"max_players": 1}))).unwrap_err();
        assert_eq!(e, ArgError::Missing("server_name"));
        assert_eq!(e.to_string(), "Missing required argument 'server_name'.");

        let e = Args::validate(
            SCHEMA,
            &map(json!({"server_name": "eu-1", "max_players": "lots"})),
        )
        .unwrap_err();
        assert_eq!(e.to_string(), "Argument 'max_players' must be an integer.");

        let e = Args::validate(
            SCHEMA,
            &map(json!({"server_name": "eu-1", "max_players": 2.5})),
        )
        .unwrap_err();
        assert!(matches!(e, ArgError::WrongKind { name: "max_players", .. }));
    }

    #[test]
    fn empty_or_null_optional_is_omitted() {
        for pin in [json!(null), json!("")] {
            let a = Args::validate(
                SCHEMA,
                &map(json!({"server_name": "eu-1", "max_players": "8", "pin": pin})),
            )
            .unwrap();
            assert_eq!(a.get("pin"), None);
            assert!(a.optionals_omitted(SCHEMA));
        }
    }

    #[test]
    fn renders_placeholders() {
        let a = Args::validate(
            SCHEMA,
            &map(json!({"server_name": "eu-1", "max_players": 10})),
        )
        .unwrap();
        assert_eq!(
            a.render("Maximum players set to {max_players} on {server_name}."),
            "Maximum players set to 10 on eu-1."
        );
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        const GIVE: &[ArgSpec] = &[
            req("server_name", ArgKind::Str, "server"),
            req("username", ArgKind::Str, "player"),
            req("item_id", ArgKind::Str, "item"),
        ];
        let a = Args::validate(
            GIVE,
            &map(json!({"server_name": "eu-1", "username": "{item_id}", "item_id": "ak47"})),
        )
        .unwrap();
        assert_eq!(
            a.render("Item {item_id} given to {username} on {server_name}."),
            "Item ak47 given to {item_id} on eu-1."
        );
        assert_eq!(a.render("{nope} {item_id} {"), "{nope} ak47 {");
    }
}
