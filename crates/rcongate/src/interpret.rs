use serde_json::Value;

use crate::catalogue::ListShape;

/// Outcome of decoding a list reply. Acknowledgement replies are not decoded;
/// the dispatcher passes them through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreted {
    /// `lines` in the remote's order; empty means "no entries".
    StructuredList { label: &'static str, lines: Vec<String> },
    DecodeError(String),
}

/// Decode a JSON list reply. Never panics on unexpected shapes.
pub fn list(payload: &str, shape: &ListShape) -> Interpreted {
    let v: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => return Interpreted::DecodeError(e.to_string()),
    };
    let Some(obj) = v.as_object() else {
        return Interpreted::DecodeError("reply is not a JSON object".to_string());
    };

    let records = match obj.get(shape.key) {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(a)) => a.as_slice(),
        Some(_) => {
            return Interpreted::DecodeError(format!("'{}' is not a list", shape.key));
        }
    };

    let mut lines = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        match render_record(rec, shape.fields) {
            Some(line) => lines.push(line),
            None => {
                return Interpreted::DecodeError(format!(
                    "record {i} of '{}' lacks {:?}",
                    shape.key, shape.fields
                ));
            }
        }
    }

    Interpreted::StructuredList {
        label: shape.key,
        lines,
    }
}

fn render_record(rec: &Value, fields: &[&str]) -> Option<String> {
    if fields.is_empty() {
        return Some(scalar_text(rec));
    }
    let obj = rec.as_object()?;
    let mut parts = Vec::with_capacity(fields.len());
    for f in fields {
        parts.push(scalar_text(obj.get(*f)?));
    }
    Some(parts.join(" "))
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{Handler, lookup};

    fn shape(action: &str) -> ListShape {
        match lookup(action).unwrap().handler {
            Handler::List { shape, .. } => shape,
            _ => panic!("{action} is not a list action"),
        }
    }

    #[test]
    fn players_in_remote_order() {
        let r = list(
            r#"{"PlayerList":[{"Username":"bob","UniqueId":"1"},{"Username":"alice"}]}"#,
            &shape("players"),
        );
        assert_eq!(
            r,
            Interpreted::StructuredList {
                label: "PlayerList",
                lines: vec!["bob".to_string(), "alice".to_string()],
            }
        );
    }

    #[test]
    fn empty_or_missing_key_is_empty_list() {
        for payload in [r#"{"PlayerList":[]}"#, r#"{"Command":"RefreshList"}"#] {
            assert_eq!(
                list(payload, &shape("players")),
                Interpreted::StructuredList {
                    label: "PlayerList",
                    lines: vec![],
                }
            );
        }
    }

    #[test]
    fn bad_shapes_are_decode_errors() {
        let s = shape("players");
        for payload in [
            "not json",
            "[1,2]",
            r#"{"PlayerList":"alice"}"#,
            r#"{"PlayerList":[{"Name":"alice"}]}"#,
        ] {
            assert!(
                matches!(list(payload, &s), Interpreted::DecodeError(_)),
                "{payload}"
            );
        }
    }

    #[test]
    fn raw_string_records_and_multi_field_records() {
        let r = list(r#"{"BanList":["76561198000000001","bob"]}"#, &shape("banlist"));
        assert_eq!(
            r,
            Interpreted::StructuredList {
                label: "BanList",
                lines: vec!["76561198000000001".to_string(), "bob".to_string()],
            }
        );

        let r = list(
            r#"{"MapList":[{"MapId":"UGC1","GameMode":"SND"},{"MapId":"datacenter","GameMode":"TDM"}]}"#,
            &shape("maplist"),
        );
        assert_eq!(
            r,
            Interpreted::StructuredList {
                label: "MapList",
                lines: vec!["UGC1 SND".to_string(), "datacenter TDM".to_string()],
            }
        );
    }
}
