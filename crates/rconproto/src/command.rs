use crate::ProtoError;

/// One outbound command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    line: String,
    splits_tokens: bool,
}

impl CommandLine {
    pub fn new(verb: &str) -> Result<Self, ProtoError> {
        let verb = verb.trim();
        if verb.is_empty() {
            return Err(ProtoError::EmptyVerb);
        }
        if verb.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ProtoError::BadVerb(verb.to_string()));
        }
        Ok(Self {
            line: verb.to_string(),
            splits_tokens: false,
        })
    }

    /// Append one argument verbatim.
    pub fn arg(mut self, value: &str) -> Result<Self, ProtoError> {
        if value.chars().any(|c| c.is_control()) {
            return Err(ProtoError::ControlChar {
                arg: value.to_string(),
            });
        }
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            self.splits_tokens = true;
        }
        self.line.push(' ');
        self.line.push_str(value);
        Ok(self)
    }

    /// Append an argument only when present. Absent values add nothing,
    /// not even a separator.
    pub fn opt_arg(self, value: Option<&str>) -> Result<Self, ProtoError> {
        match value {
            Some(v) => self.arg(v),
            None => Ok(self),
        }
    }

    /// True if some argument will not arrive at the server as exactly one token.
    pub fn splits_tokens(&self) -> bool {
        self.splits_tokens
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn verb(&self) -> &str {
        self.line.split(' ').next().unwrap_or_default()
    }

    pub fn into_string(self) -> String {
        self.line
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_arg_is_omitted() {
        let bare = CommandLine::new("SetPin").unwrap().opt_arg(None).unwrap();
        assert_eq!(bare.as_str(), "SetPin");

        let set = CommandLine::new("SetPin")
            .unwrap()
            .opt_arg(Some("1234"))
            .unwrap();
        assert_eq!(set.as_str(), "SetPin 1234");
    }

    #[test]
    fn args_are_space_joined_without_quoting() {
        let c = CommandLine::new("giveitem")
            .unwrap()
            .arg("alice")
            .unwrap()
            .arg("rl_m4")
            .unwrap();
        assert_eq!(c.as_str(), "giveitem alice rl_m4");
        assert!(!c.splits_tokens());

        let c = CommandLine::new("UpdateServerName")
            .unwrap()
            .arg("My Server")
            .unwrap();
        assert_eq!(c.as_str(), "UpdateServerName My Server");
        assert!(c.splits_tokens());
        assert_eq!(c.verb(), "UpdateServerName");
    }

    #[test]
    fn rejects_bad_verbs_and_control_chars() {
        assert_eq!(CommandLine::new("  "), Err(ProtoError::EmptyVerb));
        assert!(matches!(
            CommandLine::new("Set Pin"),
            Err(ProtoError::BadVerb(_))
        ));
        assert!(matches!(
            CommandLine::new("kick").unwrap().arg("bob\nShutdown"),
            Err(ProtoError::ControlChar { .. })
        ));
    }
}
