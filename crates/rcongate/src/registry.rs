use std::collections::HashMap;

#[derive(Clone)]
pub struct ServerDescriptor {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub secret: String,
}

impl std::fmt::Debug for ServerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDescriptor")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Game servers by name. Read-only once built.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: HashMap<String, ServerDescriptor>,
}

impl ServerRegistry {
    pub fn new(servers: impl IntoIterator<Item = ServerDescriptor>) -> Self {
        Self {
            servers: servers.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut v = self.servers.keys().map(String::as_str).collect::<Vec<_>>();
        v.sort_unstable();
        v
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str) -> ServerDescriptor {
        ServerDescriptor {
            name: name.to_string(),
            address: "127.0.0.1".to_string(),
            port: 9100,
            secret: "hunter2".to_string(),
        }
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let r = ServerRegistry::new([desc("EU-1"), desc("us-1")]);
        assert!(r.resolve("EU-1").is_some());
        assert!(r.resolve("eu-1").is_none());
        assert!(r.resolve("US-1").is_none());
        assert!(r.resolve("missing").is_none());
        assert_eq!(r.names(), vec!["EU-1", "us-1"]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn debug_redacts_secret() {
        let s = format!("{:?}", desc("eu-1"));
        assert!(s.contains("<redacted>"));
        assert!(!s.contains("hunter2"));
    }
}
