use std::collections::HashSet;

use gate_core::{Access, Identity};

/// True iff `held` and `required` share a role. An empty `required` set means
/// the action is unrestricted.
pub fn is_authorized<'a>(
    held: impl IntoIterator<Item = &'a str>,
    required: &HashSet<String>,
) -> bool {
    if required.is_empty() {
        return true;
    }
    held.into_iter().any(|r| required.contains(r))
}

#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    privileged: HashSet<String>,
}

impl RolePolicy {
    pub fn new(privileged: impl IntoIterator<Item = String>) -> Self {
        Self {
            privileged: privileged.into_iter().collect(),
        }
    }

    pub fn permits(&self, identity: &Identity, access: Access) -> bool {
        match access {
            Access::Open => true,
            Access::Privileged => {
                is_authorized(identity.roles.iter().map(String::as_str), &self.privileged)
            }
        }
    }

    /// Role names for help text, sorted.
    pub fn privileged_roles(&self) -> Vec<&str> {
        let mut v = self.privileged.iter().map(String::as_str).collect::<Vec<_>>();
        v.sort_unstable();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn who(roles: &[&str]) -> Identity {
        Identity {
            display: "@someone".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn intersection_rules() {
        let req: HashSet<String> = ["Admin".to_string(), "Moderator".to_string()].into();
        assert!(is_authorized(["Member", "Moderator"], &req));
        assert!(!is_authorized(["Member"], &req));
        assert!(!is_authorized(Vec::<&str>::new(), &req));
        assert!(!is_authorized(["admin"], &req));

        let open = HashSet::new();
        assert!(is_authorized(Vec::<&str>::new(), &open));
    }

    #[test]
    fn policy_skips_open_actions() {
        let p = RolePolicy::new(["Admin".to_string()]);
        assert!(p.permits(&who(&[]), Access::Open));
        assert!(!p.permits(&who(&[]), Access::Privileged));
        assert!(!p.permits(&who(&["Member"]), Access::Privileged));
        assert!(p.permits(&who(&["Member", "Admin"]), Access::Privileged));
    }

    #[test]
    fn empty_privileged_set_is_unrestricted() {
        let p = RolePolicy::default();
        assert!(p.permits(&who(&[]), Access::Privileged));
    }
}
