//! Access rules used by the command line tool.

use crm_auth_adapter::AccessControl;
use crm_auth_common::{AccessParams, Role};

/// Admins may do anything; other sales are kept out of a fixed list of
/// resources.
#[derive(Debug, Clone)]
pub struct AdminOnlyResources {
    resources: Vec<String>,
}

impl AdminOnlyResources {
    pub fn new(resources: Vec<String>) -> Self {
        Self { resources }
    }
}

impl AccessControl for AdminOnlyResources {
    fn can_access(&self, role: Role, params: &AccessParams) -> bool {
        match role {
            Role::Admin => true,
            Role::User => !self.resources.iter().any(|r| *r == params.resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_reaches_restricted_resource() {
        let rules = AdminOnlyResources::new(vec!["sales".to_string()]);
        assert!(rules.can_access(Role::Admin, &AccessParams::new("edit", "sales")));
    }

    #[test]
    fn test_user_kept_out_of_restricted_resource() {
        let rules = AdminOnlyResources::new(vec!["sales".to_string()]);
        assert!(!rules.can_access(Role::User, &AccessParams::new("list", "sales")));
        assert!(rules.can_access(Role::User, &AccessParams::new("list", "contacts")));
    }
}
