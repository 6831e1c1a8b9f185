use serde::{Deserialize, Serialize};

/// What the signed-in employee is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Admin,
}

impl Role {
    /// Maps a backend role name onto a dashboard role.
    ///
    /// Managers (`Gerente`) and `Admin` get the analytics view; cooks,
    /// dispatchers and riders are regular employees.
    pub fn from_api_role(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("gerente") || raw.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Regular
        }
    }
}

/// Identity handed over by the login flow.
///
/// The dashboard never creates or validates sessions itself; it only reads
/// this value to decide which consumers are active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub role: Role,
    /// Employee identifier sent along with every transition (`empleado_id`).
    pub actor_id: String,
}

impl Session {
    pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
        Self {
            authenticated: true,
            role,
            actor_id: actor_id.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: Role::Regular,
            actor_id: String::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.authenticated && self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_roles_map_to_admin() {
        assert_eq!(Role::from_api_role("Gerente"), Role::Admin);
        assert_eq!(Role::from_api_role("admin"), Role::Admin);
        assert_eq!(Role::from_api_role("Cocinero"), Role::Regular);
        assert_eq!(Role::from_api_role("Repartidor"), Role::Regular);
    }

    #[test]
    fn test_anonymous_session_is_never_admin() {
        let mut session = Session::anonymous();
        session.role = Role::Admin;
        assert!(!session.is_admin());
    }
}
