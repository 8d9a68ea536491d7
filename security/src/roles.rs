// security/src/roles.rs
use models::medical::Role;

use crate::{AuthError, CallerIdentity};

/// A set of roles allowed to invoke a route.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    allowed: &'static [Role],
    message: &'static str,
}

impl RoleGate {
    pub const ADMIN: RoleGate = RoleGate {
        allowed: &[Role::Admin],
        message: "Access denied: Admin privileges required",
    };
    pub const DOCTOR: RoleGate = RoleGate {
        allowed: &[Role::Doctor],
        message: "Access denied: Doctor privileges required",
    };
    pub const PATIENT: RoleGate = RoleGate {
        allowed: &[Role::Patient],
        message: "Access denied: Patient account required",
    };
    pub const CLINICAL: RoleGate = RoleGate {
        allowed: &[Role::Doctor, Role::Admin],
        message: "Not authorized for this action",
    };

    pub const fn new(allowed: &'static [Role], message: &'static str) -> Self {
        RoleGate { allowed, message }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    pub fn check(&self, caller: &CallerIdentity) -> Result<(), AuthError> {
        if self.permits(caller.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = %caller.user_id, role = %caller.role, "Role gate rejected caller");
            Err(AuthError::Forbidden(self.message.to_string()))
        }
    }
}

/// Shorthand for `gate.check(caller)`.
pub fn require_role(caller: &CallerIdentity, gate: RoleGate) -> Result<(), AuthError> {
    gate.check(caller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn caller(role: Role) -> CallerIdentity {
        CallerIdentity { user_id: Uuid::new_v4(), email: "x@y.z".to_string(), role }
    }

    #[test]
    fn admin_gate_rejects_other_roles() {
        assert!(require_role(&caller(Role::Admin), RoleGate::ADMIN).is_ok());
        assert_eq!(
            require_role(&caller(Role::Doctor), RoleGate::ADMIN).unwrap_err(),
            AuthError::Forbidden("Access denied: Admin privileges required".to_string())
        );
    }

    #[test]
    fn clinical_gate_admits_doctor_and_admin() {
        assert!(RoleGate::CLINICAL.permits(Role::Doctor));
        assert!(RoleGate::CLINICAL.permits(Role::Admin));
        assert!(!RoleGate::CLINICAL.permits(Role::Patient));
    }
}
