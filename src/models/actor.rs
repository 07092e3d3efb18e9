//! Actor context passed explicitly into every workflow call

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::roles,
    error::{AppError, AppResult},
};

use super::UnknownVariant;

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Corrector,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => roles::CANDIDATE,
            Self::Corrector => roles::CORRECTOR,
            Self::Admin => roles::ADMIN,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            roles::CANDIDATE => Ok(Self::Candidate),
            roles::CORRECTOR => Ok(Self::Corrector),
            roles::ADMIN => Ok(Self::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: Role,
}

impl ActorContext {
    pub fn new(actor_id: Uuid, role: Role) -> Self {
        Self { actor_id, role }
    }

    pub fn admin(actor_id: Uuid) -> Self {
        Self::new(actor_id, Role::Admin)
    }

    pub fn corrector(actor_id: Uuid) -> Self {
        Self::new(actor_id, Role::Corrector)
    }

    pub fn candidate(actor_id: Uuid) -> Self {
        Self::new(actor_id, Role::Candidate)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the actor holds `role`
    pub fn require_role(&self, role: Role) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                role
            )))
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_token_strings() {
        for role in [Role::Candidate, Role::Corrector, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_require_admin() {
        let admin = ActorContext::admin(Uuid::new_v4());
        let corrector = ActorContext::corrector(Uuid::new_v4());

        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            corrector.require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
