use crate::access::Capability;
use crate::roles::Role;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Permission denied: role '{role}' lacks capability '{capability}'")]
    PermissionDenied { role: Role, capability: Capability },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown reference: {entity} with id {id} does not exist")]
    Reference { entity: &'static str, id: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn reference(entity: &'static str, id: impl ToString) -> Self {
        Self::Reference {
            entity,
            id: id.to_string(),
        }
    }
}
