//! Access policy: the single role -> capability mapping.
//!
//! Presentation (which controls to show) and every mutating entry point
//! (whether to proceed) both consult this module, so a hidden button and a
//! rejected request can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ViewDevices,
    EditDevices,
    ViewOperators,
    EditOperators,
    ViewUsers,
    EditUsers,
    ImportData,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::ViewDevices,
        Capability::EditDevices,
        Capability::ViewOperators,
        Capability::EditOperators,
        Capability::ViewUsers,
        Capability::EditUsers,
        Capability::ImportData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDevices => "viewDevices",
            Self::EditDevices => "editDevices",
            Self::ViewOperators => "viewOperators",
            Self::EditOperators => "editOperators",
            Self::ViewUsers => "viewUsers",
            Self::EditUsers => "editUsers",
            Self::ImportData => "importData",
        }
    }

    /// `true` for the read-only `view*` capabilities.
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Self::ViewDevices | Self::ViewOperators | Self::ViewUsers
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN_CAPABILITIES: &[Capability] = &Capability::ALL;

const MANAGER_CAPABILITIES: &[Capability] = &[
    Capability::ViewDevices,
    Capability::EditDevices,
    Capability::ViewOperators,
    Capability::EditOperators,
    Capability::ViewUsers,
    Capability::ImportData,
];

const VIEWER_CAPABILITIES: &[Capability] = &[
    Capability::ViewDevices,
    Capability::ViewOperators,
    Capability::ViewUsers,
];

/// Full capability set granted to a role.
pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => ADMIN_CAPABILITIES,
        Role::Manager => MANAGER_CAPABILITIES,
        Role::Viewer => VIEWER_CAPABILITIES,
    }
}

pub fn check_capability(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

/// Gate for mutating operations. Must run before any storage side effect.
pub fn require_capability(role: Role, capability: Capability) -> Result<(), CoreError> {
    if check_capability(role, capability) {
        Ok(())
    } else {
        tracing::debug!(%role, %capability, "Capability check denied");
        Err(CoreError::PermissionDenied { role, capability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn admin_is_granted_every_capability() {
        for capability in Capability::ALL {
            assert!(check_capability(Role::Admin, capability), "{capability}");
        }
    }

    #[test]
    fn manager_has_everything_but_edit_users() {
        for capability in Capability::ALL {
            let expected = capability != Capability::EditUsers;
            assert_eq!(
                check_capability(Role::Manager, capability),
                expected,
                "{capability}"
            );
        }
    }

    #[test]
    fn viewer_only_gets_view_capabilities() {
        for capability in Capability::ALL {
            assert_eq!(
                check_capability(Role::Viewer, capability),
                capability.is_view(),
                "{capability}"
            );
        }
    }

    #[test]
    fn viewer_cannot_edit_users() {
        assert!(!check_capability(Role::Viewer, Capability::EditUsers));
        assert_matches!(
            require_capability(Role::Viewer, Capability::EditUsers),
            Err(CoreError::PermissionDenied {
                role: Role::Viewer,
                capability: Capability::EditUsers
            })
        );
    }

    #[test]
    fn capability_names_serialize_in_camel_case() {
        let json = serde_json::to_string(&Capability::ImportData).unwrap();
        assert_eq!(json, "\"importData\"");
        for capability in Capability::ALL {
            let json = serde_json::to_value(capability).unwrap();
            assert_eq!(json, capability.as_str());
        }
    }
}
