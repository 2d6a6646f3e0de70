//! seatgrid-auth — authentication backend selection and the authenticated
//! principal.
//!
//! The backend in use is chosen by a single configuration string; each
//! variant carries exactly the settings it needs. The backends themselves
//! (LDAP binds, OIDC flows, …) live outside this repo; this crate owns the
//! selection, its configuration shape, and the [`UserIdentity`] value the
//! rest of the system consumes.

pub mod backend;

pub use backend::{
    AuthBackend, CustomHeaderAuthConfig, LdapAuthConfig, OpenIdAuthConfig, SamlAuthConfig,
    SimpleAuthConfig, SimpleUser, WebServiceAuthConfig,
};

use serde::{Deserialize, Serialize};

/// The authenticated principal on whose behalf a proxy is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Case-insensitive group membership check.
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(group))
    }
}
