//! Authentication backend variants.
//!
//! One backend is active per deployment, chosen by the `type` string of the
//! `[proxy.authentication]` config table. Construction from a flat settings
//! map is also supported for environments that configure through properties.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// The configured authentication backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthBackend {
    /// No authentication; every visitor is anonymous.
    None,
    /// Static user list from configuration.
    Simple(SimpleAuthConfig),
    Ldap(LdapAuthConfig),
    #[serde(rename = "openid")]
    OpenId(OpenIdAuthConfig),
    Saml(SamlAuthConfig),
    /// Delegate credential checks to an HTTP service.
    #[serde(rename = "webservice")]
    WebService(WebServiceAuthConfig),
    /// Trust identity headers set by a fronting gateway.
    CustomHeader(CustomHeaderAuthConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimpleAuthConfig {
    #[serde(default)]
    pub users: Vec<SimpleUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimpleUser {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LdapAuthConfig {
    pub url: String,
    #[serde(default)]
    pub user_dn_pattern: Option<String>,
    #[serde(default)]
    pub group_search_base: Option<String>,
    #[serde(default)]
    pub manager_dn: Option<String>,
    #[serde(default)]
    pub manager_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenIdAuthConfig {
    pub auth_url: String,
    pub token_url: String,
    pub jwks_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_username_attribute")]
    pub username_attribute: String,
    #[serde(default)]
    pub roles_claim: Option<String>,
}

fn default_username_attribute() -> String {
    "sub".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SamlAuthConfig {
    pub idp_metadata_url: String,
    pub app_entity_id: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebServiceAuthConfig {
    pub authentication_url: String,
    #[serde(default)]
    pub authentication_request_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CustomHeaderAuthConfig {
    pub username_header: String,
    #[serde(default)]
    pub groups_header: Option<String>,
}

impl AuthBackend {
    /// The config string naming this backend kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthBackend::None => "none",
            AuthBackend::Simple(_) => "simple",
            AuthBackend::Ldap(_) => "ldap",
            AuthBackend::OpenId(_) => "openid",
            AuthBackend::Saml(_) => "saml",
            AuthBackend::WebService(_) => "webservice",
            AuthBackend::CustomHeader(_) => "custom-header",
        }
    }

    /// Whether this backend presents a login form of its own.
    pub fn has_login_form(&self) -> bool {
        matches!(
            self,
            AuthBackend::Simple(_) | AuthBackend::Ldap(_) | AuthBackend::WebService(_)
        )
    }

    /// Build a backend from its kind string and a flat settings map.
    ///
    /// Each variant reads only the keys it needs; a missing required key or
    /// an unknown kind fails fast.
    pub fn from_settings(kind: &str, settings: &BTreeMap<String, String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            settings
                .get(key)
                .cloned()
                .with_context(|| format!("authentication setting {key} is required for {kind}"))
        };
        let optional = |key: &str| settings.get(key).cloned();

        let backend = match kind {
            "none" => AuthBackend::None,
            "simple" => AuthBackend::Simple(SimpleAuthConfig::default()),
            "ldap" => AuthBackend::Ldap(LdapAuthConfig {
                url: required("ldap.url")?,
                user_dn_pattern: optional("ldap.user-dn-pattern"),
                group_search_base: optional("ldap.group-search-base"),
                manager_dn: optional("ldap.manager-dn"),
                manager_password: optional("ldap.manager-password"),
            }),
            "openid" => AuthBackend::OpenId(OpenIdAuthConfig {
                auth_url: required("openid.auth-url")?,
                token_url: required("openid.token-url")?,
                jwks_url: required("openid.jwks-url")?,
                client_id: required("openid.client-id")?,
                client_secret: required("openid.client-secret")?,
                username_attribute: optional("openid.username-attribute")
                    .unwrap_or_else(default_username_attribute),
                roles_claim: optional("openid.roles-claim"),
            }),
            "saml" => AuthBackend::Saml(SamlAuthConfig {
                idp_metadata_url: required("saml.idp-metadata-url")?,
                app_entity_id: required("saml.app-entity-id")?,
                base_url: required("saml.base-url")?,
            }),
            "webservice" => AuthBackend::WebService(WebServiceAuthConfig {
                authentication_url: required("webservice.authentication-url")?,
                authentication_request_body: optional("webservice.authentication-request-body"),
            }),
            "custom-header" => AuthBackend::CustomHeader(CustomHeaderAuthConfig {
                username_header: optional("custom-header.username-header")
                    .unwrap_or_else(|| "X-Remote-User".to_string()),
                groups_header: optional("custom-header.groups-header"),
            }),
            unknown => bail!("unknown authentication type: {unknown}"),
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_kind_constructs() {
        let full = settings(&[
            ("ldap.url", "ldap://ldap.example.com:389/dc=example,dc=com"),
            ("openid.auth-url", "https://idp.example.com/auth"),
            ("openid.token-url", "https://idp.example.com/token"),
            ("openid.jwks-url", "https://idp.example.com/jwks"),
            ("openid.client-id", "seatgrid"),
            ("openid.client-secret", "hunter2"),
            ("saml.idp-metadata-url", "https://idp.example.com/metadata"),
            ("saml.app-entity-id", "seatgrid"),
            ("saml.base-url", "https://apps.example.com"),
            ("webservice.authentication-url", "https://auth.example.com/login"),
        ]);

        for kind in [
            "none",
            "simple",
            "ldap",
            "openid",
            "saml",
            "webservice",
            "custom-header",
        ] {
            let backend = AuthBackend::from_settings(kind, &full).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn unknown_kind_fails_fast() {
        let err = AuthBackend::from_settings("kerberos", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("unknown authentication type"));
    }

    #[test]
    fn missing_required_setting_fails() {
        let err = AuthBackend::from_settings("ldap", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("ldap.url"));
    }

    #[test]
    fn openid_username_attribute_defaults_to_sub() {
        let backend = AuthBackend::from_settings(
            "openid",
            &settings(&[
                ("openid.auth-url", "https://idp.example.com/auth"),
                ("openid.token-url", "https://idp.example.com/token"),
                ("openid.jwks-url", "https://idp.example.com/jwks"),
                ("openid.client-id", "seatgrid"),
                ("openid.client-secret", "hunter2"),
            ]),
        )
        .unwrap();

        match backend {
            AuthBackend::OpenId(config) => assert_eq!(config.username_attribute, "sub"),
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn backend_parses_from_tagged_toml() {
        let backend: AuthBackend = toml::from_str(
            r#"
type = "ldap"
url = "ldap://ldap.example.com:389/dc=example,dc=com"
user-dn-pattern = "uid={0},ou=people"
"#,
        )
        .unwrap();

        match backend {
            AuthBackend::Ldap(config) => {
                assert_eq!(config.url, "ldap://ldap.example.com:389/dc=example,dc=com");
                assert_eq!(config.user_dn_pattern.as_deref(), Some("uid={0},ou=people"));
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn login_form_backends() {
        assert!(!AuthBackend::None.has_login_form());
        assert!(AuthBackend::Simple(SimpleAuthConfig::default()).has_login_form());
    }
}
