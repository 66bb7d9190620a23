use serde::Deserialize;
use std::{env, fmt, fs, future::Future, path::Path, path::PathBuf, pin::Pin, sync::Arc};

use crate::access::AccessPolicy;
use crate::auth::{AuthenticatedUser, JwtAttributes, JwtContext, RequestContext};

pub const API_KEY_ENV: &str = "VORTEX_API_KEY";
pub const API_BASE_URL_ENV: &str = "VORTEX_API_BASE_URL";
pub const SETTINGS_PATH_ENV: &str = "VORTEX_CONFIG";
pub const DEFAULT_API_BASE_URL: &str = "https://api.vortexsoftware.com";

/// Future returned by application hooks.
pub type HookFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

/// Maps a request to the user making it, if any.
pub type AuthenticateHook =
    Arc<dyn Fn(Arc<RequestContext>) -> HookFuture<Option<AuthenticatedUser>> + Send + Sync>;

/// Produces extra JWT attributes for a request and its optional client context.
pub type JwtAttributesHook =
    Arc<dyn Fn(Arc<RequestContext>, Option<JwtContext>) -> HookFuture<JwtAttributes> + Send + Sync>;

/// Application-supplied configuration of the adapter.
///
/// Built once at startup and handed to a [`ConfigStore`](crate::store::ConfigStore),
/// which locks it. An empty `api_key` defers to `VORTEX_API_KEY` at read time.
#[derive(Clone, Default)]
pub struct VortexConfig {
    pub api_key: String,
    pub api_base_url: Option<String>,
    pub authenticate_user: Option<AuthenticateHook>,
    pub generate_jwt_attributes: Option<JwtAttributesHook>,
    pub access: AccessPolicy,
}

impl VortexConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn authenticate_user<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<AuthenticatedUser>>> + Send + 'static,
    {
        self.authenticate_user = Some(Arc::new(
            move |request| -> HookFuture<Option<AuthenticatedUser>> { Box::pin(hook(request)) },
        ));
        self
    }

    pub fn generate_jwt_attributes<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<JwtContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<JwtAttributes>> + Send + 'static,
    {
        self.generate_jwt_attributes = Some(Arc::new(
            move |request, context| -> HookFuture<JwtAttributes> { Box::pin(hook(request, context)) },
        ));
        self
    }

    pub fn access_policy(mut self, policy: AccessPolicy) -> Self {
        self.access = policy;
        self
    }
}

impl fmt::Debug for VortexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VortexConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .field("authenticate_user", &self.authenticate_user.is_some())
            .field("generate_jwt_attributes", &self.generate_jwt_attributes.is_some())
            .field("access", &self.access)
            .finish()
    }
}

/// Configuration as seen by a single request.
///
/// `api_key` is never empty; `api_base_url` is `None` when neither the
/// locked configuration nor the environment sets one.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub api_base_url: Option<String>,
    pub authenticate_user: Option<AuthenticateHook>,
    pub generate_jwt_attributes: Option<JwtAttributesHook>,
    pub access: AccessPolicy,
}

impl ResolvedConfig {
    /// Base URL of the Vortex API, falling back to the public endpoint.
    pub fn base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .field("authenticate_user", &self.authenticate_user.is_some())
            .field("generate_jwt_attributes", &self.generate_jwt_attributes.is_some())
            .field("access", &self.access)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() { "<unset>" } else { "<redacted>" }
}

// Settings file for the standalone server. Only the plain fields live here;
// hooks are code and get attached by the binary.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VortexSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl VortexSettings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut settings: VortexSettings = serde_json::from_str(&raw)?;

        if let Some(key) = settings.api_key.as_mut() {
            *key = expand_env_vars(key);
        }
        if let Some(url) = settings.api_base_url.as_mut() {
            *url = expand_env_vars(url);
        }

        Ok(settings)
    }

    /// Turn the settings into a configuration without hooks.
    ///
    /// A missing key stays empty so the store falls back to the environment.
    pub fn into_config(self) -> VortexConfig {
        VortexConfig {
            api_key: self.api_key.unwrap_or_default(),
            api_base_url: self.api_base_url.filter(|url| !url.is_empty()),
            ..VortexConfig::default()
        }
    }
}

/// Locate the settings file: `VORTEX_CONFIG`, then `./vortex.json`.
pub fn resolve_settings_path() -> Option<PathBuf> {
    if let Ok(p) = env::var(SETTINGS_PATH_ENV) {
        return Some(PathBuf::from(p));
    }

    let candidate = PathBuf::from("vortex.json");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
/// Unknown variables are left untouched.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            match env::var(&name) {
                Ok(val) => out.push_str(&val),
                Err(_) => {
                    out.push_str("${");
                    out.push_str(&name);
                    out.push('}');
                }
            }
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_env_vars() {
        // PATH is set in any sane test environment.
        let path = env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("x-${PATH}-y"), format!("x-{}-y", path));
        assert_eq!(
            expand_env_vars("${VORTEX_TEST_SURELY_UNSET_VAR}"),
            "${VORTEX_TEST_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("no vars $here"), "no vars $here");
    }

    #[test]
    fn test_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"apiKey": "${{VORTEX_TEST_SURELY_UNSET_VAR}}", "apiBaseUrl": "https://staging.example.com"}}"#
        )
        .unwrap();

        let settings = VortexSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("${VORTEX_TEST_SURELY_UNSET_VAR}"));
        assert_eq!(settings.api_base_url.as_deref(), Some("https://staging.example.com"));

        let config = settings.into_config();
        assert_eq!(config.api_base_url.as_deref(), Some("https://staging.example.com"));
        assert!(config.authenticate_user.is_none());
    }

    #[test]
    fn test_settings_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let config = VortexSettings::from_file(file.path()).unwrap().into_config();
        assert_eq!(config.api_key, "");
        assert_eq!(config.api_base_url, None);
    }

    #[test]
    fn test_invalid_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(VortexSettings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = VortexConfig::new("super-secret").with_base_url("https://api.test");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("https://api.test"));
    }
}
