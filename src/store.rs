//! One-time configuration store.
//!
//! A store moves through `Unconfigured → LazyPending → Resolving → Locked`
//! (or straight to `Locked`) and never leaves `Locked`. Once locked, the
//! configuration is shared read-only and every request gets its own
//! [`ResolvedConfig`] snapshot with environment fallbacks applied.
//!
//! Lazy and async configurations resolve at most once: the first reader
//! drives the pending future and every concurrent reader awaits the same
//! outcome. A failed resolution is remembered and reported to every later
//! reader.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::{env, fmt};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{API_BASE_URL_ENV, API_KEY_ENV, ResolvedConfig, VortexConfig};

/// Future producing a configuration.
pub type ConfigFuture = Pin<Box<dyn Future<Output = anyhow::Result<VortexConfig>> + Send>>;

type ConfigFactory = Box<dyn FnOnce() -> ConfigFuture + Send>;
type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Errors raised by the configuration store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration is already locked in.
    AlreadyLocked,
    /// An async or lazy configuration is being resolved.
    ResolutionInProgress,
    /// Neither the configuration nor `VORTEX_API_KEY` provides a key.
    MissingApiKey,
    /// No API key is resolvable at read time.
    NotConfigured,
    /// The async configuration future or lazy factory failed.
    Factory(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLocked => write!(
                f,
                "Vortex configuration is already locked. Configuration can only be set once for security reasons."
            ),
            Self::ResolutionInProgress => {
                write!(f, "Vortex configuration is already being resolved")
            }
            Self::MissingApiKey => write!(
                f,
                "API key is required in config or {} environment variable",
                API_KEY_ENV
            ),
            Self::NotConfigured => write!(
                f,
                "Vortex not configured. Call configure_vortex() or set {} environment variable",
                API_KEY_ENV
            ),
            Self::Factory(msg) => write!(f, "Vortex configuration factory failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Source accepted by [`ConfigStore::configure_async`].
pub enum AsyncConfig {
    Ready(VortexConfig),
    Pending(ConfigFuture),
}

impl AsyncConfig {
    pub fn pending<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<VortexConfig>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }
}

impl From<VortexConfig> for AsyncConfig {
    fn from(config: VortexConfig) -> Self {
        Self::Ready(config)
    }
}

// Work still owed by a resolution. A lazy factory runs only once a reader
// holds `Resolution::pending`, never under the store's state lock.
enum PendingConfig {
    Factory(ConfigFactory),
    Future(ConfigFuture),
    Consumed,
}

// In-flight resolution shared by every reader that arrives while it runs.
struct Resolution {
    pending: tokio::sync::Mutex<PendingConfig>,
    outcome: OnceCell<Result<(), ConfigError>>,
}

impl Resolution {
    fn new(pending: PendingConfig) -> Self {
        Self {
            pending: tokio::sync::Mutex::new(pending),
            outcome: OnceCell::new(),
        }
    }
}

enum StoreState {
    Unconfigured,
    LazyPending(ConfigFactory),
    Resolving(Arc<Resolution>),
    Locked(Arc<VortexConfig>),
}

impl StoreState {
    fn name(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::LazyPending(_) => "lazy-pending",
            Self::Resolving(_) => "resolving",
            Self::Locked(_) => "locked",
        }
    }
}

/// Holds the adapter configuration for the lifetime of the process.
pub struct ConfigStore {
    state: Mutex<StoreState>,
    env: EnvLookup,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("state", &self.lock_state().name())
            .finish()
    }
}

impl ConfigStore {
    /// A store reading fallbacks from the process environment.
    pub fn new() -> Self {
        Self::with_env(|name| env::var(name).ok())
    }

    /// A store with an injected environment lookup.
    pub fn with_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            state: Mutex::new(StoreState::Unconfigured),
            env: Arc::new(lookup),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        // State transitions never panic halfway, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|value| !value.is_empty())
    }

    /// Whether a configuration has been locked in.
    pub fn is_locked(&self) -> bool {
        matches!(*self.lock_state(), StoreState::Locked(_))
    }

    /// Set and lock the configuration.
    pub fn configure(&self, config: VortexConfig) -> Result<(), ConfigError> {
        self.lock_config(config)
    }

    fn lock_config(&self, config: VortexConfig) -> Result<(), ConfigError> {
        let mut state = self.lock_state();

        if matches!(*state, StoreState::Locked(_)) {
            return Err(ConfigError::AlreadyLocked);
        }
        if config.api_key.is_empty() && self.env_var(API_KEY_ENV).is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        info!(
            "Vortex configuration locked ({} access hooks)",
            config.access.hook_count()
        );
        *state = StoreState::Locked(Arc::new(config));
        Ok(())
    }

    /// Configure from a ready configuration or a future producing one.
    ///
    /// A pending future is not polled here; the first [`get_config`] call
    /// drives it and locks its result.
    ///
    /// [`get_config`]: ConfigStore::get_config
    pub fn configure_async(&self, source: impl Into<AsyncConfig>) -> Result<(), ConfigError> {
        match source.into() {
            AsyncConfig::Ready(config) => self.configure(config),
            AsyncConfig::Pending(future) => {
                let mut state = self.lock_state();
                match *state {
                    StoreState::Locked(_) => Err(ConfigError::AlreadyLocked),
                    StoreState::Resolving(_) => Err(ConfigError::ResolutionInProgress),
                    _ => {
                        *state = StoreState::Resolving(Arc::new(Resolution::new(
                            PendingConfig::Future(future),
                        )));
                        Ok(())
                    }
                }
            }
        }
    }

    /// Register a factory invoked on the first [`get_config`] call.
    ///
    /// A later call replaces a factory that has not run yet.
    ///
    /// [`get_config`]: ConfigStore::get_config
    pub fn configure_lazy<F, Fut>(&self, factory: F) -> Result<(), ConfigError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<VortexConfig>> + Send + 'static,
    {
        let mut state = self.lock_state();
        match *state {
            StoreState::Locked(_) => Err(ConfigError::AlreadyLocked),
            StoreState::Resolving(_) => Err(ConfigError::ResolutionInProgress),
            _ => {
                let factory: ConfigFactory = Box::new(move || -> ConfigFuture { Box::pin(factory()) });
                *state = StoreState::LazyPending(factory);
                Ok(())
            }
        }
    }

    /// Resolve the configuration for one request.
    pub async fn get_config(&self) -> Result<ResolvedConfig, ConfigError> {
        if let Some(resolution) = self.start_resolution() {
            match self.await_resolution(&resolution).await {
                // An eager `configure` won the race; its configuration is locked.
                Ok(()) | Err(ConfigError::AlreadyLocked) => {}
                Err(e) => return Err(e),
            }
        }

        let template = match &*self.lock_state() {
            StoreState::Locked(config) => Some(config.clone()),
            _ => None,
        };
        self.snapshot(template.as_deref())
    }

    // Moves `LazyPending` to `Resolving` and hands out the in-flight resolution.
    fn start_resolution(&self) -> Option<Arc<Resolution>> {
        let mut state = self.lock_state();

        if matches!(*state, StoreState::LazyPending(_)) {
            if let StoreState::LazyPending(factory) =
                mem::replace(&mut *state, StoreState::Unconfigured)
            {
                *state = StoreState::Resolving(Arc::new(Resolution::new(
                    PendingConfig::Factory(factory),
                )));
            }
        }

        match &*state {
            StoreState::Resolving(resolution) => Some(resolution.clone()),
            _ => None,
        }
    }

    async fn await_resolution(&self, resolution: &Resolution) -> Result<(), ConfigError> {
        resolution
            .outcome
            .get_or_init(|| async {
                let mut pending = resolution.pending.lock().await;
                if matches!(*pending, PendingConfig::Factory(_)) {
                    if let PendingConfig::Factory(factory) =
                        mem::replace(&mut *pending, PendingConfig::Consumed)
                    {
                        debug!("Lazy initializing Vortex configuration");
                        *pending = PendingConfig::Future(factory());
                    }
                }
                let PendingConfig::Future(future) = &mut *pending else {
                    return Err(ConfigError::Factory(
                        "configuration future already consumed".to_string(),
                    ));
                };

                // Polled by reference so a cancelled waiter leaves the future
                // in place for the next one.
                let result = future.await;
                *pending = PendingConfig::Consumed;

                match result {
                    Ok(config) => self.lock_config(config),
                    Err(e) => Err(ConfigError::Factory(format!("{:#}", e))),
                }
            })
            .await
            .clone()
    }

    fn snapshot(&self, template: Option<&VortexConfig>) -> Result<ResolvedConfig, ConfigError> {
        let api_key = template
            .map(|config| config.api_key.clone())
            .filter(|key| !key.is_empty())
            .or_else(|| self.env_var(API_KEY_ENV))
            .ok_or(ConfigError::NotConfigured)?;

        let api_base_url = template
            .and_then(|config| config.api_base_url.clone())
            .filter(|url| !url.is_empty())
            .or_else(|| self.env_var(API_BASE_URL_ENV));

        Ok(match template {
            Some(config) => ResolvedConfig {
                api_key,
                api_base_url,
                authenticate_user: config.authenticate_user.clone(),
                generate_jwt_attributes: config.generate_jwt_attributes.clone(),
                access: config.access.clone(),
            },
            None => ResolvedConfig {
                api_key,
                api_base_url,
                authenticate_user: None,
                generate_jwt_attributes: None,
                access: Default::default(),
            },
        })
    }
}

static GLOBAL: LazyLock<Arc<ConfigStore>> = LazyLock::new(|| Arc::new(ConfigStore::new()));

/// The process-wide store used by [`VortexState::global`](crate::api::VortexState::global).
pub fn global_store() -> Arc<ConfigStore> {
    GLOBAL.clone()
}

pub fn configure_vortex(config: VortexConfig) -> Result<(), ConfigError> {
    GLOBAL.configure(config)
}

pub fn configure_vortex_async(source: impl Into<AsyncConfig>) -> Result<(), ConfigError> {
    GLOBAL.configure_async(source)
}

pub fn configure_vortex_lazy<F, Fut>(factory: F) -> Result<(), ConfigError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<VortexConfig>> + Send + 'static,
{
    GLOBAL.configure_lazy(factory)
}

pub async fn get_vortex_config() -> Result<ResolvedConfig, ConfigError> {
    GLOBAL.get_config().await
}
