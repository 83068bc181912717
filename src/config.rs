//! Configuration Module
//!
//! Handles loading and managing connection configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Hook run once while the facade is being built, after the initial
/// connection is open and before the verifying ping.
///
/// Reconnects made later by the client do not run it again. Returning an
/// error aborts construction of the facade.
pub type ConnectHook = Arc<dyn Fn(&ClientOptions) -> Result<()> + Send + Sync>;

// == Network ==
/// Transport used to reach the Redis server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
    /// `host:port` over TCP (default)
    #[default]
    Tcp,
    /// Filesystem path of a Unix domain socket
    Unix,
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Network::Tcp),
            "unix" => Ok(Network::Unix),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Tcp => write!(f, "tcp"),
            Network::Unix => write!(f, "unix"),
        }
    }
}

// == Client Options ==
/// Connection configuration consumed by [`crate::cache::connect`].
///
/// All values except the hook can be configured via environment variables.
#[derive(Clone)]
pub struct ClientOptions {
    /// Transport kind
    pub network: Network,
    /// `host:port` for TCP, socket path for Unix
    pub addr: String,
    /// Client display name, also used as the `cache_db` log field
    pub client_name: String,
    /// Logical database index
    pub db: i64,
    /// ACL username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Upper bound for every primitive call, None = unbounded
    pub command_timeout: Option<Duration>,
    /// Optional hook run once at construction
    pub on_connect: Option<ConnectHook>,
}

impl ClientOptions {
    /// Creates a new ClientOptions by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_NETWORK` - `tcp` or `unix` (default: tcp)
    /// - `REDIS_ADDR` - Server address (default: localhost:6379)
    /// - `REDIS_CLIENT_NAME` - Client display name (default: cache-facade)
    /// - `REDIS_DB` - Database index (default: 0)
    /// - `REDIS_USERNAME` / `REDIS_PASSWORD` - Credentials (default: none)
    /// - `COMMAND_TIMEOUT_MS` - Per-command timeout in milliseconds (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            network: env::var("REDIS_NETWORK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.network),
            addr: env::var("REDIS_ADDR")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.addr),
            client_name: env::var("REDIS_CLIENT_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.client_name),
            db: env::var("REDIS_DB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db),
            username: env::var("REDIS_USERNAME").ok().filter(|v| !v.is_empty()),
            password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
            command_timeout: env::var("COMMAND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            on_connect: None,
        }
    }

    /// Sets the hook run once at construction.
    pub fn with_on_connect<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClientOptions) -> Result<()> + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(hook));
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            network: Network::Tcp,
            addr: "localhost:6379".to_string(),
            client_name: "cache-facade".to_string(),
            db: 0,
            username: None,
            password: None,
            command_timeout: None,
            on_connect: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("network", &self.network)
            .field("addr", &self.addr)
            .field("client_name", &self.client_name)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("command_timeout", &self.command_timeout)
            .field("on_connect", &self.on_connect.is_some())
            .finish()
    }
}
