use crate::buffer::DEFAULT_CHUNK_SIZE;
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::protocol::ArgFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Client configuration: where to connect and how the client behaves.
///
/// Can be loaded from files, env vars, or CLI args with precedence order:
/// CLI > File > Environment > Defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub client: ClientOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Unix-domain socket path. Overrides host and port when set.
    #[serde(default)]
    pub unix_socket: Option<PathBuf>,
    /// Database selected on connect. 0 skips the SELECT.
    #[serde(default)]
    pub db: u32,
    /// Sent with AUTH on connect when set.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            unix_socket: None,
            db: 0,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Pending replies above which `Client::call` drops the connection
    /// before sending. Undelivered replies are lost when that happens.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Send empty arguments instead of dropping them.
    #[serde(default)]
    pub strict_args: bool,
    /// Size of each blocking read from the transport.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            strict_args: false,
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

impl ClientOptions {
    pub fn arg_filter(&self) -> ArgFilter {
        if self.strict_args {
            ArgFilter::Strict
        } else {
            ArgFilter::Lenient
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_max_pending() -> usize {
    1024
}

fn default_read_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Where the transport connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "host=\"{}\", port={}", host, port),
            Endpoint::Unix { path } => write!(f, "socket=\"{}\"", path.display()),
        }
    }
}

impl ConnectionConfig {
    pub fn endpoint(&self) -> Endpoint {
        match &self.unix_socket {
            Some(path) => Endpoint::Unix { path: path.clone() },
            None => Endpoint::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

impl Config {
    /// Connect over TCP with default options.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        let mut config = Self::default();
        config.connection.host = host.into();
        config.connection.port = port;
        config
    }

    /// Connect over a unix-domain socket with default options.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.connection.unix_socket = Some(path.into());
        config
    }

    pub fn with_db(mut self, db: u32) -> Self {
        self.connection.db = db;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.connection.password = Some(password.into());
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.client.max_pending = max_pending;
        self
    }

    pub fn with_strict_args(mut self, strict: bool) -> Self {
        self.client.strict_args = strict;
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("REDIS_HOST") {
            config.connection.host = host;
        }

        if let Ok(port) = std::env::var("REDIS_PORT") {
            config.connection.port = parse_var("REDIS_PORT", &port)?;
        }

        if let Ok(path) = std::env::var("REDIS_SOCKET") {
            if !path.is_empty() {
                config.connection.unix_socket = Some(PathBuf::from(path));
            }
        }

        if let Ok(db) = std::env::var("REDIS_DB") {
            config.connection.db = parse_var("REDIS_DB", &db)?;
        }

        if let Ok(password) = std::env::var("REDIS_PASSWORD") {
            if !password.is_empty() {
                config.connection.password = Some(password);
            }
        }

        Ok(config)
    }

    /// Create config with CLI args taking precedence over file and environment.
    ///
    /// Precedence: CLI > File > Environment > Defaults
    pub fn from_sources(cli: &Cli) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        let file_config = cli
            .config
            .as_ref()
            .map(Self::load_from_file)
            .transpose()?;
        let base = file_config.unwrap_or(env_config);

        let connection = ConnectionConfig {
            host: cli.host.clone().unwrap_or(base.connection.host),
            port: cli.port.unwrap_or(base.connection.port),
            unix_socket: cli.socket.clone().or(base.connection.unix_socket),
            db: cli.db.unwrap_or(base.connection.db),
            password: cli.password.clone().or(base.connection.password),
        };

        let client = ClientOptions {
            max_pending: cli.max_pending.unwrap_or(base.client.max_pending),
            strict_args: cli.strict || base.client.strict_args,
            read_chunk_size: base.client.read_chunk_size,
        };

        let config = Config { connection, client };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.read_chunk_size == 0 {
            return Err(ConfigError::Validation(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.connection.unix_socket.is_none() {
            if self.connection.host.is_empty() {
                return Err(ConfigError::Validation("host must not be empty".to_string()));
            }
            if self.connection.port == 0 {
                return Err(ConfigError::Validation("port must not be zero".to_string()));
            }
        }

        Ok(())
    }

    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: value.to_string(),
    })
}
