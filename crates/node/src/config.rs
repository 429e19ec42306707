//! Gateway configuration (TOML-serializable).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use meshgate_gateway::ProviderEndpoints;

use crate::args::NodeArgs;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Radio adapter link.
    #[serde(default)]
    pub transport: TransportConfig,

    /// REST ingress.
    #[serde(default)]
    pub rest: RestConfig,

    /// Content provider endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Command interpreter behavior.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Event store.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Radio adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Adapter address (host:port).
    #[serde(default = "default_adapter_addr")]
    pub adapter_addr: String,
}

/// REST ingress configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Whether to serve the REST API.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_rest_addr")]
    pub addr: String,

    /// Bind port.
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

/// Content provider endpoints and timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Grouped outage detail endpoint.
    #[serde(default = "default_outages_url")]
    pub outages_url: String,

    /// Latest grid demand sample endpoint.
    #[serde(default = "default_demand_url")]
    pub demand_url: String,

    /// Subway line status endpoint.
    #[serde(default = "default_transit_url")]
    pub transit_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

/// Command interpreter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Delay between successive replies of one sequence, in seconds.
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,
}

/// Event store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl GatewayConfig {
    /// Load configuration from a TOML file, or defaults when no file is
    /// given.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("failed to read config: {}", path.display()))?;
                toml::from_str(&raw)
                    .wrap_err_with(|| format!("failed to parse config: {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply CLI overrides on top of the loaded file.
    pub fn apply_args(&mut self, args: &NodeArgs) {
        if let Some(addr) = &args.adapter_addr {
            self.transport.adapter_addr = addr.clone();
        }
        if let Some(addr) = &args.rest_addr {
            self.rest.addr = addr.clone();
        }
        if let Some(port) = args.rest_port {
            self.rest.port = port;
        }
        if args.rest_disable {
            self.rest.enabled = false;
        }
        if let Some(path) = &args.db_path {
            self.storage.path = path.clone();
        }
    }

    /// REST socket address.
    pub fn rest_socket_addr(&self) -> eyre::Result<SocketAddr> {
        let ip = self
            .rest
            .addr
            .parse()
            .wrap_err_with(|| format!("invalid rest.addr: {}", self.rest.addr))?;
        Ok(SocketAddr::new(ip, self.rest.port))
    }

    /// Provider endpoints in the shape the gateway wants.
    pub fn provider_endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints {
            outages_url: self.providers.outages_url.clone(),
            demand_url: self.providers.demand_url.clone(),
            transit_url: self.providers.transit_url.clone(),
            timeout: Duration::from_secs(self.providers.timeout_secs),
        }
    }

    /// Reply pacing for multi-message command sequences.
    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.commands.pacing_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            adapter_addr: default_adapter_addr(),
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_rest_addr(),
            port: default_rest_port(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            outages_url: default_outages_url(),
            demand_url: default_demand_url(),
            transit_url: default_transit_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            pacing_secs: default_pacing_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_adapter_addr() -> String {
    "127.0.0.1:4403".to_string()
}

fn default_true() -> bool {
    true
}

fn default_rest_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_rest_port() -> u16 {
    1215
}

fn default_outages_url() -> String {
    "http://127.0.0.1:8000/cortes_detalle_agrupados".to_string()
}

fn default_demand_url() -> String {
    "http://127.0.0.1:5005/api/last_sadi".to_string()
}

fn default_transit_url() -> String {
    "http://127.0.0.1:8000/estado_subte".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    3
}

fn default_pacing_secs() -> u64 {
    5
}

fn default_db_path() -> PathBuf {
    PathBuf::from("meshgate.redb")
}
