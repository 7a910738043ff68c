use std::time::Duration;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 600;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// How long an authorized console token stays retrievable.
    /// Set via CONSOLE_TOKEN_TTL. Default: 600.
    pub token_ttl_secs: u64,
    /// Route port validation through the cell router instead of calling
    /// the compute service directly. Fixed for the lifetime of a manager.
    pub cells_enabled: bool,
    /// Unset means tokens live in the in-process memory cache.
    pub redis_url: Option<String>,
    pub compute_rpc_url: String,
    pub cells_rpc_url: String,
    /// Upper bound on a single validate_console_port round trip.
    pub rpc_timeout_secs: u64,
    /// Period of the memory cache expiry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6083,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            cells_enabled: false,
            redis_url: None,
            compute_rpc_url: "http://127.0.0.1:8774/rpc".into(),
            cells_rpc_url: "http://127.0.0.1:8775/rpc".into(),
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            sweep_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();

    let token_ttl_secs = env_or("CONSOLE_TOKEN_TTL", defaults.token_ttl_secs);
    if token_ttl_secs == 0 {
        anyhow::bail!("CONSOLE_TOKEN_TTL must be at least 1 second");
    }

    let compute_rpc_url =
        std::env::var("COMPUTE_RPC_URL").unwrap_or(defaults.compute_rpc_url);
    let cells_rpc_url = std::env::var("CELLS_RPC_URL").unwrap_or(defaults.cells_rpc_url);
    for (name, value) in [("COMPUTE_RPC_URL", &compute_rpc_url), ("CELLS_RPC_URL", &cells_rpc_url)] {
        url::Url::parse(value)
            .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", name, value, e))?;
    }

    Ok(Config {
        port: env_or("CONSOLEAUTH_PORT", defaults.port),
        token_ttl_secs,
        cells_enabled: std::env::var("CELLS_ENABLE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false),
        redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
        compute_rpc_url,
        cells_rpc_url,
        rpc_timeout_secs: env_or("RPC_RESPONSE_TIMEOUT", defaults.rpc_timeout_secs),
        sweep_interval_secs: env_or("CACHE_SWEEP_INTERVAL", defaults.sweep_interval_secs),
    })
}
