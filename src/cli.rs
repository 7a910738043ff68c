use clap::{Parser, Subcommand};

use consoleauth::config::Config;

/// consoleauth — console access token manager
#[derive(Parser)]
#[command(name = "consoleauth", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Port to bind (defaults to CONSOLEAUTH_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Authorize a console token for an instance
    Authorize {
        /// Token id; generated when omitted
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "novnc")]
        console_type: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: String,
        #[arg(long)]
        internal_access_path: Option<String>,
        #[arg(long)]
        instance: String,
    },

    /// Check whether a token is still valid
    Check {
        #[arg(long)]
        token: String,
    },

    /// List token ids indexed for an instance
    List {
        #[arg(long)]
        instance: String,
    },

    /// Revoke every token issued for an instance
    Purge {
        #[arg(long)]
        instance: String,
    },
}

/// One-shot commands exit right away, so anything they write has to live in
/// a cache other processes can see.
pub fn shared_cache_url(cfg: &Config) -> anyhow::Result<&str> {
    cfg.redis_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "REDIS_URL is not set; authorize/check/list/purge need the shared token cache \
             used by the running service"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_commands_need_redis() {
        assert!(shared_cache_url(&Config::default()).is_err());

        let cfg = Config {
            redis_url: Some("redis://127.0.0.1:6379".into()),
            ..Config::default()
        };
        assert_eq!(shared_cache_url(&cfg).unwrap(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["consoleauth"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_authorize_args() {
        let cli = Cli::try_parse_from([
            "consoleauth", "authorize", "--host", "10.0.0.1", "--port", "5900", "--instance", "i-1",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Authorize { token, console_type, port, instance, .. }) => {
                assert!(token.is_none());
                assert_eq!(console_type, "novnc");
                assert_eq!(port, "5900");
                assert_eq!(instance, "i-1");
            }
            _ => panic!("expected authorize"),
        }
    }
}
