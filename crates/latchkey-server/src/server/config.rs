use anyhow::{Context, bail};
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use latchkey::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TTL, IssuancePolicy};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
const DEFAULT_LISTEN_PORT: u16 = 8080;
const DEFAULT_REDIS_ADDR: &str = "127.0.0.1:6379";
const DEFAULT_CONNECT_RETRIES: usize = 3;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

/// Which [`CredentialStore`](latchkey::CredentialStore) backs the service.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Shared Redis server. Required when running more than one instance.
    #[default]
    Redis,
    /// In-process store. Credentials are lost on restart and not shared.
    Memory,
}

/// Runtime configuration for the `latchkey-server` binary.
///
/// Every setting can come from a CLI flag, an environment variable, or the
/// JSON config file, in that order of precedence. Anything left unset falls
/// back to a built-in default.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "latchkey-server",
    version,
    about = "An HTTP service issuing short-lived credentials paired with backend endpoints"
)]
pub struct CliArgs {
    /// Path to a JSON config file.
    ///
    /// Environment variable: `LATCHKEY_CONFIG`
    #[arg(long, env = "LATCHKEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:8080"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR")]
    pub server_addr: Option<String>,

    /// Credential store backend.
    ///
    /// Environment variable: `STORE_BACKEND`
    #[arg(long, env = "STORE_BACKEND", value_enum)]
    pub store_backend: Option<StoreBackend>,

    /// Redis server, as `host:port` or a `redis://` URL.
    ///
    /// Environment variable: `REDIS_ADDR`
    #[arg(long, env = "REDIS_ADDR")]
    pub redis_addr: Option<String>,

    /// Extra attempts at establishing the Redis connection during startup.
    ///
    /// Environment variable: `REDIS_CONNECT_RETRIES`
    #[arg(long, env = "REDIS_CONNECT_RETRIES")]
    pub redis_connect_retries: Option<usize>,

    /// Deadline for each store operation, in milliseconds. `0` disables it.
    ///
    /// Environment variable: `STORE_TIMEOUT_MS`
    #[arg(long, env = "STORE_TIMEOUT_MS")]
    pub store_timeout_ms: Option<u64>,

    /// Backend endpoint handed out with credentials. Repeat the flag or pass a
    /// comma separated list.
    ///
    /// Environment variable: `ENDPOINTS`
    #[arg(long = "endpoint", env = "ENDPOINTS", value_delimiter = ',')]
    pub endpoints: Vec<String>,

    /// Lifetime of issued credentials, in seconds.
    ///
    /// Environment variable: `CREDENTIAL_TTL_SECS`
    #[arg(long, env = "CREDENTIAL_TTL_SECS")]
    pub credential_ttl_secs: Option<u64>,

    /// Username candidates tried per issuance before giving up.
    ///
    /// Environment variable: `MAX_ATTEMPTS`
    #[arg(long, env = "MAX_ATTEMPTS")]
    pub max_attempts: Option<usize>,

    /// Serve HTTPS using `--cert-path` and `--key-path`.
    ///
    /// Environment variable: `USE_TLS`
    #[arg(long, env = "USE_TLS")]
    pub use_tls: Option<bool>,

    /// PEM certificate chain for TLS.
    ///
    /// Environment variable: `TLS_CERT_PATH`
    #[arg(long, env = "TLS_CERT_PATH")]
    pub cert_path: Option<PathBuf>,

    /// PEM private key for TLS.
    ///
    /// Environment variable: `TLS_KEY_PATH`
    #[arg(long, env = "TLS_KEY_PATH")]
    pub key_path: Option<PathBuf>,
}

/// Shape of the optional JSON config file.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub listen_address: Option<String>,
    pub listen_port: Option<u16>,
    pub store: StoreSection,
    pub endpoints: Option<Vec<String>>,
    pub credential_ttl_secs: Option<u64>,
    pub max_attempts: Option<usize>,
    pub use_tls: Option<bool>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub backend: Option<StoreBackend>,
    pub address: Option<String>,
    pub connect_retries: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn server_addr(&self) -> Option<String> {
        if self.listen_address.is_none() && self.listen_port.is_none() {
            return None;
        }
        let host = self
            .listen_address
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDRESS);
        let port = self.listen_port.unwrap_or(DEFAULT_LISTEN_PORT);
        Some(format!("{host}:{port}"))
    }
}

/// Certificate and key files for serving HTTPS directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TlsConfig {
    /// Reads and parses the PEM files.
    pub async fn load(&self) -> anyhow::Result<RustlsConfig> {
        RustlsConfig::from_pem_file(&self.cert_path, &self.key_path)
            .await
            .with_context(|| {
                format!(
                    "failed to load TLS certificate {} and key {}",
                    self.cert_path.display(),
                    self.key_path.display()
                )
            })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub redis_addr: String,
    pub redis_connect_retries: usize,
    pub endpoints: Vec<String>,
    pub policy: IssuancePolicy,
    /// `None` serves plain HTTP.
    pub tls: Option<TlsConfig>,
}

impl ServerConfig {
    /// Merges CLI/env values over `file` over the built-in defaults.
    pub fn resolve(args: CliArgs, file: FileConfig) -> anyhow::Result<Self> {
        let server_addr = args
            .server_addr
            .or_else(|| file.server_addr())
            .unwrap_or_else(|| format!("{DEFAULT_LISTEN_ADDRESS}:{DEFAULT_LISTEN_PORT}"));

        let endpoints: Vec<String> = if args.endpoints.is_empty() {
            file.endpoints.unwrap_or_default()
        } else {
            args.endpoints
        }
        .into_iter()
        .map(|e| e.trim().to_owned())
        .filter(|e| !e.is_empty())
        .collect();

        let store_timeout_ms = args
            .store_timeout_ms
            .or(file.store.timeout_ms)
            .unwrap_or(DEFAULT_STORE_TIMEOUT_MS);
        let store_timeout = (store_timeout_ms > 0).then(|| Duration::from_millis(store_timeout_ms));

        let ttl = args
            .credential_ttl_secs
            .or(file.credential_ttl_secs)
            .map_or(DEFAULT_TTL, Duration::from_secs);

        let max_attempts = args
            .max_attempts
            .or(file.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let policy = IssuancePolicy::default()
            .with_ttl(ttl)
            .with_max_attempts(max_attempts)
            .with_store_timeout(store_timeout);

        if let Err(e) = policy.validate() {
            bail!("invalid issuance settings: {e}");
        }

        let tls = if args.use_tls.or(file.use_tls).unwrap_or(false) {
            let (Some(cert_path), Some(key_path)) = (
                args.cert_path.or(file.cert_path),
                args.key_path.or(file.key_path),
            ) else {
                bail!("TLS is enabled but the certificate or key path is missing");
            };
            Some(TlsConfig {
                cert_path,
                key_path,
            })
        } else {
            None
        };

        Ok(Self {
            server_addr,
            store_backend: args
                .store_backend
                .or(file.store.backend)
                .unwrap_or_default(),
            redis_addr: args
                .redis_addr
                .or(file.store.address)
                .unwrap_or_else(|| DEFAULT_REDIS_ADDR.to_owned()),
            redis_connect_retries: args
                .redis_connect_retries
                .or(file.store.connect_retries)
                .unwrap_or(DEFAULT_CONNECT_RETRIES),
            endpoints,
            policy,
            tls,
        })
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_input() {
        let config = ServerConfig::resolve(CliArgs::default(), FileConfig::default()).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.redis_addr, "127.0.0.1:6379");
        assert_eq!(config.redis_connect_retries, 3);
        assert!(config.endpoints.is_empty());
        assert_eq!(config.policy.ttl, Duration::from_secs(900));
        assert_eq!(config.policy.max_attempts, 5);
        assert_eq!(config.policy.store_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.tls, None);
    }

    #[test]
    fn file_config_parses_and_fills_gaps() {
        let file: FileConfig = serde_json::from_str(
            r#"{
                "listen_port": 80,
                "store": { "backend": "memory", "address": "10.1.1.1:6379", "timeout_ms": 0 },
                "endpoints": ["10.0.0.1:9000", " 10.0.0.2:9000 ", ""],
                "credential_ttl_secs": 60
            }"#,
        )
        .unwrap();

        let config = ServerConfig::resolve(CliArgs::default(), file).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:80");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.redis_addr, "10.1.1.1:6379");
        assert_eq!(config.endpoints, ["10.0.0.1:9000", "10.0.0.2:9000"]);
        assert_eq!(config.policy.ttl, Duration::from_secs(60));
        assert_eq!(config.policy.store_timeout, None);
    }

    #[test]
    fn cli_overrides_file() {
        let file = FileConfig {
            listen_address: Some("127.0.0.1".into()),
            endpoints: Some(vec!["file:1".into()]),
            max_attempts: Some(9),
            ..FileConfig::default()
        };
        let args = CliArgs::parse_from([
            "latchkey-server",
            "--server-addr",
            "[::]:9999",
            "--endpoint",
            "cli:1,cli:2",
            "--store-backend",
            "memory",
        ]);

        let config = ServerConfig::resolve(args, file).unwrap();
        assert_eq!(config.server_addr, "[::]:9999");
        assert_eq!(config.endpoints, ["cli:1", "cli:2"]);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.policy.max_attempts, 9);
    }

    #[test]
    fn unknown_file_fields_are_rejected() {
        let res: Result<FileConfig, _> = serde_json::from_str(r#"{ "redis_host": "x" }"#);
        assert!(res.is_err());

        // Nested sections of the older layout are not accepted either.
        let res: Result<FileConfig, _> = serde_json::from_str(
            r#"{ "redis_server": { "redis_host": "127.0.0.1", "redis_port": "6379" } }"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn unusable_policy_is_rejected() {
        let args = CliArgs {
            max_attempts: Some(0),
            ..CliArgs::default()
        };
        assert!(ServerConfig::resolve(args, FileConfig::default()).is_err());

        let args = CliArgs {
            credential_ttl_secs: Some(0),
            ..CliArgs::default()
        };
        assert!(ServerConfig::resolve(args, FileConfig::default()).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = CliArgs {
            config: Some(PathBuf::from("/nonexistent/latchkey.json")),
            ..CliArgs::default()
        };
        assert!(ServerConfig::try_from(args).is_err());
    }

    #[test]
    fn tls_settings_come_from_file_or_cli() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "use_tls": true, "cert_path": "/etc/latchkey/cert.pem", "key_path": "/etc/latchkey/key.pem" }"#,
        )
        .unwrap();
        let args = CliArgs {
            key_path: Some(PathBuf::from("/run/secrets/key.pem")),
            ..CliArgs::default()
        };

        let config = ServerConfig::resolve(args, file).unwrap();
        assert_eq!(
            config.tls,
            Some(TlsConfig {
                cert_path: PathBuf::from("/etc/latchkey/cert.pem"),
                key_path: PathBuf::from("/run/secrets/key.pem"),
            })
        );
    }

    #[test]
    fn tls_paths_are_ignored_unless_enabled() {
        let file = FileConfig {
            use_tls: Some(true),
            cert_path: Some(PathBuf::from("cert.pem")),
            key_path: Some(PathBuf::from("key.pem")),
            ..FileConfig::default()
        };
        let args = CliArgs::parse_from(["latchkey-server", "--use-tls", "false"]);
        assert_eq!(ServerConfig::resolve(args, file).unwrap().tls, None);
    }

    #[test]
    fn tls_without_key_is_rejected() {
        let args = CliArgs {
            use_tls: Some(true),
            cert_path: Some(PathBuf::from("cert.pem")),
            ..CliArgs::default()
        };
        assert!(ServerConfig::resolve(args, FileConfig::default()).is_err());
    }

    #[tokio::test]
    async fn unreadable_tls_files_fail_to_load() {
        let tls = TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        };
        assert!(tls.load().await.is_err());
    }
}
