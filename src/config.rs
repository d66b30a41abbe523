use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chronicle", about = "A server-rendered blog")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Session signing key. Only ever read from `SECRET_KEY`.
    #[serde(skip)]
    pub secret_key: SecretKey,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl AuthConfig {
    /// Cookie lifetime in seconds. Saturates rather than overflowing on huge `session_hours`.
    pub fn session_max_age_secs(&self) -> u64 {
        self.session_hours.saturating_mul(3600)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "chronicle_session".to_string(),
            session_hours: 720,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Secret bytes that never show up in `Debug` output.
#[derive(Clone, Default)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Layer defaults, the TOML file, the environment and CLI flags, in that order.
    pub fn load_with_env<F>(cli: &Cli, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        if let Some(url) = env("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            config.database.url = Some(url);
        }

        let secret = env("SECRET_KEY").unwrap_or_default();
        if secret.trim().is_empty() {
            anyhow::bail!("SECRET_KEY must be set to a non-empty value");
        }
        config.secret_key = SecretKey::new(secret);

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.url.is_none() {
            config.database.url = Some(data_dir.join("chronicle.db").display().to_string());
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".chronicle")
        })
    }

    /// Filesystem path of the SQLite database, with any `sqlite:` scheme removed.
    pub fn db_path(&self) -> PathBuf {
        let url = self.database.url.as_deref().unwrap_or("chronicle.db");
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_dir(dir: &std::path::Path) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir: Some(dir.to_path_buf()),
        }
    }

    fn env_with_secret(key: &str) -> Option<String> {
        match key {
            "SECRET_KEY" => Some("test-secret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.cookie_name, "chronicle_session");
        assert_eq!(config.auth.session_hours, 720);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn data_dir_defaults_to_home_dot_chronicle() {
        let cli = Cli {
            config: None,
            host: None,
            port: None,
            data_dir: None,
        };
        assert!(Config::data_dir(&cli).ends_with(".chronicle"));
    }

    #[test]
    fn load_without_secret_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Config::load_with_env(&cli_with_dir(tmp.path()), |_| None);
        assert!(result.is_err());
    }

    #[test]
    fn load_with_blank_secret_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Config::load_with_env(&cli_with_dir(tmp.path()), |key| {
            (key == "SECRET_KEY").then(|| "   ".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(&cli_with_dir(tmp.path()), env_with_secret).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.db_path(), tmp.path().join("chronicle.db"));
        assert_eq!(config.secret_key.as_bytes(), b"test-secret");
    }

    #[test]
    fn database_url_comes_from_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(&cli_with_dir(tmp.path()), |key| match key {
            "SECRET_KEY" => Some("s".to_string()),
            "DATABASE_URL" => Some("sqlite:///var/lib/blog.db".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/blog.db"));
    }

    #[test]
    fn db_path_strips_short_scheme() {
        let mut config = Config::default();
        config.database.url = Some("sqlite:blog.db".to_string());
        assert_eq!(config.db_path(), PathBuf::from("blog.db"));
    }

    #[test]
    fn load_reads_toml_file_and_cli_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[auth]
cookie_name = "my_cookie"
session_hours = 24
bcrypt_cost = 4
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: None,
            port: Some(4000),
            data_dir: Some(tmp.path().to_path_buf()),
        };
        let config = Config::load_with_env(&cli, env_with_secret).unwrap();
        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.cookie_name, "my_cookie");
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.auth.bcrypt_cost, 4);
    }

    #[test]
    fn session_max_age_saturates() {
        let mut auth = AuthConfig::default();
        assert_eq!(auth.session_max_age_secs(), 720 * 3600);

        auth.session_hours = u64::MAX;
        assert_eq!(auth.session_max_age_secs(), u64::MAX);
    }

    #[test]
    fn secret_key_debug_is_redacted() {
        let key = SecretKey::new("hunter2");
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("hunter2"));
    }
}
