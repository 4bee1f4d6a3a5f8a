use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "nurture", about = "Community backend for a pregnancy and parenting app")]
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

    /// Full path of the SQLite database (overrides --database-name)
    #[arg(long, env = "NURTURE_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Database file name inside the data directory
    #[arg(long, env = "DB_NAME")]
    pub database_name: Option<String>,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Bearer token algorithm (HS256, HS384 or HS512)
    #[arg(long, env = "JWT_ALGORITHM")]
    pub jwt_algorithm: Option<String>,

    /// Bearer token lifetime in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES")]
    pub token_minutes: Option<i64>,

    /// API key for the moderation classifier
    #[arg(long, env = "MODERATION_API_KEY", hide_env_values = true)]
    pub moderation_api_key: Option<String>,

    /// Mount the development seed endpoint
    #[arg(long)]
    pub enable_seed: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub moderation: ModerationConfig,
    pub push: PushConfig,
    pub identity: IdentityConfig,
    pub http: HttpConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_seed: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: String,
    pub token_minutes: i64,
    pub session_days: i64,
    pub bcrypt_cost: u32,
    pub session_reap_minutes: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PushConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct IdentityConfig {
    pub session_data_url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            enable_seed: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: "nurture.db".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_algorithm: "HS256".to_string(),
            token_minutes: 10080,
            session_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_reap_minutes: 60,
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://exp.host/--/api/v2/push/send".to_string(),
            access_token: None,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            session_data_url:
                "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
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

        // CLI / environment overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if cli.enable_seed {
            config.server.enable_seed = true;
        }
        if let Some(ref path) = cli.database_path {
            config.database.path = Some(path.clone());
        }
        if let Some(ref name) = cli.database_name {
            config.database.name = name.clone();
        }
        if let Some(ref secret) = cli.jwt_secret {
            config.auth.jwt_secret = Some(secret.clone());
        }
        if let Some(ref algorithm) = cli.jwt_algorithm {
            config.auth.jwt_algorithm = algorithm.clone();
        }
        if let Some(minutes) = cli.token_minutes {
            config.auth.token_minutes = minutes;
        }
        if let Some(ref key) = cli.moderation_api_key {
            config.moderation.api_key = Some(key.clone());
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join(&config.database.name));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".nurture")
        })
    }

    /// Database location; falls back to the bare name when `load` was bypassed.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.database.name))
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.auth.token_minutes <= 0 {
            anyhow::bail!("auth.token_minutes must be positive");
        }
        if self.auth.session_days <= 0 {
            anyhow::bail!("auth.session_days must be positive");
        }
        for (key, value) in [
            ("moderation.endpoint", &self.moderation.endpoint),
            ("push.endpoint", &self.push.endpoint),
            ("identity.session_data_url", &self.identity.session_data_url),
        ] {
            url::Url::parse(value).map_err(|e| anyhow::anyhow!("{} is not a URL: {}", key, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_in(dir: &std::path::Path) -> Cli {
        Cli {
            data_dir: Some(dir.to_path_buf()),
            ..Cli::default()
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8001);
        assert!(!config.server.enable_seed);
        assert_eq!(config.database.name, "nurture.db");
        assert_eq!(config.auth.jwt_algorithm, "HS256");
        assert_eq!(config.auth.token_minutes, 10080);
        assert_eq!(config.auth.session_days, 7);
        assert!(config.auth.jwt_secret.is_none());
        assert!(config.moderation.api_key.is_none());
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_in(std::path::Path::new("/tmp/test-nurture"));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-nurture"));
    }

    #[test]
    fn data_dir_defaults_to_home_dot_nurture() {
        let dir = Config::data_dir(&Cli::default());
        assert!(dir.ends_with(".nurture"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli_in(tmp.path())).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.db_path(), tmp.path().join("nurture.db"));
    }

    #[test]
    fn database_name_is_joined_to_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            database_name: Some("community.db".to_string()),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.db_path(), tmp.path().join("community.db"));
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            jwt_secret: Some("s3cret".to_string()),
            token_minutes: Some(15),
            enable_seed: true,
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.token_minutes, 15);
        assert!(config.server.enable_seed);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[auth]
jwt_algorithm = "HS512"
session_days = 3

[moderation]
api_key = "mod-key"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_algorithm, "HS512");
        assert_eq!(config.auth.session_days, 3);
        assert_eq!(config.moderation.api_key.as_deref(), Some("mod-key"));
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn load_rejects_invalid_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[push]
endpoint = "not a url"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        assert!(Config::load(&cli).is_err());
    }
}
