use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub engagement: EngagementConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Embedded in generated ids; must differ between instances sharing a database.
    pub worker_id: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
            worker_id: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/threadline.db?mode=rwc".into(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 7 * 24 * 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub vote_retry_attempts: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            vote_retry_attempts: threadline_core::vote::DEFAULT_VOTE_ATTEMPTS,
        }
    }
}

impl Config {
    /// Read `path` if it exists, then apply `THREADLINE_*` environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            tracing::warn!("config file {path} not found, using defaults");
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("THREADLINE_BIND_ADDRESS") {
            self.server.bind_address = bind;
        }
        if let Some(url) = lookup("THREADLINE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("THREADLINE_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("auth.jwt_secret must be set (or THREADLINE_JWT_SECRET)");
        }
        if self.engagement.vote_retry_attempts == 0 {
            anyhow::bail!("engagement.vote_retry_attempts must be at least 1");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[auth]\njwt_secret = \"s3cret\"\n\n[engagement]\nvote_retry_attempts = 5"
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.engagement.vote_retry_attempts, 5);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.server.worker_id, 1);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "THREADLINE_BIND_ADDRESS" => Some("127.0.0.1:9000".into()),
            "THREADLINE_JWT_SECRET" => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert!(config.database.url.starts_with("sqlite:"));
    }

    #[test]
    fn missing_secret_is_rejected() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn zero_retry_attempts_is_rejected() {
        let mut config = Config::default();
        config.auth.jwt_secret = "x".into();
        config.engagement.vote_retry_attempts = 0;
        assert!(config.validate().is_err());
    }
}
