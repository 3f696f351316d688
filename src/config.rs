use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    /// Shared family access code. `None` means every code is rejected.
    pub access_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Single browser origin allowed by CORS
    pub cors_origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: DatabaseConfig,
    /// Directory for the local (redb) backend
    pub local_data_dir: String,
}

/// Postgres connection parameters. `url` wins over the discrete fields.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub ssl: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Per-file ceiling applied to every uploaded part
    pub max_file_size: usize,
    /// File parts allowed in one request
    pub max_files: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            ssl: false,
            max_connections: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database: DatabaseConfig::default(),
            local_data_dir: "./data".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_files: 2,
        }
    }
}

impl UploadConfig {
    /// Whole-request body limit: every allowed file at full size plus room
    /// for the text fields. Saturates instead of overflowing on huge limits.
    pub fn body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(1024 * 1024)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{raw}'"))
            })?,
            None => 4000,
        };

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        let access_code = lookup("FAMILY_ACCESS_CODE").filter(|v| !v.is_empty());

        let backend = match var("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local,
            _ => StorageBackend::Postgres,
        };

        let ssl = matches!(
            var("PGSSLMODE").as_deref(),
            Some("require") | Some("verify-full")
        ) || var("PGSSL").as_deref() == Some("true");

        let database = DatabaseConfig {
            url: var("DATABASE_URL"),
            host: var("PGHOST"),
            port: var("PGPORT").and_then(|s| s.trim().parse().ok()),
            user: var("PGUSER"),
            password: lookup("PGPASSWORD"),
            database: var("PGDATABASE"),
            ssl,
            max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        let local_data_dir = var("LOCAL_DATA_DIR").unwrap_or_else(|| "./data".to_string());

        let max_file_size = var("MAX_UPLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        let max_files = var("MAX_UPLOAD_FILES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        let config = Config {
            server: ServerConfig {
                host,
                port,
                cors_origin,
            },
            storage: StorageConfig {
                backend,
                database,
                local_data_dir,
            },
            uploads: UploadConfig {
                max_file_size,
                max_files,
            },
            access_code,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.uploads.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_FILES must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres
            && self.storage.database.max_connections == 0
        {
            return Err(ConfigError::ValidationError(
                "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        if self.access_code.is_none() {
            tracing::warn!("FAMILY_ACCESS_CODE is not set; every access code will be rejected");
        }

        let db = &self.storage.database;
        if self.storage.backend == StorageBackend::Postgres
            && db.url.is_none()
            && (db.host.is_none() || db.database.is_none())
        {
            tracing::warn!(
                "Neither DATABASE_URL nor PGHOST/PGDATABASE is set; falling back to libpq defaults"
            );
        }

        Ok(())
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert_eq!(config.server.cors_origin, "http://localhost:3000");
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(!config.storage.database.ssl);
        assert!(config.access_code.is_none());
        assert_eq!(config.uploads.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.uploads.max_files, 2);
        assert_eq!(config.uploads.body_limit(), 21 * 1024 * 1024);
    }

    #[test]
    fn test_body_limit_saturates() {
        let huge = usize::MAX.to_string();
        let config = load(&[("MAX_UPLOAD_SIZE", huge.as_str()), ("MAX_UPLOAD_FILES", "4")]).unwrap();
        assert_eq!(config.uploads.body_limit(), usize::MAX);
    }

    #[test]
    fn test_discrete_postgres_parameters() {
        let config = load(&[
            ("PGHOST", "db"),
            ("PGPORT", "6432"),
            ("PGUSER", "family"),
            ("PGPASSWORD", "pw"),
            ("PGDATABASE", "dictionary"),
            ("PGSSLMODE", "require"),
        ])
        .unwrap();
        let db = &config.storage.database;
        assert_eq!(db.host.as_deref(), Some("db"));
        assert_eq!(db.port, Some(6432));
        assert_eq!(db.user.as_deref(), Some("family"));
        assert_eq!(db.password.as_deref(), Some("pw"));
        assert_eq!(db.database.as_deref(), Some("dictionary"));
        assert!(db.ssl);
    }

    #[test]
    fn test_pgssl_flag_enables_ssl() {
        let config = load(&[("PGSSL", "true")]).unwrap();
        assert!(config.storage.database.ssl);

        let config = load(&[("PGSSLMODE", "disable")]).unwrap();
        assert!(!config.storage.database.ssl);
    }

    #[test]
    fn test_local_backend_and_access_code() {
        let config = load(&[
            ("STORAGE_BACKEND", "LOCAL"),
            ("LOCAL_DATA_DIR", "/tmp/dict"),
            ("FAMILY_ACCESS_CODE", "blandiana"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.storage.local_data_dir, "/tmp/dict");
        assert_eq!(config.access_code.as_deref(), Some("blandiana"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(matches!(
            load(&[("PORT", "not-a-port")]),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_upload_limits_rejected() {
        assert!(load(&[("MAX_UPLOAD_SIZE", "0")]).is_err());
        assert!(load(&[("MAX_UPLOAD_FILES", "0")]).is_err());
    }
}
