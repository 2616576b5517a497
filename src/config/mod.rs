// Configuration module entry point
// Loads configuration from file + environment and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::{ServeError, ServeResult};

pub use state::AppState;
pub use types::{Config, ServeConfig};

/// 32 pages of 4 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 4096;

/// Command-line values that take precedence over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub root: Option<String>,
    pub port: Option<u16>,
}

fn builder_with_defaults(
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("serve.prefix", "/fs")?
        .set_default("serve.root", ".")?
        .set_default("serve.chunk_size", i64::try_from(DEFAULT_CHUNK_SIZE).unwrap_or(131_072))?
        .set_default("serve.escape_names", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.shutdown_grace", 10)?
        .set_default("http.server_name", concat!("fsserve/", env!("CARGO_PKG_VERSION")))
}

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// A missing file is fine: defaults and `FSSERVE_*` variables still apply
    pub fn load_from(config_path: &str) -> ServeResult<Self> {
        let settings = builder_with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("FSSERVE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validated()
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> ServeResult<Self> {
        let config: Self = builder_with_defaults()?.build()?.try_deserialize()?;
        config.validated()
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(root) = overrides.root {
            self.serve.root = root;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self
    }

    /// Normalize the prefix to "/name" form and reject unusable values
    fn validated(mut self) -> ServeResult<Self> {
        let trimmed = self.serve.prefix.trim_matches('/');
        self.serve.prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        if self.serve.chunk_size == 0 {
            return Err(ServeError::Config(config::ConfigError::Message(
                "serve.chunk_size must be greater than zero".to_string(),
            )));
        }
        Ok(self)
    }

    pub fn get_socket_addr(&self) -> ServeResult<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|e| ServeError::Address(format!("{addr}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.serve.prefix, "/fs");
        assert_eq!(cfg.serve.root, ".");
        assert_eq!(cfg.serve.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(cfg.serve.escape_names);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.http.server_name.starts_with("fsserve/"));
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[serve]\nprefix = \"files/\"\nroot = \"/srv\"\nchunk_size = 4096\n\n\
             [server]\nport = 9000"
        )
        .unwrap();

        let cfg = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.serve.prefix, "/files");
        assert_eq!(cfg.serve.root, "/srv");
        assert_eq!(cfg.serve.chunk_size, 4096);
        assert_eq!(cfg.server.port, 9000);
        // Untouched sections keep their defaults
        assert_eq!(cfg.performance.read_timeout, 30);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[serve]\nchunk_size = 0").unwrap();
        assert!(matches!(
            Config::load_from(file.path().to_str().unwrap()),
            Err(ServeError::Config(_))
        ));
    }

    #[test]
    fn test_overrides_win() {
        let cfg = Config::defaults().unwrap().with_overrides(Overrides {
            root: Some("/tmp".to_string()),
            port: Some(1234),
        });
        assert_eq!(cfg.serve.root, "/tmp");
        assert_eq!(cfg.server.port, 1234);
    }

    #[test]
    fn test_bad_host_is_address_error() {
        let mut cfg = Config::defaults().unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(cfg.get_socket_addr(), Err(ServeError::Address(_))));
    }
}
