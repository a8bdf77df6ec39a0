use log::warn;
use once_cell::sync::OnceCell;
use serde_derive::Deserialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

static INSTANCE: OnceCell<Mutex<RuntimeConfig>> = OnceCell::new();

pub fn instance() -> MutexGuard<'static, RuntimeConfig> {
    INSTANCE
        .get_or_init(|| Mutex::new(RuntimeConfig::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// gRPC listen address
    pub addr: String,
    /// Prometheus scrape address
    pub metrics_addr: String,
    /// Interval between clearing cycles
    pub tick_interval_ms: u64,
    /// Batches buffered per transaction subscriber
    pub subscriber_capacity: usize,
    /// How long a full subscriber may hold up delivery before it is dropped
    pub delivery_timeout_ms: u64,
    /// Transactions buffered per gRPC stream
    pub stream_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig::new()
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig {
            addr: "0.0.0.0:50051".to_string(),
            metrics_addr: "0.0.0.0:50061".to_string(),
            tick_interval_ms: 1000,
            subscriber_capacity: 10000,
            delivery_timeout_ms: 500,
            stream_buffer: 1024,
        }
    }

    /// Loads the config at `path` and makes it the process-wide instance.
    /// A missing or malformed file falls back to the defaults.
    pub fn from_toml(path: &str) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(c) => c,
                Err(e) => {
                    warn!(
                        "Something went wrong parsing the runtime config file {}, {:?}",
                        path, e
                    );
                    RuntimeConfig::new()
                }
            },
            Err(e) => {
                warn!(
                    "Something went wrong reading the runtime config file {}, {:?}",
                    path, e
                );
                RuntimeConfig::new()
            }
        };
        instance().clone_from(&config);
        config
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "addr = \"127.0.0.1:7000\"\ntick_interval_ms = 250").unwrap();

        let config = RuntimeConfig::from_toml(file.path().to_str().unwrap());

        assert_eq!(config.addr, "127.0.0.1:7000");
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.subscriber_capacity, 10000);
        assert_eq!(config.delivery_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn unreadable_or_malformed_file_falls_back() {
        assert_eq!(
            RuntimeConfig::from_toml("/nonexistent/market.toml"),
            RuntimeConfig::new()
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms = \"soon\"").unwrap();
        assert_eq!(
            RuntimeConfig::from_toml(file.path().to_str().unwrap()),
            RuntimeConfig::new()
        );
    }
}
