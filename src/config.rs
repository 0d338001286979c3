use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::logging::log_info;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub call_interval_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: u64,
    pub poll_interval_ms: u64,
    pub client_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            call_interval_ms: 1500,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout: 30,
            poll_interval_ms: 500,
            client_name: String::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_config(&content)?))
    }

    fn from_map(config_map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let host = config_map.get("host")
            .cloned()
            .unwrap_or(defaults.host);

        let port = config_map.get("port")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let timeout = config_map.get("timeout")
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(defaults.timeout);

        let poll_interval_ms = config_map.get("poll_interval_ms")
            .and_then(|p| p.parse::<u64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(defaults.poll_interval_ms);

        let client_name = config_map.get("client_name")
            .cloned()
            .unwrap_or(defaults.client_name);

        ClientConfig { host, port, timeout, poll_interval_ms, client_name }
    }

    pub fn load_or_default() -> Self {
        let config_path = "conf/client.conf";

        match Self::from_file(config_path) {
            Ok(config) => {
                log_info(&format!("Loaded client configuration from {config_path}"));
                config
            }
            Err(e) => {
                log_info(&format!("Could not load client config from {config_path}: {e}. Using defaults."));
                Self::default()
            }
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_config(&content)?))
    }

    fn from_map(config_map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let host = config_map.get("host")
            .cloned()
            .unwrap_or(defaults.host);

        let port = config_map.get("port")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let call_interval_ms = config_map.get("call_interval_ms")
            .and_then(|c| c.parse::<u64>().ok())
            .unwrap_or(defaults.call_interval_ms);

        ServerConfig { host, port, call_interval_ms }
    }

    pub fn load_or_default() -> Self {
        let config_path = "conf/server.conf";

        match Self::from_file(config_path) {
            Ok(config) => {
                log_info(&format!("Loaded configuration from {config_path}"));
                config
            }
            Err(e) => {
                log_info(&format!("Could not load config from {config_path}: {e}. Using defaults."));
                Self::default()
            }
        }
    }
}

fn parse_config(content: &str) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            config.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
            # Bingo server
            host = 0.0.0.0
            port = 8080
            # Milliseconds between balls
            call_interval_ms = 250
        "#;

        let config = parse_config(content).unwrap();
        assert_eq!(config.get("host"), Some(&"0.0.0.0".to_string()));
        assert_eq!(config.get("port"), Some(&"8080".to_string()));
        assert_eq!(config.get("call_interval_ms"), Some(&"250".to_string()));
    }

    #[test]
    fn test_server_config_from_map() {
        let map = parse_config("port = 6000\ncall_interval_ms = fast").unwrap();
        let config = ServerConfig::from_map(&map);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6000);
        assert_eq!(config.call_interval_ms, 1500);
    }

    #[test]
    fn test_client_config_from_map() {
        let map = parse_config("client_name = Ana\npoll_interval_ms = 0\ntimeout = 5").unwrap();
        let config = ClientConfig::from_map(&map);
        assert_eq!(config.client_name, "Ana");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.timeout, 5);
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.call_interval_ms, 1500);
    }

    #[test]
    fn test_client_config_server_url() {
        let config = ClientConfig {
            host: "192.168.1.100".to_string(),
            port: 8080,
            ..ClientConfig::default()
        };
        assert_eq!(config.server_url(), "http://192.168.1.100:8080");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(ServerConfig::from_file("conf/does-not-exist.conf").is_err());
    }
}
