use std::{env, fmt, fs, path, time::Duration};

use peersub::{DiscoveryConfig, NodeConfig, DEFAULT_PORT_RANGE};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}", .0.display())]
    ReadFailed(path::PathBuf, #[source] std::io::Error),
    #[error("failed to write {}", .0.display())]
    WriteFailed(path::PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config directory available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: Node,
    pub discovery: Discovery,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub port_range: (u16, u16),
    pub keypair_path: Option<String>,
    pub bootstrap_peers: Vec<String>,
    pub enable_pubsub: bool,
    pub enable_kademlia: bool,
    pub enable_mdns: bool,
    pub heartbeat_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Discovery {
    pub provider_limit: usize,
    pub connect_timeout_secs: u64,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/peersub/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("peersub/config.toml"))
}

impl Default for Node {
    fn default() -> Self {
        Self {
            port_range: DEFAULT_PORT_RANGE,
            keypair_path: None,
            bootstrap_peers: Vec::new(),
            enable_pubsub: true,
            enable_kademlia: true,
            enable_mdns: true,
            heartbeat_ms: 1000,
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            provider_limit: defaults.provider_limit,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        let (start, end) = self.node.port_range;
        writeln!(f, "Current Node Configuration:")?;
        write_title_1(f, "Node")?;
        write_1(f, "Ports", &format!("{start}-{end}"))?;
        write_1(f, "Keypair", &self.node.keypair_path.as_deref().unwrap_or("<ephemeral>"))?;
        write_1(f, "Bootstrap Peers", &self.node.bootstrap_peers.len())?;
        write_1(f, "Pub/Sub", &self.node.enable_pubsub)?;
        write_1(f, "Kademlia", &self.node.enable_kademlia)?;
        write_1(f, "mDNS", &self.node.enable_mdns)?;
        write_title_1(f, "Discovery")?;
        write_1(f, "Provider Limit", &self.discovery.provider_limit)?;
        write_1(f, "Connect Timeout (s)", &self.discovery.connect_timeout_secs)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/peersub/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|err| Error::ReadFailed(config_path.clone(), err))?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::WriteFailed(path.to_path_buf(), err))?;
        }

        fs::write(path, config_str).map_err(|err| Error::WriteFailed(path.to_path_buf(), err))
    }

    /// Node configuration described by this file
    pub fn node_config(&self) -> NodeConfig {
        let node = &self.node;
        let discovery = DiscoveryConfig::default()
            .with_provider_limit(self.discovery.provider_limit)
            .with_connect_timeout(Duration::from_secs(self.discovery.connect_timeout_secs));

        let mut builder = NodeConfig::builder()
            .port_range(node.port_range)
            .heartbeat_interval(Duration::from_millis(node.heartbeat_ms))
            .discovery(discovery);
        if let Some(path) = &node.keypair_path {
            builder = builder.keypair_path(path.clone());
        }
        for peer in &node.bootstrap_peers {
            builder = builder.bootstrap_peer(peer.clone());
        }

        builder
            .build()
            .with_pubsub(node.enable_pubsub)
            .with_kademlia(node.enable_kademlia)
            .with_mdns(node.enable_mdns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config");

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config.node.port_range, DEFAULT_PORT_RANGE);
        assert!(dir.path().join("nested").join("config.toml").exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[node]\nenable_mdns = false\nport_range = [0, 0]\n").unwrap();

        let config = Config::from_config(Some(&path)).unwrap();
        let node = config.node_config();

        assert!(!node.enable_mdns);
        assert!(node.enable_pubsub);
        assert_eq!(node.port_range, (0, 0));
        assert_eq!(node.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_display_lists_effective_values() {
        let mut config = Config::default();
        config.node.port_range = (4200, 4210);
        config.discovery.provider_limit = 4;

        let shown = config.to_string();
        assert!(shown.starts_with("Current Node Configuration:"));
        assert!(shown.contains("Ports: 4200-4210"));
        assert!(shown.contains("Keypair: <ephemeral>"));
        assert!(shown.contains("Provider Limit: 4"));
    }

    #[test]
    fn test_discovery_limits_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[discovery]\nprovider_limit = 50\nconnect_timeout_secs = 120\n").unwrap();

        let node = Config::from_config(Some(&path)).unwrap().node_config();
        assert_eq!(node.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[node\n").unwrap();

        assert!(matches!(Config::from_config(Some(&path)), Err(Error::ParseFailed(_))));
    }
}
