use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Deserializer};

use crate::http::response::DEFAULT_SERVER_NAME;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub document_root: PathBuf,
    pub address: IpAddr,
    pub port: u16,
    /// Hard ceiling on the bytes read for one request.
    pub read_buffer_size: usize,
    pub read_mode: ReadMode,
    /// Seconds a client gets to send its request; `null` waits forever.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub read_timeout: Option<Duration>,
    /// One task per connection instead of one connection at a time.
    pub concurrent: bool,
    pub server_name: String,
}

/// How the connection handler fills its receive buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// A single read; whatever arrived is the request.
    #[default]
    Single,
    /// Keep reading until a blank line (CRLF or bare LF), EOF, or the buffer is full.
    UntilHeadersEnd,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append log lines here instead of stdout.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("."),
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            read_buffer_size: 1024,
            read_mode: ReadMode::Single,
            read_timeout: Some(Duration::from_secs(5)),
            concurrent: false,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    match secs {
        Some(s) if !s.is_finite() || s <= 0.0 => Err(serde::de::Error::custom(
            "read_timeout must be a positive number of seconds",
        )),
        Some(s) => Ok(Some(Duration::from_secs_f64(s))),
        None => Ok(None),
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(s).context("invalid configuration")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Command line and environment values win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.web_root {
            self.server.document_root = root.clone();
        }
        if let Some(ip) = cli.web_ip {
            self.server.address = ip;
        }
        if let Some(port) = cli.web_port {
            self.server.port = port;
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
        if cli.concurrent {
            self.server.concurrent = true;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.read_buffer_size == 0 {
            anyhow::bail!("read_buffer_size must be greater than zero");
        }
        if !self.server.document_root.is_dir() {
            anyhow::bail!(
                "document root {} is not a directory",
                self.server.document_root.display()
            );
        }
        Ok(())
    }
}

/// Command line of the `flatserve` binary.
#[derive(Debug, Default, Parser)]
#[command(name = "flatserve", version, about = "Serve files from a single directory over HTTP/1.1")]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "FLATSERVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory files are served from
    #[arg(long = "web-root", env = "FLATSERVE_WEB_ROOT")]
    pub web_root: Option<PathBuf>,

    /// Address to bind
    #[arg(long = "web-ip", env = "FLATSERVE_WEB_IP")]
    pub web_ip: Option<IpAddr>,

    /// Port to bind
    #[arg(long = "web-port", env = "FLATSERVE_WEB_PORT")]
    pub web_port: Option<u16>,

    /// Append log lines to this file
    #[arg(long = "log-file", env = "FLATSERVE_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Handle connections concurrently
    #[arg(long)]
    pub concurrent: bool,
}

impl Cli {
    /// Defaults, then the YAML file if one was given, then flags.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        cfg.apply_cli(self);
        cfg.validate()?;
        Ok(cfg)
    }
}
