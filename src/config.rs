use crate::{
    models::account::AccountCredential,
    services::{account_collector::DEFAULT_PROBE_CONCURRENCY, prober::DEFAULT_PROBE_KEY},
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::{env, fs, io::ErrorKind, path::Path, str::FromStr, time::Duration};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9131;
const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Centralized application configuration.
/// Combines the YAML file, environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub accounts: Vec<AccountCredential>,
    pub probe_concurrency: usize,
    pub probe_key: String,
    pub probe_timeout: Option<Duration>,
}

/// Command-line configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Object storage bucket usage exporter")]
pub struct Args {
    /// Path of the YAML config file (overrides EXPORTER_CONFIG)
    #[arg(long)]
    pub config: Option<String>,

    /// Host to bind to (overrides EXPORTER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EXPORTER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Probes in flight per account (overrides EXPORTER_PROBE_CONCURRENCY)
    #[arg(long)]
    pub probe_concurrency: Option<usize>,

    /// Object key written by the access probe (overrides EXPORTER_PROBE_KEY)
    #[arg(long)]
    pub probe_key: Option<String>,

    /// Per-bucket probe timeout in seconds, 0 disables it (overrides EXPORTER_PROBE_TIMEOUT_SECS)
    #[arg(long)]
    pub probe_timeout_secs: Option<u64>,
}

/// Layout of the YAML config file.
///
/// ```yaml
/// port: 9131
/// probe:
///   concurrency: 30
/// obs:
///   accounts:
///     - endpoint: https://obs.example.com
///       ak: AKID
///       sk: SECRET
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<PortValue>,
    #[serde(default)]
    pub probe: ProbeSection,
    #[serde(default)]
    pub obs: ObsSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeSection {
    pub concurrency: Option<usize>,
    pub key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObsSection {
    #[serde(default)]
    pub accounts: Vec<AccountCredential>,
}

/// Ports may be written as a number or as a quoted string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    fn resolve(&self) -> Result<u16> {
        match self {
            PortValue::Number(port) => Ok(*port),
            PortValue::Text(text) => text
                .trim()
                .parse::<u16>()
                .with_context(|| format!("parsing port value `{}`", text)),
        }
    }
}

impl FileConfig {
    /// Read the config file. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };

        Self::parse(&contents)
            .with_context(|| format!("parsing {}", path.display()))
            .map(Some)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

impl AppConfig {
    /// Parse CLI args, environment variables and the config file into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        let lookup = |key: &str| env::var(key).ok();

        let path = args
            .config
            .clone()
            .or_else(|| lookup("EXPORTER_CONFIG"))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());

        let file = match FileConfig::load(Path::new(&path))? {
            Some(file) => file,
            None => {
                tracing::warn!("config file {} not found, using defaults", path);
                FileConfig::default()
            }
        };

        Self::from_sources(args, lookup, file)
    }

    /// Merge sources with precedence CLI > environment > file > default.
    pub fn from_sources<F>(args: Args, lookup: F, file: FileConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_port = file.port.as_ref().map(PortValue::resolve).transpose()?;

        let host = args
            .host
            .or_else(|| lookup("EXPORTER_HOST"))
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.into());
        let port = match args.port {
            Some(port) => port,
            None => env_parse(&lookup, "EXPORTER_PORT")?
                .or(file_port)
                .unwrap_or(DEFAULT_PORT),
        };
        let probe_concurrency = match args.probe_concurrency {
            Some(limit) => limit,
            None => env_parse(&lookup, "EXPORTER_PROBE_CONCURRENCY")?
                .or(file.probe.concurrency)
                .unwrap_or(DEFAULT_PROBE_CONCURRENCY),
        };
        let probe_key = args
            .probe_key
            .or_else(|| lookup("EXPORTER_PROBE_KEY"))
            .or(file.probe.key)
            .unwrap_or_else(|| DEFAULT_PROBE_KEY.into());
        let probe_timeout_secs = match args.probe_timeout_secs {
            Some(secs) => Some(secs),
            None => env_parse(&lookup, "EXPORTER_PROBE_TIMEOUT_SECS")?.or(file.probe.timeout_secs),
        };

        if probe_concurrency == 0 {
            bail!("probe concurrency must be at least 1");
        }
        if probe_key.trim().is_empty() {
            bail!("probe key must not be empty");
        }
        for (index, account) in file.obs.accounts.iter().enumerate() {
            if account.endpoint.trim().is_empty() {
                bail!("account #{} has an empty endpoint", index);
            }
        }

        Ok(Self {
            host,
            port,
            accounts: file.obs.accounts,
            probe_concurrency,
            probe_key,
            probe_timeout: probe_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}
