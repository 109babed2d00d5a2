use crate::error::DustError;
use crate::fee_policy::FeePolicy;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Coin the wallet runs, and the network rules its transactions follow.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoinProfile {
    pub coin_name: String,
    pub coin_code: String,
    pub rpc_port: u16,
    pub fee_policy: FeePolicy,
}

impl Default for CoinProfile {
    fn default() -> Self {
        Self {
            coin_name: "myriadcoin".to_string(),
            coin_code: "MYR".to_string(),
            rpc_port: 10889,
            fee_policy: FeePolicy::default(),
        }
    }
}

impl CoinProfile {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            None => return Ok(Self::default()),
            Some(path) => path,
        };
        tracing::info!("Profile file {:?}", path);
        let file = File::open(path)
            .with_context(|| format!("Cannot read profile file {path}", path = path.display()))?;
        let profile: CoinProfile = serde_yaml::from_reader(file)
            .with_context(|| format!("Cannot parse profile file {path}", path = path.display()))?;
        Ok(profile)
    }

    /// `~/.<coin>/<coin>.conf`, where the coin daemon keeps its settings.
    pub fn wallet_conf_path(&self) -> Result<PathBuf, DustError> {
        let home = dirs::home_dir()
            .ok_or_else(|| DustError::Config("home directory not found".to_string()))?;
        Ok(home
            .join(format!(".{}", self.coin_name))
            .join(format!("{}.conf", self.coin_name)))
    }
}

/// RPC credentials read from the coin daemon's configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConf {
    pub rpc_user: String,
    pub rpc_password: String,
}

impl WalletConf {
    pub fn read(path: &Path) -> Result<Self, DustError> {
        let file = File::open(path).map_err(|err| {
            DustError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let mut entries = HashMap::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| {
                DustError::Config(format!("cannot read {}: {err}", path.display()))
            })?;
            if let Some((key, value)) = parse_line(&line) {
                entries.insert(key, value);
            }
        }

        Ok(Self {
            rpc_user: required(&entries, "rpcuser", path)?,
            rpc_password: required(&entries, "rpcpassword", path)?,
        })
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

fn required(entries: &HashMap<String, String>, key: &str, path: &Path) -> Result<String, DustError> {
    match entries.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(DustError::Config(format!(
            "`{key}` is missing or empty in {}",
            path.display()
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Where and how to reach the wallet's JSON-RPC interface.
#[derive(Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub scheme: Scheme,
    /// `host:port`
    pub host: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl RpcEndpoint {
    /// Resolves the endpoint from command line overrides, reading `conf_path`
    /// only when either credential is missing.
    pub fn resolve(
        profile: &CoinProfile,
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
        https: bool,
        conf_path: &Path,
    ) -> Result<Self, DustError> {
        let host = host.unwrap_or_else(|| format!("localhost:{}", profile.rpc_port));
        let (user, password) = match (user, password) {
            (Some(user), Some(password)) => (user, password),
            _ => {
                tracing::debug!("Reading RPC credentials from {:?}", conf_path);
                let conf = WalletConf::read(conf_path)?;
                (conf.rpc_user, conf.rpc_password)
            }
        };

        Ok(Self {
            scheme: if https { Scheme::Https } else { Scheme::Http },
            host,
            user,
            password,
        })
    }

    pub fn url(&self) -> String {
        let prefix = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        format!("{prefix}://{}", self.host)
    }
}
