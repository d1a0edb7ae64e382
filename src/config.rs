// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("env {key}: {msg}")]
    Env { key: &'static str, msg: String },
    #[error("invalid: {0}")]
    Invalid(&'static str),
    #[error("http client for {exchange}: {source}")]
    HttpClient { exchange: String, source: crate::providers::AdapterError },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)] pub binance: String,
    #[serde(default)] pub bybit: String,
    #[serde(default)] pub mexc: String,
}

impl ApiKeys {
    pub fn for_exchange(&self, name: &str) -> &str {
        match name {
            "binance" => &self.binance,
            "bybit" => &self.bybit,
            "mexc" => &self.mexc,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArbiterConfig {
    #[serde(default = "d_pairs")]                pub pairs: Vec<String>,
    #[serde(default = "d_refresh_ms")]           pub refresh_ms: u64,
    #[serde(default = "d_http_timeout_ms")]      pub http_timeout_ms: u64,
    #[serde(default = "d_depth_levels")]         pub depth_levels: u32,
    #[serde(default = "d_api_port")]             pub api_port: u16,
    #[serde(default = "d_exchanges")]            pub exchanges: Vec<String>,
    #[serde(default)]                            pub parallel_pairs: bool,
    #[serde(default)]                            pub keys: ApiKeys,
}
fn d_pairs() -> Vec<String> { vec!["BTCUSDT".into(), "ETHUSDT".into(), "SOLUSDT".into()] }
fn d_refresh_ms() -> u64 { 10_000 }
fn d_http_timeout_ms() -> u64 { 10_000 }
fn d_depth_levels() -> u32 { 5 }
fn d_api_port() -> u16 { 3000 }
fn d_exchanges() -> Vec<String> { vec!["binance".into(), "bybit".into()] }
#[inline]
pub fn ms(d: u64) -> std::time::Duration { Duration::from_millis(d) }

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            pairs: d_pairs(),
            refresh_ms: d_refresh_ms(),
            http_timeout_ms: d_http_timeout_ms(),
            depth_levels: d_depth_levels(),
            api_port: d_api_port(),
            exchanges: d_exchanges(),
            parallel_pairs: false,
            keys: ApiKeys::default(),
        }
    }
}

impl ArbiterConfig {
    /// File (if any) -> environment overrides -> normalize -> validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut cfg = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overrides from the process environment. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP_PORT") {
            self.api_port = v.trim().parse().map_err(|_| ConfigError::Env {
                key: "APP_PORT",
                msg: format!("not a port number: {v:?}"),
            })?;
        }
        if let Some(v) = lookup("REFRESH_MS") {
            self.refresh_ms = v.trim().parse().map_err(|_| ConfigError::Env {
                key: "REFRESH_MS",
                msg: format!("not a millisecond count: {v:?}"),
            })?;
        }
        if let Some(v) = lookup("PAIRS") {
            self.pairs = v.split(',').map(str::to_string).collect();
        }
        if let Some(v) = lookup("BINANCE_API_KEY") { self.keys.binance = v; }
        if let Some(v) = lookup("BYBIT_API_KEY")   { self.keys.bybit = v; }
        if let Some(v) = lookup("MEXC_API_KEY")    { self.keys.mexc = v; }
        Ok(())
    }

    /// Upper-case and trim pairs, lower-case exchange names, drop blanks and repeats.
    pub fn normalize(&mut self) {
        let mut pairs: Vec<String> = Vec::with_capacity(self.pairs.len());
        for p in self.pairs.iter().map(|p| p.trim().to_uppercase()) {
            if !p.is_empty() && !pairs.contains(&p) {
                pairs.push(p);
            }
        }
        self.pairs = pairs;

        let mut exchanges: Vec<String> = Vec::with_capacity(self.exchanges.len());
        for e in self.exchanges.iter().map(|e| e.trim().to_lowercase()) {
            if !e.is_empty() && !exchanges.contains(&e) {
                exchanges.push(e);
            }
        }
        self.exchanges = exchanges;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::Invalid("no pairs configured"));
        }
        if self.exchanges.is_empty() {
            return Err(ConfigError::Invalid("no exchanges configured"));
        }
        if self.refresh_ms == 0 {
            return Err(ConfigError::Invalid("refresh_ms must be > 0"));
        }
        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid("http_timeout_ms must be > 0"));
        }
        if self.depth_levels == 0 {
            return Err(ConfigError::Invalid("depth_levels must be > 0"));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration { ms(self.refresh_ms) }
    pub fn http_timeout(&self) -> Duration { ms(self.http_timeout_ms) }
}
