//! Application configuration: parsing, normalization, and loading.
//!
//! The TOML file names the database, the local timezone, the files the
//! runtime reads (limits book, price snapshot), the tracked symbols, the
//! users that receive alerts and the runtime knobs.
//!
//! ```toml
//! database_url = "data/series.db"
//! timezone = "Asia/Jerusalem"
//! limits_file = "data/limits.json"
//! snapshot_file = "data/snapshot.json"
//!
//! [symbols]
//! BTC = "Bitcoin"
//! ETH = "Ethereum"
//!
//! [users.alice]
//! chat_id = "100"
//!
//! [throttle]
//! persistence = "durable"
//! ```
//!
//! Normalization trims and uppercases symbol logos, trims user names,
//! de-duplicates both while preserving order and drops users without a
//! chat id. Env overrides: `DATABASE_URL` replaces `database_url`;
//! `SERIES_SYNC_CONFIG` names the file read by [`load_config_from_env`].

use std::{mem, path::PathBuf};

use alerts::ThrottlePolicy;
use anyhow::{Context, bail};
use chrono::TimeDelta;
use chrono_tz::Tz;
use indexmap::IndexMap;
use indicators::IndicatorSettings;
use serde::{Deserialize, Serialize};
use shared_utils::get_env_var;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "SERIES_SYNC_CONFIG";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "series_sync.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub limits_file: PathBuf,
    pub snapshot_file: PathBuf,
    /// Logo -> display name.
    #[serde(default)]
    pub symbols: IndexMap<String, String>,
    #[serde(default)]
    pub users: IndexMap<String, UserCfg>,
    #[serde(default)]
    pub polling: PollingCfg,
    #[serde(default)]
    pub throttle: ThrottleCfg,
    #[serde(default)]
    pub indicators: IndicatorSettings,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UserCfg {
    /// Recipient id handed to the notification sink.
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingCfg {
    pub price_interval_secs: u64,
    pub history_interval_secs: u64,
    /// Days reconciled per history cycle; `0` only takes the newest row.
    pub history_days: u32,
}

impl Default for PollingCfg {
    fn default() -> Self {
        Self {
            price_interval_secs: 30,
            history_interval_secs: 86_400,
            history_days: 30,
        }
    }
}

/// Where throttle states live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Forgotten on restart.
    #[default]
    Memory,
    /// Kept in the `engine_kv` table.
    Durable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThrottleCfg {
    pub enabled: bool,
    pub persistence: Persistence,
    pub cooldown_minutes: i64,
    pub min_move: f64,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        let policy = ThrottlePolicy::default();
        Self {
            enabled: true,
            persistence: Persistence::Memory,
            cooldown_minutes: policy.cooldown.num_minutes(),
            min_move: policy.min_move,
        }
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub symbols_renamed: usize,
    pub symbols_deduped: usize,
    pub users_deduped: usize,
    /// Users dropped because they have no chat id.
    pub users_without_chat_id: Vec<String>,
}

/// Normalize a config in place and validate its knobs.
///
/// Errors:
/// - Empty symbol logos or user names after trimming
/// - Unknown timezone
/// - Zero polling intervals or indicator windows
/// - Negative cooldown or a `min_move` outside `[0, 1)`
pub fn normalize_config(cfg: &mut AppConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    let mut symbols = IndexMap::new();
    for (raw, name) in mem::take(&mut cfg.symbols) {
        let logo = raw.trim().to_uppercase();
        if logo.is_empty() {
            bail!("symbol logo cannot be empty after trimming");
        }
        if logo != raw {
            report.symbols_renamed += 1;
        }
        if symbols.contains_key(&logo) {
            report.symbols_deduped += 1;
            continue;
        }
        symbols.insert(logo, name.trim().to_string());
    }
    cfg.symbols = symbols;

    let mut users = IndexMap::new();
    for (raw, mut user) in mem::take(&mut cfg.users) {
        let name = raw.trim().to_string();
        if name.is_empty() {
            bail!("user name cannot be empty after trimming");
        }
        user.chat_id = user
            .chat_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if user.chat_id.is_none() {
            report.users_without_chat_id.push(name);
            continue;
        }
        if users.contains_key(&name) {
            report.users_deduped += 1;
            continue;
        }
        users.insert(name, user);
    }
    cfg.users = users;

    cfg.timezone = cfg.timezone.trim().to_string();
    cfg.timezone
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown timezone '{}': {e}", cfg.timezone))?;

    if cfg.polling.price_interval_secs == 0 || cfg.polling.history_interval_secs == 0 {
        bail!("polling intervals must be positive");
    }
    if cfg.indicators.ema_length == 0 || cfg.indicators.sma_length == 0 {
        bail!("indicator windows must be positive");
    }
    if cfg.throttle.cooldown_minutes < 0 {
        bail!("throttle.cooldown_minutes cannot be negative");
    }
    if TimeDelta::try_minutes(cfg.throttle.cooldown_minutes).is_none() {
        bail!("throttle.cooldown_minutes is out of range: {}", cfg.throttle.cooldown_minutes);
    }
    if !(0.0..1.0).contains(&cfg.throttle.min_move) {
        bail!("throttle.min_move must be in [0, 1), got {}", cfg.throttle.min_move);
    }

    Ok(report)
}

impl AppConfig {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// User name -> sink recipient id.
    pub fn recipients(&self) -> IndexMap<String, String> {
        self.users
            .iter()
            .filter_map(|(name, user)| user.chat_id.clone().map(|id| (name.clone(), id)))
            .collect()
    }

    pub fn throttle_policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            cooldown: TimeDelta::try_minutes(self.throttle.cooldown_minutes).unwrap_or(TimeDelta::MAX),
            min_move: self.throttle.min_move,
        }
    }

    /// Replaces `database_url` with `DATABASE_URL` when it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = get_env_var(DATABASE_URL_ENV) {
            info!(env = DATABASE_URL_ENV, "database url overridden from environment");
            self.database_url = url;
        }
    }
}

/// Parse and normalize a config from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<AppConfig> {
    let mut cfg: AppConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    let report = normalize_config(&mut cfg).context("normalize_config failed")?;
    if !report.users_without_chat_id.is_empty() {
        warn!(users = ?report.users_without_chat_id, "users without chat id dropped");
    }
    info!(?report, symbols = cfg.symbols.len(), users = cfg.users.len(), "config loaded");
    Ok(cfg)
}

/// Read a config TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

/// The config path: `explicit`, else `SERIES_SYNC_CONFIG`, else [`DEFAULT_CONFIG_PATH`].
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| get_env_var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the config named by [`resolve_config_path`] and applies env overrides.
pub fn load_config_from_env(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut cfg = load_config_path(resolve_config_path(explicit))?;
    cfg.apply_env_overrides();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        database_url = "data/series.db"
        timezone = " Asia/Jerusalem "
        limits_file = "data/limits.json"
        snapshot_file = "data/snapshot.json"

        [symbols]
        " btc " = "Bitcoin"
        BTC = "Bitcoin again"
        eth = "Ethereum"

        [users.alice]
        chat_id = "100"

        [users.bob]

        [users." carol "]
        chat_id = " 300 "

        [throttle]
        persistence = "durable"
        cooldown_minutes = 5
    "#;

    #[test]
    fn normalizes_symbols_and_users() {
        let mut cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        let report = normalize_config(&mut cfg).unwrap();

        assert_eq!(cfg.symbols.keys().collect::<Vec<_>>(), vec!["BTC", "ETH"]);
        assert_eq!(cfg.symbols["BTC"], "Bitcoin");
        assert_eq!(cfg.timezone, "Asia/Jerusalem");
        insta::assert_json_snapshot!(report, @r#"
        {
          "symbols_renamed": 2,
          "symbols_deduped": 1,
          "users_deduped": 0,
          "users_without_chat_id": [
            "bob"
          ]
        }
        "#);

        let recipients = cfg.recipients();
        assert_eq!(recipients["alice"], "100");
        assert_eq!(recipients["carol"], "300");
        assert!(!recipients.contains_key("bob"));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg = load_config_str(
            r#"
            database_url = ":memory:"
            limits_file = "l.json"
            snapshot_file = "s.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.tz(), Tz::UTC);
        assert_eq!(cfg.polling.price_interval_secs, 30);
        assert_eq!(cfg.polling.history_interval_secs, 86_400);
        assert!(cfg.throttle.enabled);
        assert_eq!(cfg.throttle.persistence, Persistence::Memory);
        assert_eq!(cfg.throttle_policy(), ThrottlePolicy::default());
        assert_eq!(cfg.indicators, IndicatorSettings::default());
    }

    #[test]
    fn throttle_knobs_map_to_policy() {
        let cfg = load_config_str(SAMPLE).unwrap();
        assert_eq!(cfg.throttle.persistence, Persistence::Durable);
        assert_eq!(cfg.throttle_policy().cooldown, TimeDelta::minutes(5));
        assert_eq!(cfg.throttle_policy().min_move, 0.025);
    }

    #[test]
    fn unnormalized_cooldown_saturates() {
        let mut cfg = load_config_str(SAMPLE).unwrap();
        cfg.throttle.cooldown_minutes = i64::MAX;
        assert_eq!(cfg.throttle_policy().cooldown, TimeDelta::MAX);
    }

    #[test]
    fn rejects_bad_values() {
        let base = "database_url = \":memory:\"\nlimits_file = \"l\"\nsnapshot_file = \"s\"\n";

        let err = load_config_str(&format!("{base}timezone = \"Mars/Olympus\"")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown timezone"));

        let err = load_config_str(&format!("{base}[polling]\nprice_interval_secs = 0")).unwrap_err();
        assert!(format!("{err:#}").contains("polling intervals"));

        let err = load_config_str(&format!("{base}[throttle]\nmin_move = 1.5")).unwrap_err();
        assert!(format!("{err:#}").contains("min_move"));

        let err = load_config_str(&format!("{base}[throttle]\ncooldown_minutes = 9000000000000000")).unwrap_err();
        assert!(format!("{err:#}").contains("cooldown_minutes is out of range"));

        let err = load_config_str(&format!("{base}[symbols]\n\" \" = \"blank\"")).unwrap_err();
        assert!(format!("{err:#}").contains("symbol logo"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_config_str(
            "database_url = \"x\"\nlimits_file = \"l\"\nsnapshot_file = \"s\"\nbogus = 1",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config TOML"));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn symbol_keys_are_uppercase_and_trimmed(
            logos in proptest::collection::vec("[a-zA-Z]{1,5}", 1..6),
        ) {
            let mut cfg: AppConfig = toml::from_str(
                "database_url = \"x\"\nlimits_file = \"l\"\nsnapshot_file = \"s\"",
            ).unwrap();
            for (i, logo) in logos.iter().enumerate() {
                let key = if i % 2 == 0 { format!(" {logo} ") } else { logo.to_lowercase() };
                cfg.symbols.insert(key, logo.clone());
            }
            let report = normalize_config(&mut cfg).unwrap();

            prop_assert!(cfg.symbols.keys().all(|k| *k == k.trim().to_uppercase()));
            let distinct: std::collections::HashSet<String> =
                logos.iter().map(|l| l.to_uppercase()).collect();
            prop_assert_eq!(cfg.symbols.len(), distinct.len());
            prop_assert!(report.users_without_chat_id.is_empty());
        }
    }
}
