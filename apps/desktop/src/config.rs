use std::{fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::DispatchPolicy;
use serde::Deserialize;
use shared::domain::Speed;

pub const DEFAULT_CONFIG_PATH: &str = "motor_panel.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub address: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub quiet_period_ms: u64,
    pub check_interval_ms: u64,
    pub start_speed: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: "192.168.1.7".into(),
            port: 5050,
            connect_timeout_ms: 5_000,
            quiet_period_ms: 1_000,
            check_interval_ms: 100,
            start_speed: 40,
        }
    }
}

/// Keys accepted in `motor_panel.toml`. Missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    address: Option<String>,
    port: Option<u16>,
    connect_timeout_ms: Option<u64>,
    quiet_period_ms: Option<u64>,
    check_interval_ms: Option<u64>,
    start_speed: Option<u8>,
}

impl Settings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            quiet_period: Duration::from_millis(self.quiet_period_ms),
            start_speed: Speed::saturating(self.start_speed),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.address.trim().is_empty() {
            bail!("motor board address is empty");
        }
        if self.port == 0 {
            bail!("motor board port must be non-zero");
        }
        if self.check_interval_ms == 0 {
            bail!("check_interval_ms must be greater than zero");
        }
        if self.start_speed > Speed::MAX.percent() {
            bail!("start_speed {} is outside 0..=100", self.start_speed);
        }
        Ok(())
    }

    fn merge_file(&mut self, file: FileSettings) {
        if let Some(v) = file.address {
            self.address = v;
        }
        if let Some(v) = file.port {
            self.port = v;
        }
        if let Some(v) = file.connect_timeout_ms {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = file.quiet_period_ms {
            self.quiet_period_ms = v;
        }
        if let Some(v) = file.check_interval_ms {
            self.check_interval_ms = v;
        }
        if let Some(v) = file.start_speed {
            self.start_speed = v;
        }
    }

    /// Environment overrides; `MOTOR_PANEL_*` wins over `APP__*`.
    fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |name: &str| {
            lookup(&format!("MOTOR_PANEL_{name}")).or_else(|| lookup(&format!("APP__{name}")))
        };

        if let Some(v) = var("ADDRESS") {
            self.address = v;
        }
        if let Some(v) = var("PORT") {
            self.port = v.parse().with_context(|| format!("invalid port '{v}'"))?;
        }
        if let Some(v) = var("CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = v
                .parse()
                .with_context(|| format!("invalid connect timeout '{v}'"))?;
        }
        if let Some(v) = var("QUIET_PERIOD_MS") {
            self.quiet_period_ms = v
                .parse()
                .with_context(|| format!("invalid quiet period '{v}'"))?;
        }
        if let Some(v) = var("CHECK_INTERVAL_MS") {
            self.check_interval_ms = v
                .parse()
                .with_context(|| format!("invalid check interval '{v}'"))?;
        }
        if let Some(v) = var("START_SPEED") {
            self.start_speed = v
                .parse()
                .with_context(|| format!("invalid start speed '{v}'"))?;
        }
        Ok(())
    }
}

/// Defaults, then the optional config file, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.merge_file(file);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    settings.merge_env(lookup)?;
    Ok(settings)
}
