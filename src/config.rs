use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Верхние границы числовых настроек (совпадают с диапазонами страницы настроек)
pub const MAX_FIXED_TARGET_MONITOR: usize = 15;
pub const MAX_DELAY_MS: u64 = 2000;
pub const MAX_RETRY_COUNT: u32 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub swap: SwapConfig,
    pub timing: TimingConfig,
    pub sway: SwayConfig,
    // Нормализованный blocklist - не сериализуется, строится после загрузки
    #[serde(skip)]
    blocklist_lower: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapConfig {
    pub mode: SwapMode,
    pub target_monitor: TargetMonitorMode,
    pub fixed_target_monitor: usize,
    pub scope: ScopeMode,
    pub ignore_fullscreen: bool,
    pub app_blocklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub settle_delay_ms: u64,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwayConfig {
    pub swaymsg: String,
    /// Имя выхода, считающегося основным монитором. Пустая строка - первый активный выход
    pub primary_output: String,
}

/// Что делать с окном, уже занимающим целевой монитор
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwapMode {
    #[default]
    Swap,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMonitorMode {
    #[default]
    Primary,
    Fixed,
}

/// Какие рабочие столы просматриваются при поиске окна-резидента
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    #[default]
    FocusedWorkspace,
    ActiveWorkspace,
    AllWorkspaces,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            mode: SwapMode::Swap,
            target_monitor: TargetMonitorMode::Primary,
            fixed_target_monitor: 0,
            scope: ScopeMode::FocusedWorkspace,
            ignore_fullscreen: true,
            app_blocklist: Vec::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 150,
            retry_count: 2,
            retry_delay_ms: 120,
        }
    }
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            swaymsg: "swaymsg".to_string(),
            primary_output: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig::default(),
            swap: SwapConfig::default(),
            timing: TimingConfig::default(),
            sway: SwayConfig::default(),
            blocklist_lower: HashSet::new(),
        };
        config.build_lookup_indexes();
        config
    }
}

impl Config {
    /// Загрузка из TOML-файла с переопределениями из окружения (`FOCUS_SWAP_SWAP__MODE=push`).
    /// Отсутствующий файл не является ошибкой - используются значения по умолчанию.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FOCUS_SWAP_").split("__"));

        Self::from_figment(figment)
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))
    }

    #[allow(dead_code)]
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: Config = figment.extract()?;

        config.validate()?;
        config.build_lookup_indexes();

        Ok(config)
    }

    /// Нормализует blocklist: trim + lowercase, пустые элементы отбрасываются
    pub fn build_lookup_indexes(&mut self) {
        self.blocklist_lower = self
            .swap
            .app_blocklist
            .iter()
            .map(|entry| entry.trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.swap.fixed_target_monitor > MAX_FIXED_TARGET_MONITOR {
            anyhow::bail!(
                "fixed_target_monitor должно быть не больше {}",
                MAX_FIXED_TARGET_MONITOR
            );
        }

        if self.timing.settle_delay_ms > MAX_DELAY_MS {
            anyhow::bail!("settle_delay_ms должно быть не больше {}", MAX_DELAY_MS);
        }

        if self.timing.retry_delay_ms > MAX_DELAY_MS {
            anyhow::bail!("retry_delay_ms должно быть не больше {}", MAX_DELAY_MS);
        }

        if self.timing.retry_count > MAX_RETRY_COUNT {
            anyhow::bail!("retry_count должно быть не больше {}", MAX_RETRY_COUNT);
        }

        if self.sway.swaymsg.trim().is_empty() {
            anyhow::bail!("Путь к swaymsg не может быть пустым");
        }

        Ok(())
    }

    /// Проверка идентификатора приложения по blocklist (ожидается уже нормализованный id)
    pub fn is_blocklisted_id(&self, id: &str) -> bool {
        self.blocklist_lower.contains(id)
    }

    pub fn has_blocklist(&self) -> bool {
        !self.blocklist_lower.is_empty()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.timing.retry_delay_ms)
    }
}
