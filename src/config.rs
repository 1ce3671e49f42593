use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level engine configuration, loaded from TOML with env overrides.
/// Every section and field has a default, so an empty (or absent) file is a
/// valid configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RecallConfig {
    pub storage: StorageConfig,
    pub activation: ActivationTuning,
    pub intents: IntentThresholds,
    pub dispositions: DispositionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Global activation knobs shared by every intent.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActivationTuning {
    /// Per-hop attenuation factor, `< 1.0`.
    pub decay: f64,
    /// Multiplier replacing `decay` on current-chapter hops.
    pub chapter_boost: f64,
}

/// Output thresholds per recall intent. Broad, slow intents (lore, recall)
/// run deeper and more permissive; tactical intents (combat) stay narrow and
/// high-confidence.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IntentThresholds {
    pub lore: f64,
    pub recall: f64,
    pub dialogue: f64,
    pub combat: f64,
    /// Conservative fallback when the intent is absent or unrecognized.
    pub default: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DispositionConfig {
    /// Maximum history entries kept per (character, target) record.
    pub history_cap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive the embedding service hands to its
    /// subscriber (e.g. "info", "reverie=debug").
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "reverie.db".into(),
        }
    }
}

impl Default for ActivationTuning {
    fn default() -> Self {
        Self {
            decay: 0.7,
            chapter_boost: 0.95,
        }
    }
}

impl Default for IntentThresholds {
    fn default() -> Self {
        Self {
            lore: 0.1,
            recall: 0.15,
            dialogue: 0.2,
            combat: 0.35,
            default: 0.25,
        }
    }
}

impl Default for DispositionConfig {
    fn default() -> Self {
        Self { history_cap: 50 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl RecallConfig {
    /// Load from a specific path (missing file ⇒ defaults), then apply env
    /// var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RecallConfig::default()
        };

        config.apply_env_overrides();
        config.clamp_activation();
        Ok(config)
    }

    /// Apply environment variable overrides (`REVERIE_DB`,
    /// `REVERIE_LOG_LEVEL`).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REVERIE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("REVERIE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Activation factors must sit in `(0.0, 1.0]` — anything above 1.0
    /// amplifies instead of decaying and a cycle would grow without bound.
    /// Out-of-range values fall back to the defaults with a warning.
    fn clamp_activation(&mut self) {
        let defaults = ActivationTuning::default();
        self.activation.decay =
            valid_factor("decay", self.activation.decay, defaults.decay);
        self.activation.chapter_boost = valid_factor(
            "chapter_boost",
            self.activation.chapter_boost,
            defaults.chapter_boost,
        );
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.db_path)
    }
}

fn valid_factor(name: &str, value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        value
    } else {
        warn!(name, value, fallback, "activation factor outside (0, 1], using default");
        fallback
    }
}
