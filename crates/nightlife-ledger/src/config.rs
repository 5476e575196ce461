//! Configuration for the nightlife event ledger

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::constants;
use crate::model::{DealType, PaymentTerms};

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub user: Option<UserConfig>,
    #[serde(default)]
    pub defaults: Option<DefaultsConfig>,
}

/// Who is using the ledger. Events are stored and listed per user.
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Values pre-filled when creating events
#[derive(Debug, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub rumba_percentage: Option<f64>,
    #[serde(default)]
    pub deal_type: Option<DealType>,
    #[serde(default)]
    pub payment_terms: Option<PaymentTerms>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Missing [user] id\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Unknown deal_type or payment_terms labels\n\n\
             See config.toml.example for the expected format."
        })
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Resolved settings passed explicitly to whatever needs them
#[derive(Debug, Clone)]
pub struct Config {
    /// Owner of events created and listed by this session
    pub user_id: String,
    pub display_name: String,
    pub default_rumba_percentage: f64,
    pub default_deal_type: DealType,
    pub default_payment_terms: PaymentTerms,
}

impl Config {
    /// Resolve file values against built-in defaults
    pub fn from_file(file_config: &FileConfig) -> Result<Self> {
        let user_id = file_config
            .user
            .as_ref()
            .map(|u| u.id.trim().to_string())
            .unwrap_or_else(|| constants::DEFAULT_USER.to_string());
        if user_id.is_empty() {
            anyhow::bail!("[user] id in config.toml must not be empty");
        }

        let display_name = file_config
            .user
            .as_ref()
            .and_then(|u| u.display_name.clone())
            .unwrap_or_else(|| user_id.clone());

        let defaults = file_config.defaults.as_ref();
        let default_rumba_percentage = defaults
            .and_then(|d| d.rumba_percentage)
            .unwrap_or(constants::DEFAULT_RUMBA_PERCENTAGE);
        if !(0.0..=100.0).contains(&default_rumba_percentage) {
            anyhow::bail!(
                "[defaults] rumba_percentage must be between 0 and 100 (got {})",
                default_rumba_percentage
            );
        }

        Ok(Self {
            user_id,
            display_name,
            default_rumba_percentage,
            default_deal_type: defaults.and_then(|d| d.deal_type).unwrap_or_default(),
            default_payment_terms: defaults.and_then(|d| d.payment_terms).unwrap_or_default(),
        })
    }
}
