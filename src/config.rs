//! Merchant credentials and client settings.
//!
//! The merchant record lives in local storage under [`MERCHANT_CONFIG_KEY`]
//! and is sent along with every backend call. The backend base URL is fixed
//! at build time through `CHECKOUT_API_URL`.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::storage::{KeyValueStore, LocalArea};

pub const MERCHANT_CONFIG_KEY: &str = "merchantConfig";

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_GATEWAY_URL: &str = "https://mtf.gateway.mastercard.com";

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MerchantConfig {
    pub merchant_id: String,
    pub username: String,
    pub password: String,
    pub gateway_url: String,
    pub api_version: String,
    pub currency: String,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub merchant_url: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            merchant_id: String::new(),
            username: String::new(),
            password: String::new(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            api_version: "100".to_string(),
            currency: "USD".to_string(),
            merchant_name: "Test Merchant".to_string(),
            merchant_url: "https://example.com".to_string(),
        }
    }
}

impl fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("merchant_id", &self.merchant_id)
            .field("username", &self.username)
            .field("password", &"*** redacted ***")
            .field("gateway_url", &self.gateway_url)
            .field("api_version", &self.api_version)
            .field("currency", &self.currency)
            .field("merchant_name", &self.merchant_name)
            .field("merchant_url", &self.merchant_url)
            .finish()
    }
}

impl MerchantConfig {
    /// The gateway's public test merchant.
    pub fn test_credentials() -> Self {
        Self {
            merchant_id: "TESTMPGSTEST0101".to_string(),
            username: "merchant.TESTMPGSTEST0101".to_string(),
            password: "12acbd9acc25c2cc1dca44a1c2be2a9c".to_string(),
            ..Self::default()
        }
    }

    /// Merchant id, API username and API password are required.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let missing: Vec<&str> = [
            ("merchant ID", &self.merchant_id),
            ("API username", &self.username),
            ("API password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::InvalidConfig(format!("missing {}", missing.join(", "))))
        }
    }

    /// URL of the vendor hosted-session script for this merchant.
    pub fn hosted_script_url(&self) -> String {
        format!(
            "{}/form/version/{}/merchant/{}/session.js",
            self.gateway_url.trim_end_matches('/'),
            self.api_version,
            self.merchant_id
        )
    }
}

/// Reads and writes the merchant record.
#[derive(Clone)]
pub struct ConfigStore {
    storage: Rc<dyn KeyValueStore>,
}

impl PartialEq for ConfigStore {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }
}

impl ConfigStore {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn browser() -> Self {
        Self::new(Rc::new(LocalArea::new()))
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<MerchantConfig>, CheckoutError> {
        match self.storage.get(MERCHANT_CONFIG_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like [`ConfigStore::load`], but a missing record is an error.
    pub fn require(&self) -> Result<MerchantConfig, CheckoutError> {
        self.load()?.ok_or(CheckoutError::MissingConfig)
    }

    pub fn save(&self, config: &MerchantConfig) -> Result<(), CheckoutError> {
        config.validate()?;
        let raw = serde_json::to_string(config)?;
        self.storage.set(MERCHANT_CONFIG_KEY, &raw)?;
        log::info!("merchant configuration saved for {}", config.merchant_id);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CheckoutError> {
        self.storage.remove(MERCHANT_CONFIG_KEY)
    }
}

/// Build-time settings of the client itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the merchant backend that talks to the gateway.
    pub api_url: String,
}

impl ClientSettings {
    pub fn from_env() -> Self {
        Self {
            api_url: option_env!("CHECKOUT_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_env()
    }
}
