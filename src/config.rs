use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub strategy: Strategy,
    pub required_fields: Vec<String>,
    pub note_label: String,
    pub crm: CrmConfig,
    pub webhook_url: Option<String>,
}

#[derive(Clone)]
pub struct CrmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub location_id: Option<String>,
    pub api_version: String,
    pub contact_source: Option<String>,
    pub contact_tags: Vec<String>,
    /// (submission key, CRM custom field id), in configured order.
    pub custom_fields: Vec<(String, String)>,
}

impl fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("location_id", &self.location_id)
            .field("api_version", &self.api_version)
            .field("contact_source", &self.contact_source)
            .field("contact_tags", &self.contact_tags)
            .field("custom_fields", &self.custom_fields)
            .finish()
    }
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CRM_BASE_URL.to_string(),
            api_key: None,
            location_id: None,
            api_version: DEFAULT_CRM_API_VERSION.to_string(),
            contact_source: None,
            contact_tags: Vec::new(),
            custom_fields: Vec::new(),
        }
    }
}

/// How a submission reaches the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Always create a contact.
    Direct,
    /// Look the contact up by email/phone, then update or create.
    Lookup,
    /// Hand the submission to an automation webhook.
    Webhook,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Lookup => "lookup",
            Strategy::Webhook => "webhook",
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Strategy::Direct),
            "lookup" => Ok(Strategy::Lookup),
            "webhook" => Ok(Strategy::Webhook),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

pub const DEFAULT_CRM_BASE_URL: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_CRM_API_VERSION: &str = "2021-07-28";
pub const DEFAULT_NOTE_LABEL: &str = "New Questionnaire Submission";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("RELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid RELAY_HOST: {e}"))?;

        let port: u16 = env_or("RELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid RELAY_PORT: {e}"))?;

        let max_body_size: usize = env_or("RELAY_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid RELAY_MAX_BODY_SIZE: {e}"))?;

        let strategy: Strategy = env_or("RELAY_STRATEGY", "lookup")
            .parse()
            .map_err(|e| format!("Invalid RELAY_STRATEGY: {e}"))?;

        let custom_fields = parse_custom_fields(&env_or("CRM_CUSTOM_FIELDS", ""))
            .map_err(|e| format!("Invalid CRM_CUSTOM_FIELDS: {e}"))?;

        let crm = CrmConfig {
            base_url: env_or("CRM_BASE_URL", DEFAULT_CRM_BASE_URL),
            api_key: env_optional("CRM_API_KEY"),
            location_id: env_optional("CRM_LOCATION_ID"),
            api_version: env_or("CRM_API_VERSION", DEFAULT_CRM_API_VERSION),
            contact_source: env_optional("CRM_CONTACT_SOURCE"),
            contact_tags: split_list(&env_or("CRM_CONTACT_TAGS", "")),
            custom_fields,
        };

        Ok(Config {
            host,
            port,
            max_body_size,
            cors_origins: split_list(&env_or("RELAY_CORS_ORIGINS", "")),
            log_level: env_or("RELAY_LOG_LEVEL", "info"),
            strategy,
            required_fields: split_list(&env_or("RELAY_REQUIRED_FIELDS", "")),
            note_label: env_or("RELAY_NOTE_LABEL", DEFAULT_NOTE_LABEL),
            crm,
            webhook_url: env_optional("RELAY_WEBHOOK_URL"),
        })
    }

    /// Names of the settings the selected strategy still needs.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self.strategy {
            Strategy::Direct | Strategy::Lookup => {
                if self.crm.api_key.is_none() {
                    missing.push("CRM_API_KEY");
                }
                if self.crm.location_id.is_none() {
                    missing.push("CRM_LOCATION_ID");
                }
            }
            Strategy::Webhook => {
                if self.webhook_url.is_none() {
                    missing.push("RELAY_WEBHOOK_URL");
                }
            }
        }
        missing
    }
}

/// Parse `formKey=fieldId,otherKey=otherId` pairs.
pub fn parse_custom_fields(raw: &str) -> Result<Vec<(String, String)>, String> {
    split_list(raw)
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, id)) if !key.trim().is_empty() && !id.trim().is_empty() => {
                Ok((key.trim().to_string(), id.trim().to_string()))
            }
            _ => Err(format!("expected key=fieldId, got '{pair}'")),
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
