//! Server configuration from environment variables.

use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Telecare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "telecare=info,tower_http=warn"
}

/// Get the application data directory (`TELECARE_DATA_DIR`, defaulting to
/// ~/Telecare — user-visible on purpose, like the uploads it contains).
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TELECARE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("Telecare")
}

/// Message provider credentials. All optional: with no account configured
/// the dispatcher records notifications without delivering them.
#[derive(Debug, Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub sms_from: Option<String>,
    pub whatsapp_from: Option<String>,
}

impl TwilioConfig {
    pub fn from_env() -> Self {
        Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok(),
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok(),
            sms_from: std::env::var("TWILIO_PHONE_NUMBER").ok(),
            whatsapp_from: std::env::var("TWILIO_WHATSAPP_NUMBER").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub frontend_origin: String,
    pub twilio: TwilioConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("TELECARE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let frontend_origin = std::env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());
        Self {
            data_dir: default_data_dir(),
            port,
            frontend_origin,
            twilio: TwilioConfig::from_env(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("telecare.db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_data_dir() {
        let cfg = ServerConfig {
            data_dir: PathBuf::from("/srv/telecare"),
            port: 3000,
            frontend_origin: "http://localhost:5173".into(),
            twilio: TwilioConfig::default(),
        };
        assert_eq!(cfg.db_path(), PathBuf::from("/srv/telecare/telecare.db"));
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/srv/telecare/uploads"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
