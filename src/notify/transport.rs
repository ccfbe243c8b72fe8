//! Twilio-compatible message transport.
//!
//! Thin REST client over the provider's Messages endpoint. Constructed only
//! when credentials are configured; otherwise the dispatcher runs in
//! record-only mode.

use serde::Deserialize;

use crate::config::TwilioConfig;
use crate::models::enums::NotificationChannel;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("No sender configured for channel {0}")]
    ChannelUnavailable(&'static str),
}

/// Provider acknowledgement for a successful submission.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub provider_id: String,
    pub provider_status: String,
}

#[derive(Deserialize)]
struct TwilioMessageResponse {
    sid: String,
    status: String,
}

pub struct TwilioClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    sms_from: Option<String>,
    whatsapp_from: Option<String>,
    base_url: String,
}

impl TwilioClient {
    /// Build a client from configuration. Returns `None` when the account
    /// credentials are absent.
    pub fn from_config(cfg: &TwilioConfig) -> Option<Self> {
        let account_sid = cfg.account_sid.clone()?;
        let auth_token = cfg.auth_token.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            account_sid,
            auth_token,
            sms_from: cfg.sms_from.clone(),
            whatsapp_from: cfg.whatsapp_from.clone(),
            base_url: "https://api.twilio.com".to_string(),
        })
    }

    pub async fn send(
        &self,
        channel: NotificationChannel,
        to: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, TransportError> {
        let (from, to_addr) = match channel {
            NotificationChannel::Sms => (
                self.sms_from
                    .clone()
                    .ok_or(TransportError::ChannelUnavailable("SMS"))?,
                to.to_string(),
            ),
            NotificationChannel::WhatsApp => (
                whatsapp_address(
                    &self
                        .whatsapp_from
                        .clone()
                        .ok_or(TransportError::ChannelUnavailable("WHATSAPP"))?,
                ),
                whatsapp_address(to),
            ),
            NotificationChannel::Email => {
                return Err(TransportError::ChannelUnavailable("EMAIL"))
            }
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to_addr.as_str()), ("From", &from), ("Body", body)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Rejected {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: TwilioMessageResponse = response.json().await?;
        Ok(DeliveryReceipt {
            provider_id: parsed.sid,
            provider_status: parsed.status,
        })
    }
}

/// Ensure a phone number carries the `whatsapp:` scheme exactly once.
pub fn whatsapp_address(to: &str) -> String {
    if to.starts_with("whatsapp:") {
        to.to_string()
    } else {
        format!("whatsapp:{to}")
    }
}
