//! Outbound email client
//!
//! Thin wrapper over the external mail API. Sends are fire-and-forget:
//! a delivery failure is logged and never surfaced to the request that
//! triggered it.

use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::configuration::Config;

#[derive(Debug)]
pub struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct MailBody {
    from: String,
    to: String,
    subject: String,
    text: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Mailer {
        Mailer {
            client: Client::new(),
            api_url: config.email_api_url.to_owned(),
            api_key: config.email_api_key.to_owned(),
            from: config.email_from.to_owned(),
        }
    }

    pub async fn send(&self, to: String, subject: String, text: String) {
        let body = MailBody {
            from: self.from.to_owned(),
            to: to.to_owned(),
            subject,
            text,
        };

        let result = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("mail sent to {}", to);
            },
            Ok(response) => {
                error!("mail to {} rejected: {}", to, response.status());
            },
            Err(e) => {
                error!("mail to {} failed: {}", to, e);
            },
        }
    }
}
