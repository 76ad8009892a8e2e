use std::time::Duration;

use crate::data_types::{BotConfig, User};
use crate::errors::MarkError;

pub const VALID_CODES: [&str; 8] = ["P", "PS", "PD", "S", "SD", "D", "PSD", "Niente"];

const MARK_ATTEMPTS: u32 = 3;
const MARK_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the canonical spelling of a lunch code, ignoring case.
pub fn normalize_code(code: &str) -> Result<&'static str, MarkError> {
    let code = code.trim();
    VALID_CODES
        .into_iter()
        .find(|valid| valid.eq_ignore_ascii_case(code))
        .ok_or_else(|| MarkError::InvalidCode(code.to_string()))
}

pub fn build_mark_url(template: &str, user: &str, food: &str) -> String {
    template.replace("<USER>", user).replace("<FOOD>", food)
}

/// Records lunches on the external lunch sheet.
#[derive(Clone)]
pub struct MarkClient {
    client: reqwest::Client,
    url_template: String,
}

impl MarkClient {
    pub fn new(url_template: impl Into<String>) -> Result<Self, MarkError> {
        let client = reqwest::Client::builder().timeout(MARK_TIMEOUT).build()?;
        Ok(MarkClient {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self, MarkError> {
        match &config.mark_url {
            Some(url) => MarkClient::new(url.as_str()),
            None => Err(MarkError::Unconfigured),
        }
    }

    pub async fn mark(&self, user: &User, food: &str) -> Result<(), MarkError> {
        if user.is_guest() {
            return Err(MarkError::MissingUser);
        }

        let url = build_mark_url(&self.url_template, &user.name, food);
        let mut attempt = 1;

        loop {
            match self.client.get(&url).send().await {
                Ok(resp) => {
                    log::debug!("Marked '{}' for {}: {}", food, user, resp.status());
                    return Ok(());
                }
                Err(e) if attempt < MARK_ATTEMPTS => {
                    log::warn!("Marking user {} failed: {}, retrying", user, e);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(MarkError::RequestFailed {
                        attempts: attempt,
                        source: e,
                    })
                }
            }
        }
    }
}
