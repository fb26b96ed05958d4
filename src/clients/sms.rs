use serde::Serialize;

use super::normalize_base_url;

#[derive(Debug, Serialize)]
struct SendSmsBody<'a> {
    to: &'a str,
    message: &'a str,
}

/// Outbound SMS for phone verification codes.
#[derive(Clone)]
pub struct SmsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SmsClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&base_url),
            api_key,
        }
    }

    pub async fn send_otp(&self, phone: &str, code: &str) -> Result<(), String> {
        let url = format!("{}/sms/send", self.base_url);
        let message = format!("Your verification code is {code}. It expires in 10 minutes.");
        let payload = SendSmsBody {
            to: phone,
            message: &message,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to send SMS: {}", text));
        }

        Ok(())
    }
}
