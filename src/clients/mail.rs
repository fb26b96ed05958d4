use serde::Serialize;

use super::normalize_base_url;

#[derive(Debug, Serialize)]
struct SendMailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Transactional email over the HTTP mail relay. Send failures after a
/// committed write are logged by callers, never fatal.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(base_url: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&base_url),
            api_key,
            from,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let url = format!("{}/send", self.base_url);
        let payload = SendMailBody {
            from: &self.from,
            to,
            subject,
            body,
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
            return Err(format!("Failed to send email: {}", text));
        }

        Ok(())
    }

    /// Initial credentials for a freshly registered listing owner.
    pub async fn send_password_email(
        &self,
        to: &str,
        full_name: &str,
        password: &str,
    ) -> Result<(), String> {
        let body = format!(
            "Hello {full_name},\n\nYour listing has been submitted for review. \
             You can sign in with this email address and the password: {password}\n\
             Please change it after your first login."
        );
        self.send(to, "Your account details", &body).await
    }

    pub async fn send_listing_approved(&self, to: &str, listing_name: &str) -> Result<(), String> {
        let body = format!(
            "Good news - your listing \"{listing_name}\" has been approved and is now live."
        );
        self.send(to, "Listing approved", &body).await
    }

    pub async fn send_listing_rejected(
        &self,
        to: &str,
        listing_name: &str,
        reason: &str,
    ) -> Result<(), String> {
        let body = format!(
            "Your listing \"{listing_name}\" was not approved.\n\nReason: {reason}"
        );
        self.send(to, "Listing rejected", &body).await
    }

    pub async fn send_reset_link(
        &self,
        to: &str,
        frontend_base_url: &str,
        token: &str,
    ) -> Result<(), String> {
        let body = format!(
            "A password reset was requested for your account.\n\n\
             Reset it here: {frontend_base_url}/reset-password/{token}\n\
             The link expires in one hour. If you did not request this, ignore this email."
        );
        self.send(to, "Password reset", &body).await
    }
}
