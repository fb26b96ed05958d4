use serde::{Deserialize, Serialize};

use super::normalize_base_url;

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct GatewayEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

/// Checkout session handed back by the gateway's initialize endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeData {
    pub authorization_url: String,
    pub reference: String,
}

/// Transaction state reported by the gateway's verify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyData {
    pub status: String,
    pub reference: String,
    pub amount: Option<i64>,
}

impl VerifyData {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }

    /// Only `failed` and `reversed` are terminal failures. A pending or
    /// abandoned checkout may still complete, so callers keep polling.
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "reversed")
    }
}

/// Server-to-server client for the external payment gateway. Webhooks are
/// not used; callers verify by reference lookup.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl PaymentGatewayClient {
    pub fn new(base_url: String, secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&base_url),
            secret,
        }
    }

    pub async fn initialize(
        &self,
        email: &str,
        amount_minor: i64,
        currency: &str,
        reference: &str,
    ) -> Result<InitializeData, String> {
        let url = format!("{}/transaction/initialize", self.base_url);
        let body = InitializeBody {
            email,
            amount: amount_minor,
            currency,
            reference,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to initialize transaction: {}", text));
        }

        let envelope: GatewayEnvelope<InitializeData> =
            response.json().await.map_err(|e| e.to_string())?;
        match envelope.data {
            Some(data) if envelope.status => Ok(data),
            _ => Err(envelope
                .message
                .unwrap_or_else(|| "Gateway rejected the transaction".into())),
        }
    }

    pub async fn verify(&self, reference: &str) -> Result<VerifyData, String> {
        let url = format!("{}/transaction/verify/{}", self.base_url, reference);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to verify transaction: {}", text));
        }

        let envelope: GatewayEnvelope<VerifyData> =
            response.json().await.map_err(|e| e.to_string())?;
        match envelope.data {
            Some(data) if envelope.status => Ok(data),
            _ => Err(envelope
                .message
                .unwrap_or_else(|| "Gateway could not verify the transaction".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_data_success_flag() {
        let ok = VerifyData {
            status: "success".into(),
            reference: "ref".into(),
            amount: Some(5000),
        };
        assert!(ok.is_successful());

        let failed = VerifyData {
            status: "failed".into(),
            reference: "ref".into(),
            amount: None,
        };
        assert!(!failed.is_successful());
        assert!(failed.is_failed());
    }

    #[test]
    fn pending_checkout_is_not_terminal() {
        for status in ["pending", "abandoned", "ongoing", "queued"] {
            let verdict = VerifyData {
                status: status.into(),
                reference: "ref".into(),
                amount: None,
            };
            assert!(!verdict.is_successful());
            assert!(!verdict.is_failed());
        }
    }
}
