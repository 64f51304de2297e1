//! Razorpay integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::AppError;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// Gateway order ("payment intent") as returned by the orders API.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
}

#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
        }
    }

    /// Create a gateway order for `amount_minor` paise. No local side effect,
    /// safe to retry.
    pub async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
        notes: Option<&serde_json::Value>,
    ) -> Result<GatewayOrder, AppError> {
        let mut body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
        });
        if let Some(notes) = notes {
            body["notes"] = notes.clone();
        }

        let resp = self
            .http
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("gateway unreachable: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "gateway order creation failed ({status}): {detail}"
            )));
        }

        resp.json::<GatewayOrder>()
            .await
            .map_err(|e| AppError::Gateway(format!("unexpected gateway response: {e}")))
    }

    pub fn verify_signature(&self, intent_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(&self.key_secret, intent_id, payment_id, signature)
    }
}

/// Verify a checkout confirmation: HMAC-SHA256 over `"{intent_id}|{payment_id}"`
/// keyed with the gateway secret, hex-encoded by the gateway.
pub fn verify_signature(secret: &str, intent_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{intent_id}|{payment_id}").as_bytes());

    // Decode hex signature and compare in constant time via verify_slice
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    mac.verify_slice(&sig_bytes).is_ok()
}
