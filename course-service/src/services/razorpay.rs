//! Razorpay payment provider client.
//!
//! Implements Razorpay's Orders API for payment initiation and
//! signature verification for payment confirmation.

use crate::config::RazorpayConfig;
use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Razorpay client for interacting with the Razorpay API.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

/// Request to create a Razorpay order.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in the smallest currency unit (paise for INR).
    pub amount: u64,
    /// Currency code (e.g., "INR").
    pub currency: String,
    /// Receipt ID for tracking.
    pub receipt: String,
}

/// Order minted by Razorpay.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderOrder {
    /// Razorpay order ID.
    pub id: String,
    /// Entity type (always "order").
    pub entity: String,
    /// Amount in smallest currency unit.
    pub amount: u64,
    /// Currency code.
    pub currency: String,
    /// Receipt ID.
    pub receipt: Option<String>,
    /// Order status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: u64,
}

/// Razorpay API error response.
#[derive(Debug, Deserialize)]
pub struct RazorpayError {
    pub error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayErrorDetail {
    pub code: String,
    pub description: String,
}

/// Payment verification parameters submitted by the client after checkout.
#[derive(Debug)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

impl RazorpayClient {
    /// Create a new Razorpay client with a bounded request timeout.
    pub fn new(config: RazorpayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// Razorpay key id, needed by frontends to initialize checkout.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Create a new order in Razorpay.
    ///
    /// # Arguments
    /// * `amount` - Amount in smallest currency unit (paise for INR)
    /// * `currency` - Currency code (e.g., "INR")
    /// * `receipt` - Receipt ID for tracking
    pub async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: String,
    ) -> Result<ProviderOrder> {
        let request = CreateOrderRequest {
            amount,
            currency: currency.to_string(),
            receipt,
        };

        let url = format!("{}/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Razorpay create_order response");

        if status.is_success() {
            let order: ProviderOrder = serde_json::from_str(&body)?;
            tracing::info!(
                order_id = %order.id,
                amount = order.amount,
                currency = %order.currency,
                "Razorpay order created"
            );
            Ok(order)
        } else {
            let error: RazorpayError =
                serde_json::from_str(&body).unwrap_or_else(|_| RazorpayError {
                    error: RazorpayErrorDetail {
                        code: "UNKNOWN".to_string(),
                        description: body.clone(),
                    },
                });
            tracing::error!(
                code = %error.error.code,
                description = %error.error.description,
                "Razorpay order creation failed"
            );
            Err(anyhow!(
                "Razorpay error: {} - {}",
                error.error.code,
                error.error.description
            ))
        }
    }

    /// Verify a payment signature from Razorpay checkout.
    ///
    /// The signature is computed as
    /// `hex(HMAC-SHA256(key_secret, order_id + "|" + payment_id))` and
    /// compared in constant time. This is the sole trust boundary between
    /// "payment claims to have happened" and "payment grants access".
    pub fn verify_payment_signature(&self, verification: &PaymentVerification) -> bool {
        let payload = format!(
            "{}|{}",
            verification.razorpay_order_id, verification.razorpay_payment_id
        );

        let expected_signature =
            compute_signature(&payload, self.config.key_secret.expose_secret());

        let is_valid: bool = expected_signature
            .as_bytes()
            .ct_eq(verification.razorpay_signature.as_bytes())
            .into();

        if is_valid {
            tracing::info!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verified"
            );
        } else {
            tracing::warn!(
                order_id = %verification.razorpay_order_id,
                payment_id = %verification.razorpay_payment_id,
                "Payment signature verification failed"
            );
        }

        is_valid
    }
}

/// Compute a hex-encoded HMAC-SHA256 signature.
fn compute_signature(payload: &str, secret: &str) -> String {
    type HmacSha256 = Hmac<Sha256>;
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_client(secret: &str) -> RazorpayClient {
        RazorpayClient::new(RazorpayConfig {
            key_id: "rzp_test_123".to_string(),
            key_secret: Secret::new(secret.to_string()),
            api_base_url: "https://api.razorpay.com/v1".to_string(),
            timeout_seconds: 10,
        })
        .unwrap()
    }

    #[test]
    fn correct_signature_verifies() {
        let client = test_client("my_secret_key");

        let expected = compute_signature("order_123|pay_456", "my_secret_key");
        let verification = PaymentVerification {
            razorpay_order_id: "order_123".to_string(),
            razorpay_payment_id: "pay_456".to_string(),
            razorpay_signature: expected,
        };

        assert!(client.verify_payment_signature(&verification));
    }

    #[test]
    fn any_single_byte_mutation_fails() {
        let client = test_client("my_secret_key");
        let good = compute_signature("order_123|pay_456", "my_secret_key");

        for i in 0..good.len() {
            let mut bytes = good.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();

            let verification = PaymentVerification {
                razorpay_order_id: "order_123".to_string(),
                razorpay_payment_id: "pay_456".to_string(),
                razorpay_signature: mutated,
            };
            assert!(!client.verify_payment_signature(&verification));
        }
    }

    #[test]
    fn signature_for_wrong_secret_fails() {
        let client = test_client("my_secret_key");

        let forged = compute_signature("order_123|pay_456", "attacker_guess");
        let verification = PaymentVerification {
            razorpay_order_id: "order_123".to_string(),
            razorpay_payment_id: "pay_456".to_string(),
            razorpay_signature: forged,
        };

        assert!(!client.verify_payment_signature(&verification));
    }

    #[test]
    fn truncated_signature_fails() {
        let client = test_client("my_secret_key");

        let mut truncated = compute_signature("order_123|pay_456", "my_secret_key");
        truncated.pop();
        let verification = PaymentVerification {
            razorpay_order_id: "order_123".to_string(),
            razorpay_payment_id: "pay_456".to_string(),
            razorpay_signature: truncated,
        };

        assert!(!client.verify_payment_signature(&verification));
    }
}
