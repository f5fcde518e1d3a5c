//! Stripe Client-Side API
//!
//! The calls Stripe.js makes from a checkout page, authenticated with the
//! publishable key and the intent's client secret. No secret key is needed,
//! so this client is safe to run wherever the page runs.

use async_trait::async_trait;
use serde::Deserialize;

use checkout_core::{
    AuthorizationHandle, ConfirmResult, IntentSnapshot, IntentStatus, PaymentDetails,
    PaymentProvider, Result as CheckoutResult,
};

use crate::error::{PaymentError, Result};

/// Default Stripe API host
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Publishable-key Stripe client
pub struct StripeJsClient {
    http: reqwest::Client,
    api_base: String,
    publishable_key: String,
}

impl StripeJsClient {
    pub fn new(publishable_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: STRIPE_API_BASE.into(),
            publishable_key: publishable_key.to_string(),
        }
    }

    /// Point at another API host (test servers, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn intent_url(&self, handle: &AuthorizationHandle) -> String {
        format!("{}/v1/payment_intents/{}", self.api_base, handle.intent_id())
    }

    async fn retrieve(&self, handle: &AuthorizationHandle) -> Result<IntentSnapshot> {
        let response = self
            .http
            .get(self.intent_url(handle))
            .bearer_auth(&self.publishable_key)
            .query(&[("client_secret", handle.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Stripe(error_message(&body).unwrap_or_else(|| {
                format!("payment intent lookup failed with {status}")
            })));
        }

        let intent: IntentBody = response.json().await?;
        Ok(intent.into())
    }

    async fn confirm(
        &self,
        handle: &AuthorizationHandle,
        details: &PaymentDetails,
    ) -> Result<ConfirmResult> {
        let response = self
            .http
            .post(format!("{}/confirm", self.intent_url(handle)))
            .bearer_auth(&self.publishable_key)
            .form(&confirm_params(handle, details))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let intent: IntentBody = serde_json::from_str(&body)
                .map_err(|e| PaymentError::Decode(format!("confirm response: {e}")))?;
            return Ok(ConfirmResult::Completed { status: intent.status });
        }

        // Card errors and validation errors come back as 4xx with a message
        // meant for the customer. Anything else is the provider failing.
        match error_message(&body) {
            Some(message) if status.is_client_error() => Ok(ConfirmResult::Declined { message }),
            message => Err(PaymentError::Stripe(
                message.unwrap_or_else(|| format!("confirmation failed with {status}")),
            )),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeJsClient {
    async fn retrieve_intent(&self, handle: &AuthorizationHandle) -> CheckoutResult<IntentSnapshot> {
        Ok(self.retrieve(handle).await?)
    }

    async fn confirm_card_payment(
        &self,
        handle: &AuthorizationHandle,
        details: &PaymentDetails,
    ) -> CheckoutResult<ConfirmResult> {
        Ok(self.confirm(handle, details).await?)
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    status: IntentStatus,
    amount: i64,
}

impl From<IntentBody> for IntentSnapshot {
    fn from(body: IntentBody) -> Self {
        IntentSnapshot {
            id: body.id,
            status: body.status,
            amount: body.amount,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
}

/// Form fields for `POST /v1/payment_intents/{id}/confirm`.
///
/// The card element hands over a card token; it is always sent as payment
/// method data so the billing details travel with the card.
fn confirm_params(handle: &AuthorizationHandle, details: &PaymentDetails) -> Vec<(String, String)> {
    let mut params = vec![("client_secret".to_string(), handle.as_str().to_string())];
    let mut push = |key: &str, value: &str| params.push((key.to_string(), value.to_string()));

    let billing = &details.billing;
    push("payment_method_data[type]", "card");
    push("payment_method_data[card][token]", &details.payment_method);
    push("payment_method_data[billing_details][name]", &billing.name);
    push("payment_method_data[billing_details][phone]", &billing.phone);
    push("payment_method_data[billing_details][email]", &billing.email);
    push("payment_method_data[billing_details][address][line1]", &billing.address.line1);
    push("payment_method_data[billing_details][address][line2]", &billing.address.line2);
    push("payment_method_data[billing_details][address][city]", &billing.address.city);
    push("payment_method_data[billing_details][address][country]", &billing.address.country);
    push("payment_method_data[billing_details][address][state]", &billing.address.state);

    let shipping = &details.shipping;
    push("shipping[name]", &shipping.name);
    push("shipping[phone]", &shipping.phone);
    push("shipping[address][line1]", &shipping.address.line1);
    push("shipping[address][line2]", &shipping.address.line2);
    push("shipping[address][city]", &shipping.address.city);
    push("shipping[address][country]", &shipping.address.country);
    if let Some(postal_code) = &shipping.address.postal_code {
        push("shipping[address][postal_code]", postal_code);
    }
    push("shipping[address][state]", &shipping.address.state);

    params
}
