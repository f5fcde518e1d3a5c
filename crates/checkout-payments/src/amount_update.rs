//! Direct Amount Updates
//!
//! Updates an intent's amount straight through the Stripe API with the
//! secret key. Only for deployments where the page runs next to the secret
//! key; browser deployments go through `BackendClient` instead.

use async_trait::async_trait;
use stripe::{Client, PaymentIntent, PaymentIntentId, UpdatePaymentIntent};

use checkout_core::{AmountReconciler, AuthorizationHandle, Result as CheckoutResult};

use crate::error::{PaymentError, Result};

/// Stripe client wrapper for amount updates
pub struct StripeAmountUpdater {
    client: Client,
}

impl StripeAmountUpdater {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    async fn update_amount(
        &self,
        handle: &AuthorizationHandle,
        amount: i64,
    ) -> Result<Option<AuthorizationHandle>> {
        let id: PaymentIntentId = handle
            .intent_id()
            .parse()
            .map_err(|e| PaymentError::Stripe(format!("invalid intent id: {e}")))?;

        let mut params = UpdatePaymentIntent::new();
        params.amount = Some(amount);

        let intent = PaymentIntent::update(&self.client, &id, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::debug!(intent = %intent.id, amount = intent.amount, "Updated intent amount");

        Ok(intent.client_secret.and_then(|s| AuthorizationHandle::parse(&s)))
    }
}

#[async_trait]
impl AmountReconciler for StripeAmountUpdater {
    async fn reconcile(
        &self,
        handle: &AuthorizationHandle,
        amount: i64,
    ) -> CheckoutResult<Option<AuthorizationHandle>> {
        Ok(self.update_amount(handle, amount).await?)
    }

    fn name(&self) -> &str {
        "provider"
    }
}
