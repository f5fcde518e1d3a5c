//! Checkout Configuration
//!
//! Read from environment variables (a `.env` file is loaded by the binary).

use std::str::FromStr;
use std::sync::Arc;

use checkout_core::{AmountReconciler, PageData};

use crate::amount_update::StripeAmountUpdater;
use crate::backend::BackendClient;
use crate::error::{PaymentError, Result};
use crate::stripe_js::{StripeJsClient, STRIPE_API_BASE};

/// Where amount updates are sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountSyncMode {
    /// Through the storefront backend (default)
    Backend,
    /// Straight to Stripe with the secret key
    Provider,
}

impl FromStr for AmountSyncMode {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "backend" => Ok(AmountSyncMode::Backend),
            "provider" | "direct" => Ok(AmountSyncMode::Provider),
            other => Err(PaymentError::Config(format!("unknown AMOUNT_SYNC_MODE: {other}"))),
        }
    }
}

/// Checkout client configuration
#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    /// Storefront base URL
    pub base_url: String,

    /// Stripe publishable key
    pub stripe_public_key: String,

    /// Stripe API host
    pub stripe_api_base: String,

    /// Stripe secret key, only for `AmountSyncMode::Provider`
    pub stripe_secret_key: Option<String>,

    pub csrf_token: String,

    pub amount_sync: AmountSyncMode,

    /// Page data as the template would render it
    pub client_secret: String,
    pub order_total: String,
}

impl CheckoutConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let stripe_public_key = lookup("STRIPE_PUBLIC_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaymentError::Config("STRIPE_PUBLIC_KEY not set".into()))?;

        let amount_sync: AmountSyncMode = lookup("AMOUNT_SYNC_MODE").unwrap_or_default().parse()?;

        let stripe_secret_key = lookup("STRIPE_SECRET_KEY").filter(|k| !k.trim().is_empty());
        if amount_sync == AmountSyncMode::Provider && stripe_secret_key.is_none() {
            return Err(PaymentError::Config(
                "AMOUNT_SYNC_MODE=provider requires STRIPE_SECRET_KEY".into(),
            ));
        }

        Ok(Self {
            base_url: lookup("CHECKOUT_BASE_URL").unwrap_or_else(|| "http://localhost:8000".into()),
            stripe_public_key,
            stripe_api_base: lookup("STRIPE_API_BASE").unwrap_or_else(|| STRIPE_API_BASE.into()),
            stripe_secret_key,
            csrf_token: lookup("CHECKOUT_CSRF_TOKEN").unwrap_or_default(),
            amount_sync,
            client_secret: lookup("CHECKOUT_CLIENT_SECRET").unwrap_or_default(),
            order_total: lookup("CHECKOUT_ORDER_TOTAL").unwrap_or_else(|| "0.00".into()),
        })
    }

    /// Page data built from the configured values
    pub fn page_data(&self) -> checkout_core::Result<PageData> {
        PageData::from_embedded(&self.stripe_public_key, &self.client_secret, &self.order_total)
    }

    pub fn provider(&self) -> StripeJsClient {
        StripeJsClient::new(&self.stripe_public_key).with_api_base(&self.stripe_api_base)
    }

    pub fn backend(&self) -> BackendClient {
        BackendClient::new(&self.base_url, &self.csrf_token)
    }

    /// The amount reconciler selected by `amount_sync`
    pub fn reconciler(&self) -> Result<Arc<dyn AmountReconciler>> {
        match self.amount_sync {
            AmountSyncMode::Backend => Ok(Arc::new(self.backend())),
            AmountSyncMode::Provider => {
                let secret = self.stripe_secret_key.as_deref().ok_or_else(|| {
                    PaymentError::Config("STRIPE_SECRET_KEY not set".into())
                })?;
                Ok(Arc::new(StripeAmountUpdater::new(secret)))
            }
        }
    }
}
