//! Checkout Collaborators
//!
//! The controllers never talk to the network or the page directly. Each
//! outside party sits behind a trait so a deployment (or a test) can plug in
//! its own implementation:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌─────────────────┐
//! │ DiscountSync │──▶│ PaymentProvider  │   │ CheckoutView    │
//! │ PaymentForm  │──▶│ AmountReconciler │   │ (page surface)  │
//! │              │──▶│ CheckoutBackend  │   │                 │
//! └──────────────┘   └──────────────────┘   └─────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    AuthorizationHandle, CacheCheckoutData, ConfirmResult, IntentSnapshot, LoyaltyPoints,
    PaymentDetails,
};

/// Payment provider operations available to the page
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Look up the intent behind a handle
    async fn retrieve_intent(&self, handle: &AuthorizationHandle) -> Result<IntentSnapshot>;

    /// Confirm a card payment.
    ///
    /// A refusal the customer should see is `Ok(ConfirmResult::Declined)`;
    /// `Err` is reserved for failures to reach the provider at all.
    async fn confirm_card_payment(
        &self,
        handle: &AuthorizationHandle,
        details: &PaymentDetails,
    ) -> Result<ConfirmResult>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Changes the amount of a pending authorization (Strategy pattern)
///
/// One implementation goes through the storefront backend, another talks to
/// the provider directly. Deployments pick one explicitly.
#[async_trait]
pub trait AmountReconciler: Send + Sync {
    /// Set the authorized amount, in minor units.
    ///
    /// Returns the handle to use from now on when the provider issued one.
    async fn reconcile(
        &self,
        handle: &AuthorizationHandle,
        amount: i64,
    ) -> Result<Option<AuthorizationHandle>>;

    fn name(&self) -> &str;
}

/// Storefront backend endpoints used during submission
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Stash form metadata with the backend before payment is confirmed
    async fn cache_checkout_data(&self, data: &CacheCheckoutData) -> Result<()>;
}

/// The parts of the checkout page the controllers write to
///
/// Implementations must treat a missing element as a no-op.
pub trait CheckoutView: Send + Sync {
    /// Mirror points into the hidden form field
    fn set_hidden_points(&self, points: LoyaltyPoints);

    /// Show the discount text (e.g. `$2.50`)
    fn show_discount(&self, text: &str);

    /// Render an inline card error, or clear it with `None`
    fn show_card_error(&self, message: Option<&str>);

    /// Enable or disable the card element and the submit control together
    fn set_form_enabled(&self, enabled: bool);

    /// Flip visibility of the form and the loading overlay
    fn toggle_loading_overlay(&self);

    /// Reload the whole page, discarding in-progress state
    fn reload(&self);

    /// Submit the checkout form to the server
    fn submit_form(&self);
}
