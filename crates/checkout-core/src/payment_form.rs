//! Payment Form Controller
//!
//! Card validation feedback and the submit sequence:
//!
//! ```text
//! submit ─▶ lock form ─▶ cache checkout data ──fail──▶ reload page
//!                               │
//!                               ▼
//!                        confirm card payment ──declined──▶ show error, unlock
//!                               │
//!                          succeeded
//!                               ▼
//!                          submit form
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::model::{
    CacheCheckoutData, CardChangeEvent, CheckoutForm, ConfirmResult, IntentStatus, LoyaltyPoints,
    PaymentDetails,
};
use crate::provider::{CheckoutBackend, CheckoutView, PaymentProvider};
use crate::session::SharedSession;

/// How a submit attempt ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Payment succeeded and the form was submitted
    Submitted,

    /// Cache step failed; the page was reloaded
    Reloaded,

    /// Provider refused the payment; form unlocked for another try
    Rejected { message: String },

    /// Provider finished in a state that is neither success nor refusal
    Incomplete { status: IntentStatus },

    /// Another submission was already running
    AlreadySubmitting,
}

/// Payment form controller
#[derive(Clone)]
pub struct PaymentForm {
    provider: Arc<dyn PaymentProvider>,
    backend: Arc<dyn CheckoutBackend>,
    view: Arc<dyn CheckoutView>,
    session: SharedSession,
    csrf_token: String,
}

impl PaymentForm {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        backend: Arc<dyn CheckoutBackend>,
        view: Arc<dyn CheckoutView>,
        session: SharedSession,
        csrf_token: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            backend,
            view,
            session,
            csrf_token: csrf_token.into(),
        }
    }

    /// Reflect card element validation inline
    pub fn on_card_change(&self, event: &CardChangeEvent) {
        self.view.show_card_error(event.error.as_deref());
    }

    /// Run the submit sequence once
    pub async fn submit(&self, form: &CheckoutForm) -> SubmitOutcome {
        let (page_view, handle) = {
            let mut session = self.session.lock().await;
            if session.submitting {
                tracing::debug!(page_view = %session.page_view, "Submit ignored, already submitting");
                return SubmitOutcome::AlreadySubmitting;
            }
            session.submitting = true;
            (session.page_view, session.handle().cloned())
        };

        self.view.set_form_enabled(false);
        self.view.toggle_loading_overlay();

        let points = LoyaltyPoints::parse(&form.loyalty_points);
        self.view.set_hidden_points(points);

        let Some(handle) = handle else {
            tracing::warn!(%page_view, error = %CheckoutError::MissingHandle, "Cannot cache checkout data, reloading page");
            self.view.reload();
            return SubmitOutcome::Reloaded;
        };

        let data = CacheCheckoutData {
            csrf_token: self.csrf_token.clone(),
            client_secret: handle.clone(),
            save_info: form.save_info,
            loyalty_points: points,
        };
        if let Err(e) = self.backend.cache_checkout_data(&data).await {
            tracing::warn!(%page_view, error = %e, "Caching checkout data failed, reloading page");
            self.view.reload();
            return SubmitOutcome::Reloaded;
        }

        let details = PaymentDetails::from_form(form);
        let result = match self.provider.confirm_card_payment(&handle, &details).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(%page_view, intent = handle.intent_id(), error = %e, "Card confirmation failed");
                ConfirmResult::Declined { message: e.user_message() }
            }
        };

        match result {
            ConfirmResult::Declined { message } => {
                tracing::info!(%page_view, intent = handle.intent_id(), "Card payment declined");
                self.view.show_card_error(Some(&message));
                self.view.toggle_loading_overlay();
                self.view.set_form_enabled(true);
                self.session.lock().await.submitting = false;
                SubmitOutcome::Rejected { message }
            }
            ConfirmResult::Completed { status: IntentStatus::Succeeded } => {
                tracing::info!(%page_view, intent = handle.intent_id(), %points, "Payment succeeded, submitting order");
                self.view.submit_form();
                SubmitOutcome::Submitted
            }
            ConfirmResult::Completed { status } => {
                tracing::warn!(
                    %page_view,
                    intent = handle.intent_id(),
                    %status,
                    "Confirmation finished without success"
                );
                SubmitOutcome::Incomplete { status }
            }
        }
    }
}
