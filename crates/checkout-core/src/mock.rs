//! Mock Collaborators
//!
//! For testing and demo purposes. Each mock records what it was asked to do
//! and can be told to fail or answer slowly.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CheckoutError, Result};
use crate::model::{
    AuthorizationHandle, CacheCheckoutData, ConfirmResult, IntentSnapshot, IntentStatus,
    LoyaltyPoints, PaymentDetails,
};
use crate::provider::{AmountReconciler, CheckoutBackend, CheckoutView, PaymentProvider};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock payment provider with a fixed intent status
pub struct MockPaymentProvider {
    status: Mutex<IntentStatus>,
    confirm_result: Mutex<ConfirmResult>,
    fail_retrieve: Mutex<bool>,
    fail_confirm: Mutex<bool>,
    retrieved: Mutex<Vec<String>>,
    confirms: Mutex<Vec<(String, PaymentDetails)>>,
}

impl MockPaymentProvider {
    pub fn new(status: IntentStatus) -> Self {
        Self {
            status: Mutex::new(status),
            confirm_result: Mutex::new(ConfirmResult::Completed { status: IntentStatus::Succeeded }),
            fail_retrieve: Mutex::new(false),
            fail_confirm: Mutex::new(false),
            retrieved: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, status: IntentStatus) {
        *lock(&self.status) = status;
    }

    pub fn set_confirm_result(&self, result: ConfirmResult) {
        *lock(&self.confirm_result) = result;
    }

    pub fn fail_retrieve(&self) {
        *lock(&self.fail_retrieve) = true;
    }

    pub fn fail_confirm(&self) {
        *lock(&self.fail_confirm) = true;
    }

    pub fn retrieve_count(&self) -> usize {
        lock(&self.retrieved).len()
    }

    /// Handles passed to `retrieve_intent`, in call order
    pub fn retrieved_handles(&self) -> Vec<String> {
        lock(&self.retrieved).clone()
    }

    pub fn confirm_calls(&self) -> Vec<(String, PaymentDetails)> {
        lock(&self.confirms).clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn retrieve_intent(&self, handle: &AuthorizationHandle) -> Result<IntentSnapshot> {
        lock(&self.retrieved).push(handle.as_str().to_string());

        if *lock(&self.fail_retrieve) {
            return Err(CheckoutError::Network("mock retrieve failure".into()));
        }

        Ok(IntentSnapshot {
            id: handle.intent_id().to_string(),
            status: lock(&self.status).clone(),
            amount: 0,
        })
    }

    async fn confirm_card_payment(
        &self,
        handle: &AuthorizationHandle,
        details: &PaymentDetails,
    ) -> Result<ConfirmResult> {
        lock(&self.confirms).push((handle.as_str().to_string(), details.clone()));

        if *lock(&self.fail_confirm) {
            return Err(CheckoutError::Network("mock confirm failure".into()));
        }

        Ok(lock(&self.confirm_result).clone())
    }

    fn name(&self) -> &str {
        "MockProvider"
    }
}

/// How the mock reconciler answers with handles
#[derive(Clone, Debug)]
enum Reissue {
    Never,
    Fixed(String),
    PerAmount,
}

/// Mock amount reconciler
pub struct MockReconciler {
    reissue: Mutex<Reissue>,
    fail_status: Mutex<Option<u16>>,
    delays: Mutex<HashMap<i64, Duration>>,
    calls: Mutex<Vec<(String, i64)>>,
}

impl Default for MockReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReconciler {
    pub fn new() -> Self {
        Self {
            reissue: Mutex::new(Reissue::Never),
            fail_status: Mutex::new(None),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every update with this handle
    pub fn reissue_handles(&self, handle: &str) {
        *lock(&self.reissue) = Reissue::Fixed(handle.to_string());
    }

    /// Answer with `<intent id>_secret_<amount>`
    pub fn reissue_per_amount(&self) {
        *lock(&self.reissue) = Reissue::PerAmount;
    }

    /// Answer updates with a backend error status
    pub fn fail_with_status(&self, status: u16) {
        *lock(&self.fail_status) = Some(status);
    }

    /// Hold updates for `amount` before answering
    pub fn delay_amount(&self, amount: i64, delay: Duration) {
        lock(&self.delays).insert(amount, delay);
    }

    /// `(handle, amount)` pairs, in call order
    pub fn calls(&self) -> Vec<(String, i64)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl AmountReconciler for MockReconciler {
    async fn reconcile(
        &self,
        handle: &AuthorizationHandle,
        amount: i64,
    ) -> Result<Option<AuthorizationHandle>> {
        lock(&self.calls).push((handle.as_str().to_string(), amount));

        let delay = lock(&self.delays).get(&amount).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = *lock(&self.fail_status) {
            return Err(CheckoutError::Backend {
                status,
                body: "{\"error\": \"Payment processing error\"}".into(),
            });
        }

        let reissue = lock(&self.reissue).clone();
        Ok(match reissue {
            Reissue::Never => None,
            Reissue::Fixed(h) => Some(AuthorizationHandle::new(h)),
            Reissue::PerAmount => Some(AuthorizationHandle::new(format!(
                "{}_secret_{}",
                handle.intent_id(),
                amount
            ))),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock storefront backend
pub struct MockBackend {
    fail_status: Mutex<Option<u16>>,
    calls: Mutex<Vec<CacheCheckoutData>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            fail_status: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with_status(&self, status: u16) {
        *lock(&self.fail_status) = Some(status);
    }

    pub fn calls(&self) -> Vec<CacheCheckoutData> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CheckoutBackend for MockBackend {
    async fn cache_checkout_data(&self, data: &CacheCheckoutData) -> Result<()> {
        lock(&self.calls).push(data.clone());

        match *lock(&self.fail_status) {
            Some(status) => Err(CheckoutError::Backend { status, body: String::new() }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    hidden_points: Option<LoyaltyPoints>,
    discount_text: Option<String>,
    card_error: Option<String>,
    form_enabled: Option<bool>,
    overlay_visible: bool,
    reloads: usize,
    submits: usize,
}

/// View that records the last value written to each element
#[derive(Debug, Default)]
pub struct RecordingView {
    state: Mutex<ViewState>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden_points(&self) -> Option<LoyaltyPoints> {
        lock(&self.state).hidden_points
    }

    pub fn discount_text(&self) -> Option<String> {
        lock(&self.state).discount_text.clone()
    }

    pub fn card_error(&self) -> Option<String> {
        lock(&self.state).card_error.clone()
    }

    pub fn form_enabled(&self) -> Option<bool> {
        lock(&self.state).form_enabled
    }

    pub fn overlay_visible(&self) -> bool {
        lock(&self.state).overlay_visible
    }

    pub fn reload_count(&self) -> usize {
        lock(&self.state).reloads
    }

    pub fn submit_count(&self) -> usize {
        lock(&self.state).submits
    }
}

impl CheckoutView for RecordingView {
    fn set_hidden_points(&self, points: LoyaltyPoints) {
        lock(&self.state).hidden_points = Some(points);
    }

    fn show_discount(&self, text: &str) {
        lock(&self.state).discount_text = Some(text.to_string());
    }

    fn show_card_error(&self, message: Option<&str>) {
        lock(&self.state).card_error = message.map(str::to_string);
    }

    fn set_form_enabled(&self, enabled: bool) {
        lock(&self.state).form_enabled = Some(enabled);
    }

    fn toggle_loading_overlay(&self) {
        let mut state = lock(&self.state);
        state.overlay_visible = !state.overlay_visible;
    }

    fn reload(&self) {
        lock(&self.state).reloads += 1;
    }

    fn submit_form(&self) {
        lock(&self.state).submits += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_reconciler_per_amount_handles() {
        let reconciler = MockReconciler::new();
        reconciler.reissue_per_amount();

        let handle = AuthorizationHandle::new("pi_7_secret_x");
        let new_handle = reconciler.reconcile(&handle, 1250).await.unwrap();

        assert_eq!(new_handle.unwrap().as_str(), "pi_7_secret_1250");
        assert_eq!(reconciler.calls(), vec![("pi_7_secret_x".to_string(), 1250)]);
    }

    #[test]
    fn test_recording_view_overlay_toggles() {
        let view = RecordingView::new();
        view.toggle_loading_overlay();
        assert!(view.overlay_visible());
        view.toggle_loading_overlay();
        assert!(!view.overlay_visible());
    }
}
