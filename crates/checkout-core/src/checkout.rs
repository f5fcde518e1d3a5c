//! Checkout Page Wiring

use std::sync::Arc;

use crate::discount_sync::DiscountSync;
use crate::page::PageData;
use crate::payment_form::PaymentForm;
use crate::provider::{AmountReconciler, CheckoutBackend, CheckoutView, PaymentProvider};
use crate::session::{shared, CheckoutSession, PageViewId};

/// One checkout page view: its session and both controllers
#[derive(Clone)]
pub struct CheckoutPage {
    page_view: PageViewId,
    pub discount: DiscountSync,
    pub payment: PaymentForm,
}

impl CheckoutPage {
    pub fn new(
        page: &PageData,
        provider: Arc<dyn PaymentProvider>,
        reconciler: Arc<dyn AmountReconciler>,
        backend: Arc<dyn CheckoutBackend>,
        view: Arc<dyn CheckoutView>,
        csrf_token: impl Into<String>,
    ) -> Self {
        let session = CheckoutSession::from_page(page);
        let page_view = session.page_view;
        let session = shared(session);

        tracing::info!(
            %page_view,
            provider = provider.name(),
            amount_sync = reconciler.name(),
            has_handle = page.client_secret.is_some(),
            total = %page.order_total.value(),
            "Checkout page loaded"
        );

        Self {
            discount: DiscountSync::new(provider.clone(), reconciler, view.clone(), session.clone()),
            payment: PaymentForm::new(provider, backend, view, session, csrf_token),
            page_view,
        }
    }

    pub fn page_view(&self) -> PageViewId {
        self.page_view
    }
}
