//! Loyalty Discount Sync
//!
//! Every edit of the loyalty points input recomputes the discount and, when
//! the intent can still change, asks for its amount to be updated. Sync is
//! best effort: failures are logged and never shown, because the server
//! re-validates the charged amount when the order is placed.
//!
//! Chains run concurrently and are neither cancelled nor de-duplicated. Each
//! takes a ticket when its input event arrives; a chain that finishes after a
//! later edit's result has been applied is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::model::{DiscountAmount, IntentStatus, LoyaltyPoints};
use crate::provider::{AmountReconciler, CheckoutView, PaymentProvider};
use crate::session::{PageViewId, SharedSession, SyncTicket};

/// How one sync chain ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Page has no authorization handle; only the display changed
    NoHandle,

    /// Intent was not in an amount-mutable state
    Skipped { status: IntentStatus },

    /// Amount updated and this chain's result applied
    Updated { amount: i64, handle_replaced: bool },

    /// Amount updated but a later chain had already applied its result
    Stale { ticket: SyncTicket },

    /// Status query or update failed; logged only
    Failed { error: String },
}

/// Discount-sync controller
#[derive(Clone)]
pub struct DiscountSync {
    provider: Arc<dyn PaymentProvider>,
    reconciler: Arc<dyn AmountReconciler>,
    view: Arc<dyn CheckoutView>,
    session: SharedSession,
    tickets: Arc<AtomicU64>,
}

/// A points edit already shown on the page, waiting for its amount update
pub struct PendingSync {
    sync: DiscountSync,
    ticket: SyncTicket,
    points: LoyaltyPoints,
    discount: DiscountAmount,
}

impl DiscountSync {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        reconciler: Arc<dyn AmountReconciler>,
        view: Arc<dyn CheckoutView>,
        session: SharedSession,
    ) -> Self {
        Self {
            provider,
            reconciler,
            view,
            session,
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Synchronous half of a points edit: update the display and take a
    /// ticket. Must be called in input order.
    pub fn begin(&self, raw: &str) -> PendingSync {
        let points = LoyaltyPoints::parse(raw);
        let discount = points.discount();

        self.view.set_hidden_points(points);
        self.view.show_discount(&discount.display_text());

        PendingSync {
            sync: self.clone(),
            ticket: self.tickets.fetch_add(1, Ordering::SeqCst) + 1,
            points,
            discount,
        }
    }

    /// Handle one change of the points input.
    ///
    /// The display and ticket are settled when this is called, not when the
    /// returned future is first polled, so the future may be spawned.
    pub fn on_points_input(&self, raw: &str) -> impl Future<Output = SyncOutcome> + Send + use<> {
        self.begin(raw).run()
    }
}

impl PendingSync {
    pub fn ticket(&self) -> SyncTicket {
        self.ticket
    }

    /// Query the intent and push the new amount
    pub async fn run(self) -> SyncOutcome {
        let Self { sync, ticket, points, discount } = self;

        let (page_view, handle, total) = {
            let session = sync.session.lock().await;
            (session.page_view, session.handle().cloned(), session.order_total)
        };

        let Some(handle) = handle else {
            tracing::debug!(%page_view, ticket, %points, "No authorization handle, display only");
            return SyncOutcome::NoHandle;
        };

        let amount = match total.authorized_amount(discount) {
            Ok(amount) => amount,
            Err(e) => return failed(page_view, ticket, "Amount calculation error", &e),
        };

        let intent = match sync.provider.retrieve_intent(&handle).await {
            Ok(intent) => intent,
            Err(e) => return failed(page_view, ticket, "PaymentIntent retrieve error", &e),
        };

        if !intent.status.is_amount_mutable() {
            tracing::debug!(
                %page_view,
                ticket,
                intent = %intent.id,
                status = %intent.status,
                "Intent is not amount-mutable, leaving it untouched"
            );
            return SyncOutcome::Skipped { status: intent.status };
        }

        let new_handle = match sync.reconciler.reconcile(&handle, amount).await {
            Ok(new_handle) => new_handle,
            Err(e) => return failed(page_view, ticket, "PaymentIntent update error", &e),
        };

        let mut session = sync.session.lock().await;
        let handle_replaced = new_handle.as_ref().is_some_and(|h| h != &handle);
        let applied = match new_handle {
            Some(new_handle) => session.apply_handle(ticket, new_handle),
            None => session.mark_applied(ticket),
        };

        if !applied {
            tracing::debug!(
                %page_view,
                ticket,
                applied_ticket = session.applied_ticket(),
                "Discarding result of superseded sync chain"
            );
            return SyncOutcome::Stale { ticket };
        }

        tracing::info!(
            %page_view,
            ticket,
            amount,
            %points,
            via = sync.reconciler.name(),
            handle_replaced,
            "Synced authorized amount"
        );

        SyncOutcome::Updated { amount, handle_replaced }
    }
}

fn failed(page_view: PageViewId, ticket: SyncTicket, what: &str, error: &CheckoutError) -> SyncOutcome {
    tracing::error!(
        %page_view,
        ticket,
        error = %error,
        retryable = error.is_retryable(),
        "{}",
        what
    );
    SyncOutcome::Failed { error: error.to_string() }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MockPaymentProvider, MockReconciler, RecordingView};
    use crate::model::{AuthorizationHandle, OrderTotal};
    use crate::session::{shared, CheckoutSession};
    use rust_decimal_macros::dec;

    struct Harness {
        provider: Arc<MockPaymentProvider>,
        reconciler: Arc<MockReconciler>,
        view: Arc<RecordingView>,
        session: SharedSession,
        sync: DiscountSync,
    }

    fn harness(status: IntentStatus, handle: Option<&str>) -> Harness {
        let provider = Arc::new(MockPaymentProvider::new(status));
        let reconciler = Arc::new(MockReconciler::new());
        let view = Arc::new(RecordingView::new());
        let session = shared(CheckoutSession::new(
            handle.map(AuthorizationHandle::new),
            OrderTotal::new(dec!(50.00)),
        ));
        let sync = DiscountSync::new(
            provider.clone(),
            reconciler.clone(),
            view.clone(),
            session.clone(),
        );
        Harness { provider, reconciler, view, session, sync }
    }

    #[tokio::test]
    async fn test_updates_amount_when_mutable() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));

        let outcome = h.sync.on_points_input("10").await;

        assert_eq!(outcome, SyncOutcome::Updated { amount: 4900, handle_replaced: false });
        assert_eq!(h.view.discount_text().as_deref(), Some("$1.00"));
        assert_eq!(h.view.hidden_points(), Some(LoyaltyPoints::new(10)));
        assert_eq!(h.reconciler.calls(), vec![("pi_1_secret_a".to_string(), 4900)]);
    }

    #[tokio::test]
    async fn test_every_mutable_status_triggers_update() {
        for status in [
            IntentStatus::RequiresPaymentMethod,
            IntentStatus::RequiresConfirmation,
            IntentStatus::RequiresAction,
        ] {
            let h = harness(status, Some("pi_1_secret_a"));
            h.sync.on_points_input("5").await;
            assert_eq!(h.reconciler.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_succeeded_intent_is_never_updated() {
        let h = harness(IntentStatus::Succeeded, Some("pi_1_secret_a"));

        for raw in ["0", "10", "250", "abc", "-4"] {
            let outcome = h.sync.on_points_input(raw).await;
            assert_eq!(outcome, SyncOutcome::Skipped { status: IntentStatus::Succeeded });
        }

        assert!(h.reconciler.calls().is_empty());
        assert_eq!(h.provider.retrieve_count(), 5);
    }

    #[tokio::test]
    async fn test_no_handle_only_updates_display() {
        let h = harness(IntentStatus::RequiresPaymentMethod, None);

        let outcome = h.sync.on_points_input("25").await;

        assert_eq!(outcome, SyncOutcome::NoHandle);
        assert_eq!(h.view.discount_text().as_deref(), Some("$2.50"));
        assert_eq!(h.provider.retrieve_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_counts_as_zero() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));

        h.sync.on_points_input("").await;

        assert_eq!(h.view.hidden_points(), Some(LoyaltyPoints::ZERO));
        assert_eq!(h.view.discount_text().as_deref(), Some("$0.00"));
        assert_eq!(h.reconciler.calls(), vec![("pi_1_secret_a".to_string(), 5000)]);
    }

    #[tokio::test]
    async fn test_new_handle_replaces_old_one() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));
        h.reconciler.reissue_handles("pi_1_secret_b");

        let outcome = h.sync.on_points_input("10").await;
        assert_eq!(outcome, SyncOutcome::Updated { amount: 4900, handle_replaced: true });

        h.sync.on_points_input("20").await;

        let calls = h.reconciler.calls();
        assert_eq!(calls[1].0, "pi_1_secret_b");
        assert_eq!(h.provider.retrieved_handles()[1], "pi_1_secret_b");
        assert_eq!(h.session.lock().await.handle().unwrap().as_str(), "pi_1_secret_b");
    }

    #[tokio::test]
    async fn test_failures_are_swallowed_and_display_kept() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));
        h.reconciler.fail_with_status(500);

        let outcome = h.sync.on_points_input("30").await;

        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert_eq!(h.view.discount_text().as_deref(), Some("$3.00"));
        assert!(h.view.card_error().is_none());
        assert_eq!(h.session.lock().await.handle().unwrap().as_str(), "pi_1_secret_a");
    }

    #[tokio::test]
    async fn test_retrieve_failure_skips_update() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));
        h.provider.fail_retrieve();

        let outcome = h.sync.on_points_input("30").await;

        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert!(h.reconciler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_order_responses_keep_latest_handle() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));
        h.reconciler.reissue_per_amount();
        // First edit answers slowly, second one quickly.
        h.reconciler.delay_amount(4900, Duration::from_millis(80));

        let first = tokio::spawn({
            let sync = h.sync.clone();
            async move { sync.on_points_input("10").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = h.sync.on_points_input("20").await;
        let first = first.await.unwrap();

        assert_eq!(second, SyncOutcome::Updated { amount: 4800, handle_replaced: true });
        assert!(matches!(first, SyncOutcome::Stale { ticket: 1 }));
        assert_eq!(
            h.session.lock().await.handle().unwrap().as_str(),
            "pi_1_secret_4800"
        );
    }

    #[tokio::test]
    async fn test_later_edit_wins_even_when_polled_first() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));
        h.reconciler.reissue_per_amount();
        h.reconciler.delay_amount(4900, Duration::from_millis(30));

        let first = h.sync.on_points_input("10");
        let second = h.sync.on_points_input("20");
        let (second, first) = tokio::join!(second, first);

        assert_eq!(second, SyncOutcome::Updated { amount: 4800, handle_replaced: true });
        assert_eq!(first, SyncOutcome::Stale { ticket: 1 });
        assert_eq!(h.view.discount_text().as_deref(), Some("$2.00"));
        assert_eq!(h.view.hidden_points(), Some(LoyaltyPoints::new(20)));
        assert_eq!(
            h.session.lock().await.handle().unwrap().as_str(),
            "pi_1_secret_4800"
        );
    }

    #[test]
    fn test_begin_hands_out_tickets_in_input_order() {
        let h = harness(IntentStatus::RequiresPaymentMethod, None);

        let a = h.sync.begin("1");
        let b = h.sync.clone().begin("2");

        assert_eq!((a.ticket(), b.ticket()), (1, 2));
        assert_eq!(h.view.discount_text().as_deref(), Some("$0.20"));
    }

    #[tokio::test]
    async fn test_updates_stop_once_intent_leaves_mutable_state() {
        let h = harness(IntentStatus::RequiresPaymentMethod, Some("pi_1_secret_a"));

        h.sync.on_points_input("10").await;
        h.provider.set_status(IntentStatus::Processing);
        let outcome = h.sync.on_points_input("20").await;

        assert_eq!(outcome, SyncOutcome::Skipped { status: IntentStatus::Processing });
        assert_eq!(h.reconciler.calls().len(), 1);
    }
}
