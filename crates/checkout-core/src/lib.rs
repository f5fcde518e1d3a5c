//! # checkout-core
//!
//! Controllers for a storefront checkout page that pays through a hosted card
//! element and lets customers redeem loyalty points.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CheckoutPage                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐  │
//! │  │ DiscountSync │  │ PaymentForm  │  │  CheckoutSession   │  │
//! │  │ points input │──│ card + submit│──│  handle, tickets   │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!          │ PaymentProvider · AmountReconciler · CheckoutBackend · CheckoutView
//! ```
//!
//! Each points edit recomputes the discount (`points × 0.10`) and, while the
//! intent is still amount-mutable, pushes the new amount to the provider.
//! Submission caches form metadata with the backend, confirms the card
//! payment, and only then submits the form.

pub mod checkout;
pub mod discount_sync;
pub mod error;
pub mod mock;
pub mod model;
pub mod page;
pub mod payment_form;
pub mod provider;
pub mod session;

pub use checkout::CheckoutPage;
pub use discount_sync::{DiscountSync, PendingSync, SyncOutcome};
pub use error::{CheckoutError, Result};
pub use model::{
    AuthorizationHandle, CacheCheckoutData, CardChangeEvent, CheckoutForm, ConfirmResult,
    DiscountAmount, IntentSnapshot, IntentStatus, LoyaltyPoints, OrderTotal, PaymentDetails,
};
pub use page::PageData;
pub use payment_form::{PaymentForm, SubmitOutcome};
pub use provider::{AmountReconciler, CheckoutBackend, CheckoutView, PaymentProvider};
pub use session::{CheckoutSession, PageViewId, SharedSession};
