//! # checkout-payments
//!
//! Concrete collaborators for the checkout controllers in `checkout-core`.
//!
//! ## Amount Sync Strategies
//!
//! The discount controller keeps the intent amount in step with redeemed
//! points. Two ways to get there, picked per deployment with
//! `AMOUNT_SYNC_MODE`:
//!
//! ### 1. Backend-mediated (`backend`, default)
//!
//! ```text
//! ┌──────────────┐  JSON   ┌─────────────────┐  secret key  ┌────────┐
//! │ Checkout page│────────▶│ Storefront      │─────────────▶│ Stripe │
//! │ (pk only)    │◀────────│ update endpoint │◀─────────────│        │
//! └──────────────┘ secret  └─────────────────┘              └────────┘
//! ```
//!
//! The page only ever holds the publishable key.
//!
//! ### 2. Direct (`provider`)
//!
//! ```text
//! ┌──────────────┐  secret key  ┌────────┐
//! │ Checkout     │─────────────▶│ Stripe │
//! │ client       │◀─────────────│        │
//! └──────────────┘              └────────┘
//! ```
//!
//! For trusted environments that hold the secret key themselves.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_core::CheckoutPage;
//! use checkout_payments::CheckoutConfig;
//!
//! let config = CheckoutConfig::from_env()?;
//! let page = CheckoutPage::new(
//!     &config.page_data()?,
//!     Arc::new(config.provider()),
//!     config.reconciler()?,
//!     Arc::new(config.backend()),
//!     view,
//!     &config.csrf_token,
//! );
//!
//! page.discount.on_points_input("25").await;
//! ```

mod amount_update;
mod backend;
mod config;
mod error;
mod stripe_js;

#[cfg(test)]
mod test_server;

pub use amount_update::StripeAmountUpdater;
pub use backend::BackendClient;
pub use config::{AmountSyncMode, CheckoutConfig};
pub use error::{PaymentError, Result};
pub use stripe_js::{StripeJsClient, STRIPE_API_BASE};
