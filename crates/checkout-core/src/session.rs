//! Checkout Session State
//!
//! Everything a checkout page view mutates lives in one `CheckoutSession`,
//! shared by the discount sync and payment form controllers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::model::{AuthorizationHandle, OrderTotal};
use crate::page::PageData;

/// Unique page view identifier, attached to every log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageViewId(Uuid);

impl PageViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticket handed to each discount sync chain, in input order
pub type SyncTicket = u64;

/// Mutable state of one checkout page view
#[derive(Clone, Debug)]
pub struct CheckoutSession {
    pub page_view: PageViewId,

    /// Current authorization handle, replaced when the provider reissues it
    handle: Option<AuthorizationHandle>,

    /// Order total rendered on the page
    pub order_total: OrderTotal,

    /// Highest ticket whose handle replacement was applied
    applied_ticket: SyncTicket,

    /// A full form submission is in flight
    pub submitting: bool,
}

impl CheckoutSession {
    pub fn new(handle: Option<AuthorizationHandle>, order_total: OrderTotal) -> Self {
        Self {
            page_view: PageViewId::new(),
            handle,
            order_total,
            applied_ticket: 0,
            submitting: false,
        }
    }

    pub fn from_page(page: &PageData) -> Self {
        Self::new(page.client_secret.clone(), page.order_total)
    }

    pub fn handle(&self) -> Option<&AuthorizationHandle> {
        self.handle.as_ref()
    }

    pub fn applied_ticket(&self) -> SyncTicket {
        self.applied_ticket
    }

    /// Replace the handle with one returned by chain `ticket`.
    ///
    /// Returns `false` and leaves the handle alone when a later chain has
    /// already applied its result.
    pub fn apply_handle(&mut self, ticket: SyncTicket, handle: AuthorizationHandle) -> bool {
        if ticket <= self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        self.handle = Some(handle);
        true
    }

    /// Record that chain `ticket` finished without a new handle
    pub fn mark_applied(&mut self, ticket: SyncTicket) -> bool {
        if ticket <= self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        true
    }
}

/// Session shared across controllers and in-flight chains
pub type SharedSession = Arc<Mutex<CheckoutSession>>;

pub fn shared(session: CheckoutSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}
