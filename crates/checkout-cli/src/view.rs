//! Terminal Checkout View
//!
//! Prints every page mutation instead of touching a DOM.

use std::sync::atomic::{AtomicBool, Ordering};

use checkout_core::{CheckoutView, LoyaltyPoints};

/// Page surface rendered as terminal lines
#[derive(Debug, Default)]
pub struct TerminalView {
    overlay: AtomicBool,
    reload_requested: AtomicBool,
    submitted: AtomicBool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The page asked to be reloaded; the driver should stop
    pub fn reload_requested(&self) -> bool {
        self.reload_requested.load(Ordering::SeqCst)
    }

    /// The order form was submitted
    pub fn submitted(&self) -> bool {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl CheckoutView for TerminalView {
    fn set_hidden_points(&self, points: LoyaltyPoints) {
        tracing::debug!(%points, "hidden loyalty points field set");
    }

    fn show_discount(&self, text: &str) {
        println!("discount: {text}");
    }

    fn show_card_error(&self, message: Option<&str>) {
        match message {
            Some(message) => println!("card error: {message}"),
            None => println!("card error cleared"),
        }
    }

    fn set_form_enabled(&self, enabled: bool) {
        println!("form {}", if enabled { "enabled" } else { "disabled" });
    }

    fn toggle_loading_overlay(&self) {
        let visible = !self.overlay.fetch_xor(true, Ordering::SeqCst);
        println!("loading overlay {}", if visible { "shown" } else { "hidden" });
    }

    fn reload(&self) {
        self.reload_requested.store(true, Ordering::SeqCst);
        println!("page reload requested");
    }

    fn submit_form(&self) {
        self.submitted.store(true, Ordering::SeqCst);
        println!("order form submitted");
    }
}
