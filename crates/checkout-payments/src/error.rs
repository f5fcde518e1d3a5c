//! Payment Error Types

use checkout_core::CheckoutError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors raised by the concrete payment and backend clients
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Stripe(msg) => CheckoutError::Provider(msg),
            PaymentError::Http(e) if e.is_decode() => CheckoutError::Provider(e.to_string()),
            PaymentError::Http(e) => CheckoutError::Network(e.to_string()),
            PaymentError::Decode(msg) => CheckoutError::Provider(msg),
            PaymentError::Config(msg) => CheckoutError::Config(msg),
        }
    }
}
