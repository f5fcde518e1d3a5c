//! Error Types

use thiserror::Error;

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error types
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Payment provider rejected or failed a request
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend endpoint answered with a non-success status
    #[error("Server Error ({status}): {body}")]
    Backend { status: u16, body: String },

    /// Request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// Page markup did not carry usable checkout data
    #[error("Invalid page data: {0}")]
    InvalidPageData(String),

    /// Computed minor-unit amount does not fit the provider's integer type
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// No authorization handle is available for this page view
    #[error("No authorization handle for this checkout")]
    MissingHandle,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Check if error is retryable
    ///
    /// Nothing in the checkout flow retries on its own; this only tells the
    /// user whether pressing the button again is worth it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Network(_) | CheckoutError::Backend { status: 500..=599, .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Provider(msg) => msg.clone(),
            CheckoutError::Network(_) => {
                "We could not reach the payment service. Please try again.".into()
            }
            CheckoutError::Backend { .. } => {
                "Sorry, your payment cannot be processed right now. Please try again later.".into()
            }
            CheckoutError::MissingHandle => {
                "This checkout has expired. Please reload the page.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_carries_body() {
        let err = CheckoutError::Backend {
            status: 400,
            body: "{\"error\": \"Invalid request parameters\"}".into(),
        };
        assert!(err.to_string().starts_with("Server Error (400)"));
        assert!(err.to_string().contains("Invalid request parameters"));
    }

    #[test]
    fn test_retryable() {
        assert!(CheckoutError::Network("reset".into()).is_retryable());
        assert!(CheckoutError::Backend { status: 502, body: String::new() }.is_retryable());
        assert!(!CheckoutError::Backend { status: 400, body: String::new() }.is_retryable());
        assert!(!CheckoutError::MissingHandle.is_retryable());
    }

    #[test]
    fn test_provider_message_passes_through() {
        let err = CheckoutError::Provider("Your card was declined.".into());
        assert_eq!(err.user_message(), "Your card was declined.");
    }
}
