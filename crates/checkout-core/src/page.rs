//! Page-Embedded Checkout Data
//!
//! The checkout template renders the public key and client secret through
//! JSON script tags, so their text content is a quoted JSON string. The order
//! total comes from a `data-total` attribute.

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::model::{AuthorizationHandle, OrderTotal};

/// Data read once from the rendered checkout page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageData {
    /// Provider publishable key
    pub public_key: String,

    /// Initial authorization handle, absent when the page rendered none
    pub client_secret: Option<AuthorizationHandle>,

    pub order_total: OrderTotal,
}

impl PageData {
    /// Parse the raw text the page carries.
    pub fn from_embedded(public_key: &str, client_secret: &str, order_total: &str) -> Result<Self> {
        let public_key = unquote(public_key)?;
        if public_key.is_empty() {
            return Err(CheckoutError::InvalidPageData("public key is empty".into()));
        }

        Ok(Self {
            public_key,
            client_secret: AuthorizationHandle::parse(&unquote(client_secret)?),
            order_total: OrderTotal::parse(order_total)?,
        })
    }
}

/// Strip the JSON string encoding if present, otherwise take the text as-is
fn unquote(text: &str) -> Result<String> {
    let text = text.trim();
    if text.starts_with('"') {
        Ok(serde_json::from_str::<String>(text)?)
    } else {
        Ok(text.to_string())
    }
}
