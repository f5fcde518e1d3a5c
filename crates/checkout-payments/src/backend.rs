//! Storefront Backend Client
//!
//! Two endpoints on the storefront server:
//!
//! - `POST /checkout/update_payment_intent/` (JSON) changes the intent
//!   amount server-side and answers with the intent's client secret.
//! - `POST /checkout/cache_checkout_data/` (form) stores save-info and
//!   loyalty points on the intent before the card is confirmed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use checkout_core::{
    AmountReconciler, AuthorizationHandle, CacheCheckoutData, CheckoutBackend, CheckoutError,
    Result as CheckoutResult,
};

use crate::error::PaymentError;

const UPDATE_PAYMENT_INTENT_PATH: &str = "/checkout/update_payment_intent/";
const CACHE_CHECKOUT_DATA_PATH: &str = "/checkout/cache_checkout_data/";

/// HTTP client for the storefront backend
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
}

#[derive(Debug, Serialize)]
struct UpdateIntentRequest<'a> {
    client_secret: &'a str,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateIntentResponse {
    #[serde(default)]
    client_secret: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str, csrf_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: csrf_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into a backend error carrying the body text
    async fn check(response: reqwest::Response) -> CheckoutResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CheckoutError::Backend {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl AmountReconciler for BackendClient {
    async fn reconcile(
        &self,
        handle: &AuthorizationHandle,
        amount: i64,
    ) -> CheckoutResult<Option<AuthorizationHandle>> {
        let response = self
            .http
            .post(self.url(UPDATE_PAYMENT_INTENT_PATH))
            .header("X-CSRFToken", &self.csrf_token)
            .json(&UpdateIntentRequest {
                client_secret: handle.as_str(),
                amount,
            })
            .send()
            .await
            .map_err(PaymentError::from)?;

        let body: UpdateIntentResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(PaymentError::from)?;

        Ok(body.client_secret.as_deref().and_then(AuthorizationHandle::parse))
    }

    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl CheckoutBackend for BackendClient {
    async fn cache_checkout_data(&self, data: &CacheCheckoutData) -> CheckoutResult<()> {
        let response = self
            .http
            .post(self.url(CACHE_CHECKOUT_DATA_PATH))
            .form(data)
            .send()
            .await
            .map_err(PaymentError::from)?;

        Self::check(response).await?;
        tracing::debug!(intent = data.client_secret.intent_id(), "Cached checkout data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Form, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use checkout_core::LoyaltyPoints;
    use serde_json::{json, Value};

    use super::*;
    use crate::test_server::serve;

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn update_route(
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) != Some("tok") {
            return (StatusCode::FORBIDDEN, Json(json!({"error": "CSRF"})));
        }

        match body["amount"].as_i64() {
            Some(amount) if amount > 0 => (
                StatusCode::OK,
                Json(json!({"client_secret": format!("pi_8_secret_{amount}")})),
            ),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid request parameters"})),
            ),
        }
    }

    async fn cache_route(
        State(seen): State<Seen>,
        Form(form): Form<HashMap<String, String>>,
    ) -> StatusCode {
        let ok = form.get("loyalty_points").map(String::as_str) != Some("-1");
        seen.lock().unwrap().push(form);
        if ok {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    async fn backend(csrf: &str) -> (BackendClient, Seen) {
        let seen: Seen = Arc::default();
        let base = serve(
            Router::new()
                .route(UPDATE_PAYMENT_INTENT_PATH, post(update_route))
                .route(CACHE_CHECKOUT_DATA_PATH, post(cache_route))
                .with_state(seen.clone()),
        )
        .await;
        (BackendClient::new(&base, csrf), seen)
    }

    fn cache_data(points: i64) -> CacheCheckoutData {
        CacheCheckoutData {
            csrf_token: "tok".into(),
            client_secret: AuthorizationHandle::new("pi_8_secret_a"),
            save_info: true,
            loyalty_points: LoyaltyPoints::new(points),
        }
    }

    #[tokio::test]
    async fn test_reconcile_returns_new_handle() {
        let (client, _) = backend("tok").await;

        let handle = client
            .reconcile(&AuthorizationHandle::new("pi_8_secret_a"), 4900)
            .await
            .unwrap();

        assert_eq!(handle.unwrap().as_str(), "pi_8_secret_4900");
    }

    #[tokio::test]
    async fn test_reconcile_error_carries_body_text() {
        let (client, _) = backend("tok").await;

        let err = client
            .reconcile(&AuthorizationHandle::new("pi_8_secret_a"), 0)
            .await
            .unwrap_err();

        match err {
            CheckoutError::Backend { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid request parameters"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reconcile_sends_csrf_header() {
        let (client, _) = backend("wrong").await;

        let err = client
            .reconcile(&AuthorizationHandle::new("pi_8_secret_a"), 4900)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Backend { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_cache_posts_form_fields() {
        let (client, seen) = backend("tok").await;

        client.cache_checkout_data(&cache_data(40)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["csrfmiddlewaretoken"], "tok");
        assert_eq!(seen[0]["client_secret"], "pi_8_secret_a");
        assert_eq!(seen[0]["save_info"], "true");
        assert_eq!(seen[0]["loyalty_points"], "40");
    }

    #[tokio::test]
    async fn test_cache_failure_status_is_error() {
        let (client, _) = backend("tok").await;

        let err = client.cache_checkout_data(&cache_data(-1)).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Backend { status: 400, .. }));
    }
}
