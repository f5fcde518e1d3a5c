//! Checkout Domain Model
//!
//! Money is carried as `Decimal` in major units on the page and as `i64`
//! minor units (cents) on the provider side.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// Discount granted per redeemed loyalty point, in major currency units
pub const DISCOUNT_PER_POINT: Decimal = dec!(0.10);

/// Opaque reference to a pending payment authorization (intent client secret)
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationHandle(String);

impl AuthorizationHandle {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Parse from page text; blank means the page carried no handle
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(Self(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Intent id: everything before `_secret`
    pub fn intent_id(&self) -> &str {
        self.0.split("_secret").next().unwrap_or(&self.0)
    }
}

impl std::fmt::Debug for AuthorizationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorizationHandle({}_secret_***)", self.intent_id())
    }
}

/// Loyalty points typed into the checkout form
///
/// No range validation happens here: negative values pass through and the
/// server re-checks the balance when the order is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoyaltyPoints(i64);

impl LoyaltyPoints {
    pub const ZERO: Self = Self(0);

    pub fn new(points: i64) -> Self {
        Self(points)
    }

    /// Parse raw input text.
    ///
    /// Takes the leading integer (optional whitespace, optional sign, digits)
    /// and ignores the rest, so `"12abc"` is 12 and `"3.9"` is 3. Anything
    /// without leading digits, or too large for `i64`, is 0.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return Self::ZERO;
        }

        let signed = if negative {
            format!("-{}", &rest[..digits_len])
        } else {
            rest[..digits_len].to_string()
        };

        signed.parse().map(Self).unwrap_or(Self::ZERO)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Discount these points are worth
    pub fn discount(self) -> DiscountAmount {
        DiscountAmount::for_points(self)
    }
}

impl std::fmt::Display for LoyaltyPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Currency value taken off the order total for redeemed points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountAmount(Decimal);

impl DiscountAmount {
    pub fn for_points(points: LoyaltyPoints) -> Self {
        let mut amount = (Decimal::from(points.value()) * DISCOUNT_PER_POINT).round_dp(2);
        amount.rescale(2);
        Self(amount)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// Two decimal places, no currency symbol: `"2.50"`
    pub fn formatted(self) -> String {
        self.0.to_string()
    }

    /// Text for the discount display element: `"$2.50"`
    pub fn display_text(self) -> String {
        format!("${}", self.formatted())
    }
}

/// Order total as rendered on the page, in major units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderTotal(Decimal);

impl OrderTotal {
    pub fn new(total: Decimal) -> Self {
        Self(total)
    }

    /// Parse the page's data attribute text
    pub fn parse(s: &str) -> Result<Self> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|e| CheckoutError::InvalidPageData(format!("order total {s:?}: {e}")))
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// Amount to authorize after the discount, in minor units.
    ///
    /// Rounds half up like the page always has:
    /// `floor((total - discount) * 100 + 0.5)`.
    pub fn authorized_amount(self, discount: DiscountAmount) -> Result<i64> {
        let out_of_range = || {
            CheckoutError::AmountOutOfRange(format!("{} - {}", self.0, discount.value()))
        };

        let net = self.0.checked_sub(discount.value()).ok_or_else(out_of_range)?;
        let cents = net
            .checked_mul(dec!(100))
            .and_then(|c| c.checked_add(dec!(0.5)))
            .ok_or_else(out_of_range)?
            .floor();

        cents.to_i64().ok_or_else(out_of_range)
    }
}

/// Payment intent status as reported by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Other(String),
}

impl IntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Other(s) => s,
        }
    }

    /// Whether the amount may still change.
    ///
    /// Finalized or in-flight intents must never be touched.
    pub fn is_amount_mutable(&self) -> bool {
        matches!(
            self,
            IntentStatus::RequiresPaymentMethod
                | IntentStatus::RequiresConfirmation
                | IntentStatus::RequiresAction
        )
    }
}

impl From<&str> for IntentStatus {
    fn from(s: &str) -> Self {
        match s {
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_action" => IntentStatus::RequiresAction,
            "processing" => IntentStatus::Processing,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            "succeeded" => IntentStatus::Succeeded,
            other => IntentStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for IntentStatus {
    fn from(s: String) -> Self {
        IntentStatus::from(s.as_str())
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider's view of an intent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntentSnapshot {
    pub id: String,
    pub status: IntentStatus,
    /// Currently authorized amount in minor units
    pub amount: i64,
}

/// Outcome of a card confirmation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmResult {
    /// Provider refused the payment; message is safe to show
    Declined { message: String },

    /// Provider accepted the request; intent ended in `status`
    Completed { status: IntentStatus },
}

/// Change notification from the hosted card element
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChangeEvent {
    /// Whether every card field is filled in
    #[serde(default)]
    pub complete: bool,

    /// Validation message, if the input is currently invalid
    #[serde(default)]
    pub error: Option<String>,
}

/// Checkout form fields, as typed
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub street_address1: String,
    #[serde(default)]
    pub street_address2: String,
    pub town_or_city: String,
    pub country: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub save_info: bool,
    /// Raw text of the visible loyalty points input
    #[serde(default)]
    pub loyalty_points: String,
    /// Tokenized card reference produced by the card element
    pub payment_method: String,
}

/// Postal address sent with a confirmation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
    /// Only sent for shipping
    pub postal_code: Option<String>,
    pub state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Address,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub phone: String,
    pub address: Address,
}

/// Everything the provider needs to confirm a card payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_method: String,
    pub billing: BillingDetails,
    pub shipping: ShippingDetails,
}

impl PaymentDetails {
    /// Build from the form, trimming every value
    pub fn from_form(form: &CheckoutForm) -> Self {
        let name = form.full_name.trim().to_string();
        let phone = form.phone_number.trim().to_string();
        let address = Address {
            line1: form.street_address1.trim().into(),
            line2: form.street_address2.trim().into(),
            city: form.town_or_city.trim().into(),
            country: form.country.trim().into(),
            postal_code: None,
            state: form.county.trim().into(),
        };

        Self {
            payment_method: form.payment_method.trim().into(),
            billing: BillingDetails {
                name: name.clone(),
                phone: phone.clone(),
                email: form.email.trim().into(),
                address: address.clone(),
            },
            shipping: ShippingDetails {
                name,
                phone,
                address: Address {
                    postal_code: Some(form.postcode.trim().into()),
                    ..address
                },
            },
        }
    }
}

/// Payload for the backend's checkout cache endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCheckoutData {
    #[serde(rename = "csrfmiddlewaretoken")]
    pub csrf_token: String,
    pub client_secret: AuthorizationHandle,
    pub save_info: bool,
    pub loyalty_points: LoyaltyPoints,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_parse_invalid_is_zero() {
        for raw in ["", "   ", "abc", "-", "+", "x12", ".5", "\u{0663}"] {
            assert_eq!(LoyaltyPoints::parse(raw), LoyaltyPoints::ZERO, "input {raw:?}");
        }
    }

    #[test]
    fn test_points_parse_leading_integer() {
        assert_eq!(LoyaltyPoints::parse("10").value(), 10);
        assert_eq!(LoyaltyPoints::parse("  42").value(), 42);
        assert_eq!(LoyaltyPoints::parse("12abc").value(), 12);
        assert_eq!(LoyaltyPoints::parse("3.9").value(), 3);
        assert_eq!(LoyaltyPoints::parse("+7").value(), 7);
    }

    #[test]
    fn test_points_parse_keeps_negative() {
        assert_eq!(LoyaltyPoints::parse("-15").value(), -15);
    }

    #[test]
    fn test_points_parse_overflow_is_zero() {
        assert_eq!(LoyaltyPoints::parse("99999999999999999999999"), LoyaltyPoints::ZERO);
    }

    #[test]
    fn test_discount_formatting() {
        assert_eq!(LoyaltyPoints::new(25).discount().formatted(), "2.50");
        assert_eq!(LoyaltyPoints::new(0).discount().formatted(), "0.00");
        assert_eq!(LoyaltyPoints::new(1).discount().formatted(), "0.10");
        assert_eq!(LoyaltyPoints::new(1234).discount().display_text(), "$123.40");
        assert_eq!(LoyaltyPoints::new(-3).discount().formatted(), "-0.30");
    }

    #[test]
    fn test_discount_is_points_times_rate() {
        for p in [0_i64, 1, 9, 10, 99, 250, 10_001] {
            let expected = (Decimal::from(p) * dec!(0.1)).round_dp(2);
            assert_eq!(LoyaltyPoints::new(p).discount().value(), expected);
        }
    }

    #[test]
    fn test_authorized_amount_scenario() {
        let total = OrderTotal::parse("50.00").unwrap();
        let discount = LoyaltyPoints::parse("10").discount();
        assert_eq!(discount.formatted(), "1.00");
        assert_eq!(total.authorized_amount(discount).unwrap(), 4900);
    }

    #[test]
    fn test_authorized_amount_rounds_half_up() {
        let discount = LoyaltyPoints::ZERO.discount();
        assert_eq!(OrderTotal::new(dec!(10.005)).authorized_amount(discount).unwrap(), 1001);
        assert_eq!(OrderTotal::new(dec!(10.004)).authorized_amount(discount).unwrap(), 1000);
        assert_eq!(OrderTotal::new(dec!(-0.005)).authorized_amount(discount).unwrap(), 0);
    }

    #[test]
    fn test_authorized_amount_can_go_negative() {
        let total = OrderTotal::new(dec!(5.00));
        let discount = LoyaltyPoints::new(100).discount();
        assert_eq!(total.authorized_amount(discount).unwrap(), -500);
    }

    #[test]
    fn test_order_total_parse_rejects_garbage() {
        assert!(OrderTotal::parse("fifty").is_err());
        assert_eq!(OrderTotal::parse(" 129.99 ").unwrap().value(), dec!(129.99));
    }

    #[test]
    fn test_handle_intent_id() {
        let handle = AuthorizationHandle::new("pi_3Abc_secret_XyZ");
        assert_eq!(handle.intent_id(), "pi_3Abc");
        assert!(!format!("{handle:?}").contains("XyZ"));
        assert_eq!(AuthorizationHandle::parse("  "), None);
    }

    #[test]
    fn test_status_gate() {
        assert!(IntentStatus::from("requires_payment_method").is_amount_mutable());
        assert!(IntentStatus::from("requires_confirmation").is_amount_mutable());
        assert!(IntentStatus::from("requires_action").is_amount_mutable());
        assert!(!IntentStatus::Succeeded.is_amount_mutable());
        assert!(!IntentStatus::Canceled.is_amount_mutable());
        assert!(!IntentStatus::Processing.is_amount_mutable());
        assert!(!IntentStatus::from("requires_source").is_amount_mutable());
    }

    #[test]
    fn test_status_serde_uses_provider_strings() {
        let status: IntentStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert_eq!(status, IntentStatus::RequiresAction);
        assert_eq!(serde_json::to_string(&IntentStatus::Succeeded).unwrap(), "\"succeeded\"");
    }

    #[test]
    fn test_payment_details_trim_and_postal_code() {
        let form = CheckoutForm {
            full_name: "  Ada Lovelace ".into(),
            phone_number: " 0123 ".into(),
            email: "ada@example.com ".into(),
            street_address1: " 1 Analytical Way".into(),
            town_or_city: "London ".into(),
            country: "GB".into(),
            postcode: " N1 9GU ".into(),
            county: " Greater London".into(),
            payment_method: "tok_visa".into(),
            ..Default::default()
        };

        let details = PaymentDetails::from_form(&form);
        assert_eq!(details.billing.name, "Ada Lovelace");
        assert_eq!(details.billing.email, "ada@example.com");
        assert_eq!(details.billing.address.postal_code, None);
        assert_eq!(details.shipping.address.postal_code.as_deref(), Some("N1 9GU"));
        assert_eq!(details.shipping.address.state, "Greater London");
        assert_eq!(details.shipping.address.line2, "");
    }
}
