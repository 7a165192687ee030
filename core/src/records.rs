//! Response records returned by the client.
//!
//! # Design
//! Each record names the keys the gateway must send through
//! [`ResponseRecord::REQUIRED`]; the mapper checks their presence in that
//! order before serde builds the record. Presence and nullability are
//! separate: a required key may carry `null`, in which case the field is an
//! `Option`. A `null` in a field that is not an `Option` is a decode error
//! (`ErrorKind::Response`). Extra keys are ignored.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// A record the mapper can build from a JSON object.
pub trait ResponseRecord: serde::de::DeserializeOwned {
    /// Keys that must be present, checked in this order.
    const REQUIRED: &'static [&'static str];
}

/// `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiStatus {
    pub message: String,
}

impl ResponseRecord for ApiStatus {
    const REQUIRED: &'static [&'static str] = &["message"];
}

/// `GET /currencies`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencyList {
    pub currencies: Vec<String>,
}

impl ResponseRecord for CurrencyList {
    const REQUIRED: &'static [&'static str] = &["currencies"];
}

/// `GET /estimate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Estimate {
    pub currency_from: String,
    pub amount_from: Decimal,
    pub currency_to: String,
    pub estimated_amount: Decimal,
}

impl ResponseRecord for Estimate {
    const REQUIRED: &'static [&'static str] =
        &["currency_from", "amount_from", "currency_to", "estimated_amount"];
}

/// `GET /min-amount`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MinimumAmount {
    pub currency_from: String,
    pub currency_to: String,
    pub min_amount: Decimal,
}

impl ResponseRecord for MinimumAmount {
    const REQUIRED: &'static [&'static str] = &["currency_from", "currency_to", "min_amount"];
}

/// `POST /auth`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken").field("token", &"***").finish()
    }
}

impl ResponseRecord for AuthToken {
    const REQUIRED: &'static [&'static str] = &["token"];
}

/// Lifecycle state of a payment.
///
/// Values the gateway introduces later land in `Unknown` rather than failing
/// the whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentState {
    Waiting,
    Confirming,
    Confirmed,
    Sending,
    PartiallyPaid,
    Finished,
    Failed,
    Refunded,
    Expired,
    Unknown(String),
}

impl PaymentState {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentState::Waiting => "waiting",
            PaymentState::Confirming => "confirming",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Sending => "sending",
            PaymentState::PartiallyPaid => "partially_paid",
            PaymentState::Finished => "finished",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
            PaymentState::Expired => "expired",
            PaymentState::Unknown(raw) => raw,
        }
    }

    /// No further transitions happen from this state.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PaymentState::Finished
                | PaymentState::Failed
                | PaymentState::Refunded
                | PaymentState::Expired
        )
    }
}

impl From<&str> for PaymentState {
    fn from(raw: &str) -> Self {
        match raw {
            "waiting" => PaymentState::Waiting,
            "confirming" => PaymentState::Confirming,
            "confirmed" => PaymentState::Confirmed,
            "sending" => PaymentState::Sending,
            "partially_paid" => PaymentState::PartiallyPaid,
            "finished" => PaymentState::Finished,
            "failed" => PaymentState::Failed,
            "refunded" => PaymentState::Refunded,
            "expired" => PaymentState::Expired,
            other => PaymentState::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PaymentState::from(raw.as_str()))
    }
}

/// `POST /payment`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "de::id")]
    pub payment_id: String,
    pub payment_status: PaymentState,
    pub pay_address: String,
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_amount: Decimal,
    #[serde(default)]
    pub actually_paid: Option<Decimal>,
    pub pay_currency: String,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    pub ipn_callback_url: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "de::opt_id")]
    pub purchase_id: Option<String>,
}

impl ResponseRecord for Payment {
    const REQUIRED: &'static [&'static str] = &[
        "payment_id",
        "payment_status",
        "pay_address",
        "price_amount",
        "price_currency",
        "pay_amount",
        "pay_currency",
        "order_id",
        "order_description",
        "ipn_callback_url",
        "created_at",
        "purchase_id",
    ];
}

/// `GET /payment/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentStatus {
    #[serde(deserialize_with = "de::id")]
    pub payment_id: String,
    pub payment_status: PaymentState,
    pub pay_address: String,
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_amount: Decimal,
    pub actually_paid: Decimal,
    pub pay_currency: String,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    #[serde(deserialize_with = "de::opt_id")]
    pub purchase_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub outcome_amount: Option<Decimal>,
    pub outcome_currency: Option<String>,
}

impl ResponseRecord for PaymentStatus {
    const REQUIRED: &'static [&'static str] = &[
        "payment_id",
        "payment_status",
        "pay_address",
        "price_amount",
        "price_currency",
        "pay_amount",
        "actually_paid",
        "pay_currency",
        "order_id",
        "order_description",
        "purchase_id",
        "created_at",
        "updated_at",
        "outcome_amount",
        "outcome_currency",
    ];
}

/// One entry of `GET /payment`.
///
/// `purchase_id`, `outcome_amount` and `outcome_currency` are optional and
/// stay `None` when the key is absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentListItem {
    #[serde(deserialize_with = "de::id")]
    pub payment_id: String,
    pub payment_status: PaymentState,
    pub pay_address: String,
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_amount: Decimal,
    pub actually_paid: Decimal,
    pub pay_currency: String,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub purchase_id: Option<String>,
    #[serde(default)]
    pub outcome_amount: Option<Decimal>,
    #[serde(default)]
    pub outcome_currency: Option<String>,
}

impl ResponseRecord for PaymentListItem {
    const REQUIRED: &'static [&'static str] = &[
        "payment_id",
        "payment_status",
        "pay_address",
        "price_amount",
        "price_currency",
        "pay_amount",
        "actually_paid",
        "pay_currency",
        "order_id",
        "order_description",
    ];
}

/// Envelope fields of `GET /payment`, before the items are mapped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct PaymentListEnvelope {
    pub limit: u32,
    pub page: u32,
    #[serde(rename = "pagesCount")]
    pub pages_count: u32,
    pub total: u64,
}

impl ResponseRecord for PaymentListEnvelope {
    const REQUIRED: &'static [&'static str] = &["limit", "page", "pagesCount", "total", "data"];
}

/// A page of `GET /payment`, items in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentList {
    pub limit: u32,
    pub page: u32,
    pub pages_count: u32,
    pub total: u64,
    pub data: Vec<PaymentListItem>,
}

impl PaymentList {
    pub(crate) fn from_envelope(envelope: PaymentListEnvelope, capacity: usize) -> Self {
        Self {
            limit: envelope.limit,
            page: envelope.page,
            pages_count: envelope.pages_count,
            total: envelope.total,
            data: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, item: PaymentListItem) {
        self.data.push(item);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when another page follows this one.
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) + 1 < u64::from(self.pages_count)
    }
}

/// `POST /invoice`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_currency: Option<String>,
    pub ipn_callback_url: Option<String>,
    pub invoice_url: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ResponseRecord for Invoice {
    const REQUIRED: &'static [&'static str] = &[
        "id",
        "order_id",
        "order_description",
        "price_amount",
        "price_currency",
        "pay_currency",
        "ipn_callback_url",
        "invoice_url",
        "success_url",
        "cancel_url",
        "created_at",
        "updated_at",
    ];
}

/// Identifiers arrive as strings from some endpoints and numbers from others.
mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    impl From<RawId> for String {
        fn from(raw: RawId) -> Self {
            match raw {
                RawId::Text(text) => text,
                RawId::Number(number) => number.to_string(),
            }
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        RawId::deserialize(deserializer).map(String::from)
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
    }
}
