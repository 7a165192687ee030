//! Request-side DTOs: what the caller hands to the client.
//!
//! # Design
//! Request records serialize to the gateway's JSON field names. Optional
//! fields are `Option`s, and the request builder drops `null` and empty
//! strings before sending, so `Some(String::new())` behaves like `None`.
//! Amounts are `Decimal` and go over the wire as JSON numbers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::error::ApiError;

/// Largest page size the list endpoint accepts.
pub const MAX_LIMIT: u32 = 500;

/// Payload for `POST /invoice`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub price_amount: Decimal,
    pub price_currency: String,
    pub pay_currency: Option<String>,
    pub ipn_callback_url: Option<String>,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl InvoiceRequest {
    pub fn new(price_amount: Decimal, price_currency: impl Into<String>) -> Self {
        Self {
            price_amount,
            price_currency: price_currency.into(),
            pay_currency: None,
            ipn_callback_url: None,
            order_id: None,
            order_description: None,
            success_url: None,
            cancel_url: None,
        }
    }

    pub fn with_pay_currency(mut self, currency: impl Into<String>) -> Self {
        self.pay_currency = Some(currency.into());
        self
    }

    pub fn with_ipn_callback_url(mut self, url: impl Into<String>) -> Self {
        self.ipn_callback_url = Some(url.into());
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_order_description(mut self, description: impl Into<String>) -> Self {
        self.order_description = Some(description.into());
        self
    }

    pub fn with_success_url(mut self, url: impl Into<String>) -> Self {
        self.success_url = Some(url.into());
        self
    }

    pub fn with_cancel_url(mut self, url: impl Into<String>) -> Self {
        self.cancel_url = Some(url.into());
        self
    }
}

/// Payload for `POST /payment`.
///
/// `pay_amount` is computed by the gateway from `price_amount` when absent.
/// `payout_currency` is required whenever `payout_address` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub price_amount: Decimal,
    pub price_currency: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub pay_amount: Option<Decimal>,
    pub pay_currency: String,
    pub ipn_callback_url: Option<String>,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    pub purchase_id: Option<String>,
    pub payout_address: Option<String>,
    pub payout_currency: Option<String>,
    pub payout_extra_id: Option<String>,
    pub fixed_rate: Option<bool>,
}

impl PaymentRequest {
    pub fn new(
        price_amount: Decimal,
        price_currency: impl Into<String>,
        pay_currency: impl Into<String>,
    ) -> Self {
        Self {
            price_amount,
            price_currency: price_currency.into(),
            pay_amount: None,
            pay_currency: pay_currency.into(),
            ipn_callback_url: None,
            order_id: None,
            order_description: None,
            purchase_id: None,
            payout_address: None,
            payout_currency: None,
            payout_extra_id: None,
            fixed_rate: None,
        }
    }

    pub fn with_pay_amount(mut self, amount: Decimal) -> Self {
        self.pay_amount = Some(amount);
        self
    }

    pub fn with_ipn_callback_url(mut self, url: impl Into<String>) -> Self {
        self.ipn_callback_url = Some(url.into());
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_order_description(mut self, description: impl Into<String>) -> Self {
        self.order_description = Some(description.into());
        self
    }

    pub fn with_purchase_id(mut self, purchase_id: impl Into<String>) -> Self {
        self.purchase_id = Some(purchase_id.into());
        self
    }

    /// Route the payout to `address` in `currency` instead of the account default.
    pub fn with_payout(mut self, address: impl Into<String>, currency: impl Into<String>) -> Self {
        self.payout_address = Some(address.into());
        self.payout_currency = Some(currency.into());
        self
    }

    pub fn with_payout_extra_id(mut self, extra_id: impl Into<String>) -> Self {
        self.payout_extra_id = Some(extra_id.into());
        self
    }

    pub fn with_fixed_rate(mut self, fixed_rate: bool) -> Self {
        self.fixed_rate = Some(fixed_rate);
        self
    }
}

/// Names `GET /payment` accepts for `sortBy`.
pub const SORT_BY_FIELDS: [&str; 13] = [
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
    "outcome_amount",
    "outcome_currency",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PaymentId,
    PaymentStatus,
    PayAddress,
    PriceAmount,
    PriceCurrency,
    PayAmount,
    ActuallyPaid,
    PayCurrency,
    OrderId,
    OrderDescription,
    PurchaseId,
    OutcomeAmount,
    OutcomeCurrency,
}

impl SortField {
    const ALL: [SortField; 13] = [
        SortField::PaymentId,
        SortField::PaymentStatus,
        SortField::PayAddress,
        SortField::PriceAmount,
        SortField::PriceCurrency,
        SortField::PayAmount,
        SortField::ActuallyPaid,
        SortField::PayCurrency,
        SortField::OrderId,
        SortField::OrderDescription,
        SortField::PurchaseId,
        SortField::OutcomeAmount,
        SortField::OutcomeCurrency,
    ];

    pub fn as_str(&self) -> &'static str {
        SORT_BY_FIELDS[*self as usize]
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                ApiError::invalid(format!(
                    "invalid sort field {s:?}, valid sort fields: {}",
                    SORT_BY_FIELDS.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ApiError::invalid(format!(
                "invalid order {other:?}, valid values: asc, desc"
            ))),
        }
    }
}

/// Query for `GET /payment`. Every field left `None` is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPaymentsQuery {
    /// Page size, 1 to [`MAX_LIMIT`].
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub sort_by: Option<SortField>,
    pub order_by: Option<SortOrder>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

impl ListPaymentsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Parse a sort field name. An empty string clears the field.
    pub fn sort_by(mut self, field: &str) -> Result<Self, ApiError> {
        self.sort_by = if field.is_empty() { None } else { Some(field.parse()?) };
        Ok(self)
    }

    /// Parse `asc` or `desc`. An empty string clears the field.
    pub fn order_by(mut self, order: &str) -> Result<Self, ApiError> {
        self.order_by = if order.is_empty() { None } else { Some(order.parse()?) };
        Ok(self)
    }

    pub fn date_from(mut self, date: Date) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: Date) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(ApiError::invalid(format!(
                    "valid limit range [1: {MAX_LIMIT}], got {limit}"
                )));
            }
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ApiError::invalid(format!("dateFrom {from} is after dateTo {to}")));
            }
        }
        Ok(())
    }
}

/// A typed value for the passthrough endpoints' parameter lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Decimal(Decimal),
    Bool(bool),
}

impl ParamValue {
    /// Rendering used in query strings.
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Decimal(d) => d.normalize().to_string(),
            ParamValue::Bool(b) => b.to_string(),
        }
    }

    /// Rendering used in JSON bodies.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            ParamValue::Str(s) => Ok(serde_json::Value::from(s.as_str())),
            ParamValue::Int(i) => Ok(serde_json::Value::from(*i)),
            ParamValue::Decimal(d) => rust_decimal::serde::float::serialize(d, serde_json::value::Serializer),
            ParamValue::Bool(b) => Ok(serde_json::Value::from(*b)),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        ParamValue::Decimal(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use time::Month;

    use super::*;

    #[test]
    fn sort_field_names_follow_allow_list() {
        for (field, name) in SortField::ALL.iter().zip(SORT_BY_FIELDS) {
            assert_eq!(field.as_str(), name);
            assert_eq!(name.parse::<SortField>().unwrap(), *field);
        }
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let err = "created_at".parse::<SortField>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(err.to_string().contains("outcome_currency"));
    }

    #[test]
    fn sort_field_is_case_sensitive() {
        assert!("Payment_ID".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_order_only_accepts_asc_desc() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("DESC".parse::<SortOrder>().is_err());
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn empty_sort_strings_clear_fields() {
        let query = ListPaymentsQuery::new()
            .sort_by("price_amount")
            .unwrap()
            .sort_by("")
            .unwrap()
            .order_by("")
            .unwrap();
        assert!(query.sort_by.is_none());
        assert!(query.order_by.is_none());
    }

    #[test]
    fn limit_bounds() {
        assert!(ListPaymentsQuery::new().validate().is_ok());
        assert!(ListPaymentsQuery::new().limit(1).validate().is_ok());
        assert!(ListPaymentsQuery::new().limit(MAX_LIMIT).validate().is_ok());
        assert!(ListPaymentsQuery::new().limit(0).validate().is_err());
        assert!(ListPaymentsQuery::new().limit(MAX_LIMIT + 1).validate().is_err());
        assert!(ListPaymentsQuery::new().limit(u32::MAX).validate().is_err());
    }

    #[test]
    fn date_range_must_be_ordered() {
        let early = Date::from_calendar_date(2021, Month::January, 1).unwrap();
        let late = Date::from_calendar_date(2021, Month::March, 31).unwrap();
        assert!(ListPaymentsQuery::new().date_from(early).date_to(late).validate().is_ok());
        assert!(ListPaymentsQuery::new().date_from(late).date_to(early).validate().is_err());
    }

    #[test]
    fn param_values_render_for_query_and_json() {
        let amount = Decimal::new(1050, 2);
        assert_eq!(ParamValue::from(amount).to_query_value(), "10.5");
        assert_eq!(ParamValue::from(amount).to_json().unwrap(), serde_json::json!(10.5));
        assert_eq!(ParamValue::from(111).to_json().unwrap(), serde_json::json!(111));
        assert_eq!(ParamValue::from("DESC").to_query_value(), "DESC");
        assert_eq!(ParamValue::from(true).to_query_value(), "true");
    }

    #[test]
    fn payment_request_serializes_amounts_as_numbers() {
        let request = PaymentRequest::new(Decimal::new(39995, 1), "usd", "btc");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["price_amount"], serde_json::json!(3999.5));
        assert!(json["pay_amount"].is_null());
    }
}
