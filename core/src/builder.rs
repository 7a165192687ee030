//! Stateless request construction for every NOWPayments endpoint.
//!
//! # Design
//! `RequestBuilder` holds the base URL and credentials and turns typed inputs
//! into `HttpRequest` values without touching the network. All input
//! validation happens here, so an `Err` from a `build_*` method means nothing
//! was sent. Optional body fields that are `None` or empty strings are
//! dropped in one place, `compact_body`.

use base64::{prelude::BASE64_STANDARD, Engine};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{InvoiceRequest, ListPaymentsQuery, ParamValue, PaymentRequest};

pub const API_KEY_HEADER: &str = "x-api-key";
const CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    api_key: String,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// Replace the passthrough credentials, e.g. with a token from `/auth`.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_status(&self) -> HttpRequest {
        self.get("/status", Vec::new(), Vec::new())
    }

    pub fn build_currencies(&self) -> HttpRequest {
        self.get("/currencies", self.api_key_headers(), Vec::new())
    }

    pub fn build_estimate(
        &self,
        amount: Decimal,
        currency_from: &str,
        currency_to: &str,
    ) -> Result<HttpRequest, ApiError> {
        require_positive("amount", amount)?;
        require_non_empty("currency_from", currency_from)?;
        require_non_empty("currency_to", currency_to)?;
        let query = vec![
            ("amount".to_string(), amount.normalize().to_string()),
            ("currency_from".to_string(), currency_from.to_string()),
            ("currency_to".to_string(), currency_to.to_string()),
        ];
        Ok(self.get("/estimate", self.api_key_headers(), query))
    }

    pub fn build_create_payment(&self, input: &PaymentRequest) -> Result<HttpRequest, ApiError> {
        require_positive("price_amount", input.price_amount)?;
        require_non_empty("price_currency", &input.price_currency)?;
        require_non_empty("pay_currency", &input.pay_currency)?;
        if let Some(pay_amount) = input.pay_amount {
            require_positive("pay_amount", pay_amount)?;
        }
        if is_set(&input.payout_address) && !is_set(&input.payout_currency) {
            return Err(ApiError::invalid(
                "payout_currency is required when payout_address is specified",
            ));
        }
        self.post_json("/payment", input)
    }

    pub fn build_payment_status(&self, payment_id: &str) -> Result<HttpRequest, ApiError> {
        require_non_empty("payment_id", payment_id)?;
        let path = format!("/payment/{}", urlencoding::encode(payment_id.trim()));
        Ok(self.get(&path, self.api_key_headers(), Vec::new()))
    }

    /// `currency_to` may be empty; the gateway then uses the store's outcome
    /// currency.
    pub fn build_min_amount(&self, currency_from: &str, currency_to: &str) -> Result<HttpRequest, ApiError> {
        require_non_empty("currency_from", currency_from)?;
        let mut query = vec![("currency_from".to_string(), currency_from.to_string())];
        if !currency_to.is_empty() {
            query.push(("currency_to".to_string(), currency_to.to_string()));
        }
        Ok(self.get("/min-amount", self.api_key_headers(), query))
    }

    pub fn build_list_payments(&self, input: &ListPaymentsQuery) -> Result<HttpRequest, ApiError> {
        input.validate()?;
        let mut query = Vec::new();
        if let Some(limit) = input.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = input.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(sort_by) = input.sort_by {
            query.push(("sortBy".to_string(), sort_by.to_string()));
        }
        if let Some(order_by) = input.order_by {
            query.push(("orderBy".to_string(), order_by.to_string()));
        }
        if let Some(date_from) = input.date_from {
            query.push(("dateFrom".to_string(), date_from.to_string()));
        }
        if let Some(date_to) = input.date_to {
            query.push(("dateTo".to_string(), date_to.to_string()));
        }
        Ok(self.get("/payment", self.api_key_headers(), query))
    }

    pub fn build_create_invoice(&self, input: &InvoiceRequest) -> Result<HttpRequest, ApiError> {
        require_positive("price_amount", input.price_amount)?;
        require_non_empty("price_currency", &input.price_currency)?;
        self.post_json("/invoice", input)
    }

    /// `POST /auth`: exchange account email and password for a bearer token.
    pub fn build_auth(&self, email: &str, password: &str) -> Result<HttpRequest, ApiError> {
        require_non_empty("email", email)?;
        require_non_empty("password", password)?;
        #[derive(Serialize)]
        struct AuthBody<'a> {
            email: &'a str,
            password: &'a str,
        }
        self.post_json("/auth", &AuthBody { email, password })
    }

    /// Authenticated `GET` on an arbitrary path; `params` become the query.
    pub fn build_call_get(&self, path: &str, params: &[(&str, ParamValue)]) -> Result<HttpRequest, ApiError> {
        let headers = self.passthrough_headers(path)?;
        let query = params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_query_value()))
            .collect();
        Ok(self.get(path, headers, query))
    }

    /// Authenticated `POST` on an arbitrary path; `params` become a JSON object
    /// with keys in the given order. A key may appear only once.
    pub fn build_call_post(&self, path: &str, params: &[(&str, ParamValue)]) -> Result<HttpRequest, ApiError> {
        let mut headers = self.passthrough_headers(path)?;
        let mut body = Map::new();
        for (key, value) in params {
            if body.contains_key(*key) {
                return Err(ApiError::invalid(format!("parameter {key:?} is given more than once")));
            }
            body.insert(key.to_string(), value.to_json().map_err(ApiError::Encode)?);
        }
        headers.push(owned(CONTENT_TYPE));
        let body = serde_json::to_string(&body).map_err(ApiError::Encode)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path),
            headers,
            query: Vec::new(),
            body: Some(body),
        })
    }

    fn passthrough_headers(&self, path: &str) -> Result<Vec<(String, String)>, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::invalid(format!("path {path:?} must start with '/'")));
        }
        let authorization = match &self.credentials {
            Some(Credentials::Bearer { token }) => format!("Bearer {token}"),
            Some(Credentials::Basic { username, password }) => {
                format!("Basic {}", BASE64_STANDARD.encode(format!("{username}:{password}")))
            }
            None => {
                return Err(ApiError::invalid(
                    "passthrough calls need a bearer token or basic credentials",
                ))
            }
        };
        let mut headers = self.api_key_headers();
        headers.push(("authorization".to_string(), authorization));
        Ok(headers)
    }

    fn api_key_headers(&self) -> Vec<(String, String)> {
        vec![(API_KEY_HEADER.to_string(), self.api_key.clone())]
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str, headers: Vec<(String, String)>, query: Vec<(String, String)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url(path),
            headers,
            query,
            body: None,
        }
    }

    fn post_json<T: Serialize>(&self, path: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let body = compact_body(input)?;
        let mut headers = vec![owned(CONTENT_TYPE)];
        headers.extend(self.api_key_headers());
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path),
            headers,
            query: Vec::new(),
            body: Some(body),
        })
    }
}

/// Serialize `input` and drop `null` and empty-string entries.
fn compact_body<T: Serialize>(input: &T) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(input).map_err(ApiError::Encode)?;
    if let Value::Object(object) = &mut value {
        object.retain(|_, v| !v.is_null() && v.as_str() != Some(""));
    }
    serde_json::to_string(&value).map_err(ApiError::Encode)
}

fn owned((name, value): (&str, &str)) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn require_positive(name: &str, amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::invalid(format!("{name} must be greater than zero, got {amount}")));
    }
    Ok(())
}

fn require_non_empty(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{name} must not be empty")));
    }
    Ok(())
}
