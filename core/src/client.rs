//! The NOWPayments API client.
//!
//! # Design
//! `NowPaymentsClient` composes the three stateless pieces: `RequestBuilder`
//! validates input and produces an `HttpRequest`, the `Transport` executes
//! it, and the mapper turns the `HttpResponse` into a record. Each method
//! sends at most one request and sends none when validation fails. The
//! client has no mutable state, so `&self` is enough everywhere.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::builder::RequestBuilder;
use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::mapper;
use crate::records::{
    ApiStatus, AuthToken, CurrencyList, Estimate, Invoice, MinimumAmount, Payment, PaymentList,
    PaymentStatus,
};
use crate::types::{InvoiceRequest, ListPaymentsQuery, ParamValue, PaymentRequest};

#[cfg(feature = "ureq")]
use crate::transport::UreqTransport;

#[derive(Debug, Clone)]
pub struct NowPaymentsClient<T> {
    requests: RequestBuilder,
    transport: T,
}

#[cfg(feature = "ureq")]
impl NowPaymentsClient<UreqTransport> {
    /// Client over a blocking `ureq` agent using the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Client configured from `NOWPAYMENTS_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> NowPaymentsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            requests: RequestBuilder::new(&config)?,
            transport,
        })
    }

    /// A client that authenticates passthrough calls with `token`.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            requests: self
                .requests
                .with_credentials(Credentials::Bearer { token: token.into() }),
            transport: self.transport,
        }
    }

    /// The request builder, for callers that execute requests themselves.
    pub fn requests(&self) -> &RequestBuilder {
        &self.requests
    }

    /// `GET /status`: gateway availability.
    pub fn status(&self) -> Result<ApiStatus, ApiError> {
        let response = self.send(self.requests.build_status())?;
        mapper::parse_record(response)
    }

    /// `GET /currencies`: tickers the account can accept.
    pub fn currencies(&self) -> Result<Vec<String>, ApiError> {
        let response = self.send(self.requests.build_currencies())?;
        mapper::parse_record::<CurrencyList>(response).map(|list| list.currencies)
    }

    /// `GET /estimate`: convert `amount` of `currency_from` into `currency_to`.
    pub fn estimate(
        &self,
        amount: Decimal,
        currency_from: &str,
        currency_to: &str,
    ) -> Result<Estimate, ApiError> {
        let request = self.requests.build_estimate(amount, currency_from, currency_to)?;
        mapper::parse_record(self.send(request)?)
    }

    /// `POST /payment`.
    pub fn create_payment(&self, input: &PaymentRequest) -> Result<Payment, ApiError> {
        let request = self.requests.build_create_payment(input)?;
        mapper::parse_record(self.send(request)?)
    }

    /// `GET /payment/{id}`.
    pub fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, ApiError> {
        let request = self.requests.build_payment_status(payment_id)?;
        mapper::parse_record(self.send(request)?)
    }

    /// `GET /min-amount`. Pass an empty `currency_to` to use the store's
    /// outcome currency.
    pub fn min_amount(&self, currency_from: &str, currency_to: &str) -> Result<MinimumAmount, ApiError> {
        let request = self.requests.build_min_amount(currency_from, currency_to)?;
        mapper::parse_record(self.send(request)?)
    }

    /// `GET /payment`: one page of the account's payments.
    pub fn list_payments(&self, query: &ListPaymentsQuery) -> Result<PaymentList, ApiError> {
        let request = self.requests.build_list_payments(query)?;
        mapper::parse_payment_list(self.send(request)?)
    }

    /// `POST /invoice`.
    pub fn create_invoice(&self, input: &InvoiceRequest) -> Result<Invoice, ApiError> {
        let request = self.requests.build_create_invoice(input)?;
        mapper::parse_record(self.send(request)?)
    }

    /// `POST /auth`. The returned token is not stored; pass it to
    /// [`NowPaymentsClient::with_token`].
    pub fn authenticate(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let request = self.requests.build_auth(email, password)?;
        mapper::parse_record(self.send(request)?)
    }

    /// Authenticated `GET` on a path the typed methods do not cover.
    pub fn call_get(&self, path: &str, params: &[(&str, ParamValue)]) -> Result<Value, ApiError> {
        let request = self.requests.build_call_get(path, params)?;
        mapper::decode_body(self.send(request)?)
    }

    /// Authenticated `POST` on a path the typed methods do not cover.
    pub fn call_post(&self, path: &str, params: &[(&str, ParamValue)]) -> Result<Value, ApiError> {
        let request = self.requests.build_call_post(path, params)?;
        mapper::decode_body(self.send(request)?)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        Ok(self.transport.execute(&request)?)
    }
}
