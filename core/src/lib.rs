//! Synchronous client for the NOWPayments cryptocurrency payment gateway.
//!
//! # Overview
//! Every endpoint follows the same pipeline: `RequestBuilder` validates the
//! input and produces an `HttpRequest`, a `Transport` executes it, and the
//! mapper checks the response for its required keys before building a typed
//! record. `NowPaymentsClient` strings the three together.
//!
//! # Design
//! - Builders and the mapper are pure; only the transport does I/O, so both
//!   halves test without a network.
//! - `UreqTransport` (feature `ureq`, default) is the bundled blocking
//!   transport. Anything implementing `Transport` can replace it.
//! - Required response keys are data (`ResponseRecord::REQUIRED`), checked
//!   by one routine for every operation.
//! - Errors carry a kind: validation (nothing sent), transport, or response.

pub mod builder;
pub mod client;
pub mod config;
pub mod currency;
pub mod error;
pub mod http;
pub mod mapper;
pub mod records;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use builder::RequestBuilder;
pub use client::NowPaymentsClient;
pub use config::{ClientConfig, Credentials};
pub use currency::Currency;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use records::{
    ApiStatus, AuthToken, Estimate, Invoice, MinimumAmount, Payment, PaymentList, PaymentListItem,
    PaymentState, PaymentStatus, ResponseRecord,
};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    InvoiceRequest, ListPaymentsQuery, ParamValue, PaymentRequest, SortField, SortOrder,
};

pub use rust_decimal::Decimal;
