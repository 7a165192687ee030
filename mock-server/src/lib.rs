//! In-memory imitation of the NOWPayments v1 REST API.
//!
//! Covers the endpoints the client speaks to, with the gateway's field names
//! and null/absent conventions. Exchange rates and timestamps are fixed so
//! responses are deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const MOCK_EMAIL: &str = "partner@example.com";
pub const MOCK_PASSWORD: &str = "secret";
pub const MOCK_TOKEN: &str = "mock-jwt-token";
/// `Basic` credentials for `MOCK_EMAIL:MOCK_PASSWORD`.
pub const MOCK_BASIC: &str = "cGFydG5lckBleGFtcGxlLmNvbTpzZWNyZXQ=";
pub const MIN_AMOUNT: f64 = 0.001;

const TIMESTAMP: &str = "2024-05-01T12:00:00.000Z";
const FIRST_PAYMENT_ID: u64 = 5_524_759_814;
const MAX_LIMIT: u32 = 500;

#[derive(Clone, Debug, PartialEq)]
pub struct StoredPayment {
    pub payment_id: u64,
    pub payment_status: String,
    pub pay_address: String,
    pub price_amount: f64,
    pub price_currency: String,
    pub pay_amount: f64,
    pub actually_paid: f64,
    pub pay_currency: String,
    pub order_id: Option<String>,
    pub order_description: Option<String>,
    pub ipn_callback_url: Option<String>,
    pub purchase_id: Option<String>,
    pub outcome_amount: Option<f64>,
    pub outcome_currency: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    payments: Vec<StoredPayment>,
    next_invoice: u64,
}

impl Store {
    pub fn payments(&self) -> &[StoredPayment] {
        &self.payments
    }

    /// Mark a payment as fully paid and fill in the outcome fields.
    pub fn settle(&mut self, payment_id: u64) -> bool {
        let Some(payment) = self.payments.iter_mut().find(|p| p.payment_id == payment_id) else {
            return false;
        };
        payment.payment_status = "finished".to_string();
        payment.actually_paid = payment.pay_amount;
        payment.outcome_amount = Some(round8(payment.pay_amount * 0.995));
        payment.outcome_currency = Some(payment.pay_currency.clone());
        true
    }
}

pub type Db = Arc<RwLock<Store>>;

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    router(Db::default())
}

pub fn router(db: Db) -> Router {
    let v1 = Router::new()
        .route("/status", get(status))
        .route("/currencies", get(currencies))
        .route("/estimate", get(estimate))
        .route("/payment", get(list_payments).post(create_payment))
        .route("/payment/{id}", get(payment_status))
        .route("/min-amount", get(min_amount))
        .route("/invoice", post(create_invoice))
        .route("/auth", post(auth))
        .route("/sub-partner", get(passthrough_get).post(passthrough_post))
        .route(
            "/sub-partner/{*rest}",
            get(passthrough_get_nested).post(passthrough_post_nested),
        );
    Router::new().nest("/v1", v1).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Db::default()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

fn failure(status: StatusCode, code: &str, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "status": false,
            "statusCode": status.as_u16(),
            "code": code,
            "message": message.into(),
        })),
    )
}

fn require_api_key(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    match headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(failure(StatusCode::FORBIDDEN, "INVALID_API_KEY", "Invalid api key")),
    }
}

fn require_partner_auth(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    require_api_key(headers)?;
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let bearer = format!("Bearer {MOCK_TOKEN}");
    let basic = format!("Basic {MOCK_BASIC}");
    if authorization == bearer || authorization == basic {
        Ok(())
    } else {
        Err(failure(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", "Authorization header is invalid"))
    }
}

fn usd_rate(currency: &str) -> f64 {
    match currency {
        "btc" => 40_000.0,
        "eth" => 2_000.0,
        "ltc" => 80.0,
        "xmr" => 150.0,
        "ada" => 0.5,
        "trx" => 0.1,
        "doge" => 0.08,
        "eur" => 1.1,
        _ => 1.0,
    }
}

fn convert(amount: f64, from: &str, to: &str) -> f64 {
    round8(amount * usd_rate(from) / usd_rate(to))
}

fn round8(value: f64) -> f64 {
    (value * 1e8).round() / 1e8
}

async fn status() -> Json<Value> {
    Json(json!({ "message": "OK" }))
}

async fn currencies(headers: HeaderMap) -> Reply {
    require_api_key(&headers)?;
    Ok(Json(json!({
        "currencies": ["btc", "eth", "ltc", "xmr", "ada", "trx", "doge", "usdt"]
    })))
}

#[derive(Deserialize)]
struct EstimateParams {
    amount: f64,
    currency_from: String,
    currency_to: String,
}

async fn estimate(headers: HeaderMap, Query(params): Query<EstimateParams>) -> Reply {
    require_api_key(&headers)?;
    tracing::debug!(amount = params.amount, from = %params.currency_from, to = %params.currency_to, "estimate");
    Ok(Json(json!({
        "currency_from": params.currency_from,
        "amount_from": params.amount,
        "currency_to": params.currency_to,
        "estimated_amount": convert(params.amount, &params.currency_from, &params.currency_to),
    })))
}

#[derive(Deserialize)]
struct CreatePayment {
    price_amount: f64,
    price_currency: String,
    pay_amount: Option<f64>,
    pay_currency: String,
    ipn_callback_url: Option<String>,
    order_id: Option<String>,
    order_description: Option<String>,
    purchase_id: Option<String>,
    payout_address: Option<String>,
    payout_currency: Option<String>,
}

async fn create_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePayment>,
) -> Reply {
    require_api_key(&headers)?;
    if input.price_amount <= 0.0 {
        return Err(failure(StatusCode::BAD_REQUEST, "INVALID_REQUEST_PARAMS", "price_amount must be positive"));
    }
    if input.payout_address.is_some() && input.payout_currency.is_none() {
        return Err(failure(StatusCode::BAD_REQUEST, "INVALID_REQUEST_PARAMS", "payout_currency is required"));
    }

    let mut store = db.write().await;
    let payment_id = FIRST_PAYMENT_ID + store.payments.len() as u64;
    let payment = StoredPayment {
        payment_id,
        payment_status: "waiting".to_string(),
        pay_address: format!("addr-{}-{payment_id}", input.pay_currency),
        price_amount: input.price_amount,
        pay_amount: input
            .pay_amount
            .unwrap_or_else(|| convert(input.price_amount, &input.price_currency, &input.pay_currency)),
        price_currency: input.price_currency,
        actually_paid: 0.0,
        pay_currency: input.pay_currency,
        order_id: input.order_id,
        order_description: input.order_description,
        ipn_callback_url: input.ipn_callback_url,
        purchase_id: Some(input.purchase_id.unwrap_or_else(|| (payment_id + 1_000).to_string())),
        outcome_amount: None,
        outcome_currency: None,
    };
    tracing::debug!(payment_id, "payment created");
    store.payments.push(payment.clone());

    Ok(Json(json!({
        "payment_id": payment.payment_id.to_string(),
        "payment_status": payment.payment_status,
        "pay_address": payment.pay_address,
        "price_amount": payment.price_amount,
        "price_currency": payment.price_currency,
        "pay_amount": payment.pay_amount,
        "pay_currency": payment.pay_currency,
        "order_id": payment.order_id,
        "order_description": payment.order_description,
        "ipn_callback_url": payment.ipn_callback_url,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "purchase_id": payment.purchase_id,
    })))
}

async fn payment_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    require_api_key(&headers)?;
    let store = db.read().await;
    let payment = id
        .parse::<u64>()
        .ok()
        .and_then(|id| store.payments.iter().find(|p| p.payment_id == id))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND", format!("Payment {id} not found")))?;

    Ok(Json(json!({
        "payment_id": payment.payment_id,
        "payment_status": payment.payment_status,
        "pay_address": payment.pay_address,
        "price_amount": payment.price_amount,
        "price_currency": payment.price_currency,
        "pay_amount": payment.pay_amount,
        "actually_paid": payment.actually_paid,
        "pay_currency": payment.pay_currency,
        "order_id": payment.order_id,
        "order_description": payment.order_description,
        "purchase_id": payment.purchase_id,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "outcome_amount": payment.outcome_amount,
        "outcome_currency": payment.outcome_currency,
    })))
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<u32>,
    page: Option<u32>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    #[serde(rename = "orderBy")]
    order_by: Option<String>,
}

/// List items omit the optional keys entirely rather than sending `null`.
fn list_item(payment: &StoredPayment) -> Value {
    let mut item = Map::new();
    item.insert("payment_id".into(), json!(payment.payment_id));
    item.insert("payment_status".into(), json!(payment.payment_status));
    item.insert("pay_address".into(), json!(payment.pay_address));
    item.insert("price_amount".into(), json!(payment.price_amount));
    item.insert("price_currency".into(), json!(payment.price_currency));
    item.insert("pay_amount".into(), json!(payment.pay_amount));
    item.insert("actually_paid".into(), json!(payment.actually_paid));
    item.insert("pay_currency".into(), json!(payment.pay_currency));
    item.insert("order_id".into(), json!(payment.order_id));
    item.insert("order_description".into(), json!(payment.order_description));
    if let Some(purchase_id) = &payment.purchase_id {
        item.insert("purchase_id".into(), json!(purchase_id));
    }
    if let Some(amount) = payment.outcome_amount {
        item.insert("outcome_amount".into(), json!(amount));
    }
    if let Some(currency) = &payment.outcome_currency {
        item.insert("outcome_currency".into(), json!(currency));
    }
    Value::Object(item)
}

async fn list_payments(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    require_api_key(&headers)?;
    let limit = params.limit.unwrap_or(10);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(failure(StatusCode::BAD_REQUEST, "INVALID_REQUEST_PARAMS", "limit must be in [1, 500]"));
    }
    let page = params.page.unwrap_or(0);

    let store = db.read().await;
    let mut payments: Vec<&StoredPayment> = store.payments.iter().collect();
    match params.sort_by.as_deref() {
        Some("price_amount") => payments.sort_by(|a, b| a.price_amount.total_cmp(&b.price_amount)),
        Some("pay_amount") => payments.sort_by(|a, b| a.pay_amount.total_cmp(&b.pay_amount)),
        Some("payment_status") => payments.sort_by(|a, b| a.payment_status.cmp(&b.payment_status)),
        _ => payments.sort_by_key(|p| p.payment_id),
    }
    if params.order_by.as_deref() == Some("desc") {
        payments.reverse();
    }

    let total = payments.len();
    let limit_usize = limit as usize;
    let pages_count = total.div_ceil(limit_usize);
    let data: Vec<Value> = payments
        .into_iter()
        .skip(page as usize * limit_usize)
        .take(limit_usize)
        .map(list_item)
        .collect();

    Ok(Json(json!({
        "data": data,
        "limit": limit,
        "page": page,
        "pagesCount": pages_count,
        "total": total,
    })))
}

#[derive(Deserialize)]
struct MinAmountParams {
    currency_from: String,
    currency_to: Option<String>,
}

async fn min_amount(headers: HeaderMap, Query(params): Query<MinAmountParams>) -> Reply {
    require_api_key(&headers)?;
    Ok(Json(json!({
        "currency_from": params.currency_from,
        "currency_to": params.currency_to.unwrap_or_else(|| "usdt".to_string()),
        "min_amount": MIN_AMOUNT,
    })))
}

#[derive(Deserialize)]
struct CreateInvoice {
    price_amount: f64,
    price_currency: String,
    pay_currency: Option<String>,
    ipn_callback_url: Option<String>,
    order_id: Option<String>,
    order_description: Option<String>,
    success_url: Option<String>,
    cancel_url: Option<String>,
}

async fn create_invoice(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateInvoice>,
) -> Reply {
    require_api_key(&headers)?;
    if input.price_amount <= 0.0 {
        return Err(failure(StatusCode::BAD_REQUEST, "INVALID_REQUEST_PARAMS", "price_amount must be positive"));
    }
    let id = {
        let mut store = db.write().await;
        store.next_invoice += 1;
        4_522_625_842 + store.next_invoice
    };
    tracing::debug!(id, "invoice created");

    // The gateway echoes price_amount back as a string.
    Ok(Json(json!({
        "id": id.to_string(),
        "order_id": input.order_id,
        "order_description": input.order_description,
        "price_amount": input.price_amount.to_string(),
        "price_currency": input.price_currency,
        "pay_currency": input.pay_currency,
        "ipn_callback_url": input.ipn_callback_url,
        "invoice_url": format!("https://nowpayments.io/payment/?iid={id}"),
        "success_url": input.success_url,
        "cancel_url": input.cancel_url,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
    })))
}

#[derive(Deserialize)]
struct AuthInput {
    email: String,
    password: String,
}

async fn auth(headers: HeaderMap, Json(input): Json<AuthInput>) -> Reply {
    require_api_key(&headers)?;
    if input.email == MOCK_EMAIL && input.password == MOCK_PASSWORD {
        Ok(Json(json!({ "token": MOCK_TOKEN })))
    } else {
        Err(failure(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "Invalid email or password"))
    }
}

fn echo(headers: &HeaderMap, path: String, result: Value) -> Reply {
    require_partner_auth(headers)?;
    tracing::debug!(%path, "sub-partner call");
    Ok(Json(json!({ "path": path, "result": result })))
}

async fn passthrough_get(headers: HeaderMap, Query(params): Query<BTreeMap<String, String>>) -> Reply {
    echo(&headers, String::new(), json!(params))
}

async fn passthrough_get_nested(
    headers: HeaderMap,
    Path(rest): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Reply {
    echo(&headers, rest, json!(params))
}

async fn passthrough_post(headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    echo(&headers, String::new(), body)
}

async fn passthrough_post_nested(
    headers: HeaderMap,
    Path(rest): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    echo(&headers, rest, body)
}
