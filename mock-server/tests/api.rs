use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, Db, MOCK_BASIC, MOCK_EMAIL, MOCK_PASSWORD, MOCK_TOKEN};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", "KEY")
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("x-api-key", "KEY")
        .body(body.to_string())
        .unwrap()
}

// --- status / auth headers ---

#[tokio::test]
async fn status_needs_no_key() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/status").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "message": "OK" }));
}

#[tokio::test]
async fn currencies_without_key_is_forbidden() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/currencies").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "INVALID_API_KEY");
}

#[tokio::test]
async fn currencies_with_key() {
    let resp = app().oneshot(get("/v1/currencies")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["currencies"].as_array().unwrap().contains(&json!("btc")));
}

// --- estimate / min amount ---

#[tokio::test]
async fn estimate_converts_through_usd() {
    let resp = app()
        .oneshot(get("/v1/estimate?amount=80000&currency_from=usd&currency_to=btc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["currency_from"], "usd");
    assert_eq!(body["amount_from"], json!(80000.0));
    assert_eq!(body["estimated_amount"], json!(2.0));
}

#[tokio::test]
async fn estimate_missing_param_is_rejected() {
    let resp = app()
        .oneshot(get("/v1/estimate?amount=1&currency_from=usd"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn min_amount_echoes_pair() {
    let resp = app()
        .oneshot(get("/v1/min-amount?currency_from=btc&currency_to=ada"))
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await,
        json!({ "currency_from": "btc", "currency_to": "ada", "min_amount": 0.001 })
    );
}

// --- payments ---

#[tokio::test]
async fn create_then_fetch_payment() {
    let db = Db::default();
    let resp = router(db.clone())
        .oneshot(json_request(
            "POST",
            "/v1/payment",
            r#"{"price_amount":3999.5,"price_currency":"usd","pay_currency":"btc","order_id":"RGDBP-21314"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["payment_status"], "waiting");
    assert_eq!(created["order_id"], "RGDBP-21314");
    assert!(created["order_description"].is_null());
    let id = created["payment_id"].as_str().unwrap().to_string();

    let resp = router(db.clone())
        .oneshot(get(&format!("/v1/payment/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let status = body_json(resp).await;
    assert_eq!(status["payment_id"].to_string(), id);
    assert!(status.as_object().unwrap().contains_key("outcome_amount"));
    assert_eq!(db.read().await.payments().len(), 1);
}

#[tokio::test]
async fn create_payment_requires_payout_currency() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v1/payment",
            r#"{"price_amount":1,"price_currency":"usd","pay_currency":"btc","payout_address":"addr"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_payment_is_not_found() {
    let resp = app().oneshot(get("/v1/payment/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_payments_envelope() {
    let db = Db::default();
    for amount in [30, 10, 20] {
        let body = format!(r#"{{"price_amount":{amount},"price_currency":"usd","pay_currency":"eth"}}"#);
        router(db.clone())
            .oneshot(json_request("POST", "/v1/payment", &body))
            .await
            .unwrap();
    }
    let resp = router(db)
        .oneshot(get("/v1/payment?limit=2&page=0&sortBy=price_amount&orderBy=desc"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["limit"], 2);
    assert_eq!(body["pagesCount"], 2);
    assert_eq!(body["total"], 3);
    let amounts: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["price_amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, [30.0, 20.0]);
}

#[tokio::test]
async fn list_payments_rejects_large_limit() {
    let resp = app().oneshot(get("/v1/payment?limit=501")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- invoice ---

#[tokio::test]
async fn invoice_echoes_request() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v1/invoice",
            r#"{"price_amount":4.0234,"price_currency":"btc","cancel_url":"https://cancel.url"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["price_amount"], "4.0234");
    assert_eq!(body["price_currency"], "btc");
    assert_eq!(body["cancel_url"], "https://cancel.url");
    assert!(body["success_url"].is_null());
    assert!(body["invoice_url"].as_str().unwrap().contains(body["id"].as_str().unwrap()));
}

#[tokio::test]
async fn invoice_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/invoice", r#"{"price_currency":"btc"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- sub-partner ---

#[tokio::test]
async fn auth_issues_token() {
    let body = format!(r#"{{"email":"{MOCK_EMAIL}","password":"{MOCK_PASSWORD}"}}"#);
    let resp = app().oneshot(json_request("POST", "/v1/auth", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "token": MOCK_TOKEN }));
}

#[tokio::test]
async fn auth_rejects_wrong_password() {
    let body = format!(r#"{{"email":"{MOCK_EMAIL}","password":"nope"}}"#);
    let resp = app().oneshot(json_request("POST", "/v1/auth", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sub_partner_requires_authorization() {
    let resp = app().oneshot(get("/v1/sub-partner?id=111")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(!body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn sub_partner_get_echoes_query() {
    let req = Request::builder()
        .uri("/v1/sub-partner?id=111&order=DESC")
        .header("x-api-key", "KEY")
        .header(http::header::AUTHORIZATION, format!("Bearer {MOCK_TOKEN}"))
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "path": "", "result": { "id": "111", "order": "DESC" } })
    );
}

#[tokio::test]
async fn sub_partner_post_accepts_basic_auth() {
    let req = Request::builder()
        .method("POST")
        .uri("/v1/sub-partner/transfer")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("x-api-key", "KEY")
        .header(http::header::AUTHORIZATION, format!("Basic {MOCK_BASIC}"))
        .body(r#"{"id":111,"limit":10}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "path": "transfer", "result": { "id": 111, "limit": 10 } })
    );
}
