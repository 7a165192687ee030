//! Response mapping: status check, JSON decoding, required-key validation.
//!
//! # Design
//! Every operation maps its response the same way, so the per-operation
//! knowledge is reduced to a list of key names ([`ResponseRecord::REQUIRED`]).
//! `require_fields` walks that list in order and reports the first absent
//! key; serde then builds the record and ignores any extra keys.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::records::{PaymentList, PaymentListEnvelope, ResponseRecord};

/// Map non-2xx status codes to `ApiError::Status`.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, "gateway returned an error status");
    Err(ApiError::Status {
        status: response.status,
        body: response.text().into_owned(),
    })
}

/// Check the status and decode the body as JSON.
pub fn decode_body(response: HttpResponse) -> Result<Value, ApiError> {
    check_status(&response)?;
    serde_json::from_slice(&response.body).map_err(ApiError::Decode)
}

/// Verify `value` is an object holding every key in `fields`.
///
/// Keys are checked in order; the error names the first one missing.
pub fn require_fields<'a>(value: &'a Value, fields: &[&str]) -> Result<&'a Map<String, Value>, ApiError> {
    let object = value.as_object().ok_or(ApiError::UnexpectedShape {
        expected: "a json object",
    })?;
    if let Some(missing) = fields.iter().find(|field| !object.contains_key(**field)) {
        tracing::warn!(field = %missing, "response json is missing a required field");
        return Err(ApiError::MissingField(missing.to_string()));
    }
    Ok(object)
}

/// Validate the required keys of `T`, then build it.
pub fn map_record<T: ResponseRecord>(value: Value) -> Result<T, ApiError> {
    require_fields(&value, T::REQUIRED)?;
    serde_json::from_value(value).map_err(ApiError::Decode)
}

/// Map a `GET /payment` envelope and each of its items, keeping item order.
pub fn map_payment_list(mut value: Value) -> Result<PaymentList, ApiError> {
    require_fields(&value, PaymentListEnvelope::REQUIRED)?;
    let items = match value.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(ApiError::UnexpectedShape {
                expected: "an array in the data field",
            })
        }
    };
    let envelope: PaymentListEnvelope = serde_json::from_value(value).map_err(ApiError::Decode)?;

    let mut list = PaymentList::from_envelope(envelope, items.len());
    for item in items {
        list.push(map_record(item)?);
    }
    Ok(list)
}

pub fn parse_record<T: ResponseRecord>(response: HttpResponse) -> Result<T, ApiError> {
    map_record(decode_body(response)?)
}

pub fn parse_payment_list(response: HttpResponse) -> Result<PaymentList, ApiError> {
    map_payment_list(decode_body(response)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::records::{MinimumAmount, PaymentState};

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    fn item(id: u64) -> Value {
        json!({
            "payment_id": id,
            "payment_status": "waiting",
            "pay_address": "addr",
            "price_amount": 10,
            "price_currency": "usd",
            "pay_amount": 0.001,
            "actually_paid": 0,
            "pay_currency": "btc",
            "order_id": null,
            "order_description": null,
        })
    }

    #[test]
    fn first_missing_field_is_reported_in_order() {
        let value = json!({ "currency_to": "ada" });
        let err = require_fields(&value, &["currency_from", "currency_to", "min_amount"]).unwrap_err();
        assert_eq!(err.missing_field(), Some("currency_from"));
    }

    #[test]
    fn null_value_counts_as_present() {
        let value = json!({ "order_id": null });
        assert!(require_fields(&value, &["order_id"]).is_ok());
    }

    #[test]
    fn non_object_is_unexpected_shape() {
        let err = require_fields(&json!([1, 2]), &["a"]).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape { .. }));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let value = json!({
            "currency_from": "btc",
            "currency_to": "ada",
            "min_amount": 0.001,
            "fiat_equivalent": 27.5,
        });
        let min: MinimumAmount = map_record(value).unwrap();
        assert_eq!(min.currency_from, "btc");
        assert_eq!(min.min_amount, rust_decimal::Decimal::new(1, 3));
    }

    #[test]
    fn wrong_type_is_decode_error() {
        let value = json!({ "currency_from": "btc", "currency_to": "ada", "min_amount": [] });
        let err = map_record::<MinimumAmount>(value).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn error_status_is_not_decoded() {
        let response = HttpResponse::new(403, r#"{"message":"Invalid api key"}"#);
        let err = parse_record::<MinimumAmount>(response).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, .. }));
    }

    #[test]
    fn null_in_non_optional_field_is_decode_error() {
        let value = json!({ "currency_from": "btc", "currency_to": null, "min_amount": 0.001 });
        let err = map_record::<MinimumAmount>(value).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.kind(), ErrorKind::Response);
        assert_eq!(err.missing_field(), None);
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = parse_record::<MinimumAmount>(ok("<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn non_utf8_success_body_is_response_error() {
        let response = HttpResponse::new(200, vec![b'{', b'"', 0xc3, 0x28, b'"', b'}']);
        let err = parse_record::<MinimumAmount>(response).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.kind(), ErrorKind::Response);
    }

    #[test]
    fn non_utf8_error_body_is_kept_as_text() {
        let response = HttpResponse::new(502, vec![b'b', b'a', b'd', 0xff]);
        match parse_record::<MinimumAmount>(response).unwrap_err() {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.starts_with("bad"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn payment_list_keeps_order_and_length() {
        let body = json!({
            "data": [item(3), item(1), item(2)],
            "limit": 10,
            "page": 0,
            "pagesCount": 1,
            "total": 3,
        });
        let list = map_payment_list(body).unwrap();
        assert_eq!(list.len(), 3);
        let ids: Vec<&str> = list.data.iter().map(|i| i.payment_id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(list.total, 3);
        assert_eq!(list.data[0].payment_status, PaymentState::Waiting);
    }

    #[test]
    fn payment_list_optional_fields() {
        let mut with_outcome = item(1);
        with_outcome["purchase_id"] = json!("777");
        with_outcome["outcome_amount"] = json!(9.5);
        with_outcome["outcome_currency"] = json!("usdt");
        let body = json!({
            "data": [item(2), with_outcome],
            "limit": 10,
            "page": 0,
            "pagesCount": 1,
            "total": 2,
        });
        let list = map_payment_list(body).unwrap();
        assert_eq!(list.data[0].purchase_id, None);
        assert_eq!(list.data[0].outcome_amount, None);
        assert_eq!(list.data[0].outcome_currency, None);
        assert_eq!(list.data[1].purchase_id.as_deref(), Some("777"));
        assert_eq!(list.data[1].outcome_amount, Some(rust_decimal::Decimal::new(95, 1)));
        assert_eq!(list.data[1].outcome_currency.as_deref(), Some("usdt"));
    }

    #[test]
    fn payment_list_item_missing_field_fails() {
        let mut broken = item(1);
        broken.as_object_mut().unwrap().remove("pay_address");
        let body = json!({
            "data": [item(2), broken],
            "limit": 10,
            "page": 0,
            "pagesCount": 1,
            "total": 2,
        });
        let err = map_payment_list(body).unwrap_err();
        assert_eq!(err.missing_field(), Some("pay_address"));
    }

    #[test]
    fn payment_list_data_must_be_array() {
        let body = json!({ "data": {}, "limit": 10, "page": 0, "pagesCount": 1, "total": 0 });
        let err = map_payment_list(body).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape { .. }));
    }

    #[test]
    fn payment_list_envelope_missing_field() {
        let body = json!({ "data": [], "limit": 10, "page": 0, "total": 0 });
        let err = map_payment_list(body).unwrap_err();
        assert_eq!(err.missing_field(), Some("pagesCount"));
    }
}
