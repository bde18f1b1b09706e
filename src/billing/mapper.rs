//! Turns raw billing-service responses into decoded bodies and local records.
//!
//! Per transaction: `Requested -> Created | Rejected | Ambiguous`. Only a
//! `Created` outcome carries a `BillingTransaction`.

use crate::billing::types::{OrderResponse, PaymentRequest, PaymentResponse};
use crate::config::DecodePolicy;
use crate::database::billing_transaction_repository::BillingTransaction;
use crate::error::{BillingError, BillingResult};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

/// Status, headers and fully read body of a billing-service response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response with no headers. Unknown status codes become 500.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Sent, no answer from the service
    Requested,
    /// 2xx with a decodable body
    Created,
    /// Non-2xx
    Rejected,
    /// 2xx whose body could not be decoded. Under the strict policy this is
    /// reported as `BillingError::Decode`; the lenient policy returns it as `Ok`.
    Ambiguous,
}

impl TransactionState {
    pub fn of<T>(result: &BillingResult<Mapped<T>>) -> Self {
        match result {
            Ok(mapped) => mapped.state,
            Err(BillingError::Http { .. }) => TransactionState::Rejected,
            Err(BillingError::Decode { .. }) => TransactionState::Ambiguous,
            Err(_) => TransactionState::Requested,
        }
    }
}

/// A decoded response plus the record to store, if any
#[derive(Debug, Clone)]
pub struct Mapped<T> {
    pub response: T,
    pub transaction: Option<BillingTransaction>,
    pub state: TransactionState,
}

impl<T: Default> Mapped<T> {
    fn ambiguous() -> Self {
        Self {
            response: T::default(),
            transaction: None,
            state: TransactionState::Ambiguous,
        }
    }
}

impl<T> Mapped<T> {
    fn created(response: T, transaction: BillingTransaction) -> Self {
        Self {
            response,
            transaction: Some(transaction),
            state: TransactionState::Created,
        }
    }

    pub fn is_created(&self) -> bool {
        self.state == TransactionState::Created
    }
}

/// Decode a 2xx body. Non-2xx responses become `BillingError::Http`.
///
/// `Ok(None)` only under `DecodePolicy::Lenient` when the body does not parse.
pub fn decode_body<T: DeserializeOwned>(
    raw: &RawResponse,
    policy: DecodePolicy,
) -> BillingResult<Option<T>> {
    if !raw.is_success() {
        let body = raw.body_text();
        error!(status = raw.status.as_u16(), body = %body, "billing service rejected request");
        return Err(BillingError::Http {
            status: raw.status.as_u16(),
            body,
        });
    }

    match serde_json::from_slice::<T>(&raw.body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => match policy {
            DecodePolicy::Strict => Err(BillingError::Decode {
                message: e.to_string(),
                body: raw.body_text(),
            }),
            DecodePolicy::Lenient => {
                warn!(
                    status = raw.status.as_u16(),
                    error = %e,
                    "Can not unmarshal billing response, continuing without a record"
                );
                Ok(None)
            }
        },
    }
}

/// Decode a lookup response; no record is produced.
pub fn map_status<T: DeserializeOwned + Default>(
    raw: &RawResponse,
    policy: DecodePolicy,
) -> BillingResult<T> {
    Ok(decode_body(raw, policy)?.unwrap_or_default())
}

pub fn map_order(
    raw: &RawResponse,
    transaction_id: &str,
    policy: DecodePolicy,
) -> BillingResult<Mapped<OrderResponse>> {
    let Some(response) = decode_body::<OrderResponse>(raw, policy)? else {
        return Ok(Mapped::ambiguous());
    };

    let transaction = BillingTransaction::new(transaction_id, response.payment_token.clone())
        .with_order_id(response.order_id.clone());
    info!(
        app_trx_id = %transaction_id,
        order_id = %response.order_id,
        "billing order created"
    );
    Ok(Mapped::created(response, transaction))
}

pub fn map_payment(
    raw: &RawResponse,
    request: &PaymentRequest,
    policy: DecodePolicy,
) -> BillingResult<Mapped<PaymentResponse>> {
    let Some(response) = decode_body::<PaymentResponse>(raw, policy)? else {
        return Ok(Mapped::ambiguous());
    };

    let mut transaction =
        BillingTransaction::new(request.transaction_id.clone(), response.token.clone())
            .with_country_code(request.country.as_deref());
    if !response.payment_id.is_empty() {
        transaction = transaction.with_payment_id(response.payment_id.clone());
    }
    info!(
        app_trx_id = %request.transaction_id,
        payment_id = %response.payment_id,
        "billing payment created"
    );
    Ok(Mapped::created(response, transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::types::PaymentStatusResponse;

    fn payment_request() -> PaymentRequest {
        PaymentRequest {
            app_id: "app-1".to_string(),
            transaction_id: "trx-1".to_string(),
            total_amount: 2500,
            ..Default::default()
        }
    }

    #[test]
    fn created_order_copies_identity_fields() {
        let raw = RawResponse::new(
            201,
            r#"{"OrderId":"ord-9","PaymentToken":"tok-9","PaymentUrl":"https://pay/x"}"#,
        );
        let mapped = map_order(&raw, "trx-1", DecodePolicy::Strict).expect("should map");
        assert!(mapped.is_created());
        let trx = mapped.transaction.expect("record should exist");
        assert_eq!(trx.payment_token, "tok-9");
        assert_eq!(trx.order_id.as_deref(), Some("ord-9"));
        assert_eq!(trx.app_trx_id, "trx-1");
        assert_eq!(trx.country_code, "SEN");
        assert_eq!(mapped.response.payment_url, "https://pay/x");
    }

    #[test]
    fn rejected_response_carries_body_and_no_record() {
        let raw = RawResponse::new(404, r#"{"error":"not found"}"#);
        let result = map_order(&raw, "trx-1", DecodePolicy::Strict);
        assert_eq!(TransactionState::of(&result), TransactionState::Rejected);
        let err = result.expect_err("should be rejected");
        assert!(err.to_string().contains(r#"{"error":"not found"}"#));
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn undecodable_body_is_error_under_strict_policy() {
        let raw = RawResponse::new(200, "<html>oops</html>");
        let err = map_order(&raw, "trx-1", DecodePolicy::Strict).expect_err("should fail");
        match err {
            BillingError::Decode { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_is_ambiguous_under_strict_policy() {
        let raw = RawResponse::new(200, "<html>oops</html>");
        let result = map_order(&raw, "trx-1", DecodePolicy::Strict);
        assert!(result.is_err());
        assert_eq!(TransactionState::of(&result), TransactionState::Ambiguous);
    }

    #[test]
    fn undecodable_body_is_ambiguous_under_lenient_policy() {
        let raw = RawResponse::new(200, "<html>oops</html>");
        let result = map_payment(&raw, &payment_request(), DecodePolicy::Lenient);
        assert_eq!(TransactionState::of(&result), TransactionState::Ambiguous);
        let mapped = result.expect("lenient decode should succeed");
        assert!(mapped.transaction.is_none());
        assert_eq!(mapped.response, PaymentResponse::default());
    }

    #[test]
    fn payment_uses_request_country_and_payment_id() {
        let mut request = payment_request();
        request.country = Some("civ".to_string());
        let raw = RawResponse::new(200, r#"{"Token":"ptok","PaymentId":"pay-7"}"#);
        let mapped = map_payment(&raw, &request, DecodePolicy::Strict).expect("should map");
        let trx = mapped.transaction.expect("record should exist");
        assert_eq!(trx.payment_token, "ptok");
        assert_eq!(trx.payment_id.as_deref(), Some("pay-7"));
        assert_eq!(trx.country_code, "CIV");
        assert!(trx.order_id.is_none());
    }

    #[test]
    fn payment_without_id_leaves_it_unset() {
        let raw = RawResponse::new(200, r#"{"Token":"ptok"}"#);
        let mapped = map_payment(&raw, &payment_request(), DecodePolicy::Strict).expect("map");
        assert!(mapped.transaction.expect("record").payment_id.is_none());
    }

    #[test]
    fn status_lookup_defaults_under_lenient_policy() {
        let raw = RawResponse::new(200, "not json");
        let status: PaymentStatusResponse =
            map_status(&raw, DecodePolicy::Lenient).expect("lenient decode");
        assert_eq!(status, PaymentStatusResponse::default());

        let strict: BillingResult<PaymentStatusResponse> = map_status(&raw, DecodePolicy::Strict);
        assert!(matches!(strict, Err(BillingError::Decode { .. })));
    }

    #[test]
    fn boundary_statuses() {
        let ok = RawResponse::new(299, r#"{"Token":"t"}"#);
        assert!(map_payment(&ok, &payment_request(), DecodePolicy::Strict).is_ok());

        let redirect = RawResponse::new(300, "moved");
        let err = map_payment(&redirect, &payment_request(), DecodePolicy::Strict)
            .expect_err("300 is not success");
        assert_eq!(err.to_string(), "moved");
    }

    #[test]
    fn network_failure_state_is_requested() {
        let result: BillingResult<Mapped<OrderResponse>> = Err(BillingError::Network {
            message: "connection refused".to_string(),
        });
        assert_eq!(TransactionState::of(&result), TransactionState::Requested);
    }
}
