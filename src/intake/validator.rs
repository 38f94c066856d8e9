//! Request Validator
//!
//! Pure function from raw request bytes to a [`TransferRequest`].
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. body parses as JSON with the expected fields
//! 2. `amount > 0`
//! 3. `source_id != target_id`
//! 4. `idempotency_key` is non-empty

use rust_decimal::Decimal;

use super::types::{RejectReason, TransferRequest};

pub fn validate(raw: &[u8]) -> Result<TransferRequest, RejectReason> {
    let req: TransferRequest =
        serde_json::from_slice(raw).map_err(|e| RejectReason::Malformed(e.to_string()))?;

    if req.amount <= Decimal::ZERO {
        return Err(RejectReason::NonPositiveAmount);
    }

    if req.source_id == req.target_id {
        return Err(RejectReason::SameAccount);
    }

    if req.idempotency_key.is_empty() {
        return Err(RejectReason::EmptyIdempotencyKey);
    }

    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_request() {
        let req = validate(
            br#"{"idempotency_key":"k1","source_id":1,"target_id":2,"amount":100.50}"#,
        )
        .unwrap();
        assert_eq!(req.idempotency_key, "k1");
        assert_eq!(req.source_id, 1);
        assert_eq!(req.target_id, 2);
        assert_eq!(req.amount, dec!(100.50));
    }

    #[test]
    fn test_camel_case_and_string_amount() {
        let req = validate(
            br#"{"idempotencyKey":"k2","sourceID":7,"targetID":9,"amount":"0.01"}"#,
        )
        .unwrap();
        assert_eq!(req.idempotency_key, "k2");
        assert_eq!(req.amount, dec!(0.01));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            validate(b"{not json"),
            Err(RejectReason::Malformed(_))
        ));
        assert!(matches!(validate(b""), Err(RejectReason::Malformed(_))));
        // Missing field
        assert!(matches!(
            validate(br#"{"idempotency_key":"k","source_id":1,"amount":1}"#),
            Err(RejectReason::Malformed(_))
        ));
        // Wrong type
        assert!(matches!(
            validate(br#"{"idempotency_key":"k","source_id":"one","target_id":2,"amount":1}"#),
            Err(RejectReason::Malformed(_))
        ));
    }

    #[test]
    fn test_zero_and_negative_amount() {
        assert_eq!(
            validate(br#"{"idempotency_key":"k","source_id":1,"target_id":2,"amount":0}"#),
            Err(RejectReason::NonPositiveAmount)
        );
        assert_eq!(
            validate(br#"{"idempotency_key":"k","source_id":1,"target_id":2,"amount":-5}"#),
            Err(RejectReason::NonPositiveAmount)
        );
    }

    #[test]
    fn test_same_account() {
        assert_eq!(
            validate(br#"{"idempotency_key":"k","source_id":3,"target_id":3,"amount":1}"#),
            Err(RejectReason::SameAccount)
        );
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(
            validate(br#"{"idempotency_key":"","source_id":1,"target_id":2,"amount":1}"#),
            Err(RejectReason::EmptyIdempotencyKey)
        );
    }

    #[test]
    fn test_rule_order() {
        // Every rule violated at once: amount is checked first
        assert_eq!(
            validate(br#"{"idempotency_key":"","source_id":1,"target_id":1,"amount":0}"#),
            Err(RejectReason::NonPositiveAmount)
        );
        // Same account reported before empty key
        assert_eq!(
            validate(br#"{"idempotency_key":"","source_id":1,"target_id":1,"amount":1}"#),
            Err(RejectReason::SameAccount)
        );
    }

    #[test]
    fn test_number_amount_keeps_exact_digits() {
        for amount in ["100.50", "12345678901234567.89", "0.10000000000000000001"] {
            let body = format!(
                r#"{{"idempotency_key":"k","source_id":1,"target_id":2,"amount":{}}}"#,
                amount
            );
            let req = validate(body.as_bytes()).unwrap();
            assert_eq!(req.amount.to_string(), amount);

            let payload = String::from_utf8(serde_json::to_vec(&req).unwrap()).unwrap();
            assert!(
                payload.contains(&format!(r#""amount":"{}""#, amount)),
                "payload {} lost digits of {}",
                payload,
                amount
            );
        }
    }

    #[test]
    fn test_payload_round_trips() {
        let req = validate(
            br#"{"idempotency_key":"k1","source_id":1,"target_id":2,"amount":100.50}"#,
        )
        .unwrap();
        let payload = serde_json::to_vec(&req).unwrap();
        let decoded: TransferRequest = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, req);
    }
}
