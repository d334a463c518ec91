//! Kani proof harnesses for the pure SAD rules.
//!
//! ```bash
//! cargo kani -p sweid-saml-signservice
//! ```
//!
//! | Category | Property | Harness |
//! |----------|----------|---------|
//! | Expiry | Never panics | `check_expiry_never_panics` |
//! | Expiry | Expired iff `exp < now - skew` | `expiry_matches_definition` |
//! | Expiry | Skew only widens acceptance | `larger_skew_never_rejects_more` |
//! | Issued at | Never panics | `check_issued_at_never_panics` |
//! | Issued at | Future iff `iat > now + skew` | `issued_at_matches_definition` |
//! | Codes | Mismatch rules report their own code | `audience_mismatch_code`, `issuer_mismatch_code` |

#![cfg(kani)]

use crate::error::SadErrorCode;
use crate::verification::{check_expiry, check_issued_at, validate_audience, validate_issuer};

const BOUND: i64 = 86_400 * 365 * 200;

mod expiry_proofs {
    use super::*;

    #[kani::proof]
    fn check_expiry_never_panics() {
        let exp: i64 = kani::any();
        let now: i64 = kani::any();
        let skew: i64 = kani::any();
        let _ = check_expiry(exp, now, skew);
    }

    #[kani::proof]
    fn expiry_matches_definition() {
        let exp: i64 = kani::any();
        let now: i64 = kani::any();
        let skew: i64 = kani::any();
        kani::assume(exp.abs() < BOUND && now.abs() < BOUND);
        kani::assume(skew >= 0 && skew < BOUND);

        assert_eq!(check_expiry(exp, now, skew).is_err(), exp < now - skew);
    }

    #[kani::proof]
    fn larger_skew_never_rejects_more() {
        let exp: i64 = kani::any();
        let now: i64 = kani::any();
        let skew: i64 = kani::any();
        let extra: i64 = kani::any();
        kani::assume(exp.abs() < BOUND && now.abs() < BOUND);
        kani::assume(skew >= 0 && skew < BOUND && extra >= 0 && extra < BOUND);

        if check_expiry(exp, now, skew).is_ok() {
            assert!(check_expiry(exp, now, skew + extra).is_ok());
        }
    }
}

mod issued_at_proofs {
    use super::*;

    #[kani::proof]
    fn check_issued_at_never_panics() {
        let iat: i64 = kani::any();
        let now: i64 = kani::any();
        let skew: i64 = kani::any();
        let _ = check_issued_at(iat, now, skew);
    }

    #[kani::proof]
    fn issued_at_matches_definition() {
        let iat: i64 = kani::any();
        let now: i64 = kani::any();
        let skew: i64 = kani::any();
        kani::assume(iat.abs() < BOUND && now.abs() < BOUND);
        kani::assume(skew >= 0 && skew < BOUND);

        assert_eq!(check_issued_at(iat, now, skew).is_err(), iat > now + skew);
    }
}

mod code_proofs {
    use super::*;

    #[kani::proof]
    #[kani::unwind(4)]
    fn audience_mismatch_code() {
        let a: [u8; 2] = kani::any();
        let b: [u8; 2] = kani::any();
        kani::assume(a.is_ascii() && b.is_ascii());
        let a = std::str::from_utf8(&a).unwrap_or("");
        let b = std::str::from_utf8(&b).unwrap_or("");

        match validate_audience(a, b) {
            Ok(()) => assert_eq!(a, b),
            Err(err) => assert_eq!(err.code, SadErrorCode::AudienceMismatch),
        }
    }

    #[kani::proof]
    #[kani::unwind(4)]
    fn issuer_mismatch_code() {
        let a: [u8; 2] = kani::any();
        let b: [u8; 2] = kani::any();
        kani::assume(a.is_ascii() && b.is_ascii());
        let a = std::str::from_utf8(&a).unwrap_or("");
        let b = std::str::from_utf8(&b).unwrap_or("");

        match validate_issuer(a, b) {
            Ok(()) => assert_eq!(a, b),
            Err(err) => assert_eq!(err.code, SadErrorCode::IssuerMismatch),
        }
    }
}
