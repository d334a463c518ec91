//! Kani Arbitrary implementations and proof harnesses for the profile
//! tables.
//!
//! # Usage
//!
//! Kani is not a Cargo dependency. Install and run with:
//!
//! ```bash
//! cargo install --locked kani-verifier
//! cargo kani setup
//! cargo kani --features kani
//! ```
//!
//! This module is only compiled when using Kani (`#[cfg(kani)]`).

use crate::{LevelOfAssurance, LoaSet, ValueFormat};

const FORMATS: [ValueFormat; 5] = [
    ValueFormat::Text,
    ValueFormat::PersonalIdentityNumber,
    ValueFormat::Date,
    ValueFormat::CountryCode,
    ValueFormat::Scoped,
];

impl kani::Arbitrary for LevelOfAssurance {
    fn any() -> Self {
        let all = LevelOfAssurance::all();
        let idx: usize = kani::any();
        kani::assume(idx < all.len());
        all[idx]
    }
}

impl kani::Arbitrary for ValueFormat {
    fn any() -> Self {
        let idx: usize = kani::any();
        kani::assume(idx < FORMATS.len());
        FORMATS[idx]
    }
}

/// Short ASCII strings over the characters the format rules branch on.
fn arbitrary_value() -> String {
    let chars = b"09AZaz-@ ";
    let len: usize = kani::any();
    kani::assume(len <= 4);
    (0..len)
        .map(|_| {
            let idx: usize = kani::any();
            kani::assume(idx < chars.len());
            chars[idx] as char
        })
        .collect()
}

// ============================================================================
// Proof harnesses
// ============================================================================

#[kani::proof]
#[kani::unwind(20)]
fn proof_loa_uri_roundtrip() {
    let loa: LevelOfAssurance = kani::any();
    assert_eq!(LevelOfAssurance::from_uri(loa.uri()), Ok(loa));
}

#[kani::proof]
fn proof_holder_of_key_levels_are_swedish() {
    let loa: LevelOfAssurance = kani::any();
    if loa.requires_holder_of_key() {
        assert!(!loa.is_eidas());
    }
}

#[kani::proof]
fn proof_notified_levels_are_eidas() {
    let loa: LevelOfAssurance = kani::any();
    if loa.is_notified() {
        assert!(loa.is_eidas());
    }
}

#[kani::proof]
#[kani::unwind(20)]
fn proof_loa_set_insert_is_idempotent() {
    let loa: LevelOfAssurance = kani::any();
    let mut set = LoaSet::new();
    set.insert(loa);
    set.insert(loa);
    assert_eq!(set.len(), 1);
    assert!(set.contains(loa));
}

#[kani::proof]
#[kani::unwind(6)]
fn proof_value_check_never_panics() {
    let format: ValueFormat = kani::any();
    let value = arbitrary_value();
    let _ = format.check(&value);
}

#[kani::proof]
#[kani::unwind(6)]
fn proof_blank_values_never_pass() {
    let format: ValueFormat = kani::any();
    let value = arbitrary_value();
    kani::assume(value.trim().is_empty());
    assert!(!format.check(&value));
}
