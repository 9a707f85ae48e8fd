// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

#[test]
fn test_parse_and_display() {
    let c: Coin = "100stake".parse().unwrap();
    assert_eq!(c, Coin::new(100, "stake"));
    assert_eq!(c.to_string(), "100stake");

    let set = coins("500bbb, 50aaa");
    assert_eq!(set.to_string(), "50aaa,500bbb");
    assert_eq!(set.len(), 2);

    assert!(coins("").is_zero());
    assert_eq!(Coins::new().to_string(), "");
    // Zero entries are dropped.
    assert!(coins("0stake").is_zero());
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!("stake".parse::<Coin>().is_err());
    assert!("100".parse::<Coin>().is_err());
    assert!("100s".parse::<Coin>().is_err());
    assert!("100sta ke".parse::<Coin>().is_err());
    assert!("1stake,2stake".parse::<Coins>().is_err());
    assert!(validate_denom("ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2").is_ok());
}

#[test]
fn test_arithmetic() {
    let a = coins("100stake,5atom");
    let b = coins("30stake");

    assert_eq!(a.add(&b), coins("130stake,5atom"));
    assert_eq!(a.checked_sub(&b), Some(coins("70stake,5atom")));
    assert_eq!(b.checked_sub(&a), None);
    assert_eq!(b.saturating_sub(&a), Coins::new());
    assert_eq!(a.checked_sub(&a), Some(Coins::new()));
    assert_eq!(a.amount_of("stake"), 100);
    assert_eq!(a.amount_of("nope"), 0);
}

#[test]
fn test_comparisons() {
    let fee = coins("100stake,5atom");
    assert!(fee.is_all_gte(&coins("100stake")));
    assert!(!fee.is_all_gte(&coins("100stake,6atom")));
    assert!(fee.is_all_gte(&Coins::new()));

    assert!(fee.is_any_gte(&coins("1000stake,5atom")));
    assert!(!fee.is_any_gte(&coins("1000stake,6atom")));
    assert!(!fee.is_any_gte(&Coins::new()));
}

#[test]
fn test_serde_uses_display_form() {
    let set = coins("7stake,3atom");
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, "\"3atom,7stake\"");
    let back: Coins = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
}

proptest! {
    #[test]
    fn test_add_then_sub_restores(a in 0u64..1_000_000, b in 0u64..1_000_000, c in 0u64..1_000_000) {
        let x = Coins::from_coins([Coin::new(a.into(), "stake"), Coin::new(b.into(), "atom")]);
        let y = Coins::from(Coin::new(c.into(), "stake"));
        prop_assert_eq!(x.add(&y).checked_sub(&y), Some(x.clone()));
        prop_assert!(x.add(&y).is_all_gte(&x));
    }
}
