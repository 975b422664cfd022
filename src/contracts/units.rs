//! Integer encodings for money, rates and time.
//!
//! Amounts travel as base units (paise, 1/100 of a rupee) and rates as basis
//! points (percent × 100). Conversions use `Decimal` end to end and reject
//! anything that would need rounding, so the write path never touches floats.

use alloy::primitives::U256;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::blockchain::types::{LedgerError, LedgerResult};

/// Decimal places between the display unit and the base unit.
pub const AMOUNT_SCALE: u32 = 2;

const BPS_PER_PERCENT: i64 = 100;

/// Convert a currency amount to integer base units.
pub fn to_base_units(amount: Decimal) -> LedgerResult<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Encoding(format!("negative amount {}", amount)));
    }
    let scaled = amount
        .checked_mul(Decimal::from(10i64.pow(AMOUNT_SCALE)))
        .ok_or_else(|| LedgerError::Encoding(format!("amount {} out of range", amount)))?;
    if !scaled.fract().is_zero() {
        return Err(LedgerError::Encoding(format!(
            "amount {} has more than {} decimal places",
            amount, AMOUNT_SCALE
        )));
    }
    scaled
        .to_u128()
        .map(U256::from)
        .ok_or_else(|| LedgerError::Encoding(format!("amount {} out of range", amount)))
}

/// Convert base units read from the ledger back to a currency amount.
pub fn from_base_units(units: U256) -> LedgerResult<Decimal> {
    let raw = u128::try_from(units)
        .ok()
        .and_then(|v| i128::try_from(v).ok())
        .ok_or_else(|| LedgerError::Encoding(format!("amount {} out of range", units)))?;
    Decimal::try_from_i128_with_scale(raw, AMOUNT_SCALE)
        .map(|d| d.normalize())
        .map_err(|e| LedgerError::Encoding(format!("amount {} out of range: {}", units, e)))
}

/// Convert a percentage rate (e.g. 11.75) to basis points (1175).
pub fn rate_to_bps(percent: Decimal) -> LedgerResult<u16> {
    let bps = percent
        .checked_mul(Decimal::from(BPS_PER_PERCENT))
        .ok_or_else(|| LedgerError::Encoding(format!("rate {}% out of range", percent)))?;
    if !bps.fract().is_zero() {
        return Err(LedgerError::Encoding(format!(
            "rate {}% is finer than one basis point",
            percent
        )));
    }
    bps.to_u16()
        .ok_or_else(|| LedgerError::Encoding(format!("rate {}% out of range", percent)))
}

/// Convert basis points back to a percentage.
pub fn bps_to_rate(bps: u16) -> Decimal {
    Decimal::new(bps as i64, 2).normalize()
}

/// Convert chain seconds to calendar time.
pub fn chain_time(seconds: u64) -> LedgerResult<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .ok_or_else(|| LedgerError::Encoding(format!("timestamp {} out of range", seconds)))
}

/// Convert calendar time to chain seconds.
pub fn to_chain_time(time: DateTime<Utc>) -> LedgerResult<u64> {
    u64::try_from(time.timestamp())
        .map_err(|_| LedgerError::Encoding(format!("timestamp {} precedes epoch", time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_amount_to_base_units() {
        assert_eq!(to_base_units(Decimal::from(500_000)).unwrap(), U256::from(50_000_000u64));
        assert_eq!(to_base_units(Decimal::from_str("1234.56").unwrap()).unwrap(), U256::from(123_456u64));
        assert_eq!(to_base_units(Decimal::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_amount_rejects_fractions_of_base_unit() {
        assert!(to_base_units(Decimal::from_str("10.005").unwrap()).is_err());
        assert!(to_base_units(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_extreme_values_are_encoding_errors() {
        assert!(matches!(to_base_units(Decimal::MAX), Err(LedgerError::Encoding(_))));
        assert!(matches!(rate_to_bps(Decimal::MAX), Err(LedgerError::Encoding(_))));
        assert!(matches!(rate_to_bps(Decimal::MIN), Err(LedgerError::Encoding(_))));
    }

    #[test]
    fn test_amount_decodes() {
        assert_eq!(from_base_units(U256::from(50_000_000u64)).unwrap().to_string(), "500000");
        assert_eq!(from_base_units(U256::from(123_456u64)).unwrap().to_string(), "1234.56");
        assert!(from_base_units(U256::MAX).is_err());
    }

    #[test]
    fn test_rate_bps() {
        assert_eq!(rate_to_bps(Decimal::from_str("11.75").unwrap()).unwrap(), 1175);
        assert_eq!(rate_to_bps(Decimal::from(12)).unwrap(), 1200);
        assert!(rate_to_bps(Decimal::from_str("11.755").unwrap()).is_err());
        assert_eq!(bps_to_rate(1175).to_string(), "11.75");
        assert_eq!(bps_to_rate(1200).to_string(), "12");
    }

    #[test]
    fn test_chain_time() {
        let t = chain_time(1_700_000_000).unwrap();
        assert_eq!(t.to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(to_chain_time(t).unwrap(), 1_700_000_000);
    }
}
