use std::convert::TryFrom;

use alloy_primitives::U256;
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Decimal places of the native token's smallest unit.
pub const POL_DECIMALS: usize = 18;

/// Shortened display form of an account address: "0x742d...4567".
pub fn truncate_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Ledger value in the smallest unit to the human-facing POL value.
pub fn wei_to_pol(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0) / 1e18
}

/// Decimal POL amount to the smallest unit. String based, so "0.05" never
/// picks up float error on the wire.
pub fn pol_to_wei(amount: &str) -> Result<U256> {
    let amount = amount.trim();
    let (int_part, frac_part) = match amount.find('.') {
        Some(idx) => (&amount[..idx], &amount[idx + 1..]),
        None => (amount, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        bail!("invalid amount: {:?}", amount);
    }
    if frac_part.len() > POL_DECIMALS {
        bail!(
            "amount {} has more than {} decimal places",
            amount,
            POL_DECIMALS
        );
    }

    let int = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10)
            .map_err(|e| anyhow!("invalid amount {}: {}", amount, e))?
    };
    let frac = if frac_part.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", frac_part, width = POL_DECIMALS);
        U256::from_str_radix(&padded, 10)
            .map_err(|e| anyhow!("invalid amount {}: {}", amount, e))?
    };

    let base = U256::from(10u64).pow(U256::from(POL_DECIMALS));
    int.checked_mul(base)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| anyhow!("amount {} is out of range", amount))
}

/// Epoch seconds from the ledger to the ISO-8601 instant the views render.
pub fn iso_timestamp(secs: u64) -> String {
    let secs = i64::try_from(secs).unwrap_or(0);
    let datetime = Utc
        .timestamp_opt(secs, 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Millisecond sort key for ISO timestamps; unparseable strings sort last.
pub fn timestamp_sort_key(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(i64::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_addresses() {
        assert_eq!(
            truncate_address("0x742d35Cc6634C0532925a3b8D0f4E6f8b1234567"),
            "0x742d...4567"
        );
    }

    #[test]
    fn short_strings_are_left_alone() {
        assert_eq!(truncate_address("You"), "You");
    }

    #[test]
    fn wei_to_pol_divides_by_ten_pow_eighteen() {
        let value = U256::from(250_000_000_000_000_000u64);
        assert!((wei_to_pol(value) - 0.25).abs() < 1e-12);
        assert_eq!(wei_to_pol(U256::ZERO), 0.0);
    }

    #[test]
    fn pol_to_wei_is_exact() {
        assert_eq!(
            pol_to_wei("0.25").unwrap(),
            U256::from(250_000_000_000_000_000u64)
        );
        assert_eq!(
            pol_to_wei("0.05").unwrap(),
            U256::from(50_000_000_000_000_000u64)
        );
        assert_eq!(
            pol_to_wei("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(
            pol_to_wei("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(pol_to_wei("0").unwrap(), U256::ZERO);
    }

    #[test]
    fn pol_to_wei_rejects_garbage() {
        assert!(pol_to_wei("").is_err());
        assert!(pol_to_wei(".").is_err());
        assert!(pol_to_wei("abc").is_err());
        assert!(pol_to_wei("-1").is_err());
        // 19 fractional digits is below the smallest unit
        assert!(pol_to_wei("0.0000000000000000001").is_err());
    }

    #[test]
    fn iso_timestamp_matches_the_ledger_projection() {
        assert_eq!(iso_timestamp(1_704_882_600), "2024-01-10T10:30:00.000Z");
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn sort_key_orders_mixed_precision_timestamps() {
        let older = timestamp_sort_key("2024-01-08T09:20:00Z");
        let newer = timestamp_sort_key("2024-01-10T10:30:00.000Z");
        assert!(newer > older);
        assert_eq!(timestamp_sort_key("not a time"), i64::MIN);
    }
}
