//! Derived per-row financial metrics. Any missing operand (or a zero payout)
//! yields `None`; nothing here can fail.

use bigdecimal::{BigDecimal, Zero};

/// Decimal places kept on percentages.
pub const PCT_SCALE: i64 = 2;

/// Shipping cost as a percentage of net payout, rounded to 2 dp.
pub fn shipping_pct(
    cost_usd: Option<&BigDecimal>,
    net_payout_usd: Option<&BigDecimal>,
) -> Option<BigDecimal> {
    let cost = cost_usd?;
    let payout = net_payout_usd?;
    percentage(cost, payout)
}

/// `net_payout - product_cost - shipping_cost`, full precision.
pub fn profit(
    net_payout_usd: Option<&BigDecimal>,
    product_cost_usd: Option<&BigDecimal>,
    cost_usd: Option<&BigDecimal>,
) -> Option<BigDecimal> {
    Some(net_payout_usd? - product_cost_usd? - cost_usd?)
}

/// `part / whole * 100` rounded to 2 dp; `None` when `whole` is zero.
pub fn percentage(part: &BigDecimal, whole: &BigDecimal) -> Option<BigDecimal> {
    if whole.is_zero() {
        return None;
    }
    let scaled = part * &BigDecimal::from(100);
    Some((scaled / whole).round(PCT_SCALE))
}

/// Arithmetic mean rounded to 2 dp; `None` for an empty input.
pub fn mean<'a>(values: impl IntoIterator<Item = &'a BigDecimal>) -> Option<BigDecimal> {
    let mut sum = BigDecimal::zero();
    let mut count: u64 = 0;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some((sum / BigDecimal::from(count)).round(PCT_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn shipping_pct_basic() {
        assert_eq!(shipping_pct(Some(&dec("13.9")), Some(&dec("50"))), Some(dec("27.8")));
    }

    #[test]
    fn shipping_pct_rounds_to_two_places() {
        // 10 / 3 * 100 = 333.333...
        assert_eq!(shipping_pct(Some(&dec("10")), Some(&dec("3"))), Some(dec("333.33")));
        // 2 / 3 * 100 = 66.666...
        assert_eq!(shipping_pct(Some(&dec("2")), Some(&dec("3"))), Some(dec("66.67")));
    }

    #[test]
    fn shipping_pct_undefined_cases() {
        assert_eq!(shipping_pct(Some(&dec("5")), Some(&dec("0"))), None);
        assert_eq!(shipping_pct(Some(&dec("5")), Some(&dec("0.00"))), None);
        assert_eq!(shipping_pct(None, Some(&dec("50"))), None);
        assert_eq!(shipping_pct(Some(&dec("5")), None), None);
    }

    #[test]
    fn profit_basic() {
        assert_eq!(
            profit(Some(&dec("50")), Some(&dec("10")), Some(&dec("13.9"))),
            Some(dec("26.1"))
        );
        // Negative profit is a value, not an error
        assert_eq!(
            profit(Some(&dec("5")), Some(&dec("10")), Some(&dec("1"))),
            Some(dec("-6"))
        );
    }

    #[test]
    fn profit_null_operand() {
        assert_eq!(profit(None, Some(&dec("1")), Some(&dec("1"))), None);
        assert_eq!(profit(Some(&dec("1")), None, Some(&dec("1"))), None);
        assert_eq!(profit(Some(&dec("1")), Some(&dec("1")), None), None);
    }

    #[test]
    fn mean_values() {
        let vals = [dec("1"), dec("2"), dec("4")];
        assert_eq!(mean(vals.iter()), Some(dec("2.33")));
        assert_eq!(mean(std::iter::empty()), None);
    }
}
