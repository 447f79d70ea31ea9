use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const DAYS_PER_YEAR: Decimal = dec!(365);

/// Fraction of a year covered by `days`, on the 365-day count convention
/// used by Korean deposit products.
pub fn year_fraction(days: i64) -> Decimal {
    Decimal::from(days) / DAYS_PER_YEAR
}

/// Round a monetary amount to the nearest whole currency unit, half-up.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Effective annualized yield of `net` interest earned on `principal`
/// over `days`. Zero when the inputs make the ratio meaningless.
pub fn annualized_yield(net: Decimal, principal: Decimal, days: i64) -> Decimal {
    if principal <= Decimal::ZERO || days <= 0 {
        return Decimal::ZERO;
    }
    (net / principal * DAYS_PER_YEAR / Decimal::from(days)).round_dp(6)
}

/// Calendar date `offset` days after the recommendation's as-of date.
pub fn day_offset(opened_on: NaiveDate, offset: i64) -> NaiveDate {
    opened_on + Duration::days(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_fraction() {
        assert_eq!(year_fraction(365), dec!(1));
        assert_eq!(year_fraction(730), dec!(2));
        assert_eq!(year_fraction(73), dec!(0.2));
    }

    #[test]
    fn test_round_currency_half_up() {
        assert_eq!(round_currency(dec!(100.5)), dec!(101));
        assert_eq!(round_currency(dec!(100.49)), dec!(100));
        assert_eq!(round_currency(dec!(100.4999999)), dec!(100));
        assert_eq!(round_currency(dec!(-2.5)), dec!(-3));
    }

    #[test]
    fn test_annualized_yield() {
        // 296,100 net on 10,000,000 over a full year.
        let y = annualized_yield(dec!(296100), dec!(10000000), 365);
        assert_eq!(y, dec!(0.02961));

        // Shorter horizons annualize upward.
        let y = annualized_yield(dec!(100), dec!(10000), 183);
        assert!(y > dec!(0.019) && y < dec!(0.021));
    }

    #[test]
    fn test_annualized_yield_degenerate_inputs() {
        assert_eq!(annualized_yield(dec!(100), Decimal::ZERO, 365), Decimal::ZERO);
        assert_eq!(annualized_yield(dec!(100), dec!(1000), 0), Decimal::ZERO);
    }

    #[test]
    fn test_day_offset() {
        let opened = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(day_offset(opened, 0), opened);
        assert_eq!(
            day_offset(opened, 90),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
        );
    }
}
