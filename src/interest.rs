use crate::eligibility::EffectiveRateSchedule;
use crate::utils::{annualized_yield, round_currency, year_fraction};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const PERCENT: Decimal = dec!(100);

/// One sequential holding inside a switch plan.
#[derive(Debug, Clone)]
pub struct PlannedSegment<'a> {
    pub schedule: &'a EffectiveRateSchedule,
    pub principal: Decimal,
    pub days: i64,
    /// Whether the hosting account folds carried interest into principal.
    pub compounds: bool,
}

/// Projected interest for one allocation candidate. `gross` and `net` are
/// rounded half-up to whole currency units; nothing is rounded earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestProjection {
    pub gross: Decimal,
    pub net: Decimal,
    pub annualized_yield: Decimal,
}

/// Unrounded gross interest for a principal held `days` under the
/// schedule: each band earns its own rate on the slice of principal
/// inside the band, pro-rated by days / 365. Principal above the last
/// band's upper bound earns nothing.
pub fn gross_for_segment(schedule: &EffectiveRateSchedule, principal: Decimal, days: i64) -> Decimal {
    let fraction = year_fraction(days);
    let mut total = Decimal::ZERO;
    for band in &schedule.bands {
        if principal <= band.lower {
            break;
        }
        let portion = principal.min(band.upper) - band.lower;
        total += portion * band.rate / PERCENT * fraction;
    }
    total
}

/// Principal-weighted annual rate actually earned across the bands, in
/// percent. Used to report a single effective rate per segment.
pub fn blended_annual_rate(schedule: &EffectiveRateSchedule, principal: Decimal) -> Decimal {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let annual_gross = gross_for_segment(schedule, principal, 365);
    (annual_gross / principal * PERCENT).round_dp(4)
}

/// Projection for simultaneous allocations held over the same period
/// (single and split strategies).
pub fn project_parallel(
    allocations: &[(&EffectiveRateSchedule, Decimal)],
    days: i64,
    tax_rate: Decimal,
) -> InterestProjection {
    let gross: Decimal = allocations
        .iter()
        .map(|(schedule, principal)| gross_for_segment(schedule, *principal, days))
        .sum();
    let principal: Decimal = allocations.iter().map(|(_, p)| *p).sum();
    finish(gross, principal, days, tax_rate)
}

/// Projection for sequential switch segments. Carry is simple by default:
/// principal moves, prior interest does not. A compounding destination
/// folds the net interest carried so far into its opening principal.
/// `principal` is the amount the user actually deploys (the largest
/// segment principal) and anchors the yield figure.
pub fn project_sequential(
    segments: &[PlannedSegment<'_>],
    principal: Decimal,
    tax_rate: Decimal,
) -> InterestProjection {
    let total_days: i64 = segments.iter().map(|s| s.days).sum();
    let mut gross_total = Decimal::ZERO;
    let mut carried_net = Decimal::ZERO;

    for segment in segments {
        let opening = if segment.compounds {
            segment.principal + carried_net
        } else {
            segment.principal
        };
        let gross = gross_for_segment(segment.schedule, opening, segment.days);
        gross_total += gross;
        carried_net += gross * (Decimal::ONE - tax_rate);
    }

    finish(gross_total, principal, total_days, tax_rate)
}

fn finish(gross: Decimal, principal: Decimal, days: i64, tax_rate: Decimal) -> InterestProjection {
    let net = round_currency(gross * (Decimal::ONE - tax_rate));
    InterestProjection {
        gross: round_currency(gross),
        net,
        annualized_yield: annualized_yield(net, principal, days),
    }
}
