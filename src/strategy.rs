use crate::eligibility::EffectiveRateSchedule;
use crate::interest::{self, InterestProjection, PlannedSegment};
use crate::schema::{Account, EngineConfig, RiskPreference, UserProfile};
use crate::OmissionReason;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Account annotated with the rate schedule the user can actually achieve.
#[derive(Debug, Clone)]
pub struct EligibleAccount<'a> {
    pub account: &'a Account,
    pub schedule: EffectiveRateSchedule,
}

/// One holding inside a candidate: an eligible-account index, the
/// principal assigned to it, and the day range it is held for.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSegment {
    pub idx: usize,
    pub principal: Decimal,
    pub start_day: i64,
    pub end_day: i64,
}

impl CandidateSegment {
    pub fn days(&self) -> i64 {
        self.end_day - self.start_day
    }
}

/// A fully priced allocation candidate for one strategy category.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationCandidate {
    pub segments: Vec<CandidateSegment>,
    pub projection: InterestProjection,
    /// Largest amount of budget idle at any instant: the excess over the
    /// ceilings for parallel plans, the worst segment's shortfall for
    /// switch plans.
    pub unallocated: Decimal,
}

pub type CategoryCandidates = std::result::Result<Vec<AllocationCandidate>, OmissionReason>;

fn holds_full_horizon(account: &Account, horizon_days: i64) -> bool {
    account.term_days.map_or(true, |term| term >= horizon_days)
}

fn can_host(account: &Account, segment_days: i64) -> bool {
    account.term_days.map_or(true, |term| term >= segment_days)
}

/// Single-account category: every feasible account carrying the whole
/// budget (capped at its ceiling) for the whole horizon is a candidate.
pub fn generate_single(
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
) -> CategoryCandidates {
    let mut candidates = Vec::new();
    for (idx, entry) in eligible.iter().enumerate() {
        if !holds_full_horizon(entry.account, profile.horizon_days) {
            continue;
        }
        let principal = profile.budget.min(entry.schedule.ceiling());
        if principal < entry.account.min_deposit || principal <= Decimal::ZERO {
            continue;
        }
        let projection = interest::project_parallel(
            &[(&entry.schedule, principal)],
            profile.horizon_days,
            config.tax_rate,
        );
        candidates.push(AllocationCandidate {
            segments: vec![CandidateSegment {
                idx,
                principal,
                start_day: 0,
                end_day: profile.horizon_days,
            }],
            projection,
            unallocated: profile.budget - principal,
        });
    }

    if candidates.is_empty() {
        Err(OmissionReason::NoEligibleAccounts)
    } else {
        Ok(candidates)
    }
}

/// Split category: greedy by top-band effective rate, filling each
/// account to its ceiling before moving on. Only attempted when the user
/// accepts splitting or the budget overflows the best single ceiling.
pub fn generate_split(
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
    best_single_ceiling: Option<Decimal>,
) -> CategoryCandidates {
    let attempted = profile.willing_to_split
        || best_single_ceiling.map_or(true, |ceiling| profile.budget > ceiling);
    if !attempted {
        return Err(OmissionReason::SplitNotRequested);
    }

    let mut order: Vec<usize> = (0..eligible.len())
        .filter(|&idx| holds_full_horizon(eligible[idx].account, profile.horizon_days))
        .collect();
    if order.is_empty() {
        return Err(OmissionReason::NoEligibleAccounts);
    }

    order.sort_by(|&a, &b| {
        let (ea, eb) = (&eligible[a], &eligible[b]);
        eb.schedule
            .top_rate()
            .cmp(&ea.schedule.top_rate())
            .then_with(|| ea.account.min_deposit.cmp(&eb.account.min_deposit))
            .then_with(|| ea.account.institution.cmp(&eb.account.institution))
            .then_with(|| ea.account.product_name.cmp(&eb.account.product_name))
    });

    let mut remaining = profile.budget;
    let mut filled: Vec<(usize, Decimal)> = Vec::new();
    for idx in order {
        if filled.len() >= config.max_split_accounts || remaining <= Decimal::ZERO {
            break;
        }
        let entry = &eligible[idx];
        let amount = remaining.min(entry.schedule.ceiling());
        if amount < entry.account.min_deposit || amount <= Decimal::ZERO {
            continue;
        }
        filled.push((idx, amount));
        remaining -= amount;
    }

    if filled.is_empty() {
        return Err(OmissionReason::NoEligibleAccounts);
    }
    debug!(
        "split allocation uses {} accounts, {} unallocated",
        filled.len(),
        remaining
    );

    let allocations: Vec<(&EffectiveRateSchedule, Decimal)> = filled
        .iter()
        .map(|&(idx, amount)| (&eligible[idx].schedule, amount))
        .collect();
    let projection =
        interest::project_parallel(&allocations, profile.horizon_days, config.tax_rate);

    Ok(vec![AllocationCandidate {
        segments: filled
            .into_iter()
            .map(|(idx, principal)| CandidateSegment {
                idx,
                principal,
                start_day: 0,
                end_day: profile.horizon_days,
            })
            .collect(),
        projection,
        unallocated: remaining,
    }])
}

/// Yield-maximizing category: search over switch points at term
/// boundaries (plus fixed intervals under the aggressive preference) and
/// price every segment sequence that respects the holding constraints.
pub fn generate_maximize(
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
) -> CategoryCandidates {
    if eligible.is_empty() {
        return Err(OmissionReason::NoEligibleAccounts);
    }
    let horizon = profile.horizon_days;
    if config.max_switches == 0 || horizon < config.min_holding_days {
        return Err(OmissionReason::NoViableSwitchPlan);
    }

    let cuts = switch_points(eligible, profile, config);
    let sequences = cut_sequences(
        &cuts,
        config.max_switches as usize - 1,
        config.min_holding_days,
        horizon,
    );
    debug!(
        "maximize search: {} switch points, {} segment sequences",
        cuts.len(),
        sequences.len()
    );

    let mut candidates = Vec::new();
    for sequence in sequences {
        if let Some(candidate) = price_sequence(&sequence, eligible, profile, config) {
            candidates.push(candidate);
        }
    }

    if candidates.is_empty() {
        Err(OmissionReason::NoViableSwitchPlan)
    } else {
        Ok(candidates)
    }
}

/// Candidate interior switch days: each account's term boundary, plus
/// fixed intervals for aggressive users. Points too close to either end
/// of the horizon to leave a legal holding on both sides are dropped.
fn switch_points(
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
) -> Vec<i64> {
    let horizon = profile.horizon_days;
    let min_hold = config.min_holding_days;
    let mut points = BTreeSet::new();

    for entry in eligible {
        if let Some(term) = entry.account.term_days {
            if term >= min_hold && horizon - term >= min_hold {
                points.insert(term);
            }
        }
    }

    if profile.risk_preference == RiskPreference::Aggressive {
        let interval = config.aggressive_switch_interval_days.max(1);
        let mut day = interval;
        while day <= horizon - min_hold {
            if day >= min_hold {
                points.insert(day);
            }
            day += interval;
        }
    }

    points.into_iter().collect()
}

/// Ordered subsets of `cuts` with at most `max_cuts` entries where every
/// resulting segment is at least `min_gap` long. The empty sequence (no
/// switch at all) is always included.
fn cut_sequences(cuts: &[i64], max_cuts: usize, min_gap: i64, horizon: i64) -> Vec<Vec<i64>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    collect_sequences(cuts, 0, max_cuts, min_gap, horizon, &mut current, &mut out);
    out
}

fn collect_sequences(
    cuts: &[i64],
    from: usize,
    max_cuts: usize,
    min_gap: i64,
    horizon: i64,
    current: &mut Vec<i64>,
    out: &mut Vec<Vec<i64>>,
) {
    out.push(current.clone());
    if current.len() >= max_cuts {
        return;
    }
    for i in from..cuts.len() {
        let previous = current.last().copied().unwrap_or(0);
        if cuts[i] - previous < min_gap || horizon - cuts[i] < min_gap {
            continue;
        }
        current.push(cuts[i]);
        collect_sequences(cuts, i + 1, max_cuts, min_gap, horizon, current, out);
        current.pop();
    }
}

/// Prices one cut sequence by searching over account assignments for its
/// segments. A term account's promotional window is one-shot, so once
/// used it cannot host a later segment; open-ended accounts may repeat.
/// The one-shot rule and compounding carry couple the segments, so
/// complete plans are scored rather than filling each segment greedily.
/// Returns None when no assignment covers every segment.
fn price_sequence(
    sequence: &[i64],
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
) -> Option<AllocationCandidate> {
    let mut boundaries = Vec::with_capacity(sequence.len() + 2);
    boundaries.push(0);
    boundaries.extend_from_slice(sequence);
    boundaries.push(profile.horizon_days);
    let spans: Vec<(i64, i64)> = boundaries.windows(2).map(|w| (w[0], w[1])).collect();

    let mut best: Option<PricedPlan> = None;
    let mut chosen = Vec::with_capacity(spans.len());
    let mut used_terms = BTreeSet::new();
    assign_and_price(
        &spans,
        eligible,
        profile,
        config,
        &mut chosen,
        &mut used_terms,
        &mut best,
    );

    let plan = best?;
    let idle_floor = plan
        .segments
        .iter()
        .map(|s| s.principal)
        .min()
        .unwrap_or(Decimal::ZERO);
    Some(AllocationCandidate {
        segments: plan.segments,
        projection: plan.projection,
        unallocated: profile.budget - idle_floor,
    })
}

struct PricedPlan {
    segments: Vec<CandidateSegment>,
    projection: InterestProjection,
    tie_key: Vec<(Decimal, String)>,
}

/// Depth-first walk over viable accounts per segment. Fan-out is the
/// eligible-account count to the power of the segment count, and segment
/// counts are capped by `max_switches`.
fn assign_and_price(
    spans: &[(i64, i64)],
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
    chosen: &mut Vec<usize>,
    used_terms: &mut BTreeSet<usize>,
    best: &mut Option<PricedPlan>,
) {
    if chosen.len() == spans.len() {
        score_plan(spans, eligible, profile, config, chosen, best);
        return;
    }

    let (start, end) = spans[chosen.len()];
    let days = end - start;
    for (idx, entry) in eligible.iter().enumerate() {
        if used_terms.contains(&idx) || !can_host(entry.account, days) {
            continue;
        }
        let principal = profile.budget.min(entry.schedule.ceiling());
        if principal < entry.account.min_deposit || principal <= Decimal::ZERO {
            continue;
        }
        let consumes_term = entry.account.term_days.is_some();
        if consumes_term {
            used_terms.insert(idx);
        }
        chosen.push(idx);
        assign_and_price(spans, eligible, profile, config, chosen, used_terms, best);
        chosen.pop();
        if consumes_term {
            used_terms.remove(&idx);
        }
    }
}

fn score_plan(
    spans: &[(i64, i64)],
    eligible: &[EligibleAccount<'_>],
    profile: &UserProfile,
    config: &EngineConfig,
    chosen: &[usize],
    best: &mut Option<PricedPlan>,
) {
    let segments: Vec<CandidateSegment> = chosen
        .iter()
        .zip(spans)
        .map(|(&idx, &(start, end))| CandidateSegment {
            idx,
            principal: profile.budget.min(eligible[idx].schedule.ceiling()),
            start_day: start,
            end_day: end,
        })
        .collect();
    let planned: Vec<PlannedSegment<'_>> = segments
        .iter()
        .map(|s| PlannedSegment {
            schedule: &eligible[s.idx].schedule,
            principal: s.principal,
            days: s.days(),
            compounds: eligible[s.idx].account.compounds,
        })
        .collect();
    let deployed = segments
        .iter()
        .map(|s| s.principal)
        .max()
        .unwrap_or(Decimal::ZERO);
    let projection = interest::project_sequential(&planned, deployed, config.tax_rate);
    let tie_key: Vec<(Decimal, String)> = chosen
        .iter()
        .map(|&idx| {
            (
                eligible[idx].account.min_deposit,
                eligible[idx].account.label(),
            )
        })
        .collect();

    let improves = match best {
        None => true,
        Some(current) => {
            projection.net > current.projection.net
                || (projection.net == current.projection.net && tie_key < current.tie_key)
        }
    };
    if improves {
        *best = Some(PricedPlan {
            segments,
            projection,
            tie_key,
        });
    }
}
