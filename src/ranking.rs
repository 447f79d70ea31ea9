use crate::strategy::{AllocationCandidate, EligibleAccount};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Picks the winning candidate for one strategy category.
///
/// Candidates within `epsilon` of the best net interest are considered
/// equivalent on earnings and fall through to softer criteria: higher
/// annualized yield, then fewer distinct accounts, then lower early
/// termination risk, then a stable lexical key so equal inputs always
/// produce the same winner.
pub fn select_winner(
    candidates: Vec<AllocationCandidate>,
    eligible: &[EligibleAccount<'_>],
    epsilon: Decimal,
) -> Option<AllocationCandidate> {
    let best_net = candidates
        .iter()
        .map(|c| c.projection.net)
        .max()?;
    let cutoff = best_net - epsilon;

    let mut viable: Vec<AllocationCandidate> = candidates
        .into_iter()
        .filter(|c| c.projection.net >= cutoff)
        .collect();
    debug!(
        "ranking: {} candidates within epsilon of best net {}",
        viable.len(),
        best_net
    );

    viable.sort_by(|a, b| {
        b.projection
            .annualized_yield
            .cmp(&a.projection.annualized_yield)
            .then_with(|| distinct_accounts(a).len().cmp(&distinct_accounts(b).len()))
            .then_with(|| risk_score(a, eligible).cmp(&risk_score(b, eligible)))
            .then_with(|| lexical_key(a, eligible).cmp(&lexical_key(b, eligible)))
    });
    viable.into_iter().next()
}

fn distinct_accounts(candidate: &AllocationCandidate) -> BTreeSet<usize> {
    candidate.segments.iter().map(|s| s.idx).collect()
}

/// Summed early-termination risk over the candidate's distinct accounts.
fn risk_score(candidate: &AllocationCandidate, eligible: &[EligibleAccount<'_>]) -> u32 {
    distinct_accounts(candidate)
        .iter()
        .map(|&idx| eligible[idx].account.early_termination.risk_weight())
        .sum()
}

fn lexical_key(candidate: &AllocationCandidate, eligible: &[EligibleAccount<'_>]) -> String {
    candidate
        .segments
        .iter()
        .map(|s| eligible[s.idx].account.label())
        .collect::<Vec<_>>()
        .join(" / ")
}
