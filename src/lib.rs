//! Strategy simulation engine for high-yield parking deposit accounts.
//!
//! Given a catalog of deposit products (tiered balance rates, conditional
//! bonus rates, deposit ceilings, promotional terms) and a user's profile
//! (budget, horizon, declared attributes), the engine evaluates which
//! bonus conditions the user satisfies, prices every allocation exactly
//! in fixed-point decimal, and recommends up to three strategies:
//!
//! - **single**: the whole budget in one account for the whole horizon
//! - **split**: the budget spread across accounts to stay under ceilings
//! - **maximize**: a switch plan that rides promotional windows and moves
//!   the money when a better rate opens up
//!
//! Interest is reported gross and net of withholding tax (15.4% for
//! Korean deposit products by default), with an effective annualized
//! yield on the deployed principal. All money math uses [`rust_decimal`];
//! no floats touch a currency amount anywhere in the crate.
//!
//! ```no_run
//! use deposit_strategy_engine::{recommend_strategies, Account, EngineConfig, UserProfile};
//!
//! # fn run(catalog: Vec<Account>, profile: UserProfile) -> deposit_strategy_engine::Result<()> {
//! let config = EngineConfig::default();
//! let recommendations = recommend_strategies(&catalog, &profile, &config)?;
//! for strategy in &recommendations.strategies {
//!     println!("{:?}: {} net", strategy.category, strategy.net_interest);
//! }
//! # Ok(())
//! # }
//! ```

pub mod eligibility;
pub mod error;
pub mod interest;
pub mod ranking;
pub mod schema;
pub mod strategy;
pub mod utils;

pub use error::{CatalogWarning, Result, StrategyEngineError};
pub use schema::{
    Account, AttributeValue, BalanceTier, BonusCondition, ConditionKind, EarlyTerminationPenalty,
    EngineConfig, RiskPreference, UserProfile,
};

use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strategy::{AllocationCandidate, CategoryCandidates, EligibleAccount};

/// The three allocation shapes the engine can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Single,
    Split,
    Maximize,
}

/// Why a category produced no recommendation for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OmissionReason {
    /// No catalog account passed eligibility for the category.
    NoEligibleAccounts,
    /// The user declined splitting and the budget fits one account.
    SplitNotRequested,
    /// No switch sequence satisfies the holding-period constraints.
    NoViableSwitchPlan,
}

impl std::fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            OmissionReason::NoEligibleAccounts => "no eligible accounts",
            OmissionReason::SplitNotRequested => "split not requested",
            OmissionReason::NoViableSwitchPlan => "no viable switch plan",
        };
        f.write_str(text)
    }
}

/// A category the run could not fill, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryOmission {
    pub category: StrategyCategory,
    pub reason: OmissionReason,
}

/// One holding inside a recommended strategy: which product, how much,
/// and over which calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AllocationSegment {
    pub institution: String,
    pub product_name: String,
    pub principal: Decimal,
    /// Principal-weighted annual rate the holding earns, in percent.
    pub effective_rate: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Bonus conditions the user satisfies on this product.
    pub applied_conditions: Vec<String>,
}

/// The winning allocation for one strategy category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrategyResult {
    pub category: StrategyCategory,
    pub segments: Vec<AllocationSegment>,
    pub gross_interest: Decimal,
    pub net_interest: Decimal,
    pub annualized_yield: Decimal,
    /// Budget no account ceiling could absorb.
    pub unallocated: Decimal,
}

/// Everything a run produces: the recommended strategies in category
/// order, the categories that could not be filled, and the catalog
/// warnings encountered along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationSet {
    pub strategies: Vec<StrategyResult>,
    pub omissions: Vec<CategoryOmission>,
    pub warnings: Vec<CatalogWarning>,
    pub analyzed_count: usize,
    pub eligible_count: usize,
}

/// Runs the full recommendation pipeline over a product catalog.
///
/// Account-level defects (inconsistent tiers, unrecognized bonus
/// conditions) never abort the run; they surface as warnings and the
/// affected account is skipped or priced without the bonus. The only
/// fatal input error is a profile the engine cannot price at all.
pub fn recommend_strategies(
    catalog: &[Account],
    profile: &UserProfile,
    config: &EngineConfig,
) -> Result<RecommendationSet> {
    validate_profile(profile)?;
    info!(
        "recommending for budget {} over {} days across {} products",
        profile.budget,
        profile.horizon_days,
        catalog.len()
    );

    let mut warnings: Vec<CatalogWarning> = Vec::new();
    let mut eligible: Vec<EligibleAccount<'_>> = Vec::new();

    for account in catalog {
        if let Err(details) = account.validate_tiers() {
            let warning = CatalogWarning::TierScheduleInconsistent {
                account: account.label(),
                details,
            };
            warn!("{}", warning);
            warnings.push(warning);
            continue;
        }

        let (schedule, condition_warnings) = eligibility::evaluate(account, profile);
        for warning in &condition_warnings {
            warn!("{}", warning);
        }
        warnings.extend(condition_warnings);

        if !profile
            .required_categories
            .iter()
            .all(|category| account.categories.contains(category))
        {
            debug!(
                "'{}' skipped: does not carry every required category tag",
                account.label()
            );
            continue;
        }
        if profile.budget < account.min_deposit {
            debug!(
                "'{}' skipped: minimum deposit {} exceeds budget",
                account.label(),
                account.min_deposit
            );
            continue;
        }
        if let Some(min_rate) = profile.min_rate {
            if schedule.best_rate() < min_rate {
                debug!(
                    "'{}' skipped: best rate {} below requested minimum {}",
                    account.label(),
                    schedule.best_rate(),
                    min_rate
                );
                continue;
            }
        }
        eligible.push(EligibleAccount { account, schedule });
    }
    debug!(
        "{} of {} products eligible",
        eligible.len(),
        catalog.len()
    );

    let mut strategies = Vec::new();
    let mut omissions = Vec::new();
    let mut best_single_ceiling: Option<Decimal> = None;

    let single = strategy::generate_single(&eligible, profile, config);
    match resolve(single, StrategyCategory::Single, &eligible, config) {
        Ok(candidate) => {
            best_single_ceiling = candidate
                .segments
                .first()
                .map(|s| eligible[s.idx].schedule.ceiling());
            strategies.push(build_result(
                StrategyCategory::Single,
                candidate,
                &eligible,
                profile.opened_on,
            ));
        }
        Err(omission) => omissions.push(omission),
    }

    let split = strategy::generate_split(&eligible, profile, config, best_single_ceiling);
    match resolve(split, StrategyCategory::Split, &eligible, config) {
        Ok(candidate) => strategies.push(build_result(
            StrategyCategory::Split,
            candidate,
            &eligible,
            profile.opened_on,
        )),
        Err(omission) => omissions.push(omission),
    }

    let maximize = strategy::generate_maximize(&eligible, profile, config);
    match resolve(maximize, StrategyCategory::Maximize, &eligible, config) {
        Ok(candidate) => strategies.push(build_result(
            StrategyCategory::Maximize,
            candidate,
            &eligible,
            profile.opened_on,
        )),
        Err(omission) => omissions.push(omission),
    }

    info!(
        "produced {} strategies, {} omissions, {} warnings",
        strategies.len(),
        omissions.len(),
        warnings.len()
    );
    Ok(RecommendationSet {
        strategies,
        omissions,
        warnings,
        analyzed_count: catalog.len(),
        eligible_count: eligible.len(),
    })
}

fn validate_profile(profile: &UserProfile) -> Result<()> {
    if profile.budget <= Decimal::ZERO {
        return Err(StrategyEngineError::InvalidProfile(format!(
            "budget must be positive, got {}",
            profile.budget
        )));
    }
    if profile.horizon_days <= 0 {
        return Err(StrategyEngineError::InvalidProfile(format!(
            "horizon must be positive, got {} days",
            profile.horizon_days
        )));
    }
    Ok(())
}

fn resolve(
    candidates: CategoryCandidates,
    category: StrategyCategory,
    eligible: &[EligibleAccount<'_>],
    config: &EngineConfig,
) -> std::result::Result<AllocationCandidate, CategoryOmission> {
    let reason = match candidates {
        Ok(pool) => {
            if let Some(winner) = ranking::select_winner(pool, eligible, config.tie_epsilon) {
                return Ok(winner);
            }
            OmissionReason::NoEligibleAccounts
        }
        Err(reason) => reason,
    };
    debug!("{:?} omitted: {}", category, reason);
    Err(CategoryOmission { category, reason })
}

fn build_result(
    category: StrategyCategory,
    candidate: AllocationCandidate,
    eligible: &[EligibleAccount<'_>],
    opened_on: NaiveDate,
) -> StrategyResult {
    let segments = candidate
        .segments
        .iter()
        .map(|segment| {
            let entry = &eligible[segment.idx];
            AllocationSegment {
                institution: entry.account.institution.clone(),
                product_name: entry.account.product_name.clone(),
                principal: segment.principal,
                effective_rate: interest::blended_annual_rate(&entry.schedule, segment.principal),
                period_start: utils::day_offset(opened_on, segment.start_day),
                period_end: utils::day_offset(opened_on, segment.end_day),
                applied_conditions: entry.schedule.applied_conditions.clone(),
            }
        })
        .collect();

    StrategyResult {
        category,
        segments,
        gross_interest: candidate.projection.gross,
        net_interest: candidate.projection.net,
        annualized_yield: candidate.projection.annualized_yield,
        unallocated: candidate.unallocated,
    }
}
