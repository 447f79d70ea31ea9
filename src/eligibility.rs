use crate::error::CatalogWarning;
use crate::schema::{Account, AttributeValue, BonusCondition, ConditionKind, UserProfile};
use log::debug;
use rust_decimal::Decimal;

/// One contiguous principal band with the rate it earns, in annual percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBand {
    pub lower: Decimal,
    pub upper: Decimal,
    pub rate: Decimal,
}

/// Piecewise rate schedule for one account after bonus evaluation.
/// Bands are contiguous from zero up to the account's deposit ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveRateSchedule {
    pub bands: Vec<RateBand>,
    /// Names of the bonus conditions the user satisfies, in catalog order.
    pub applied_conditions: Vec<String>,
}

impl EffectiveRateSchedule {
    /// Deposit ceiling: the upper bound of the last band.
    pub fn ceiling(&self) -> Decimal {
        self.bands.last().map(|b| b.upper).unwrap_or(Decimal::ZERO)
    }

    /// Rate of the highest band; the marginal rate the next won of
    /// principal would earn at the ceiling.
    pub fn top_rate(&self) -> Decimal {
        self.bands.last().map(|b| b.rate).unwrap_or(Decimal::ZERO)
    }

    /// Best rate achieved by any band.
    pub fn best_rate(&self) -> Decimal {
        self.bands
            .iter()
            .map(|b| b.rate)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Evaluates the account's bonus conditions against the user's declared
/// attributes and produces the effective rate schedule. Pure: the only
/// side channel is the returned warnings for unrecognized condition kinds,
/// which count as not satisfied rather than failing the account.
pub fn evaluate(account: &Account, profile: &UserProfile) -> (EffectiveRateSchedule, Vec<CatalogWarning>) {
    let mut warnings = Vec::new();
    let mut satisfied: Vec<&BonusCondition> = Vec::new();

    for condition in &account.bonus_conditions {
        if matches!(condition.kind, ConditionKind::Unrecognized) {
            warnings.push(CatalogWarning::UnknownConditionKind {
                account: account.label(),
                condition: condition.name.clone(),
            });
            continue;
        }
        if condition_met(&condition.kind, profile) {
            satisfied.push(condition);
        }
    }

    debug!(
        "'{}': {} of {} bonus conditions satisfied",
        account.label(),
        satisfied.len(),
        account.bonus_conditions.len()
    );

    let bands = build_bands(account, &satisfied);
    let applied_conditions = satisfied.iter().map(|c| c.name.clone()).collect();

    (
        EffectiveRateSchedule {
            bands,
            applied_conditions,
        },
        warnings,
    )
}

fn condition_met(kind: &ConditionKind, profile: &UserProfile) -> bool {
    match kind {
        ConditionKind::BooleanFlag { attribute } => matches!(
            profile.attributes.get(attribute),
            Some(AttributeValue::Flag(true))
        ),
        ConditionKind::NumericThreshold { attribute, minimum } => matches!(
            profile.attributes.get(attribute),
            Some(AttributeValue::Number(n)) if n >= minimum
        ),
        ConditionKind::CategoricalMembership { attribute, accepted } => matches!(
            profile.attributes.get(attribute),
            Some(AttributeValue::Text(t)) if accepted.contains(t)
        ),
        ConditionKind::Unrecognized => false,
    }
}

/// Base tier bands refined at every bonus qualifying cap, so a bonus that
/// caps below the tier ceiling only raises the rate below its cap.
fn build_bands(account: &Account, satisfied: &[&BonusCondition]) -> Vec<RateBand> {
    let mut cuts: Vec<Decimal> = account.tiers.iter().map(|t| t.ceiling).collect();
    if cuts.last().copied() != Some(account.max_deposit) {
        cuts.push(account.max_deposit);
    }
    for condition in satisfied {
        if let Some(cap) = condition.max_qualifying_balance {
            if cap > Decimal::ZERO && cap < account.max_deposit {
                cuts.push(cap);
            }
        }
    }
    cuts.sort();
    cuts.dedup();

    let mut bands = Vec::with_capacity(cuts.len());
    let mut lower = Decimal::ZERO;
    for upper in cuts {
        let tier_rate = account
            .tiers
            .iter()
            .find(|t| upper <= t.ceiling)
            .map(|t| t.rate)
            .unwrap_or(account.base_rate);

        let mut bonus: Decimal = satisfied
            .iter()
            .filter(|c| c.max_qualifying_balance.map_or(true, |cap| cap >= upper))
            .map(|c| c.rate_delta)
            .sum();
        if let Some(max_bonus) = account.max_bonus_rate {
            bonus = bonus.min(max_bonus);
        }

        let mut rate = tier_rate + bonus;
        if let Some(cap) = account.max_possible_rate {
            rate = rate.min(cap);
        }

        bands.push(RateBand { lower, upper, rate });
        lower = upper;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BalanceTier, EarlyTerminationPenalty};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn account() -> Account {
        Account {
            institution: "Alpha Bank".to_string(),
            product_name: "Parking Plus".to_string(),
            categories: vec![],
            base_rate: dec!(2.0),
            tiers: vec![],
            bonus_conditions: vec![],
            max_bonus_rate: Some(dec!(2.0)),
            max_possible_rate: None,
            term_days: None,
            min_deposit: Decimal::ZERO,
            max_deposit: dec!(10000000),
            compounds: false,
            early_termination: EarlyTerminationPenalty::None,
        }
    }

    fn profile_with(attributes: BTreeMap<String, AttributeValue>) -> UserProfile {
        UserProfile {
            budget: dec!(10000000),
            horizon_days: 365,
            opened_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            willing_to_split: false,
            attributes,
            risk_preference: Default::default(),
            min_rate: None,
            required_categories: vec![],
        }
    }

    fn flag_condition(name: &str, delta: Decimal) -> BonusCondition {
        BonusCondition {
            name: name.to_string(),
            kind: ConditionKind::BooleanFlag {
                attribute: name.to_string(),
            },
            rate_delta: delta,
            max_qualifying_balance: None,
        }
    }

    #[test]
    fn test_no_conditions_yields_base_rate_band() {
        let (schedule, warnings) = evaluate(&account(), &profile_with(BTreeMap::new()));
        assert!(warnings.is_empty());
        assert_eq!(schedule.bands.len(), 1);
        assert_eq!(schedule.bands[0].lower, Decimal::ZERO);
        assert_eq!(schedule.bands[0].upper, dec!(10000000));
        assert_eq!(schedule.bands[0].rate, dec!(2.0));
    }

    #[test]
    fn test_boolean_flag_condition_raises_rate() {
        let mut account = account();
        account.bonus_conditions = vec![flag_condition("first_banking", dec!(1.0))];

        let mut attrs = BTreeMap::new();
        attrs.insert("first_banking".to_string(), AttributeValue::Flag(true));
        let (schedule, _) = evaluate(&account, &profile_with(attrs));
        assert_eq!(schedule.bands[0].rate, dec!(3.0));
        assert_eq!(schedule.applied_conditions, vec!["first_banking".to_string()]);

        // Absent or false attributes do not satisfy.
        let (schedule, _) = evaluate(&account, &profile_with(BTreeMap::new()));
        assert_eq!(schedule.bands[0].rate, dec!(2.0));
        assert!(schedule.applied_conditions.is_empty());
    }

    #[test]
    fn test_numeric_threshold_condition() {
        let mut account = account();
        account.bonus_conditions = vec![BonusCondition {
            name: "using_card".to_string(),
            kind: ConditionKind::NumericThreshold {
                attribute: "monthly_card_spend".to_string(),
                minimum: dec!(300000),
            },
            rate_delta: dec!(0.5),
            max_qualifying_balance: None,
        }];

        let mut attrs = BTreeMap::new();
        attrs.insert(
            "monthly_card_spend".to_string(),
            AttributeValue::Number(dec!(300000)),
        );
        let (schedule, _) = evaluate(&account, &profile_with(attrs.clone()));
        assert_eq!(schedule.bands[0].rate, dec!(2.5));

        attrs.insert(
            "monthly_card_spend".to_string(),
            AttributeValue::Number(dec!(299999)),
        );
        let (schedule, _) = evaluate(&account, &profile_with(attrs));
        assert_eq!(schedule.bands[0].rate, dec!(2.0));
    }

    #[test]
    fn test_categorical_membership_condition() {
        let mut account = account();
        account.bonus_conditions = vec![BonusCondition {
            name: "youth_segment".to_string(),
            kind: ConditionKind::CategoricalMembership {
                attribute: "segment".to_string(),
                accepted: vec!["youth".to_string(), "military".to_string()],
            },
            rate_delta: dec!(0.3),
            max_qualifying_balance: None,
        }];

        let mut attrs = BTreeMap::new();
        attrs.insert("segment".to_string(), AttributeValue::Text("youth".to_string()));
        let (schedule, _) = evaluate(&account, &profile_with(attrs));
        assert_eq!(schedule.bands[0].rate, dec!(2.3));
    }

    #[test]
    fn test_bonus_sum_clamped_to_max_bonus() {
        let mut account = account();
        account.bonus_conditions = vec![
            flag_condition("first_banking", dec!(1.0)),
            flag_condition("bank_app", dec!(1.5)),
        ];

        let mut attrs = BTreeMap::new();
        attrs.insert("first_banking".to_string(), AttributeValue::Flag(true));
        attrs.insert("bank_app".to_string(), AttributeValue::Flag(true));
        let (schedule, _) = evaluate(&account, &profile_with(attrs));

        // 1.0 + 1.5 = 2.5 clamps to the stated 2.0 cap.
        assert_eq!(schedule.bands[0].rate, dec!(4.0));
    }

    #[test]
    fn test_max_possible_rate_caps_effective_rate() {
        let mut account = account();
        account.max_possible_rate = Some(dec!(3.2));
        account.bonus_conditions = vec![flag_condition("first_banking", dec!(2.0))];

        let mut attrs = BTreeMap::new();
        attrs.insert("first_banking".to_string(), AttributeValue::Flag(true));
        let (schedule, _) = evaluate(&account, &profile_with(attrs));
        assert_eq!(schedule.bands[0].rate, dec!(3.2));
    }

    #[test]
    fn test_bonus_qualifying_cap_splits_band() {
        let mut account = account();
        account.bonus_conditions = vec![BonusCondition {
            name: "using_salary_account".to_string(),
            kind: ConditionKind::BooleanFlag {
                attribute: "using_salary_account".to_string(),
            },
            rate_delta: dec!(2.0),
            max_qualifying_balance: Some(dec!(1000000)),
        }];

        let mut attrs = BTreeMap::new();
        attrs.insert("using_salary_account".to_string(), AttributeValue::Flag(true));
        let (schedule, _) = evaluate(&account, &profile_with(attrs));

        assert_eq!(schedule.bands.len(), 2);
        assert_eq!(schedule.bands[0].upper, dec!(1000000));
        assert_eq!(schedule.bands[0].rate, dec!(4.0));
        assert_eq!(schedule.bands[1].rate, dec!(2.0));
    }

    #[test]
    fn test_tiered_account_band_rates() {
        let mut account = account();
        account.tiers = vec![
            BalanceTier {
                ceiling: dec!(500000),
                rate: dec!(7.0),
            },
            BalanceTier {
                ceiling: dec!(10000000),
                rate: dec!(2.0),
            },
        ];
        let (schedule, _) = evaluate(&account, &profile_with(BTreeMap::new()));
        assert_eq!(schedule.bands.len(), 2);
        assert_eq!(schedule.bands[0].rate, dec!(7.0));
        assert_eq!(schedule.bands[1].rate, dec!(2.0));
        assert_eq!(schedule.top_rate(), dec!(2.0));
        assert_eq!(schedule.best_rate(), dec!(7.0));
        assert_eq!(schedule.ceiling(), dec!(10000000));
    }

    #[test]
    fn test_unrecognized_condition_warns_and_contributes_nothing() {
        let mut account = account();
        account.bonus_conditions = vec![BonusCondition {
            name: "mystery_rule".to_string(),
            kind: ConditionKind::Unrecognized,
            rate_delta: dec!(5.0),
            max_qualifying_balance: None,
        }];

        let (schedule, warnings) = evaluate(&account, &profile_with(BTreeMap::new()));
        assert_eq!(schedule.bands[0].rate, dec!(2.0));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            CatalogWarning::UnknownConditionKind { condition, .. } if condition == "mystery_rule"
        ));
    }
}
