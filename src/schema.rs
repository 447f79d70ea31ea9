use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BalanceTier {
    #[schemars(
        description = "Upper bound of this balance band in won. Bands are cumulative: the rate applies to the slice of principal between the previous tier's ceiling and this one."
    )]
    pub ceiling: Decimal,

    #[schemars(description = "Annual interest rate in percent applicable up to this ceiling (e.g. 7.0 for 7%)")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionKind {
    #[schemars(
        description = "Satisfied when the named profile attribute is present and true (e.g. first_banking, bank_app, using_salary_account)"
    )]
    BooleanFlag { attribute: String },

    #[schemars(
        description = "Satisfied when the named numeric profile attribute meets the minimum (e.g. monthly card spend, app login streak)"
    )]
    NumericThreshold { attribute: String, minimum: Decimal },

    #[schemars(
        description = "Satisfied when the named text profile attribute is one of the accepted values (e.g. customer segment membership)"
    )]
    CategoricalMembership {
        attribute: String,
        accepted: Vec<String>,
    },

    /// Any condition kind outside the closed set above. Always evaluates to
    /// not satisfied and surfaces an `UnknownConditionKind` warning.
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BonusCondition {
    #[schemars(description = "Name of the eligibility rule as published by the institution")]
    pub name: String,

    #[schemars(description = "How satisfaction of this condition is decided against the user's declared attributes")]
    pub kind: ConditionKind,

    #[schemars(description = "Rate bonus in percentage points granted when the condition is satisfied")]
    pub rate_delta: Decimal,

    #[serde(default)]
    #[schemars(
        description = "Largest balance the bonus applies to, when it caps below the account's own ceiling. Omit if the bonus covers the full balance."
    )]
    pub max_qualifying_balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum EarlyTerminationPenalty {
    #[schemars(description = "No penalty; funds can leave at any time (typical for parking accounts)")]
    None,

    #[schemars(description = "Interest is recalculated at a reduced annual rate on early termination")]
    ReducedRate { rate: Decimal },

    #[schemars(description = "All accrued interest is forfeited on early termination")]
    ForfeitInterest,
}

impl Default for EarlyTerminationPenalty {
    fn default() -> Self {
        Self::None
    }
}

impl EarlyTerminationPenalty {
    /// Relative ordering weight used by the ranker's risk tie-break.
    pub fn risk_weight(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::ReducedRate { .. } => 1,
            Self::ForfeitInterest => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Account {
    #[schemars(description = "Institution offering the product (e.g. 'OK저축은행')")]
    pub institution: String,

    #[schemars(description = "Product name as listed by the institution")]
    pub product_name: String,

    #[serde(default)]
    #[schemars(
        description = "Category tags the catalog assigns to the product (e.g. 'online', 'anyone', 'special_offer')"
    )]
    pub categories: Vec<String>,

    #[schemars(
        description = "Base annual rate in percent. Applies to any balance range not covered by an explicit tier."
    )]
    pub base_rate: Decimal,

    #[serde(default)]
    #[schemars(
        description = "Balance bands with their own rates, strictly increasing ceilings starting from zero. Empty means the base rate applies to the whole balance."
    )]
    pub tiers: Vec<BalanceTier>,

    #[serde(default)]
    #[schemars(description = "Bonus-rate conditions the user may satisfy; deltas combine additively")]
    pub bonus_conditions: Vec<BonusCondition>,

    #[serde(default)]
    #[schemars(
        description = "Cap in percentage points on the combined bonus deltas. Omit if the institution states no cap."
    )]
    pub max_bonus_rate: Option<Decimal>,

    #[serde(default)]
    #[schemars(description = "Absolute ceiling on any effective rate for this product, in percent")]
    pub max_possible_rate: Option<Decimal>,

    #[serde(default)]
    #[schemars(
        description = "Fixed term in days (e.g. 90 for a promotional three-month product). Omit for open-ended parking accounts."
    )]
    pub term_days: Option<i64>,

    #[serde(default)]
    #[schemars(description = "Minimum opening deposit in won")]
    pub min_deposit: Decimal,

    #[schemars(description = "Maximum deposit in won; also the top tier ceiling")]
    pub max_deposit: Decimal,

    #[serde(default)]
    #[schemars(
        description = "Whether the account credits interest back into principal, so that funds switched into it carry prior interest forward"
    )]
    pub compounds: bool,

    #[serde(default)]
    #[schemars(description = "Penalty applied when funds leave a term product before maturity")]
    pub early_termination: EarlyTerminationPenalty,
}

impl Account {
    /// Display label used in warnings and tie-breaking.
    pub fn label(&self) -> String {
        format!("{} {}", self.institution, self.product_name)
    }

    /// Checks the tier-schedule invariant: strictly increasing positive
    /// ceilings, never above `max_deposit`, with non-negative rates.
    /// Returns a human-readable description of the first defect found.
    pub fn validate_tiers(&self) -> std::result::Result<(), String> {
        if self.max_deposit <= Decimal::ZERO {
            return Err(format!("max_deposit must be positive (got {})", self.max_deposit));
        }
        if self.min_deposit > self.max_deposit {
            return Err(format!(
                "min_deposit {} exceeds max_deposit {}",
                self.min_deposit, self.max_deposit
            ));
        }
        if self.base_rate < Decimal::ZERO {
            return Err(format!("base_rate must be non-negative (got {})", self.base_rate));
        }

        let mut previous = Decimal::ZERO;
        for (idx, tier) in self.tiers.iter().enumerate() {
            if tier.ceiling <= previous {
                return Err(format!(
                    "tier #{} ceiling {} does not exceed previous bound {}",
                    idx, tier.ceiling, previous
                ));
            }
            if tier.ceiling > self.max_deposit {
                return Err(format!(
                    "tier #{} ceiling {} exceeds max_deposit {}",
                    idx, tier.ceiling, self.max_deposit
                ));
            }
            if tier.rate < Decimal::ZERO {
                return Err(format!("tier #{} rate must be non-negative (got {})", idx, tier.rate));
            }
            previous = tier.ceiling;
        }
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Account)
    }

    pub fn schema_as_json() -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&Self::generate_json_schema())?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(Decimal),
    Text(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskPreference {
    #[schemars(description = "Only consider switches at natural term boundaries")]
    Conservative,

    #[schemars(description = "Also consider mid-horizon switches at fixed intervals to chase higher rates")]
    Aggressive,
}

impl Default for RiskPreference {
    fn default() -> Self {
        Self::Conservative
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct UserProfile {
    #[schemars(description = "Principal available to allocate, in won")]
    pub budget: Decimal,

    #[schemars(description = "Investment horizon in days")]
    pub horizon_days: i64,

    #[schemars(description = "Date the recommendation takes effect; anchors segment periods")]
    pub opened_on: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Whether the user accepts splitting funds across several accounts")]
    pub willing_to_split: bool,

    #[serde(default)]
    #[schemars(
        description = "Declared attributes bonus conditions are tested against (e.g. first_banking: true, monthly_card_spend: 300000)"
    )]
    pub attributes: BTreeMap<String, AttributeValue>,

    #[serde(default)]
    pub risk_preference: RiskPreference,

    #[serde(default)]
    #[schemars(
        description = "Drop accounts whose best achievable effective rate falls below this percentage"
    )]
    pub min_rate: Option<Decimal>,

    #[serde(default)]
    #[schemars(
        description = "Category tags a product must carry to be considered; every listed tag is required. Empty means no category constraint."
    )]
    pub required_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Maximum number of sequential holdings in a switch strategy")]
    pub max_switches: u32,

    #[schemars(description = "Shortest economically meaningful holding period in days")]
    pub min_holding_days: i64,

    #[schemars(description = "Net-interest margin within which candidates count as tied")]
    pub tie_epsilon: Decimal,

    #[schemars(description = "Withholding tax rate on interest income (0.154 in Korea)")]
    pub tax_rate: Decimal,

    #[schemars(description = "Most accounts a split strategy may use")]
    pub max_split_accounts: usize,

    #[schemars(description = "Interval in days between candidate switch points under the aggressive preference")]
    pub aggressive_switch_interval_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_switches: 3,
            min_holding_days: 30,
            tie_epsilon: dec!(0.0001),
            tax_rate: dec!(0.154),
            max_split_accounts: 5,
            aggressive_switch_interval_days: 30,
        }
    }
}
