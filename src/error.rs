use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyEngineError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StrategyEngineError>;

/// Account-scoped defects recovered during a run. These never abort the
/// recommendation; the affected account is skipped or treated as
/// bonus-ineligible and the warning travels with the result set.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum CatalogWarning {
    #[error("unrecognized condition kind on '{account}': condition '{condition}' treated as not satisfied")]
    UnknownConditionKind { account: String, condition: String },

    #[error("inconsistent tier schedule on '{account}': {details}; account excluded")]
    TierScheduleInconsistent { account: String, details: String },
}
