use std::fmt;

/// Why an upgrade (or a paid action) was refused. Every variant leaves the
/// ledger and the target untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    TargetNotFound,
    AlreadyMaxLevel { level: u32 },
    InsufficientFunds { cost: u32, balance: u32 },
    ConfigurationMissing { table: String, level: u32 },
}

impl fmt::Display for UpgradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound => write!(f, "no upgrade target"),
            Self::AlreadyMaxLevel { level } => write!(f, "already at max level {level}"),
            Self::InsufficientFunds { cost, balance } => {
                write!(f, "need {cost}, have {balance}")
            }
            Self::ConfigurationMissing { table, level } => {
                write!(f, "table '{table}' has no entry for level {level}")
            }
        }
    }
}

impl std::error::Error for UpgradeError {}
