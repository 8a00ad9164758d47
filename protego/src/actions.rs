use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Optimization strategy requested from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    PortfolioAnalysis,
    SafeYield,
    HighApy,
    AutoOptimize,
    Custom(String),
}

impl Strategy {
    pub fn as_str(&self) -> &str {
        match self {
            Strategy::PortfolioAnalysis => "portfolio-analysis",
            Strategy::SafeYield => "safe-yield-strategy",
            Strategy::HighApy => "high-apy-strategy",
            Strategy::AutoOptimize => "auto-optimize-portfolio",
            Strategy::Custom(name) => name,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "portfolio-analysis" => Strategy::PortfolioAnalysis,
            "safe-yield-strategy" => Strategy::SafeYield,
            "high-apy-strategy" => Strategy::HighApy,
            "auto-optimize-portfolio" => Strategy::AutoOptimize,
            other => Strategy::Custom(other.to_string()),
        })
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        match s.parse() {
            Ok(strategy) => Ok(strategy),
            Err(never) => match never {},
        }
    }
}

/// Request forwarded to the embedding application's hook channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "strategy", rename_all = "kebab-case")]
pub enum DashboardAction {
    EmergencyWithdrawal,
    Optimize(Strategy),
}
