//! Pattern Rule Types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Comparison applied to a feature value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterThan,
    LessThan,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::GreaterThan => ">",
            Comparator::LessThan => "<",
        }
    }
}

/// A single-comparator threshold condition such as `> 3.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Condition {
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Condition {
    pub fn greater_than(threshold: f64) -> Self {
        Self {
            comparator: Comparator::GreaterThan,
            threshold,
        }
    }

    pub fn less_than(threshold: f64) -> Self {
        Self {
            comparator: Comparator::LessThan,
            threshold,
        }
    }

    /// Parse condition text. Accepts `>3.5`, `> 3.0` and `< 0.1`.
    pub fn parse(text: &str) -> Result<Self, &'static str> {
        let text = text.trim();
        let mut chars = text.chars();

        let comparator = match chars.next() {
            Some('>') => Comparator::GreaterThan,
            Some('<') => Comparator::LessThan,
            Some(_) => return Err("must start with '>' or '<'"),
            None => return Err("empty condition"),
        };

        let rest = chars.as_str().trim();
        if rest.starts_with('=') {
            return Err("inclusive comparators are not supported");
        }
        if rest.contains(|c: char| c == '>' || c == '<') {
            return Err("only one comparator is allowed");
        }

        let threshold = rest
            .parse::<f64>()
            .map_err(|_| "threshold is not a number")?;
        if !threshold.is_finite() {
            return Err("threshold must be finite");
        }

        Ok(Self {
            comparator,
            threshold,
        })
    }

    /// Whether `value` satisfies the condition. Comparisons are strict.
    pub fn is_satisfied_by(&self, value: f64) -> bool {
        match self.comparator {
            Comparator::GreaterThan => value > self.threshold,
            Comparator::LessThan => value < self.threshold,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparator.symbol(), self.threshold)
    }
}

/// Risk level attached to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named threshold rule from the pattern table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRule {
    pub fraud_type: String,
    pub feature: String,
    pub condition: Condition,
    pub risk_level: RiskLevel,
    pub description: String,
}

impl PatternRule {
    pub fn new(
        fraud_type: impl Into<String>,
        feature: impl Into<String>,
        condition: Condition,
        risk_level: RiskLevel,
        description: impl Into<String>,
    ) -> Self {
        Self {
            fraud_type: fraud_type.into(),
            feature: feature.into(),
            condition,
            risk_level,
            description: description.into(),
        }
    }
}
