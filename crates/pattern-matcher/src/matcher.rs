//! Rule Matching

use crate::rule::PatternRule;
use crate::table::PatternTable;
use crate::MatchError;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use transaction::Transaction;

/// A rule satisfied by a transaction, with the value that satisfied it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPattern {
    pub rule: Arc<PatternRule>,
    pub value: f64,
}

impl MatchedPattern {
    /// One-line rendering: `V2 > 3: Unusual transaction velocity`
    pub fn summary(&self) -> String {
        format!(
            "{} {}: {}",
            self.rule.feature, self.rule.condition, self.rule.description
        )
    }
}

/// Evaluates transactions against a loaded pattern table
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    table: PatternTable,
}

impl PatternMatcher {
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Return the rules the transaction satisfies, in table order.
    ///
    /// Rules on features the transaction lacks are skipped before evaluation.
    pub fn match_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<MatchedPattern>, MatchError> {
        let mut matched = Vec::new();

        for rule in self.table.rules() {
            let Some(value) = transaction.get(&rule.feature) else {
                continue;
            };
            if !value.is_finite() {
                return Err(MatchError::NonFiniteValue {
                    feature: rule.feature.clone(),
                    value,
                });
            }
            if rule.condition.is_satisfied_by(value) {
                matched.push(MatchedPattern {
                    rule: Arc::clone(rule),
                    value,
                });
            }
        }

        debug!(
            "Matched {} of {} fraud patterns",
            matched.len(),
            self.table.len()
        );
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Condition, RiskLevel};
    use proptest::prelude::*;

    fn velocity_rule() -> PatternRule {
        PatternRule::new(
            "Velocity",
            "V2",
            Condition::greater_than(3.0),
            RiskLevel::High,
            "Unusual transaction velocity",
        )
    }

    fn matcher(rules: Vec<PatternRule>) -> PatternMatcher {
        PatternMatcher::new(PatternTable::from_rules(rules))
    }

    #[test]
    fn test_rule_matches_above_threshold() {
        let matcher = matcher(vec![velocity_rule()]);
        let tx = Transaction::from_fields([("V2", 3.6)]);

        let matched = matcher.match_transaction(&tx).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].value, 3.6);
        assert_eq!(matched[0].summary(), "V2 > 3: Unusual transaction velocity");
    }

    #[test]
    fn test_rule_does_not_match_below_threshold() {
        let matcher = matcher(vec![velocity_rule()]);
        let tx = Transaction::from_fields([("V2", 2.9)]);
        assert!(matcher.match_transaction(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_missing_feature_is_excluded() {
        let matcher = matcher(vec![velocity_rule()]);
        let tx = Transaction::from_fields([("Amount", 10.0)]);
        assert!(matcher.match_transaction(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_value_is_an_error() {
        let matcher = matcher(vec![velocity_rule()]);
        let tx = Transaction::from_fields([("V2", f64::NAN)]);
        assert!(matches!(
            matcher.match_transaction(&tx),
            Err(MatchError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_shared_rule_is_not_copied() {
        let matcher = matcher(vec![velocity_rule()]);
        let tx = Transaction::from_fields([("V2", 5.0)]);
        let matched = matcher.match_transaction(&tx).unwrap();
        assert!(Arc::ptr_eq(&matched[0].rule, &matcher.table().rules()[0]));
    }

    proptest! {
        #[test]
        fn prop_matches_preserve_table_order(
            thresholds in proptest::collection::vec(-10.0f64..10.0, 1..20),
            value in -10.0f64..10.0,
        ) {
            let rules: Vec<PatternRule> = thresholds
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let condition = if i % 2 == 0 {
                        Condition::greater_than(*t)
                    } else {
                        Condition::less_than(*t)
                    };
                    PatternRule::new(i.to_string(), "V1", condition, RiskLevel::Medium, "")
                })
                .collect();
            let expected: Vec<String> = rules
                .iter()
                .filter(|r| r.condition.is_satisfied_by(value))
                .map(|r| r.fraud_type.clone())
                .collect();

            let matcher = matcher(rules);
            let tx = Transaction::from_fields([("V1", value)]);
            let actual: Vec<String> = matcher
                .match_transaction(&tx)
                .unwrap()
                .into_iter()
                .map(|m| m.rule.fraud_type.clone())
                .collect();

            prop_assert_eq!(actual, expected);
        }
    }
}
