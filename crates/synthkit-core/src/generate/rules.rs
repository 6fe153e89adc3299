//! # Rules Engine
//!
//! Evaluates the schema's conditional `if`/`then` rules against a row
//! context. A rule contributes violations only when its condition holds;
//! any evaluation failure (parse error, unknown name, incomparable types)
//! counts as a non-true result and never propagates to the caller.

use crate::expr::{evaluate_truthy, RowContext};
use crate::schema::types::RuleSpec;

/// Every consequent expression that evaluates false under a true condition.
/// The row is rule-violating iff the returned list is non-empty.
pub fn evaluate_rules<'r>(rules: &'r [RuleSpec], ctx: &RowContext<'_>) -> Vec<&'r str> {
    let mut violations = Vec::new();
    for rule in rules {
        if truthy(&rule.condition, ctx) {
            for consequent in &rule.then {
                if !truthy(consequent, ctx) {
                    violations.push(consequent.as_str());
                }
            }
        }
    }
    violations
}

fn truthy(source: &str, ctx: &RowContext<'_>) -> bool {
    evaluate_truthy(source, ctx).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::value::Value;
    use indexmap::IndexMap;

    fn rule(condition: &str, then: &[&str]) -> RuleSpec {
        RuleSpec {
            condition: condition.to_string(),
            then: then.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn failed_order(total: f64) -> IndexMap<String, Value> {
        let mut row = IndexMap::new();
        row.insert("status".to_string(), Value::borrowed("FAILED"));
        row.insert("total".to_string(), Value::Float(total));
        row
    }

    #[test]
    fn test_violation_collected_when_consequent_fails() {
        let rules = vec![rule("orders.status == 'FAILED'", &["orders.total <= 500.0"])];
        let row = failed_order(750.0);
        let mut ctx = RowContext::new();
        ctx.insert("orders", &row);
        let violations = evaluate_rules(&rules, &ctx);
        assert_eq!(violations, vec!["orders.total <= 500.0"]);
    }

    #[test]
    fn test_no_violation_when_condition_false() {
        let rules = vec![rule("orders.status == 'PAID'", &["orders.total <= 500.0"])];
        let row = failed_order(750.0);
        let mut ctx = RowContext::new();
        ctx.insert("orders", &row);
        assert!(evaluate_rules(&rules, &ctx).is_empty());
    }

    #[test]
    fn test_erroring_condition_contributes_nothing() {
        // references a table absent from the context
        let rules = vec![rule("customers.vip == true", &["orders.total <= 500.0"])];
        let row = failed_order(750.0);
        let mut ctx = RowContext::new();
        ctx.insert("orders", &row);
        assert!(evaluate_rules(&rules, &ctx).is_empty());
    }

    #[test]
    fn test_erroring_consequent_counts_as_violation() {
        let rules = vec![rule("orders.status == 'FAILED'", &["customers.vip == true"])];
        let row = failed_order(100.0);
        let mut ctx = RowContext::new();
        ctx.insert("orders", &row);
        assert_eq!(evaluate_rules(&rules, &ctx).len(), 1);
    }

    #[test]
    fn test_multiple_consequents_collect_each_failure() {
        let rules = vec![rule(
            "orders.status == 'FAILED'",
            &["orders.total <= 500.0", "orders.total >= 50.0", "orders.total <= 700.0"],
        )];
        let row = failed_order(750.0);
        let mut ctx = RowContext::new();
        ctx.insert("orders", &row);
        assert_eq!(evaluate_rules(&rules, &ctx).len(), 2);
    }
}
