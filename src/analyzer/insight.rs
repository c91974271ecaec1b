use crate::analyzer::market_indicators::RiskLevel;

pub const INSIGHT_SEPARATOR: &str = " | ";
pub const NO_INSIGHT: &str = "insufficient data, continue observing";

/// Raw (unrounded) figures the insight rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightInputs {
    pub correlation: f64,
    pub beta: f64,
    pub risk_level: RiskLevel,
}

struct InsightRule {
    applies: fn(&InsightInputs) -> bool,
    message: fn(&InsightInputs) -> String,
}

// Evaluated in order; every matching rule contributes a clause.
const RULES: [InsightRule; 6] = [
    InsightRule {
        applies: high_correlation,
        message: pair_trading_clause,
    },
    InsightRule {
        applies: low_correlation,
        message: diversification_clause,
    },
    InsightRule {
        applies: high_beta,
        message: short_term_clause,
    },
    InsightRule {
        applies: low_beta,
        message: long_term_clause,
    },
    InsightRule {
        applies: high_risk,
        message: monitor_clause,
    },
    InsightRule {
        applies: very_low_risk,
        message: in_sync_clause,
    },
];

fn high_correlation(i: &InsightInputs) -> bool {
    i.correlation.abs() > 0.7
}

fn low_correlation(i: &InsightInputs) -> bool {
    i.correlation.abs() < 0.3
}

fn high_beta(i: &InsightInputs) -> bool {
    i.beta > 1.2
}

fn low_beta(i: &InsightInputs) -> bool {
    i.beta < 0.5
}

fn high_risk(i: &InsightInputs) -> bool {
    i.risk_level == RiskLevel::High
}

fn very_low_risk(i: &InsightInputs) -> bool {
    i.risk_level == RiskLevel::VeryLow
}

fn pair_trading_clause(i: &InsightInputs) -> String {
    format!(
        "stock and coin are highly correlated ({:.2}), suited to pair trading",
        i.correlation
    )
}

fn diversification_clause(i: &InsightInputs) -> String {
    format!(
        "stock and coin are weakly correlated ({:.2}), good diversification",
        i.correlation
    )
}

fn short_term_clause(_: &InsightInputs) -> String {
    "stock reacts strongly to coin moves, suited to short-term trading".to_string()
}

fn long_term_clause(_: &InsightInputs) -> String {
    "stock is relatively steady, suited to long-term holding".to_string()
}

fn monitor_clause(_: &InsightInputs) -> String {
    "frequent decoupling, monitor the market closely".to_string()
}

fn in_sync_clause(_: &InsightInputs) -> String {
    "prices move in sync, relatively low risk".to_string()
}

/// Joins the clauses of every matching rule.
pub fn generate_insight(inputs: &InsightInputs) -> String {
    let clauses: Vec<String> = RULES
        .iter()
        .filter(|rule| (rule.applies)(inputs))
        .map(|rule| (rule.message)(inputs))
        .collect();

    if clauses.is_empty() {
        NO_INSIGHT.to_string()
    } else {
        clauses.join(INSIGHT_SEPARATOR)
    }
}
