//! Metrics engine - derived spending metrics for one person
//!
//! Pure, synchronous functions from a validated [`PersonRecord`] to a
//! [`MetricsResult`]. Nothing here blocks, caches, or mutates shared
//! state, so analyzing many records can fan out freely.
//!
//! Numeric rules, applied uniformly:
//! - currency figures round half-up to 2 decimal places, percentages to 1;
//! - each published figure is rounded once, from the exact sum;
//! - every division has an explicit zero-default branch (no transactions,
//!   no distinct days, zero budget, zero grand total all yield 0).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Dataset, PersonRecord, Transaction};

/// Placeholder category handed to exporters that expect a fixed number of
/// category columns.
pub const NO_CATEGORY: &str = "None";

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregate spending figures for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingMetrics {
    /// Sum of all transaction amounts
    pub total: Decimal,
    /// Mean amount per transaction, 0 when there are none
    pub average: Decimal,
    pub transaction_count: usize,
    /// Mean spend per distinct transaction date, 0 when there are none
    pub daily_average: Decimal,
}

/// Five-band classification of budget utilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Conservative,
    Moderate,
    High,
    NearLimit,
    OverBudget,
}

impl BudgetStatus {
    /// Classify a utilization percentage. Band boundaries are inclusive on
    /// the lower band: exactly 50% is still `Conservative`, exactly 100%
    /// is still `NearLimit`.
    pub fn from_utilization(utilization: Decimal) -> Self {
        if utilization <= Decimal::from(50) {
            Self::Conservative
        } else if utilization <= Decimal::from(75) {
            Self::Moderate
        } else if utilization <= Decimal::from(90) {
            Self::High
        } else if utilization <= Decimal::from(100) {
            Self::NearLimit
        } else {
            Self::OverBudget
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::NearLimit => "Near Limit",
            Self::OverBudget => "Over Budget",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Conservative" => Ok(Self::Conservative),
            "Moderate" => Ok(Self::Moderate),
            "High" => Ok(Self::High),
            "Near Limit" => Ok(Self::NearLimit),
            "Over Budget" => Ok(Self::OverBudget),
            _ => Err(format!("Unknown budget status: {}", s)),
        }
    }
}

/// Spending measured against the allocated budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    pub allocated: Decimal,
    pub spent: Decimal,
    /// May be negative when over budget
    pub remaining: Decimal,
    /// Percentage of the allocation spent, 0 when the allocation is 0
    pub utilization: Decimal,
    pub status: BudgetStatus,
    pub is_over_budget: bool,
}

/// One category's share of a record's spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: Decimal,
    pub transaction_count: usize,
    /// Share of the grand total, 0 when the grand total is 0
    pub percentage: Decimal,
    pub average_per_transaction: Decimal,
}

impl CategorySpend {
    /// The defined default exporters substitute when a record has fewer
    /// categories than their column set.
    pub fn placeholder() -> Self {
        Self {
            category: NO_CATEGORY.to_string(),
            amount: Decimal::ZERO,
            transaction_count: 0,
            percentage: Decimal::ZERO,
            average_per_transaction: Decimal::ZERO,
        }
    }
}

/// Total spend on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Per-date reduction of a record's transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineAnalysis {
    /// Daily sums in ascending date order
    pub daily_totals: Vec<DailySpend>,
    /// `None` when there are no transactions
    pub highest_spending_day: Option<DailySpend>,
    /// `None` when there are no transactions
    pub lowest_spending_day: Option<DailySpend>,
}

/// The complete derived-metrics bundle for one person at one analysis
/// invocation. Never mutated after construction; recompute to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub person_id: String,
    pub name: String,
    pub period: String,
    pub spending: SpendingMetrics,
    pub budget: BudgetAnalysis,
    /// Ranked by amount descending, first-seen order on ties
    pub categories: Vec<CategorySpend>,
    pub timeline: TimelineAnalysis,
}

impl MetricsResult {
    /// The top-ranked category, if the record has any transactions.
    pub fn top_category(&self) -> Option<&CategorySpend> {
        self.categories.first()
    }

    /// Exactly `n` ranked categories, padded with [`CategorySpend::placeholder`]
    /// entries when the record has fewer. Exporters with fixed column sets
    /// rely on this instead of handling short lists themselves.
    pub fn top_categories(&self, n: usize) -> Vec<CategorySpend> {
        let mut out: Vec<CategorySpend> = self.categories.iter().take(n).cloned().collect();
        out.resize_with(n, CategorySpend::placeholder);
        out
    }
}

/// Compute total, per-transaction average, and per-day average spend.
pub fn spending_metrics(transactions: &[Transaction]) -> SpendingMetrics {
    let transaction_count = transactions.len();
    let sum: Decimal = transactions.iter().map(|t| t.amount).sum();

    let average = if transaction_count == 0 {
        Decimal::ZERO
    } else {
        round2(sum / Decimal::from(transaction_count))
    };

    let unique_days = transactions
        .iter()
        .map(|t| t.date)
        .collect::<HashSet<_>>()
        .len();
    let daily_average = if unique_days == 0 {
        Decimal::ZERO
    } else {
        round2(sum / Decimal::from(unique_days))
    };

    SpendingMetrics {
        total: round2(sum),
        average,
        transaction_count,
        daily_average,
    }
}

/// Measure spending against the allocated budget.
pub fn budget_analysis(allocated: Decimal, transactions: &[Transaction]) -> BudgetAnalysis {
    let spent = round2(transactions.iter().map(|t| t.amount).sum());
    let remaining = round2(allocated - spent);

    let utilization = if allocated.is_zero() {
        Decimal::ZERO
    } else {
        round1(spent / allocated * Decimal::from(100))
    };

    BudgetAnalysis {
        allocated,
        spent,
        remaining,
        utilization,
        status: BudgetStatus::from_utilization(utilization),
        is_over_budget: spent > allocated,
    }
}

/// Group transactions by category and rank by amount.
///
/// The sort is stable over first-seen category order, so two categories
/// with the same summed amount keep the order in which they first appear
/// in the transaction list. Downstream consumers present the head of this
/// sequence as the top category, so the tie-break must be deterministic.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySpend> {
    // (category, exact sum, count) in first-seen order
    let mut groups: Vec<(String, Decimal, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in transactions {
        match index.get(tx.category.as_str()) {
            Some(&i) => {
                groups[i].1 += tx.amount;
                groups[i].2 += 1;
            }
            None => {
                // Key lifetime: the &str borrows from the transaction
                // slice, which outlives this function's use of the map.
                index.insert(tx.category.as_str(), groups.len());
                groups.push((tx.category.clone(), tx.amount, 1));
            }
        }
    }

    let grand_total: Decimal = groups.iter().map(|(_, amount, _)| *amount).sum();

    // sort_by is stable; equal amounts keep first-seen order
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    groups
        .into_iter()
        .map(|(category, amount, count)| {
            let percentage = if grand_total.is_zero() {
                Decimal::ZERO
            } else {
                round1(amount / grand_total * Decimal::from(100))
            };
            CategorySpend {
                category,
                amount: round2(amount),
                transaction_count: count,
                percentage,
                average_per_transaction: round2(amount / Decimal::from(count)),
            }
        })
        .collect()
}

/// Reduce transactions to per-date sums in ascending date order and pick
/// out the highest- and lowest-spending days (first occurrence wins ties).
pub fn timeline_analysis(transactions: &[Transaction]) -> TimelineAnalysis {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for tx in transactions {
        *by_date.entry(tx.date).or_insert(Decimal::ZERO) += tx.amount;
    }

    let daily_totals: Vec<DailySpend> = by_date
        .into_iter()
        .map(|(date, amount)| DailySpend {
            date,
            amount: round2(amount),
        })
        .collect();

    let mut highest: Option<&DailySpend> = None;
    let mut lowest: Option<&DailySpend> = None;
    for day in &daily_totals {
        // Strict comparisons so the earliest date keeps a tied extreme
        match highest {
            Some(h) if day.amount <= h.amount => {}
            _ => highest = Some(day),
        }
        match lowest {
            Some(l) if day.amount >= l.amount => {}
            _ => lowest = Some(day),
        }
    }

    TimelineAnalysis {
        highest_spending_day: highest.cloned(),
        lowest_spending_day: lowest.cloned(),
        daily_totals,
    }
}

/// Analyze a single record. Total over any validated input.
pub fn analyze_record(record: &PersonRecord) -> MetricsResult {
    let result = MetricsResult {
        person_id: record.id.clone(),
        name: record.name.clone(),
        period: record.period.clone(),
        spending: spending_metrics(&record.transactions),
        budget: budget_analysis(record.budget_limit, &record.transactions),
        categories: category_breakdown(&record.transactions),
        timeline: timeline_analysis(&record.transactions),
    };
    tracing::debug!(
        person = %record.id,
        transactions = record.transactions.len(),
        utilization = %result.budget.utilization,
        "analysis complete"
    );
    result
}

/// Analyze the record with the given id.
///
/// Fails with [`Error::NotFound`] for an unknown id; batch callers may
/// skip that failure and continue with their remaining ids.
pub fn analyze(dataset: &Dataset, person_id: &str) -> Result<MetricsResult> {
    let record = dataset
        .get(person_id)
        .ok_or_else(|| Error::NotFound(person_id.to_string()))?;
    Ok(analyze_record(record))
}

/// Analyze every record in the dataset, in insertion order.
///
/// Each analysis depends only on its own record, so this is a plain map;
/// callers needing parallelism can fan out over `dataset.records()`
/// themselves.
pub fn analyze_all(dataset: &Dataset) -> Vec<MetricsResult> {
    dataset.records().iter().map(analyze_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tx(date: &str, category: &str, amount: &str) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            category: category.to_string(),
            amount: dec(amount),
        }
    }

    fn record(budget: &str, transactions: Vec<Transaction>) -> PersonRecord {
        PersonRecord {
            id: "p1".to_string(),
            name: "Alex Rivera".to_string(),
            period: "Fall 2025".to_string(),
            budget_limit: dec(budget),
            transactions,
        }
    }

    #[test]
    fn test_spending_metrics_basic() {
        let metrics = spending_metrics(&[
            tx("2025-09-01", "Food", "10.00"),
            tx("2025-09-01", "Food", "20.00"),
            tx("2025-09-03", "Books", "30.00"),
        ]);
        assert_eq!(metrics.total, dec("60.00"));
        assert_eq!(metrics.average, dec("20.00"));
        assert_eq!(metrics.transaction_count, 3);
        // two distinct days
        assert_eq!(metrics.daily_average, dec("30.00"));
    }

    #[test]
    fn test_total_rounds_once_not_per_term() {
        // Each amount carries a third decimal; rounding per-term would
        // give 0.01 + 0.01 + 0.01 = 0.03, rounding the sum gives 0.02.
        let metrics = spending_metrics(&[
            tx("2025-09-01", "Misc", "0.005"),
            tx("2025-09-01", "Misc", "0.005"),
            tx("2025-09-01", "Misc", "0.005"),
        ]);
        assert_eq!(metrics.total, dec("0.02"));
    }

    #[test]
    fn test_midpoint_rounds_up() {
        let metrics = spending_metrics(&[tx("2025-09-01", "Misc", "2.345")]);
        assert_eq!(metrics.total, dec("2.35"));
    }

    #[test]
    fn test_empty_record_yields_zero_defaults() {
        let metrics = spending_metrics(&[]);
        assert_eq!(metrics.total, Decimal::ZERO);
        assert_eq!(metrics.average, Decimal::ZERO);
        assert_eq!(metrics.transaction_count, 0);
        assert_eq!(metrics.daily_average, Decimal::ZERO);

        let budget = budget_analysis(dec("400"), &[]);
        assert_eq!(budget.utilization, Decimal::ZERO);
        assert_eq!(budget.status, BudgetStatus::Conservative);
        assert!(!budget.is_over_budget);

        let timeline = timeline_analysis(&[]);
        assert!(timeline.daily_totals.is_empty());
        assert!(timeline.highest_spending_day.is_none());
        assert!(timeline.lowest_spending_day.is_none());
    }

    #[test]
    fn test_zero_budget_never_divides() {
        let budget = budget_analysis(dec("0"), &[tx("2025-09-01", "Food", "10.00")]);
        assert_eq!(budget.utilization, Decimal::ZERO);
        assert_eq!(budget.remaining, dec("-10.00"));
        assert!(budget.is_over_budget);
    }

    #[test]
    fn test_utilization_boundary_table() {
        let cases = [
            ("50", BudgetStatus::Conservative, false),
            ("75", BudgetStatus::Moderate, false),
            ("90", BudgetStatus::High, false),
            ("100", BudgetStatus::NearLimit, false),
            ("101", BudgetStatus::OverBudget, true),
        ];
        for (spent, status, over) in cases {
            let budget = budget_analysis(dec("100"), &[tx("2025-09-01", "Misc", spent)]);
            assert_eq!(budget.status, status, "spent={}", spent);
            assert_eq!(budget.is_over_budget, over, "spent={}", spent);
        }
    }

    #[test]
    fn test_budget_status_round_trips_as_text() {
        for status in [
            BudgetStatus::Conservative,
            BudgetStatus::Moderate,
            BudgetStatus::High,
            BudgetStatus::NearLimit,
            BudgetStatus::OverBudget,
        ] {
            assert_eq!(status.as_str().parse::<BudgetStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_category_breakdown_ranks_by_amount() {
        let breakdown = category_breakdown(&[
            tx("2025-09-01", "Food", "120.00"),
            tx("2025-09-02", "Food", "80.00"),
            tx("2025-09-02", "Books", "60.00"),
            tx("2025-09-03", "Entertainment", "40.00"),
        ]);
        let names: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Books", "Entertainment"]);

        let food = &breakdown[0];
        assert_eq!(food.amount, dec("200.00"));
        assert_eq!(food.transaction_count, 2);
        assert_eq!(food.percentage, dec("66.7"));
        assert_eq!(food.average_per_transaction, dec("100.00"));
    }

    #[test]
    fn test_category_tie_keeps_first_seen_order() {
        let breakdown = category_breakdown(&[
            tx("2025-09-01", "Transit", "25.00"),
            tx("2025-09-01", "Coffee", "25.00"),
            tx("2025-09-02", "Food", "50.00"),
        ]);
        let names: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        // Transit and Coffee tie at 25.00; Transit appeared first
        assert_eq!(names, vec!["Food", "Transit", "Coffee"]);
    }

    #[test]
    fn test_category_percentages_sum_to_hundred() {
        let breakdown = category_breakdown(&[
            tx("2025-09-01", "Food", "33.33"),
            tx("2025-09-01", "Books", "33.33"),
            tx("2025-09-01", "Transit", "33.34"),
        ]);
        let sum: Decimal = breakdown.iter().map(|c| c.percentage).sum();
        let tolerance = dec("0.1") * Decimal::from(breakdown.len());
        assert!((sum - Decimal::from(100)).abs() <= tolerance, "sum={}", sum);
    }

    #[test]
    fn test_category_percentage_zero_when_total_zero() {
        let breakdown = category_breakdown(&[tx("2025-09-01", "Food", "0")]);
        assert_eq!(breakdown[0].percentage, Decimal::ZERO);
    }

    #[test]
    fn test_timeline_reduction() {
        let timeline = timeline_analysis(&[
            tx("2024-01-02", "Food", "40.00"),
            tx("2024-01-01", "Food", "10.00"),
            tx("2024-01-02", "Books", "5.00"),
        ]);
        assert_eq!(timeline.daily_totals.len(), 2);
        assert_eq!(timeline.daily_totals[0].date, "2024-01-01".parse().unwrap());
        assert_eq!(timeline.daily_totals[0].amount, dec("10.00"));
        assert_eq!(timeline.daily_totals[1].date, "2024-01-02".parse().unwrap());
        assert_eq!(timeline.daily_totals[1].amount, dec("45.00"));

        let highest = timeline.highest_spending_day.unwrap();
        assert_eq!(highest.date, "2024-01-02".parse().unwrap());
        assert_eq!(highest.amount, dec("45.00"));
        let lowest = timeline.lowest_spending_day.unwrap();
        assert_eq!(lowest.date, "2024-01-01".parse().unwrap());
        assert_eq!(lowest.amount, dec("10.00"));
    }

    #[test]
    fn test_timeline_tie_goes_to_earlier_date() {
        let timeline = timeline_analysis(&[
            tx("2024-01-01", "Food", "20.00"),
            tx("2024-01-02", "Food", "20.00"),
        ]);
        let earlier: NaiveDate = "2024-01-01".parse().unwrap();
        assert_eq!(timeline.highest_spending_day.unwrap().date, earlier);
        assert_eq!(timeline.lowest_spending_day.unwrap().date, earlier);
    }

    #[test]
    fn test_analyze_record_end_to_end() {
        let record = record(
            "400",
            vec![
                tx("2025-09-01", "Food", "120"),
                tx("2025-09-02", "Food", "80"),
                tx("2025-09-02", "Books", "60"),
                tx("2025-09-03", "Entertainment", "40"),
            ],
        );
        let result = analyze_record(&record);

        assert_eq!(result.spending.total, dec("300.00"));
        assert_eq!(result.spending.average, dec("75.00"));
        assert_eq!(result.spending.transaction_count, 4);
        assert_eq!(result.spending.daily_average, dec("100.00"));

        assert_eq!(result.budget.utilization, dec("75.0"));
        assert_eq!(result.budget.status, BudgetStatus::Moderate);
        assert_eq!(result.budget.remaining, dec("100.00"));
        assert!(!result.budget.is_over_budget);

        let top = result.top_category().unwrap();
        assert_eq!(top.category, "Food");
        assert_eq!(top.amount, dec("200.00"));
        assert_eq!(top.percentage, dec("66.7"));
    }

    #[test]
    fn test_top_categories_pads_short_lists() {
        let result = analyze_record(&record("400", vec![tx("2025-09-01", "Food", "50")]));
        let padded = result.top_categories(3);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[0].category, "Food");
        assert_eq!(padded[1].category, NO_CATEGORY);
        assert_eq!(padded[1].amount, Decimal::ZERO);
        assert_eq!(padded[2].category, NO_CATEGORY);
    }

    #[test]
    fn test_analyze_unknown_id_is_not_found() {
        let dataset = crate::models::Dataset::from_validated(vec![record("400", vec![])]);
        let err = analyze(&dataset, "nobody").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == "nobody"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_analyze_all_covers_every_record() {
        let mut second = record("100", vec![tx("2025-09-01", "Food", "10")]);
        second.id = "p2".to_string();
        let dataset = crate::models::Dataset::from_validated(vec![record("400", vec![]), second]);
        let results = analyze_all(&dataset);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].person_id, "p1");
        assert_eq!(results[1].person_id, "p2");
    }
}
