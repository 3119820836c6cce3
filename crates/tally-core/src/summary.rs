//! Summary formatter - plain-text rendering of a metrics result
//!
//! Flattens a [`MetricsResult`] into a fixed-section text block that is
//! handed, opaque, to a narrative-generation backend. Section order and
//! number formatting are deterministic; nothing downstream is allowed to
//! parse this text back.

use rust_decimal::Decimal;

use crate::metrics::{CategorySpend, DailySpend, MetricsResult};

/// Separator between category entries in the breakdown line.
const CATEGORY_SEPARATOR: &str = ", ";

/// Fixed two-decimal dollar display, e.g. `$120.50`.
pub fn dollars(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

/// Fixed one-decimal percentage display, e.g. `66.7%`.
pub fn percent(value: Decimal) -> String {
    format!("{:.1}%", value)
}

fn category_entry(category: &CategorySpend) -> String {
    format!(
        "{}: {} ({})",
        category.category,
        dollars(category.amount),
        percent(category.percentage)
    )
}

fn day_entry(day: Option<&DailySpend>) -> String {
    match day {
        Some(day) => format!("{} ({})", day.date, dollars(day.amount)),
        None => format!("n/a ({})", dollars(Decimal::ZERO)),
    }
}

/// Render the fixed-section summary block for one metrics result.
///
/// Sections, in order: profile identity, budget analysis, spending
/// patterns, category breakdown, timeline highlights.
pub fn render(result: &MetricsResult) -> String {
    let categories_line = if result.categories.is_empty() {
        "none".to_string()
    } else {
        result
            .categories
            .iter()
            .map(category_entry)
            .collect::<Vec<_>>()
            .join(CATEGORY_SEPARATOR)
    };

    format!(
        "Spending Profile: {name} ({id})\n\
         Period: {period}\n\
         \n\
         Budget\n\
         - Allocated: {allocated}\n\
         - Spent: {spent}\n\
         - Remaining: {remaining}\n\
         - Utilization: {utilization} ({status})\n\
         - Over budget: {over}\n\
         \n\
         Spending Patterns\n\
         - Transactions: {count}\n\
         - Total: {total}\n\
         - Average transaction: {average}\n\
         - Daily average: {daily_average}\n\
         \n\
         Categories\n\
         - {categories}\n\
         \n\
         Timeline\n\
         - Highest spending day: {highest}\n\
         - Lowest spending day: {lowest}\n",
        name = result.name,
        id = result.person_id,
        period = result.period,
        allocated = dollars(result.budget.allocated),
        spent = dollars(result.budget.spent),
        remaining = dollars(result.budget.remaining),
        utilization = percent(result.budget.utilization),
        status = result.budget.status,
        over = if result.budget.is_over_budget { "yes" } else { "no" },
        count = result.spending.transaction_count,
        total = dollars(result.spending.total),
        average = dollars(result.spending.average),
        daily_average = dollars(result.spending.daily_average),
        categories = categories_line,
        highest = day_entry(result.timeline.highest_spending_day.as_ref()),
        lowest = day_entry(result.timeline.lowest_spending_day.as_ref()),
    )
}
