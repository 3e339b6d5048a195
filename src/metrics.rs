use std::collections::HashSet;

use crate::config::{AnalyticsConfig, SAVINGS_RATES};
use crate::models::{FilteredSet, Metrics};

/// Derives the headline KPIs. Degenerate inputs resolve to zeros.
pub fn compute(filtered: &FilteredSet, employee_total: usize, config: &AnalyticsConfig) -> Metrics {
    // Loaded day counts are unbounded; totals saturate.
    let total_days_off = filtered
        .absences
        .iter()
        .fold(0u64, |total, a| total.saturating_add(a.days_off));
    let total_hours_off = total_days_off.saturating_mul(u64::from(config.hours_per_day));
    let hourly_rate = config.hourly_rate();
    let cost = total_hours_off as f64 * hourly_rate;

    let months: HashSet<String> = filtered
        .absences
        .iter()
        .filter_map(|a| a.month_key())
        .collect();
    let unique_months = months.len().max(1);

    let (absenteeism_rate, cost_percentage_of_payroll) = if employee_total == 0 {
        (0.0, 0.0)
    } else {
        let employees = employee_total as f64;
        let potential_days =
            config.working_days_per_month as f64 * unique_months as f64 * employees;
        (
            total_days_off as f64 / potential_days * 100.0,
            cost / (config.minimum_wage * employees) * 100.0,
        )
    };

    let [low, mid, high] = SAVINGS_RATES;

    Metrics {
        total_employees: employee_total,
        total_absence_events: filtered.absences.len(),
        total_days_off,
        total_hours_off,
        hourly_rate,
        unique_months,
        absenteeism_rate,
        cost,
        cost_percentage_of_payroll,
        savings10: cost * low,
        savings20: cost * mid,
        savings30: cost * high,
    }
}
