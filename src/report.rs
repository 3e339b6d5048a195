use std::fmt::Write;

use crate::models::{AggregateRow, DashboardResult, FilterSpec, SeriesName};

/// `YYYY-MM` to `MM/YYYY`. Anything else is returned unchanged.
pub fn format_month(key: &str) -> String {
    match key.split_once('-') {
        Some((year, month)) if !year.is_empty() && !month.is_empty() => {
            format!("{month}/{year}")
        }
        _ => key.to_string(),
    }
}

/// Brazilian real, e.g. `R$ 1.234,56` or `-R$ 12,50`.
pub fn format_currency(value: f64) -> String {
    let (sign, digits) = format_decimal(value);
    format!("{sign}R$ {digits}")
}

pub fn format_percent(value: f64) -> String {
    let (sign, digits) = format_decimal(value);
    format!("{sign}{digits}%")
}

/// Splits `value` into its sign and `1.234,56` digits, rounded to cents.
fn format_decimal(value: f64) -> (&'static str, String) {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    (sign, format!("{grouped},{:02}", cents % 100))
}

fn row_line(name: SeriesName, row: &AggregateRow) -> String {
    match name {
        SeriesName::ByUnit | SeriesName::ByDepartment => format!(
            "- {}: {} days across {} certificates",
            row.label, row.primary_measure, row.secondary_measure
        ),
        SeriesName::ByPathology => format!(
            "- {}: {} certificates, {} days",
            row.label, row.primary_measure, row.secondary_measure
        ),
        SeriesName::ByMonth => format!(
            "- {}: {} days across {} certificates",
            format_month(&row.label),
            row.primary_measure,
            row.secondary_measure
        ),
        SeriesName::ByGender => format!("- {}: {} certificates", row.label, row.primary_measure),
        SeriesName::CostBySector => {
            format!("- {}: {}", row.label, format_currency(row.primary_measure))
        }
    }
}

fn scope_label(spec: &FilterSpec) -> String {
    let scopes: Vec<String> = [
        ("unit", spec.unit()),
        ("department", spec.department()),
        ("situation", spec.situation()),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| format!("{name} {v}")))
    .collect();

    if scopes.is_empty() {
        "all employees".to_string()
    } else {
        scopes.join(", ")
    }
}

pub fn build_report(spec: &FilterSpec, result: &DashboardResult) -> String {
    let metrics = &result.metrics;
    let mut output = String::new();

    let _ = writeln!(output, "# Absenteeism Report");
    let _ = writeln!(
        output,
        "Generated for {} (absences from {} to {})",
        scope_label(spec),
        result.window.start,
        result.window.end
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Indicators");
    let _ = writeln!(
        output,
        "- Absenteeism rate: {}",
        format_percent(metrics.absenteeism_rate)
    );
    let _ = writeln!(
        output,
        "- Employees / certificates: {} / {}",
        metrics.total_employees, metrics.total_absence_events
    );
    let _ = writeln!(
        output,
        "- Days off: {} ({} hours)",
        metrics.total_days_off, metrics.total_hours_off
    );
    let _ = writeln!(output, "- Hourly rate: {}", format_currency(metrics.hourly_rate));
    let _ = writeln!(
        output,
        "- Cost: {} ({} of payroll)",
        format_currency(metrics.cost),
        format_percent(metrics.cost_percentage_of_payroll)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Projected Savings");
    for (rate, savings) in [
        (10, metrics.savings10),
        (20, metrics.savings20),
        (30, metrics.savings30),
    ] {
        let _ = writeln!(output, "- {rate}% reduction: {}", format_currency(savings));
    }

    for name in SeriesName::ALL {
        let rows = result.series.get(name);
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", name.title());

        if rows.is_empty() {
            let _ = writeln!(output, "No absences recorded for this window.");
            continue;
        }
        for row in rows {
            let _ = writeln!(output, "{}", row_line(name, row));
        }
    }

    if !result.gender_pathologies.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Top Pathology Groups by Gender");
        for entry in &result.gender_pathologies {
            let _ = writeln!(output, "### {}", entry.gender);
            for row in &entry.pathologies {
                let _ = writeln!(
                    output,
                    "- {}: {} certificates",
                    row.label, row.primary_measure
                );
            }
        }
    }

    output
}
