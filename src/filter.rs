use std::collections::HashSet;

use chrono::{Months, NaiveDate, Utc};

use crate::models::{DateWindow, FilterSpec, FilteredSet};
use crate::store::RecordStore;

/// Length of the window used when no start date is picked.
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Applies the default window: three calendar months ago through `today`.
pub fn resolve_window(spec: &FilterSpec, today: NaiveDate) -> DateWindow {
    let start = spec.start_date.unwrap_or_else(|| {
        today
            .checked_sub_months(Months::new(DEFAULT_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN)
    });
    let end = spec.end_date.unwrap_or(today);
    DateWindow { start, end }
}

/// Narrows the snapshot to the records selected by `spec`.
///
/// Absences need a start date inside `window` and an exact unit/department
/// match when those filters are set. A situation filter first narrows the
/// employees, then keeps only absences that belong to a surviving employee.
pub fn filter(store: &RecordStore, spec: &FilterSpec, window: DateWindow) -> FilteredSet {
    let employees: Vec<_> = match spec.situation() {
        Some(situation) => store
            .employees()
            .iter()
            .filter(|employee| employee.situation == situation)
            .cloned()
            .collect(),
        None => store.employees().to_vec(),
    };

    let absences = {
        let allowed_ids: Option<HashSet<&str>> = spec.situation().map(|_| {
            employees
                .iter()
                .map(|employee| employee.registration_id.as_str())
                .collect()
        });

        store
            .absences()
            .iter()
            .filter(|absence| match absence.start_date {
                Some(date) => window.contains(date),
                None => false,
            })
            .filter(|absence| spec.unit().map_or(true, |unit| absence.unit == unit))
            .filter(|absence| {
                spec.department()
                    .map_or(true, |department| absence.department == department)
            })
            .filter(|absence| {
                allowed_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(absence.employee_id.as_str()))
            })
            .cloned()
            .collect()
    };

    FilteredSet {
        employees,
        absences,
    }
}
