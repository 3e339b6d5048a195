use chrono::NaiveDate;
use tracing::{debug, info};

use crate::aggregate;
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::filter;
use crate::metrics;
use crate::models::{DashboardResult, FilterSpec};
use crate::store::RecordStore;

/// Filter, then metrics and series over the same filtered set.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AnalyticsConfig,
}

impl Pipeline {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Runs against today's date for the default window.
    pub fn run(&self, store: &RecordStore, spec: &FilterSpec) -> Result<DashboardResult> {
        self.run_at(store, spec, filter::today())
    }

    pub fn run_at(
        &self,
        store: &RecordStore,
        spec: &FilterSpec,
        today: NaiveDate,
    ) -> Result<DashboardResult> {
        if store.is_insufficient() {
            return Err(AnalyticsError::InsufficientData {
                employees: store.employees().len(),
                absences: store.absences().len(),
            });
        }

        let window = filter::resolve_window(spec, today);
        let filtered = filter::filter(store, spec, window);
        debug!(
            start = %window.start,
            end = %window.end,
            employees = filtered.employees.len(),
            absences = filtered.absences.len(),
            total_absences = store.absences().len(),
            "applied filters"
        );

        let metrics = metrics::compute(&filtered, filtered.employees.len(), &self.config);
        debug!(
            days_off = metrics.total_days_off,
            rate = metrics.absenteeism_rate,
            cost = metrics.cost,
            "computed metrics"
        );

        let series = aggregate::build_series(&filtered.absences, &self.config);
        let gender_pathologies =
            aggregate::pathologies_by_gender(&filtered.absences, self.config.top_n_small);

        info!(
            units = series.by_unit.len(),
            departments = series.by_department.len(),
            months = series.by_month.len(),
            "dashboard pipeline finished"
        );

        Ok(DashboardResult {
            window,
            metrics,
            series,
            gender_pathologies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbsenceRecord, EmployeeRecord, Gender, SeriesName, NOT_INFORMED};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employees(count: usize) -> Vec<EmployeeRecord> {
        (0..count)
            .map(|i| EmployeeRecord {
                registration_id: i.to_string(),
                situation: if i % 2 == 0 { "Ativo" } else { "Afastado" }.to_string(),
                unit: "Matriz".to_string(),
                department: "A".to_string(),
            })
            .collect()
    }

    fn absence(employee_id: &str, start: NaiveDate, days_off: u64, department: &str) -> AbsenceRecord {
        AbsenceRecord {
            employee_id: employee_id.to_string(),
            start_date: Some(start),
            days_off,
            unit: "Matriz".to_string(),
            department: department.to_string(),
            pathology_group: "Respiratorio".to_string(),
            gender: Gender::Female,
        }
    }

    fn worked_example() -> RecordStore {
        RecordStore::new(
            employees(100),
            vec![
                absence("1", date(2024, 1, 10), 5, "A"),
                absence("2", date(2024, 2, 15), 3, "A"),
            ],
        )
    }

    fn full_window() -> FilterSpec {
        FilterSpec {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 12, 31)),
            ..FilterSpec::default()
        }
    }

    #[test]
    fn worked_example_metrics() {
        let result = Pipeline::default()
            .run_at(&worked_example(), &full_window(), date(2024, 6, 1))
            .unwrap();
        assert_eq!(result.metrics.total_employees, 100);
        assert_eq!(result.metrics.total_days_off, 8);
        assert_eq!(result.metrics.unique_months, 2);
        assert!((result.metrics.absenteeism_rate - 0.181818).abs() < 1e-6);
        assert_eq!(result.series.by_department.len(), 1);
        assert_eq!(result.series.by_department[0].primary_measure, 8.0);
    }

    #[test]
    fn maximal_day_counts_from_input_do_not_panic() {
        let body = r#"[
            {"employeeId": "1", "startDate": "2024-03-01", "daysOff": "18446744073709551615"},
            {"employeeId": "2", "startDate": "2024-03-02", "daysOff": 2}
        ]"#;
        let absences =
            crate::loader::parse_absences(std::path::Path::new("absences.json"), body.as_bytes())
                .unwrap();
        let store = RecordStore::new(employees(4), absences);

        let result = Pipeline::default()
            .run_at(&store, &full_window(), date(2024, 6, 1))
            .unwrap();
        assert_eq!(result.metrics.total_absence_events, 2);
        assert_eq!(result.metrics.total_days_off, u64::MAX);
        assert!(result.metrics.cost.is_finite());
    }

    #[test]
    fn empty_snapshot_is_insufficient_data() {
        let store = RecordStore::new(employees(3), Vec::new());
        let err = Pipeline::default()
            .run_at(&store, &FilterSpec::default(), date(2024, 6, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InsufficientData {
                employees: 3,
                absences: 0
            }
        ));
    }

    #[test]
    fn empty_filter_result_is_not_an_error() {
        let spec = FilterSpec {
            start_date: Some(date(2030, 1, 1)),
            end_date: Some(date(2030, 1, 31)),
            ..FilterSpec::default()
        };
        let result = Pipeline::default()
            .run_at(&worked_example(), &spec, date(2024, 6, 1))
            .unwrap();
        assert_eq!(result.metrics.total_absence_events, 0);
        assert_eq!(result.metrics.unique_months, 1);
        assert!(SeriesName::ALL
            .iter()
            .all(|name| result.series.get(*name).is_empty()));
    }

    #[test]
    fn default_window_ends_today() {
        let today = date(2024, 2, 20);
        let result = Pipeline::default()
            .run_at(&worked_example(), &FilterSpec::default(), today)
            .unwrap();
        assert_eq!(result.window.start, date(2023, 11, 20));
        assert_eq!(result.window.end, today);
        assert_eq!(result.metrics.total_days_off, 8);
    }

    #[test]
    fn situation_filter_shrinks_employee_total() {
        let spec = FilterSpec {
            situation: Some("Afastado".to_string()),
            ..full_window()
        };
        let result = Pipeline::default()
            .run_at(&worked_example(), &spec, date(2024, 6, 1))
            .unwrap();
        assert_eq!(result.metrics.total_employees, 50);
        assert_eq!(result.metrics.total_days_off, 5);
    }

    #[test]
    fn blank_department_reaches_series_as_sentinel() {
        let mut absences = worked_example().absences().to_vec();
        absences.push(absence("3", date(2024, 3, 1), 9, ""));
        let store = RecordStore::new(employees(10), absences);
        let result = Pipeline::default()
            .run_at(&store, &full_window(), date(2024, 6, 1))
            .unwrap();
        assert_eq!(result.series.by_department[0].label, NOT_INFORMED);
        assert_eq!(result.series.cost_by_sector[0].label, NOT_INFORMED);
    }

    fn arb_absence() -> impl Strategy<Value = AbsenceRecord> {
        (
            0u32..730,
            prop::option::weighted(0.9, 0u64..40),
            0usize..14,
            0usize..4,
            prop::option::of(0i64..4),
            0usize..30,
        )
            .prop_map(|(offset, days_off, unit, dept, gender, employee)| AbsenceRecord {
                employee_id: employee.to_string(),
                start_date: Some(date(2023, 1, 1) + chrono::Duration::days(offset as i64)),
                days_off: days_off.unwrap_or(0),
                unit: format!("U{unit}"),
                department: if dept == 0 { String::new() } else { format!("D{dept}") },
                pathology_group: format!("P{}", unit % 5),
                gender: Gender::from_code(gender),
            })
    }

    proptest! {
        #[test]
        fn hours_are_eight_per_day(absences in prop::collection::vec(arb_absence(), 1..60)) {
            let store = RecordStore::new(employees(30), absences);
            let result = Pipeline::default()
                .run_at(&store, &full_window(), date(2024, 6, 1))
                .unwrap();
            prop_assert_eq!(result.metrics.total_hours_off, result.metrics.total_days_off * 8);
            prop_assert!(result.series.by_unit.len() <= 10);
            prop_assert!(result.series.cost_by_sector.len() <= 5);
        }

        #[test]
        fn inverted_window_filters_everything(
            absences in prop::collection::vec(arb_absence(), 1..40),
            gap in 1i64..400,
        ) {
            let end = date(2023, 6, 1);
            let spec = FilterSpec {
                start_date: Some(end + chrono::Duration::days(gap)),
                end_date: Some(end),
                ..FilterSpec::default()
            };
            let store = RecordStore::new(employees(5), absences);
            let result = Pipeline::default().run_at(&store, &spec, date(2024, 6, 1)).unwrap();
            prop_assert_eq!(result.metrics.total_absence_events, 0);
        }

        #[test]
        fn no_employees_after_filter_never_yields_nan(
            absences in prop::collection::vec(arb_absence(), 1..40),
        ) {
            let spec = FilterSpec {
                situation: Some("Inexistente".to_string()),
                ..full_window()
            };
            let store = RecordStore::new(employees(5), absences);
            let result = Pipeline::default().run_at(&store, &spec, date(2024, 6, 1)).unwrap();
            prop_assert_eq!(result.metrics.absenteeism_rate, 0.0);
            prop_assert_eq!(result.metrics.cost_percentage_of_payroll, 0.0);
        }

        #[test]
        fn identical_runs_are_identical(absences in prop::collection::vec(arb_absence(), 1..60)) {
            let store = RecordStore::new(employees(30), absences);
            let pipeline = Pipeline::default();
            let first = pipeline.run_at(&store, &full_window(), date(2024, 6, 1)).unwrap();
            let second = pipeline.run_at(&store, &full_window(), date(2024, 6, 1)).unwrap();
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}
