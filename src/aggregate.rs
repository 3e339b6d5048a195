use std::collections::HashMap;

use crate::config::AnalyticsConfig;
use crate::models::{
    AbsenceRecord, AggregateRow, Gender, GenderPathologies, Series, NOT_INFORMED,
};

/// Groups records by `key`, summing `primary` and `secondary` per group.
///
/// Rows come back in first-seen order of their keys. An empty or missing
/// key lands in the [`NOT_INFORMED`] group.
pub fn group_by<'a, I, K, P, S>(records: I, key: K, primary: P, secondary: S) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a AbsenceRecord>,
    K: Fn(&AbsenceRecord) -> Option<String>,
    P: Fn(&AbsenceRecord) -> f64,
    S: Fn(&AbsenceRecord) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow> = Vec::new();

    for record in records {
        let label = key(record)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| NOT_INFORMED.to_string());
        let slot = match index.get(&label) {
            Some(&slot) => slot,
            None => {
                index.insert(label.clone(), rows.len());
                rows.push(AggregateRow {
                    label,
                    primary_measure: 0.0,
                    secondary_measure: 0.0,
                });
                rows.len() - 1
            }
        };
        rows[slot].primary_measure += primary(record);
        rows[slot].secondary_measure += secondary(record);
    }

    rows
}

/// Stable sort by descending primary measure, then truncate to `limit`.
pub fn rank(mut rows: Vec<AggregateRow>, limit: Option<usize>) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| {
        b.primary_measure
            .partial_cmp(&a.primary_measure)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

fn days(record: &AbsenceRecord) -> f64 {
    record.days_off as f64
}

fn one(_: &AbsenceRecord) -> f64 {
    1.0
}

fn none(_: &AbsenceRecord) -> f64 {
    0.0
}

pub fn by_unit(absences: &[AbsenceRecord], limit: usize) -> Vec<AggregateRow> {
    let rows = group_by(absences, |a| Some(a.unit.clone()), days, one);
    rank(rows, Some(limit))
}

pub fn by_department(absences: &[AbsenceRecord], limit: usize) -> Vec<AggregateRow> {
    let rows = group_by(absences, |a| Some(a.department.clone()), days, one);
    rank(rows, Some(limit))
}

pub fn by_pathology(absences: &[AbsenceRecord], limit: usize) -> Vec<AggregateRow> {
    let rows = group_by(absences, |a| Some(a.pathology_group.clone()), one, days);
    rank(rows, Some(limit))
}

/// Chronological `YYYY-MM` buckets. Undated records are left out.
pub fn by_month(absences: &[AbsenceRecord]) -> Vec<AggregateRow> {
    let dated = absences.iter().filter(|a| a.start_date.is_some());
    let mut rows = group_by(dated, AbsenceRecord::month_key, days, one);
    rows.sort_by(|a, b| a.label.cmp(&b.label));
    rows
}

pub fn by_gender(absences: &[AbsenceRecord]) -> Vec<AggregateRow> {
    let rows = group_by(absences, |a| Some(a.gender.label().to_string()), one, none);
    rank(rows, None)
}

/// Top sectors by days off, with the primary measure converted to money.
pub fn cost_by_sector(absences: &[AbsenceRecord], config: &AnalyticsConfig) -> Vec<AggregateRow> {
    let rows = group_by(absences, |a| Some(a.department.clone()), days, none);
    let hourly_rate = config.hourly_rate();
    let hours_per_day = config.hours_per_day as f64;

    rank(rows, Some(config.top_n_small))
        .into_iter()
        .map(|row| AggregateRow {
            primary_measure: row.primary_measure * hours_per_day * hourly_rate,
            ..row
        })
        .collect()
}

/// Most frequent pathology groups per known gender, skipping blank groups.
pub fn pathologies_by_gender(absences: &[AbsenceRecord], limit: usize) -> Vec<GenderPathologies> {
    [Gender::Male, Gender::Female]
        .into_iter()
        .filter_map(|gender| {
            let matching = absences
                .iter()
                .filter(|a| a.gender == gender && !a.pathology_group.is_empty());
            let rows = group_by(matching, |a| Some(a.pathology_group.clone()), one, days);
            if rows.is_empty() {
                return None;
            }
            Some(GenderPathologies {
                gender: gender.label().to_string(),
                pathologies: rank(rows, Some(limit)),
            })
        })
        .collect()
}

pub fn build_series(absences: &[AbsenceRecord], config: &AnalyticsConfig) -> Series {
    Series {
        by_unit: by_unit(absences, config.top_n_large),
        by_department: by_department(absences, config.top_n_large),
        by_pathology: by_pathology(absences, config.top_n_large),
        by_month: by_month(absences),
        by_gender: by_gender(absences),
        cost_by_sector: cost_by_sector(absences, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn absence(department: &str, days_off: u64) -> AbsenceRecord {
        AbsenceRecord {
            employee_id: "1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            days_off,
            unit: String::new(),
            department: department.to_string(),
            pathology_group: String::new(),
            gender: Gender::Unknown,
        }
    }

    fn dated(start: Option<&str>, days_off: u64) -> AbsenceRecord {
        AbsenceRecord {
            start_date: start.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()),
            ..absence("A", days_off)
        }
    }

    fn labels(rows: &[AggregateRow]) -> Vec<&str> {
        rows.iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn blank_department_groups_under_sentinel() {
        let rows = by_department(&[absence("", 2), absence("Ops", 1), absence("", 3)], 10);
        assert_eq!(labels(&rows), vec![NOT_INFORMED, "Ops"]);
        assert_eq!(rows[0].primary_measure, 5.0);
        assert_eq!(rows[0].secondary_measure, 2.0);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let rows = by_department(
            &[
                absence("B", 4),
                absence("A", 4),
                absence("C", 9),
                absence("D", 4),
            ],
            10,
        );
        assert_eq!(labels(&rows), vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn unit_series_keeps_top_ten() {
        let absences: Vec<_> = (0..15)
            .map(|i| AbsenceRecord {
                unit: format!("U{i:02}"),
                ..absence("A", i)
            })
            .collect();
        let rows = by_unit(&absences, 10);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].label, "U14");
        assert_eq!(rows[9].label, "U05");
    }

    #[test]
    fn pathology_ranks_by_event_count() {
        let absences = vec![
            AbsenceRecord {
                pathology_group: "Osteomuscular".to_string(),
                ..absence("A", 30)
            },
            AbsenceRecord {
                pathology_group: "Respiratorio".to_string(),
                ..absence("A", 1)
            },
            AbsenceRecord {
                pathology_group: "Respiratorio".to_string(),
                ..absence("A", 2)
            },
        ];
        let rows = by_pathology(&absences, 10);
        assert_eq!(labels(&rows), vec!["Respiratorio", "Osteomuscular"]);
        assert_eq!(rows[0].primary_measure, 2.0);
        assert_eq!(rows[0].secondary_measure, 3.0);
        assert_eq!(rows[1].secondary_measure, 30.0);
    }

    #[test]
    fn months_are_chronological_not_by_size() {
        let rows = by_month(&[
            dated(Some("2024-03-05"), 20),
            dated(Some("2024-01-20"), 1),
            dated(None, 50),
            dated(Some("2024-03-28"), 2),
        ]);
        assert_eq!(labels(&rows), vec!["2024-01", "2024-03"]);
        assert_eq!(rows[1].primary_measure, 22.0);
        assert_eq!(rows[1].secondary_measure, 2.0);
    }

    #[test]
    fn unknown_gender_codes_merge() {
        let absences: Vec<_> = [Some(1), Some(2), Some(3), None]
            .into_iter()
            .map(|code| AbsenceRecord {
                gender: Gender::from_code(code),
                ..absence("A", 1)
            })
            .collect();
        let rows = by_gender(&absences);
        assert_eq!(rows.len(), 3);
        let unknown = rows.iter().find(|r| r.label == NOT_INFORMED).unwrap();
        assert_eq!(unknown.primary_measure, 2.0);
        assert_eq!(labels(&rows)[0], NOT_INFORMED);
    }

    #[test]
    fn cost_by_sector_takes_top_five_by_days() {
        let config = AnalyticsConfig::default();
        let absences: Vec<_> = (1..=7).map(|i| absence(&format!("S{i}"), i)).collect();
        let rows = cost_by_sector(&absences, &config);
        assert_eq!(labels(&rows), vec!["S7", "S6", "S5", "S4", "S3"]);
        let expected = 7.0 * 8.0 * config.hourly_rate();
        assert!((rows[0].primary_measure - expected).abs() < 1e-9);
    }

    #[test]
    fn gender_pathologies_skip_blank_groups_and_unknown_gender() {
        let absences = vec![
            AbsenceRecord {
                gender: Gender::Female,
                pathology_group: "Mental".to_string(),
                ..absence("A", 1)
            },
            AbsenceRecord {
                gender: Gender::Female,
                ..absence("A", 1)
            },
            AbsenceRecord {
                gender: Gender::Male,
                ..absence("A", 1)
            },
            AbsenceRecord {
                gender: Gender::Unknown,
                pathology_group: "Mental".to_string(),
                ..absence("A", 1)
            },
        ];
        let breakdown = pathologies_by_gender(&absences, 5);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].gender, "Feminino");
        assert_eq!(labels(&breakdown[0].pathologies), vec!["Mental"]);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let series = build_series(&[], &AnalyticsConfig::default());
        assert_eq!(series, Series::default());
    }
}
