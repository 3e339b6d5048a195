//! Reads the employee and absence record sets from disk.
//!
//! JSON files hold an array of objects; CSV files have a header row. Field
//! names follow the dashboard API (`startDate`, `daysOff`, ...) and also accept
//! the upstream export names (`dt_inicio_atestado`, `dias_afastados`, ...).
//! Malformed values never fail a load: they fall back to empty text, a zero
//! day count, a missing date or an unknown gender.

use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::models::{AbsenceRecord, EmployeeRecord, Gender};
use crate::store::RecordStore;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEmployee {
    #[serde(rename = "registrationId", alias = "matricula_funcionario")]
    registration_id: Value,
    #[serde(alias = "situacao")]
    situation: Value,
    #[serde(alias = "nome_unidade")]
    unit: Value,
    #[serde(alias = "nome_setor")]
    department: Value,
}

impl From<RawEmployee> for EmployeeRecord {
    fn from(raw: RawEmployee) -> Self {
        EmployeeRecord {
            registration_id: text(&raw.registration_id),
            situation: text(&raw.situation),
            unit: text(&raw.unit),
            department: text(&raw.department),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAbsence {
    #[serde(rename = "employeeId", alias = "matricula_func")]
    employee_id: Value,
    #[serde(rename = "startDate", alias = "dt_inicio_atestado")]
    start_date: Value,
    #[serde(rename = "daysOff", alias = "dias_afastados")]
    days_off: Value,
    #[serde(alias = "unidade")]
    unit: Value,
    #[serde(alias = "setor")]
    department: Value,
    #[serde(rename = "pathologyGroup", alias = "grupo_patologico")]
    pathology_group: Value,
    #[serde(alias = "sexo")]
    gender: Value,
}

impl From<RawAbsence> for AbsenceRecord {
    fn from(raw: RawAbsence) -> Self {
        AbsenceRecord {
            employee_id: text(&raw.employee_id),
            start_date: parse_date(&raw.start_date),
            days_off: parse_days_off(&raw.days_off),
            unit: text(&raw.unit),
            department: text(&raw.department),
            pathology_group: text(&raw.pathology_group),
            gender: Gender::from_code(parse_code(&raw.gender)),
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Non-negative whole number of days; anything else counts as zero.
pub fn parse_days_off(value: &Value) -> u64 {
    let days = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_days)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_days))
        }
        _ => None,
    };
    days.unwrap_or(0)
}

fn whole_days(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}

/// Accepts `YYYY-MM-DD`, ISO datetimes, and `DD/MM/YYYY`.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
}

fn parse_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn parse_rows<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<Vec<T>> {
    let parse_error = |source| AnalyticsError::Parse {
        path: path.to_path_buf(),
        source,
    };

    if !is_csv(path) {
        return serde_json::from_slice(bytes).map_err(parse_error);
    }

    let csv_error = |source| AnalyticsError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(serde_json::from_value(Value::Object(object)).map_err(parse_error)?);
    }

    Ok(rows)
}

pub fn parse_employees(path: &Path, bytes: &[u8]) -> Result<Vec<EmployeeRecord>> {
    let rows: Vec<RawEmployee> = parse_rows(path, bytes)?;
    Ok(rows.into_iter().map(EmployeeRecord::from).collect())
}

pub fn parse_absences(path: &Path, bytes: &[u8]) -> Result<Vec<AbsenceRecord>> {
    let rows: Vec<RawAbsence> = parse_rows(path, bytes)?;
    Ok(rows.into_iter().map(AbsenceRecord::from).collect())
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub async fn read_employees(path: &Path) -> Result<Vec<EmployeeRecord>> {
    let bytes = read(path).await?;
    let employees = parse_employees(path, &bytes)?;
    debug!(path = %path.display(), count = employees.len(), "read employees");
    Ok(employees)
}

pub async fn read_absences(path: &Path) -> Result<Vec<AbsenceRecord>> {
    let bytes = read(path).await?;
    let absences = parse_absences(path, &bytes)?;
    debug!(path = %path.display(), count = absences.len(), "read absences");
    Ok(absences)
}

/// Reads both record sets concurrently into a fresh snapshot.
pub async fn load_snapshot(employees_path: &Path, absences_path: &Path) -> Result<RecordStore> {
    let (employees, absences) = tokio::try_join!(
        read_employees(employees_path),
        read_absences(absences_path)
    )?;
    info!(
        employees = employees.len(),
        absences = absences.len(),
        "loaded record snapshot"
    );
    Ok(RecordStore::new(employees, absences))
}
