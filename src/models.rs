use chrono::NaiveDate;
use serde::Serialize;

/// Label used when a grouping field is empty or missing.
pub const NOT_INFORMED: &str = "Não informado";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub registration_id: String,
    pub situation: String,
    pub unit: String,
    pub department: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Gender::Male,
            Some(2) => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Masculino",
            Gender::Female => "Feminino",
            Gender::Unknown => NOT_INFORMED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceRecord {
    pub employee_id: String,
    pub start_date: Option<NaiveDate>,
    pub days_off: u64,
    pub unit: String,
    pub department: String,
    pub pathology_group: String,
    pub gender: Gender,
}

impl AbsenceRecord {
    /// `YYYY-MM` bucket of the start date.
    pub fn month_key(&self) -> Option<String> {
        self.start_date.map(|date| date.format("%Y-%m").to_string())
    }
}

/// User-selected filters. Empty strings behave like absent filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub unit: Option<String>,
    pub department: Option<String>,
    pub situation: Option<String>,
}

impl FilterSpec {
    pub fn unit(&self) -> Option<&str> {
        non_empty(self.unit.as_deref())
    }

    pub fn department(&self) -> Option<&str> {
        non_empty(self.department.as_deref())
    }

    pub fn situation(&self) -> Option<&str> {
        non_empty(self.situation.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Inclusive date window after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredSet {
    pub employees: Vec<EmployeeRecord>,
    pub absences: Vec<AbsenceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_employees: usize,
    pub total_absence_events: usize,
    pub total_days_off: u64,
    pub total_hours_off: u64,
    pub hourly_rate: f64,
    pub unique_months: usize,
    pub absenteeism_rate: f64,
    pub cost: f64,
    pub cost_percentage_of_payroll: f64,
    pub savings10: f64,
    pub savings20: f64,
    pub savings30: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub label: String,
    pub primary_measure: f64,
    pub secondary_measure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesName {
    ByUnit,
    ByDepartment,
    ByPathology,
    ByMonth,
    ByGender,
    CostBySector,
}

impl SeriesName {
    pub const ALL: [SeriesName; 6] = [
        SeriesName::ByUnit,
        SeriesName::ByDepartment,
        SeriesName::ByPathology,
        SeriesName::ByMonth,
        SeriesName::ByGender,
        SeriesName::CostBySector,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SeriesName::ByUnit => "Units",
            SeriesName::ByDepartment => "Departments",
            SeriesName::ByPathology => "Pathology Groups",
            SeriesName::ByMonth => "Monthly Evolution",
            SeriesName::ByGender => "Gender",
            SeriesName::CostBySector => "Cost by Sector",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub by_unit: Vec<AggregateRow>,
    pub by_department: Vec<AggregateRow>,
    pub by_pathology: Vec<AggregateRow>,
    pub by_month: Vec<AggregateRow>,
    pub by_gender: Vec<AggregateRow>,
    pub cost_by_sector: Vec<AggregateRow>,
}

impl Series {
    pub fn get(&self, name: SeriesName) -> &[AggregateRow] {
        match name {
            SeriesName::ByUnit => &self.by_unit,
            SeriesName::ByDepartment => &self.by_department,
            SeriesName::ByPathology => &self.by_pathology,
            SeriesName::ByMonth => &self.by_month,
            SeriesName::ByGender => &self.by_gender,
            SeriesName::CostBySector => &self.cost_by_sector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderPathologies {
    pub gender: String,
    pub pathologies: Vec<AggregateRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationCount {
    pub situation: String,
    pub employees: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub units: Vec<String>,
    pub departments: Vec<String>,
    pub situations: Vec<SituationCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    pub window: DateWindow,
    pub metrics: Metrics,
    pub series: Series,
    pub gender_pathologies: Vec<GenderPathologies>,
}
