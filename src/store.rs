use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AbsenceRecord, EmployeeRecord, FilterOptions, SituationCount};

/// Raw snapshot for one load cycle. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    employees: Vec<EmployeeRecord>,
    absences: Vec<AbsenceRecord>,
}

impl RecordStore {
    pub fn new(employees: Vec<EmployeeRecord>, absences: Vec<AbsenceRecord>) -> Self {
        Self {
            employees,
            absences,
        }
    }

    pub fn employees(&self) -> &[EmployeeRecord] {
        &self.employees
    }

    pub fn absences(&self) -> &[AbsenceRecord] {
        &self.absences
    }

    /// True when either record set is empty.
    pub fn is_insufficient(&self) -> bool {
        self.employees.is_empty() || self.absences.is_empty()
    }

    /// Distinct values a user can pick from in each filter dimension.
    pub fn filter_options(&self) -> FilterOptions {
        let mut units = BTreeSet::new();
        let mut departments = BTreeSet::new();
        for absence in &self.absences {
            if !absence.unit.is_empty() {
                units.insert(absence.unit.clone());
            }
            if !absence.department.is_empty() {
                departments.insert(absence.department.clone());
            }
        }

        let mut situations: BTreeMap<&str, usize> = BTreeMap::new();
        for employee in &self.employees {
            if !employee.situation.is_empty() {
                *situations.entry(employee.situation.as_str()).or_insert(0) += 1;
            }
        }

        FilterOptions {
            units: units.into_iter().collect(),
            departments: departments.into_iter().collect(),
            situations: situations
                .into_iter()
                .map(|(situation, employees)| SituationCount {
                    situation: situation.to_string(),
                    employees,
                })
                .collect(),
        }
    }
}
