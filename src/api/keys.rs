//! Cache keys for the API's read queries.

use crate::cache::{hash_key, QueryKey};

/// Query key types for the workforce API.
///
/// One variant per cacheable read; every parameter is embedded in the hash
/// input so distinct parameter combinations never collide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiQueryKey {
  /// All companies
  CompanyList,
  /// All users
  UserList,
  /// All employees
  EmployeeList,
  /// All time entries
  TimeEntryList,
  /// Per-employee hour summary for a month/year
  Summary {
    month: Option<u32>,
    year: Option<i32>,
  },
  /// Months with recorded time for an employee
  EmployeeMonths { employee_id: String },
  /// Day-by-day breakdown for an employee in a period
  EmployeeDays {
    employee_id: String,
    period: String,
  },
}

impl QueryKey for ApiQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::CompanyList => "companies:all".to_string(),
      Self::UserList => "users:all".to_string(),
      Self::EmployeeList => "employees:all".to_string(),
      Self::TimeEntryList => "time_entries:all".to_string(),
      Self::Summary { month, year } => format!(
        "employee_summary:{}:{}",
        month.map(|m| m.to_string()).unwrap_or_default(),
        year.map(|y| y.to_string()).unwrap_or_default()
      ),
      Self::EmployeeMonths { employee_id } => format!("employee_months:{}", employee_id),
      Self::EmployeeDays {
        employee_id,
        period,
      } => format!("employee_days:{}:{}", employee_id, period),
    };

    hash_key(&input)
  }

  fn description(&self) -> String {
    match self {
      Self::CompanyList => "all companies".to_string(),
      Self::UserList => "all users".to_string(),
      Self::EmployeeList => "all employees".to_string(),
      Self::TimeEntryList => "all time entries".to_string(),
      Self::Summary { month, year } => format!("summary month={:?} year={:?}", month, year),
      Self::EmployeeMonths { employee_id } => format!("months for employee {}", employee_id),
      Self::EmployeeDays {
        employee_id,
        period,
      } => format!("days for employee {} in {}", employee_id, period),
    }
  }
}
