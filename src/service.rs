use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::filter::LeaveQuery;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveRequestUpdate, NewLeaveRequest};
use crate::repository::{EmployeeRepository, LeaveRepository, UpdateOutcome};
use crate::rules::{self, LeaveFacts, LeavePolicy, RuleViolation, ViolationReport};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "data": [{
        "id": 1,
        "employeeId": 1,
        "leaveType": "Annual",
        "startDate": "2024-06-01",
        "endDate": "2024-06-10",
        "status": "Approved",
        "reason": "Vacances",
        "createdAt": "2024-05-20T08:30:00Z",
        "version": 0
    }],
    "page": 1,
    "pageSize": 10,
    "total": 1
}))]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub page_size: u64,
    /// qualifying records before pagination
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordViolations {
    #[schema(example = 4)]
    pub leave_request_id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    pub violations: Vec<ViolationReport>,
}

/// Leave request operations on top of the repositories.
#[derive(Clone)]
pub struct LeaveService {
    leaves: Arc<dyn LeaveRepository>,
    employees: Arc<dyn EmployeeRepository>,
    policy: LeavePolicy,
    enforce_on_write: bool,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveRepository>,
        employees: Arc<dyn EmployeeRepository>,
        policy: LeavePolicy,
        enforce_on_write: bool,
    ) -> Self {
        Self {
            leaves,
            employees,
            policy,
            enforce_on_write,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<LeaveRequest>, ApiError> {
        Ok(self.leaves.find_all().await?)
    }

    pub async fn get(&self, id: u64) -> Result<LeaveRequest, ApiError> {
        self.leaves
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Leave request not found"))
    }

    /// Filters and sorts, checks every match against the rules, then pages.
    /// The first broken rule fails the whole listing.
    #[instrument(skip(self))]
    pub async fn filter(&self, query: &LeaveQuery, today: NaiveDate) -> Result<LeavePage, ApiError> {
        let matched = self.leaves.query(&query.criteria, &query.sort).await?;

        let mut by_employee: HashMap<u64, Vec<LeaveRequest>> = HashMap::new();
        for record in &matched {
            if !by_employee.contains_key(&record.employee_id) {
                let rows = self.leaves.find_by_employee(record.employee_id).await?;
                by_employee.insert(record.employee_id, rows);
            }
            let siblings = &by_employee[&record.employee_id];

            rules::first_violation(&LeaveFacts::from(record), siblings, &self.policy, today)
                .map_err(|v| {
                    warn!(
                        leave_id = record.id,
                        employee_id = record.employee_id,
                        rule = v.code(),
                        "Filtered listing rejected"
                    );
                    ApiError::Rule(v)
                })?;
        }

        let total = matched.len() as u64;
        Ok(LeavePage {
            data: query.pagination.apply(matched),
            page: query.pagination.page,
            page_size: query.pagination.page_size,
            total,
        })
    }

    /// Every stored request with the rules it breaks; clean records are left out.
    pub async fn violations(&self, today: NaiveDate) -> Result<Vec<RecordViolations>, ApiError> {
        let all = self.leaves.find_all().await?;

        Ok(all
            .iter()
            .filter_map(|record| {
                let found =
                    rules::all_violations(&LeaveFacts::from(record), &all, &self.policy, today);
                (!found.is_empty()).then(|| RecordViolations {
                    leave_request_id: record.id,
                    employee_id: record.employee_id,
                    violations: found.iter().map(ViolationReport::from).collect(),
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn create(&self, new: NewLeaveRequest, today: NaiveDate) -> Result<LeaveRequest, ApiError> {
        let facts = LeaveFacts {
            id: None,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            reason: &new.reason,
        };
        self.check_write(&facts, today).await?;

        let created = self.leaves.insert(&new).await?;
        info!(leave_id = created.id, employee_id = created.employee_id, "Leave request created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: u64,
        update: LeaveRequestUpdate,
        today: NaiveDate,
    ) -> Result<LeaveRequest, ApiError> {
        if id != update.id {
            return Err(ApiError::bad_request("Route id does not match body id"));
        }

        let facts = LeaveFacts {
            id: Some(update.id),
            employee_id: update.employee_id,
            leave_type: update.leave_type,
            start_date: update.start_date,
            end_date: update.end_date,
            reason: &update.reason,
        };
        self.check_write(&facts, today).await?;

        match self.leaves.update(&update).await? {
            UpdateOutcome::Updated(leave) => {
                info!(leave_id = id, version = leave.version, "Leave request updated");
                Ok(leave)
            }
            UpdateOutcome::NotFound => Err(ApiError::not_found("Leave request not found")),
            UpdateOutcome::Conflict { current_version } => {
                warn!(leave_id = id, current_version, "Concurrent update rejected");
                Err(ApiError::Conflict(format!(
                    "Leave request {} was modified by another request (current version {})",
                    id, current_version
                )))
            }
        }
    }

    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        if !self.leaves.delete(id).await? {
            return Err(ApiError::not_found("Leave request not found"));
        }
        info!(leave_id = id, "Leave request deleted");
        Ok(())
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        Ok(self.employees.list_employees().await?)
    }

    pub async fn get_employee(&self, id: u64) -> Result<Employee, ApiError> {
        self.employees
            .find_employee(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee not found"))
    }

    /// Shape and employee checks always run; the business rules only when
    /// write-time enforcement is switched on.
    async fn check_write(&self, facts: &LeaveFacts<'_>, today: NaiveDate) -> Result<(), ApiError> {
        rules::check_shape(facts).map_err(|v| ApiError::bad_request(v.to_string()))?;

        if self.employees.find_employee(facts.employee_id).await?.is_none() {
            return Err(ApiError::bad_request(format!(
                "Employee {} does not exist",
                facts.employee_id
            )));
        }

        if self.enforce_on_write {
            let siblings = self.leaves.find_by_employee(facts.employee_id).await?;
            let found: Vec<RuleViolation> =
                rules::all_violations(facts, &siblings, &self.policy, today);
            if !found.is_empty() {
                return Err(ApiError::Violations(found));
            }
        }

        Ok(())
    }
}
