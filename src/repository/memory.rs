use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::filter::{LeaveCriteria, Sort};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveRequestUpdate, NewLeaveRequest};
use crate::repository::{EmployeeRepository, LeaveRepository, RepoResult, UpdateOutcome};

#[derive(Default)]
struct State {
    employees: BTreeMap<u64, Employee>,
    leaves: BTreeMap<u64, LeaveRequest>,
    last_leave_id: u64,
}

/// Process-local store used when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            for e in employees {
                state.employees.insert(e.id, e);
            }
        }
        store
    }

    /// Stores a fully formed request, keeping its id and timestamps.
    pub fn put(&self, leave: LeaveRequest) {
        let mut state = self.state.write();
        state.last_leave_id = state.last_leave_id.max(leave.id);
        state.leaves.insert(leave.id, leave);
    }
}

#[async_trait]
impl LeaveRepository for InMemoryStore {
    async fn find_all(&self) -> RepoResult<Vec<LeaveRequest>> {
        Ok(self.state.read().leaves.values().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> RepoResult<Option<LeaveRequest>> {
        let state = self.state.read();
        Ok(state.leaves.get(&id).map(|leave| {
            let mut leave = leave.clone();
            leave.employee = state.employees.get(&leave.employee_id).cloned();
            leave
        }))
    }

    async fn find_by_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        Ok(self
            .state
            .read()
            .leaves
            .values()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn query(&self, criteria: &LeaveCriteria, sort: &Sort) -> RepoResult<Vec<LeaveRequest>> {
        let mut hits: Vec<LeaveRequest> = self
            .state
            .read()
            .leaves
            .values()
            .filter(|l| criteria.matches(l))
            .cloned()
            .collect();
        sort.apply(&mut hits);
        Ok(hits)
    }

    async fn insert(&self, new: &NewLeaveRequest) -> RepoResult<LeaveRequest> {
        let mut state = self.state.write();
        state.last_leave_id += 1;

        let leave = LeaveRequest {
            id: state.last_leave_id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            reason: new.reason.clone(),
            created_at: Utc::now(),
            version: 0,
            employee: None,
        };
        state.leaves.insert(leave.id, leave.clone());
        Ok(leave)
    }

    async fn update(&self, update: &LeaveRequestUpdate) -> RepoResult<UpdateOutcome> {
        let mut state = self.state.write();
        let Some(stored) = state.leaves.get_mut(&update.id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        if update.version.is_some_and(|v| v != stored.version) {
            return Ok(UpdateOutcome::Conflict {
                current_version: stored.version,
            });
        }

        stored.employee_id = update.employee_id;
        stored.leave_type = update.leave_type;
        stored.start_date = update.start_date;
        stored.end_date = update.end_date;
        stored.status = update.status;
        stored.reason = update.reason.clone();
        stored.version += 1;

        Ok(UpdateOutcome::Updated(stored.clone()))
    }

    async fn delete(&self, id: u64) -> RepoResult<bool> {
        Ok(self.state.write().leaves.remove(&id).is_some())
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryStore {
    async fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        Ok(self.state.read().employees.values().cloned().collect())
    }

    async fn find_employee(&self, id: u64) -> RepoResult<Option<Employee>> {
        Ok(self.state.read().employees.get(&id).cloned())
    }
}
