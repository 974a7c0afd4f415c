//! Fixtures shared by the unit tests.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::db::{seed_employees, seed_leave_requests};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::repository::InMemoryStore;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn leave(
    id: u64,
    employee_id: u64,
    leave_type: LeaveType,
    start: &str,
    end: &str,
    reason: &str,
) -> LeaveRequest {
    LeaveRequest {
        id,
        employee_id,
        leave_type,
        start_date: date(start),
        end_date: date(end),
        status: LeaveStatus::Pending,
        reason: reason.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + chrono::Duration::minutes(id as i64),
        version: 0,
        employee: None,
    }
}

/// Seed employees and the given requests, nothing else.
pub fn store_with(leaves: Vec<LeaveRequest>) -> InMemoryStore {
    let store = InMemoryStore::with_employees(seed_employees().expect("seed employees"));
    for l in leaves {
        store.put(l);
    }
    store
}

/// The same data a fresh deployment starts with.
pub fn seeded_store() -> InMemoryStore {
    store_with(seed_leave_requests().expect("seed leave requests"))
}
