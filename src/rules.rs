//! Business rules for leave requests.
//!
//! Every check works on a [`LeaveFacts`] view plus a slice of stored
//! requests, so the same functions serve the listing path, the write path
//! and the violations report. The slice may contain the record being checked;
//! it is skipped by id.

use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveType, MAX_REASON_LEN};

pub const DEFAULT_ANNUAL_CAP_DAYS: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    /// maximum Annual-type days per employee per calendar year
    pub annual_cap_days: i64,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            annual_cap_days: DEFAULT_ANNUAL_CAP_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RuleViolation {
    #[display(fmt = "There is an overlap in leave dates for this employee.")]
    Overlap { conflicting_id: u64 },

    #[display(
        fmt = "The employee cannot take more than {} annual leave days per year.",
        cap
    )]
    AnnualCapExceeded { taken: i64, requested: i64, cap: i64 },

    #[display(fmt = "A reason is required for sick leave.")]
    SickReasonMissing,

    #[display(fmt = "endDate cannot be before startDate")]
    InvalidDateRange,

    #[display(fmt = "reason cannot exceed {} characters", MAX_REASON_LEN)]
    ReasonTooLong,
}

impl std::error::Error for RuleViolation {}

impl RuleViolation {
    pub fn code(&self) -> &'static str {
        match self {
            RuleViolation::Overlap { .. } => "overlap",
            RuleViolation::AnnualCapExceeded { .. } => "annual_cap_exceeded",
            RuleViolation::SickReasonMissing => "sick_reason_missing",
            RuleViolation::InvalidDateRange => "invalid_date_range",
            RuleViolation::ReasonTooLong => "reason_too_long",
        }
    }
}

/// Wire form of a violation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViolationReport {
    #[schema(example = "overlap")]
    pub code: &'static str,
    #[schema(example = "There is an overlap in leave dates for this employee.")]
    pub message: String,
}

impl From<&RuleViolation> for ViolationReport {
    fn from(v: &RuleViolation) -> Self {
        Self {
            code: v.code(),
            message: v.to_string(),
        }
    }
}

/// The fields the rules look at. `id` is `None` for a request not yet stored.
#[derive(Debug, Clone, Copy)]
pub struct LeaveFacts<'a> {
    pub id: Option<u64>,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: &'a str,
}

impl<'a> From<&'a LeaveRequest> for LeaveFacts<'a> {
    fn from(r: &'a LeaveRequest) -> Self {
        Self {
            id: Some(r.id),
            employee_id: r.employee_id,
            leave_type: r.leave_type,
            start_date: r.start_date,
            end_date: r.end_date,
            reason: &r.reason,
        }
    }
}

impl LeaveFacts<'_> {
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Another request of the same employee.
    fn is_sibling(&self, other: &LeaveRequest) -> bool {
        other.employee_id == self.employee_id && Some(other.id) != self.id
    }
}

pub fn check_overlap(facts: &LeaveFacts<'_>, store: &[LeaveRequest]) -> Option<RuleViolation> {
    store
        .iter()
        .filter(|other| facts.is_sibling(other))
        .find(|other| other.start_date < facts.end_date && other.end_date > facts.start_date)
        .map(|other| RuleViolation::Overlap {
            conflicting_id: other.id,
        })
}

/// Sums the employee's other Annual requests starting in `year` and fails
/// when this request's own days push the total past the cap.
pub fn check_annual_cap(
    facts: &LeaveFacts<'_>,
    store: &[LeaveRequest],
    policy: &LeavePolicy,
    year: i32,
) -> Option<RuleViolation> {
    if facts.leave_type != LeaveType::Annual {
        return None;
    }

    let taken: i64 = store
        .iter()
        .filter(|other| facts.is_sibling(other))
        .filter(|other| other.leave_type == LeaveType::Annual && other.start_date.year() == year)
        .map(LeaveRequest::days)
        .sum();

    let requested = facts.days();
    if taken + requested > policy.annual_cap_days {
        Some(RuleViolation::AnnualCapExceeded {
            taken,
            requested,
            cap: policy.annual_cap_days,
        })
    } else {
        None
    }
}

pub fn check_sick_reason(facts: &LeaveFacts<'_>) -> Option<RuleViolation> {
    (facts.leave_type == LeaveType::Sick && facts.reason.trim().is_empty())
        .then_some(RuleViolation::SickReasonMissing)
}

/// Structural checks every write must pass.
pub fn check_shape(facts: &LeaveFacts<'_>) -> Result<(), RuleViolation> {
    if facts.end_date < facts.start_date {
        return Err(RuleViolation::InvalidDateRange);
    }
    if facts.reason.chars().count() > MAX_REASON_LEN {
        return Err(RuleViolation::ReasonTooLong);
    }
    Ok(())
}

/// Runs overlap, annual cap and sick reason in that order, stopping at the
/// first failure.
pub fn first_violation(
    facts: &LeaveFacts<'_>,
    store: &[LeaveRequest],
    policy: &LeavePolicy,
    today: NaiveDate,
) -> Result<(), RuleViolation> {
    let found = check_overlap(facts, store)
        .or_else(|| check_annual_cap(facts, store, policy, today.year()))
        .or_else(|| check_sick_reason(facts));

    match found {
        Some(v) => Err(v),
        None => Ok(()),
    }
}

pub fn all_violations(
    facts: &LeaveFacts<'_>,
    store: &[LeaveRequest],
    policy: &LeavePolicy,
    today: NaiveDate,
) -> Vec<RuleViolation> {
    [
        check_overlap(facts, store),
        check_annual_cap(facts, store, policy, today.year()),
        check_sick_reason(facts),
    ]
    .into_iter()
    .flatten()
    .collect()
}
