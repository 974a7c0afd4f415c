use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::employee::Employee;

/// Longest reason text the store accepts.
pub const MAX_REASON_LEN: usize = 500;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "employeeId": 1,
    "leaveType": "Annual",
    "startDate": "2024-06-01",
    "endDate": "2024-06-10",
    "status": "Approved",
    "reason": "Vacances",
    "createdAt": "2024-05-20T08:30:00Z",
    "version": 0
}))]
pub struct LeaveRequest {
    #[schema(example = 1)]
    /// leave request id
    pub id: u64,
    #[schema(example = 1)]
    /// employee who requested the leave
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2024-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    #[schema(example = "Vacances")]
    pub reason: String,
    #[schema(example = "2024-05-20T08:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    /// concurrency token, bumped on every update
    #[schema(example = 0)]
    pub version: u32,
    /// embedded only on single-record retrieval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}

impl LeaveRequest {
    /// Length of the leave in days, counted as `end - start`.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Payload for creating a leave request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaveRequest {
    #[schema(example = 1)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// defaults to `Pending`
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    #[schema(example = "Flu")]
    pub reason: String,
}

/// Full-record replacement payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestUpdate {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    #[serde(default)]
    pub reason: String,
    /// when present the update only applies if the stored version matches
    #[schema(example = 0)]
    pub version: Option<u32>,
}
