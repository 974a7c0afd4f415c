use crate::model::employee::Employee;
use crate::model::leave_request::{
    LeaveRequest, LeaveRequestUpdate, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::rules::ViolationReport;
use crate::service::{LeavePage, RecordViolations};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management

CRUD for employee leave requests, plus a filtered listing that checks
business rules before paginating.

### Business rules
- No two requests of the same employee may overlap
- At most 20 Annual days per employee per calendar year
- Sick leave needs a reason

A filtered listing fails with **400** as soon as one matching request
breaks a rule. `GET /api/leave-requests/violations` reports every
offending request instead.

### Response Format
- JSON with camelCase fields
- Errors carry a `message`
"#,
    ),
    paths(
        crate::api::leave_request::list_leave_requests,
        crate::api::leave_request::get_leave_request,
        crate::api::leave_request::create_leave_request,
        crate::api::leave_request::update_leave_request,
        crate::api::leave_request::delete_leave_request,
        crate::api::leave_request::filter_leave_requests,
        crate::api::leave_request::leave_violations,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
    ),
    components(
        schemas(
            LeaveRequest,
            NewLeaveRequest,
            LeaveRequestUpdate,
            LeaveType,
            LeaveStatus,
            LeavePage,
            RecordViolations,
            ViolationReport,
            Employee
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Employee", description = "Read-only employee APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_filter_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave-requests/filter"));
        assert!(doc.paths.paths.contains_key("/api/employees/{id}"));
        assert!(!doc.paths.paths.contains_key("/api/employees/{employee_id}"));
    }
}
