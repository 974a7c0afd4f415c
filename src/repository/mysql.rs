use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::filter::{LeaveCriteria, Sort};
use crate::model::employee::Employee;
use crate::model::leave_request::{
    LeaveRequest, LeaveRequestUpdate, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::repository::{
    EmployeeRepository, LeaveRepository, RepoResult, RepositoryError, UpdateOutcome,
};

const LEAVE_COLUMNS: &str =
    "id, employee_id, leave_type, start_date, end_date, status, reason, created_at, version";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    reason: String,
    created_at: DateTime<Utc>,
    version: u32,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = RepositoryError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type: LeaveType = row.leave_type.parse().map_err(|_| {
            RepositoryError::CorruptRow(format!(
                "leave_requests.leave_type = '{}' (id {})",
                row.leave_type, row.id
            ))
        })?;
        let status: LeaveStatus = row.status.parse().map_err(|_| {
            RepositoryError::CorruptRow(format!(
                "leave_requests.status = '{}' (id {})",
                row.status, row.id
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            reason: row.reason,
            created_at: row.created_at,
            version: row.version,
            employee: None,
        })
    }
}

// Helper enum for typed SQLx binding
#[derive(Debug, Clone, PartialEq)]
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// Escapes LIKE wildcards so the keyword is matched literally.
fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn build_where(criteria: &LeaveCriteria) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = criteria.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    if let Some(leave_type) = criteria.leave_type {
        where_sql.push_str(" AND leave_type = ?");
        args.push(FilterValue::Str(leave_type.to_string()));
    }

    if let Some(status) = criteria.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(from) = criteria.start_from {
        where_sql.push_str(" AND start_date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(until) = criteria.end_until {
        where_sql.push_str(" AND end_date <= ?");
        args.push(FilterValue::Date(until));
    }

    if let Some(keyword) = criteria.keyword.as_deref() {
        where_sql.push_str(" AND reason LIKE ?");
        args.push(FilterValue::Str(format!("%{}%", escape_like(keyword))));
    }

    (where_sql, args)
}

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_leaves(&self, sql: &str, args: Vec<FilterValue>) -> RepoResult<Vec<LeaveRequest>> {
        debug!(sql = %sql, args = ?args, "Fetching leave requests");

        let mut q = sqlx::query_as::<_, LeaveRow>(sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Str(s) => q.bind(s),
                FilterValue::Date(d) => q.bind(d),
            };
        }

        q.fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn fetch_leave(&self, id: u64) -> RepoResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }
}

#[async_trait]
impl LeaveRepository for MySqlStore {
    async fn find_all(&self) -> RepoResult<Vec<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests ORDER BY id");
        self.fetch_leaves(&sql, Vec::new()).await
    }

    async fn find_by_id(&self, id: u64) -> RepoResult<Option<LeaveRequest>> {
        let Some(mut leave) = self.fetch_leave(id).await? else {
            return Ok(None);
        };
        leave.employee = self.find_employee(leave.employee_id).await?;
        Ok(Some(leave))
    }

    async fn find_by_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = ? ORDER BY id"
        );
        self.fetch_leaves(&sql, vec![FilterValue::U64(employee_id)])
            .await
    }

    async fn query(&self, criteria: &LeaveCriteria, sort: &Sort) -> RepoResult<Vec<LeaveRequest>> {
        let (where_sql, args) = build_where(criteria);
        // column and direction come from closed enums, never from the caller
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY {} {}, id ASC",
            where_sql,
            sort.field.column(),
            sort.order.as_sql()
        );
        self.fetch_leaves(&sql, args).await
    }

    async fn insert(&self, new: &NewLeaveRequest) -> RepoResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, status, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_ref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.status.as_ref())
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.fetch_leave(id).await?.ok_or_else(|| {
            RepositoryError::CorruptRow(format!("inserted leave request {id} could not be read back"))
        })
    }

    async fn update(&self, update: &LeaveRequestUpdate) -> RepoResult<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET employee_id = ?, leave_type = ?, start_date = ?, end_date = ?,
                status = ?, reason = ?, version = version + 1
            WHERE id = ?
            AND (? IS NULL OR version = ?)
            "#,
        )
        .bind(update.employee_id)
        .bind(update.leave_type.as_ref())
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(update.status.as_ref())
        .bind(&update.reason)
        .bind(update.id)
        .bind(update.version)
        .bind(update.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current: Option<u32> =
                sqlx::query_scalar("SELECT version FROM leave_requests WHERE id = ?")
                    .bind(update.id)
                    .fetch_optional(&self.pool)
                    .await?;

            return Ok(match current {
                Some(current_version) => UpdateOutcome::Conflict { current_version },
                None => UpdateOutcome::NotFound,
            });
        }

        Ok(match self.fetch_leave(update.id).await? {
            Some(leave) => UpdateOutcome::Updated(leave),
            // deleted between the update and the read
            None => UpdateOutcome::NotFound,
        })
    }

    async fn delete(&self, id: u64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EmployeeRepository for MySqlStore {
    async fn list_employees(&self) -> RepoResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT id, full_name, department, joining_date FROM employees ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    async fn find_employee(&self, id: u64) -> RepoResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, full_name, department, joining_date FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }
}
