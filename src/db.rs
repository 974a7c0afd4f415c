use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

const CREATE_EMPLOYEES: &str = r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        full_name VARCHAR(200) NOT NULL,
        department VARCHAR(100) NOT NULL,
        joining_date DATE NOT NULL
    )
"#;

const CREATE_LEAVE_REQUESTS: &str = r#"
    CREATE TABLE IF NOT EXISTS leave_requests (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        leave_type VARCHAR(16) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'Pending',
        reason VARCHAR(500) NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        version INT UNSIGNED NOT NULL DEFAULT 0,
        INDEX idx_leave_requests_employee (employee_id),
        CONSTRAINT fk_leave_requests_employee
            FOREIGN KEY (employee_id) REFERENCES employees (id)
            ON DELETE CASCADE
    )
"#;

/// Creates both tables if they are missing.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_EMPLOYEES).execute(pool).await?;
    sqlx::query(CREATE_LEAVE_REQUESTS).execute(pool).await?;
    Ok(())
}

/// Inserts the seed rows into empty tables only, so deleted seed
/// records stay deleted across restarts.
pub async fn seed(pool: &MySqlPool) -> anyhow::Result<()> {
    let employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;
    if employees == 0 {
        for e in seed_employees()? {
            sqlx::query(
                "INSERT INTO employees (id, full_name, department, joining_date) VALUES (?, ?, ?, ?)",
            )
            .bind(e.id)
            .bind(&e.full_name)
            .bind(&e.department)
            .bind(e.joining_date)
            .execute(pool)
            .await?;
        }
        info!("Seeded employees");
    }

    let leaves: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_requests")
        .fetch_one(pool)
        .await?;
    if leaves == 0 {
        for l in seed_leave_requests()? {
            sqlx::query(
                r#"
                INSERT INTO leave_requests
                    (id, employee_id, leave_type, start_date, end_date, status, reason)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(l.id)
            .bind(l.employee_id)
            .bind(l.leave_type.as_ref())
            .bind(l.start_date)
            .bind(l.end_date)
            .bind(l.status.as_ref())
            .bind(&l.reason)
            .execute(pool)
            .await?;
        }
        info!("Seeded leave requests");
    }

    Ok(())
}

fn ymd(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("Invalid seed date {}-{:02}-{:02}", year, month, day))
}

pub fn seed_employees() -> anyhow::Result<Vec<Employee>> {
    Ok(vec![
        Employee {
            id: 1,
            full_name: "Sarra Touffehi".into(),
            department: "IT".into(),
            joining_date: ymd(2023, 1, 15)?,
        },
        Employee {
            id: 2,
            full_name: "Hajer Touffehi".into(),
            department: "RH".into(),
            joining_date: ymd(2022, 9, 5)?,
        },
    ])
}

pub fn seed_leave_requests() -> anyhow::Result<Vec<LeaveRequest>> {
    Ok(vec![LeaveRequest {
        id: 1,
        employee_id: 1,
        leave_type: LeaveType::Annual,
        start_date: ymd(2024, 6, 1)?,
        end_date: ymd(2024, 6, 10)?,
        status: LeaveStatus::Approved,
        reason: "Vacances".into(),
        created_at: Utc::now(),
        version: 0,
        employee: None,
    }])
}
