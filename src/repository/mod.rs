//! Store access behind traits so the service runs against MySQL in
//! production and an in-memory store in tests or without a database.

use async_trait::async_trait;
use derive_more::{Display, From};

use crate::filter::{LeaveCriteria, Sort};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveRequestUpdate, NewLeaveRequest};

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display, From)]
pub enum RepositoryError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    /// a stored value that no longer maps onto the model
    #[from(ignore)]
    #[display(fmt = "corrupt row: {}", _0)]
    CorruptRow(String),
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Database(e) => Some(e),
            RepositoryError::CorruptRow(_) => None,
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Result of a full-record replace.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(LeaveRequest),
    /// the row is gone
    NotFound,
    /// the row exists but its version moved on
    Conflict { current_version: u32 },
}

#[async_trait]
pub trait LeaveRepository: Send + Sync + 'static {
    /// Every stored request, ordered by id.
    async fn find_all(&self) -> RepoResult<Vec<LeaveRequest>>;

    /// One request with its employee embedded.
    async fn find_by_id(&self, id: u64) -> RepoResult<Option<LeaveRequest>>;

    async fn find_by_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>>;

    /// All requests matching `criteria`, sorted; never paginated.
    async fn query(&self, criteria: &LeaveCriteria, sort: &Sort) -> RepoResult<Vec<LeaveRequest>>;

    async fn insert(&self, new: &NewLeaveRequest) -> RepoResult<LeaveRequest>;

    async fn update(&self, update: &LeaveRequestUpdate) -> RepoResult<UpdateOutcome>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: u64) -> RepoResult<bool>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync + 'static {
    async fn list_employees(&self) -> RepoResult<Vec<Employee>>;

    async fn find_employee(&self, id: u64) -> RepoResult<Option<Employee>>;
}
