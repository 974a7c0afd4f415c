//! Typed filter, sort and pagination for the leave request listing.
//!
//! Sort fields come from a closed enum; both the in-memory comparator and
//! the SQL column are looked up from it, so caller input never reaches the
//! query text.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
pub enum SortField {
    Id,
    EmployeeId,
    LeaveType,
    #[default]
    StartDate,
    EndDate,
    Status,
    CreatedAt,
}

impl SortField {
    /// Name accepted in `sortBy`.
    pub fn name(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::EmployeeId => "employeeId",
            SortField::LeaveType => "leaveType",
            SortField::StartDate => "startDate",
            SortField::EndDate => "endDate",
            SortField::Status => "status",
            SortField::CreatedAt => "createdAt",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::EmployeeId => "employee_id",
            SortField::LeaveType => "leave_type",
            SortField::StartDate => "start_date",
            SortField::EndDate => "end_date",
            SortField::Status => "status",
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn compare(&self, a: &LeaveRequest, b: &LeaveRequest) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::EmployeeId => a.employee_id.cmp(&b.employee_id),
            // stored as text, so order by name like the database does
            SortField::LeaveType => a.leave_type.as_ref().cmp(b.leave_type.as_ref()),
            SortField::StartDate => a.start_date.cmp(&b.start_date),
            SortField::EndDate => a.end_date.cmp(&b.end_date),
            SortField::Status => a.status.as_ref().cmp(b.status.as_ref()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for SortField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s.trim());
        SortField::iter()
            .find(|f| normalize(f.name()) == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = SortField::iter().map(|f| f.name()).collect();
                ApiError::bad_request(format!(
                    "Invalid sortBy '{}'. Allowed: {}",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        s.trim()
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid sortOrder '{}'. Allowed: asc, desc", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Sorts in place; ties fall back to ascending id.
    pub fn apply(&self, records: &mut [LeaveRequest]) {
        records.sort_by(|a, b| {
            let ord = self.field.compare(a, b);
            let ord = match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Optional predicates; `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveCriteria {
    pub employee_id: Option<u64>,
    pub leave_type: Option<LeaveType>,
    pub status: Option<LeaveStatus>,
    /// keeps requests starting on or after this date
    pub start_from: Option<NaiveDate>,
    /// keeps requests ending on or before this date
    pub end_until: Option<NaiveDate>,
    pub keyword: Option<String>,
}

impl LeaveCriteria {
    /// Drops blank keywords so they don't constrain anything.
    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword.filter(|k| !k.is_empty());
        self
    }

    pub fn matches(&self, r: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| r.employee_id == id)
            && self.leave_type.is_none_or(|t| r.leave_type == t)
            && self.status.is_none_or(|s| r.status == s)
            && self.start_from.is_none_or(|d| r.start_date >= d)
            && self.end_until.is_none_or(|d| r.end_date <= d)
            && self
                .keyword
                .as_deref()
                .is_none_or(|k| r.reason.to_lowercase().contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Zero or negative values clamp to 1; page size is capped.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1) as u64;
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u64;
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(skip)
            .take(self.page_size as usize)
            .collect()
    }
}

/// A fully parsed listing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveQuery {
    pub criteria: LeaveCriteria,
    pub sort: Sort,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, leave};

    #[test]
    fn sort_field_accepts_camel_and_snake_case() {
        assert_eq!("startDate".parse::<SortField>().unwrap(), SortField::StartDate);
        assert_eq!("start_date".parse::<SortField>().unwrap(), SortField::StartDate);
        assert_eq!("EMPLOYEEID".parse::<SortField>().unwrap(), SortField::EmployeeId);
        assert_eq!("CreatedAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
    }

    #[test]
    fn sort_field_rejects_unknown_names() {
        let err = "reason; DROP TABLE leave_requests".parse::<SortField>().unwrap_err();
        assert!(err.to_string().contains("Allowed: id, employeeId"));
    }

    #[test]
    fn sort_order_is_strict() {
        assert_eq!(SortOrder::parse("DESC").unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::parse("asc").unwrap(), SortOrder::Asc);
        assert!(SortOrder::parse("sideways").is_err());
    }

    #[test]
    fn sort_is_monotonic_in_both_directions() {
        let mut records = vec![
            leave(1, 1, LeaveType::Other, "2024-03-01", "2024-03-02", ""),
            leave(2, 1, LeaveType::Other, "2024-01-01", "2024-01-02", ""),
            leave(3, 2, LeaveType::Other, "2024-02-01", "2024-02-02", ""),
        ];

        Sort::new(SortField::StartDate, SortOrder::Asc).apply(&mut records);
        assert!(records.windows(2).all(|w| w[0].start_date <= w[1].start_date));

        Sort::new(SortField::StartDate, SortOrder::Desc).apply(&mut records);
        assert!(records.windows(2).all(|w| w[0].start_date >= w[1].start_date));

        Sort::new(SortField::EmployeeId, SortOrder::Desc).apply(&mut records);
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn criteria_apply_every_supplied_predicate() {
        let records = vec![
            leave(1, 1, LeaveType::Sick, "2024-03-01", "2024-03-03", "Flu symptoms"),
            leave(2, 1, LeaveType::Annual, "2024-04-01", "2024-04-05", "Beach"),
            leave(3, 2, LeaveType::Sick, "2024-05-01", "2024-05-02", "flu again"),
        ];

        let criteria = LeaveCriteria {
            leave_type: Some(LeaveType::Sick),
            start_from: Some(date("2024-02-01")),
            end_until: Some(date("2024-04-30")),
            ..Default::default()
        }
        .with_keyword(Some("FLU".into()));

        let hits: Vec<u64> = records.iter().filter(|r| criteria.matches(r)).map(|r| r.id).collect();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn empty_keyword_is_no_constraint() {
        let criteria = LeaveCriteria::default().with_keyword(Some(String::new()));
        assert_eq!(criteria.keyword, None);
        assert!(criteria.matches(&leave(1, 1, LeaveType::Other, "2024-01-01", "2024-01-02", "")));
    }

    #[test]
    fn pagination_clamps_to_one() {
        assert_eq!(Pagination::new(Some(0), Some(-5)), Pagination { page: 1, page_size: 1 });
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, page_size: 10 });
        assert_eq!(Pagination::new(Some(3), Some(1_000)).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn pagination_takes_the_requested_slice() {
        let page = Pagination::new(Some(2), Some(1));
        assert_eq!(page.apply(vec!["a", "b", "c"]), vec!["b"]);

        let beyond = Pagination::new(Some(9), Some(2));
        assert!(beyond.apply(vec!["a", "b", "c"]).is_empty());
    }
}
