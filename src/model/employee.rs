use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "fullName": "Sarra Touffehi",
        "department": "IT",
        "joiningDate": "2023-01-15"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Sarra Touffehi")]
    pub full_name: String,

    #[schema(example = "IT")]
    pub department: String,

    #[schema(
        example = "2023-01-15",
        value_type = String,
        format = "date"
    )]
    pub joining_date: NaiveDate,
}
