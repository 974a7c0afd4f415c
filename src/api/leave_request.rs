use std::fmt::Display;
use std::str::FromStr;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::debug;
use utoipa::IntoParams;

use crate::error::ApiError;
use crate::filter::{LeaveCriteria, LeaveQuery, Pagination, Sort, SortField, SortOrder};
use crate::model::leave_request::{LeaveRequestUpdate, LeaveStatus, LeaveType, NewLeaveRequest};
use crate::service::LeaveService;

/// Query string of the filtered listing.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[param(value_type = Option<u64>, example = 1)]
    pub employee_id: Option<String>,
    /// Annual, Sick or Other (case-insensitive)
    #[param(example = "Annual")]
    pub leave_type: Option<String>,
    /// Pending, Approved or Rejected (case-insensitive)
    #[param(example = "Approved")]
    pub status: Option<String>,
    /// Only requests starting on or after this date
    #[param(value_type = Option<String>, format = Date, example = "2024-01-01")]
    pub start_date: Option<String>,
    /// Only requests ending on or before this date
    #[param(value_type = Option<String>, format = Date, example = "2024-12-31")]
    pub end_date: Option<String>,
    /// Case-insensitive match against the reason
    #[param(example = "vacances")]
    pub keyword: Option<String>,
    /// Page number, starting with 1
    #[param(value_type = Option<i64>, example = 1)]
    pub page: Option<String>,
    /// Items per page (1 to 100)
    #[param(value_type = Option<i64>, example = 10)]
    pub page_size: Option<String>,
    /// id, employeeId, leaveType, startDate, endDate, status or createdAt
    #[param(example = "startDate")]
    pub sort_by: Option<String>,
    /// asc or desc
    #[param(example = "asc")]
    pub sort_order: Option<String>,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_value<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|_| ApiError::bad_request(format!("Invalid {} '{}'", field, s)))
    })
    .transpose()
}

fn parse_enum<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr + IntoEnumIterator + Display,
{
    raw.map(|s| {
        s.parse::<T>().map_err(|_| {
            let allowed: Vec<String> = T::iter().map(|v| v.to_string()).collect();
            ApiError::bad_request(format!(
                "Invalid {} '{}'. Allowed: {}",
                field,
                s,
                allowed.join(", ")
            ))
        })
    })
    .transpose()
}

impl LeaveFilter {
    /// Validates the raw parameters. Empty or whitespace-only values count
    /// as absent, except `keyword` which only drops out when empty.
    pub fn into_query(self) -> Result<LeaveQuery, ApiError> {
        let criteria = LeaveCriteria {
            employee_id: parse_value::<u64>("employeeId", present(&self.employee_id))?,
            leave_type: parse_enum::<LeaveType>("leaveType", present(&self.leave_type))?,
            status: parse_enum::<LeaveStatus>("status", present(&self.status))?,
            start_from: parse_value::<NaiveDate>("startDate", present(&self.start_date))?,
            end_until: parse_value::<NaiveDate>("endDate", present(&self.end_date))?,
            keyword: None,
        }
        .with_keyword(self.keyword);

        let field = match present(&self.sort_by) {
            Some(name) => name.parse::<SortField>()?,
            None => SortField::default(),
        };
        let order = match present(&self.sort_order) {
            Some(order) => SortOrder::parse(order)?,
            None => SortOrder::default(),
        };

        Ok(LeaveQuery {
            criteria,
            sort: Sort::new(field, order),
            pagination: Pagination::new(
                parse_value::<i64>("page", present(&self.page))?,
                parse_value::<i64>("pageSize", present(&self.page_size))?,
            ),
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// for getting every leave request
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    responses(
        (status = 200, description = "All leave requests", body = [crate::model::leave_request::LeaveRequest])
    ),
    tag = "Leave"
)]
pub async fn list_leave_requests(service: web::Data<LeaveService>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(service.list_all().await?))
}

/// for getting a leave request with its employee
#[utoipa::path(
    get,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = crate::model::leave_request::LeaveRequest),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave_request(
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave = service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = NewLeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = crate::model::leave_request::LeaveRequest),
        (status = 400, description = "Invalid payload, unknown employee or broken rule", body = Object, example = json!({
            "message": "endDate cannot be before startDate"
        }))
    ),
    tag = "Leave"
)]
pub async fn create_leave_request(
    req: HttpRequest,
    service: web::Data<LeaveService>,
    payload: web::Json<NewLeaveRequest>,
) -> Result<HttpResponse, ApiError> {
    let created = service.create(payload.into_inner(), today()).await?;
    let location = format!("{}/{}", req.path().trim_end_matches('/'), created.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location))
        .json(created))
}

/* =========================
Replace leave request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the leave request to replace")
    ),
    request_body = LeaveRequestUpdate,
    responses(
        (status = 204, description = "Leave request replaced"),
        (status = 400, description = "Body id differs from path id, or invalid payload", body = Object, example = json!({
            "message": "Route id does not match body id"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Version mismatch")
    ),
    tag = "Leave"
)]
pub async fn update_leave_request(
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    body: web::Json<LeaveRequestUpdate>,
) -> Result<HttpResponse, ApiError> {
    service.update(path.into_inner(), body.into_inner(), today()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 204, description = "Leave request deleted"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn delete_leave_request(
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    service.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Filtered, rule-checked and paginated listing. A single request that
/// breaks a rule fails the whole call.
#[utoipa::path(
    get,
    path = "/api/leave-requests/filter",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = crate::service::LeavePage),
        (status = 400, description = "Invalid filter or broken business rule", body = Object, example = json!({
            "message": "There is an overlap in leave dates for this employee."
        }))
    ),
    tag = "Leave"
)]
pub async fn filter_leave_requests(
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner().into_query()?;
    debug!(?query, "Filtering leave requests");

    let page = service.filter(&query, today()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Every stored request that breaks a rule, with all of its violations.
#[utoipa::path(
    get,
    path = "/api/leave-requests/violations",
    responses(
        (status = 200, description = "Per-record rule violations", body = [crate::service::RecordViolations])
    ),
    tag = "Leave"
)]
pub async fn leave_violations(service: web::Data<LeaveService>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(service.violations(today()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use crate::routes;
    use crate::rules::LeavePolicy;
    use crate::test_support::{leave, seeded_store, store_with};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn data(store: InMemoryStore) -> web::Data<LeaveService> {
        let store = Arc::new(store);
        web::Data::new(LeaveService::new(store.clone(), store, LeavePolicy::default(), false))
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(data($store))
                    .service(web::scope("/api").configure(routes::api_routes)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn list_returns_seeded_request() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get().uri("/api/leave-requests").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["reason"], "Vacances");
        assert_eq!(body[0]["leaveType"], "Annual");
    }

    #[actix_web::test]
    async fn get_embeds_employee() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get().uri("/api/leave-requests/1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["employee"]["fullName"], "Sarra Touffehi");
        assert_eq!(body["startDate"], "2024-06-01");
    }

    #[actix_web::test]
    async fn create_returns_location() {
        let app = app!(seeded_store());

        let req = test::TestRequest::post()
            .uri("/api/leave-requests")
            .set_json(json!({
                "employeeId": 2,
                "leaveType": "Sick",
                "startDate": "2026-01-05",
                "endDate": "2026-01-07",
                "reason": "Flu"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/api/leave-requests/2");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], 2);
        assert_eq!(body["status"], "Pending");
    }

    #[actix_web::test]
    async fn malformed_body_is_a_bad_request() {
        let app = app!(seeded_store());

        let req = test::TestRequest::post()
            .uri("/api/leave-requests")
            .set_json(json!({ "employeeId": 2, "leaveType": "Sabbatical" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());
    }

    #[actix_web::test]
    async fn put_with_mismatched_id_is_rejected() {
        let app = app!(seeded_store());

        let req = test::TestRequest::put()
            .uri("/api/leave-requests/5")
            .set_json(json!({
                "id": 6,
                "employeeId": 1,
                "leaveType": "Other",
                "startDate": "2024-06-01",
                "endDate": "2024-06-02",
                "status": "Pending"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn put_replaces_and_detects_stale_version() {
        let app = app!(seeded_store());
        let body = json!({
            "id": 1,
            "employeeId": 1,
            "leaveType": "Annual",
            "startDate": "2024-06-01",
            "endDate": "2024-06-04",
            "status": "Approved",
            "reason": "short trip",
            "version": 0
        });

        let req = test::TestRequest::put().uri("/api/leave-requests/1").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::put().uri("/api/leave-requests/1").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn delete_then_get_is_not_found() {
        let app = app!(seeded_store());

        let req = test::TestRequest::delete().uri("/api/leave-requests/1").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/api/leave-requests/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Leave request not found");

        let req = test::TestRequest::delete().uri("/api/leave-requests/1").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn filter_pages_and_sorts() {
        let app = app!(store_with(vec![
            leave(1, 1, LeaveType::Other, "2024-01-01", "2024-01-02", ""),
            leave(2, 1, LeaveType::Other, "2024-02-01", "2024-02-02", ""),
            leave(3, 2, LeaveType::Other, "2024-03-01", "2024-03-02", ""),
        ]));

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?page=2&pageSize=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], 2);
        assert_eq!(body["total"], 3);
        assert_eq!(body["pageSize"], 1);

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?sortBy=startDate&sortOrder=DESC&employeeId=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["id"], 2);
        assert_eq!(body["data"][1]["id"], 1);
    }

    #[actix_web::test]
    async fn filter_reports_overlap_as_bad_request() {
        let app = app!(store_with(vec![
            leave(1, 1, LeaveType::Other, "2024-06-01", "2024-06-10", ""),
            leave(2, 1, LeaveType::Other, "2024-06-05", "2024-06-15", ""),
        ]));

        let req = test::TestRequest::get().uri("/api/leave-requests/filter").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "There is an overlap in leave dates for this employee.");
    }

    #[actix_web::test]
    async fn filter_rejects_unknown_fields() {
        let app = app!(seeded_store());

        for uri in [
            "/api/leave-requests/filter?sortBy=password",
            "/api/leave-requests/filter?sortOrder=up",
            "/api/leave-requests/filter?leaveType=Sabbatical",
            "/api/leave-requests/filter?startDate=yesterday",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn filter_accepts_blank_and_lowercase_values() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?leaveType=annual&status=&keyword=vac&page=0&pageSize=-3")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"][0]["id"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 1);
    }

    #[actix_web::test]
    async fn filter_treats_empty_ids_dates_and_pages_as_absent() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?employeeId=&startDate=&endDate=&page=&pageSize=%20")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 10);
    }

    #[actix_web::test]
    async fn filter_names_the_malformed_parameter() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?employeeId=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid employeeId 'abc'");
    }

    #[actix_web::test]
    async fn whitespace_keyword_still_constrains() {
        let app = app!(seeded_store());

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?keyword=%20%20")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 0);

        let req = test::TestRequest::get()
            .uri("/api/leave-requests/filter?keyword=")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
    }

    #[actix_web::test]
    async fn violations_lists_offenders() {
        let app = app!(store_with(vec![
            leave(1, 2, LeaveType::Sick, "2024-02-01", "2024-02-03", ""),
            leave(2, 2, LeaveType::Other, "2024-05-01", "2024-05-03", ""),
        ]));

        let req = test::TestRequest::get().uri("/api/leave-requests/violations").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["leaveRequestId"], 1);
        assert_eq!(body[0]["violations"][0]["code"], "sick_reason_missing");
    }
}
