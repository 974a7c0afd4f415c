use actix_web::{HttpResponse, web};

use crate::error::ApiError;
use crate::service::LeaveService;

#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Seeded employees", body = [crate::model::employee::Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(service: web::Data<LeaveService>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(service.list_employees().await?))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = crate::model::employee::Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee = service.get_employee(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes;
    use crate::rules::LeavePolicy;
    use crate::test_support::seeded_store;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn lists_and_fetches_employees() {
        let store = Arc::new(seeded_store());
        let service = LeaveService::new(store.clone(), store, LeavePolicy::default(), false);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .service(web::scope("/api").configure(routes::api_routes)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/employees").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/employees/2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["department"], "RH");
        assert_eq!(body["joiningDate"], "2022-09-05");

        let req = test::TestRequest::get().uri("/api/employees/9").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
