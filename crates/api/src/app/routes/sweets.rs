use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use sweetshop_auth::{Grant, Permission};
use sweetshop_core::SweetId;
use sweetshop_inventory::{SweetFilter, SUGGESTED_CATEGORIES};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

type Response = axum::response::Response;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sweets).post(create_sweet))
        .route("/search", get(search_sweets))
        .route("/summary", get(get_summary))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_sweet).patch(update_sweet).delete(delete_sweet))
        .route("/:id/purchase", post(purchase_sweet))
        .route("/:id/restock", post(restock_sweet))
}

fn grant(principal: &PrincipalContext, required: &Permission) -> Result<Grant, Response> {
    crate::authz::grant(principal, required).map_err(errors::forbidden)
}

fn parse_id(id: &str) -> Result<SweetId, Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sweet id"))
}

pub async fn list_sweets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = grant(&principal, &Permission::SWEETS_READ) {
        return resp;
    }

    match services.inventory().list().await {
        Ok(items) => Json(dto::sweets_to_json(&items)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_sweets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> Response {
    if let Err(resp) = grant(&principal, &Permission::SWEETS_READ) {
        return resp;
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };

    let filter = SweetFilter::from(query);
    match services.inventory().search(&filter).await {
        Ok(items) => Json(dto::sweets_to_json(&items)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = grant(&principal, &Permission::SWEETS_READ) {
        return resp;
    }

    match services.inventory().summary().await {
        Ok(summary) => Json(dto::SummaryResponse::from(summary)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_categories(Extension(principal): Extension<PrincipalContext>) -> Response {
    if let Err(resp) = grant(&principal, &Permission::SWEETS_READ) {
        return resp;
    }
    Json(SUGGESTED_CATEGORIES).into_response()
}

pub async fn get_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = grant(&principal, &Permission::SWEETS_READ) {
        return resp;
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory().get(id).await {
        Ok(item) => Json(dto::SweetResponse::from(&item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateSweetRequest>, JsonRejection>,
) -> Response {
    let grant = match grant(&principal, &Permission::SWEETS_MANAGE) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.inventory().create(&grant, body.into()).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::SweetResponse::from(&item))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateSweetRequest>, JsonRejection>,
) -> Response {
    let grant = match grant(&principal, &Permission::SWEETS_MANAGE) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.inventory().update(&grant, id, body.into()).await {
        Ok(item) => Json(dto::SweetResponse::from(&item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let grant = match grant(&principal, &Permission::SWEETS_MANAGE) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory().delete(&grant, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn purchase_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::StockChangeRequest>, JsonRejection>,
) -> Response {
    let grant = match grant(&principal, &Permission::SWEETS_PURCHASE) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.inventory().purchase(&grant, id, body.quantity).await {
        Ok(item) => Json(dto::SweetResponse::from(&item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn restock_sweet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::StockChangeRequest>, JsonRejection>,
) -> Response {
    let grant = match grant(&principal, &Permission::SWEETS_MANAGE) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.inventory().restock(&grant, id, body.quantity).await {
        Ok(item) => Json(dto::SweetResponse::from(&item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
