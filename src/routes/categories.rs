use actix_web::{web, HttpResponse};

use crate::error::{AppError, ErrorContext};
use crate::models::{CategoryFilter, CategoryInput, PageQuery, Paginated};
use crate::repository::StoreRepository;
use crate::validators::validate_category;

/// GET /api/v1/categories?category_name=&page=&page_size=
pub async fn list_categories(
    filter: web::Query<CategoryFilter>,
    paging: web::Query<PageQuery>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let page = paging.resolve();
    let (items, total) = repo.list_categories(&filter, page).await?;
    Ok(HttpResponse::Ok().json(Paginated::new(items, total, page)))
}

/// POST /api/v1/categories
pub async fn create_category(
    body: web::Json<CategoryInput>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_category");
    let input = validate_category(body.into_inner())?;

    let id = repo.insert_category(&input).await?;
    tracing::info!(request_id = %context.request_id, category_id = %id, "Category created");

    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    path: web::Path<i64>,
    body: web::Json<CategoryInput>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = validate_category(body.into_inner())?;

    repo.update_category(id, &input).await?;
    tracing::info!(category_id = %id, "Category updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}

/// DELETE /api/v1/categories/{id}
///
/// Products still linked to the category keep their rows but drop out of
/// listings until they are moved to another category.
pub async fn delete_category(
    path: web::Path<i64>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    repo.delete_category(id).await?;
    tracing::info!(category_id = %id, "Category deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}
