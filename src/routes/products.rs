use actix_web::{web, HttpResponse};

use crate::error::{AppError, ErrorContext};
use crate::models::{PageQuery, Paginated, ProductFilter, ProductInput};
use crate::repository::StoreRepository;
use crate::validators::validate_product;

/// GET /api/v1/products?product_name=&category_name=&status=&page=&page_size=
pub async fn list_products(
    filter: web::Query<ProductFilter>,
    paging: web::Query<PageQuery>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let page = paging.resolve();
    let (items, total) = repo.list_products(&filter, page).await?;
    Ok(HttpResponse::Ok().json(Paginated::new(items, total, page)))
}

/// POST /api/v1/products
///
/// # Errors
/// - 400: invalid fields, or `category_id` does not exist
pub async fn create_product(
    body: web::Json<ProductInput>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_product");
    let input = validate_product(body.into_inner())?;

    let id = repo.insert_product(&input).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;
    tracing::info!(
        request_id = %context.request_id,
        product_id = %id,
        category_id = %input.category_id,
        "Product created"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// PUT /api/v1/products/{id}
pub async fn update_product(
    path: web::Path<i64>,
    body: web::Json<ProductInput>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = validate_product(body.into_inner())?;

    repo.update_product(id, &input).await?;
    tracing::info!(product_id = %id, "Product updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}

/// DELETE /api/v1/products/{id}
pub async fn delete_product(
    path: web::Path<i64>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    repo.delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}
