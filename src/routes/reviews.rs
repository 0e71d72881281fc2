use actix_web::{web, HttpResponse};

use crate::auth::Claims;
use crate::error::{AppError, ErrorContext};
use crate::models::{NewReview, ReviewInput};
use crate::repository::StoreRepository;
use crate::validators::validate_review;

/// GET /api/v1/reviews/{product_id}
pub async fn product_reviews(
    path: web::Path<i64>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let items = repo.reviews_for_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "items": items })))
}

/// POST /api/v1/reviews/{product_id}
///
/// The author is always the token's subject.
pub async fn create_review(
    path: web::Path<i64>,
    body: web::Json<ReviewInput>,
    claims: web::ReqData<Claims>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let context = ErrorContext::new("create_review").with_user_id(user_id);
    let input = validate_review(body.into_inner())?;

    let review = NewReview {
        product_id: path.into_inner(),
        user_id,
        rating: input.rating,
        comment: input.comment,
    };
    let id = repo.insert_review(&review).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        product_id = %review.product_id,
        review_id = %id,
        "Review created"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({ "id": id })))
}

/// DELETE /api/v1/reviews/{review_id}
pub async fn delete_review(
    path: web::Path<i64>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    repo.delete_review(id).await?;
    tracing::info!(review_id = %id, "Review deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}
