use actix_web::{web, HttpResponse};

use crate::auth::Claims;
use crate::error::AppError;
use crate::models::WishlistRequest;
use crate::repository::StoreRepository;

/// GET /api/v1/users/wishlist
pub async fn get_wishlist(
    claims: web::ReqData<Claims>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let items = repo.wishlist(claims.user_id()?).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "items": items })))
}

/// POST /api/v1/users/wishlist
pub async fn add_to_wishlist(
    claims: web::ReqData<Claims>,
    body: web::Json<WishlistRequest>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    repo.add_to_wishlist(user_id, body.product_id).await?;
    tracing::info!(user_id = %user_id, product_id = %body.product_id, "Wishlist entry added");

    Ok(HttpResponse::Created().json(serde_json::json!({ "product_id": body.product_id })))
}

/// DELETE /api/v1/users/wishlist
pub async fn remove_from_wishlist(
    claims: web::ReqData<Claims>,
    body: web::Json<WishlistRequest>,
    repo: web::Data<dyn StoreRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    repo.remove_from_wishlist(user_id, body.product_id).await?;
    tracing::info!(user_id = %user_id, product_id = %body.product_id, "Wishlist entry removed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "product_id": body.product_id })))
}
