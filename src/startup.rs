use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::configuration::Settings;
use crate::error::extractor_error;
use crate::logger::LoggerMiddleware;
use crate::middleware::{cors, JwtMiddleware};
use crate::repository::StoreRepository;
use crate::routes::{
    add_to_wishlist, authenticate, change_password, create_category, create_product,
    create_review, current_user, delete_category, delete_product, delete_review, get_wishlist,
    health_check, list_categories, list_products, product_reviews, refresh, register,
    remove_from_wishlist, update_category, update_product,
};

pub fn run(
    listener: TcpListener,
    repository: Arc<dyn StoreRepository>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let repository: web::Data<dyn StoreRepository> = web::Data::from(repository);
    let tokens = TokenService::new(settings.jwt.clone());
    let token_data = web::Data::new(tokens.clone());
    let allowed_origin = settings.application.allowed_origin.clone();

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(cors(&allowed_origin))
            .wrap(LoggerMiddleware)
            .wrap(Logger::default())

            // Shared state
            .app_data(repository.clone())
            .app_data(token_data.clone())

            // Extractor failures use the JSON error envelope
            .app_data(web::JsonConfig::default().error_handler(|err, _| extractor_error(err)))
            .app_data(web::FormConfig::default().error_handler(|err, _| extractor_error(err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _| extractor_error(err)))
            .app_data(web::PathConfig::default().error_handler(|err, _| extractor_error(err)))

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    // Public routes
                    .route("/auth", web::post().to(authenticate))
                    .route("/auth/register", web::post().to(register))
                    .route("/refresh-token", web::post().to(refresh))

                    // Protected routes (require a bearer access token)
                    .service(
                        web::scope("")
                            .wrap(JwtMiddleware::new(tokens.clone()))
                            .service(
                                web::resource("/categories")
                                    .route(web::get().to(list_categories))
                                    .route(web::post().to(create_category)),
                            )
                            .service(
                                web::resource("/categories/{id}")
                                    .route(web::put().to(update_category))
                                    .route(web::delete().to(delete_category)),
                            )
                            .service(
                                web::resource("/products")
                                    .route(web::get().to(list_products))
                                    .route(web::post().to(create_product)),
                            )
                            .service(
                                web::resource("/products/{id}")
                                    .route(web::put().to(update_product))
                                    .route(web::delete().to(delete_product)),
                            )
                            // GET/POST take a product id, DELETE a review id
                            .service(
                                web::resource("/reviews/{id}")
                                    .route(web::get().to(product_reviews))
                                    .route(web::post().to(create_review))
                                    .route(web::delete().to(delete_review)),
                            )
                            .service(
                                web::resource("/users/wishlist")
                                    .route(web::get().to(get_wishlist))
                                    .route(web::post().to(add_to_wishlist))
                                    .route(web::delete().to(remove_from_wishlist)),
                            )
                            .route("/users/me", web::get().to(current_user))
                            .route("/users/me/password", web::put().to(change_password)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
