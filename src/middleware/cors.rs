/// CORS Policy
///
/// Cross-origin access for the single front-end origin from configuration.
/// Credentialed requests are allowed so the refresh cookie can travel.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};

const ALLOWED_METHODS: [&str; 6] = ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];
const MAX_AGE_SECONDS: usize = 3600;

fn allowed_headers() -> Vec<HeaderName> {
    vec![
        header::ACCEPT,
        header::CONTENT_TYPE,
        HeaderName::from_static("x-csrf-token"),
        header::AUTHORIZATION,
    ]
}

/// Builds the app-wide CORS middleware for `allowed_origin`.
///
/// Preflight requests are answered before routing. Actual requests carrying
/// an `Origin` header get `Access-Control-Allow-Origin` and
/// `Access-Control-Allow-Credentials` on the way out.
pub fn cors(allowed_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(allowed_origin)
        .allowed_methods(ALLOWED_METHODS)
        .allowed_headers(allowed_headers())
        .supports_credentials()
        .max_age(MAX_AGE_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header::HeaderValue, Method};
    use actix_web::{test, web, App, HttpResponse};

    const ORIGIN: &str = "http://localhost:3000";

    fn header_str(value: Option<&HeaderValue>) -> String {
        value
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    #[actix_web::test]
    async fn preflight_is_answered_before_routing() {
        let app = test::init_service(
            App::new()
                .wrap(cors(ORIGIN))
                .route("/products", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/products")
            .insert_header((header::ORIGIN, ORIGIN))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status().as_u16(), 200);
        let headers = res.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), ORIGIN);
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");

        let methods = header_str(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS));
        for method in ALLOWED_METHODS {
            assert!(methods.contains(&method.to_ascii_lowercase()), "{} missing", method);
        }
        let allowed = header_str(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS));
        for name in ["accept", "content-type", "x-csrf-token", "authorization"] {
            assert!(allowed.contains(name), "{} missing", name);
        }
    }

    #[actix_web::test]
    async fn cross_origin_responses_carry_origin_and_credentials() {
        let app = test::init_service(
            App::new()
                .wrap(cors(ORIGIN))
                .route("/products", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route(
                    "/denied",
                    web::get().to(|| async { HttpResponse::Unauthorized().finish() }),
                ),
        )
        .await;

        for (path, status) in [("/products", 200), ("/denied", 401)] {
            let req = test::TestRequest::get()
                .uri(path)
                .insert_header((header::ORIGIN, ORIGIN))
                .to_request();
            let res = test::call_service(&app, req).await;

            assert_eq!(res.status().as_u16(), status);
            assert_eq!(
                res.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
                "true"
            );
            assert_eq!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), ORIGIN);
        }
    }
}
