#![allow(dead_code, unused_macros)]

use online_store::auth::{hash_password, TokenPair, TokenService};
use online_store::configuration::{
    get_configuration, DatabaseSettings, JwtSettings, RefreshDelivery, RepositoryKind, Settings,
};
use online_store::repository::{
    InMemoryRepository, PostgresRepository, StoreRepository, FIXTURE_ADMIN_EMAIL,
    FIXTURE_ADMIN_PASSWORD,
};
use online_store::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = FIXTURE_ADMIN_EMAIL;
pub const ADMIN_PASSWORD: &str = FIXTURE_ADMIN_PASSWORD;

pub struct TestApp {
    pub address: String,
    pub jwt: JwtSettings,
    pub repository: Arc<dyn StoreRepository>,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(RefreshDelivery::Body).await
}

pub async fn spawn_app_with(delivery: RefreshDelivery) -> TestApp {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.application.repository = RepositoryKind::Memory;
    configuration.jwt.refresh_delivery = delivery;

    let repository =
        Arc::new(InMemoryRepository::with_fixtures().expect("Failed to seed repository"));
    serve(repository, configuration)
}

/// Same server, backed by a fresh migrated database seeded with the admin
/// fixture
pub async fn spawn_postgres_app() -> TestApp {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.application.repository = RepositoryKind::Postgres;
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();

    let pool = configure_database(&configuration.database).await;
    let repository = PostgresRepository::new(pool.clone(), configuration.database.timeout());

    let hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash fixture password");
    let admin_id = repository
        .insert_user("Admin", ADMIN_EMAIL, &hash)
        .await
        .expect("Failed to seed admin");
    sqlx::query("UPDATE users SET is_admin = true WHERE id = $1")
        .bind(admin_id)
        .execute(&pool)
        .await
        .expect("Failed to promote admin");

    serve(Arc::new(repository), configuration)
}

/// Generates one `#[tokio::test]` per scenario and repository. Each scenario
/// is an `async fn(TestApp)` in the calling file.
macro_rules! against_both_repositories {
    ($($scenario:ident),* $(,)?) => {
        mod in_memory {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario(crate::common::spawn_app().await).await;
                }
            )*
        }

        mod postgres {
            $(
                #[tokio::test]
                async fn $scenario() {
                    super::$scenario(crate::common::spawn_postgres_app().await).await;
                }
            )*
        }
    };
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

fn serve(repository: Arc<dyn StoreRepository>, configuration: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    let jwt = configuration.jwt.clone();

    let server = run(listener, repository.clone(), configuration).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        jwt,
        repository,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub async fn post_auth(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/auth"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login_admin(&self) -> String {
        let response = self
            .post_auth(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn post_refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/refresh-token"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!("refresh_token={}", urlencoding::encode(refresh_token)))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Token pair for the fixture admin whose refresh token expires in
    /// `refresh_seconds`, signed with the server's secret and domain
    pub async fn admin_pair_expiring_in(&self, refresh_seconds: i64) -> TokenPair {
        let admin = self
            .repository
            .user_by_email(ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("fixture admin missing");
        let tokens = TokenService::new(JwtSettings {
            refresh_token_expiry: refresh_seconds,
            ..self.jwt.clone()
        });
        tokens.issue_pair(&admin).unwrap()
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_authed(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_authed(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_authed(&self, path: &str, token: &str, body: Option<&Value>) -> reqwest::Response {
        let mut request = self.client.delete(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.expect("Failed to execute request.")
    }
}
