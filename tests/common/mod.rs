#![allow(dead_code)]

use helpdesk::config::sla::SlaPolicy;
use helpdesk::models::{user, UserRole};
use reqwest::Client;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const TEST_PASSWORD: &str = "helpdesk_pass_123";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("ALLOW_SELF_REGISTRATION", "true");
        let config = helpdesk::config::jwt::JwtConfig::from_env().unwrap();
        let _ = helpdesk::utils::jwt::init_jwt_config(config);
    });
}

/// Unique suffix for usernames and taxonomy names; tests in one binary
/// share the database.
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, COUNTER.fetch_add(1, Ordering::SeqCst))
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and wipe once per test binary; tests then rely on unique names.
    SCHEMA_READY
        .get_or_init(|| async {
            helpdesk::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(helpdesk::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(SlaPolicy::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "ticket_history",
        "ticket_notes",
        "ticket_custom_field_values",
        "tickets",
        "ticket_custom_field_definitions",
        "ticket_subcategories",
        "ticket_categories",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub token: String,
}

/// Inserts an account directly and issues a token for it.
pub async fn create_user(app: &TestApp, role: UserRole, department: Option<&str>) -> TestUser {
    let username = unique(&role.as_str().to_ascii_lowercase());
    let name = format!("{} Tester", username);
    let now = chrono::Utc::now().naive_utc();

    let created = user::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(helpdesk::utils::hash_password(TEST_PASSWORD).unwrap()),
        role: Set(role),
        name: Set(name.clone()),
        department: Set(department.map(str::to_string)),
        phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .expect("Failed to insert user");

    let token = helpdesk::utils::encode_token(created.id, role).unwrap();
    TestUser {
        id: created.id,
        username,
        name,
        token,
    }
}

pub async fn create_admin(app: &TestApp) -> TestUser {
    create_user(app, UserRole::Admin, None).await
}

pub async fn create_agent(app: &TestApp) -> TestUser {
    create_user(app, UserRole::Agent, None).await
}

pub async fn create_end_user(app: &TestApp) -> TestUser {
    create_user(app, UserRole::EndUser, Some("Finance")).await
}

pub struct Taxonomy {
    pub category_id: i32,
    pub category_name: String,
    pub subcategory_id: i32,
    pub os_field_id: i32,
}

/// Hardware / Laptop with a required `operating_system` select field.
pub async fn seed_taxonomy(app: &TestApp, admin_token: &str) -> Taxonomy {
    let category_name = unique("Hardware");
    let (status, body) = app
        .post(
            "/ticket-meta/categories",
            admin_token,
            json!({ "name": category_name, "description": "Physical equipment" }),
        )
        .await;
    assert_eq!(status, 201, "create category: {}", body);
    let category_id = body["data"]["id"].as_i64().unwrap() as i32;

    let (status, body) = app
        .post(
            "/ticket-meta/subcategories",
            admin_token,
            json!({ "category_id": category_id, "name": "Laptop" }),
        )
        .await;
    assert_eq!(status, 201, "create subcategory: {}", body);
    let subcategory_id = body["data"]["id"].as_i64().unwrap() as i32;

    let (status, body) = app
        .post(
            "/ticket-meta/fields",
            admin_token,
            json!({
                "category_id": category_id,
                "subcategory_id": subcategory_id,
                "field_key": "operating_system",
                "label": "Operating system",
                "field_type": "select",
                "required": true,
                "options": ["Windows", "macOS", "Linux"]
            }),
        )
        .await;
    assert_eq!(status, 201, "create field: {}", body);
    let os_field_id = body["data"]["id"].as_i64().unwrap() as i32;

    Taxonomy {
        category_id,
        category_name,
        subcategory_id,
        os_field_id,
    }
}

/// Files a ticket with `operating_system=Windows` and returns its id.
pub async fn create_ticket(
    app: &TestApp,
    token: &str,
    taxonomy: &Taxonomy,
    priority: &str,
) -> i32 {
    let (status, body) = app
        .post(
            "/tickets",
            token,
            json!({
                "caller_name": "Walk-in Caller",
                "department": "Operations",
                "description": "Laptop will not boot",
                "priority": priority,
                "category_id": taxonomy.category_id,
                "subcategory_id": taxonomy.subcategory_id,
                "custom_fields": [
                    { "field_definition_id": taxonomy.os_field_id, "value": "Windows" }
                ]
            }),
        )
        .await;
    assert_eq!(status, 201, "create ticket: {}", body);
    body["data"]["id"].as_i64().unwrap() as i32
}
