use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use helpdesk::config::{self, sla::SlaPolicy};
use helpdesk::{migration, routes, services, utils};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth
        helpdesk::handlers::auth::register,
        helpdesk::handlers::auth::login,
        helpdesk::handlers::auth::me,
        // Users
        helpdesk::handlers::users::list_staff,
        helpdesk::handlers::users::list_end_users,
        helpdesk::handlers::users::create_user,
        helpdesk::handlers::users::update_user,
        helpdesk::handlers::users::delete_user,
        // Taxonomy
        helpdesk::handlers::taxonomy::list_categories,
        helpdesk::handlers::taxonomy::list_subcategories,
        helpdesk::handlers::taxonomy::list_fields,
        helpdesk::handlers::taxonomy::create_category,
        helpdesk::handlers::taxonomy::update_category,
        helpdesk::handlers::taxonomy::create_subcategory,
        helpdesk::handlers::taxonomy::update_subcategory,
        helpdesk::handlers::taxonomy::create_field,
        helpdesk::handlers::taxonomy::update_field,
        // Tickets
        helpdesk::handlers::tickets::list_tickets,
        helpdesk::handlers::tickets::get_ticket,
        helpdesk::handlers::tickets::create_ticket,
        helpdesk::handlers::tickets::update_ticket,
        helpdesk::handlers::tickets::list_notes,
        helpdesk::handlers::tickets::add_note,
        helpdesk::handlers::tickets::list_history,
        // Stats
        helpdesk::handlers::stats::dashboard,
        helpdesk::handlers::stats::reports,
    ),
    components(
        schemas(
            helpdesk::response::ApiResponse<serde_json::Value>,
            helpdesk::response::PaginatedResponse<serde_json::Value>,
            helpdesk::error::AppError,
            helpdesk::models::UserRole,
            helpdesk::models::TicketStatus,
            helpdesk::models::TicketPriority,
            helpdesk::models::FieldType,
            // Auth
            helpdesk::services::auth::RegisterRequest,
            helpdesk::services::auth::LoginRequest,
            helpdesk::services::auth::AuthResponse,
            helpdesk::services::auth::SessionUser,
            // Users
            helpdesk::services::user::CreateUserRequest,
            helpdesk::services::user::UpdateUserRequest,
            helpdesk::services::user::StaffMember,
            // Taxonomy
            helpdesk::services::taxonomy::CreateCategoryRequest,
            helpdesk::services::taxonomy::UpdateCategoryRequest,
            helpdesk::services::taxonomy::CreateSubcategoryRequest,
            helpdesk::services::taxonomy::UpdateSubcategoryRequest,
            helpdesk::services::taxonomy::CreateFieldRequest,
            helpdesk::services::taxonomy::UpdateFieldRequest,
            helpdesk::services::taxonomy::FieldDefinitionView,
            // Tickets
            helpdesk::services::custom_fields::SubmittedFieldValue,
            helpdesk::services::ticket::CreateTicketRequest,
            helpdesk::services::ticket::UpdateTicketRequest,
            helpdesk::services::ticket::CreateNoteRequest,
            helpdesk::services::ticket::TicketView,
            helpdesk::services::ticket::TicketDetail,
            helpdesk::services::ticket::CustomFieldEntry,
            helpdesk::services::ticket::NoteView,
            helpdesk::services::ticket::HistoryView,
            // Stats
            helpdesk::services::stats::DashboardStats,
            helpdesk::services::stats::StaffStat,
            helpdesk::services::stats::Report,
        )
    ),
    modifiers(&JwtSecurity),
    tags(
        (name = "auth", description = "Login, registration and session"),
        (name = "users", description = "Staff and end user accounts"),
        (name = "ticket-meta", description = "Categories, subcategories and custom fields"),
        (name = "tickets", description = "Tickets, internal notes and history"),
        (name = "stats", description = "Dashboard and operational reports"),
    )
)]
struct ApiDoc;

struct JwtSecurity;

impl Modify for JwtSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let jwt_config = config::jwt::JwtConfig::from_env()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Helpdesk API v{}...", env!("CARGO_PKG_VERSION"));

    let db_config = config::database::DatabaseConfig::from_env()?;
    let db = config::database::connect(&db_config).await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_admin::ensure_bootstrap_admin(&db).await?;

    let sla = SlaPolicy::from_env();
    tracing::info!(thresholds = ?sla.thresholds(), "SLA policy loaded");

    let app = create_app().layer(Extension(db)).layer(Extension(sla));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let json_output = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk=debug,tower_http=debug".into()),
        )
        .with(json_output.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_output).then(tracing_subscriber::fmt::layer))
        .init();
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service and database status", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Helpdesk API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
