use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, require_roles, AllowedRoles};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let protected = any_role_routes()
        .merge(staff_routes())
        .merge(admin_routes());
    let protected = with_optional_rate_limit(protected, rate_limit_config.enabled, rate_limit_config.api)
        .layer(middleware::from_fn(auth_middleware));

    auth.merge(protected)
}

/// Unauthenticated: register and login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::auth::register))
        .route("/auth/login", routing::post(handlers::auth::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Any authenticated role. END_USER visibility is narrowed in the services.
fn any_role_routes() -> Router {
    Router::new()
        .route("/auth/me", routing::get(handlers::auth::me))
        .route(
            "/tickets",
            routing::get(handlers::tickets::list_tickets).post(handlers::tickets::create_ticket),
        )
        .route("/tickets/{id}", routing::get(handlers::tickets::get_ticket))
        .route(
            "/ticket-meta/categories",
            routing::get(handlers::taxonomy::list_categories),
        )
        .route(
            "/ticket-meta/categories/{id}/subcategories",
            routing::get(handlers::taxonomy::list_subcategories),
        )
        .route(
            "/ticket-meta/fields",
            routing::get(handlers::taxonomy::list_fields),
        )
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::ANY,
            require_roles,
        ))
}

/// ADMIN and AGENT.
fn staff_routes() -> Router {
    Router::new()
        .route(
            "/tickets/{id}",
            routing::patch(handlers::tickets::update_ticket),
        )
        .route(
            "/tickets/{id}/notes",
            routing::get(handlers::tickets::list_notes).post(handlers::tickets::add_note),
        )
        .route(
            "/tickets/{id}/history",
            routing::get(handlers::tickets::list_history),
        )
        .route(
            "/users",
            routing::get(handlers::users::list_staff).post(handlers::users::create_user),
        )
        .route(
            "/users/end-users",
            routing::get(handlers::users::list_end_users),
        )
        .route(
            "/users/{id}",
            routing::patch(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route("/stats/reports", routing::get(handlers::stats::reports))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::STAFF,
            require_roles,
        ))
}

/// ADMIN only: taxonomy administration and the dashboard.
fn admin_routes() -> Router {
    Router::new()
        .route(
            "/ticket-meta/categories",
            routing::post(handlers::taxonomy::create_category),
        )
        .route(
            "/ticket-meta/categories/{id}",
            routing::patch(handlers::taxonomy::update_category),
        )
        .route(
            "/ticket-meta/subcategories",
            routing::post(handlers::taxonomy::create_subcategory),
        )
        .route(
            "/ticket-meta/subcategories/{id}",
            routing::patch(handlers::taxonomy::update_subcategory),
        )
        .route(
            "/ticket-meta/fields",
            routing::post(handlers::taxonomy::create_field),
        )
        .route(
            "/ticket-meta/fields/{id}",
            routing::patch(handlers::taxonomy::update_field),
        )
        .route("/stats", routing::get(handlers::stats::dashboard))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::ADMIN,
            require_roles,
        ))
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "Invalid rate limit rule, throttling disabled for this group");
            router
        }
    }
}
