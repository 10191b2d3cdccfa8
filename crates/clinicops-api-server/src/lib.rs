pub mod auth;
pub mod config;
pub mod database;
pub mod handlers;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Extension, Router,
};
use state::AppContext;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub fn build_router(ctx: &AppContext) -> Router {
    // Public routes (no auth): health, published reports, ticket widget
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(
            "/public/reports/{token}",
            get(handlers::reports::get_public),
        )
        .route("/public/tickets", post(handlers::tickets::create_public))
        .route(
            "/public/tickets/{id}/messages",
            get(handlers::tickets::list_messages_public)
                .post(handlers::tickets::add_message_public),
        )
        .layer(Extension(ctx.pool.clone()))
        .layer(Extension(ctx.users.clone()))
        .layer(Extension(ctx.reports.clone()))
        .layer(Extension(ctx.tickets.clone()));

    // Everything under /api requires a valid bearer token
    let protected_routes = Router::new()
        .route(
            "/api/patients",
            post(handlers::patients::create).get(handlers::patients::list),
        )
        .route(
            "/api/patients/{id}",
            get(handlers::patients::get)
                .put(handlers::patients::update)
                .delete(handlers::patients::delete),
        )
        .route(
            "/api/stages",
            post(handlers::deals::create_stage).get(handlers::deals::list_stages),
        )
        .route(
            "/api/deals",
            post(handlers::deals::create).get(handlers::deals::list),
        )
        .route("/api/deals/{id}", get(handlers::deals::get))
        .route("/api/deals/{id}/stage", patch(handlers::deals::change_stage))
        .route(
            "/api/workflows",
            post(handlers::workflows::create).get(handlers::workflows::list),
        )
        .route(
            "/api/workflows/{id}",
            get(handlers::workflows::get)
                .put(handlers::workflows::update)
                .delete(handlers::workflows::delete),
        )
        .route(
            "/api/projects",
            post(handlers::projects::create).get(handlers::projects::list),
        )
        .route(
            "/api/projects/{id}",
            get(handlers::projects::get)
                .put(handlers::projects::update)
                .delete(handlers::projects::delete),
        )
        .route(
            "/api/invoices",
            post(handlers::invoices::create).get(handlers::invoices::list),
        )
        .route("/api/invoices/{id}", get(handlers::invoices::get))
        .route(
            "/api/invoices/{id}/status",
            post(handlers::invoices::set_status),
        )
        .route(
            "/api/leave",
            post(handlers::leave::create).get(handlers::leave::list),
        )
        .route("/api/leave/{id}/approve", post(handlers::leave::approve))
        .route("/api/leave/{id}/reject", post(handlers::leave::reject))
        .route(
            "/api/reports",
            post(handlers::reports::create).get(handlers::reports::list),
        )
        .route(
            "/api/reports/{id}",
            get(handlers::reports::get).put(handlers::reports::update),
        )
        .route("/api/reports/{id}/publish", post(handlers::reports::publish))
        .route(
            "/api/reports/{id}/unpublish",
            post(handlers::reports::unpublish),
        )
        .route("/api/tickets", get(handlers::tickets::list))
        .route(
            "/api/tickets/{id}/messages",
            get(handlers::tickets::list_messages).post(handlers::tickets::add_message),
        )
        .route("/api/tickets/{id}/status", post(handlers::tickets::set_status))
        .route(
            "/api/chat/servers",
            post(handlers::chat::servers::create).get(handlers::chat::servers::list),
        )
        .route(
            "/api/chat/invites/{code}/accept",
            post(handlers::chat::servers::accept_invite),
        )
        .route(
            "/api/chat/servers/{id}/channels",
            get(handlers::chat::channels::list).post(handlers::chat::channels::create),
        )
        .route(
            "/api/chat/servers/{id}/channels/{channel_id}",
            put(handlers::chat::channels::rename).delete(handlers::chat::channels::delete),
        )
        .route(
            "/api/chat/servers/{id}/roles",
            get(handlers::chat::roles::list).post(handlers::chat::roles::create),
        )
        .route(
            "/api/chat/servers/{id}/roles/{role_id}",
            put(handlers::chat::roles::update).delete(handlers::chat::roles::delete),
        )
        .route(
            "/api/chat/servers/{id}/members/{member_id}/role",
            put(handlers::chat::roles::assign),
        )
        .route(
            "/api/chat/channels/{id}/messages",
            get(handlers::chat::messages::list).post(handlers::chat::messages::post),
        )
        .route(
            "/api/chat/channels/{id}/threads",
            get(handlers::chat::threads::list).post(handlers::chat::threads::create),
        )
        .route(
            "/api/chat/dms",
            get(handlers::chat::dms::list).post(handlers::chat::dms::open),
        )
        .layer(middleware::from_fn(auth::middleware::auth_middleware))
        .layer(Extension(ctx.verifier.clone()))
        .layer(Extension(ctx.users.clone()))
        .layer(Extension(ctx.patients.clone()))
        .layer(Extension(ctx.deals.clone()))
        .layer(Extension(ctx.workflows.clone()))
        .layer(Extension(ctx.projects.clone()))
        .layer(Extension(ctx.invoices.clone()))
        .layer(Extension(ctx.leave.clone()))
        .layer(Extension(ctx.chat.clone()))
        .layer(Extension(ctx.reports.clone()))
        .layer(Extension(ctx.tickets.clone()))
        .layer(Extension(ctx.engine.clone()))
        .layer(Extension(ctx.limits));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            CorsLayer::permissive()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}
