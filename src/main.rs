use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use wsurvey::core::auth::{
    AuthService, FacebookTokenValidator, GoogleTokenValidator, JwtService,
};
use wsurvey::core::config::Config;
use wsurvey::core::db::create_pool_with_migrations;
use wsurvey::core::db::repositories::{FormRepository, UserRepository};
use wsurvey::core::forms::FormService;
use wsurvey::graphql::schema::build_schema;
use wsurvey::graphql::{AppState, graphiql_handler, graphql_handler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = create_pool_with_migrations(config.database_url_or_panic()).await?;
    tracing::info!("database pool ready, migrations applied");

    let users = Arc::new(UserRepository::new(pool.clone()));
    let forms = Arc::new(FormRepository::new(pool));

    let auth_service = AuthService::new(
        users,
        JwtService::from_env()?,
        Arc::new(FacebookTokenValidator::new(config.facebook.clone())),
        Arc::new(GoogleTokenValidator::new(config.google.clone())),
    );
    let form_service = FormService::new(forms);

    let schema = build_schema(auth_service.clone(), form_service);
    let state = AppState::new(schema, auth_service);

    let app = Router::new()
        .route("/graphql", get(graphiql_handler).post(graphql_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app_port));
    tracing::info!("listening on http://{addr}/graphql");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
