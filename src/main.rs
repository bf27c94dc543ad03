use axum::{
    extract::Extension,
    response::{IntoResponse, Redirect},
    routing::{get, get_service},
    Router,
};
use diesel::{
    r2d2::{ConnectionManager, Pool},
    Connection, SqliteConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tera::{Context, Tera};
use time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

mod data;
mod features;
mod handlers;
mod schema;
mod utils;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[tokio::main]
async fn main() {
    // Database configuration
    dotenv::dotenv().ok();
    env_logger::init();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "studycards.db".into());

    // Schema setup before the pool starts handing out connections
    match SqliteConnection::establish(&database_url) {
        Ok(mut conn) => {
            if let Err(e) = conn.run_pending_migrations(MIGRATIONS) {
                eprintln!("Failed to run migrations: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    }

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .build(manager)
        .expect("Failed to create DB pool");

    // Templates configuration
    let templates = match Tera::new("templates/**/*.html") {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Template parsing error: {}", e);
            std::process::exit(1);
        }
    };
    let templates = Arc::new(templates);

    // Sessions configuration
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)))
        .with_secure(false);

    // Card API router
    let cards_api_router = Router::new()
        .route(
            "/",
            get(handlers::cards::list_cards).post(handlers::cards::create_card),
        )
        .route(
            "/{card_id}",
            get(handlers::cards::view_card).delete(handlers::cards::delete_card),
        )
        .with_state(pool.clone());

    // Study API router
    let study_api_router = Router::new()
        .route(
            "/review",
            get(handlers::study::review_queue).post(handlers::study::submit_review),
        )
        .route("/reminder", get(handlers::study::fragment_reminder))
        .with_state(pool.clone());

    // User API router
    let user_api_router = Router::new()
        .route("/stats", get(handlers::study::user_stats))
        .with_state(pool.clone());

    // Combined API router
    let api_router = Router::new()
        .nest("/cards", cards_api_router)
        .nest("/study", study_api_router)
        .nest("/user", user_api_router);

    // Auth router
    let auth_router = Router::new()
        .merge(handlers::auth::login::auth_router(
            pool.clone(),
            templates.clone(),
        ))
        .merge(handlers::auth::register::auth_router(
            pool.clone(),
            templates.clone(),
        ))
        .route("/logout", get(handle_logout));

    // Main application router
    let app = Router::new()
        // Pages
        .route("/", get(home))
        .route("/dashboard", get(dashboard))
        .route("/study", get(study))
        .route("/cards", get(cards_page))
        // Auth routes
        .nest("/auth", auth_router)
        // API routes
        .nest("/api", api_router)
        // Static files
        .nest_service("/static", get_service(ServeDir::new("static")))
        // Shared state and layers
        .layer(Extension(templates))
        .layer(session_layer);

    // Start server
    let listener = match TcpListener::bind("127.0.0.1:5000").await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to address: {}", e);
            std::process::exit(1);
        }
    };

    println!("Server running on http://localhost:5000");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// Handlers for the page shells
async fn home(
    Extension(templates): Extension<Arc<Tera>>,
    session: tower_sessions::Session,
) -> impl IntoResponse {
    let mut context = Context::new();
    context.insert("logged_in", &utils::is_logged_in(&session).await);
    utils::render_template(&templates, "home.html", context)
}

async fn dashboard(
    Extension(templates): Extension<Arc<Tera>>,
    session: tower_sessions::Session,
) -> impl IntoResponse {
    let mut context = Context::new();
    context.insert("logged_in", &utils::is_logged_in(&session).await);
    context.insert("user_id", &utils::get_current_user_id(&session).await);
    utils::render_template(&templates, "dashboard.html", context)
}

async fn study(
    Extension(templates): Extension<Arc<Tera>>,
    session: tower_sessions::Session,
) -> impl IntoResponse {
    let mut context = Context::new();
    context.insert("logged_in", &utils::is_logged_in(&session).await);
    utils::render_template(&templates, "study.html", context)
}

async fn cards_page(
    Extension(templates): Extension<Arc<Tera>>,
    session: tower_sessions::Session,
) -> impl IntoResponse {
    let mut context = Context::new();
    context.insert("logged_in", &utils::is_logged_in(&session).await);
    utils::render_template(&templates, "cards.html", context)
}

// Auth handlers
async fn handle_logout(
    session: tower_sessions::Session,
) -> Result<Redirect, crate::data::models::LoginError> {
    session.delete().await.map_err(|e| {
        log::error!("Failed to delete session: {}", e);
        crate::data::models::LoginError::SessionError("Failed to logout".into())
    })?;
    Ok(Redirect::to("/"))
}
