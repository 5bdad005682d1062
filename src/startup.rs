use actix_cors::Cors;
use actix_files::{self as fs, NamedFile};
use actix_web::dev::{fn_service, Server, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionService;
use crate::configuration::{ApplicationSettings, Settings, StoreBackend};
use crate::error::{AppError, DatabaseError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, not_found, refresh, register};
use crate::store::{
    InMemoryRefreshTokenStore, InMemoryUserStore, PgRefreshTokenStore, PgUserStore,
    RefreshTokenStore, UserStore,
};

/// Wire the configured store backend into a `SessionService`.
///
/// For Postgres this connects the pool and applies `migrations/`.
pub async fn build_session_service(settings: &Settings) -> Result<SessionService, AppError> {
    let (users, tokens): (Arc<dyn UserStore>, Arc<dyn RefreshTokenStore>) =
        match settings.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; sessions will not survive a restart");
                (
                    Arc::new(InMemoryUserStore::new()),
                    Arc::new(InMemoryRefreshTokenStore::new()),
                )
            }
            StoreBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(settings.database.max_connections)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(&settings.database.connection_string())
                    .await?;

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| DatabaseError::UnexpectedError(format!("migration failed: {}", e)))?;

                tracing::info!("Database connection pool created and migrated");
                (
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgRefreshTokenStore::new(pool)),
                )
            }
        };

    Ok(SessionService::new(users, tokens, settings.auth.clone()))
}

/// CORS for the separately hosted frontend. Requests from any other
/// origin pass through without CORS headers and the browser blocks them.
fn cors(allowed_origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .block_on_origin_mismatch(false)
        .max_age(3600);

    match allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors,
    }
}

/// Built frontend at `/`; unknown paths get `index.html` so client-side
/// routes survive a reload.
fn spa_files(dir: &str) -> fs::Files {
    let index = PathBuf::from(dir).join("index.html");

    fs::Files::new("/", dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(index).await?;
                let res = file.into_response(&req);
                Ok(ServiceResponse::new(req, res))
            }
        }))
}

pub fn run(
    listener: TcpListener,
    session: SessionService,
    application: &ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let auth_settings = web::Data::new(session.settings().clone());
    let session = web::Data::new(session);
    let static_dir = application
        .static_dir
        .clone()
        .filter(|dir| Path::new(dir).is_dir());
    let allowed_origin = application.allowed_origin.clone();

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
        });

        let static_dir = static_dir.clone();

        App::new()
            .wrap(cors(allowed_origin.as_deref()))
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(json_config)
            .app_data(session.clone())
            .app_data(auth_settings.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .service(
                        web::resource("/refresh")
                            .route(web::get().to(refresh))
                            .route(web::post().to(refresh)),
                    )
                    .route("/logout", web::post().to(logout))
                    // Protected: the handler takes `AuthenticatedUser`
                    .route("/me", web::get().to(get_current_user)),
            )
            // Static frontend last so it never shadows API routes
            .configure(move |cfg| {
                if let Some(dir) = static_dir {
                    cfg.service(spa_files(&dir));
                }
            })
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
