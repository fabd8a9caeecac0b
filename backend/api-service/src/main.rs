use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use api_service::clients::{CaptionGenerator, GeminiClient, ImageKitClient, MediaStore};
use api_service::db::{
    self, CommentRepository, CommentStore, ConversationRepository, ConversationStore,
    LikeRepository, LikeStore, PostRepository, PostStore, UserRepository, UserStore,
};
use api_service::handlers::{self, UploadLimit};
use api_service::middleware::MetricsMiddleware;
use api_service::services::{
    AuthService, ChatService, CommentService, ConversationService, LikeService, PostService,
    UserService,
};
use crypto_core::jwt;
use db_pool::{create_pool, DbConfig};
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "api-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "api-service"
        })),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match api_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting api-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (private_pem, public_pem) =
        jwt::load_keys_from_env().context("JWT keys are not configured")?;
    jwt::initialize_jwt_keys(&private_pem, &public_pem)
        .context("Failed to initialize JWT keys")?;

    let db_cfg = DbConfig::from_env("api-service").map_err(anyhow::Error::msg)?;
    db_cfg.log_config();
    let db_pool = create_pool(db_cfg)
        .await
        .context("Failed to create database pool")?;

    db::MIGRATOR
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool.clone()));
    let posts: Arc<dyn PostStore> = Arc::new(PostRepository::new(db_pool.clone()));
    let likes: Arc<dyn LikeStore> = Arc::new(LikeRepository::new(db_pool.clone()));
    let comments: Arc<dyn CommentStore> = Arc::new(CommentRepository::new(db_pool.clone()));
    let conversations: Arc<dyn ConversationStore> =
        Arc::new(ConversationRepository::new(db_pool.clone()));

    let generator: Arc<dyn CaptionGenerator> = Arc::new(
        GeminiClient::new(&config.gemini).context("Failed to build generator client")?,
    );
    let media: Arc<dyn MediaStore> = Arc::new(
        ImageKitClient::new(&config.imagekit).context("Failed to build media store client")?,
    );

    let conversation_service = ConversationService::new(conversations);

    let auth_service = web::Data::new(AuthService::new(users.clone()));
    let user_service = web::Data::new(UserService::new(users.clone()));
    let post_service = web::Data::new(PostService::new(
        posts.clone(),
        likes.clone(),
        comments.clone(),
        users,
        media,
        generator.clone(),
    ));
    let comment_service = web::Data::new(CommentService::new(posts.clone(), comments));
    let like_service = web::Data::new(LikeService::new(posts, likes));
    let chat_service = web::Data::new(ChatService::new(conversation_service.clone(), generator));
    let conversation_data = web::Data::new(conversation_service);
    let auth_config = web::Data::new(config.auth.clone());
    let upload_limit = web::Data::new(UploadLimit(config.app.max_upload_bytes));
    let pool_data = web::Data::new(db_pool);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(auth_service.clone())
            .app_data(user_service.clone())
            .app_data(post_service.clone())
            .app_data(comment_service.clone())
            .app_data(like_service.clone())
            .app_data(chat_service.clone())
            .app_data(conversation_data.clone())
            .app_data(auth_config.clone())
            .app_data(upload_limit.clone())
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/api/v1/health", web::get().to(health_summary))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let handle = server.handle();
    actix_rt::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await.context("HTTP server error")?;
    tracing::info!("api-service stopped");
    Ok(())
}
