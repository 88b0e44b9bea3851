use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, EnvFilter};

use sf_api::app::{configure, json_config, AppState};
use sf_api::backends::{BanBackend, PrimaryBackend, UserBackend};
use sf_api::middleware::{create_cors, RequestLimiter, SecurityHeaders};
use sf_core::repositories::{InMemoryBanRepository, InMemoryUserRepository};
use sf_core::services::otp::{FallbackStore, OtpManager};
use sf_core::services::token::CredentialService;
use sf_core::IdentityService;
use sf_infra::database::{DatabasePool, MySqlBanRepository, MySqlUserRepository};
use sf_infra::{create_sms_service, InMemoryPrimaryStore, RedisPrimaryStore, SmsOtpDelivery};
use sf_shared::config::{
    AppConfig, CacheConfig, CacheType, DatabaseConfig, LogFormat, LoggingConfig,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.logging);

    info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Storefront API server"
    );
    if config.auth.jwt.is_using_default_secret() {
        warn!("JWT_SECRET is not set; credentials are signed with the development secret");
    }
    if let Some(code) = &config.otp.fixed_code {
        warn!(code_length = code.len(), "OTP_FIXED_CODE is set; every issued code is the same");
    }

    let primary = Arc::new(build_primary(&config.cache).await?);
    let (bans, users, pool) = build_repositories(config.database.as_ref()).await?;

    let sms = create_sms_service(&config.sms);
    info!(provider = sms.provider_name(), "SMS gateway ready");

    let identity = Arc::new(IdentityService::new(
        Arc::new(users),
        Arc::new(CredentialService::new(config.auth.jwt.clone())),
    ));

    let manager = Arc::new(OtpManager::new(
        primary.clone(),
        Arc::new(FallbackStore::new()),
        Arc::new(SmsOtpDelivery::new(sms)),
        Arc::new(bans),
        identity.clone(),
        config.otp.clone(),
    ));
    manager.start_sweeper();

    info!(
        primary = primary.kind(),
        storage_backend = %manager.backend_status(),
        validity_seconds = manager.config().validity_duration_seconds,
        mirror_to_fallback = manager.config().mirror_to_fallback,
        "OTP manager ready"
    );

    if config.rate_limit.enabled {
        info!(
            max_requests = config.rate_limit.max_requests,
            window_seconds = config.rate_limit.window_seconds,
            trust_proxy = config.rate_limit.trust_proxy,
            "Rate limiting OTP routes per client"
        );
    } else {
        warn!("RATE_LIMIT_ENABLED is off; OTP routes are not rate limited");
    }

    let state = web::Data::new(AppState::new(manager, identity));
    let limiter = web::Data::new(RequestLimiter::new(config.rate_limit.clone()));
    let environment = config.environment;
    let payload_limit = config.server.max_payload_size;
    let bind_address = config.server.bind_address();

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(limiter.clone())
            .app_data(json_config(payload_limit))
            .wrap(SecurityHeaders::new(environment.is_production()))
            .wrap(create_cors(environment))
            .wrap(TracingLogger::default())
            .configure(
                configure::<PrimaryBackend, SmsOtpDelivery, BanBackend, IdentityService<UserBackend>>,
            )
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    info!(address = %bind_address, "Listening");
    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("Server stopped");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_file(logging.source_location)
        .with_line_number(logging.source_location);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

async fn build_primary(cache: &CacheConfig) -> anyhow::Result<PrimaryBackend> {
    match cache.cache_type {
        CacheType::Redis => {
            let store = RedisPrimaryStore::connect(cache.clone())
                .await
                .context("Failed to create Redis primary store")?;
            store.start_health_check();
            Ok(PrimaryBackend::Redis(store))
        }
        CacheType::Memory => {
            warn!("Using the in-process primary store; codes are lost on restart");
            Ok(PrimaryBackend::Memory(InMemoryPrimaryStore::new()))
        }
    }
}

async fn build_repositories(
    database: Option<&DatabaseConfig>,
) -> anyhow::Result<(BanBackend, UserBackend, Option<DatabasePool>)> {
    let Some(database) = database else {
        warn!("DATABASE_URL is not set; bans and users are kept in memory");
        return Ok((
            BanBackend::Memory(InMemoryBanRepository::new()),
            UserBackend::Memory(InMemoryUserRepository::new()),
            None,
        ));
    };

    let pool = DatabasePool::new(database)
        .await
        .context("Failed to connect to the database")?;
    pool.run_migrations()
        .await
        .context("Failed to prepare database tables")?;
    info!(stats = %pool.get_statistics(), "Database ready");

    Ok((
        BanBackend::MySql(MySqlBanRepository::new(pool.get_pool().clone())),
        UserBackend::MySql(MySqlUserRepository::new(pool.get_pool().clone())),
        Some(pool),
    ))
}
