use std::sync::Arc;

use auth::TokenIssuer;
use auth::TokenLifetime;
use identity_service::config::Config;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::user::models::CreateUserCommand;
use identity_service::domain::user::models::EmailAddress;
use identity_service::domain::user::models::Pagination;
use identity_service::domain::user::models::UserQuery;
use identity_service::domain::user::ports::UserServicePort;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::messaging::KafkaMessageServer;
use identity_service::inbound::messaging::MessageRouter;
use identity_service::outbound::messaging::Bus;
use identity_service::outbound::messaging::BusEventPublisher;
use identity_service::outbound::messaging::KafkaTransport;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    let token_lifetime: TokenLifetime = config.jwt.expire_in.parse()?;

    tracing::info!(
        kafka_brokers = %config.kafka.brokers,
        kafka_group_id = %config.kafka.group_id,
        token_lifetime = %token_lifetime.as_str(),
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let transport = Arc::new(KafkaTransport::new(&config.kafka, &[])?);
    let event_publisher = Arc::new(BusEventPublisher::new(Bus::new(transport)));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));

    let user_service = Arc::new(UserService::new(user_repository, event_publisher));

    if std::env::args().nth(1).as_deref() == Some("seed") {
        return seed_admin(user_service.as_ref()).await;
    }

    let token_issuer = TokenIssuer::new(config.jwt.secret.as_bytes(), token_lifetime);
    let auth_service = Arc::new(AuthService::new(Arc::clone(&user_service), token_issuer));

    let router = Arc::new(MessageRouter::new(auth_service, user_service));
    let server = KafkaMessageServer::new(&config.kafka, router)?;

    let server_task = tokio::spawn(server.start_consuming());
    tracing::info!(protocol = "kafka", "Message server listening");

    tokio::select! {
        result = server_task => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Message server task failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Create the initial administrator when the store is empty.
async fn seed_admin<US: UserServicePort>(user_service: &US) -> Result<(), anyhow::Error> {
    let existing = user_service
        .list_users(UserQuery {
            pagination: Some(Pagination { limit: 1, page: 1 }),
            ..Default::default()
        })
        .await?;
    if existing.total > 0 {
        tracing::info!(users = existing.total, "Store already seeded");
        return Ok(());
    }

    let password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "123456".to_string());

    let admin = user_service
        .create_user(CreateUserCommand {
            first_name: "super".to_string(),
            last_name: Some("admin".to_string()),
            user_name: Some("superadmin".to_string()),
            phone_number: Some("+989212345678".to_string()),
            email: Some(EmailAddress::new("admin@mail.com")?),
            password: Some(password),
            is_verified: true,
            ..Default::default()
        })
        .await?;

    tracing::info!(user_id = %admin.id, "Administrator seeded");
    Ok(())
}
