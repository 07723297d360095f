use crate::config::Config;
use crate::errors::GatewayError;
use aws_config::{BehaviorVersion, SdkConfig};
use axum::Router;
use axum::routing::get;
use log_insights::LogPipeline;
use log_insights::api::{LogApiState, routes as log_routes};
use log_insights::backend::{CloudWatchBackend, LogSearchBackend, MemoryBackend};
use log_insights::config::BackendType;
use notify::api::{NotifyState, routes as notify_routes};
use notify::config::TopicType;
use notify::topic::{MemoryTopic, NotificationTopic, SnsTopic};
use queue::api::{QueueState, routes as queue_routes};
use queue::backend::{MemoryQueue, MessageQueue, SqsQueue};
use queue::config::QueueType;
use std::net::SocketAddr;
use std::sync::Arc;
use todo::api::{TodoState, routes as todo_routes};
use todo::config::StoreType;
use todo::store::{DynamoDbStore, MemoryStore, TodoStore};
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use weather::WeatherClient;
use weather::api::{WeatherState, routes as weather_routes};

pub const HEALTH_PATH: &str = "/health";

pub async fn serve(config: Config) -> Result<(), GatewayError> {
    let app = build_router(&config).await?;

    let addr = format!("{}:{}", config.listener.host, config.listener.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shut down");
    Ok(())
}

pub async fn run_lambda(config: Config) -> Result<(), GatewayError> {
    let app = build_router(&config).await?;
    lambda_http::run(app)
        .await
        .map_err(|e| GatewayError::Lambda(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
    }
}

/// AWS credentials and region, loaded once on first use. Setups with only
/// in-memory backends never load them.
#[derive(Default)]
struct Aws {
    config: OnceCell<SdkConfig>,
}

impl Aws {
    async fn config(&self) -> &SdkConfig {
        self.config
            .get_or_init(|| aws_config::load_defaults(BehaviorVersion::latest()))
            .await
    }
}

/// Builds the configured backends and mounts the optional endpoints.
async fn build_router(config: &Config) -> Result<Router, GatewayError> {
    let aws = Aws::default();
    let log_state = match &config.log_api.backend {
        BackendType::CloudWatch => {
            let client = aws_sdk_cloudwatchlogs::Client::new(aws.config().await);
            log_state(Arc::new(CloudWatchBackend::new(client)), config)
        }
        BackendType::Memory { capacity } => {
            let backend = Arc::new(MemoryBackend::with_capacity(*capacity));
            tracing::warn!(capacity, "Using in-memory log backend");
            log_state(backend.clone(), config).with_capture(backend)
        }
    };

    let mut app = router(log_state, config)?;
    if let Some(todo_config) = &config.todo {
        app = app.merge(todo_routes(todo_state(todo_config, &aws).await));
    }
    if let Some(notify_config) = &config.notify {
        app = app.merge(notify_routes(notify_state(notify_config, &aws).await));
    }
    if let Some(queue_config) = &config.queue {
        app = app.merge(queue_routes(queue_state(queue_config, &aws).await));
    }
    Ok(app)
}

fn log_state(backend: Arc<dyn LogSearchBackend>, config: &Config) -> LogApiState {
    let pipeline = LogPipeline::new(backend, &config.log_api);
    LogApiState::new(pipeline, config.log_api.expose_backend_errors)
}

async fn todo_state(config: &todo::config::Config, aws: &Aws) -> TodoState {
    let store: Arc<dyn TodoStore> = match config.backend {
        StoreType::DynamoDb => {
            let client = aws_sdk_dynamodb::Client::new(aws.config().await);
            Arc::new(DynamoDbStore::new(client, &config.table_name))
        }
        StoreType::Memory => {
            tracing::warn!("Using in-memory todo store");
            Arc::new(MemoryStore::default())
        }
    };
    tracing::info!(store = store.name(), table = %config.table_name, "Todo endpoint enabled");
    TodoState::new(store, config)
}

async fn notify_state(config: &notify::config::Config, aws: &Aws) -> NotifyState {
    let topic: Arc<dyn NotificationTopic> = match config.backend {
        TopicType::Sns => {
            let client = aws_sdk_sns::Client::new(aws.config().await);
            Arc::new(SnsTopic::new(client, &config.topic_arn))
        }
        TopicType::Memory => {
            tracing::warn!("Using in-memory notification topic");
            Arc::new(MemoryTopic::default())
        }
    };
    tracing::info!(topic = topic.name(), "Notify endpoint enabled");
    NotifyState::new(topic)
}

async fn queue_state(config: &queue::config::Config, aws: &Aws) -> QueueState {
    let queue: Arc<dyn MessageQueue> = match config.backend {
        QueueType::Sqs => {
            let client = aws_sdk_sqs::Client::new(aws.config().await);
            Arc::new(SqsQueue::new(client, &config.queue_url))
        }
        QueueType::Memory => {
            tracing::warn!("Using in-memory message queue");
            Arc::new(MemoryQueue::default())
        }
    };
    tracing::info!(queue = queue.name(), "Queue endpoint enabled");
    QueueState::new(queue, config)
}

fn router(log_state: LogApiState, config: &Config) -> Result<Router, GatewayError> {
    let weather_client = WeatherClient::new(&config.weather)?;
    let weather_state = WeatherState::new(weather_client, config.weather.default_city.clone());

    Ok(Router::new()
        .route(HEALTH_PATH, get(|| async { "ok\n" }))
        .merge(log_routes(log_state))
        .merge(weather_routes(weather_state)))
}
