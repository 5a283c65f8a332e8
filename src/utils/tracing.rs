use axum::{extract::{Request, State}, middleware::Next, response::Response};
use azure_data_cosmos::prelude::{AuthorizationToken, CosmosClient, DatabaseClient};
use serde::Serialize;
use std::{fmt::Write, sync::{Arc, Mutex}};
use time::OffsetDateTime;
use tracing::{field::{Field, Visit}, instrument::WithSubscriber, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, layer::Context, prelude::__tracing_subscriber_SubscriberExt, Layer};
use tracing_log::{AsLog, LogTracer};
use uuid::Uuid;

use crate::config::CosmosSettings;

const TRACES_COLLECTION: &str = "traces";

/// Console output for `tracing` events, with `log` records forwarded at the same level.
pub fn init_logging(level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_max_level(level).try_init()?;
    LogTracer::init_with_filter(level.as_log().to_level_filter())?;
    Ok(())
}

/// Destination of per-request traces.
#[derive(Clone)]
pub struct TraceSink {
    db: DatabaseClient,
    level: Level,
}

/// Connects to the Cosmos DB database request traces are written to.
pub fn cosmos_sink(settings: &CosmosSettings, level: Level) -> Option<TraceSink> {
    let authorization_token = AuthorizationToken::primary_key(&settings.master_key).ok()?;
    let cosmos_client = CosmosClient::new(settings.account.clone(), authorization_token);
    Some(TraceSink {
        db: cosmos_client.database_client(settings.database.clone()),
        level,
    })
}

/// Middleware recording every event a request emits and storing them as one document.
pub async fn cosmos_tracing(
    State(sink): State<TraceSink>,
    request: Request,
    next: Next,
) -> Response {
    // the request runs under its own subscriber, so console output is re-attached here
    let events = EventCollector::new(sink.level);
    let subscriber = tracing_subscriber::registry()
        .with(events.clone())
        .with(fmt::layer().with_filter(LevelFilter::from_level(sink.level)));

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| String::from("/"));
    let method = request.method().to_string();

    let response = next.run(request).with_subscriber(subscriber).await;

    let now = OffsetDateTime::now_utc();
    let trace = RequestTrace {
        id: Uuid::new_v4(),
        time: now,
        method,
        path,
        status: response.status().as_u16(),
        key: now.unix_timestamp() / 60, // partitioned by minutes
        events: events.take(),
    };

    let collection = sink.db.collection_client(TRACES_COLLECTION);
    if let Err(error) = collection.create_document(trace).await {
        tracing::warn!(%error, "could not persist request trace");
    }

    response
}

#[derive(Serialize, Debug)]
pub struct RequestTrace {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub key: i64,
    pub events: Vec<String>,
}

impl azure_data_cosmos::CosmosEntity for RequestTrace {
    type Entity = i64;

    fn partition_key(&self) -> Self::Entity {
        self.key
    }
}

/// Collects formatted events at or above `level`.
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
    level: Level,
}

impl EventCollector {
    pub fn new(level: Level) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            level,
        }
    }

    pub fn take(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.level {
            return;
        }

        let mut fields = FieldWriter::default();
        event.record(&mut fields);

        if let Ok(mut events) = self.events.lock() {
            events.push(format!("{} {}:{}", metadata.level(), metadata.target(), fields.0));
        }
    }
}

#[derive(Default)]
struct FieldWriter(String);

impl Visit for FieldWriter {
    fn record_str(&mut self, field: &Field, value: &str) {
        let _ = write!(self.0, " {}={}", field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let _ = write!(self.0, " {}={:?}", field.name(), value);
    }
}
