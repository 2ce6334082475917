use redis::AsyncCommands;
use redis::Client;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::db::KeyValueStore;
use crate::error::{AppError, AppResult};

/// Creates a Redis client for investor data
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Mutation for the background writer
enum StoreWrite {
    Set { key: String, value: String },
    Delete { key: String },
}

impl StoreWrite {
    fn key(&self) -> &str {
        match self {
            StoreWrite::Set { key, .. } | StoreWrite::Delete { key } => key,
        }
    }
}

/// A write plus the channel its outcome is reported on
struct PendingWrite {
    write: StoreWrite,
    applied_tx: oneshot::Sender<AppResult<()>>,
}

/// Redis-backed store whose writes are applied by a background task
///
/// Reads go straight to Redis. Writes go through a single channel so they land
/// in the order they were issued, and `set`/`delete` return only once Redis has
/// applied them. A read issued after a write returns therefore sees that write.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Handle for gracefully shutting down the store writer
pub struct StoreWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl StoreWriterHandle {
    /// Signals the writer task and waits until pending writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Store writer shutdown signal sent");

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Store writer task failed");
        }
    }
}

impl RedisStore {
    /// Creates a new store and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, StoreWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, StoreWriterHandle { shutdown_tx, task })
    }

    /// Applies writes until shutdown, then drains whatever is left
    async fn writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Store writer task started");

        loop {
            tokio::select! {
                Some(pending) = write_rx.recv() => {
                    Self::apply_and_report(&client, pending).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    tracing::info!("Store writer shutting down, flushing remaining writes");

                    while let Some(pending) = write_rx.recv().await {
                        Self::apply_and_report(&client, pending).await;
                    }

                    tracing::info!("Store writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply_and_report(client: &Client, pending: PendingWrite) {
        let PendingWrite { write, applied_tx } = pending;
        let key = write.key().to_string();
        let result = Self::apply(client, write).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, key = %key, "Failed to write to Redis store");
        }
        // the caller may have gone away
        let _ = applied_tx.send(result);
    }

    async fn apply(client: &Client, write: StoreWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match write {
            StoreWrite::Set { key, value } => {
                let _: () = conn.set(key, value).await?;
            }
            StoreWrite::Delete { key } => {
                let _: () = conn.del(key).await?;
            }
        }
        Ok(())
    }

    /// Hands a write to the writer task and waits until it has been applied
    async fn submit(&self, write: StoreWrite) -> AppResult<()> {
        let (applied_tx, applied_rx) = oneshot::channel();
        self.write_tx
            .send(PendingWrite { write, applied_tx })
            .map_err(|_| {
                tracing::error!("Failed to queue store write");
                AppError::Internal("Store writer is not running".to_string())
            })?;

        applied_rx.await.map_err(|_| {
            AppError::Internal("Store writer stopped before applying the write".to_string())
        })?
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.submit(StoreWrite::Set {
            key: key.to_string(),
            value,
        })
        .await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.submit(StoreWrite::Delete {
            key: key.to_string(),
        })
        .await
    }
}
