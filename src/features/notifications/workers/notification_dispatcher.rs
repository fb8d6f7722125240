use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

use crate::core::error::Result;
use crate::features::notifications::models::IncidentEvent;

/// Maximum delivery attempts before an event is parked as failed
const MAX_RETRIES: i32 = 3;

/// Delay between dispatch batches
const BATCH_INTERVAL_SECS: u64 = 5;

/// Events picked up per batch
const BATCH_SIZE: i64 = 10;

/// Background worker that drains the incident_events outbox into
/// per-user notifications.
///
/// Each event fans out to every registered user, the reporter included.
/// The unique (event_id, user_id) index makes a redelivery after a crash
/// a no-op, so an event is never fanned out twice to the same user.
pub struct NotificationDispatcher {
    pool: PgPool,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the dispatcher in a background loop
    pub async fn run(&self) {
        tracing::info!("Starting notification dispatcher worker");

        let mut interval = interval(Duration::from_secs(BATCH_INTERVAL_SECS));

        loop {
            interval.tick().await;

            if let Err(e) = self.process_batch().await {
                tracing::error!("Error dispatching notification batch: {:?}", e);
            }
        }
    }

    /// Dispatch a batch of pending outbox events
    async fn process_batch(&self) -> Result<()> {
        let events = self.fetch_pending().await?;

        if events.is_empty() {
            return Ok(());
        }

        tracing::info!("Dispatching {} pending incident events", events.len());

        for event in events {
            if let Err(e) = self.dispatch_event(&event).await {
                tracing::error!("Failed to dispatch incident event {}: {:?}", event.id, e);
                self.mark_failed(&event, &e.to_string()).await?;
            }
        }

        Ok(())
    }

    async fn fetch_pending(&self) -> Result<Vec<IncidentEvent>> {
        let events = sqlx::query_as::<_, IncidentEvent>(
            r#"
            SELECT id, incident_id, event_type, message, revision, attempts
            FROM incident_events
            WHERE status = 'pending' AND attempts < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(MAX_RETRIES)
        .bind(BATCH_SIZE)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    /// Fan one event out to all users and mark it processed, atomically.
    async fn dispatch_event(&self, event: &IncidentEvent) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let fanned_out = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, event_id, type, message, incident_id)
            SELECT u.id, $1, $2, $3, $4 FROM users u
            ON CONFLICT (event_id, user_id) DO NOTHING
            "#,
        )
        .bind(event.id)
        .bind(event.event_type)
        .bind(&event.message)
        .bind(event.incident_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE incident_events
            SET status = 'processed', attempts = attempts + 1, processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            event_id = %event.id,
            incident_id = %event.incident_id,
            revision = event.revision,
            recipients = fanned_out.rows_affected(),
            "Dispatched incident event"
        );
        Ok(())
    }

    /// Record a delivery failure. The event stays pending until the
    /// retry budget runs out, then it is parked as failed.
    async fn mark_failed(&self, event: &IncidentEvent, error: &str) -> Result<()> {
        let attempts = event.attempts + 1;
        let exhausted = attempts >= MAX_RETRIES;
        if exhausted {
            tracing::warn!(event_id = %event.id, attempts, "Retry budget spent, parking event as failed");
        }

        sqlx::query(
            r#"
            UPDATE incident_events
            SET attempts = $2,
                last_error = $3,
                status = CASE WHEN $4 THEN 'failed'::event_status ELSE status END
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(attempts)
        .bind(error)
        .bind(exhausted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
