//! Redis-list job queue and the worker loop that drains it.
//!
//! At-least-once delivery: the envelope carries an attempts counter, and a
//! failed run is re-enqueued with backoff up to `MAX_RETRIES`, restarting
//! from stage 1 (no checkpoint resume). After the last retry the job stays
//! `failed` with the error recorded in its result payload.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::pipeline::{self, PipelineContext};
use crate::evaluation::repo;
use crate::state::AppState;

pub const QUEUE_KEY: &str = "sift:eval:queue";
/// Re-enqueues after the first failed attempt; 3 retries, backoff 1s/2s/4s.
const MAX_RETRIES: u32 = 3;
const POP_TIMEOUT_SECS: f64 = 5.0;

#[derive(Debug, Serialize, Deserialize)]
struct QueueEnvelope {
    job_id: Uuid,
    #[serde(default)]
    attempts: u32,
}

/// Enqueues a freshly created job.
pub async fn enqueue(redis: &redis::Client, job_id: Uuid) -> Result<(), AppError> {
    push(
        redis,
        &QueueEnvelope {
            job_id,
            attempts: 0,
        },
    )
    .await
    .map_err(|e| AppError::Queue(e.to_string()))
}

async fn push(redis: &redis::Client, envelope: &QueueEnvelope) -> Result<(), redis::RedisError> {
    let payload = serde_json::to_string(envelope).expect("envelope serializes");
    let mut conn = redis.get_multiplexed_async_connection().await?;
    conn.lpush::<_, _, ()>(QUEUE_KEY, payload).await?;
    Ok(())
}

/// The worker loop. Spawned once at startup; each popped job runs to
/// completion before the next pop, and concurrent workers stay independent
/// (nothing coordinates across jobs).
pub async fn run(state: AppState) {
    info!("Worker started, listening on {QUEUE_KEY}");
    loop {
        let popped = pop_next(&state.redis).await;
        let envelope = match popped {
            Ok(Some(envelope)) => envelope,
            Ok(None) => continue, // timeout, poll again
            Err(e) => {
                warn!("Queue pop failed: {e}; retrying shortly");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                continue;
            }
        };
        process(&state, envelope).await;
    }
}

async fn pop_next(redis: &redis::Client) -> Result<Option<QueueEnvelope>, redis::RedisError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let popped: Option<(String, String)> = conn.blpop(QUEUE_KEY, POP_TIMEOUT_SECS).await?;
    let Some((_, payload)) = popped else {
        return Ok(None);
    };
    match serde_json::from_str(&payload) {
        Ok(envelope) => Ok(Some(envelope)),
        Err(e) => {
            // Malformed payloads are dropped, not retried forever.
            error!("Dropping malformed queue payload '{payload}': {e}");
            Ok(None)
        }
    }
}

async fn process(state: &AppState, envelope: QueueEnvelope) {
    let job = match repo::get_job(&state.db, envelope.job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            warn!("Dropping queue entry for unknown job {}", envelope.job_id);
            return;
        }
        Err(e) => {
            error!("Failed to load job {}: {e}", envelope.job_id);
            return;
        }
    };

    let ctx = PipelineContext {
        db: state.db.clone(),
        s3: state.s3.clone(),
        bucket: state.config.s3_bucket.clone(),
        evaluator: state.evaluator.clone(),
    };

    match pipeline::run_evaluation(&ctx, &job).await {
        Ok(result) => {
            info!(
                "Job {}: overall score {:.2}",
                job.id, result.overall_score
            );
        }
        Err(e) => {
            if envelope.attempts < MAX_RETRIES {
                let attempts = envelope.attempts + 1;
                let delay = retry_delay_secs(envelope.attempts);
                warn!(
                    "Job {}: attempt {} failed ({e}), retrying in {delay}s",
                    job.id, attempts
                );
                let redis = state.redis.clone();
                let job_id = job.id;
                // Delayed re-enqueue must not block the worker loop.
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
                    if let Err(e) = push(&redis, &QueueEnvelope { job_id, attempts }).await {
                        error!("Job {job_id}: re-enqueue failed: {e}");
                    }
                });
            } else {
                error!(
                    "Job {}: failed after {} attempts, giving up: {e}",
                    job.id,
                    envelope.attempts + 1
                );
            }
        }
    }
}

/// Exponential backoff: 1s, 2s, 4s for attempts 0, 1, 2.
fn retry_delay_secs(prior_attempts: u32) -> u64 {
    1u64 << prior_attempts.min(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(retry_delay_secs(0), 1);
        assert_eq!(retry_delay_secs(1), 2);
        assert_eq!(retry_delay_secs(2), 4);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(retry_delay_secs(40), 64);
    }

    #[test]
    fn test_envelope_roundtrip_and_default_attempts() {
        let envelope = QueueEnvelope {
            job_id: Uuid::new_v4(),
            attempts: 2,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let back: QueueEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.job_id, envelope.job_id);
        assert_eq!(back.attempts, 2);

        // Envelopes enqueued by older writers omit the counter.
        let bare: QueueEnvelope =
            serde_json::from_str(&format!("{{\"job_id\":\"{}\"}}", envelope.job_id)).unwrap();
        assert_eq!(bare.attempts, 0);
    }
}
