use std::collections::BTreeSet;
use std::sync::Arc;

use handicap::PlayerId;
use tokio::sync::{mpsc, Mutex};

use super::{PlayerFailure, RebuildReport, RecomputeService};
use crate::persistence::{Persistence, PersistenceError, PlayerRepository};

const JOB_QUEUE_CAPACITY: usize = 64;

/// Result of one player's job, sent back to the coordinator.
struct JobOutcome {
    player_id: PlayerId,
    failure: Option<String>,
}

/// Recompute every player's timeline on a pool of `worker_count` tasks.
///
/// A player that fails is recorded in the report; the rest of the batch
/// carries on.
pub async fn rebuild_all<D: Persistence>(
    service: Arc<RecomputeService<D>>,
    worker_count: usize,
) -> Result<RebuildReport, PersistenceError> {
    let players: Vec<PlayerId> = service
        .repositories()
        .players
        .list_players()
        .await?
        .into_iter()
        .map(|p| p.player_id)
        .collect();
    let worker_count = worker_count.max(1);
    tracing::info!(players = players.len(), workers = worker_count, "Starting rebuild");

    let (job_tx, job_rx) = mpsc::channel::<PlayerId>(JOB_QUEUE_CAPACITY);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<JobOutcome>();
    let shared_rx = Arc::new(Mutex::new(job_rx));

    let mut handles = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let rx = shared_rx.clone();
        let service = service.clone();
        let results = result_tx.clone();
        handles.push(tokio::spawn(async move {
            run_rebuild_worker(worker_id, rx, service, results).await;
        }));
    }
    drop(result_tx);

    let jobs = players.clone();
    tokio::spawn(async move {
        for player in jobs {
            if job_tx.send(player).await.is_err() {
                tracing::warn!("All rebuild workers stopped, abandoning queue");
                break;
            }
        }
    });

    let mut pending: BTreeSet<PlayerId> = players.into_iter().collect();
    let mut report = RebuildReport::default();
    while let Some(outcome) = result_rx.recv().await {
        pending.remove(&outcome.player_id);
        match outcome.failure {
            None => report.succeeded.push(outcome.player_id),
            Some(reason) => report.failed.push(PlayerFailure {
                player_id: outcome.player_id,
                reason,
            }),
        }
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Rebuild worker panicked: {}", e);
        }
    }

    // Players picked up by a worker that panicked never reported back.
    report.failed.extend(pending.into_iter().map(|player_id| PlayerFailure {
        player_id,
        reason: "rebuild worker stopped before finishing".to_string(),
    }));

    report.succeeded.sort();
    report.failed.sort_by_key(|f| f.player_id);
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Rebuild finished"
    );
    Ok(report)
}

/// A long-lived worker task. Receives players from the shared channel and
/// recomputes them one at a time.
async fn run_rebuild_worker<D: Persistence>(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<PlayerId>>>,
    service: Arc<RecomputeService<D>>,
    results: mpsc::UnboundedSender<JobOutcome>,
) {
    tracing::debug!(worker_id, "Rebuild worker started");

    loop {
        let player_id = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(player) => player,
                None => {
                    tracing::debug!(worker_id, "Job channel closed, worker exiting");
                    break;
                }
            }
        };

        let failure = match service.recompute_player_timeline(player_id).await {
            Ok(result) if result.is_ok() => {
                tracing::debug!(worker_id, player_id = %player_id, "Player rebuilt");
                None
            }
            Ok(result) => {
                let reason = result
                    .errors
                    .iter()
                    .map(|d| d.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                tracing::error!(worker_id, player_id = %player_id, "Player rebuild failed: {}", reason);
                Some(reason)
            }
            Err(e) => {
                tracing::error!(worker_id, player_id = %player_id, "Player rebuild failed: {}", e);
                Some(e.to_string())
            }
        };

        if results.send(JobOutcome { player_id, failure }).is_err() {
            break;
        }
    }
}
