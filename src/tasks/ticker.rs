//! Countdown tick source background task

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, error, info};

use crate::state::{AppState, TimerState};

/// Background task that owns the one-second tick source
///
/// The task waits for the engine to enter `Running`, claims the tick source,
/// and decrements once per second until the countdown leaves `Running` or
/// reaches zero. The claim is released on every exit path, so at most one
/// tick source is ever live for the engine.
pub async fn countdown_ticker_task(state: Arc<AppState>) {
    info!("Starting countdown ticker task");

    let mut snapshot_rx = state.subscribe();

    loop {
        let snapshot = *snapshot_rx.borrow_and_update();

        if snapshot.state == TimerState::Running && snapshot.remaining_seconds > 0 {
            let Some(_claim) = state.acquire_tick_claim() else {
                error!("Tick source already claimed, refusing to start another");
                if snapshot_rx.changed().await.is_err() {
                    break;
                }
                continue;
            };
            debug!(
                "Tick source acquired with {}s remaining",
                snapshot.remaining_seconds
            );

            let mut interval = time::interval(Duration::from_secs(1));
            // the first interval tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match state.tick() {
                            Ok(outcome) if outcome.view.remaining_seconds == 0 => {
                                info!("Countdown reached zero");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                error!("Failed to apply tick: {}", e);
                                break;
                            }
                        }
                    }
                    changed = snapshot_rx.changed() => {
                        if changed.is_err() {
                            info!("Snapshot channel closed, stopping ticker");
                            return;
                        }
                        let current = *snapshot_rx.borrow_and_update();
                        if current.state != TimerState::Running || current.remaining_seconds == 0 {
                            debug!("Countdown left running state, releasing tick source");
                            break;
                        }
                    }
                }
            }
            // _claim dropped here releases the tick source
        } else if snapshot_rx.changed().await.is_err() {
            info!("Snapshot channel closed, stopping ticker");
            break;
        }
    }
}
