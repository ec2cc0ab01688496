use chrono::Utc;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};

use crate::app::RefreshOutcome;
use crate::error::GatewayError;
use crate::k8s::ClusterGateway;
use crate::model::Selection;

/// Runs a gateway call under the transport deadline. An elapsed deadline
/// becomes a timeout-kind transport error.
pub async fn bounded<T, F>(limit: Duration, what: impl Display, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::timeout(what)),
    }
}

/// Periodic row refresh for whatever selection the view currently shows.
///
/// The view publishes its selection through a watch channel. Every tick
/// reads it and lists that kind and scope; a changed selection counts as an
/// extra tick. At most one list call is in flight, ticks that land while
/// one is pending are skipped, and a selection that changed meanwhile is
/// fetched as soon as the pending call completes.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn<G: ClusterGateway>(
        gateway: Arc<G>,
        selection: watch::Receiver<Selection>,
        outcomes: mpsc::UnboundedSender<RefreshOutcome>,
        period: Duration,
        request_timeout: Duration,
    ) -> Self {
        let handle = tokio::spawn(run(gateway, selection, outcomes, period, request_timeout));
        Self { handle }
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run<G: ClusterGateway>(
    gateway: Arc<G>,
    mut selection: watch::Receiver<Selection>,
    outcomes: mpsc::UnboundedSender<RefreshOutcome>,
    period: Duration,
    request_timeout: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if outcomes.is_closed() {
                    break;
                }
                if in_flight.is_empty() {
                    let current = selection.borrow().clone();
                    issue(&mut in_flight, &gateway, current, &outcomes, request_timeout);
                } else {
                    debug!("refresh still in flight, skipping tick");
                }
            }
            changed = selection.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = selection.borrow_and_update().clone();
                if in_flight.is_empty() {
                    issue(&mut in_flight, &gateway, current, &outcomes, request_timeout);
                    ticker.reset();
                }
            }
            Some(joined) = in_flight.join_next() => {
                let finished = match joined {
                    Ok(finished) => finished,
                    Err(error) => {
                        warn!("refresh task failed: {error}");
                        continue;
                    }
                };
                let current = selection.borrow().clone();
                if current != finished {
                    debug!("selection moved to {current} while {finished} was loading");
                    issue(&mut in_flight, &gateway, current, &outcomes, request_timeout);
                    ticker.reset();
                }
            }
        }
    }
}

fn issue<G: ClusterGateway>(
    in_flight: &mut JoinSet<Selection>,
    gateway: &Arc<G>,
    selection: Selection,
    outcomes: &mpsc::UnboundedSender<RefreshOutcome>,
    request_timeout: Duration,
) {
    let gateway = Arc::clone(gateway);
    let outcomes = outcomes.clone();
    debug!("refreshing {selection}");
    in_flight.spawn(async move {
        let what = format!("{} list", selection.kind.title());
        let result = bounded(
            request_timeout,
            what,
            gateway.list(selection.kind, &selection.scope),
        )
        .await;
        if let Err(error) = &result {
            warn!("refresh of {selection} failed: {error}");
        }
        let _ = outcomes.send(RefreshOutcome::Rows {
            selection: selection.clone(),
            fetched_at: Utc::now(),
            result,
        });
        selection
    });
}
