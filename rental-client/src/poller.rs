//! Notification Poller
//!
//! Background task with two states. It is idle while no session is active
//! and polls while one is (authenticated or token-only). While polling it
//! periodically syncs reservations and the unread counter, diffs the
//! reservation snapshot by id, and reports every change on the Snackbar
//! and the change channel.
//!
//! Poll failures are logged at debug level and never stop the loop.

use std::collections::HashMap;
use std::time::Duration;

use shared::EntityId;
use shared::models::{Reservation, ReservationStatus};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;
use crate::session::{Session, SessionState};
use crate::snackbar::Snackbar;

/// Capacity of the change channel; slow receivers see `Lagged`
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What changed about a reservation between two polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    StatusChanged {
        from: ReservationStatus,
        to: ReservationStatus,
    },
}

/// One detected reservation change
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationChange {
    pub id: EntityId,
    pub dept_id: EntityId,
    pub kind: ChangeKind,
}

impl ReservationChange {
    /// User-facing description
    pub fn message(&self) -> String {
        match self.kind {
            ChangeKind::Created => format!("New reservation #{}", self.id),
            ChangeKind::StatusChanged { to, .. } => {
                format!("Reservation #{} is now {}", self.id, to)
            }
        }
    }
}

/// Diff two snapshots by id
///
/// Reports ids absent from `previous` and ids whose status changed, in the
/// order of `current`. Removed ids are not reported.
pub fn diff_reservations(
    previous: &[Reservation],
    current: &[Reservation],
) -> Vec<ReservationChange> {
    let known: HashMap<&str, ReservationStatus> = previous
        .iter()
        .map(|reservation| (reservation.id.as_str(), reservation.status))
        .collect();

    current
        .iter()
        .filter_map(|reservation| {
            let kind = match known.get(reservation.id.as_str()) {
                None => ChangeKind::Created,
                Some(&from) if from != reservation.status => ChangeKind::StatusChanged {
                    from,
                    to: reservation.status,
                },
                Some(_) => return None,
            };
            Some(ReservationChange {
                id: reservation.id.clone(),
                dept_id: reservation.dept_id.clone(),
                kind,
            })
        })
        .collect()
}

fn is_active(session: &Session) -> bool {
    matches!(
        session.state,
        SessionState::Authenticated | SessionState::Degraded
    )
}

fn interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Notification Poller task
pub struct NotificationPoller {
    gateway: Gateway,
    snackbar: Snackbar,
    changes: broadcast::Sender<ReservationChange>,
    reservation_interval: Duration,
    unread_interval: Duration,
    shutdown: CancellationToken,
}

impl NotificationPoller {
    pub fn new(
        gateway: Gateway,
        snackbar: Snackbar,
        changes: broadcast::Sender<ReservationChange>,
        reservation_interval: Duration,
        unread_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            snackbar,
            changes,
            reservation_interval,
            unread_interval,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main loop: idle until a session is active, poll until it ends
    pub async fn run(self) {
        tracing::info!("Notification poller started");
        let mut session_rx = self.gateway.session().subscribe();

        loop {
            let token = {
                let session = session_rx.borrow_and_update();
                is_active(&session).then(|| session.token.clone())
            };

            match token {
                None => {
                    tokio::select! {
                        changed = session_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = self.shutdown.cancelled() => break,
                    }
                }
                Some(token) => {
                    if !self.poll_session(&mut session_rx, token).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("Notification poller stopped");
    }

    /// Poll while the session that holds `token` stays active
    ///
    /// Returns false on shutdown.
    async fn poll_session(
        &self,
        session_rx: &mut watch::Receiver<Session>,
        token: Option<String>,
    ) -> bool {
        tracing::debug!("Polling started");
        let mut reservations = interval(self.reservation_interval);
        let mut unread = interval(self.unread_interval);
        let mut unread_baseline = false;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    let session = session_rx.borrow();
                    if !is_active(&session) || session.token != token {
                        tracing::debug!("Polling stopped");
                        return true;
                    }
                }
                _ = reservations.tick() => self.poll_reservations().await,
                _ = unread.tick() => self.poll_unread(&mut unread_baseline).await,
            }
        }
    }

    async fn poll_reservations(&self) {
        let sync = match self.gateway.sync_reservations(true).await {
            Ok(sync) => sync,
            Err(e) => {
                tracing::debug!(error = %e, "Reservation poll failed");
                return;
            }
        };

        if !sync.had_baseline {
            tracing::debug!(count = sync.current.len(), "Reservation baseline established");
            return;
        }

        for change in diff_reservations(&sync.previous, &sync.current) {
            tracing::info!(id = %change.id, kind = ?change.kind, "Reservation change detected");
            self.snackbar.show(change.message());
            // No receivers is fine
            let _ = self.changes.send(change);
        }
    }

    async fn poll_unread(&self, baseline: &mut bool) {
        match self.gateway.read_unread_count(true).await {
            Ok((previous, current)) => {
                if *baseline && current > previous {
                    self.snackbar
                        .show(format!("You have {} unread notifications", current));
                }
                *baseline = true;
            }
            Err(e) => tracing::debug!(error = %e, "Unread count poll failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(id: u32, status: ReservationStatus) -> Reservation {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "deptId": 10,
            "status": status.as_str(),
        }))
        .unwrap()
    }

    #[test]
    fn test_diff_reports_new_and_changed() {
        let old = vec![reservation(1, ReservationStatus::Pending)];
        let new = vec![
            reservation(1, ReservationStatus::Approved),
            reservation(2, ReservationStatus::Pending),
        ];

        let changes = diff_reservations(&old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].id, "1");
        assert_eq!(
            changes[0].kind,
            ChangeKind::StatusChanged {
                from: ReservationStatus::Pending,
                to: ReservationStatus::Approved
            }
        );
        assert_eq!(changes[1].id, "2");
        assert_eq!(changes[1].kind, ChangeKind::Created);

        // same snapshot again: nothing new
        let again = vec![reservation(1, ReservationStatus::Approved)];
        assert!(diff_reservations(&new, &again).is_empty());
    }

    #[test]
    fn test_diff_ignores_removed_and_unchanged() {
        let old = vec![
            reservation(1, ReservationStatus::Pending),
            reservation(2, ReservationStatus::Confirmed),
        ];
        let new = vec![reservation(2, ReservationStatus::Confirmed)];
        assert!(diff_reservations(&old, &new).is_empty());
    }

    #[test]
    fn test_change_messages() {
        let created = ReservationChange {
            id: EntityId::from("7"),
            dept_id: EntityId::from("1"),
            kind: ChangeKind::Created,
        };
        assert_eq!(created.message(), "New reservation #7");

        let changed = ReservationChange {
            kind: ChangeKind::StatusChanged {
                from: ReservationStatus::Pending,
                to: ReservationStatus::Rejected,
            },
            ..created
        };
        assert_eq!(changed.message(), "Reservation #7 is now rejected");
    }
}
