//! Reservations

use std::collections::HashSet;

use shared::EntityId;
use shared::models::{
    Reservation, ReservationCreate, ReservationStatus, ReservationUpdate, Role, StatusUpdate,
};
use shared::permissions::Capability;

use super::{Gateway, find_created};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiRequest;
use crate::payload;

const LIST_KEYS: &[&str] = &["reservations", "items", "results"];
const ENTITY_KEYS: &[&str] = &["reservation"];

/// Result of one reservation sync
#[derive(Debug, Clone)]
pub(crate) struct ReservationSync {
    pub previous: Vec<Reservation>,
    pub current: Vec<Reservation>,
    /// The cache held a fetched snapshot before this sync
    pub had_baseline: bool,
}

impl Gateway {
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.inner.caches.reservations.snapshot().await
    }

    pub async fn reservation(&self, id: impl Into<EntityId>) -> Option<Reservation> {
        let id = id.into();
        self.inner.caches.reservations.get(id.as_str()).await
    }

    /// Fetch reservations visible to the current user, replacing the cache
    ///
    /// Admins and above see every reservation; users see their own.
    pub async fn fetch_reservations(&self) -> ClientResult<Vec<Reservation>> {
        Ok(self.sync_reservations(false).await?.current)
    }

    /// Fetch and swap the cached snapshot, returning both sides
    ///
    /// The snapshot is discarded if the session changed while fetching.
    pub(crate) async fn sync_reservations(&self, quiet: bool) -> ClientResult<ReservationSync> {
        let token = self.require_token()?;
        let path = if self.inner.session.has_role_at_least(Role::Admin) {
            "reservations"
        } else {
            "reservations/my"
        };
        let request = ApiRequest::get(path);
        let body = if quiet {
            self.send_quiet(request).await?
        } else {
            self.send("fetch_reservations", request).await?
        };
        let current: Vec<Reservation> = payload::list_of(body, LIST_KEYS, "reservations")?;
        if self.inner.session.token().as_deref() != Some(token.as_str()) {
            return Err(ClientError::NotAuthenticated);
        }
        let (previous, had_baseline) = self
            .inner
            .caches
            .reservations
            .swap(current.clone())
            .await;
        Ok(ReservationSync {
            previous,
            current,
            had_baseline,
        })
    }

    pub async fn create_reservation(&self, create: ReservationCreate) -> ClientResult<Reservation> {
        self.guard(Capability::CreateReservation)?;
        create.validate()?;

        let known: HashSet<EntityId> = self
            .reservations()
            .await
            .into_iter()
            .map(|reservation| reservation.id)
            .collect();
        let request = ApiRequest::post("reservations").json(&create)?;
        let body = self.send("create_reservation", request).await?;

        let reservation = match payload::entity_of::<Reservation>(body, ENTITY_KEYS) {
            Some(reservation) => {
                self.inner
                    .caches
                    .reservations
                    .upsert(reservation.clone())
                    .await;
                reservation
            }
            None => self.resolve_created_reservation(&known, create).await,
        };
        tracing::info!(id = %reservation.id, dept_id = %reservation.dept_id, "Reservation created");
        Ok(reservation)
    }

    pub async fn update_reservation(
        &self,
        id: impl Into<EntityId>,
        update: ReservationUpdate,
    ) -> ClientResult<Reservation> {
        let id = id.into();
        self.guard(Capability::EditReservation)?;
        update.validate()?;

        let request = ApiRequest::put(format!("reservations/{}", id)).json(&update)?;
        let body = self.send("update_reservation", request).await?;
        self.merge_reservation(&id, body, |reservation| reservation.apply(&update))
            .await
    }

    /// Created on the server but not echoed: re-read the reservations
    ///
    /// When the new record cannot be identified the submitted fields are
    /// returned under an empty id and nothing is cached.
    async fn resolve_created_reservation(
        &self,
        known: &HashSet<EntityId>,
        create: ReservationCreate,
    ) -> Reservation {
        match self.fetch_reservations().await {
            Ok(reservations) => {
                if let Some(reservation) = find_created(known, reservations, |r| {
                    r.dept_id == create.dept_id && r.date == create.date
                }) {
                    return reservation;
                }
                tracing::warn!("Created reservation not found after re-fetch");
            }
            Err(e) => tracing::warn!(error = %e, "Re-fetch after create failed"),
        }
        create.into_reservation(EntityId::default())
    }

    /// Fetch one reservation and merge it into the cache
    pub async fn fetch_reservation(&self, id: impl Into<EntityId>) -> ClientResult<Reservation> {
        let id = id.into();
        self.require_token()?;
        let body = self
            .send(
                "fetch_reservation",
                ApiRequest::get(format!("reservations/{}", id)),
            )
            .await?;
        let reservation: Reservation = payload::entity_of(body, ENTITY_KEYS).ok_or_else(|| {
            ClientError::InvalidResponse(format!("reservation {} missing from response", id))
        })?;
        self.inner
            .caches
            .reservations
            .upsert(reservation.clone())
            .await;
        Ok(reservation)
    }

    /// Server-authoritative status transition (managers only)
    pub async fn update_reservation_status(
        &self,
        id: impl Into<EntityId>,
        status: ReservationStatus,
    ) -> ClientResult<Reservation> {
        let id = id.into();
        self.guard(Capability::ManageReservations)?;

        let request = ApiRequest::patch(format!("reservations/{}/status", id))
            .json(&StatusUpdate { status })?;
        let body = self.send("update_reservation_status", request).await?;
        let reservation = self
            .merge_reservation(&id, body, |reservation| reservation.status = status)
            .await?;
        tracing::info!(id = %id, status = %reservation.status, "Reservation status updated");
        Ok(reservation)
    }

    /// Cancel an own reservation
    pub async fn cancel_reservation(&self, id: impl Into<EntityId>) -> ClientResult<Reservation> {
        let id = id.into();
        self.guard(Capability::EditReservation)?;

        let request = ApiRequest::put(format!("reservations/{}/cancel", id));
        let body = self.send("cancel_reservation", request).await?;
        self.merge_reservation(&id, body, |reservation| {
            reservation.status = ReservationStatus::Cancelled
        })
        .await
    }

    pub async fn delete_reservation(&self, id: impl Into<EntityId>) -> ClientResult<()> {
        let id = id.into();
        self.guard(Capability::DeleteReservation)?;
        self.send(
            "delete_reservation",
            ApiRequest::delete(format!("reservations/{}", id)),
        )
        .await?;
        self.inner.caches.reservations.remove(id.as_str()).await;
        Ok(())
    }

    /// Prefer the echoed record, else patch the cached one, else re-fetch it
    async fn merge_reservation<F>(
        &self,
        id: &EntityId,
        body: serde_json::Value,
        patch: F,
    ) -> ClientResult<Reservation>
    where
        F: FnOnce(&mut Reservation),
    {
        let cache = &self.inner.caches.reservations;
        if let Some(reservation) = payload::entity_of::<Reservation>(body, ENTITY_KEYS) {
            cache.upsert(reservation.clone()).await;
            return Ok(reservation);
        }
        if cache.update(id.as_str(), patch).await
            && let Some(reservation) = cache.get(id.as_str()).await
        {
            return Ok(reservation);
        }
        self.fetch_reservation(id).await
    }
}
