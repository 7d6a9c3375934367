//! Seating Assignment View
//!
//! Stand grid of one slot. Every stand is a drop target; reservations are
//! moved between stands by drag and drop, swapped when the target is taken,
//! or booked into a free stand through a client search. Admins also edit
//! the slot's settings and copy its seating into other slots.
//!
//! Nothing is applied speculatively: each action goes to the server and the
//! returned objects are written into the shared cache.

use super::copy_filter::CopyFilter;
use super::{parse_route_id, Banner, ViewError};
use crate::api::{ClientQuery, CopyRequest, ReservationPatch, ReservationUpdate, SlotSettingsPatch, StudioApi};
use crate::cache::{CachedResponse, QueryKey, SharedCache};
use crate::dnd::Transfer;
use crate::model::{
    ClientRow, CopyOutcome, CopyResult, CopyTarget, Instructor, Reservation, ReservationStatus,
    SessionKind, Slot, SlotDetail, Stand,
};
use crate::session::Session;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Minimum query length before the client search is called
pub const MIN_SEARCH_LEN: usize = 2;

/// One stand as rendered in the grid
#[derive(Debug, Clone, PartialEq)]
pub struct StandTile {
    pub stand: Stand,
    /// Reservation bound to the stand, if any
    pub occupant: Option<Reservation>,
    /// Further reservations bound to the same stand
    pub conflicts: Vec<Reservation>,
}

impl StandTile {
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Result of a move request
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Reservation already sat on the target; nothing was sent
    Unchanged,
    /// Reservation moved (or unassigned)
    Moved(ReservationUpdate),
    /// Reservation exchanged stands with `with`
    Swapped {
        with: i64,
        update: ReservationUpdate,
    },
}

/// Slot settings sub-form
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub label: String,
    pub session_kind: SessionKind,
    pub instructor_id: Option<i64>,
}

impl SettingsForm {
    /// Form prefilled from a slot
    pub fn from_slot(slot: &Slot) -> Self {
        Self {
            label: slot.label.clone().unwrap_or_default(),
            session_kind: slot.session_kind,
            instructor_id: slot.instructor_id,
        }
    }

    /// Request body: blank label clears it, instructor only for
    /// instructor-led sessions
    pub fn to_patch(&self) -> SlotSettingsPatch {
        let label = self.label.trim();
        SlotSettingsPatch {
            label: if label.is_empty() {
                None
            } else {
                Some(label.to_string())
            },
            session_kind: self.session_kind,
            instructor_id: match self.session_kind {
                SessionKind::Instructor => self.instructor_id,
                _ => None,
            },
        }
    }
}

/// Outcome of a copy-to-other-slots request
#[derive(Debug, Clone, PartialEq)]
pub struct CopySummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<CopyResult>,
}

/// Which requests are in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub moving: bool,
    pub assigning: bool,
    pub saving_settings: bool,
    pub loading_copy_targets: bool,
    pub copying: bool,
}

#[derive(Debug, Clone, Default)]
struct SearchPanel {
    query: String,
    results: Vec<ClientRow>,
}

#[derive(Debug, Clone, Default)]
struct CopyPanel {
    targets: Vec<CopyTarget>,
    filter: CopyFilter,
    selected: BTreeSet<i64>,
}

#[derive(Debug, Default)]
struct SeatingState {
    banner: Option<Banner>,
    pending: Pending,
    search: HashMap<i64, SearchPanel>,
    copy: CopyPanel,
}

/// Pick the reservation row a client booked into `stand_id` should land on.
///
/// Prefers the reservation already bound to the stand, then the first
/// unassigned `available` reservation, then any unassigned reservation.
pub fn resolve_assignment_target(slot: &Slot, stand_id: i64) -> Option<&Reservation> {
    slot.reservations
        .iter()
        .find(|r| r.stand_id == Some(stand_id))
        .or_else(|| {
            slot.reservations
                .iter()
                .find(|r| r.stand_id.is_none() && r.status == ReservationStatus::Available)
        })
        .or_else(|| slot.reservations.iter().find(|r| r.stand_id.is_none()))
}

/// Stand grid of a single slot
pub struct SeatingView {
    api: Arc<dyn StudioApi>,
    cache: SharedCache,
    session: Session,
    slot_id: i64,
    state: RwLock<SeatingState>,
}

impl SeatingView {
    /// Open the view for a route parameter.
    ///
    /// Invalid identifiers fail before any request. A fresh cached snapshot
    /// is reused; otherwise the slot is fetched.
    pub async fn open(
        api: Arc<dyn StudioApi>,
        cache: SharedCache,
        session: Session,
        route_param: &str,
    ) -> Result<Self, ViewError> {
        let slot_id = parse_route_id(route_param)?;

        let view = Self {
            api,
            cache,
            session,
            slot_id,
            state: RwLock::new(SeatingState::default()),
        };

        let cached = view
            .cache
            .read()
            .await
            .get_fresh(&QueryKey::SlotDetail(slot_id))
            .is_some();

        if cached {
            tracing::debug!(slot_id, "Seating view opened from cache");
        } else {
            view.reload().await?;
        }

        Ok(view)
    }

    pub fn slot_id(&self) -> i64 {
        self.slot_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the slot again and replace the cached snapshot
    pub async fn reload(&self) -> Result<SlotDetail, ViewError> {
        let detail = self.api.slot_detail(self.slot_id).await.map_err(|e| {
            tracing::warn!(slot_id = self.slot_id, error = %e, "Failed to load slot");
            ViewError::LoadFailed(e.user_message("Could not load the slot"))
        })?;

        tracing::info!(
            slot_id = self.slot_id,
            stands = detail.stands.len(),
            reservations = detail.slot.reservations.len(),
            "Slot loaded"
        );

        self.cache.write().await.insert(
            QueryKey::SlotDetail(self.slot_id),
            CachedResponse::SlotDetail(detail.clone()),
        );
        Ok(detail)
    }

    /// Current snapshot of the slot
    pub async fn detail(&self) -> Result<SlotDetail, ViewError> {
        self.cache
            .read()
            .await
            .slot_detail(self.slot_id)
            .cloned()
            .ok_or_else(|| ViewError::Stale("Slot is no longer loaded; reload the view".to_string()))
    }

    /// Whether the cached snapshot was invalidated and should be refetched
    pub async fn is_stale(&self) -> bool {
        self.cache
            .read()
            .await
            .is_stale(&QueryKey::SlotDetail(self.slot_id))
    }

    // ============ Rendering ============

    /// One tile per stand, ordered by sort order then code
    pub async fn tiles(&self) -> Result<Vec<StandTile>, ViewError> {
        let detail = self.detail().await?;

        let mut stands = detail.stands.clone();
        stands.sort_by(|a, b| {
            a.sort_order
                .unwrap_or(i32::MAX)
                .cmp(&b.sort_order.unwrap_or(i32::MAX))
                .then_with(|| a.code.cmp(&b.code))
        });

        let tiles = stands
            .into_iter()
            .map(|stand| {
                let mut bound = detail
                    .slot
                    .reservations
                    .iter()
                    .filter(|r| r.stand_id == Some(stand.id))
                    .cloned();
                let occupant = bound.next();
                let conflicts: Vec<Reservation> = bound.collect();
                if !conflicts.is_empty() {
                    tracing::warn!(
                        slot_id = self.slot_id,
                        stand_id = stand.id,
                        count = conflicts.len() + 1,
                        "Several reservations bound to one stand"
                    );
                }
                StandTile {
                    stand,
                    occupant,
                    conflicts,
                }
            })
            .collect();

        Ok(tiles)
    }

    /// Reservations without a stand
    pub async fn unassigned(&self) -> Result<Vec<Reservation>, ViewError> {
        let detail = self.detail().await?;
        Ok(detail
            .slot
            .reservations
            .into_iter()
            .filter(|r| r.stand_id.is_none())
            .collect())
    }

    pub async fn instructors(&self) -> Result<Vec<Instructor>, ViewError> {
        Ok(self.detail().await?.instructors)
    }

    pub async fn banner(&self) -> Option<Banner> {
        self.state.read().await.banner.clone()
    }

    pub async fn dismiss_banner(&self) {
        self.state.write().await.banner = None;
    }

    pub async fn pending(&self) -> Pending {
        self.state.read().await.pending
    }

    async fn set_pending(&self, update: impl FnOnce(&mut Pending)) {
        update(&mut self.state.write().await.pending);
    }

    async fn show_error(&self, message: String) {
        self.state.write().await.banner = Some(Banner::error(message));
    }

    fn require_admin(&self, action: &'static str) -> Result<(), ViewError> {
        if self.session.is_admin() {
            return Ok(());
        }
        tracing::warn!(
            user = %self.session.user,
            slot_id = self.slot_id,
            action,
            "Blocked non-admin action"
        );
        Err(ViewError::AdminRequired(action))
    }

    // ============ Move / swap ============

    /// Complete a drag-and-drop transfer
    pub async fn drop_transfer(&self, transfer: Transfer) -> Result<MoveOutcome, ViewError> {
        self.move_reservation(transfer.reservation_id, transfer.target.stand_id())
            .await
    }

    /// Move a reservation to a stand, or unassign it with `None`.
    ///
    /// When another reservation holds the target stand the request becomes
    /// a swap carrying both ids.
    pub async fn move_reservation(
        &self,
        reservation_id: i64,
        target_stand: Option<i64>,
    ) -> Result<MoveOutcome, ViewError> {
        self.require_admin("move reservations")?;

        let detail = self.detail().await?;
        let reservation = match detail
            .slot
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
        {
            Some(reservation) => reservation,
            None => {
                let message = format!(
                    "Reservation {} is not in this slot anymore; reload the view",
                    reservation_id
                );
                self.show_error(message.clone()).await;
                return Err(ViewError::Stale(message));
            }
        };

        if reservation.stand_id == target_stand {
            tracing::debug!(reservation_id, ?target_stand, "Drop on current stand ignored");
            return Ok(MoveOutcome::Unchanged);
        }

        if let Some(stand_id) = target_stand {
            if !detail.stands.iter().any(|s| s.id == stand_id) {
                let message = format!("Stand {} does not belong to this slot", stand_id);
                self.show_error(message.clone()).await;
                return Err(ViewError::Stale(message));
            }
        }

        let occupant = target_stand.and_then(|stand_id| {
            detail
                .slot
                .reservations
                .iter()
                .find(|r| r.stand_id == Some(stand_id) && r.id != reservation_id)
                .map(|r| r.id)
        });

        let patch = ReservationPatch::move_to(target_stand, occupant);

        self.set_pending(|p| p.moving = true).await;
        let result = self.api.patch_reservation(reservation_id, &patch).await;
        self.set_pending(|p| p.moving = false).await;

        match result {
            Ok(update) => {
                let touched = self.cache.write().await.apply_reservation_update(&update);
                tracing::info!(
                    slot_id = self.slot_id,
                    reservation_id,
                    ?target_stand,
                    swap_with = ?occupant,
                    snapshots = touched,
                    "Reservation moved"
                );
                if occupant.is_some() && update.swapped_reservation.is_none() && update.slot.is_none()
                {
                    // only one side of the swap came back
                    self.cache.write().await.invalidate_slot(self.slot_id);
                    if let Err(e) = self.reload().await {
                        tracing::warn!(
                            slot_id = self.slot_id,
                            error = %e,
                            "Refetch after partial swap response failed"
                        );
                    }
                }
                self.dismiss_banner().await;
                Ok(match occupant {
                    Some(with) => MoveOutcome::Swapped { with, update },
                    None => MoveOutcome::Moved(update),
                })
            }
            Err(e) => {
                let message = e.user_message("Could not move the reservation");
                tracing::warn!(reservation_id, error = %e, "Move failed");
                self.show_error(message.clone()).await;
                Err(ViewError::Mutation(message))
            }
        }
    }

    // ============ Search and assign ============

    /// Run the client search of a stand's panel.
    ///
    /// Queries shorter than two characters clear the results without a
    /// request.
    pub async fn search_clients(
        &self,
        stand_id: i64,
        query: &str,
    ) -> Result<Vec<ClientRow>, ViewError> {
        let term = query.trim();

        if term.chars().count() < MIN_SEARCH_LEN {
            let mut state = self.state.write().await;
            let panel = state.search.entry(stand_id).or_default();
            panel.query = query.to_string();
            panel.results.clear();
            return Ok(Vec::new());
        }

        let client_query = ClientQuery::search(term);
        let cached = self
            .cache
            .read()
            .await
            .get_fresh(&QueryKey::ClientSearch(client_query.clone()))
            .and_then(|value| match value {
                CachedResponse::ClientSearch(page) => Some(page.clone()),
                _ => None,
            });

        let page = match cached {
            Some(page) => page,
            None => {
                let page = self.api.search_clients(&client_query).await.map_err(|e| {
                    ViewError::Mutation(e.user_message("Client search failed"))
                });
                let page = match page {
                    Ok(page) => page,
                    Err(e) => {
                        self.show_error(e.to_string()).await;
                        return Err(e);
                    }
                };
                self.cache.write().await.insert(
                    QueryKey::ClientSearch(client_query),
                    CachedResponse::ClientSearch(page.clone()),
                );
                page
            }
        };

        let mut state = self.state.write().await;
        let panel = state.search.entry(stand_id).or_default();
        panel.query = query.to_string();
        panel.results = page.items.clone();
        Ok(page.items)
    }

    /// Results currently shown in a stand's search panel
    pub async fn search_results(&self, stand_id: i64) -> Vec<ClientRow> {
        self.state
            .read()
            .await
            .search
            .get(&stand_id)
            .map(|p| p.results.clone())
            .unwrap_or_default()
    }

    pub async fn close_search(&self, stand_id: i64) {
        self.state.write().await.search.remove(&stand_id);
    }

    /// Book a client onto a stand
    pub async fn assign_client(
        &self,
        stand_id: i64,
        client_id: i64,
    ) -> Result<ReservationUpdate, ViewError> {
        let detail = self.detail().await?;

        let target = match resolve_assignment_target(&detail.slot, stand_id) {
            Some(reservation) => reservation.clone(),
            None => {
                let message =
                    "No free reservation left in this slot; reload the view".to_string();
                self.show_error(message.clone()).await;
                return Err(ViewError::Stale(message));
            }
        };

        let bind_stand = if target.stand_id == Some(stand_id) {
            None
        } else {
            Some(stand_id)
        };
        let patch = ReservationPatch::assign_client(client_id, bind_stand);

        self.set_pending(|p| p.assigning = true).await;
        let result = self.api.patch_reservation(target.id, &patch).await;
        self.set_pending(|p| p.assigning = false).await;

        match result {
            Ok(update) => {
                self.cache.write().await.apply_reservation_update(&update);
                tracing::info!(
                    slot_id = self.slot_id,
                    stand_id,
                    client_id,
                    reservation_id = target.id,
                    "Client booked onto stand"
                );
                self.close_search(stand_id).await;
                self.dismiss_banner().await;
                Ok(update)
            }
            Err(e) => {
                let message = e.user_message("Could not book the client");
                tracing::warn!(stand_id, client_id, error = %e, "Booking failed");
                self.show_error(message.clone()).await;
                Err(ViewError::Mutation(message))
            }
        }
    }

    // ============ Settings ============

    /// Save label, session kind and instructor of the slot
    pub async fn update_settings(&self, form: &SettingsForm) -> Result<Slot, ViewError> {
        self.require_admin("change slot settings")?;

        let patch = form.to_patch();

        self.set_pending(|p| p.saving_settings = true).await;
        let result = self.api.update_slot(self.slot_id, &patch).await;
        self.set_pending(|p| p.saving_settings = false).await;

        match result {
            Ok(slot) => {
                self.cache.write().await.merge_slot(&slot);
                tracing::info!(
                    slot_id = self.slot_id,
                    session_kind = %slot.session_kind,
                    "Slot settings saved"
                );
                self.dismiss_banner().await;
                Ok(slot)
            }
            Err(e) => {
                let message = e.user_message("Could not save the slot settings");
                tracing::warn!(slot_id = self.slot_id, error = %e, "Settings save failed");
                self.show_error(message.clone()).await;
                Err(ViewError::Mutation(message))
            }
        }
    }

    // ============ Copy to other slots ============

    /// Fetch the slots this seating can be copied into
    pub async fn load_copy_targets(&self) -> Result<Vec<CopyTarget>, ViewError> {
        self.require_admin("copy seating")?;

        let key = QueryKey::CopyTargets(self.slot_id);
        let cached = self.cache.read().await.get_fresh(&key).and_then(|value| match value {
            CachedResponse::CopyTargets(targets) => Some(targets.clone()),
            _ => None,
        });

        let targets = match cached {
            Some(targets) => targets,
            None => {
                self.set_pending(|p| p.loading_copy_targets = true).await;
                let result = self.api.copy_targets(self.slot_id).await;
                self.set_pending(|p| p.loading_copy_targets = false).await;

                match result {
                    Ok(targets) => {
                        self.cache
                            .write()
                            .await
                            .insert(key, CachedResponse::CopyTargets(targets.clone()));
                        targets
                    }
                    Err(e) => {
                        let message = e.user_message("Could not load the candidate slots");
                        self.show_error(message.clone()).await;
                        return Err(ViewError::Mutation(message));
                    }
                }
            }
        };

        let mut state = self.state.write().await;
        state
            .copy
            .selected
            .retain(|id| targets.iter().any(|t| t.id == *id));
        state.copy.targets = targets.clone();
        Ok(targets)
    }

    pub async fn set_copy_filter(&self, filter: CopyFilter) {
        self.state.write().await.copy.filter = filter;
    }

    pub async fn copy_filter(&self) -> CopyFilter {
        self.state.read().await.copy.filter.clone()
    }

    /// Candidate slots passing the current filter
    pub async fn visible_copy_targets(&self) -> Vec<CopyTarget> {
        let state = self.state.read().await;
        state
            .copy
            .filter
            .apply(&state.copy.targets)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Toggle a candidate in the multi-select. Returns whether it is now selected.
    pub async fn toggle_copy_target(&self, target_id: i64) -> bool {
        let mut state = self.state.write().await;
        if state.copy.selected.remove(&target_id) {
            false
        } else {
            state.copy.selected.insert(target_id);
            true
        }
    }

    /// Select every candidate passing the current filter
    pub async fn select_visible_copy_targets(&self) -> usize {
        let mut state = self.state.write().await;
        let visible: Vec<i64> = state
            .copy
            .filter
            .apply(&state.copy.targets)
            .iter()
            .map(|t| t.id)
            .collect();
        state.copy.selected.extend(visible.iter().copied());
        visible.len()
    }

    pub async fn selected_copy_targets(&self) -> Vec<i64> {
        self.state.read().await.copy.selected.iter().copied().collect()
    }

    /// Copy into the slots selected in the panel
    pub async fn copy_to_selected(&self) -> Result<CopySummary, ViewError> {
        let selected = self.selected_copy_targets().await;
        self.copy_to(&selected).await
    }

    /// Copy this slot's seating into `target_ids`.
    ///
    /// Each affected slot is replaced in the cache when the server returned
    /// it and a snapshot holds it; otherwise its snapshots are invalidated.
    pub async fn copy_to(&self, target_ids: &[i64]) -> Result<CopySummary, ViewError> {
        self.require_admin("copy seating")?;

        if target_ids.is_empty() {
            let message = "Select at least one slot to copy into".to_string();
            self.show_error(message.clone()).await;
            return Err(ViewError::Mutation(message));
        }

        let request = CopyRequest {
            target_slot_ids: target_ids.to_vec(),
        };

        self.set_pending(|p| p.copying = true).await;
        let result = self.api.copy_slot(self.slot_id, &request).await;
        self.set_pending(|p| p.copying = false).await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let message = e.user_message("Could not copy the seating");
                tracing::warn!(slot_id = self.slot_id, error = %e, "Copy failed");
                self.show_error(message.clone()).await;
                return Err(ViewError::Mutation(message));
            }
        };

        let mut affected: BTreeSet<i64> = response.results.iter().map(|r| r.target_slot_id).collect();
        affected.extend(response.slots.iter().map(|s| s.id));

        {
            let mut cache = self.cache.write().await;
            for slot_id in &affected {
                let returned = response.slots.iter().find(|s| s.id == *slot_id);
                match returned {
                    Some(slot) if cache.holds_slot(*slot_id) => {
                        cache.merge_slot(slot);
                    }
                    _ => {
                        cache.invalidate_slot(*slot_id);
                    }
                }
            }
            cache.invalidate(&QueryKey::CopyTargets(self.slot_id));
        }

        let count = |outcome: CopyOutcome| {
            response
                .results
                .iter()
                .filter(|r| r.outcome == outcome)
                .count()
        };
        let summary = CopySummary {
            updated: count(CopyOutcome::Updated),
            skipped: count(CopyOutcome::Skipped),
            failed: count(CopyOutcome::Failed),
            results: response.results.clone(),
        };

        tracing::info!(
            slot_id = self.slot_id,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Seating copied"
        );

        let mut state = self.state.write().await;
        state.copy.selected.clear();
        state.banner = Some(Banner::notice(format!("Updated slots: {}", summary.updated)));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CopyResponse;
    use crate::cache::QueryCache;
    use crate::dnd::{DragSession, DropTarget, TransferSurface};
    use crate::model::WeekSchedule;
    use crate::testing::{date, reservation, slot, stand, ApiCall, FakeStudioApi};
    use crate::views::BannerKind;
    use chrono::Weekday;

    const SLOT: i64 = 1;

    /// Slot 1 with stands 1-3: reservation 10 on stand 1, 11 on stand 2,
    /// 12 and 13 unassigned (13 available).
    fn slot_detail() -> SlotDetail {
        let mut s = slot(SLOT, date(2026, 10, 20), "09:00", "10:00");
        s.reservations = vec![
            reservation(10, SLOT, Some((100, "Anna")), Some(1), ReservationStatus::Booked),
            reservation(11, SLOT, Some((101, "Boris")), Some(2), ReservationStatus::Booked),
            reservation(12, SLOT, None, None, ReservationStatus::Hold),
            reservation(13, SLOT, None, None, ReservationStatus::Available),
        ];
        SlotDetail {
            slot: s,
            stands: vec![stand(3, "C"), stand(1, "A"), stand(2, "B")],
            instructors: vec![Instructor {
                id: 5,
                name: "Vera".to_string(),
            }],
        }
    }

    fn clients() -> Vec<ClientRow> {
        vec![
            ClientRow {
                id: 200,
                full_name: "Dmitry Orlov".to_string(),
                phone: None,
                height_cm: Some(182),
            },
            ClientRow {
                id: 201,
                full_name: "Daria Orlova".to_string(),
                phone: None,
                height_cm: Some(168),
            },
        ]
    }

    async fn open_with(api: FakeStudioApi, session: Session) -> (Arc<FakeStudioApi>, SeatingView) {
        let api = Arc::new(api);
        let view = SeatingView::open(api.clone(), QueryCache::shared(), session, "1")
            .await
            .unwrap();
        (api, view)
    }

    async fn open_admin() -> (Arc<FakeStudioApi>, SeatingView) {
        open_with(
            FakeStudioApi::new().with_slot(slot_detail()).with_clients(clients()),
            Session::admin("root"),
        )
        .await
    }

    async fn stand_of(view: &SeatingView, reservation_id: i64) -> Option<i64> {
        view.detail()
            .await
            .unwrap()
            .slot
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .unwrap()
            .stand_id
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_id_without_request() {
        let api = Arc::new(FakeStudioApi::new());
        let result =
            SeatingView::open(api.clone(), QueryCache::shared(), Session::admin("a"), "abc").await;
        assert!(matches!(result, Err(ViewError::InvalidIdentifier(_))));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_open_fails_when_fetch_fails() {
        let api = Arc::new(FakeStudioApi::new());
        let result =
            SeatingView::open(api.clone(), QueryCache::shared(), Session::admin("a"), "99").await;
        match result {
            Err(e @ ViewError::LoadFailed(_)) => assert!(e.is_blocking()),
            other => panic!("expected load failure, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_open_reuses_fresh_cache() {
        let api = Arc::new(FakeStudioApi::new().with_slot(slot_detail()));
        let cache = QueryCache::shared();
        SeatingView::open(api.clone(), cache.clone(), Session::admin("a"), "1")
            .await
            .unwrap();
        SeatingView::open(api.clone(), cache.clone(), Session::admin("a"), "1")
            .await
            .unwrap();
        assert_eq!(api.calls(), vec![ApiCall::SlotDetail(1)]);

        cache.write().await.invalidate(&QueryKey::SlotDetail(1));
        SeatingView::open(api.clone(), cache, Session::admin("a"), "1")
            .await
            .unwrap();
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_tiles_and_unassigned_bucket() {
        let (_api, view) = open_admin().await;

        let tiles = view.tiles().await.unwrap();
        let codes: Vec<&str> = tiles.iter().map(|t| t.stand.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert_eq!(tiles[0].occupant.as_ref().map(|r| r.id), Some(10));
        assert_eq!(tiles[1].occupant.as_ref().map(|r| r.id), Some(11));
        assert!(tiles[2].is_empty());

        let unassigned: Vec<i64> = view.unassigned().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(unassigned, vec![12, 13]);
    }

    #[tokio::test]
    async fn test_tiles_report_conflicting_reservations() {
        let mut detail = slot_detail();
        detail.slot.reservations[1].stand_id = Some(1);
        let (_api, view) =
            open_with(FakeStudioApi::new().with_slot(detail), Session::admin("a")).await;

        let tiles = view.tiles().await.unwrap();
        assert_eq!(tiles[0].occupant.as_ref().map(|r| r.id), Some(10));
        assert_eq!(tiles[0].conflicts.len(), 1);
    }

    #[tokio::test]
    async fn test_drag_onto_occupied_stand_swaps() {
        let (api, view) = open_admin().await;

        let mut drag = DragSession::new();
        drag.begin_transfer(10);
        let transfer = drag.complete_transfer(DropTarget::Stand(2)).unwrap();
        let outcome = view.drop_transfer(transfer).await.unwrap();

        assert!(matches!(outcome, MoveOutcome::Swapped { with: 11, .. }));
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(
                10,
                ReservationPatch::move_to(Some(2), Some(11))
            ))
        );
        assert_eq!(stand_of(&view, 10).await, Some(2));
        assert_eq!(stand_of(&view, 11).await, Some(1));
    }

    #[tokio::test]
    async fn test_drag_onto_own_stand_is_noop() {
        let (api, view) = open_admin().await;
        let before = api.call_count();

        let outcome = view
            .drop_transfer(Transfer {
                reservation_id: 10,
                target: DropTarget::Stand(1),
            })
            .await
            .unwrap();

        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(api.call_count(), before);
    }

    #[tokio::test]
    async fn test_drop_on_unassigned_zone_sends_null_stand() {
        let (api, view) = open_admin().await;

        let outcome = view
            .drop_transfer(Transfer {
                reservation_id: 11,
                target: DropTarget::Unassigned,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(11, ReservationPatch::move_to(None, None)))
        );
        assert_eq!(stand_of(&view, 11).await, None);
    }

    #[tokio::test]
    async fn test_move_to_empty_stand() {
        let (api, view) = open_admin().await;

        view.move_reservation(12, Some(3)).await.unwrap();
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(12, ReservationPatch::move_to(Some(3), None)))
        );
        assert_eq!(stand_of(&view, 12).await, Some(3));
    }

    #[tokio::test]
    async fn test_non_admin_drag_blocked_without_request() {
        let (api, view) = open_with(
            FakeStudioApi::new().with_slot(slot_detail()),
            Session::operator("desk"),
        )
        .await;
        let before = api.call_count();

        let result = view
            .drop_transfer(Transfer {
                reservation_id: 10,
                target: DropTarget::Stand(2),
            })
            .await;

        assert_eq!(result, Err(ViewError::AdminRequired("move reservations")));
        assert_eq!(api.call_count(), before);
        assert_eq!(stand_of(&view, 10).await, Some(1));
    }

    #[tokio::test]
    async fn test_move_failure_sets_banner_and_keeps_cache() {
        let (api, view) = open_admin().await;
        api.fail_with(409, Some("Stand is blocked"));

        let result = view.move_reservation(12, Some(3)).await;
        assert_eq!(result, Err(ViewError::Mutation("Stand is blocked".to_string())));
        assert_eq!(view.banner().await, Some(Banner::error("Stand is blocked")));
        assert_eq!(stand_of(&view, 12).await, None);
        assert!(!view.pending().await.moving);

        api.recover();
        view.move_reservation(12, Some(3)).await.unwrap();
        assert_eq!(view.banner().await, None);
    }

    #[tokio::test]
    async fn test_swap_with_one_sided_response_refetches_slot() {
        let (api, view) = open_with(
            FakeStudioApi::new()
                .with_slot(slot_detail())
                .with_one_sided_swaps(),
            Session::admin("root"),
        )
        .await;

        let outcome = view.move_reservation(10, Some(2)).await.unwrap();
        assert!(matches!(outcome, MoveOutcome::Swapped { with: 11, .. }));

        assert_eq!(stand_of(&view, 10).await, Some(2));
        assert_eq!(stand_of(&view, 11).await, Some(1));
        assert!(!view.is_stale().await);
        assert_eq!(api.calls().last(), Some(&ApiCall::SlotDetail(1)));

        let tiles = view.tiles().await.unwrap();
        assert!(tiles.iter().all(|t| t.conflicts.is_empty()));
    }

    #[tokio::test]
    async fn test_swap_with_full_response_skips_refetch() {
        let (api, view) = open_admin().await;
        view.move_reservation(10, Some(2)).await.unwrap();
        assert!(matches!(
            api.calls().last(),
            Some(ApiCall::PatchReservation(10, _))
        ));
    }

    #[tokio::test]
    async fn test_move_unknown_reservation_is_stale() {
        let (api, view) = open_admin().await;
        let before = api.call_count();
        let result = view.move_reservation(999, Some(1)).await;
        assert!(matches!(result, Err(ViewError::Stale(_))));
        assert_eq!(api.call_count(), before);
    }

    #[tokio::test]
    async fn test_move_reconciles_week_snapshot() {
        let detail = slot_detail();
        let week_start = date(2026, 10, 19);
        let api = Arc::new(
            FakeStudioApi::new()
                .with_slot(detail.clone())
                .with_week(WeekSchedule {
                    week_start,
                    slots: vec![detail.slot.clone()],
                }),
        );
        let cache = QueryCache::shared();
        let week = api.week(week_start).await.unwrap();
        cache
            .write()
            .await
            .insert(QueryKey::Week(week_start), CachedResponse::Week(week));
        let view = SeatingView::open(api, cache.clone(), Session::admin("a"), "1")
            .await
            .unwrap();

        view.move_reservation(10, Some(2)).await.unwrap();

        let guard = cache.read().await;
        let week = guard.week(week_start).unwrap();
        let stands: Vec<Option<i64>> = week.slots[0].reservations.iter().map(|r| r.stand_id).collect();
        assert_eq!(stands, vec![Some(2), Some(1), None, None]);
    }

    #[tokio::test]
    async fn test_search_requires_two_characters() {
        let (api, view) = open_admin().await;
        let before = api.call_count();

        assert!(view.search_clients(3, " d ").await.unwrap().is_empty());
        assert_eq!(api.call_count(), before);

        let results = view.search_clients(3, "orlov").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(view.search_results(3).await.len(), 2);
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::SearchClients(ClientQuery::search("orlov")))
        );

        // same query answered from cache
        view.search_clients(3, "orlov").await.unwrap();
        assert_eq!(api.call_count(), before + 1);
    }

    #[tokio::test]
    async fn test_assign_prefers_available_unassigned_row() {
        let (api, view) = open_admin().await;

        view.search_clients(3, "Dmitry").await.unwrap();
        view.assign_client(3, 200).await.unwrap();

        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(
                13,
                ReservationPatch::assign_client(200, Some(3))
            ))
        );
        let detail = view.detail().await.unwrap();
        let booked = detail.slot.reservations.iter().find(|r| r.id == 13).unwrap();
        assert_eq!(booked.stand_id, Some(3));
        assert_eq!(booked.client_id, Some(200));
        assert_eq!(booked.status, ReservationStatus::Booked);
        assert!(view.search_results(3).await.is_empty());
    }

    #[tokio::test]
    async fn test_assign_to_row_already_on_stand_omits_stand() {
        let mut detail = slot_detail();
        // stand 2 holds a free row
        detail.slot.reservations[1] =
            reservation(11, SLOT, None, Some(2), ReservationStatus::Available);
        let (api, view) = open_with(
            FakeStudioApi::new().with_slot(detail).with_clients(clients()),
            Session::operator("desk"),
        )
        .await;

        view.assign_client(2, 201).await.unwrap();

        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(
                11,
                ReservationPatch::assign_client(201, None)
            ))
        );
        let detail = view.detail().await.unwrap();
        let booked = detail.slot.reservations.iter().find(|r| r.id == 11).unwrap();
        assert_eq!(booked.stand_id, Some(2));
        assert_eq!(booked.client_name.as_deref(), Some("Daria Orlova"));
    }

    #[tokio::test]
    async fn test_assign_falls_back_to_any_unassigned_row() {
        let mut detail = slot_detail();
        detail.slot.reservations.retain(|r| r.id != 13);
        let (api, view) = open_with(
            FakeStudioApi::new().with_slot(detail).with_clients(clients()),
            Session::operator("desk"),
        )
        .await;

        view.assign_client(3, 200).await.unwrap();

        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::PatchReservation(
                12,
                ReservationPatch::assign_client(200, Some(3))
            ))
        );
        assert_eq!(stand_of(&view, 12).await, Some(3));
    }

    #[test]
    fn test_resolve_assignment_target_order() {
        let mut detail = slot_detail();
        // stand 1 holds reservation 10
        assert_eq!(resolve_assignment_target(&detail.slot, 1).map(|r| r.id), Some(10));
        // stand 3 is empty: first available unassigned row
        assert_eq!(resolve_assignment_target(&detail.slot, 3).map(|r| r.id), Some(13));
        // no available row left: any unassigned row
        detail.slot.reservations.retain(|r| r.id != 13);
        assert_eq!(resolve_assignment_target(&detail.slot, 3).map(|r| r.id), Some(12));
        // nothing unassigned
        detail.slot.reservations.retain(|r| r.id != 12);
        assert!(resolve_assignment_target(&detail.slot, 3).is_none());
    }

    #[tokio::test]
    async fn test_assign_without_free_row_is_stale() {
        let mut detail = slot_detail();
        detail.slot.reservations.retain(|r| r.stand_id.is_some());
        let (api, view) =
            open_with(FakeStudioApi::new().with_slot(detail), Session::operator("desk")).await;
        let before = api.call_count();

        let result = view.assign_client(3, 200).await;
        assert!(matches!(result, Err(ViewError::Stale(_))));
        assert_eq!(api.call_count(), before);
        assert_eq!(view.banner().await.map(|b| b.kind), Some(BannerKind::Error));
    }

    #[test]
    fn test_settings_form_patch() {
        let form = SettingsForm {
            label: "  ".to_string(),
            session_kind: SessionKind::SelfService,
            instructor_id: Some(5),
        };
        let patch = form.to_patch();
        assert_eq!(patch.label, None);
        assert_eq!(patch.instructor_id, None);

        let form = SettingsForm {
            label: " Sprint class ".to_string(),
            session_kind: SessionKind::Instructor,
            instructor_id: Some(5),
        };
        let patch = form.to_patch();
        assert_eq!(patch.label.as_deref(), Some("Sprint class"));
        assert_eq!(patch.instructor_id, Some(5));
    }

    #[tokio::test]
    async fn test_update_settings_merges_slot() {
        let (api, view) = open_admin().await;

        let slot = view
            .update_settings(&SettingsForm {
                label: "Sprint class".to_string(),
                session_kind: SessionKind::Instructor,
                instructor_id: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(slot.instructor_name.as_deref(), Some("Vera"));

        let detail = view.detail().await.unwrap();
        assert_eq!(detail.slot.label.as_deref(), Some("Sprint class"));
        assert_eq!(detail.slot.session_kind, SessionKind::Instructor);
        assert_eq!(detail.stands.len(), 3);
        assert!(matches!(api.calls().last(), Some(ApiCall::UpdateSlot(1, _))));
    }

    #[tokio::test]
    async fn test_update_settings_admin_only() {
        let (api, view) = open_with(
            FakeStudioApi::new().with_slot(slot_detail()),
            Session::operator("desk"),
        )
        .await;
        let before = api.call_count();
        let form = SettingsForm::from_slot(&view.detail().await.unwrap().slot);
        assert!(matches!(
            view.update_settings(&form).await,
            Err(ViewError::AdminRequired(_))
        ));
        assert_eq!(api.call_count(), before);
    }

    fn copy_target(id: i64, day: u32, start: &str, end: &str) -> CopyTarget {
        CopyTarget {
            id,
            session_date: date(2026, 10, day),
            start_time: start.to_string(),
            end_time: end.to_string(),
            label: None,
            session_kind: SessionKind::SelfService,
        }
    }

    #[tokio::test]
    async fn test_copy_flow() {
        let mut held = slot_detail();
        held.slot.id = 2;
        let mut updated_held = held.slot.clone();
        updated_held.label = Some("copied".to_string());
        let mut updated_other = slot(3, date(2026, 10, 27), "09:00", "10:00");
        updated_other.label = Some("copied".to_string());

        let api = Arc::new(
            FakeStudioApi::new()
                .with_slot(slot_detail())
                .with_copy_targets(
                    SLOT,
                    vec![
                        copy_target(2, 26, "09:00", "10:00"),
                        copy_target(3, 27, "09:00", "10:00"),
                        copy_target(4, 27, "08:00", "09:00"),
                    ],
                )
                .with_copy_response(CopyResponse {
                    results: vec![
                        CopyResult {
                            target_slot_id: 2,
                            outcome: CopyOutcome::Updated,
                            message: None,
                        },
                        CopyResult {
                            target_slot_id: 3,
                            outcome: CopyOutcome::Updated,
                            message: None,
                        },
                    ],
                    slots: vec![updated_held, updated_other],
                }),
        );
        let cache = QueryCache::shared();
        cache
            .write()
            .await
            .insert(QueryKey::SlotDetail(2), CachedResponse::SlotDetail(held));
        let view = SeatingView::open(api.clone(), cache.clone(), Session::admin("a"), "1")
            .await
            .unwrap();

        assert_eq!(view.load_copy_targets().await.unwrap().len(), 3);

        // 2026-10-27 is a Tuesday; the 08:00 slot falls outside the window
        view.set_copy_filter(CopyFilter::new().weekday(Weekday::Tue).starting_from("09:00"))
            .await;
        let visible: Vec<i64> = view.visible_copy_targets().await.iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![3]);

        assert!(view.toggle_copy_target(2).await);
        assert_eq!(view.select_visible_copy_targets().await, 1);
        assert_eq!(view.selected_copy_targets().await, vec![2, 3]);

        let summary = view.copy_to_selected().await.unwrap();
        assert_eq!(summary.updated, 2);
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::CopySlot(
                1,
                CopyRequest {
                    target_slot_ids: vec![2, 3]
                }
            ))
        );
        assert_eq!(view.banner().await, Some(Banner::notice("Updated slots: 2")));
        assert!(view.selected_copy_targets().await.is_empty());

        let guard = cache.read().await;
        assert_eq!(guard.slot_detail(2).unwrap().slot.label.as_deref(), Some("copied"));
        assert!(!guard.is_stale(&QueryKey::SlotDetail(2)));
        assert!(guard.slot_detail(3).is_none());
        assert!(guard.is_stale(&QueryKey::CopyTargets(1)));
    }

    #[tokio::test]
    async fn test_copy_requires_selection() {
        let (api, view) = open_admin().await;
        let before = api.call_count();
        assert!(matches!(view.copy_to(&[]).await, Err(ViewError::Mutation(_))));
        assert_eq!(api.call_count(), before);
    }

    #[tokio::test]
    async fn test_copy_admin_only() {
        let (api, view) = open_with(
            FakeStudioApi::new().with_slot(slot_detail()),
            Session::operator("desk"),
        )
        .await;
        let before = api.call_count();
        assert_eq!(
            view.load_copy_targets().await,
            Err(ViewError::AdminRequired("copy seating"))
        );
        assert_eq!(
            view.copy_to(&[2]).await,
            Err(ViewError::AdminRequired("copy seating"))
        );
        assert_eq!(api.call_count(), before);
    }
}
