//! In-memory studio backend for tests
//!
//! Applies moves, swaps, bookings and bike changes to its own copy of the
//! data the way the real backend does, and records every call so tests can
//! assert exactly what went over the wire.

use crate::api::{
    ApiError, ApiResult, BikeAssignment, ClientQuery, CopyRequest, CopyResponse,
    ReservationPatch, ReservationUpdate, SlotSettingsPatch, StudioApi,
};
use crate::model::{
    ClientRow, CopyTarget, Page, RaceRegistration, RaceSummary, Reservation, ReservationStatus,
    SessionKind, Slot, SlotDetail, Stand, WeekSchedule,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    SlotDetail(i64),
    UpdateSlot(i64, SlotSettingsPatch),
    PatchReservation(i64, ReservationPatch),
    CopyTargets(i64),
    CopySlot(i64, CopyRequest),
    Week(NaiveDate),
    SearchClients(ClientQuery),
    RaceSummary(i64),
    AssignBike(i64, i64, BikeAssignment),
}

#[derive(Default)]
pub struct FakeStudioApi {
    calls: Mutex<Vec<ApiCall>>,
    slots: Mutex<HashMap<i64, SlotDetail>>,
    weeks: Mutex<HashMap<NaiveDate, WeekSchedule>>,
    copy_targets: Mutex<HashMap<i64, Vec<CopyTarget>>>,
    copy_response: Mutex<Option<CopyResponse>>,
    clients: Mutex<Vec<ClientRow>>,
    races: Mutex<HashMap<i64, RaceSummary>>,
    failure: Mutex<Option<(u16, Option<String>)>>,
    one_sided_swaps: Mutex<bool>,
}

impl FakeStudioApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(self, detail: SlotDetail) -> Self {
        self.slots.lock().unwrap().insert(detail.slot.id, detail);
        self
    }

    pub fn with_week(self, week: WeekSchedule) -> Self {
        self.weeks.lock().unwrap().insert(week.week_start, week);
        self
    }

    pub fn with_copy_targets(self, slot_id: i64, targets: Vec<CopyTarget>) -> Self {
        self.copy_targets.lock().unwrap().insert(slot_id, targets);
        self
    }

    pub fn with_copy_response(self, response: CopyResponse) -> Self {
        *self.copy_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_clients(self, clients: Vec<ClientRow>) -> Self {
        *self.clients.lock().unwrap() = clients;
        self
    }

    pub fn with_race(self, summary: RaceSummary) -> Self {
        self.races.lock().unwrap().insert(summary.race.id, summary);
        self
    }

    /// Answer swaps with the moved reservation only, like older backends
    pub fn with_one_sided_swaps(self) -> Self {
        *self.one_sided_swaps.lock().unwrap() = true;
        self
    }

    /// Make every following call fail with this status and message
    pub fn fail_with(&self, status: u16, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: ApiCall) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ApiError::Status { status, message }),
            None => Ok(()),
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: Some(format!("{} not found", what)),
        }
    }
}

#[async_trait]
impl StudioApi for FakeStudioApi {
    async fn slot_detail(&self, slot_id: i64) -> ApiResult<SlotDetail> {
        self.record(ApiCall::SlotDetail(slot_id))?;
        self.slots
            .lock()
            .unwrap()
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Slot"))
    }

    async fn update_slot(&self, slot_id: i64, patch: &SlotSettingsPatch) -> ApiResult<Slot> {
        self.record(ApiCall::UpdateSlot(slot_id, patch.clone()))?;
        let mut slots = self.slots.lock().unwrap();
        let detail = slots.get_mut(&slot_id).ok_or_else(|| Self::not_found("Slot"))?;
        detail.slot.label = patch.label.clone();
        detail.slot.session_kind = patch.session_kind;
        detail.slot.instructor_id = patch.instructor_id;
        detail.slot.instructor_name = patch.instructor_id.and_then(|id| {
            detail
                .instructors
                .iter()
                .find(|i| i.id == id)
                .map(|i| i.name.clone())
        });
        Ok(detail.slot.clone())
    }

    async fn patch_reservation(
        &self,
        reservation_id: i64,
        patch: &ReservationPatch,
    ) -> ApiResult<ReservationUpdate> {
        self.record(ApiCall::PatchReservation(reservation_id, patch.clone()))?;
        let mut slots = self.slots.lock().unwrap();
        let slot = slots
            .values_mut()
            .map(|d| &mut d.slot)
            .find(|s| s.reservations.iter().any(|r| r.id == reservation_id))
            .ok_or_else(|| Self::not_found("Reservation"))?;

        let previous_stand = slot
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .and_then(|r| r.stand_id);

        let mut swapped = None;
        if let Some(swap_id) = patch.swap_reservation_id {
            let other = slot
                .reservations
                .iter_mut()
                .find(|r| r.id == swap_id)
                .ok_or_else(|| Self::not_found("Swap reservation"))?;
            other.stand_id = previous_stand;
            swapped = Some(other.clone());
        }

        let reservation = slot
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| Self::not_found("Reservation"))?;
        if let Some(stand_id) = patch.stand_id {
            reservation.stand_id = stand_id;
        }
        if let Some(client_id) = patch.client_id {
            reservation.client_id = Some(client_id);
            reservation.client_name = self
                .clients
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == client_id)
                .map(|c| c.full_name.clone());
        }
        if let Some(status) = patch.status {
            reservation.status = status;
        }

        if *self.one_sided_swaps.lock().unwrap() {
            swapped = None;
        }

        Ok(ReservationUpdate {
            reservation: Some(reservation.clone()),
            swapped_reservation: swapped,
            slot: None,
        })
    }

    async fn copy_targets(&self, slot_id: i64) -> ApiResult<Vec<CopyTarget>> {
        self.record(ApiCall::CopyTargets(slot_id))?;
        Ok(self
            .copy_targets
            .lock()
            .unwrap()
            .get(&slot_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn copy_slot(&self, slot_id: i64, request: &CopyRequest) -> ApiResult<CopyResponse> {
        self.record(ApiCall::CopySlot(slot_id, request.clone()))?;
        Ok(self.copy_response.lock().unwrap().clone().unwrap_or_default())
    }

    async fn week(&self, week_start: NaiveDate) -> ApiResult<WeekSchedule> {
        self.record(ApiCall::Week(week_start))?;
        Ok(self
            .weeks
            .lock()
            .unwrap()
            .get(&week_start)
            .cloned()
            .unwrap_or(WeekSchedule {
                week_start,
                slots: Vec::new(),
            }))
    }

    async fn search_clients(&self, query: &ClientQuery) -> ApiResult<Page<ClientRow>> {
        self.record(ApiCall::SearchClients(query.clone()))?;
        let needle = query.search.to_lowercase();
        let items: Vec<ClientRow> = self
            .clients
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.full_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Page {
            total: items.len() as u64,
            page: query.page,
            page_size: 20,
            items,
        })
    }

    async fn race_summary(&self, race_id: i64) -> ApiResult<RaceSummary> {
        self.record(ApiCall::RaceSummary(race_id))?;
        self.races
            .lock()
            .unwrap()
            .get(&race_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Race"))
    }

    async fn assign_bike(
        &self,
        race_id: i64,
        registration_id: i64,
        assignment: &BikeAssignment,
    ) -> ApiResult<RaceRegistration> {
        self.record(ApiCall::AssignBike(
            race_id,
            registration_id,
            assignment.clone(),
        ))?;
        let mut races = self.races.lock().unwrap();
        let summary = races.get_mut(&race_id).ok_or_else(|| Self::not_found("Race"))?;
        let registration = summary
            .registrations
            .iter_mut()
            .find(|r| r.id == registration_id)
            .ok_or_else(|| Self::not_found("Registration"))?;
        registration.bike_id = assignment.bike_id;
        registration.bring_own_bike = assignment.bring_own_bike;
        Ok(registration.clone())
    }
}

// ============ Fixtures ============

pub fn stand(id: i64, code: &str) -> Stand {
    Stand {
        id,
        code: code.to_string(),
        display_name: None,
        title: None,
        sort_order: Some(id as i32),
        bike: None,
    }
}

pub fn reservation(
    id: i64,
    slot_id: i64,
    client: Option<(i64, &str)>,
    stand_id: Option<i64>,
    status: ReservationStatus,
) -> Reservation {
    Reservation {
        id,
        slot_id,
        client_id: client.map(|(id, _)| id),
        client_name: client.map(|(_, name)| name.to_string()),
        stand_id,
        status,
    }
}

pub fn slot(id: i64, date: NaiveDate, start: &str, end: &str) -> Slot {
    Slot {
        id,
        session_date: date,
        start_time: start.to_string(),
        end_time: end.to_string(),
        label: None,
        session_kind: SessionKind::SelfService,
        instructor_id: None,
        instructor_name: None,
        reservations: Vec::new(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
