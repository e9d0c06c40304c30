//! Receiving side: inbound payloads into a persisted, bounded history.
//!
//! Every mutation (insert or enrichment) is followed by a save through the
//! [`HistoryStore`]. Failures never stop the pipeline; they are surfaced as a
//! status line and, for enrichment, in a per-dive error map.

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use log::{debug, warn};

use crate::config::CoreConfig;
use crate::error::DiveError;
use crate::history::{HistoryReconciler, InsertOutcome, SortMode};
use crate::models::{DiveSummary, SummaryId};
use crate::storage::HistoryStore;
use crate::timeline::{DiveTimeline, DEFAULT_RENDER_STEP_SECONDS};
use crate::wire::decode_summary;

pub struct ViewerLog<S: HistoryStore> {
    history: HistoryReconciler,
    store: S,
    status: Option<String>,
    enrichment_errors: HashMap<SummaryId, String>,
    render_step_seconds: f64,
}

impl<S: HistoryStore> ViewerLog<S> {
    /// Load the persisted history and re-apply the merge rules to it.
    pub fn open(store: S, capacity: usize) -> Result<Self, DiveError> {
        let entries = store.load()?;
        debug!("viewer opened with {} stored dives", entries.len());
        Ok(Self {
            history: HistoryReconciler::from_entries(entries, capacity),
            store,
            status: None,
            enrichment_errors: HashMap::new(),
            render_step_seconds: DEFAULT_RENDER_STEP_SECONDS,
        })
    }

    /// Open with the history capacity and render step of a loaded config.
    pub fn open_with_config(store: S, config: &CoreConfig) -> Result<Self, DiveError> {
        config.validate()?;
        let mut viewer = Self::open(store, config.history_capacity)?;
        viewer.render_step_seconds = config.render_step_seconds;
        Ok(viewer)
    }

    /// Decode and merge one inbound payload. A payload that does not decode
    /// is rejected with a status message and `None`.
    pub fn receive(&mut self, payload: &str) -> Option<SummaryId> {
        match decode_summary(payload) {
            Ok(summary) => Some(self.receive_summary(summary)),
            Err(err) => {
                warn!("rejected inbound dive: {err}");
                self.status = Some(format!("Could not read received dive: {err}"));
                None
            }
        }
    }

    pub fn receive_summary(&mut self, summary: DiveSummary) -> SummaryId {
        let id = summary.id.clone();
        let outcome = self.history.insert(summary);
        let message = match (outcome, self.history.contains(&id)) {
            (_, false) => "Received dive is older than the kept history",
            (InsertOutcome::Inserted, true) => "Received new dive",
            (InsertOutcome::Replaced, true) => "Updated received dive",
        };
        self.status = Some(message.to_string());
        let history = &self.history;
        self.enrichment_errors.retain(|id, _| history.contains(id));
        self.persist();
        id
    }

    /// Consume every payload currently queued. Returns how many merged.
    pub fn drain(&mut self, inbox: &Receiver<String>) -> usize {
        inbox
            .try_iter()
            .filter_map(|payload| self.receive(&payload))
            .count()
    }

    pub fn apply_location(&mut self, id: &SummaryId, description: impl Into<String>) -> bool {
        let description = description.into();
        self.enrich(id, |s| s.with_location_description(description))
    }

    pub fn apply_coordinates(&mut self, id: &SummaryId, latitude: f64, longitude: f64) -> bool {
        self.enrich(id, |s| s.with_coordinates(latitude, longitude))
    }

    pub fn apply_weather(
        &mut self,
        id: &SummaryId,
        summary: impl Into<String>,
        air_temp_celsius: Option<f64>,
    ) -> bool {
        let summary = summary.into();
        self.enrich(id, |s| s.with_weather(summary, air_temp_celsius))
    }

    /// Note a failed lookup for one dive. The dive itself is untouched.
    /// Returns `false` when the dive is not in the history.
    pub fn record_enrichment_failure(&mut self, id: &SummaryId, message: impl Into<String>) -> bool {
        if !self.history.contains(id) {
            return false;
        }
        let message = message.into();
        warn!("enrichment failed for dive {id}: {message}");
        self.enrichment_errors.insert(id.clone(), message);
        true
    }

    pub fn enrichment_error(&self, id: &SummaryId) -> Option<&str> {
        self.enrichment_errors.get(id).map(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn history(&self) -> &HistoryReconciler {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dives(&self, mode: SortMode) -> Vec<DiveSummary> {
        self.history.sorted(mode)
    }

    pub fn timeline(&self, id: &SummaryId) -> Option<DiveTimeline> {
        self.history
            .get(id)
            .map(|summary| DiveTimeline::from_summary(summary).with_render_step(self.render_step_seconds))
    }

    // Enrichment for an evicted dive is dropped.
    fn enrich<F>(&mut self, id: &SummaryId, update: F) -> bool
    where
        F: FnOnce(DiveSummary) -> DiveSummary,
    {
        if self.history.update(id, update).is_none() {
            debug!("dive {id} no longer in history, enrichment dropped");
            return false;
        }
        self.enrichment_errors.remove(id);
        self.persist();
        true
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(self.history.entries()) {
            warn!("history not saved: {err}");
            self.status = Some(format!("Could not save dive history: {err}"));
        }
    }
}
