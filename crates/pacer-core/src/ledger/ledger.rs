//! The routine ledger.
//!
//! A [`Ledger`] owns the routines and aggregate stats for one store. All
//! operations are synchronous and run to completion, so there is exactly
//! one writer and no locking. Every operation first rolls daily counters
//! over to the current calendar date.
//!
//! ## Persistence
//!
//! Each mutation writes both records through the [`KvStore`]. A failed
//! write does not undo the mutation: the in-memory ledger stays
//! authoritative, the result carries the error as a warning, and the
//! ledger remembers it has unsaved changes until [`Ledger::flush`] or
//! [`Ledger::close`] succeeds.

use chrono::{DateTime, Local, TimeZone, Utc};

use super::date::CalendarDate;
use super::options::LedgerOptions;
use super::routine::{display_order, random_emoji, Routine};
use super::stats::Stats;
use super::xp::xp_gain;
use crate::error::{CoreError, PersistenceError, Result, ValidationError};
use crate::events::Event;
use crate::storage::KvStore;

pub const ROUTINES_KEY: &str = "routines.v1";
pub const STATS_KEY: &str = "stats.v1";

/// User input for creating or editing a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDraft {
    pub title: String,
    pub duration_secs: u32,
    /// `None` picks a random emoji on create and keeps the old one on edit.
    pub emoji: Option<String>,
}

impl RoutineDraft {
    pub fn new(title: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            title: title.into(),
            duration_secs,
            emoji: None,
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        let emoji = emoji.into();
        self.emoji = (!emoji.trim().is_empty()).then(|| emoji.trim().to_string());
        self
    }
}

/// Logical result of a mutation, plus the write error if saving failed.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<PersistenceError>,
}

impl<T> Committed<T> {
    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

/// Outcome of completing a routine.
#[derive(Debug, Clone)]
pub struct Completion {
    pub routine: Routine,
    pub xp_gain: u64,
    pub stats: Stats,
    /// `RoutineCompleted`, followed by `LevelUp` when total XP crossed a level.
    pub events: Vec<Event>,
}

impl Completion {
    pub fn leveled_up(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::LevelUp { .. }))
    }

    /// One-line message for the host to show.
    pub fn summary(&self) -> String {
        format!("+{} XP! {} done", self.xp_gain, self.routine.title)
    }
}

pub struct Ledger<S: KvStore> {
    store: S,
    options: LedgerOptions,
    routines: Vec<Routine>,
    stats: Stats,
    /// In-memory state differs from what the store last accepted.
    dirty: bool,
}

impl<S: KvStore> Ledger<S> {
    /// Load the ledger from `store`, rolling counters over to today.
    ///
    /// Missing or corrupt records start empty.
    ///
    /// # Errors
    /// Returns the read error if the store cannot be read. The ledger is not
    /// opened, so nothing empty is ever written over records it could not see.
    pub fn open(store: S, options: LedgerOptions) -> Result<Self, PersistenceError> {
        Self::open_at(store, options, &Local::now())
    }

    pub fn open_at<Tz: TimeZone>(
        store: S,
        options: LedgerOptions,
        now: &DateTime<Tz>,
    ) -> Result<Self, PersistenceError> {
        let today = CalendarDate::of(now);
        let mut routines: Vec<Routine> = load_record(&store, ROUTINES_KEY)?.unwrap_or_default();
        let mut repaired = false;
        for routine in &mut routines {
            repaired |= routine.normalize();
        }
        let mut stats = load_record::<Stats>(&store, STATS_KEY)?.unwrap_or_else(|| Stats::new(today));
        stats.normalize();

        let mut ledger = Self {
            store,
            options,
            routines,
            stats,
            dirty: repaired,
        };
        ledger.roll_over(today);
        tracing::debug!(routines = ledger.routines.len(), "ledger opened");
        Ok(ledger)
    }

    /// Flush pending writes and hand the store back.
    ///
    /// # Errors
    /// Returns the write error if unsaved changes could not be stored.
    pub fn close(mut self) -> Result<S, PersistenceError> {
        self.flush()?;
        Ok(self.store)
    }

    /// Retry saving if an earlier write failed or a rollover is unsaved.
    ///
    /// # Errors
    /// Returns the write error; the ledger stays dirty.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        if !self.dirty {
            return Ok(());
        }
        match self.persist() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Routines in display order: pinned first, then most recently touched.
    pub fn list_routines(&mut self) -> Vec<Routine> {
        self.list_routines_at(&Local::now())
    }

    pub fn list_routines_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Routine> {
        self.roll_over(CalendarDate::of(now));
        let mut sorted = self.routines.clone();
        sorted.sort_by(display_order);
        sorted
    }

    /// Routines in stored order (newest insert first).
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn routine(&self, id: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    pub fn stats(&mut self) -> Stats {
        self.stats_at(&Local::now())
    }

    pub fn stats_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Stats {
        self.roll_over(CalendarDate::of(now));
        self.stats.clone()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// # Errors
    /// `Validation` for a bad title or duration; the ledger is unchanged.
    pub fn add_routine(&mut self, draft: RoutineDraft) -> Result<Committed<Routine>> {
        self.add_routine_at(draft, &Local::now())
    }

    pub fn add_routine_at<Tz: TimeZone>(
        &mut self,
        draft: RoutineDraft,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Routine>> {
        let title = self.options.validate_title(&draft.title)?;
        let duration_secs = self.options.validate_duration(draft.duration_secs)?;
        let today = CalendarDate::of(now);
        self.roll_over(today);

        let emoji = draft.emoji.unwrap_or_else(random_emoji);
        let routine = Routine::new(title, duration_secs, emoji, now.with_timezone(&Utc), today);
        tracing::debug!(id = %routine.id, title = %routine.title, "routine added");
        self.routines.insert(0, routine.clone());
        Ok(self.commit(routine))
    }

    /// # Errors
    /// `Validation` for bad input, `NotFound` for an unknown id.
    pub fn edit_routine(&mut self, id: &str, draft: RoutineDraft) -> Result<Committed<Routine>> {
        self.edit_routine_at(id, draft, &Local::now())
    }

    pub fn edit_routine_at<Tz: TimeZone>(
        &mut self,
        id: &str,
        draft: RoutineDraft,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Routine>> {
        let title = self.options.validate_title(&draft.title)?;
        let duration_secs = self.options.validate_duration(draft.duration_secs)?;
        let idx = self.index_of(id)?;
        self.roll_over(CalendarDate::of(now));

        let routine = &mut self.routines[idx];
        routine.title = title;
        routine.duration_secs = duration_secs;
        if let Some(emoji) = draft.emoji {
            routine.emoji = emoji;
        }
        routine.updated_at = now.with_timezone(&Utc);
        tracing::debug!(id, "routine edited");
        let routine = routine.clone();
        Ok(self.commit(routine))
    }

    /// Remove a routine. The host confirms with the user before calling.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn delete_routine(&mut self, id: &str) -> Result<Committed<Routine>> {
        self.delete_routine_at(id, &Local::now())
    }

    pub fn delete_routine_at<Tz: TimeZone>(&mut self, id: &str, now: &DateTime<Tz>) -> Result<Committed<Routine>> {
        let idx = self.index_of(id)?;
        self.roll_over(CalendarDate::of(now));
        let removed = self.routines.remove(idx);
        tracing::debug!(id, "routine deleted");
        Ok(self.commit(removed))
    }

    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn toggle_pin(&mut self, id: &str) -> Result<Committed<Routine>> {
        self.toggle_pin_at(id, &Local::now())
    }

    pub fn toggle_pin_at<Tz: TimeZone>(&mut self, id: &str, now: &DateTime<Tz>) -> Result<Committed<Routine>> {
        let idx = self.index_of(id)?;
        self.roll_over(CalendarDate::of(now));

        let routine = &mut self.routines[idx];
        routine.pinned = !routine.pinned;
        routine.updated_at = now.with_timezone(&Utc);
        tracing::debug!(id, pinned = routine.pinned, "routine pin toggled");
        let routine = routine.clone();
        Ok(self.commit(routine))
    }

    /// Record one completion: counts, XP, level and streak.
    ///
    /// # Errors
    /// `NotFound` for an unknown id; nothing is changed.
    pub fn complete_routine(&mut self, id: &str) -> Result<Committed<Completion>> {
        self.complete_routine_at(id, &Local::now())
    }

    pub fn complete_routine_at<Tz: TimeZone>(
        &mut self,
        id: &str,
        now: &DateTime<Tz>,
    ) -> Result<Committed<Completion>> {
        let idx = self.index_of(id)?;
        let today = CalendarDate::of(now);
        let stamp = now.with_timezone(&Utc);
        self.roll_over(today);

        let level_before = self.stats.level;
        let routine = &mut self.routines[idx];
        let gain = xp_gain(routine.duration_secs, self.options.min_xp);
        routine.record_completion(gain, stamp);
        self.stats.record_completion(gain, today);
        let routine = routine.clone();

        let mut events = vec![Event::RoutineCompleted {
            routine_id: routine.id.clone(),
            title: routine.title.clone(),
            xp_gain: gain,
            total_xp: self.stats.xp,
            level: self.stats.level,
            streak: self.stats.streak,
            at: stamp,
        }];
        if self.stats.level > level_before {
            events.push(Event::LevelUp {
                level: self.stats.level,
                at: stamp,
            });
        }
        tracing::debug!(
            id,
            xp_gain = gain,
            xp = self.stats.xp,
            streak = self.stats.streak,
            "routine completed"
        );

        let completion = Completion {
            routine,
            xp_gain: gain,
            stats: self.stats.clone(),
            events,
        };
        Ok(self.commit(completion))
    }

    /// Add the configured seed routines to an empty ledger, in seed order.
    ///
    /// # Errors
    /// `Validation` if the ledger already has routines or a seed does not
    /// fit the configured bounds; nothing is added in either case.
    pub fn seed(&mut self) -> Result<Committed<Vec<Routine>>> {
        self.seed_at(&Local::now())
    }

    pub fn seed_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<Committed<Vec<Routine>>> {
        if !self.routines.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "routines".into(),
                message: "seed routines can only be added to an empty ledger".into(),
            }
            .into());
        }
        let today = CalendarDate::of(now);
        let stamp = now.with_timezone(&Utc);
        let seeded = self
            .options
            .seeds
            .iter()
            .map(|seed| -> Result<Routine, ValidationError> {
                let title = self.options.validate_title(&seed.title)?;
                let duration_secs = self.options.validate_duration(seed.duration_secs)?;
                Ok(Routine::new(title, duration_secs, seed.emoji.clone(), stamp, today))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        self.roll_over(today);
        self.routines = seeded.clone();
        tracing::debug!(count = seeded.len(), "seed routines added");
        Ok(self.commit(seeded))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn index_of(&self, id: &str) -> Result<usize> {
        self.routines
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::not_found(id))
    }

    /// Bring every daily counter to `today`. Safe to call any number of times.
    fn roll_over(&mut self, today: CalendarDate) {
        let mut changed = self.stats.roll_over(today);
        for routine in &mut self.routines {
            changed |= routine.counts.roll_over(today);
        }
        if changed {
            tracing::debug!(%today, "daily counters rolled over");
            self.dirty = true;
        }
    }

    fn commit<T>(&mut self, value: T) -> Committed<T> {
        self.dirty = true;
        Committed {
            value,
            warning: self.persist(),
        }
    }

    fn persist(&mut self) -> Option<PersistenceError> {
        let result = save_record(&mut self.store, ROUTINES_KEY, &self.routines)
            .and_then(|()| save_record(&mut self.store, STATS_KEY, &self.stats));
        match result {
            Ok(()) => {
                self.dirty = false;
                None
            }
            Err(err) => {
                tracing::warn!("failed to save ledger, keeping changes in memory: {err}");
                Some(err)
            }
        }
    }
}

/// `Ok(None)` for a missing or corrupt record; `Err` only when the store
/// itself cannot be read.
fn load_record<T: serde::de::DeserializeOwned>(
    store: &impl KvStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key, "ignoring corrupt record: {err}");
            Ok(None)
        }
    }
}

fn save_record<T: serde::Serialize>(
    store: &mut impl KvStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(value).map_err(|e| PersistenceError::Encode {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::open_at(MemoryStore::new(), LedgerOptions::default(), &at(17, 8)).unwrap()
    }

    fn add(ledger: &mut Ledger<MemoryStore>, title: &str, secs: u32, now: DateTime<Utc>) -> Routine {
        ledger
            .add_routine_at(RoutineDraft::new(title, secs), &now)
            .unwrap()
            .into_value()
    }

    #[test]
    fn add_inserts_at_front_and_persists() {
        let mut l = ledger();
        let first = add(&mut l, "Stretch", 60, at(17, 8));
        let second = add(&mut l, "Walk", 120, at(17, 8));
        assert_eq!(l.routines()[0].id, second.id);
        assert_eq!(l.routines()[1].id, first.id);
        assert!(!l.is_dirty());
        assert!(l.store().get(ROUTINES_KEY).unwrap().is_some());
        assert_eq!(first.counts.total, 0);
        assert_eq!(first.routine_xp, 0);
        assert!(!first.emoji.is_empty());
    }

    #[test]
    fn add_rejects_bad_titles_without_mutation() {
        let mut l = ledger();
        let long = "x".repeat(41);
        for title in ["", "   ", long.as_str()] {
            let err = l.add_routine_at(RoutineDraft::new(title, 60), &at(17, 8)).unwrap_err();
            assert!(matches!(err, CoreError::Validation(ValidationError::TitleLength { .. })));
        }
        assert_eq!(l.len(), 0);
        assert!(l.store().is_empty());
    }

    #[test]
    fn add_rejects_out_of_range_duration() {
        let mut l = ledger();
        let err = l.add_routine_at(RoutineDraft::new("Plank", 5), &at(17, 8)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DurationOutOfRange { value: 5, .. })
        ));
        assert!(l.is_empty());
    }

    #[test]
    fn edit_updates_fields_and_timestamp() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        let edited = l
            .edit_routine_at(&r.id, RoutineDraft::new(" Long stretch ", 90), &at(17, 9))
            .unwrap()
            .into_value();
        assert_eq!(edited.title, "Long stretch");
        assert_eq!(edited.duration_secs, 90);
        assert_eq!(edited.emoji, r.emoji);
        assert_eq!(edited.updated_at, at(17, 9));
        assert_eq!(edited.created_at, r.created_at);
    }

    #[test]
    fn edit_unknown_id_is_not_found() {
        let mut l = ledger();
        let err = l
            .edit_routine_at("missing", RoutineDraft::new("Walk", 60), &at(17, 8))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn edit_validation_beats_lookup() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        assert!(l
            .edit_routine_at(&r.id, RoutineDraft::new("", 60), &at(17, 9))
            .is_err());
        assert_eq!(l.routine(&r.id).unwrap().title, "Stretch");
    }

    #[test]
    fn delete_removes_and_reports_missing() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        let removed = l.delete_routine(&r.id).unwrap().into_value();
        assert_eq!(removed.id, r.id);
        assert!(l.is_empty());
        assert!(matches!(l.delete_routine(&r.id), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn pin_moves_routine_to_top_of_listing() {
        let mut l = ledger();
        let old = add(&mut l, "Old", 60, at(17, 8));
        let newer = add(&mut l, "New", 60, at(17, 9));
        assert_eq!(l.list_routines_at(&at(17, 10))[0].id, newer.id);

        let pinned = l.toggle_pin_at(&old.id, &at(17, 10)).unwrap().into_value();
        assert!(pinned.pinned);
        assert_eq!(l.list_routines_at(&at(17, 10))[0].id, old.id);

        let unpinned = l.toggle_pin_at(&old.id, &at(17, 11)).unwrap().into_value();
        assert!(!unpinned.pinned);
        // Unpinning still touches updated_at, so it stays first.
        assert_eq!(l.list_routines_at(&at(17, 11))[0].id, old.id);
    }

    #[test]
    fn complete_awards_xp_and_counts() {
        let mut l = ledger();
        let r = add(&mut l, "Meditate", 100, at(17, 8));
        let done = l.complete_routine_at(&r.id, &at(17, 9)).unwrap();
        assert!(done.is_persisted());
        let done = done.into_value();

        assert_eq!(done.xp_gain, 50);
        assert_eq!(done.routine.counts.total, 1);
        assert_eq!(done.routine.counts.today, 1);
        assert_eq!(done.routine.routine_xp, 50);
        assert_eq!(done.routine.last_completed_at, Some(at(17, 9)));
        assert_eq!(done.stats.xp, 50);
        assert_eq!(done.stats.level, 1);
        assert_eq!(done.stats.streak, 1);
        assert_eq!(done.stats.today_total, 1);
        assert_eq!(done.summary(), "+50 XP! Meditate done");
        assert!(matches!(done.events[0], Event::RoutineCompleted { xp_gain: 50, .. }));
        assert!(!done.leveled_up());
    }

    #[test]
    fn short_routine_gets_floor_xp() {
        let mut l = ledger();
        let r = add(&mut l, "Sip", 20, at(17, 8));
        let done = l.complete_routine_at(&r.id, &at(17, 8)).unwrap().into_value();
        assert_eq!(done.xp_gain, 10);
    }

    #[test]
    fn same_day_completions_count_twice_but_streak_once() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        let first = l.complete_routine_at(&r.id, &at(17, 9)).unwrap().into_value();
        let second = l.complete_routine_at(&r.id, &at(17, 21)).unwrap().into_value();
        assert_eq!(first.stats.streak, 1);
        assert_eq!(second.stats.streak, 1);
        assert_eq!(second.routine.counts.today, 2);
        assert_eq!(second.stats.today_total, 2);
    }

    #[test]
    fn streak_grows_on_consecutive_days_and_resets_after_gap() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        l.complete_routine_at(&r.id, &at(17, 23)).unwrap();
        let next = l.complete_routine_at(&r.id, &at(18, 0)).unwrap().into_value();
        assert_eq!(next.stats.streak, 2);
        assert_eq!(next.routine.counts.today, 1);
        assert_eq!(next.routine.counts.total, 2);
        assert_eq!(next.stats.today_total, 1);

        let after_gap = l.complete_routine_at(&r.id, &at(20, 12)).unwrap().into_value();
        assert_eq!(after_gap.stats.streak, 1);
    }

    #[test]
    fn complete_unknown_id_leaves_stats_untouched() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        l.complete_routine_at(&r.id, &at(17, 9)).unwrap();
        let before = l.stats_at(&at(17, 10));

        let err = l.complete_routine_at("nope", &at(17, 10)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(l.stats_at(&at(17, 10)), before);
    }

    #[test]
    fn level_up_emits_event() {
        let mut l = ledger();
        let r = add(&mut l, "Yoga", 900, at(17, 8));
        let done = l.complete_routine_at(&r.id, &at(17, 9)).unwrap().into_value();
        assert_eq!(done.xp_gain, 450);
        assert_eq!(done.stats.level, 5);
        assert!(done.leveled_up());
    }

    #[test]
    fn rollover_is_idempotent_across_reads() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        l.complete_routine_at(&r.id, &at(17, 9)).unwrap();
        l.complete_routine_at(&r.id, &at(17, 10)).unwrap();

        let next_morning = at(18, 7);
        let listed = l.list_routines_at(&next_morning);
        assert_eq!(listed[0].counts.today, 0);
        assert_eq!(l.stats_at(&next_morning).today_total, 0);

        l.complete_routine_at(&r.id, &at(18, 8)).unwrap();
        // Repeated reads on the same day never reset again.
        for hour in 9..12 {
            assert_eq!(l.list_routines_at(&at(18, hour))[0].counts.today, 1);
            assert_eq!(l.stats_at(&at(18, hour)).today_total, 1);
        }
        assert_eq!(l.routine(&r.id).unwrap().counts.total, 3);
    }

    #[test]
    fn rollover_on_read_is_flushed_later() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        l.complete_routine_at(&r.id, &at(17, 9)).unwrap();
        assert!(!l.is_dirty());
        let _ = l.stats_at(&at(18, 9));
        assert!(l.is_dirty());
        l.flush().unwrap();
        assert!(!l.is_dirty());
    }

    #[test]
    fn write_failure_keeps_memory_state_and_warns() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        l.store_mut().set_reject_writes(true);

        let done = l.complete_routine_at(&r.id, &at(17, 9)).unwrap();
        assert!(matches!(done.warning, Some(PersistenceError::WriteRejected { .. })));
        assert_eq!(done.value.stats.xp, 30);
        assert_eq!(l.routine(&r.id).unwrap().counts.total, 1);
        assert!(l.is_dirty());
        assert!(l.flush().is_err());

        l.store_mut().set_reject_writes(false);
        l.flush().unwrap();
        let store = l.close().unwrap();
        let reopened = Ledger::open_at(store, LedgerOptions::default(), &at(17, 10)).unwrap();
        assert_eq!(reopened.routine(&r.id).unwrap().counts.total, 1);
    }

    #[test]
    fn corrupt_records_open_as_empty() {
        let store = MemoryStore::new()
            .with_entry(ROUTINES_KEY, "{not json")
            .with_entry(STATS_KEY, "oops");
        let mut l = Ledger::open_at(store, LedgerOptions::default(), &at(17, 8)).unwrap();
        assert!(l.is_empty());
        let stats = l.stats_at(&at(17, 8));
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.today_date, CalendarDate::from_ymd(2026, 10, 17).unwrap());
    }

    #[test]
    fn stored_level_is_recomputed_on_open() {
        let stats = r#"{"xp":250,"level":9,"streak":2,"lastCompletionDate":"2026-10-16","todayTotal":4,"todayDate":"2026-10-16"}"#;
        let store = MemoryStore::new().with_entry(STATS_KEY, stats);
        let mut l = Ledger::open_at(store, LedgerOptions::default(), &at(17, 8)).unwrap();
        let s = l.stats_at(&at(17, 8));
        assert_eq!(s.level, 3);
        assert_eq!(s.today_total, 0);
        assert_eq!(s.streak, 2);
    }

    #[test]
    fn close_and_reopen_round_trips() {
        let mut l = ledger();
        let a = add(&mut l, "A", 30, at(17, 8));
        add(&mut l, "B", 40, at(17, 8) + Duration::minutes(1));
        l.toggle_pin_at(&a.id, &at(17, 9)).unwrap();
        l.complete_routine_at(&a.id, &at(17, 10)).unwrap();
        let before = l.routines().to_vec();
        let stats_before = l.stats_at(&at(17, 10));

        let store = l.close().unwrap();
        let mut reopened = Ledger::open_at(store, LedgerOptions::default(), &at(17, 11)).unwrap();
        assert_eq!(reopened.routines(), before.as_slice());
        assert_eq!(reopened.stats_at(&at(17, 11)), stats_before);
    }

    #[test]
    fn seed_fills_empty_ledger_once() {
        let mut l = ledger();
        let seeded = l.seed_at(&at(17, 8)).unwrap().into_value();
        assert_eq!(seeded.len(), 3);
        let titles: Vec<_> = l
            .list_routines_at(&at(17, 8))
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["Deep breath", "Drink water", "Shoulder rolls"]);
        assert!(l.seed_at(&at(17, 8)).is_err());
    }

    #[test]
    fn seeds_outside_bounds_are_rejected() {
        let options = LedgerOptions {
            min_duration_secs: 30,
            ..LedgerOptions::default()
        };
        let mut l = Ledger::open_at(MemoryStore::new(), options, &at(17, 8)).unwrap();
        assert!(l.seed_at(&at(17, 8)).is_err());
        assert!(l.is_empty());
    }

    #[test]
    fn unreadable_store_is_not_overwritten() {
        let mut l = ledger();
        for title in ["A", "B", "C"] {
            add(&mut l, title, 30, at(17, 8));
        }
        let store = l.close().unwrap();

        let mut locked = store.clone();
        locked.set_reject_reads(true);
        assert!(matches!(
            Ledger::open_at(locked, LedgerOptions::default(), &at(17, 9)),
            Err(PersistenceError::Locked)
        ));

        let mut l = Ledger::open_at(store, LedgerOptions::default(), &at(17, 10)).unwrap();
        assert_eq!(l.len(), 3);
        add(&mut l, "D", 30, at(17, 10));
        let store = l.close().unwrap();
        let stored: Vec<Routine> =
            serde_json::from_str(&store.get(ROUTINES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 4);
    }

    #[test]
    fn filled_in_emoji_is_saved_once() {
        let mut l = ledger();
        let r = add(&mut l, "Stretch", 60, at(17, 8));
        let mut store = l.close().unwrap();
        let raw = store.get(ROUTINES_KEY).unwrap().unwrap();
        let blank = raw.replace(&format!("\"emoji\":\"{}\"", r.emoji), "\"emoji\":\"\"");
        store.set(ROUTINES_KEY, &blank).unwrap();

        let l = Ledger::open_at(store, LedgerOptions::default(), &at(17, 9)).unwrap();
        assert!(l.is_dirty());
        let emoji = l.routine(&r.id).unwrap().emoji.clone();
        assert!(!emoji.is_empty());
        let store = l.close().unwrap();

        let l = Ledger::open_at(store, LedgerOptions::default(), &at(17, 10)).unwrap();
        assert!(!l.is_dirty());
        assert_eq!(l.routine(&r.id).unwrap().emoji, emoji);
    }

    #[test]
    fn delete_rolls_over_to_the_given_day() {
        let mut l = ledger();
        let keep = add(&mut l, "Keep", 60, at(17, 8));
        let gone = add(&mut l, "Gone", 60, at(17, 8));
        l.complete_routine_at(&keep.id, &at(17, 9)).unwrap();

        l.delete_routine_at(&gone.id, &at(17, 20)).unwrap();
        assert_eq!(l.routine(&keep.id).unwrap().counts.today, 1);
        assert_eq!(l.stats_at(&at(17, 21)).today_total, 1);
    }
}
