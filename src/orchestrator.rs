//! Drives station lookup and observation fetching as the selected circle or
//! count date changes.
//!
//! Every in-flight stage owns a [`CancellationToken`]. A newer selection cancels
//! the token of the stage it supersedes, and results are only committed while
//! holding the selection lock after checking their token, so a late answer for an
//! old selection can never overwrite state.
//!
//! Lookups run on spawned Tokio tasks; the orchestrator must be driven from
//! within a Tokio runtime.

use crate::clients::source::AviationWeatherSource;
use crate::config::PipelineConfig;
use crate::observations::fetch::fetch_count_day;
use crate::stations::locate_station::{log_selection, select_station, stations_within};
use crate::types::circle::Circle;
use crate::types::geo::LatLon;
use crate::types::report::CountDayReconstruction;
use crate::types::station::Station;
use chrono::{Local, NaiveDate};
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    StationLookupInFlight,
    /// The lookup finished; see [`PipelineSnapshot::station`] for its outcome.
    StationLookupDone,
    ObservationFetchInFlight,
    /// The fetch finished; see [`PipelineSnapshot::observations`] for its outcome.
    ObservationFetchDone,
    /// A station is known but the count date is missing or not yet past.
    NotApplicable,
    /// The selection was cleared while a stage was in flight.
    Aborted,
}

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageState<T> {
    Idle,
    Loading,
    Ready(T),
    /// The stage succeeded but found nothing.
    Empty,
    Failed(String),
    NotApplicable,
}

impl<T> StageState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            StageState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, StageState::Loading)
    }
}

/// State exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot {
    pub phase: PipelinePhase,
    pub center: Option<LatLon>,
    pub count_date: Option<NaiveDate>,
    /// Every station within the search radius, nearest first. Empty until a
    /// lookup succeeds.
    pub stations_in_radius: Vec<Station>,
    pub station: StageState<Station>,
    pub observations: StageState<CountDayReconstruction>,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Idle,
            center: None,
            count_date: None,
            stations_in_radius: Vec::new(),
            station: StageState::Idle,
            observations: StageState::Idle,
        }
    }
}

type TodayFn = dyn Fn() -> NaiveDate + Send + Sync;

#[derive(Default)]
struct Selection {
    center: Option<LatLon>,
    count_date: Option<NaiveDate>,
    station: Option<Station>,
    station_token: Option<CancellationToken>,
    fetch_token: Option<CancellationToken>,
}

impl Selection {
    fn cancel_station_lookup(&mut self) -> bool {
        self.station_token.take().map(|t| t.cancel()).is_some()
    }

    fn cancel_fetch(&mut self) -> bool {
        self.fetch_token.take().map(|t| t.cancel()).is_some()
    }
}

struct Inner {
    source: Arc<dyn AviationWeatherSource>,
    config: PipelineConfig,
    today: Box<TodayFn>,
    selection: Mutex<Selection>,
    snapshot: watch::Sender<PipelineSnapshot>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Selection> {
        // Every write replaces whole fields, so a poisoned selection is still usable.
        self.selection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, update: impl FnOnce(&mut PipelineSnapshot)) {
        self.snapshot.send_modify(update);
    }
}

/// Count-day reconstruction pipeline for one interactive session.
///
/// ```no_run
/// use cbc_weather::{AviationWeatherClient, CountDayOrchestrator, LatLon, PipelineConfig, PipelinePhase};
/// use chrono::NaiveDate;
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::default();
/// let client = AviationWeatherClient::new(&config)?;
/// let orchestrator = CountDayOrchestrator::new(Arc::new(client), config);
/// let mut updates = orchestrator.subscribe();
///
/// orchestrator.set_count_date(NaiveDate::from_ymd_opt(2024, 12, 21));
/// orchestrator.select_center(Some(LatLon(38.07, -122.88)));
/// let done = updates
///     .wait_for(|s| s.phase == PipelinePhase::ObservationFetchDone)
///     .await?;
/// println!("{:?}", done.observations);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CountDayOrchestrator {
    inner: Arc<Inner>,
}

impl CountDayOrchestrator {
    pub fn new(source: Arc<dyn AviationWeatherSource>, config: PipelineConfig) -> Self {
        Self::with_today(source, config, || Local::now().date_naive())
    }

    /// Like [`new`](Self::new), with the "today" used for the past-date check
    /// supplied by the caller.
    pub fn with_today(
        source: Arc<dyn AviationWeatherSource>,
        config: PipelineConfig,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        let (snapshot, _) = watch::channel(PipelineSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                today: Box::new(today),
                selection: Mutex::new(Selection::default()),
                snapshot,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Selects a new centre. The previous station and any in-flight work are
    /// discarded. Re-selecting the current centre does nothing; `None` clears the
    /// centre but keeps the count date.
    pub fn select_center(&self, center: Option<LatLon>) {
        let mut selection = self.inner.lock();
        if selection.center == center {
            return;
        }
        self.retarget_center(&mut selection, center);
    }

    /// Selects a circle: its centre and its count date.
    pub fn select_circle(&self, circle: &Circle) {
        let mut selection = self.inner.lock();
        let center = Some(circle.center);
        let date_changed = selection.count_date != circle.count_date;
        selection.count_date = circle.count_date;
        self.inner.publish(|s| s.count_date = circle.count_date);
        if selection.center != center {
            self.retarget_center(&mut selection, center);
        } else if date_changed {
            self.retarget_date(&mut selection);
        }
    }

    /// Changes the count date. A resolved station is reused; only the
    /// observation stage reruns.
    pub fn set_count_date(&self, count_date: Option<NaiveDate>) {
        let mut selection = self.inner.lock();
        if selection.count_date == count_date {
            return;
        }
        selection.count_date = count_date;
        self.inner.publish(|s| s.count_date = count_date);
        self.retarget_date(&mut selection);
    }

    /// Drops the whole selection, cancelling anything in flight.
    pub fn clear(&self) {
        let mut selection = self.inner.lock();
        let was_in_flight = selection.cancel_station_lookup() | selection.cancel_fetch();
        *selection = Selection::default();
        self.inner.publish(|s| {
            *s = PipelineSnapshot {
                phase: if was_in_flight {
                    PipelinePhase::Aborted
                } else {
                    PipelinePhase::Idle
                },
                ..PipelineSnapshot::default()
            }
        });
    }

    fn retarget_center(&self, selection: &mut Selection, center: Option<LatLon>) {
        let was_in_flight = selection.cancel_station_lookup() | selection.cancel_fetch();
        selection.station = None;
        selection.center = center;

        let Some(center) = center else {
            self.inner.publish(|s| {
                s.phase = if was_in_flight {
                    PipelinePhase::Aborted
                } else {
                    PipelinePhase::Idle
                };
                s.center = None;
                s.stations_in_radius.clear();
                s.station = StageState::Idle;
                s.observations = StageState::Idle;
            });
            return;
        };

        let token = CancellationToken::new();
        selection.station_token = Some(token.clone());
        self.inner.publish(|s| {
            s.phase = PipelinePhase::StationLookupInFlight;
            s.center = Some(center);
            s.stations_in_radius.clear();
            s.station = StageState::Loading;
            s.observations = StageState::Idle;
        });

        let this = self.clone();
        tokio::spawn(async move {
            let source = this.inner.source.as_station_source();
            let radius = this.inner.config.station_radius_miles;
            let result = stations_within(source, center, radius, &token).await;

            let mut selection = this.inner.lock();
            if token.is_cancelled() {
                debug!("Discarding superseded station lookup for {}", center);
                return;
            }
            selection.station_token = None;
            match result {
                Ok(ranked) => {
                    let selected = select_station(&ranked).cloned();
                    log_selection(center, radius, selected.as_ref());
                    selection.station = selected.clone();
                    this.inner.publish(|s| {
                        s.phase = PipelinePhase::StationLookupDone;
                        s.stations_in_radius = ranked;
                        s.station = match selected {
                            Some(station) => StageState::Ready(station),
                            None => StageState::Empty,
                        };
                    });
                    this.start_fetch(&mut selection);
                }
                Err(e) if e.is_cancelled() => {
                    debug!("Station lookup for {} was cancelled", center);
                }
                Err(e) => {
                    warn!("Station lookup for {} failed: {}", center, e);
                    this.inner.publish(|s| {
                        s.phase = PipelinePhase::StationLookupDone;
                        s.station = StageState::Failed(e.to_string());
                    });
                }
            }
        });
    }

    /// Reruns the observation stage after a date change, when a station is
    /// already known. Otherwise a pending lookup picks the new date up itself.
    fn retarget_date(&self, selection: &mut Selection) {
        selection.cancel_fetch();
        if selection.station.is_some() {
            self.start_fetch(selection);
        }
    }

    fn start_fetch(&self, selection: &mut Selection) {
        let Some(station) = selection.station.clone() else {
            return;
        };
        let today = (self.inner.today)();
        let Some(date) = selection.count_date.filter(|date| *date < today) else {
            self.inner.publish(|s| {
                s.phase = PipelinePhase::NotApplicable;
                s.observations = StageState::NotApplicable;
            });
            return;
        };

        let token = CancellationToken::new();
        selection.fetch_token = Some(token.clone());
        self.inner.publish(|s| {
            s.phase = PipelinePhase::ObservationFetchInFlight;
            s.observations = StageState::Loading;
        });

        let this = self.clone();
        tokio::spawn(async move {
            let source = this.inner.source.as_observation_source();
            let lookback = this.inner.config.lookback_hours;
            let result = fetch_count_day(source, &station, date, lookback, &token).await;

            let mut selection = this.inner.lock();
            if token.is_cancelled() {
                debug!("Discarding superseded observations of {} for {}", station.id(), date);
                return;
            }
            selection.fetch_token = None;
            match result {
                Ok(reconstruction) => this.inner.publish(|s| {
                    s.phase = PipelinePhase::ObservationFetchDone;
                    s.observations = if reconstruction.patch.is_some() {
                        StageState::Ready(reconstruction)
                    } else {
                        StageState::Empty
                    };
                }),
                Err(e) if e.is_cancelled() => {
                    debug!("Observation fetch for {} was cancelled", station.id());
                }
                Err(e) => {
                    warn!("Observation fetch for {} failed: {}", station.id(), e);
                    this.inner.publish(|s| {
                        s.phase = PipelinePhase::ObservationFetchDone;
                        s.observations = StageState::Failed(e.to_string());
                    });
                }
            }
        });
    }
}
