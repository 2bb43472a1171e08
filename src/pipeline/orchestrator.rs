//! Single-writer coordinator for predictions and marked locations.
//!
//! The orchestrator task owns both stores and the displayed status. All
//! mutation happens inside that task; decoding, resizing, classification and
//! reverse geocoding run on blocking worker threads and report back over the
//! command channel.
//!
//! When a new image is selected while an older one is still being processed,
//! the older result is discarded on arrival (latest selection wins).

use crate::constants::{COMMAND_CHANNEL_CAPACITY, INITIAL_DISPLAY_TEXT};
use crate::error::{Error, Result};
use crate::imaging::normalize_bytes;
use crate::inference::{Classification, ImageClassifier, top_classification};
use crate::location::LocationProvider;
use crate::pipeline::phase::{FailureReason, Phase, PhaseEvent};
use crate::record::{
    Coordinate, MarkedLocation, Placemark, Prediction, build_prediction, display_text,
};
use crate::storage::{HistoryEvent, HistoryStore, LocationEvent, LocationStore};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Settings for the prediction pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Largest image edge after normalization.
    pub max_dimension: u32,
    /// Coordinate recorded when the location provider has none.
    pub fallback_coordinate: Coordinate,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_dimension: crate::constants::DEFAULT_MAX_DIMENSION,
            fallback_coordinate: Coordinate::fallback(),
        }
    }
}

/// Snapshot of what the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Current phase of the latest selection.
    pub phase: Phase,
    /// Prediction result or failure message.
    pub display_text: String,
    /// Sequence number of the latest selection (0 before the first).
    pub sequence: u64,
    /// Classifications still running, including superseded ones.
    pub in_flight: usize,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            display_text: INITIAL_DISPLAY_TEXT.to_string(),
            sequence: 0,
            in_flight: 0,
        }
    }
}

type Reply<T> = oneshot::Sender<T>;

/// Outcome reported by a classification worker.
struct ClassifyOutcome {
    top: Classification,
    coordinate: Option<Coordinate>,
}

enum Command {
    SelectImage {
        bytes: Vec<u8>,
        reply: Reply<u64>,
    },
    Normalized {
        sequence: u64,
    },
    ClassifyFinished {
        sequence: u64,
        result: Result<ClassifyOutcome>,
    },
    MarkLocation {
        coordinate: Coordinate,
        reply: Reply<Result<Option<MarkedLocation>>>,
    },
    GeocodeFinished {
        label: String,
        result: Result<Vec<Placemark>>,
        reply: Reply<Result<Option<MarkedLocation>>>,
    },
    History {
        reply: Reply<Vec<Prediction>>,
    },
    Locations {
        reply: Reply<Vec<MarkedLocation>>,
    },
    ClearHistory {
        reply: Reply<Result<()>>,
    },
    SubscribeHistory {
        reply: Reply<broadcast::Receiver<HistoryEvent>>,
    },
    SubscribeLocations {
        reply: Reply<broadcast::Receiver<LocationEvent>>,
    },
}

/// Cloneable access to a running pipeline.
#[derive(Clone)]
pub struct PipelineHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<Status>,
}

/// Start the pipeline task on the current tokio runtime.
pub fn spawn(
    classifier: Arc<dyn ImageClassifier>,
    location: Arc<dyn LocationProvider>,
    history: HistoryStore,
    locations: LocationStore,
    options: PipelineOptions,
) -> PipelineHandle {
    let (commands, receiver) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (status_tx, status) = watch::channel(Status::default());

    let orchestrator = Orchestrator {
        classifier,
        location,
        history,
        locations,
        options,
        status: status_tx,
        commands: commands.downgrade(),
        geocoding: false,
    };
    tokio::spawn(orchestrator.run(receiver));

    PipelineHandle { commands, status }
}

impl PipelineHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| Error::PipelineClosed)?;
        response.await.map_err(|_| Error::PipelineClosed)
    }

    /// Select a new image and start processing it.
    ///
    /// Returns the selection's sequence number; the outcome is published
    /// through [`PipelineHandle::watch_status`].
    pub async fn select_image(&self, bytes: Vec<u8>) -> Result<u64> {
        self.request(|reply| Command::SelectImage { bytes, reply })
            .await
    }

    /// Reverse-geocode a tapped map point and mark it with the current result.
    ///
    /// Returns `Ok(None)` when the tap was ignored because another lookup is
    /// in progress or no address was found.
    pub async fn mark_location(&self, coordinate: Coordinate) -> Result<Option<MarkedLocation>> {
        self.request(|reply| Command::MarkLocation { coordinate, reply })
            .await?
    }

    /// Prediction history, newest first.
    pub async fn history(&self) -> Result<Vec<Prediction>> {
        self.request(|reply| Command::History { reply }).await
    }

    /// Marked locations in confirmation order.
    pub async fn locations(&self) -> Result<Vec<MarkedLocation>> {
        self.request(|reply| Command::Locations { reply }).await
    }

    /// Remove every recorded prediction.
    pub async fn clear_history(&self) -> Result<()> {
        self.request(|reply| Command::ClearHistory { reply })
            .await?
    }

    /// Follow history changes.
    pub async fn subscribe_history(&self) -> Result<broadcast::Receiver<HistoryEvent>> {
        self.request(|reply| Command::SubscribeHistory { reply })
            .await
    }

    /// Follow marked location changes.
    pub async fn subscribe_locations(&self) -> Result<broadcast::Receiver<LocationEvent>> {
        self.request(|reply| Command::SubscribeLocations { reply })
            .await
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    /// Wait until no classification is running and return the final status.
    pub async fn wait_idle(&self) -> Result<Status> {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|s| s.in_flight == 0)
            .await
            .map_err(|_| Error::PipelineClosed)?;
        Ok(settled.clone())
    }
}

struct Orchestrator {
    classifier: Arc<dyn ImageClassifier>,
    location: Arc<dyn LocationProvider>,
    history: HistoryStore,
    locations: LocationStore,
    options: PipelineOptions,
    status: watch::Sender<Status>,
    commands: mpsc::WeakSender<Command>,
    geocoding: bool,
}

impl Orchestrator {
    async fn run(mut self, mut receiver: mpsc::Receiver<Command>) {
        debug!("Prediction pipeline started");
        while let Some(command) = receiver.recv().await {
            self.handle(command);
        }
        debug!("Prediction pipeline stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SelectImage { bytes, reply } => {
                let sequence = self.select_image(bytes);
                let _ = reply.send(sequence);
            }
            Command::Normalized { sequence } => self.on_normalized(sequence),
            Command::ClassifyFinished { sequence, result } => {
                self.on_classify_finished(sequence, result);
            }
            Command::MarkLocation { coordinate, reply } => self.mark_location(coordinate, reply),
            Command::GeocodeFinished {
                label,
                result,
                reply,
            } => {
                let _ = reply.send(self.on_geocode_finished(label, result));
            }
            Command::History { reply } => {
                let _ = reply.send(self.history.all().to_vec());
            }
            Command::Locations { reply } => {
                let _ = reply.send(self.locations.all().to_vec());
            }
            Command::ClearHistory { reply } => {
                let _ = reply.send(self.history.clear());
            }
            Command::SubscribeHistory { reply } => {
                let _ = reply.send(self.history.subscribe());
            }
            Command::SubscribeLocations { reply } => {
                let _ = reply.send(self.locations.subscribe());
            }
        }
    }

    fn transition(&self, event: PhaseEvent) {
        self.status.send_modify(|status| match status.phase.next(event) {
            Some(next) => status.phase = next,
            None => warn!("Ignoring {event:?} in phase {}", status.phase),
        });
    }

    fn select_image(&mut self, bytes: Vec<u8>) -> u64 {
        // Every handle is gone, nobody can observe the outcome
        let Some(commands) = self.commands.upgrade() else {
            return 0;
        };

        let mut sequence = 0;
        self.status.send_modify(|status| {
            status.sequence += 1;
            status.in_flight += 1;
            sequence = status.sequence;
        });
        self.transition(PhaseEvent::SelectImage);
        info!("Image {sequence} selected ({} bytes)", bytes.len());
        self.transition(PhaseEvent::Start);

        let classifier = Arc::clone(&self.classifier);
        let location = Arc::clone(&self.location);
        let max_dimension = self.options.max_dimension;
        let progress = commands.clone();
        let normalized = Arc::new(AtomicBool::new(false));
        let reached = Arc::clone(&normalized);

        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                classify_image(
                    &bytes,
                    max_dimension,
                    classifier.as_ref(),
                    location.as_ref(),
                    || {
                        reached.store(true, Ordering::Release);
                        let _ = progress.blocking_send(Command::Normalized { sequence });
                    },
                )
            })
            .await;

            let result = joined
                .unwrap_or_else(|e| Err(worker_failure(normalized.load(Ordering::Acquire), e)));
            let _ = commands
                .send(Command::ClassifyFinished { sequence, result })
                .await;
        });

        sequence
    }

    fn is_latest(&self, sequence: u64) -> bool {
        self.status.borrow().sequence == sequence
    }

    fn on_normalized(&self, sequence: u64) {
        if self.is_latest(sequence) {
            self.transition(PhaseEvent::Normalized);
        }
    }

    fn on_classify_finished(&mut self, sequence: u64, result: Result<ClassifyOutcome>) {
        let latest = self.is_latest(sequence);
        if !latest {
            debug!("Discarding result of superseded image {sequence}");
        }

        let mut text = None;
        let mut event = None;
        if latest {
            match result {
                Ok(outcome) => {
                    let coordinate = outcome
                        .coordinate
                        .unwrap_or(self.options.fallback_coordinate);
                    let record = build_prediction(&outcome.top, Utc::now(), Some(coordinate));
                    info!(
                        "Predicted {} ({}) at {coordinate}",
                        record.label, record.confidence
                    );
                    if let Err(e) = self.history.prepend(record) {
                        warn!("Prediction kept in memory but not saved: {e}");
                    }
                    text = Some(display_text(&outcome.top));
                    event = Some(PhaseEvent::Classified);
                }
                Err(e) => {
                    warn!("Prediction failed: {e}");
                    text = Some(e.status_message());
                    event = Some(PhaseEvent::Fail(FailureReason::from(&e)));
                }
            }
        }

        self.status.send_modify(|status| {
            status.in_flight = status.in_flight.saturating_sub(1);
            if let Some(text) = text {
                status.display_text = text;
            }
        });
        if let Some(event) = event {
            self.transition(event);
        }
    }

    fn mark_location(
        &mut self,
        coordinate: Coordinate,
        reply: Reply<Result<Option<MarkedLocation>>>,
    ) {
        if self.geocoding {
            debug!("Ignoring map tap while a lookup is in progress");
            let _ = reply.send(Ok(None));
            return;
        }
        if !self.location.authorization().is_authorized() {
            let _ = reply.send(Err(Error::LocationPermission));
            return;
        }
        let Some(commands) = self.commands.upgrade() else {
            let _ = reply.send(Err(Error::PipelineClosed));
            return;
        };

        self.geocoding = true;
        let label = self.status.borrow().display_text.clone();
        let location = Arc::clone(&self.location);

        tokio::spawn(async move {
            let joined =
                tokio::task::spawn_blocking(move || location.reverse_geocode(coordinate)).await;
            let result = joined.unwrap_or_else(|e| {
                Err(Error::Geocode {
                    reason: format!("lookup worker failed: {e}"),
                })
            });
            let _ = commands
                .send(Command::GeocodeFinished {
                    label,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn on_geocode_finished(
        &mut self,
        label: String,
        result: Result<Vec<Placemark>>,
    ) -> Result<Option<MarkedLocation>> {
        self.geocoding = false;

        let placemarks = result?;
        let Some(placemark) = placemarks.first() else {
            debug!("Reverse geocoding returned no placemark");
            return Ok(None);
        };

        let marked = MarkedLocation::new(placemark.address(), label);
        info!("Location marked: {}", marked.address);
        if let Err(e) = self.locations.append(marked.clone()) {
            warn!("Marked location kept in memory but not saved: {e}");
        }
        Ok(Some(marked))
    }
}

/// Error for a classification worker that died, by the stage it reached.
fn worker_failure(normalized: bool, detail: impl std::fmt::Display) -> Error {
    if normalized {
        Error::Inference {
            reason: format!("classification worker failed: {detail}"),
        }
    } else {
        Error::ImageProcessing {
            reason: format!("normalization worker failed: {detail}"),
        }
    }
}

/// Decode, normalize and classify one image on the calling thread.
fn classify_image(
    bytes: &[u8],
    max_dimension: u32,
    classifier: &dyn ImageClassifier,
    location: &dyn LocationProvider,
    on_normalized: impl FnOnce(),
) -> Result<ClassifyOutcome> {
    let image = normalize_bytes(bytes, max_dimension)?;
    on_normalized();

    let top = top_classification(classifier.classify(&image)?)?;
    Ok(ClassifyOutcome {
        top,
        coordinate: location.current_coordinate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_failure_follows_stage() {
        assert!(matches!(
            worker_failure(false, "panicked"),
            Error::ImageProcessing { .. }
        ));
        assert!(matches!(
            worker_failure(true, "panicked"),
            Error::Inference { .. }
        ));
    }
}
