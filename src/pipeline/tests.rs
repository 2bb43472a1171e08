//! Pipeline behaviour tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::error::{Error, Result};
use crate::inference::{Classification, FixedClassifier, ImageClassifier};
use crate::location::{LocationProvider, StaticLocationProvider};
use crate::record::{Coordinate, Placemark};
use crate::storage::{
    HistoryEvent, HistoryStore, KeyValueStore, LocationEvent, LocationStore, MemoryStore,
};
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, mpsc as std_mpsc};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn landscape() -> Vec<u8> {
    png(40, 20)
}

fn portrait() -> Vec<u8> {
    png(20, 40)
}

fn orientation(image: &DynamicImage) -> &'static str {
    if image.width() >= image.height() {
        "landscape"
    } else {
        "portrait"
    }
}

fn healthy_classifier() -> Arc<dyn ImageClassifier> {
    Arc::new(FixedClassifier::new(vec![
        Classification::new("Healthy", 0.92),
        Classification::new("Blight", 0.05),
    ]))
}

/// Labels images by orientation.
struct OrientationClassifier;

impl ImageClassifier for OrientationClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>> {
        Ok(vec![Classification::new(orientation(image), 0.7)])
    }
}

/// Blocks each orientation until the test releases it.
struct GatedClassifier {
    gates: HashMap<&'static str, Mutex<std_mpsc::Receiver<()>>>,
}

impl GatedClassifier {
    fn new() -> (Self, HashMap<&'static str, std_mpsc::Sender<()>>) {
        let mut gates = HashMap::new();
        let mut releases = HashMap::new();
        for name in ["landscape", "portrait"] {
            let (tx, rx) = std_mpsc::channel();
            gates.insert(name, Mutex::new(rx));
            releases.insert(name, tx);
        }
        (Self { gates }, releases)
    }
}

impl ImageClassifier for GatedClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>> {
        let label = orientation(image);
        self.gates[label]
            .lock()
            .unwrap()
            .recv()
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;
        Ok(vec![Classification::new(label, 0.6)])
    }
}

struct FailingClassifier;

struct PanickingClassifier;

impl ImageClassifier for PanickingClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Classification>> {
        panic!("model runtime crashed");
    }
}

impl ImageClassifier for FailingClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Classification>> {
        Err(Error::ModelUnavailable {
            reason: "model bundle missing".into(),
        })
    }
}

fn start_with(
    classifier: Arc<dyn ImageClassifier>,
    location: Arc<dyn LocationProvider>,
    kv: Arc<dyn KeyValueStore>,
) -> PipelineHandle {
    spawn(
        classifier,
        location,
        HistoryStore::load(kv),
        LocationStore::in_memory(),
        PipelineOptions {
            max_dimension: 64,
            ..PipelineOptions::default()
        },
    )
}

fn start(classifier: Arc<dyn ImageClassifier>) -> PipelineHandle {
    start_with(
        classifier,
        Arc::new(StaticLocationProvider::authorized()),
        Arc::new(MemoryStore::new()),
    )
}

#[tokio::test]
async fn test_successful_prediction_is_recorded() {
    let pipeline = start(healthy_classifier());

    pipeline.select_image(landscape()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Done);
    assert_eq!(status.display_text, "Prediction: Healthy\nConfidence: %92");
    assert_eq!(pipeline.status(), status);

    let history = pipeline.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].label, "Healthy");
    assert_eq!(history[0].confidence, "0.92");
    assert_eq!(history[0].coordinate(), Coordinate::fallback());
}

#[tokio::test]
async fn test_provider_coordinate_is_recorded() {
    let here = Coordinate::new(36.884_1, 30.705_6).unwrap();
    let pipeline = start_with(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::authorized().with_coordinate(here)),
        Arc::new(MemoryStore::new()),
    );

    pipeline.select_image(portrait()).await.unwrap();
    pipeline.wait_idle().await.unwrap();

    assert_eq!(pipeline.history().await.unwrap()[0].coordinate(), here);
}

#[tokio::test]
async fn test_empty_result_adds_nothing() {
    let pipeline = start(Arc::new(FixedClassifier::new(Vec::new())));

    pipeline.select_image(landscape()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Failed(FailureReason::NoPrediction));
    assert_eq!(status.display_text, Error::NoPrediction.status_message());
    assert!(pipeline.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_image_fails_normalization() {
    let pipeline = start(healthy_classifier());

    pipeline.select_image(b"not an image".to_vec()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Failed(FailureReason::ImageProcessing));
    assert!(pipeline.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unbounded_dimension_fails_without_allocating() {
    let pipeline = spawn(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::authorized()),
        HistoryStore::load(Arc::new(MemoryStore::new())),
        LocationStore::in_memory(),
        PipelineOptions {
            max_dimension: u32::MAX,
            ..PipelineOptions::default()
        },
    );

    pipeline.select_image(png(1, 1)).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Failed(FailureReason::ImageProcessing));
    assert!(pipeline.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_model_unavailable_is_reported() {
    let pipeline = start(Arc::new(FailingClassifier));

    pipeline.select_image(landscape()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Failed(FailureReason::ModelUnavailable));
    assert_eq!(status.display_text, "The ML model could not be loaded.");
}

#[tokio::test]
async fn test_crashed_classifier_reports_inference_failure() {
    let pipeline = start(Arc::new(PanickingClassifier));

    pipeline.select_image(landscape()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    assert_eq!(status.phase, Phase::Failed(FailureReason::Inference));
    assert!(pipeline.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_new_selection_after_failure() {
    let pipeline = start(Arc::new(OrientationClassifier));

    pipeline.select_image(Vec::new()).await.unwrap();
    let failed = pipeline.wait_idle().await.unwrap();
    assert!(matches!(failed.phase, Phase::Failed(_)));

    pipeline.select_image(portrait()).await.unwrap();
    let done = pipeline.wait_idle().await.unwrap();
    assert_eq!(done.phase, Phase::Done);
    assert_eq!(pipeline.history().await.unwrap()[0].label, "portrait");
}

#[tokio::test]
async fn test_overlapping_selections_record_at_most_two() {
    let pipeline = start(Arc::new(OrientationClassifier));

    // The first result may land before or after the second selection
    let first = pipeline.select_image(landscape()).await.unwrap();
    let second = pipeline.select_image(portrait()).await.unwrap();
    assert!(second > first);

    let status = pipeline.wait_idle().await.unwrap();
    let history = pipeline.history().await.unwrap();

    assert!((1..=2).contains(&history.len()));
    assert_eq!(history[0].label, "portrait");
    assert_eq!(status.sequence, second);
    assert_eq!(status.phase, Phase::Done);
}

#[tokio::test]
async fn test_superseded_result_is_discarded() {
    let (classifier, releases) = GatedClassifier::new();
    let pipeline = start(Arc::new(classifier));
    let mut watch = pipeline.watch_status();

    pipeline.select_image(landscape()).await.unwrap();
    pipeline.select_image(portrait()).await.unwrap();

    releases["portrait"].send(()).unwrap();
    watch.wait_for(|s| s.phase == Phase::Done).await.unwrap();

    releases["landscape"].send(()).unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    let history = pipeline.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].label, "portrait");
    assert!(status.display_text.contains("portrait"));
}

#[tokio::test]
async fn test_history_survives_restart() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let first = start_with(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::authorized()),
        Arc::clone(&kv),
    );
    first.select_image(landscape()).await.unwrap();
    first.wait_idle().await.unwrap();
    let recorded = first.history().await.unwrap();

    let second = start_with(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::authorized()),
        kv,
    );
    assert_eq!(second.history().await.unwrap(), recorded);
}

#[tokio::test]
async fn test_clear_history_notifies_subscribers() {
    let pipeline = start(healthy_classifier());
    let mut events = pipeline.subscribe_history().await.unwrap();

    pipeline.select_image(landscape()).await.unwrap();
    pipeline.wait_idle().await.unwrap();
    pipeline.clear_history().await.unwrap();

    assert!(matches!(
        events.recv().await.unwrap(),
        HistoryEvent::Prepended(_)
    ));
    assert_eq!(events.recv().await.unwrap(), HistoryEvent::Replaced(0));
    assert!(pipeline.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_location_uses_displayed_result() {
    let provider = StaticLocationProvider::authorized().with_placemark(Placemark {
        locality: Some("Cupertino".into()),
        administrative_area: Some("CA".into()),
        country: Some("United States".into()),
    });
    let pipeline = start_with(
        healthy_classifier(),
        Arc::new(provider),
        Arc::new(MemoryStore::new()),
    );

    let mut events = pipeline.subscribe_locations().await.unwrap();
    pipeline.select_image(landscape()).await.unwrap();
    let status = pipeline.wait_idle().await.unwrap();

    let marked = pipeline
        .mark_location(Coordinate::fallback())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marked.address, "Cupertino, CA, United States");
    assert_eq!(marked.last_prediction_label, status.display_text);
    assert_eq!(
        events.recv().await.unwrap(),
        LocationEvent::Appended(marked.clone())
    );
    assert_eq!(pipeline.locations().await.unwrap(), vec![marked]);
}

#[tokio::test]
async fn test_mark_location_geocode_failure_leaves_store_unchanged() {
    let pipeline = start_with(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::authorized().with_geocode_failure("no network")),
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.mark_location(Coordinate::fallback()).await;
    assert!(matches!(result, Err(Error::Geocode { .. })));
    assert!(pipeline.locations().await.unwrap().is_empty());

    // The failed lookup no longer blocks new taps
    let again = pipeline.mark_location(Coordinate::fallback()).await;
    assert!(matches!(again, Err(Error::Geocode { .. })));
}

#[tokio::test]
async fn test_mark_location_requires_permission() {
    let pipeline = start_with(
        healthy_classifier(),
        Arc::new(StaticLocationProvider::denied()),
        Arc::new(MemoryStore::new()),
    );

    let result = pipeline.mark_location(Coordinate::fallback()).await;
    assert!(matches!(result, Err(Error::LocationPermission)));
    assert!(pipeline.locations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_location_without_placemark_is_ignored() {
    let pipeline = start(healthy_classifier());
    let marked = pipeline.mark_location(Coordinate::fallback()).await.unwrap();
    assert!(marked.is_none());
    assert!(pipeline.locations().await.unwrap().is_empty());
}
