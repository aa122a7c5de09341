// Analysis subsystem: feature extraction, classification, recognition loop
//
// The recognition loop runs on its own thread. Every poll it snapshots the
// newest frame from the ring buffer, tracks the noise floor and recent level
// with exponential moving averages, and classifies a frame only when the
// level jumps above both trackers. Sustained quiet publishes a single
// Silence prediction instead of classifying the noise floor.

pub mod classifier;
pub mod features;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::classifier::classify;
use crate::analysis::features::{dbfs, rms, SubbandExtractor};
use crate::config::TriggerConfig;
use crate::error::AudioError;
use crate::model::CommandModel;

pub use classifier::Classification;
pub use features::{FeatureScaling, SubbandFeatures, WindowKind};

// EMA coefficients for the slow noise-floor tracker and the fast
// recent-level tracker.
const NOISE_ALPHA: f64 = 0.05;
const PREV_ALPHA: f64 = 0.1;

/// What the recognition loop currently believes about the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Prediction {
    /// No prediction yet, or the loop is between events.
    Idle,
    /// The input has been below the silence threshold for long enough.
    Silence,
    /// A triggered frame was classified.
    Command {
        label: String,
        distances: BTreeMap<String, f64>,
        /// Unix time of the trigger, in milliseconds.
        timestamp_ms: u64,
    },
}

pub struct RecognitionWorker {
    ring: Arc<crate::audio::RingBuffer>,
    extractor: SubbandExtractor,
    model: Arc<CommandModel>,
    trigger: TriggerConfig,
    stream_failed: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    tx: broadcast::Sender<Prediction>,
    latest: Arc<RwLock<Prediction>>,
}

impl RecognitionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ring: Arc<crate::audio::RingBuffer>,
        extractor: SubbandExtractor,
        model: Arc<CommandModel>,
        trigger: TriggerConfig,
        stream_failed: Arc<AtomicBool>,
        stop: Arc<AtomicBool>,
        tx: broadcast::Sender<Prediction>,
        latest: Arc<RwLock<Prediction>>,
    ) -> Self {
        Self {
            ring,
            extractor,
            model,
            trigger,
            stream_failed,
            stop,
            tx,
            latest,
        }
    }

    /// Poll the ring buffer until stopped or the capture stream fails.
    pub fn run(self) -> Result<(), AudioError> {
        let poll = Duration::from_millis(self.trigger.poll_ms.max(1));
        let frame_len = self.extractor.frame_len();
        let started = Instant::now();

        let mut noise = 0.0f64;
        let mut prev = 0.0f64;
        let mut silence_since: Option<Instant> = None;
        let mut last_trigger: Option<Instant> = None;

        tracing::debug!(
            frame_len,
            poll_ms = self.trigger.poll_ms,
            "recognition loop started"
        );

        loop {
            if self.stop.load(Ordering::SeqCst) {
                tracing::debug!("recognition loop stopping");
                return Ok(());
            }
            if self.stream_failed.load(Ordering::SeqCst) {
                return Err(AudioError::StreamFailure {
                    reason: "capture stream reported an error".into(),
                });
            }
            std::thread::sleep(poll);

            let frame = self.ring.snapshot_last(frame_len);
            if frame.is_empty() {
                continue;
            }
            let level = rms(&frame);
            let level_db = dbfs(level);

            if level_db < self.trigger.silence_dbfs {
                let since = *silence_since.get_or_insert_with(Instant::now);
                if since.elapsed().as_secs_f64() > self.trigger.silence_min_secs {
                    self.publish_if_changed(Prediction::Silence);
                }
                noise = (1.0 - NOISE_ALPHA) * noise + NOISE_ALPHA * level;
                prev = (1.0 - PREV_ALPHA) * prev + PREV_ALPHA * level;
                continue;
            }
            silence_since = None;

            let warmed = started.elapsed().as_secs_f64() >= self.trigger.warmup_secs;
            let debounced = last_trigger
                .map(|t| t.elapsed().as_secs_f64() >= self.trigger.retrigger_secs)
                .unwrap_or(true);
            let threshold =
                (noise * self.trigger.noise_ratio).max(prev * self.trigger.prev_ratio);
            // The trigger compares against the trackers before this poll's
            // level is folded in, so a sharp onset stands out.
            let triggered = warmed && debounced && level > threshold && frame.len() == frame_len;

            noise = (1.0 - NOISE_ALPHA) * noise + NOISE_ALPHA * level;
            prev = (1.0 - PREV_ALPHA) * prev + PREV_ALPHA * level;

            if !triggered {
                continue;
            }
            last_trigger = Some(Instant::now());

            let features = match self.extractor.extract(&frame) {
                Ok(features) => features,
                Err(err) => {
                    log::warn!("feature extraction failed on triggered frame: {}", err);
                    continue;
                }
            };
            match classify(&features.energies, &self.model) {
                Ok(result) => {
                    tracing::info!(label = %result.label, level_db, "command recognized");
                    self.publish(Prediction::Command {
                        label: result.label,
                        distances: result.distances,
                        timestamp_ms: unix_millis(),
                    });
                }
                Err(err) => {
                    log::warn!("classification failed on triggered frame: {}", err);
                }
            }
        }
    }

    fn publish(&self, prediction: Prediction) {
        {
            let mut latest = self
                .latest
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *latest = prediction.clone();
        }
        // No receivers is fine; the latest slot still updates.
        let _ = self.tx.send(prediction);
    }

    /// Publish only on a state change, so a long silent stretch emits one
    /// Silence event rather than one per poll.
    fn publish_if_changed(&self, prediction: Prediction) {
        let unchanged = {
            let latest = self
                .latest
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *latest == prediction
        };
        if !unchanged {
            self.publish(prediction);
        }
    }
}

pub fn spawn_recognition_thread(
    worker: RecognitionWorker,
) -> std::thread::JoinHandle<Result<(), AudioError>> {
    std::thread::spawn(move || worker.run())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
