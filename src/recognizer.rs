// Recognizer facade
//
// Owns the whole streaming pipeline: ring buffer, capture stream and
// recognition thread. Construction validates the model's feature
// configuration once; start/stop manage the stream and the worker. One-shot
// classification of WAV files and fixed-length microphone takes goes through
// the same extractor and classifier as the streaming path.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use tokio::sync::broadcast;

use crate::analysis::classifier::{classify, Classification};
use crate::analysis::features::SubbandExtractor;
use crate::analysis::{spawn_recognition_thread, Prediction, RecognitionWorker};
use crate::audio::capture::record_fixed_duration;
use crate::audio::{wav, CaptureStream, RingBuffer};
use crate::config::{AudioConfig, TriggerConfig};
use crate::error::{AnalysisError, AudioError, Error};
use crate::model::CommandModel;

struct RecognitionHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<Result<(), AudioError>>,
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("trigger", &self.trigger)
            .field("audio", &self.audio)
            .finish_non_exhaustive()
    }
}

pub struct Recognizer {
    model: Arc<CommandModel>,
    trigger: TriggerConfig,
    audio: AudioConfig,
    ring: Arc<RingBuffer>,
    extractor: SubbandExtractor,
    prediction_tx: broadcast::Sender<Prediction>,
    latest: Arc<RwLock<Prediction>>,
    capture: Option<CaptureStream>,
    worker: Option<RecognitionHandle>,
}

impl Recognizer {
    /// Build a recognizer around a trained model. Fails if the model's
    /// feature configuration cannot produce an extractor.
    pub fn new(
        model: CommandModel,
        trigger: TriggerConfig,
        audio: AudioConfig,
    ) -> Result<Self, Error> {
        if model.commands.is_empty() {
            return Err(AnalysisError::EmptyModel.into());
        }
        let extractor = SubbandExtractor::new(&model.feature_config())
            .map_err(Error::Analysis)?;
        let ring = Arc::new(RingBuffer::for_durations(
            audio.ring_seconds,
            audio.chunk_seconds,
        ));
        let (prediction_tx, _) = broadcast::channel(64);
        Ok(Self {
            model: Arc::new(model),
            trigger,
            audio,
            ring,
            extractor,
            prediction_tx,
            latest: Arc::new(RwLock::new(Prediction::Idle)),
            capture: None,
            worker: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Open the capture stream and start the recognition thread.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.worker.is_some() {
            return Err(AudioError::AlreadyRunning.into());
        }
        self.ring.clear();
        self.set_latest(Prediction::Idle);

        let fs = self.model.fs;
        let chunk_frames = ((self.audio.chunk_seconds * fs as f64) as usize).max(32);
        let capture = CaptureStream::open(
            fs,
            self.audio.device.as_deref(),
            chunk_frames,
            Arc::clone(&self.ring),
        )?;

        let stop = Arc::new(AtomicBool::new(false));
        let worker = RecognitionWorker::new(
            Arc::clone(&self.ring),
            self.extractor.clone(),
            Arc::clone(&self.model),
            self.trigger.clone(),
            capture.failure_flag(),
            Arc::clone(&stop),
            self.prediction_tx.clone(),
            Arc::clone(&self.latest),
        );
        let join = spawn_recognition_thread(worker);

        self.capture = Some(capture);
        self.worker = Some(RecognitionHandle { stop, join });
        log::info!("recognizer started at {} Hz", fs);
        Ok(())
    }

    /// Stop the recognition thread and close the capture stream. Returns the
    /// worker's result, so a stream failure during the session surfaces here.
    pub fn stop(&mut self) -> Result<(), Error> {
        let handle = self.worker.take().ok_or(AudioError::NotRunning)?;
        handle.stop.store(true, Ordering::SeqCst);
        self.capture = None;
        let result = match handle.join.join() {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(AudioError::StreamFailure {
                reason: "recognition thread panicked".into(),
            }
            .into()),
        };
        log::info!("recognizer stopped");
        result
    }

    /// Subscribe to the prediction stream. Slow subscribers miss events
    /// rather than stalling the loop.
    pub fn subscribe(&self) -> broadcast::Receiver<Prediction> {
        self.prediction_tx.subscribe()
    }

    /// Most recent prediction, for pull-style consumers.
    pub fn latest(&self) -> Prediction {
        self.latest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Input level of the newest capture chunk, when running.
    pub fn level_dbfs(&self) -> Option<f64> {
        self.capture.as_ref().map(|c| c.level_dbfs())
    }

    /// Classify a WAV file offline. The file's sample rate must match the
    /// model's.
    pub fn recognize_file<P: AsRef<Path>>(&self, path: P) -> Result<Classification, Error> {
        let (samples, fs) = wav::read_mono(path.as_ref())?;
        if fs != self.model.fs {
            return Err(AnalysisError::SampleRateMismatch {
                expected: self.model.fs,
                found: fs,
            }
            .into());
        }
        let features = self.extractor.extract(&samples).map_err(Error::Analysis)?;
        classify(&features.energies, &self.model).map_err(Error::Analysis)
    }

    /// Record one fixed-length take from the microphone and classify it.
    /// Defaults to exactly one frame of audio. Cannot run while the
    /// streaming session owns the input device.
    pub fn recognize_mic(&self, seconds: Option<f64>) -> Result<Classification, Error> {
        if self.worker.is_some() {
            return Err(AudioError::AlreadyRunning.into());
        }
        let fs = self.model.fs;
        let secs = seconds.unwrap_or(self.extractor.frame_len() as f64 / fs as f64);
        let samples = record_fixed_duration(fs, secs, self.audio.device.as_deref())?;
        let features = self.extractor.extract(&samples).map_err(Error::Analysis)?;
        classify(&features.energies, &self.model).map_err(Error::Analysis)
    }

    pub fn model(&self) -> &CommandModel {
        &self.model
    }

    fn set_latest(&self, prediction: Prediction) {
        let mut latest = self
            .latest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *latest = prediction;
    }
}
