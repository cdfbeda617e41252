// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Voice-entered transactions.
//!
//! [`VoicePipeline`] is a pure state machine:
//! `idle -> recording -> transcribing -> analyzing -> idle`, falling back to
//! idle with an alert on any failure. It never performs I/O; it answers each
//! [`VoiceEvent`] with the [`VoiceAction`]s the caller must carry out.
//! [`run_attempt`] is the driver: it owns the capture device and runs each
//! remote call on a worker thread whose result comes back as an event.
//!
//! Nothing is retried and nothing is cancellable once sent.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use chrono::NaiveDate;

use crate::ai::{AudioClip, TransactionParser, Transcriber};
use crate::error::{Result, TrackerError};
use crate::models::{is_valid_amount, NewTransaction, ParsedVoiceTransaction};

pub const NO_TRANSACTIONS_ALERT: &str = "Could not find any transactions in audio.";
pub const DEVICE_ALERT: &str = "Microphone access denied or not available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    Idle,
    Recording,
    Transcribing,
    Analyzing,
}

impl VoiceStatus {
    /// Hint shown under the control.
    pub fn caption(&self) -> &'static str {
        match self {
            VoiceStatus::Idle => "Hold to Speak",
            VoiceStatus::Recording => "Recording...",
            VoiceStatus::Transcribing => "Transcribing...",
            VoiceStatus::Analyzing => "AI Analyzing...",
        }
    }
}

#[derive(Debug)]
pub enum VoiceEvent {
    Pressed,
    CaptureStarted { mime_type: String },
    CaptureFailed(String),
    Chunk(Vec<u8>),
    Released,
    Transcribed(Result<String>),
    Parsed(Result<Vec<ParsedVoiceTransaction>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceAction {
    OpenCapture,
    ReleaseCapture,
    Transcribe(AudioClip),
    Parse(String),
    Alert(String),
    OpenReview,
}

/// Parsed entries awaiting an all-or-nothing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewBatch {
    entries: Vec<ParsedVoiceTransaction>,
}

impl ReviewBatch {
    pub fn entries(&self) -> &[ParsedVoiceTransaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One create request per entry, all dated `today`.
    pub fn confirm(self, today: NaiveDate) -> Vec<NewTransaction> {
        self.entries
            .into_iter()
            .map(|e| NewTransaction {
                amount: e.amount,
                label: e.label,
                date: today,
                kind: e.kind,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct VoicePipeline {
    status: VoiceStatus,
    capture_pending: bool,
    mime_type: String,
    chunks: Vec<Vec<u8>>,
    review: Option<ReviewBatch>,
}

impl Default for VoicePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePipeline {
    pub fn new() -> Self {
        VoicePipeline {
            status: VoiceStatus::Idle,
            capture_pending: false,
            mime_type: String::new(),
            chunks: Vec::new(),
            review: None,
        }
    }

    pub fn status(&self) -> VoiceStatus {
        self.status
    }

    /// The control is disabled while a request is in flight or a review is
    /// still open.
    pub fn accepts_press(&self) -> bool {
        self.status == VoiceStatus::Idle && !self.capture_pending && self.review.is_none()
    }

    pub fn review(&self) -> Option<&ReviewBatch> {
        self.review.as_ref()
    }

    pub fn take_review(&mut self) -> Option<ReviewBatch> {
        self.review.take()
    }

    /// Cancel: the whole batch is dropped.
    pub fn discard_review(&mut self) {
        if let Some(batch) = self.review.take() {
            log::info!("discarded {} reviewed entries", batch.len());
        }
    }

    fn reset(&mut self) {
        self.status = VoiceStatus::Idle;
        self.capture_pending = false;
        self.chunks.clear();
        self.mime_type.clear();
    }

    fn fail(&mut self, message: String) -> Vec<VoiceAction> {
        log::warn!("voice attempt failed in {:?}: {}", self.status, message);
        self.reset();
        vec![VoiceAction::Alert(message)]
    }

    pub fn handle(&mut self, event: VoiceEvent) -> Vec<VoiceAction> {
        let before = self.status;
        let actions = match (self.status, event) {
            (VoiceStatus::Idle, VoiceEvent::Pressed) if self.accepts_press() => {
                self.capture_pending = true;
                vec![VoiceAction::OpenCapture]
            }
            (VoiceStatus::Idle, VoiceEvent::CaptureStarted { mime_type })
                if self.capture_pending =>
            {
                self.capture_pending = false;
                self.mime_type = mime_type;
                self.chunks.clear();
                self.status = VoiceStatus::Recording;
                Vec::new()
            }
            (VoiceStatus::Idle, VoiceEvent::CaptureFailed(reason)) if self.capture_pending => {
                log::debug!("capture unavailable: {}", reason);
                self.fail(DEVICE_ALERT.to_string())
            }
            (VoiceStatus::Recording, VoiceEvent::Chunk(bytes)) => {
                if !bytes.is_empty() {
                    self.chunks.push(bytes);
                }
                Vec::new()
            }
            (VoiceStatus::Recording, VoiceEvent::CaptureFailed(reason)) => {
                let mut actions = vec![VoiceAction::ReleaseCapture];
                actions.extend(self.fail(format!("Error: {}", reason)));
                actions
            }
            (VoiceStatus::Recording, VoiceEvent::Released) => {
                let bytes = self.chunks.concat();
                let mime_type = std::mem::take(&mut self.mime_type);
                self.chunks.clear();
                let mut actions = vec![VoiceAction::ReleaseCapture];
                if bytes.is_empty() {
                    actions.extend(self.fail("No audio was captured.".to_string()));
                } else {
                    self.status = VoiceStatus::Transcribing;
                    actions.push(VoiceAction::Transcribe(AudioClip { mime_type, bytes }));
                }
                actions
            }
            (VoiceStatus::Transcribing, VoiceEvent::Transcribed(Ok(text))) => {
                if text.trim().is_empty() {
                    self.fail("Error: Transcription failed".to_string())
                } else {
                    self.status = VoiceStatus::Analyzing;
                    vec![VoiceAction::Parse(text)]
                }
            }
            (VoiceStatus::Transcribing, VoiceEvent::Transcribed(Err(e))) => {
                self.fail(format!("Error: {}", e))
            }
            (VoiceStatus::Analyzing, VoiceEvent::Parsed(Ok(entries))) => {
                let entries = usable_entries(entries);
                if entries.is_empty() {
                    self.fail(NO_TRANSACTIONS_ALERT.to_string())
                } else {
                    self.reset();
                    self.review = Some(ReviewBatch { entries });
                    vec![VoiceAction::OpenReview]
                }
            }
            (VoiceStatus::Analyzing, VoiceEvent::Parsed(Err(e))) => {
                self.fail(format!("Error: {}", e))
            }
            (status, event) => {
                log::debug!("voice: ignoring {:?} while {:?}", event, status);
                Vec::new()
            }
        };
        if before != self.status {
            log::debug!("voice: {:?} -> {:?}", before, self.status);
        }
        actions
    }
}

/// Drops suggestions whose amount is not a positive figure in range.
fn usable_entries(entries: Vec<ParsedVoiceTransaction>) -> Vec<ParsedVoiceTransaction> {
    entries
        .into_iter()
        .filter(|e| {
            let ok = is_valid_amount(&e.amount);
            if !ok {
                log::warn!("dropping parsed entry '{}' with amount {}", e.label, e.amount);
            }
            ok
        })
        .collect()
}

/// Capture device seam.
pub trait AudioSource {
    type Stream: AudioStream;

    /// Fails with [`TrackerError::Device`] when capture is denied or missing.
    fn open(&mut self) -> Result<Self::Stream>;
}

pub trait AudioStream {
    fn mime_type(&self) -> &str;
    /// `Ok(None)` once the user lets go.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
    /// Releases the device; safe to call more than once.
    fn close(&mut self);
}

/// A pre-recorded clip standing in for the microphone.
#[derive(Debug, Clone)]
pub struct FileAudioSource {
    path: PathBuf,
    mime_type: String,
    chunk_size: usize,
}

impl FileAudioSource {
    pub fn new(path: impl Into<PathBuf>, mime_type: Option<String>) -> Self {
        let path = path.into();
        let mime_type = mime_type.unwrap_or_else(|| guess_mime(&path).to_string());
        FileAudioSource {
            path,
            mime_type,
            chunk_size: 16 * 1024,
        }
    }
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "mp3" => "audio/mpeg",
        _ => "audio/webm",
    }
}

pub struct FileAudioStream {
    file: Option<File>,
    mime_type: String,
    chunk_size: usize,
}

impl AudioSource for FileAudioSource {
    type Stream = FileAudioStream;

    fn open(&mut self) -> Result<FileAudioStream> {
        let file = File::open(&self.path).map_err(|e| {
            TrackerError::Device(format!("{}: {}", self.path.display(), e))
        })?;
        log::info!("capturing from {}", self.path.display());
        Ok(FileAudioStream {
            file: Some(file),
            mime_type: self.mime_type.clone(),
            chunk_size: self.chunk_size,
        })
    }
}

impl AudioStream for FileAudioStream {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; self.chunk_size];
        let n = file
            .read(&mut buf)
            .map_err(|e| TrackerError::Device(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            log::debug!("capture released");
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub alerts: Vec<String>,
    pub review_opened: bool,
}

/// Drives one press-and-release attempt to completion. The capture stream
/// is drained until it ends, which stands for the release gesture.
pub fn run_attempt<A, T, P>(
    pipeline: &mut VoicePipeline,
    source: &mut A,
    transcriber: &T,
    parser: &P,
) -> AttemptOutcome
where
    A: AudioSource,
    T: Transcriber + Sync + ?Sized,
    P: TransactionParser + Sync + ?Sized,
{
    let mut outcome = AttemptOutcome::default();
    if !pipeline.accepts_press() {
        return outcome;
    }
    let (tx, rx) = mpsc::channel::<VoiceEvent>();
    thread::scope(|scope| {
        let mut queue = VecDeque::from([VoiceEvent::Pressed]);
        let mut stream: Option<A::Stream> = None;
        let mut in_flight = 0usize;
        loop {
            let event = match queue.pop_front() {
                Some(e) => e,
                None if in_flight > 0 => match rx.recv() {
                    Ok(e) => {
                        in_flight -= 1;
                        e
                    }
                    Err(_) => break,
                },
                None => break,
            };
            for action in pipeline.handle(event) {
                match action {
                    VoiceAction::OpenCapture => match source.open() {
                        Ok(mut s) => {
                            queue.push_back(VoiceEvent::CaptureStarted {
                                mime_type: s.mime_type().to_string(),
                            });
                            loop {
                                match s.next_chunk() {
                                    Ok(Some(chunk)) => queue.push_back(VoiceEvent::Chunk(chunk)),
                                    Ok(None) => break,
                                    Err(e) => {
                                        queue.push_back(VoiceEvent::CaptureFailed(e.to_string()));
                                        break;
                                    }
                                }
                            }
                            queue.push_back(VoiceEvent::Released);
                            stream = Some(s);
                        }
                        Err(e) => queue.push_back(VoiceEvent::CaptureFailed(e.to_string())),
                    },
                    VoiceAction::ReleaseCapture => {
                        if let Some(mut s) = stream.take() {
                            s.close();
                        }
                    }
                    VoiceAction::Transcribe(clip) => {
                        let tx = tx.clone();
                        in_flight += 1;
                        scope.spawn(move || {
                            let _ = tx.send(VoiceEvent::Transcribed(transcriber.transcribe(&clip)));
                        });
                    }
                    VoiceAction::Parse(text) => {
                        let tx = tx.clone();
                        in_flight += 1;
                        scope.spawn(move || {
                            let _ = tx.send(VoiceEvent::Parsed(parser.parse(&text)));
                        });
                    }
                    VoiceAction::Alert(msg) => outcome.alerts.push(msg),
                    VoiceAction::OpenReview => outcome.review_opened = true,
                }
            }
        }
        if let Some(mut s) = stream.take() {
            s.close();
        }
    });
    outcome
}
