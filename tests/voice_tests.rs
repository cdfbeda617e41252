// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use std::io::Write;
use std::sync::atomic::Ordering;

use common::{context, date, parsed, FakeVoiceApi, MemoryAudio, MemoryStore};
use moneytracker::dashboard::Dashboard;
use moneytracker::error::TrackerError;
use moneytracker::models::{MonthKey, TransactionKind};
use moneytracker::voice::{
    guess_mime, run_attempt, AudioSource, AudioStream, FileAudioSource, VoiceAction, VoiceEvent,
    VoicePipeline, VoiceStatus, DEVICE_ALERT, NO_TRANSACTIONS_ALERT,
};
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

fn two_entries() -> FakeVoiceApi {
    FakeVoiceApi::new(
        Ok("coffee five and salary one thousand".into()),
        Ok(vec![
            parsed("Coffee", 5, TransactionKind::Expense, "Food"),
            parsed("Salary", 1000, TransactionKind::Income, "Business"),
        ]),
    )
}

#[test]
fn successful_attempt_opens_review() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(vec![vec![1, 2, 3], vec![4, 5]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);

    assert!(outcome.alerts.is_empty());
    assert!(outcome.review_opened);
    assert_eq!(pipeline.status(), VoiceStatus::Idle);
    assert_eq!(pipeline.review().unwrap().len(), 2);
    assert!(audio.released.load(Ordering::SeqCst));
    assert_eq!(api.last_mime.lock().unwrap().as_deref(), Some("audio/webm"));
}

#[test]
fn confirm_saves_whole_batch_dated_today() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(vec![vec![9; 32]]);
    let mut pipeline = VoicePipeline::new();
    run_attempt(&mut pipeline, &mut audio, &api, &api);

    let store = MemoryStore::default();
    let mut dashboard = Dashboard::new(context("Mg Mg"), Vec::new(), 0);
    dashboard.select_month(MonthKey::new(2024, 3).unwrap());
    let batch = pipeline.take_review().unwrap();
    let notice = dashboard.confirm_voice_batch(&store, batch, date("2024-03-20"));

    assert_eq!(notice.message, "Saved 2 transactions");
    assert!(pipeline.review().is_none());
    assert_eq!(store.rows.borrow().len(), 2);
    let view = dashboard.view();
    assert_eq!(view.visible.len(), 2);
    assert!(view.visible.iter().all(|t| t.date == date("2024-03-20")));
    assert_eq!(view.stats.net, Decimal::from(995));
}

#[test]
fn cancel_discards_batch() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    run_attempt(&mut pipeline, &mut audio, &api, &api);
    pipeline.discard_review();
    assert!(pipeline.review().is_none());
    assert!(pipeline.accepts_press());
}

#[test]
fn failed_batch_adds_nothing() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    run_attempt(&mut pipeline, &mut audio, &api, &api);

    let store = MemoryStore::default();
    store.fail.set(true);
    let mut dashboard = Dashboard::new(context("Mg Mg"), Vec::new(), 0);
    let notice =
        dashboard.confirm_voice_batch(&store, pipeline.take_review().unwrap(), date("2024-03-20"));
    assert!(notice.is_error());
    assert!(dashboard.transactions().is_empty());
}

#[test]
fn empty_parse_alerts_and_returns_to_idle() {
    let api = FakeVoiceApi::new(Ok("hello there".into()), Ok(Vec::new()));
    let mut audio = MemoryAudio::with_chunks(vec![vec![1, 2]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);

    assert_eq!(outcome.alerts, vec![NO_TRANSACTIONS_ALERT.to_string()]);
    assert!(!outcome.review_opened);
    assert!(pipeline.review().is_none());
    assert_eq!(pipeline.status(), VoiceStatus::Idle);
}

#[test]
fn denied_device_never_reaches_network() {
    let api = two_entries();
    let mut audio = MemoryAudio::denied();
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);

    assert_eq!(outcome.alerts, vec![DEVICE_ALERT.to_string()]);
    assert_eq!(pipeline.status(), VoiceStatus::Idle);
    assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_transcript_skips_parsing() {
    let api = FakeVoiceApi::new(Ok("  ".into()), Ok(Vec::new()));
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);

    assert_eq!(outcome.alerts, vec!["Error: Transcription failed".to_string()]);
    assert_eq!(api.parse_calls.load(Ordering::SeqCst), 0);
    assert!(audio.released.load(Ordering::SeqCst));
}

#[test]
fn service_errors_surface_their_message() {
    let api = FakeVoiceApi::new(Err("quota exceeded".into()), Ok(Vec::new()));
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert_eq!(outcome.alerts, vec!["Error: quota exceeded".to_string()]);

    let api = FakeVoiceApi::new(Ok("coffee".into()), Err("bad json".into()));
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert_eq!(outcome.alerts, vec!["Error: bad json".to_string()]);
    assert_eq!(pipeline.status(), VoiceStatus::Idle);
}

#[test]
fn silent_capture_is_not_sent() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(Vec::new());
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn state_machine_walks_each_status() {
    let mut p = VoicePipeline::new();
    assert_eq!(p.handle(VoiceEvent::Pressed), vec![VoiceAction::OpenCapture]);
    assert!(!p.accepts_press());
    assert!(p.handle(VoiceEvent::Pressed).is_empty());

    p.handle(VoiceEvent::CaptureStarted { mime_type: "audio/mp4".into() });
    assert_eq!(p.status(), VoiceStatus::Recording);
    assert_eq!(p.status().caption(), "Recording...");
    p.handle(VoiceEvent::Chunk(vec![1, 2]));
    p.handle(VoiceEvent::Chunk(vec![3]));

    let actions = p.handle(VoiceEvent::Released);
    assert_eq!(actions[0], VoiceAction::ReleaseCapture);
    match &actions[1] {
        VoiceAction::Transcribe(clip) => {
            assert_eq!(clip.mime_type, "audio/mp4");
            assert_eq!(clip.bytes, vec![1, 2, 3]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(p.status(), VoiceStatus::Transcribing);
    // presses are ignored while a request is in flight
    assert!(p.handle(VoiceEvent::Pressed).is_empty());

    assert_eq!(
        p.handle(VoiceEvent::Transcribed(Ok("coffee 5".into()))),
        vec![VoiceAction::Parse("coffee 5".into())]
    );
    assert_eq!(p.status(), VoiceStatus::Analyzing);
    assert_eq!(p.status().caption(), "AI Analyzing...");

    let actions = p.handle(VoiceEvent::Parsed(Err(TrackerError::Pipeline("down".into()))));
    assert_eq!(actions, vec![VoiceAction::Alert("Error: down".into())]);
    assert_eq!(p.status(), VoiceStatus::Idle);
    assert!(p.accepts_press());
}

#[test]
fn file_source_streams_clip_and_guesses_type() {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(&[7u8; 40_000]).unwrap();
    let mut source = FileAudioSource::new(f.path(), Some("audio/ogg".into()));
    let mut stream = source.open().unwrap();
    assert_eq!(stream.mime_type(), "audio/ogg");
    let mut total = 0;
    while let Some(chunk) = stream.next_chunk().unwrap() {
        total += chunk.len();
    }
    assert_eq!(total, 40_000);
    stream.close();
    assert!(stream.next_chunk().unwrap().is_none());

    assert_eq!(guess_mime(std::path::Path::new("memo.M4A")), "audio/mp4");
    assert_eq!(guess_mime(std::path::Path::new("memo")), "audio/webm");

    let mut missing = FileAudioSource::new("/nonexistent/clip.webm", None);
    assert!(matches!(missing.open(), Err(TrackerError::Device(_))));
}

#[test]
fn out_of_range_suggestions_are_dropped() {
    let mut huge = parsed("Typo", 0, TransactionKind::Expense, "General");
    huge.amount = Decimal::MAX;
    let api = FakeVoiceApi::new(
        Ok("refund fifty and tea two".into()),
        Ok(vec![
            parsed("Refund", -50, TransactionKind::Expense, "General"),
            parsed("Tea", 2, TransactionKind::Expense, "Food"),
            parsed("Nothing", 0, TransactionKind::Income, "General"),
            huge,
        ]),
    );
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert!(outcome.review_opened);
    let batch = pipeline.take_review().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.entries()[0].label, "Tea");

    let store = MemoryStore::default();
    let mut dashboard = Dashboard::new(context("Mg Mg"), Vec::new(), 0);
    dashboard.select_month(MonthKey::new(2024, 3).unwrap());
    dashboard.confirm_voice_batch(&store, batch, date("2024-03-20"));
    assert_eq!(dashboard.view().stats.expense, Decimal::from(2));
    assert!(store.rows.borrow().iter().all(|t| t.amount > Decimal::ZERO));
}

#[test]
fn only_negative_suggestions_count_as_none_found() {
    let api = FakeVoiceApi::new(
        Ok("refund fifty".into()),
        Ok(vec![parsed("Refund", -50, TransactionKind::Expense, "General")]),
    );
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    let outcome = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert_eq!(outcome.alerts, vec![NO_TRANSACTIONS_ALERT.to_string()]);
    assert!(pipeline.review().is_none());
    assert_eq!(pipeline.status(), VoiceStatus::Idle);
}

#[test]
fn open_review_blocks_new_recording() {
    let api = two_entries();
    let mut audio = MemoryAudio::with_chunks(vec![vec![1]]);
    let mut pipeline = VoicePipeline::new();
    run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert!(!pipeline.accepts_press());
    assert!(pipeline.handle(VoiceEvent::Pressed).is_empty());

    let again = run_attempt(&mut pipeline, &mut audio, &api, &api);
    assert!(!again.review_opened);
    assert_eq!(api.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.review().unwrap().len(), 2);

    pipeline.discard_review();
    assert!(pipeline.accepts_press());
}
