// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

/// Failures surfaced to the user. None of them ends the session and none is
/// retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Bad credentials, duplicate sign-up, missing session.
    #[error("{0}")]
    Auth(String),
    /// Insert/update/delete/list rejected by the transaction store.
    #[error("{0}")]
    Persistence(String),
    /// Microphone (or stand-in capture source) unavailable.
    #[error("{0}")]
    Device(String),
    /// Transcription or parsing failed or came back empty.
    #[error("{0}")]
    Pipeline(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Config(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
