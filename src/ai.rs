// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Remote speech-to-text and text-to-transactions endpoints.

use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::models::ParsedVoiceTransaction;
use crate::utils::http_client;

/// A finalized recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

pub trait Transcriber {
    fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

pub trait TransactionParser {
    fn parse(&self, text: &str) -> Result<Vec<ParsedVoiceTransaction>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscribeRequest<'a> {
    audio: String,
    mime_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    transactions: Option<Vec<ParsedVoiceTransaction>>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for `POST {api_base}/api/transcribe` and `POST {api_base}/api/parse`.
#[derive(Debug, Clone)]
pub struct VoiceApi {
    http: Client,
    base: String,
}

impl VoiceApi {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(VoiceApi {
            http: http_client(config.http_timeout_secs)?,
            base: config.api_base.clone(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{}", self.base, name)
    }
}

/// Error bodies are JSON `{error}` when the relay produced them, anything
/// else when a proxy did.
fn pipeline_failure(resp: Response, fallback: &str) -> TrackerError {
    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("{} ({})", fallback, status));
    TrackerError::Pipeline(msg)
}

impl Transcriber for VoiceApi {
    fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        log::info!(
            "transcribing {} bytes of {}",
            clip.bytes.len(),
            clip.mime_type
        );
        let resp = self
            .http
            .post(self.endpoint("transcribe"))
            .json(&TranscribeRequest {
                audio: clip.to_base64(),
                mime_type: &clip.mime_type,
            })
            .send()
            .map_err(|e| TrackerError::Pipeline(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(pipeline_failure(resp, "Transcription failed"));
        }
        let body: TranscribeResponse = resp
            .json()
            .map_err(|e| TrackerError::Pipeline(e.to_string()))?;
        match body.text.filter(|t| !t.trim().is_empty()) {
            Some(text) => Ok(text),
            None => Err(TrackerError::Pipeline(
                body.error.unwrap_or_else(|| "Transcription failed".into()),
            )),
        }
    }
}

impl TransactionParser for VoiceApi {
    fn parse(&self, text: &str) -> Result<Vec<ParsedVoiceTransaction>> {
        log::info!("parsing transcript ({} chars)", text.chars().count());
        let resp = self
            .http
            .post(self.endpoint("parse"))
            .json(&ParseRequest { text })
            .send()
            .map_err(|e| TrackerError::Pipeline(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(pipeline_failure(resp, "Parsing failed"));
        }
        let body: ParseResponse = resp
            .json()
            .map_err(|e| TrackerError::Pipeline(e.to_string()))?;
        match (body.transactions, body.error) {
            (Some(list), _) => Ok(list),
            (None, Some(err)) => Err(TrackerError::Pipeline(err)),
            (None, None) => Ok(Vec::new()),
        }
    }
}
