//! Analytics port: best-effort telemetry delivery.
//!
//! The engine never lets this port fail an operation: every error is caught
//! at the call site and logged. Adapters here are intentionally thin; the
//! real pipeline lives behind whatever endpoint `HttpAnalytics` points at.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use recall_core::events::{EventKind, ItemAnswered};
use recall_core::model::SessionStatistics;
use recall_storage::SessionRecord;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("analytics transport failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for AnalyticsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Telemetry contract consumed by the session engine. All methods are
/// best-effort: callers catch and discard errors.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Report a session start.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError` on delivery failure; the engine discards it.
    async fn track_session_start(&self, session: SessionRecord) -> Result<(), AnalyticsError>;

    /// Report one answered item.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError` on delivery failure; the engine discards it.
    async fn track_answer(&self, answer: ItemAnswered) -> Result<(), AnalyticsError>;

    /// Report final session statistics.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError` on delivery failure; the engine discards it.
    async fn track_session_complete(
        &self,
        statistics: SessionStatistics,
    ) -> Result<(), AnalyticsError>;

    /// Report an arbitrary event payload.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError` on delivery failure; the engine discards it.
    async fn track_event(&self, kind: EventKind, payload: Value) -> Result<(), AnalyticsError>;
}

//
// ─── NULL SINK ─────────────────────────────────────────────────────────────────
//

/// Discards everything. The default when no analytics pipeline is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalytics;

#[async_trait]
impl AnalyticsSink for NullAnalytics {
    async fn track_session_start(&self, _session: SessionRecord) -> Result<(), AnalyticsError> {
        Ok(())
    }

    async fn track_answer(&self, _answer: ItemAnswered) -> Result<(), AnalyticsError> {
        Ok(())
    }

    async fn track_session_complete(
        &self,
        _statistics: SessionStatistics,
    ) -> Result<(), AnalyticsError> {
        Ok(())
    }

    async fn track_event(&self, _kind: EventKind, _payload: Value) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

//
// ─── RECORDING SINK ────────────────────────────────────────────────────────────
//

/// Captures every call for assertions in tests.
#[derive(Clone, Default)]
pub struct RecordingAnalytics {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingAnalytics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(call, payload)` pairs in delivery order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: &str, payload: Value) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((call.to_string(), payload));
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalytics {
    async fn track_session_start(&self, session: SessionRecord) -> Result<(), AnalyticsError> {
        let payload =
            serde_json::to_value(&session).map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.record("session_start", payload);
        Ok(())
    }

    async fn track_answer(&self, answer: ItemAnswered) -> Result<(), AnalyticsError> {
        let payload =
            serde_json::to_value(&answer).map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.record("answer", payload);
        Ok(())
    }

    async fn track_session_complete(
        &self,
        statistics: SessionStatistics,
    ) -> Result<(), AnalyticsError> {
        let payload = serde_json::to_value(&statistics)
            .map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.record("session_complete", payload);
        Ok(())
    }

    async fn track_event(&self, kind: EventKind, payload: Value) -> Result<(), AnalyticsError> {
        self.record(&kind.to_string(), payload);
        Ok(())
    }
}

//
// ─── HTTP SINK ─────────────────────────────────────────────────────────────────
//

/// Posts JSON envelopes to a collector endpoint.
///
/// Failures surface as `AnalyticsError::Transport`; the engine logs and
/// drops them, so a dead collector never stalls a session.
#[derive(Debug, Clone)]
pub struct HttpAnalytics {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalytics {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn post(&self, event: &str, payload: Value) -> Result<(), AnalyticsError> {
        let envelope = json!({ "event": event, "payload": payload });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalytics {
    async fn track_session_start(&self, session: SessionRecord) -> Result<(), AnalyticsError> {
        let payload =
            serde_json::to_value(&session).map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.post("session_start", payload).await
    }

    async fn track_answer(&self, answer: ItemAnswered) -> Result<(), AnalyticsError> {
        let payload =
            serde_json::to_value(&answer).map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.post("answer", payload).await
    }

    async fn track_session_complete(
        &self,
        statistics: SessionStatistics,
    ) -> Result<(), AnalyticsError> {
        let payload = serde_json::to_value(&statistics)
            .map_err(|e| AnalyticsError::Transport(e.to_string()))?;
        self.post("session_complete", payload).await
    }

    async fn track_event(&self, kind: EventKind, payload: Value) -> Result<(), AnalyticsError> {
        self.post(&kind.to_string(), payload).await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
