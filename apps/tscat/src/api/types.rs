//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use serde::{Deserialize, Serialize};
use tscat_core::{
    CatalogFormat, CatalogSession, LintFinding, LintReport, Progress, Severity, TscatError,
    primitives::MAX_KEY_LENGTH,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Catalog statistics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub language: Option<String>,
    pub format: CatalogFormat,
    pub contexts: usize,
    pub messages: usize,
    pub finished: usize,
    pub unfinished: usize,
    /// Marked finished without text; not served.
    pub empty: usize,
    pub retired: usize,
    pub numerus: usize,
    /// Entries the translator actually serves.
    pub entries: usize,
    pub percent_complete: u8,
    pub progress: Progress,
    pub checksum: u64,
}

impl StatusResponse {
    pub fn from_session(session: &CatalogSession) -> Self {
        let stats = session.stats();
        Self {
            language: stats.language,
            format: session.format(),
            contexts: stats.contexts,
            messages: stats.messages,
            finished: stats.finished,
            unfinished: stats.unfinished,
            empty: stats.empty,
            retired: stats.retired,
            numerus: stats.numerus,
            entries: session.translator().len(),
            percent_complete: stats.percent_complete,
            progress: stats.progress,
            checksum: session.checksum(),
        }
    }
}

// =============================================================================
// LOOKUP REQUEST/RESPONSE
// =============================================================================

/// Lookup request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub context: String,
    pub source: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Count for plural messages.
    #[serde(default)]
    pub n: Option<i64>,
}

impl LookupRequest {
    /// Reject empty sources and oversized key components.
    pub fn validate(&self) -> Result<(), TscatError> {
        if self.source.is_empty() {
            return Err(TscatError::InvalidStructure(
                "source must not be empty".to_string(),
            ));
        }

        let fields = [
            ("context", self.context.len()),
            ("source", self.source.len()),
            ("comment", self.comment.as_deref().map_or(0, str::len)),
        ];
        for (name, len) in fields {
            if len > MAX_KEY_LENGTH {
                return Err(TscatError::LimitExceeded(format!(
                    "{} length {} exceeds maximum {} bytes",
                    name, len, MAX_KEY_LENGTH
                )));
            }
        }
        Ok(())
    }
}

/// Lookup response. `translation` is the source text when `found` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub translation: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupResponse {
    pub fn new(translation: String, found: bool) -> Self {
        Self {
            translation,
            found,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            translation: String::new(),
            found: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// LINT RESPONSE
// =============================================================================

/// Lint report response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintResponse {
    pub passed: bool,
    pub fail_on: Severity,
    pub errors: usize,
    pub warnings: usize,
    pub findings: Vec<LintFinding>,
}

impl From<LintReport> for LintResponse {
    fn from(report: LintReport) -> Self {
        Self {
            passed: report.passed(),
            fail_on: report.fail_on,
            errors: report.errors(),
            warnings: report.warnings(),
            findings: report.findings,
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded compiled catalog
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: &[u8], checksum: u64) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// HASH RESPONSE
// =============================================================================

/// BLAKE3 hash of the compiled catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    pub success: bool,
    pub algorithm: String,
    pub hash: Option<String>,
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl HashResponse {
    pub fn success(hash: String, checksum: u64) -> Self {
        Self {
            success: true,
            algorithm: "blake3".to_string(),
            hash: Some(hash),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            algorithm: "blake3".to_string(),
            hash: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// RELOAD RESPONSE
// =============================================================================

/// Result of re-reading the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub messages: Option<usize>,
    pub entries: Option<usize>,
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl ReloadResponse {
    pub fn success(session: &CatalogSession) -> Self {
        Self {
            success: true,
            messages: Some(session.catalog().message_count()),
            entries: Some(session.translator().len()),
            checksum: Some(session.checksum()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: None,
            entries: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}
