//! # Session Module
//!
//! A loaded catalog together with the translator built from it.
//!
//! Catalogs arrive in one of three formats:
//! - `Ts`: Qt Linguist XML, the editable source of truth
//! - `Json`: the catalog model as JSON, for tooling that does not speak XML
//! - `Compiled`: the checksummed run-time form (servable entries only)
//!
//! [`CatalogSession::from_bytes`] detects the format from the content.
//! A session never changes after construction; reloading means building a
//! new one.

use crate::compiled::{self, CompiledCatalog};
use crate::formats::{parse_ts, write_ts};
use crate::lint::{LintConfig, LintReport, Linter};
use crate::primitives::{MAX_MESSAGES, MAX_PLURAL_FORMS, MAX_TS_INPUT_SIZE};
use crate::stats::CatalogStats;
use crate::translator::{Lookup, Translator};
use crate::{Catalog, TranslationText, TscatError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CATALOG FORMAT
// =============================================================================

/// On-disk representation of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    #[default]
    Ts,
    Json,
    Compiled,
}

impl CatalogFormat {
    /// Detect the format of raw file content.
    ///
    /// Compiled magic is checked first, then the first non-blank character:
    /// `<` for TS, `{` for JSON.
    #[must_use]
    pub fn detect(data: &[u8]) -> Option<Self> {
        if compiled::is_compiled(data) {
            return Some(Self::Compiled);
        }
        let text = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        match text.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'<') => Some(Self::Ts),
            Some(b'{') => Some(Self::Json),
            _ => None,
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Json => "json",
            Self::Compiled => "tsqm",
        }
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ts => "ts",
            Self::Json => "json",
            Self::Compiled => "compiled",
        })
    }
}

impl FromStr for CatalogFormat {
    type Err = TscatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ts" | "xml" => Ok(Self::Ts),
            "json" => Ok(Self::Json),
            "compiled" | "tsqm" | "bin" => Ok(Self::Compiled),
            other => Err(TscatError::ConfigError(format!(
                "unknown catalog format '{other}' (expected ts, json or compiled)"
            ))),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// A catalog loaded for querying.
#[derive(Debug, Clone)]
pub struct CatalogSession {
    catalog: Catalog,
    translator: Translator,
    format: CatalogFormat,
}

impl CatalogSession {
    /// Wrap an in-memory catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self::with_format(catalog, CatalogFormat::Ts)
    }

    fn with_format(catalog: Catalog, format: CatalogFormat) -> Self {
        let translator = Translator::from_catalog(&catalog);
        Self {
            catalog,
            translator,
            format,
        }
    }

    /// Parse a TS document.
    pub fn from_ts(input: &str) -> Result<Self, TscatError> {
        Ok(Self::with_format(parse_ts(input)?, CatalogFormat::Ts))
    }

    /// Parse a JSON catalog.
    pub fn from_json(input: &str) -> Result<Self, TscatError> {
        if input.len() > MAX_TS_INPUT_SIZE {
            return Err(TscatError::LimitExceeded(format!(
                "input of {} bytes exceeds maximum {}",
                input.len(),
                MAX_TS_INPUT_SIZE
            )));
        }
        let catalog: Catalog = serde_json::from_str(input)
            .map_err(|e| TscatError::DeserializationError(format!("JSON: {}", e)))?;
        if catalog.message_count() > MAX_MESSAGES {
            return Err(TscatError::LimitExceeded(format!(
                "catalog has more than {MAX_MESSAGES} messages"
            )));
        }
        // Hold JSON to what a TS file can express.
        for (context, message) in catalog.messages() {
            if let TranslationText::Plural(forms) = &message.translation.text {
                if forms.is_empty() {
                    return Err(TscatError::InvalidStructure(format!(
                        "'{}' in context '{}' has a plural translation with no forms",
                        message.source, context
                    )));
                }
                if forms.len() > MAX_PLURAL_FORMS {
                    return Err(TscatError::LimitExceeded(format!(
                        "translation has more than {MAX_PLURAL_FORMS} plural forms"
                    )));
                }
            }
        }
        Ok(Self::with_format(catalog, CatalogFormat::Json))
    }

    /// Load a compiled catalog.
    ///
    /// The session's catalog holds only the compiled entries.
    pub fn from_compiled(data: &[u8]) -> Result<Self, TscatError> {
        let compiled = compiled::load_compiled(data)?;
        Ok(Self {
            catalog: compiled.to_catalog(),
            translator: compiled.translator(),
            format: CatalogFormat::Compiled,
        })
    }

    /// Load any supported format, detected from the content.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TscatError> {
        match CatalogFormat::detect(data) {
            Some(CatalogFormat::Compiled) => Self::from_compiled(data),
            Some(format) => {
                let text = std::str::from_utf8(data).map_err(|e| {
                    TscatError::DeserializationError(format!("input is not UTF-8: {}", e))
                })?;
                let text = text.strip_prefix('\u{feff}').unwrap_or(text);
                if format == CatalogFormat::Json {
                    Self::from_json(text)
                } else {
                    Self::from_ts(text)
                }
            }
            None => Err(TscatError::InvalidStructure(
                "unrecognized catalog format".to_string(),
            )),
        }
    }

    /// The loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The translator serving this catalog.
    #[must_use]
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Format the session was loaded from.
    #[must_use]
    pub fn format(&self) -> CatalogFormat {
        self.format
    }

    /// Counts and completion of the catalog.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        CatalogStats::from_catalog(&self.catalog)
    }

    /// Lint the catalog.
    #[must_use]
    pub fn lint(&self, config: &LintConfig) -> LintReport {
        Linter::new(config.clone()).lint(&self.catalog)
    }

    /// Look up a translation, falling back to the source.
    #[must_use]
    pub fn lookup(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        count: Option<i64>,
    ) -> Lookup {
        self.translator.lookup(context, source, comment, count)
    }

    /// Checksum of the compiled form.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        CompiledCatalog::from_translator(&self.translator).checksum()
    }

    /// Compiled bytes of the catalog.
    pub fn compile(&self) -> Result<Vec<u8>, TscatError> {
        compiled::encode(&CompiledCatalog::from_translator(&self.translator))
    }

    /// Serialize the catalog in the requested format.
    pub fn export(&self, format: CatalogFormat) -> Result<Vec<u8>, TscatError> {
        match format {
            CatalogFormat::Ts => Ok(write_ts(&self.catalog).into_bytes()),
            CatalogFormat::Json => serde_json::to_vec_pretty(&self.catalog)
                .map_err(|e| TscatError::SerializationError(format!("JSON: {}", e))),
            CatalogFormat::Compiled => self.compile(),
        }
    }

    /// BLAKE3 digest (hex) of the compiled bytes.
    ///
    /// # Requires
    ///
    /// This function is only available with the `crypto-hash` feature enabled.
    #[cfg(feature = "crypto-hash")]
    pub fn crypto_hash(&self) -> Result<String, TscatError> {
        self.compile().map(|data| compiled::compute_blake3_hash(&data))
    }
}

// =============================================================================
// TESTS
// =============================================================================
