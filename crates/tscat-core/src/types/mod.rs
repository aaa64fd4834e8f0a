//! # Core Type Definitions
//!
//! This module contains the catalog model for Qt Linguist translation files:
//! - Document structure (`Catalog`, `Context`, `Message`)
//! - Translation payload (`Translation`, `TranslationStatus`, `TranslationText`)
//! - Source locations (`Location`, `LineRef`)
//! - Lookup keys (`MessageKey`)
//! - Error types (`TscatError`)
//!
//! ## Ordering Guarantees
//!
//! Contexts and messages keep document order. Everything that needs a
//! deterministic ordering independent of the document (indexes, compiled
//! output) sorts by `MessageKey`, which implements `Ord`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// TRANSLATION STATUS
// =============================================================================

/// State of a translation, taken from the `type` attribute of `<translation>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    /// No `type` attribute: the translator marked the entry done.
    #[default]
    Finished,
    /// `type="unfinished"`: work still pending, never served at run time.
    Unfinished,
    /// `type="vanished"`: the source string no longer exists in the code.
    Vanished,
    /// `type="obsolete"`: legacy spelling of vanished.
    Obsolete,
}

impl TranslationStatus {
    /// Parse the `type` attribute value.
    ///
    /// Returns `None` for values Qt does not define.
    #[must_use]
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "vanished" => Some(Self::Vanished),
            "obsolete" => Some(Self::Obsolete),
            _ => None,
        }
    }

    /// The `type` attribute value, `None` for finished translations.
    #[must_use]
    pub fn as_attr(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Vanished => Some("vanished"),
            Self::Obsolete => Some("obsolete"),
        }
    }

    /// Vanished and obsolete entries are kept for reference only.
    #[must_use]
    pub fn is_retired(self) -> bool {
        matches!(self, Self::Vanished | Self::Obsolete)
    }
}

// =============================================================================
// TRANSLATION TEXT
// =============================================================================

/// Translated text: a single string, or one string per plural form.
///
/// Must stay externally tagged: compiled catalogs encode it with postcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationText {
    Singular(String),
    Plural(Vec<String>),
}

impl Default for TranslationText {
    fn default() -> Self {
        Self::Singular(String::new())
    }
}

impl TranslationText {
    /// Whether there is nothing to show (empty string, or every form empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Singular(s) => s.is_empty(),
            Self::Plural(forms) => forms.iter().all(String::is_empty),
        }
    }

    /// Whether every form carries text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Singular(s) => !s.is_empty(),
            Self::Plural(forms) => !forms.is_empty() && forms.iter().all(|f| !f.is_empty()),
        }
    }

    /// All forms as string slices, in order.
    #[must_use]
    pub fn forms(&self) -> Vec<&str> {
        match self {
            Self::Singular(s) => vec![s.as_str()],
            Self::Plural(forms) => forms.iter().map(String::as_str).collect(),
        }
    }
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// The `<translation>` element of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Translation {
    pub status: TranslationStatus,
    pub text: TranslationText,
}

impl Translation {
    /// A finished singular translation.
    #[must_use]
    pub fn finished(text: impl Into<String>) -> Self {
        Self {
            status: TranslationStatus::Finished,
            text: TranslationText::Singular(text.into()),
        }
    }

    /// A finished plural translation.
    #[must_use]
    pub fn finished_plural(forms: Vec<String>) -> Self {
        Self {
            status: TranslationStatus::Finished,
            text: TranslationText::Plural(forms),
        }
    }

    /// An unfinished translation without text.
    #[must_use]
    pub fn unfinished() -> Self {
        Self {
            status: TranslationStatus::Unfinished,
            text: TranslationText::default(),
        }
    }

    /// An unfinished plural translation with `count` empty forms.
    #[must_use]
    pub fn unfinished_plural(count: usize) -> Self {
        Self {
            status: TranslationStatus::Unfinished,
            text: TranslationText::Plural(vec![String::new(); count]),
        }
    }

    /// Whether a translator may serve this translation at run time.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.status == TranslationStatus::Finished && self.text.is_complete()
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// The `line` attribute of a `<location>`.
///
/// lupdate writes absolute lines by default and signed offsets from the
/// previous location when run with `-locations relative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum LineRef {
    Absolute(u32),
    Relative(i32),
}

impl LineRef {
    /// Parse a `line` attribute value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.starts_with('+') || value.starts_with('-') {
            value.parse::<i32>().ok().map(Self::Relative)
        } else {
            value.parse::<u32>().ok().map(Self::Absolute)
        }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(line) => write!(f, "{line}"),
            Self::Relative(offset) => write!(f, "{offset:+}"),
        }
    }
}

/// Where a message occurs in the application sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Location {
    pub filename: Option<String>,
    pub line: Option<LineRef>,
}

impl Location {
    /// Create a location with a file name and absolute line.
    #[must_use]
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: Some(filename.into()),
            line: Some(LineRef::Absolute(line)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.filename, &self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}"),
            (Some(file), None) => write!(f, "{file}"),
            (None, Some(line)) => write!(f, "<relative>:{line}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

// =============================================================================
// MESSAGE KEY
// =============================================================================

/// Identity of a message inside its context: source text plus disambiguation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    pub source: String,
    pub comment: String,
}

impl MessageKey {
    /// Create a key. An absent disambiguation is the empty string.
    #[must_use]
    pub fn new(source: impl Into<String>, comment: Option<&str>) -> Self {
        Self {
            source: source.into(),
            comment: comment.unwrap_or_default().to_string(),
        }
    }
}

// =============================================================================
// MESSAGE
// =============================================================================

/// A translatable string and its translation (`<message>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_source: Option<String>,
    /// Disambiguation; part of the lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub numerus: bool,
    pub translation: Translation,
}

impl Message {
    /// A message with a finished singular translation.
    #[must_use]
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: Translation::finished(translation),
            ..Self::default()
        }
    }

    /// A message waiting for its translation.
    #[must_use]
    pub fn unfinished(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: Translation::unfinished(),
            ..Self::default()
        }
    }

    /// A plural-aware message with finished forms.
    #[must_use]
    pub fn plural(source: impl Into<String>, forms: Vec<String>) -> Self {
        Self {
            source: source.into(),
            numerus: true,
            translation: Translation::finished_plural(forms),
            ..Self::default()
        }
    }

    /// Set the disambiguation comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Append a source location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// The key identifying this message within its context.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.source.clone(), self.comment.as_deref())
    }

    /// The status of the translation.
    #[must_use]
    pub fn status(&self) -> TranslationStatus {
        self.translation.status
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// A named group of messages, one per originating interface component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Context {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub messages: Vec<Message>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            messages: Vec::new(),
        }
    }

    /// Append a message (builder style).
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Find the first message with the given key.
    #[must_use]
    pub fn find(&self, key: &MessageKey) -> Option<&Message> {
        self.messages.iter().find(|m| {
            m.source == key.source && m.comment.as_deref().unwrap_or_default() == key.comment
        })
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Default TS format version written by current Qt tools.
pub const DEFAULT_TS_VERSION: &str = "2.1";

/// A whole translation file (`<TS>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    /// Target locale, e.g. `uk` or `uk_UA`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,
    pub contexts: Vec<Context>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: DEFAULT_TS_VERSION.to_string(),
            language: None,
            source_language: None,
            contexts: Vec::new(),
        }
    }
}

impl Catalog {
    /// Create an empty catalog for a target language.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    /// Append a context (builder style).
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.contexts.push(context);
        self
    }

    /// Iterate over `(context name, message)` pairs in document order.
    pub fn messages(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.contexts
            .iter()
            .flat_map(|c| c.messages.iter().map(move |m| (c.name.as_str(), m)))
    }

    /// Total number of messages across all contexts.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }

    /// First context with the given name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in tscat.
///
/// - No silent failures
/// - Use `Result<T, TscatError>` for fallible operations
/// - The library never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum TscatError {
    /// The input is not well-formed XML.
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// The XML is well-formed but is not a valid TS document.
    #[error("Invalid TS structure: {0}")]
    InvalidStructure(String),

    /// A configured or built-in size limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Compiled catalog data does not match its recorded checksum.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
