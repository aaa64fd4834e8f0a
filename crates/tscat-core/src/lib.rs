//! # tscat-core
//!
//! The translation catalog engine for tscat - THE CATALOG.
//!
//! This crate reads and writes Qt Linguist `.ts` catalogs and answers the
//! one question an application asks at run time: given a context and a
//! source string, what should be displayed? When no finished translation
//! exists, the answer is the source string itself.
//!
//! ## Layers
//!
//! - `types`: the catalog model (contexts, messages, translations)
//! - `formats`: TS XML reader and writer
//! - `translator`, `plural`: lookup with source fallback and plural forms
//! - `lint`, `stats`, `merge`: tooling for translators and release checks
//! - `compiled`: the checksummed binary form loaded at startup
//! - `session`: a loaded catalog plus its translator
//!
//! ## Architectural Constraints
//!
//! - Catalogs are read once and never mutated while being served
//! - Has NO async, NO network dependencies, NO logging (pure Rust)
//! - Deterministic: ordered maps, integer arithmetic, reproducible output

// =============================================================================
// MODULES
// =============================================================================

pub mod compiled;
pub mod formats;
pub mod lint;
pub mod merge;
pub mod plural;
pub mod primitives;
pub mod session;
pub mod stats;
pub mod translator;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Catalog, Context, DEFAULT_TS_VERSION, LineRef, Location, Message, MessageKey, Translation,
    TranslationStatus, TranslationText, TscatError,
};

// =============================================================================
// RE-EXPORTS: Lookup
// =============================================================================

pub use plural::PluralRule;
pub use session::{CatalogFormat, CatalogSession};
pub use translator::{Lookup, Translator, TranslatorChain};

// =============================================================================
// RE-EXPORTS: Tooling
// =============================================================================

pub use lint::{FindingKind, LintConfig, LintFinding, LintReport, Linter, Severity};
pub use merge::{MergeOptions, MergeReport, merge};
pub use stats::{CatalogStats, Progress};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use compiled::{compiled_crypto_hash, compute_blake3_hash, verify_crypto_hash};
pub use compiled::{
    CompiledCatalog, CompiledHeader, compile, compiled_checksum, is_compiled, load_compiled,
};
pub use formats::{parse_ts, write_ts};
