//! # Catalog Statistics
//!
//! Counts and completion progress for a translation catalog.
//!
//! ## Progress Bands
//!
//! | Band | Condition |
//! |------|-----------|
//! | `Untranslated` | no active message is finished |
//! | `Partial` | some finished, below 90% |
//! | `NearlyDone` | at least 90%, not all |
//! | `Complete` | every active message finished |
//!
//! Vanished and obsolete messages are counted but never take part in the
//! completion percentage. A finished message with an empty text (or an
//! empty plural form) is never served, so it counts as `empty`, not as
//! finished. Integer arithmetic only.

use crate::{Catalog, TranslationStatus};
use serde::{Deserialize, Serialize};

/// Completion percentage from which a catalog counts as nearly done.
pub const NEARLY_DONE_PERCENT: u8 = 90;

// =============================================================================
// PROGRESS
// =============================================================================

/// Coarse completion band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Untranslated,
    Partial,
    NearlyDone,
    Complete,
}

impl Progress {
    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Progress::Untranslated => "untranslated",
            Progress::Partial => "partial",
            Progress::NearlyDone => "nearly done",
            Progress::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CATALOG STATS
// =============================================================================

/// Counts extracted from a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Target language, if the catalog declares one.
    pub language: Option<String>,
    pub contexts: usize,
    /// All messages, retired ones included.
    pub messages: usize,
    /// Finished with a servable text.
    pub finished: usize,
    pub unfinished: usize,
    /// Marked finished but missing text.
    pub empty: usize,
    /// Vanished plus obsolete.
    pub retired: usize,
    /// Plural-aware messages.
    pub numerus: usize,
    /// `finished * 100 / active`, rounded down; 100 when nothing is active.
    pub percent_complete: u8,
    pub progress: Progress,
}

impl CatalogStats {
    /// Compute statistics for a catalog.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut finished = 0usize;
        let mut unfinished = 0usize;
        let mut empty = 0usize;
        let mut retired = 0usize;
        let mut numerus = 0usize;

        for (_, message) in catalog.messages() {
            match message.status() {
                TranslationStatus::Finished if message.translation.is_usable() => finished += 1,
                TranslationStatus::Finished => empty += 1,
                TranslationStatus::Unfinished => unfinished += 1,
                TranslationStatus::Vanished | TranslationStatus::Obsolete => retired += 1,
            }
            if message.numerus {
                numerus += 1;
            }
        }

        let active = finished + unfinished + empty;
        let percent_complete = if active == 0 {
            100
        } else {
            // finished <= active, so the quotient is at most 100
            u8::try_from((finished as u64).saturating_mul(100) / active as u64).unwrap_or(100)
        };

        let progress = if finished == active {
            Progress::Complete
        } else if finished == 0 {
            Progress::Untranslated
        } else if percent_complete >= NEARLY_DONE_PERCENT {
            Progress::NearlyDone
        } else {
            Progress::Partial
        };

        Self {
            language: catalog.language.clone(),
            contexts: catalog.contexts.len(),
            messages: catalog.message_count(),
            finished,
            unfinished,
            empty,
            retired,
            numerus,
            percent_complete,
            progress,
        }
    }

    /// Messages that still matter: everything not retired.
    #[must_use]
    pub fn active(&self) -> usize {
        self.finished + self.unfinished + self.empty
    }
}

// =============================================================================
// TESTS
// =============================================================================
