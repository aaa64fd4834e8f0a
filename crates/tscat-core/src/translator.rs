//! # Translator
//!
//! Run-time lookup of translations by `(context, source, disambiguation)`.
//!
//! # Invariants
//!
//! 1. **Source fallback**: `translate` never returns an empty string for a
//!    non-empty source. Missing, unfinished, vanished and empty entries all
//!    resolve to the source string itself.
//!
//! 2. **Only finished text is served**: a translator is built from the
//!    translator-usable entries of a catalog (`Translation::is_usable`);
//!    nothing else is indexed.
//!
//! 3. **Immutable**: a `Translator` is `Send + Sync` and never changes after
//!    construction.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing key | Source not in context | Source string returned |
//! | Unfinished entry | `type="unfinished"` | Source string returned |
//! | Disambiguation miss | Comment not indexed | Retried without comment |
//! | Short plural list | Fewer forms than the rule selects | Last form used |

use crate::plural::PluralRule;
use crate::primitives::COUNT_PLACEHOLDER;
use crate::{Catalog, TranslationText};
use std::collections::BTreeMap;

/// comment -> text
type CommentMap = BTreeMap<String, TranslationText>;
/// context -> source -> comment -> text
type EntryIndex = BTreeMap<String, BTreeMap<String, CommentMap>>;

/// A lookup table built from one catalog.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    language: Option<String>,
    rule: PluralRule,
    entries: EntryIndex,
    len: usize,
}

/// Outcome of a lookup that records whether a translation was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub text: String,
    pub found: bool,
}

impl Translator {
    /// Create an empty translator for a language.
    #[must_use]
    pub fn new(language: Option<String>) -> Self {
        let rule = language
            .as_deref()
            .map(PluralRule::for_locale)
            .unwrap_or_default();
        Self {
            language,
            rule,
            entries: BTreeMap::new(),
            len: 0,
        }
    }

    /// Index every usable translation in a catalog.
    ///
    /// When a key occurs twice in one context the first occurrence wins.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut translator = Self::new(catalog.language.clone());
        for (context, message) in catalog.messages() {
            if message.translation.is_usable() {
                translator.insert(
                    context,
                    &message.source,
                    message.comment.as_deref().unwrap_or_default(),
                    message.translation.text.clone(),
                );
            }
        }
        translator
    }

    /// Add an entry unless its key is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(
        &mut self,
        context: &str,
        source: &str,
        comment: &str,
        text: TranslationText,
    ) -> bool {
        let by_comment = self
            .entries
            .entry(context.to_string())
            .or_default()
            .entry(source.to_string())
            .or_default();
        if by_comment.contains_key(comment) {
            return false;
        }
        by_comment.insert(comment.to_string(), text);
        self.len += 1;
        true
    }

    /// Target language of the underlying catalog.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Plural rule used by `translate_plural`.
    #[must_use]
    pub fn plural_rule(&self) -> PluralRule {
        self.rule
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no entry is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over `(context, source, comment, text)` in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str, &TranslationText)> {
        self.entries.iter().flat_map(|(context, sources)| {
            sources.iter().flat_map(move |(source, comments)| {
                comments.iter().map(move |(comment, text)| {
                    (context.as_str(), source.as_str(), comment.as_str(), text)
                })
            })
        })
    }

    /// Find the usable translation for a key.
    ///
    /// A non-empty disambiguation that is not indexed is retried without
    /// disambiguation.
    #[must_use]
    pub fn find(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Option<&TranslationText> {
        let by_comment = self.entries.get(context)?.get(source)?;
        let comment = comment.unwrap_or_default();
        by_comment
            .get(comment)
            .or_else(|| (!comment.is_empty()).then(|| by_comment.get("")).flatten())
    }

    /// Translate a string, falling back to the source string.
    ///
    /// A plural entry looked up without a count yields its first form.
    #[must_use]
    pub fn translate<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
    ) -> &'a str {
        match self.find(context, source, comment) {
            Some(TranslationText::Singular(text)) => text.as_str(),
            Some(TranslationText::Plural(forms)) => forms.first().map_or(source, String::as_str),
            None => source,
        }
    }

    /// Translate a plural-aware string for `count`, replacing `%n`.
    #[must_use]
    pub fn translate_plural(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        count: i64,
    ) -> String {
        self.lookup(context, source, comment, Some(count)).text
    }

    /// Translate with an optional count and report whether a translation was used.
    #[must_use]
    pub fn lookup(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        count: Option<i64>,
    ) -> Lookup {
        let Some(text) = self.find(context, source, comment) else {
            return Lookup {
                text: fill_count(source, count),
                found: false,
            };
        };

        let selected = match (text, count) {
            (TranslationText::Singular(s), _) => s.as_str(),
            (TranslationText::Plural(forms), Some(n)) => {
                let index = self.rule.form_index(n);
                forms
                    .get(index)
                    .or_else(|| forms.last())
                    .map_or(source, String::as_str)
            }
            (TranslationText::Plural(forms), None) => forms.first().map_or(source, String::as_str),
        };

        Lookup {
            text: fill_count(selected, count),
            found: true,
        }
    }
}

/// Replace `%n` with the count, if there is one.
fn fill_count(text: &str, count: Option<i64>) -> String {
    match count {
        Some(n) => text.replace(COUNT_PLACEHOLDER, &n.to_string()),
        None => text.to_string(),
    }
}

// =============================================================================
// TRANSLATOR CHAIN
// =============================================================================

/// Several translators consulted in order.
///
/// The first translator holding a usable entry answers; when none does, the
/// source string is returned.
#[derive(Debug, Clone, Default)]
pub struct TranslatorChain {
    translators: Vec<Translator>,
}

impl TranslatorChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a translator with lower priority than those already present.
    pub fn push(&mut self, translator: Translator) {
        self.translators.push(translator);
    }

    /// Number of translators in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.translators.len()
    }

    /// Whether the chain has no translators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Translate, trying each translator in order, then falling back to the source.
    #[must_use]
    pub fn translate<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
    ) -> &'a str {
        self.translators
            .iter()
            .find(|t| t.find(context, source, comment).is_some())
            .map_or(source, |t| t.translate(context, source, comment))
    }

    /// Plural-aware variant of [`TranslatorChain::translate`].
    #[must_use]
    pub fn translate_plural(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        count: i64,
    ) -> String {
        self.translators
            .iter()
            .map(|t| t.lookup(context, source, comment, Some(count)))
            .find(|lookup| lookup.found)
            .map_or_else(|| fill_count(source, Some(count)), |lookup| lookup.text)
    }
}

impl FromIterator<Translator> for TranslatorChain {
    fn from_iter<I: IntoIterator<Item = Translator>>(iter: I) -> Self {
        Self {
            translators: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
