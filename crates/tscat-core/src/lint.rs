//! # Catalog Linting
//!
//! Structural checks over a translation catalog.
//!
//! Three checks are always on, because a catalog that fails them cannot be
//! served correctly:
//!
//! - every `(source, disambiguation)` is unique within its context,
//! - every finished entry has non-empty text (work still pending must be
//!   marked unfinished, never left silently empty),
//! - plural entries carry exactly as many forms as the target language has.
//!
//! The remaining checks compare a finished translation with its source the
//! way translators expect (placeholders, accelerators, ending punctuation,
//! surrounding whitespace) and can be switched off in [`LintConfig`].
//!
//! Vanished and obsolete entries are skipped by every check.

use crate::plural::PluralRule;
use crate::{Catalog, Location, Message, MessageKey, TranslationStatus, TranslationText};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// FINDINGS
// =============================================================================

/// How serious a finding is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateMessage,
    EmptyTranslation,
    PluralFormCount,
    UnexpectedPluralForms,
    DuplicateContext,
    MissingLanguage,
    NumerusWithoutCount,
    PlaceholderMismatch,
    AcceleratorMismatch,
    PunctuationMismatch,
    WhitespaceMismatch,
    Unfinished,
}

impl FindingKind {
    /// Severity a finding of this kind is reported with.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::DuplicateMessage
            | Self::EmptyTranslation
            | Self::PluralFormCount
            | Self::UnexpectedPluralForms => Severity::Error,
            Self::Unfinished => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// A single lint result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub message: String,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.severity, self.context)?;
        if let Some(location) = &self.location {
            write!(f, " {location}")?;
        }
        write!(f, " {}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (source: {source:?})")?;
        }
        Ok(())
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Switches for the optional checks and the failure threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub placeholders: bool,
    pub accelerators: bool,
    pub punctuation: bool,
    pub whitespace: bool,
    pub report_unfinished: bool,
    /// Lowest severity that makes the report fail.
    pub fail_on: Severity,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            placeholders: true,
            accelerators: true,
            punctuation: true,
            whitespace: true,
            report_unfinished: true,
            fail_on: Severity::Error,
        }
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// All findings for one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub findings: Vec<LintFinding>,
    pub fail_on: Severity,
}

impl LintReport {
    /// Number of findings with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Findings per kind, in kind order.
    #[must_use]
    pub fn by_kind(&self) -> BTreeMap<FindingKind, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Whether no finding reaches the `fail_on` severity.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.findings.iter().all(|f| f.severity < self.fail_on)
    }
}

// =============================================================================
// LINTER
// =============================================================================

/// Runs the configured checks over catalogs.
#[derive(Debug, Clone, Default)]
pub struct Linter {
    config: LintConfig,
}

/// Per-message state shared by the checks.
struct MessageScope<'a> {
    context: &'a str,
    message: &'a Message,
}

impl MessageScope<'_> {
    fn finding(&self, kind: FindingKind, text: String) -> LintFinding {
        LintFinding {
            severity: kind.severity(),
            kind,
            context: self.context.to_string(),
            source: Some(self.message.source.clone()),
            location: self.message.locations.first().cloned(),
            message: text,
        }
    }
}

impl Linter {
    /// Create a linter with the given configuration.
    #[must_use]
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Lint a whole catalog.
    #[must_use]
    pub fn lint(&self, catalog: &Catalog) -> LintReport {
        let mut findings = Vec::new();

        let rule = catalog.language.as_deref().map(PluralRule::for_locale);
        if rule.is_none() {
            findings.push(LintFinding {
                severity: Severity::Warning,
                kind: FindingKind::MissingLanguage,
                context: String::new(),
                source: None,
                location: None,
                message: "catalog has no target language; plural form counts not checked"
                    .to_string(),
            });
        }

        let mut seen_contexts = BTreeSet::new();
        // Keys are unique per context name, across all of its blocks.
        let mut seen_keys: BTreeMap<&str, BTreeSet<MessageKey>> = BTreeMap::new();
        for context in &catalog.contexts {
            if !seen_contexts.insert(context.name.as_str()) {
                findings.push(LintFinding {
                    severity: Severity::Warning,
                    kind: FindingKind::DuplicateContext,
                    context: context.name.clone(),
                    source: None,
                    location: None,
                    message: "context appears in more than one <context> block".to_string(),
                });
            }

            let keys = seen_keys.entry(context.name.as_str()).or_default();
            for message in &context.messages {
                if message.status().is_retired() {
                    continue;
                }
                let scope = MessageScope {
                    context: &context.name,
                    message,
                };
                if !keys.insert(message.key()) {
                    findings.push(scope.finding(
                        FindingKind::DuplicateMessage,
                        "duplicate source text in context".to_string(),
                    ));
                }
                self.check_message(&scope, rule, &mut findings);
            }
        }

        LintReport {
            findings,
            fail_on: self.config.fail_on,
        }
    }

    fn check_message(
        &self,
        scope: &MessageScope<'_>,
        rule: Option<PluralRule>,
        findings: &mut Vec<LintFinding>,
    ) {
        let message = scope.message;
        let translation = &message.translation;
        let finished = translation.status == TranslationStatus::Finished;

        if translation.status == TranslationStatus::Unfinished && self.config.report_unfinished {
            findings.push(scope.finding(
                FindingKind::Unfinished,
                "translation is unfinished".to_string(),
            ));
        }

        if finished && !translation.text.is_complete() {
            findings.push(scope.finding(
                FindingKind::EmptyTranslation,
                "finished translation is empty".to_string(),
            ));
        }

        if message.numerus {
            if !message.source.contains("%n") && !message.source.contains("%Ln") {
                findings.push(scope.finding(
                    FindingKind::NumerusWithoutCount,
                    "plural message has no %n in its source".to_string(),
                ));
            }
            if let Some(rule) = rule {
                // `<translation type="unfinished"/>` with no forms at all.
                let nothing_entered = !finished
                    && matches!(&translation.text, TranslationText::Singular(s) if s.is_empty());
                let forms = match &translation.text {
                    TranslationText::Plural(forms) => forms.len(),
                    TranslationText::Singular(_) => 1,
                };
                if !nothing_entered && forms != rule.form_count() {
                    findings.push(scope.finding(
                        FindingKind::PluralFormCount,
                        format!(
                            "has {forms} plural form(s), target language needs {}",
                            rule.form_count()
                        ),
                    ));
                }
            }
        } else if matches!(translation.text, TranslationText::Plural(_)) {
            findings.push(scope.finding(
                FindingKind::UnexpectedPluralForms,
                "non-plural message carries plural forms".to_string(),
            ));
        }

        if finished {
            for form in translation.text.forms() {
                if !form.is_empty() {
                    self.compare_with_source(scope, form, findings);
                }
            }
        }
    }

    fn compare_with_source(
        &self,
        scope: &MessageScope<'_>,
        translated: &str,
        findings: &mut Vec<LintFinding>,
    ) {
        let source = scope.message.source.as_str();

        if self.config.placeholders {
            let skip_count = scope.message.numerus;
            let expected = placeholders(source, skip_count);
            let actual = placeholders(translated, skip_count);
            if expected != actual {
                findings.push(scope.finding(
                    FindingKind::PlaceholderMismatch,
                    format!("placeholders differ: source {expected:?}, translation {actual:?}"),
                ));
            }
        }

        if self.config.accelerators && has_accelerator(source) != has_accelerator(translated) {
            findings.push(scope.finding(
                FindingKind::AcceleratorMismatch,
                "accelerator (&) present in only one of source and translation".to_string(),
            ));
        }

        if self.config.punctuation {
            let expected = ending(source);
            if expected.is_some() && expected != ending(translated) {
                findings.push(scope.finding(
                    FindingKind::PunctuationMismatch,
                    "translation does not end with the same punctuation".to_string(),
                ));
            }
        }

        if self.config.whitespace && surrounding_whitespace(source) != surrounding_whitespace(translated)
        {
            findings.push(scope.finding(
                FindingKind::WhitespaceMismatch,
                "leading or trailing whitespace differs".to_string(),
            ));
        }
    }
}

// =============================================================================
// TEXT ANALYSIS
// =============================================================================

/// Sorted placeholder tokens: `%1`..`%99`, `%L1`, `%n`, `%Ln`, printf `%s`/`%d`/...
///
/// `%%` is a literal percent sign. With `skip_count`, `%n`/`%Ln` are ignored
/// (a singular plural form may spell the number out).
#[must_use]
pub fn placeholders(text: &str, skip_count: bool) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        if chars.get(j) == Some(&'%') {
            i = j + 1;
            continue;
        }
        let localized = chars.get(j) == Some(&'L');
        if localized {
            j += 1;
        }

        let token_end = match chars.get(j) {
            Some('n') => Some(j + 1),
            Some(c) if c.is_ascii_digit() => {
                let mut end = j + 1;
                if chars.get(end).is_some_and(char::is_ascii_digit) {
                    end += 1;
                }
                Some(end)
            }
            Some('s' | 'd' | 'i' | 'f' | 'r' | 'x') if !localized => Some(j + 1),
            _ => None,
        };

        match token_end {
            Some(end) => {
                let token: String = chars[i..end].iter().collect();
                let is_count = token == "%n" || token == "%Ln";
                if !(skip_count && is_count) {
                    found.push(token);
                }
                i = end;
            }
            None => i += 1,
        }
    }

    found.sort();
    found
}

/// Whether the text marks a keyboard accelerator (`&x`, not `&&`).
#[must_use]
pub fn has_accelerator(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            match chars.peek() {
                Some('&') => {
                    chars.next();
                }
                Some(next) if !next.is_whitespace() => return true,
                _ => {}
            }
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Ellipsis,
    Colon,
    Question,
    Exclamation,
    Period,
}

fn ending(text: &str) -> Option<Ending> {
    if text.ends_with("...") || text.ends_with('…') {
        return Some(Ending::Ellipsis);
    }
    match text.chars().last()? {
        ':' => Some(Ending::Colon),
        '?' => Some(Ending::Question),
        '!' => Some(Ending::Exclamation),
        '.' => Some(Ending::Period),
        _ => None,
    }
}

fn surrounding_whitespace(text: &str) -> (bool, bool) {
    (
        text.starts_with(char::is_whitespace),
        text.ends_with(char::is_whitespace),
    )
}

// =============================================================================
// TESTS
// =============================================================================
