//! # Template Merge
//!
//! Updates an existing translation from a freshly extracted template, the
//! way `lupdate` refreshes a `.ts` file after the sources changed.
//!
//! The template decides which messages exist, their order, locations and
//! comments. The existing catalog contributes its header and everything the
//! translator owns: translations, their status and translator comments.
//!
//! | Template message | Existing message | Result |
//! |------------------|------------------|--------|
//! | present | active, same key | translation kept |
//! | present | retired, same key | translation revived as unfinished |
//! | present | none | new, empty, unfinished |
//! | absent | active | marked vanished (or dropped) |
//! | absent | retired | kept as is (or dropped) |

use crate::plural::PluralRule;
use crate::{Catalog, Context, Message, MessageKey, Translation, TranslationStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Merge behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Remove messages that are no longer in the template instead of
    /// keeping them as vanished.
    pub drop_obsolete: bool,
}

/// What a merge did, in message counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub kept: usize,
    pub added: usize,
    pub revived: usize,
    pub vanished: usize,
    pub dropped: usize,
}

/// Existing messages of one context name, split by whether they are retired.
#[derive(Default)]
struct ExistingContext<'a> {
    comment: Option<&'a str>,
    active: BTreeMap<MessageKey, &'a Message>,
    retired: BTreeMap<MessageKey, &'a Message>,
    /// Document order, for the leftovers appended after the template's.
    order: Vec<&'a Message>,
}

impl<'a> ExistingContext<'a> {
    /// The message with this key, and whether it is retired. Active wins.
    fn find(&self, key: &MessageKey) -> Option<(&'a Message, bool)> {
        if let Some(message) = self.active.get(key) {
            return Some((message, false));
        }
        self.retired.get(key).map(|message| (*message, true))
    }
}

fn index(existing: &Catalog) -> BTreeMap<&str, ExistingContext<'_>> {
    let mut contexts: BTreeMap<&str, ExistingContext<'_>> = BTreeMap::new();
    for context in &existing.contexts {
        let entry = contexts.entry(context.name.as_str()).or_default();
        if entry.comment.is_none() {
            entry.comment = context.comment.as_deref();
        }
        for message in &context.messages {
            let bucket = if message.status().is_retired() {
                &mut entry.retired
            } else {
                &mut entry.active
            };
            bucket.entry(message.key()).or_insert(message);
            entry.order.push(message);
        }
    }
    contexts
}

/// Merge `template` into `existing`.
#[must_use]
pub fn merge(
    existing: &Catalog,
    template: &Catalog,
    options: MergeOptions,
) -> (Catalog, MergeReport) {
    let rule = existing
        .language
        .as_deref()
        .or(template.language.as_deref())
        .map(PluralRule::for_locale)
        .unwrap_or_default();

    let indexed = index(existing);
    let mut report = MergeReport::default();
    // (context, key) pairs the template still has
    let used: BTreeSet<(&str, MessageKey)> = template
        .messages()
        .map(|(context, message)| (context, message.key()))
        .collect();
    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut contexts = Vec::with_capacity(template.contexts.len());

    for template_context in &template.contexts {
        let name = template_context.name.as_str();
        let previous = indexed.get(name);
        let mut context = Context {
            name: template_context.name.clone(),
            comment: template_context
                .comment
                .clone()
                .or_else(|| previous.and_then(|p| p.comment.map(str::to_string))),
            messages: Vec::with_capacity(template_context.messages.len()),
        };

        for template_message in &template_context.messages {
            let key = template_message.key();
            let mut message = Message {
                translation: Translation::unfinished(),
                translator_comment: None,
                ..template_message.clone()
            };

            match previous.and_then(|p| p.find(&key)) {
                Some((old, false)) => {
                    message.translation = old.translation.clone();
                    message.translator_comment = old.translator_comment.clone();
                    report.kept += 1;
                }
                Some((old, true)) => {
                    message.translation = Translation {
                        status: TranslationStatus::Unfinished,
                        text: old.translation.text.clone(),
                    };
                    message.translator_comment = old.translator_comment.clone();
                    report.revived += 1;
                }
                None => {
                    if message.numerus {
                        message.translation = Translation::unfinished_plural(rule.form_count());
                    }
                    report.added += 1;
                }
            }

            context.messages.push(message);
        }

        // A context split over several blocks in the template only gets its
        // leftovers once, after the first block.
        if emitted.insert(name) {
            if let Some(previous) = previous {
                append_leftovers(&mut context, name, previous, &used, options, &mut report);
            }
        }
        contexts.push(context);
    }

    // Contexts that disappeared from the template entirely, in existing order.
    for existing_context in &existing.contexts {
        let name = existing_context.name.as_str();
        if !emitted.insert(name) {
            continue;
        }
        if let Some(previous) = indexed.get(name) {
            let mut context = Context {
                name: existing_context.name.clone(),
                comment: previous.comment.map(str::to_string),
                messages: Vec::new(),
            };
            append_leftovers(&mut context, name, previous, &used, options, &mut report);
            if !context.messages.is_empty() {
                contexts.push(context);
            }
        }
    }

    let merged = Catalog {
        version: existing.version.clone(),
        language: existing.language.clone().or_else(|| template.language.clone()),
        source_language: existing
            .source_language
            .clone()
            .or_else(|| template.source_language.clone()),
        contexts,
    };
    (merged, report)
}

fn append_leftovers(
    context: &mut Context,
    name: &str,
    previous: &ExistingContext<'_>,
    used: &BTreeSet<(&str, MessageKey)>,
    options: MergeOptions,
    report: &mut MergeReport,
) {
    for old in &previous.order {
        let key = old.key();
        if used.contains(&(name, key.clone())) {
            continue;
        }
        // One leftover per key: the active copy if there is one, else the
        // first retired copy. Every other copy is discarded.
        let keeper = previous.find(&key).map(|(message, _)| message);
        if !keeper.is_some_and(|keeper| std::ptr::eq(keeper, *old)) {
            report.dropped += 1;
            continue;
        }
        if options.drop_obsolete {
            report.dropped += 1;
            continue;
        }
        let mut message = (*old).clone();
        if !message.status().is_retired() {
            message.translation.status = TranslationStatus::Vanished;
            report.vanished += 1;
        }
        context.messages.push(message);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Location, TranslationText};

    fn existing() -> Catalog {
        let mut retired = Message::new("Old caption", "Старий підпис");
        retired.translation.status = TranslationStatus::Vanished;

        Catalog::new("uk").with_context(
            Context::new("Collection")
                .with_message(Message::new("Open collection", "Відкрити колекцію"))
                .with_message(Message::new("Removed", "Видалено"))
                .with_message(retired)
                .with_message(Message::unfinished("Seller")),
        )
    }

    fn template() -> Catalog {
        Catalog::default().with_context(
            Context::new("Collection")
                .with_message(Message::unfinished("Seller"))
                .with_message(
                    Message::unfinished("Open collection")
                        .with_location(Location::new("../Collection.py", 12)),
                )
                .with_message(Message::unfinished("Old caption"))
                .with_message(Message::unfinished("New label"))
                .with_message(Message {
                    numerus: true,
                    ..Message::unfinished("%n coin(s)")
                }),
        )
    }

    #[test]
    fn follows_template_order_and_keeps_translations() {
        let (merged, report) = merge(&existing(), &template(), MergeOptions::default());
        let context = &merged.contexts[0];
        let sources: Vec<_> = context.messages.iter().map(|m| m.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["Seller", "Open collection", "Old caption", "New label", "%n coin(s)", "Removed"]
        );

        let open = &context.messages[1];
        assert_eq!(open.translation, Translation::finished("Відкрити колекцію"));
        assert_eq!(open.locations, vec![Location::new("../Collection.py", 12)]);

        assert_eq!(
            report,
            MergeReport {
                kept: 2,
                added: 2,
                revived: 1,
                vanished: 1,
                dropped: 0,
            }
        );
        assert_eq!(merged.language.as_deref(), Some("uk"));
    }

    #[test]
    fn revived_messages_need_review() {
        let (merged, _) = merge(&existing(), &template(), MergeOptions::default());
        let revived = &merged.contexts[0].messages[2];
        assert_eq!(revived.status(), TranslationStatus::Unfinished);
        assert_eq!(
            revived.translation.text,
            TranslationText::Singular("Старий підпис".into())
        );
    }

    #[test]
    fn new_plural_messages_get_language_form_count() {
        let (merged, _) = merge(&existing(), &template(), MergeOptions::default());
        let plural = &merged.contexts[0].messages[4];
        assert_eq!(plural.translation, Translation::unfinished_plural(3));
    }

    #[test]
    fn missing_messages_vanish() {
        let (merged, _) = merge(&existing(), &template(), MergeOptions::default());
        let removed = &merged.contexts[0].messages[5];
        assert_eq!(removed.status(), TranslationStatus::Vanished);
        assert_eq!(
            removed.translation.text,
            TranslationText::Singular("Видалено".into())
        );
    }

    #[test]
    fn drop_obsolete_removes_leftovers() {
        let (merged, report) = merge(
            &existing(),
            &template(),
            MergeOptions {
                drop_obsolete: true,
            },
        );
        assert_eq!(merged.contexts[0].messages.len(), 5);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.vanished, 0);
    }

    #[test]
    fn contexts_missing_from_template_are_kept_at_the_end() {
        let current = existing()
            .with_context(Context::new("ListView").with_message(Message::new("Price", "Ціна")));
        let (merged, report) = merge(&current, &template(), MergeOptions::default());
        assert_eq!(merged.contexts.len(), 2);
        assert_eq!(merged.contexts[1].name, "ListView");
        assert_eq!(merged.contexts[1].messages[0].status(), TranslationStatus::Vanished);
        assert_eq!(report.vanished, 2);

        let (merged, _) = merge(
            &current,
            &template(),
            MergeOptions {
                drop_obsolete: true,
            },
        );
        assert_eq!(merged.contexts.len(), 1);
    }

    #[test]
    fn active_leftover_wins_over_earlier_retired_copy() {
        let mut stale = Message::new("Price", "Стара ціна");
        stale.translation.status = TranslationStatus::Vanished;
        let current = Catalog::new("uk").with_context(
            Context::new("ListView")
                .with_message(stale)
                .with_message(Message::new("Price", "Ціна")),
        );
        let template = Catalog::default().with_context(Context::new("ListView"));

        let (merged, report) = merge(&current, &template, MergeOptions::default());
        let messages = &merged.contexts[0].messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].translation.text,
            TranslationText::Singular("Ціна".into())
        );
        assert_eq!(messages[0].status(), TranslationStatus::Vanished);
        assert_eq!(report.vanished, 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn duplicate_leftovers_are_counted_as_dropped() {
        let current = Catalog::new("uk").with_context(
            Context::new("ListView")
                .with_message(Message::new("Price", "Ціна"))
                .with_message(Message::new("Price", "Вартість")),
        );
        let (merged, report) = merge(&current, &Catalog::default(), MergeOptions::default());
        assert_eq!(merged.contexts[0].messages.len(), 1);
        assert_eq!(
            merged.contexts[0].messages[0].translation.text,
            TranslationText::Singular("Ціна".into())
        );
        assert_eq!(report.vanished, 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn merging_with_itself_changes_nothing() {
        let catalog = Catalog::new("uk").with_context(
            Context::new("Collection")
                .with_message(Message::new("Open collection", "Відкрити колекцію"))
                .with_message(Message::unfinished("Seller")),
        );
        let (merged, report) = merge(&catalog, &catalog, MergeOptions::default());
        assert_eq!(merged, catalog);
        assert_eq!(report.kept, 2);
        assert_eq!(report.added + report.revived + report.vanished, 0);
    }
}
