//! # Plural Rules
//!
//! Maps a count to the index of the `<numerusform>` a translation must use.
//!
//! Languages are grouped into rule families. Each family knows how many
//! forms a translation carries and which form a given count selects. The
//! families and their formulas follow the numerus rules Qt Linguist applies
//! when it creates plural entries for a target language.
//!
//! | Family | Forms | Languages |
//! |--------|-------|-----------|
//! | `NoPlural` | 1 | ja, zh, ko, vi, th, id, ms, tr, ka |
//! | `OneOther` | 2 | en, de, nl, sv, da, nb, no, fi, es, it, pt, el, hu, bg, et, he, ... |
//! | `French` | 2 | fr, pt_BR, hy, ln |
//! | `EastSlavic` | 3 | uk, ru, be, sr, hr, bs |
//! | `Polish` | 3 | pl |
//! | `Czech` | 3 | cs, sk |
//! | `Lithuanian` | 3 | lt |
//! | `Latvian` | 3 | lv |
//! | `Romanian` | 3 | ro |
//! | `Slovenian` | 4 | sl |
//! | `Arabic` | 6 | ar |

use serde::{Deserialize, Serialize};

/// A plural rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PluralRule {
    NoPlural,
    #[default]
    OneOther,
    French,
    EastSlavic,
    Polish,
    Czech,
    Lithuanian,
    Latvian,
    Romanian,
    Slovenian,
    Arabic,
}

impl PluralRule {
    /// Resolve the rule for a locale tag such as `uk`, `uk_UA` or `pt-BR`.
    ///
    /// Unknown languages fall back to `OneOther`.
    #[must_use]
    pub fn for_locale(tag: &str) -> Self {
        let normalized = tag.trim().replace('-', "_").to_ascii_lowercase();
        if normalized == "pt_br" {
            return Self::French;
        }
        let language = normalized.split('_').next().unwrap_or_default();

        match language {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "tr" | "ka" => Self::NoPlural,
            "fr" | "hy" | "ln" => Self::French,
            "uk" | "ru" | "be" | "sr" | "hr" | "bs" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::Czech,
            "lt" => Self::Lithuanian,
            "lv" => Self::Latvian,
            "ro" => Self::Romanian,
            "sl" => Self::Slovenian,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Number of plural forms a translation for this family carries.
    #[must_use]
    pub const fn form_count(self) -> usize {
        match self {
            Self::NoPlural => 1,
            Self::OneOther | Self::French => 2,
            Self::EastSlavic
            | Self::Polish
            | Self::Czech
            | Self::Lithuanian
            | Self::Latvian
            | Self::Romanian => 3,
            Self::Slovenian => 4,
            Self::Arabic => 6,
        }
    }

    /// Index of the form selected by `count`. Always `< form_count()`.
    #[must_use]
    pub fn form_index(self, count: i64) -> usize {
        let n = count.unsigned_abs();
        let n10 = n % 10;
        let n100 = n % 100;

        match self {
            Self::NoPlural => 0,
            Self::OneOther => usize::from(n != 1),
            Self::French => usize::from(n > 1),
            Self::EastSlavic => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Czech => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            Self::Lithuanian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n10 >= 2 && !(10..=19).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Latvian => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            Self::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (1..=19).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Slovenian => match n100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            Self::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ if (3..=10).contains(&n100) => 3,
                _ if n100 >= 11 => 4,
                _ => 5,
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
