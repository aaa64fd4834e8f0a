//! # Format Primitives
//!
//! Hardcoded constants for the tscat catalog engine.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Magic bytes for the compiled catalog header.
pub const MAGIC_BYTES: &[u8; 4] = b"TSQM";

/// Current compiled catalog format version.
///
/// Increment this when making breaking changes to the compiled layout.
pub const FORMAT_VERSION: u8 = 1;

/// Root element of a TS document.
pub const TS_ROOT_ELEMENT: &str = "TS";

/// Placeholder replaced by the count in plural translations.
pub const COUNT_PLACEHOLDER: &str = "%n";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of TS input accepted by the parser (64 MB).
///
/// Real catalogs are a few hundred kilobytes.
pub const MAX_TS_INPUT_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of messages in one catalog.
pub const MAX_MESSAGES: usize = 500_000;

/// Maximum number of plural forms in one translation.
///
/// No language needs more than six.
pub const MAX_PLURAL_FORMS: usize = 16;

/// Maximum number of entries accepted when loading a compiled catalog.
pub const MAX_COMPILED_ENTRIES: u64 = 1_000_000;

/// Maximum length of a lookup key component received over the API.
pub const MAX_KEY_LENGTH: usize = 65536;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"TSQM");
    }

    #[test]
    fn compiled_limit_covers_parser_limit() {
        assert!(MAX_COMPILED_ENTRIES >= MAX_MESSAGES as u64);
    }
}
