//! # Compiled Catalogs
//!
//! The run-time form of a translation: only the entries a translator may
//! serve, sorted by key, in a checksummed `postcard` stream. Loading one is
//! a single decode with no XML involved.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [CompiledHeader (postcard)] [CompiledCatalog (postcard)]
//! ```
//!
//! Compiling the same catalog twice yields identical bytes.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_COMPILED_ENTRIES};
use crate::translator::Translator;
use crate::{Catalog, Context, Message, TranslationText, TscatError};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEADER
// =============================================================================

/// Header of a compiled catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompiledHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of entries in the body.
    pub entry_count: u64,

    /// Checksum of the body (XOR/rotate, not cryptographic).
    pub checksum: u64,
}

impl CompiledHeader {
    /// Create a header for a body with the given entry count and checksum.
    #[must_use]
    pub fn new(entry_count: u64, checksum: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            entry_count,
            checksum,
        }
    }

    /// Validate magic and version.
    ///
    /// Error messages stay generic and do not echo the offending bytes.
    pub fn validate(&self) -> Result<(), TscatError> {
        if &self.magic != MAGIC_BYTES {
            return Err(TscatError::DeserializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(TscatError::DeserializationError(
                "Unsupported file version".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// BODY
// =============================================================================

/// One servable translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompiledEntry {
    pub context: String,
    pub source: String,
    /// Disambiguation, empty when absent.
    pub comment: String,
    pub text: TranslationText,
}

/// Sorted, servable entries of one catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CompiledCatalog {
    /// Target language, selects the plural rule.
    pub language: Option<String>,

    /// Entries sorted by `(context, source, comment)`, keys unique.
    pub entries: Vec<CompiledEntry>,
}

impl CompiledCatalog {
    /// Collect the usable entries of a catalog.
    ///
    /// Unfinished, vanished, obsolete and empty translations are left out;
    /// of duplicate keys the first one wins.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self::from_translator(&Translator::from_catalog(catalog))
    }

    /// Collect the entries of a translator (already sorted and unique).
    #[must_use]
    pub fn from_translator(translator: &Translator) -> Self {
        let entries = translator
            .entries()
            .map(|(context, source, comment, text)| CompiledEntry {
                context: context.to_string(),
                source: source.to_string(),
                comment: comment.to_string(),
                text: text.clone(),
            })
            .collect();
        Self {
            language: translator.language().map(str::to_string),
            entries,
        }
    }

    /// Rebuild a catalog holding only these entries, all finished.
    ///
    /// Contexts come out in key order; locations and comments other than
    /// the disambiguation are not part of the compiled form.
    #[must_use]
    pub fn to_catalog(&self) -> Catalog {
        let mut catalog = Catalog {
            language: self.language.clone(),
            ..Catalog::default()
        };
        for entry in &self.entries {
            if catalog.contexts.last().is_none_or(|c| c.name != entry.context) {
                catalog.contexts.push(Context::new(entry.context.clone()));
            }
            let mut message = Message {
                source: entry.source.clone(),
                comment: (!entry.comment.is_empty()).then(|| entry.comment.clone()),
                numerus: matches!(entry.text, TranslationText::Plural(_)),
                ..Message::default()
            };
            message.translation.text = entry.text.clone();
            if let Some(context) = catalog.contexts.last_mut() {
                context.messages.push(message);
            }
        }
        catalog
    }

    /// Build a translator serving these entries.
    #[must_use]
    pub fn translator(&self) -> Translator {
        let mut translator = Translator::new(self.language.clone());
        for entry in &self.entries {
            translator.insert(
                &entry.context,
                &entry.source,
                &entry.comment,
                entry.text.clone(),
            );
        }
        translator
    }

    /// Compute a deterministic checksum of the body.
    ///
    /// Every byte is folded in with a rotation, so reordered or altered
    /// entries change the result. This is **NOT** a cryptographic hash; it
    /// detects accidental corruption only. Enable the `crypto-hash` feature
    /// for BLAKE3 digests.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0;

        if let Some(language) = &self.language {
            hash = fold(hash.rotate_left(3), language.as_bytes());
        }

        for entry in &self.entries {
            hash = fold(hash.rotate_left(13), entry.context.as_bytes());
            hash = fold(hash.rotate_left(7), entry.source.as_bytes());
            hash = fold(hash.rotate_left(11), entry.comment.as_bytes());
            for form in entry.text.forms() {
                hash = fold(hash.rotate_left(17), form.as_bytes());
            }
            if let TranslationText::Plural(forms) = &entry.text {
                hash ^= (forms.len() as u64).rotate_left(29);
            }
        }

        hash ^ (self.entries.len() as u64).rotate_left(19)
    }
}

fn fold(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash = hash.rotate_left(5) ^ u64::from(*byte);
    }
    hash.rotate_left(1) ^ bytes.len() as u64
}

// =============================================================================
// COMPILE / LOAD
// =============================================================================

/// Compile a catalog.
///
/// # Errors
///
/// Returns `TscatError::SerializationError` if encoding fails.
pub fn compile(catalog: &Catalog) -> Result<Vec<u8>, TscatError> {
    encode(&CompiledCatalog::from_catalog(catalog))
}

/// Encode an already collected compiled catalog.
pub fn encode(compiled: &CompiledCatalog) -> Result<Vec<u8>, TscatError> {
    let header = CompiledHeader::new(compiled.entries.len() as u64, compiled.checksum());

    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| TscatError::SerializationError(format!("Header: {}", e)))?;
    let data_bytes = postcard::to_allocvec(compiled)
        .map_err(|e| TscatError::SerializationError(format!("Data: {}", e)))?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| TscatError::SerializationError("Header too large".to_string()))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&header_len.to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);

    Ok(result)
}

/// Split compiled bytes into the decoded header and the raw body.
fn split_header(data: &[u8]) -> Result<(CompiledHeader, &[u8]), TscatError> {
    let Some((len_bytes, rest)) = data.split_first_chunk::<4>() else {
        return Err(TscatError::DeserializationError(
            "Data too short".to_string(),
        ));
    };
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(TscatError::DeserializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, body) = rest.split_at(header_len);

    let header: CompiledHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| TscatError::DeserializationError(format!("Header: {}", e)))?;
    Ok((header, body))
}

/// Whether `data` starts like a compiled catalog.
#[must_use]
pub fn is_compiled(data: &[u8]) -> bool {
    split_header(data).is_ok_and(|(header, _)| &header.magic == MAGIC_BYTES)
}

/// Load a compiled catalog.
///
/// # Errors
///
/// - `DeserializationError` for truncated data, wrong magic or version,
///   or a body that does not decode
/// - `LimitExceeded` when the header announces too many entries (checked
///   before the body is decoded)
/// - `ChecksumMismatch` when the body was altered
pub fn load_compiled(data: &[u8]) -> Result<CompiledCatalog, TscatError> {
    let (header, body) = split_header(data)?;
    header.validate()?;

    if header.entry_count > MAX_COMPILED_ENTRIES {
        return Err(TscatError::LimitExceeded(format!(
            "Entry count {} exceeds maximum allowed {}",
            header.entry_count, MAX_COMPILED_ENTRIES
        )));
    }

    let compiled: CompiledCatalog = postcard::from_bytes(body)
        .map_err(|e| TscatError::DeserializationError(format!("Data: {}", e)))?;

    let actual = compiled.checksum();
    if actual != header.checksum {
        return Err(TscatError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }
    if compiled.entries.len() as u64 != header.entry_count {
        return Err(TscatError::DeserializationError(
            "Entry count mismatch".to_string(),
        ));
    }

    Ok(compiled)
}

/// Checksum of the compiled form of a catalog.
///
/// Two catalogs with the same servable entries have the same checksum, even
/// if their unfinished or retired messages differ.
#[must_use]
pub fn compiled_checksum(catalog: &Catalog) -> u64 {
    CompiledCatalog::from_catalog(catalog).checksum()
}

// =============================================================================
// CRYPTOGRAPHIC HASH SUPPORT
// =============================================================================

/// BLAKE3 digest (hex, 64 characters) of the compiled bytes of a catalog.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
pub fn compiled_crypto_hash(catalog: &Catalog) -> Result<String, TscatError> {
    compile(catalog).map(|data| compute_blake3_hash(&data))
}

/// Check compiled bytes against a BLAKE3 hex digest.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn verify_crypto_hash(data: &[u8], expected_hash: &str) -> bool {
    compute_blake3_hash(data).eq_ignore_ascii_case(expected_hash)
}

/// BLAKE3 digest (hex) of raw bytes.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn compute_blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranslationStatus;

    fn sample() -> Catalog {
        let mut vanished = Message::new("Old caption", "Старий підпис");
        vanished.translation.status = TranslationStatus::Vanished;

        Catalog::new("uk")
            .with_context(
                Context::new("ListView")
                    .with_message(Message::new("Price", "Ціна"))
                    .with_message(Message::unfinished("Seller"))
                    .with_message(vanished),
            )
            .with_context(
                Context::new("Collection")
                    .with_message(Message::new("Open collection", "Відкрити колекцію"))
                    .with_message(Message::plural(
                        "%n coin(s)",
                        vec!["%n монета".into(), "%n монети".into(), "%n монет".into()],
                    )),
            )
    }

    #[test]
    fn only_usable_entries_sorted_by_key() {
        let compiled = CompiledCatalog::from_catalog(&sample());
        let keys: Vec<_> = compiled
            .entries
            .iter()
            .map(|e| (e.context.as_str(), e.source.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Collection", "%n coin(s)"),
                ("Collection", "Open collection"),
                ("ListView", "Price"),
            ]
        );
    }

    #[test]
    fn compile_roundtrip() {
        let bytes = compile(&sample()).expect("compile");
        let loaded = load_compiled(&bytes).expect("load");
        assert_eq!(loaded, CompiledCatalog::from_catalog(&sample()));

        let translator = loaded.translator();
        assert_eq!(translator.translate("ListView", "Price", None), "Ціна");
        assert_eq!(translator.translate("ListView", "Seller", None), "Seller");
        assert_eq!(
            translator.translate_plural("Collection", "%n coin(s)", None, 3),
            "3 монети"
        );
    }

    #[test]
    fn decompiled_catalog_serves_the_same_entries() {
        let compiled = CompiledCatalog::from_catalog(&sample());
        let catalog = compiled.to_catalog();
        let names: Vec<_> = catalog.contexts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Collection", "ListView"]);
        assert_eq!(catalog.message_count(), 3);
        assert!(catalog.contexts[0].messages[0].numerus);
        assert_eq!(CompiledCatalog::from_catalog(&catalog), compiled);
    }

    #[test]
    fn compile_is_deterministic() {
        let first = compile(&sample()).expect("compile 1");
        let second = compile(&sample()).expect("compile 2");
        assert_eq!(first, second, "compiled bytes must be identical");
        assert!(is_compiled(&first));
    }

    #[test]
    fn checksum_ignores_unservable_messages() {
        let mut other = sample();
        other.contexts[0].messages.push(Message::unfinished("Grade"));
        assert_eq!(compiled_checksum(&sample()), compiled_checksum(&other));

        other.contexts[0].messages[0] = Message::new("Price", "Вартість");
        assert_ne!(compiled_checksum(&sample()), compiled_checksum(&other));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = compile(&sample()).expect("compile");
        bytes[4] = b'X';
        assert!(!is_compiled(&bytes));
        let err = load_compiled(&bytes).expect_err("magic");
        assert!(matches!(err, TscatError::DeserializationError(_)));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = compile(&sample()).expect("compile");
        bytes[8] = FORMAT_VERSION + 1;
        let err = load_compiled(&bytes).expect_err("version");
        assert!(err.to_string().contains("Unsupported file version"));
    }

    #[test]
    fn detects_corruption() {
        let mut bytes = compile(&sample()).expect("compile");
        // Ціна -> Ціпа, still valid UTF-8
        let position = bytes
            .windows(4)
            .rposition(|w| w == "на".as_bytes())
            .expect("translation bytes");
        bytes[position + 1] = 0xBF;
        let err = load_compiled(&bytes).expect_err("corrupted");
        assert!(matches!(err, TscatError::ChecksumMismatch { .. }));
    }

    #[test]
    fn rejects_oversized_entry_count_before_decoding() {
        let header = CompiledHeader::new(MAX_COMPILED_ENTRIES + 1, 0);
        let header_bytes = postcard::to_allocvec(&header).expect("header");
        let mut bytes = (header_bytes.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&header_bytes);
        let err = load_compiled(&bytes).expect_err("limit");
        assert!(matches!(err, TscatError::LimitExceeded(_)));
    }

    #[test]
    fn rejects_truncated_data() {
        assert!(load_compiled(&[]).is_err());
        assert!(load_compiled(&[200, 0, 0, 0, 1]).is_err());
        assert!(!is_compiled(b"<?xml"));
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn blake3_digest_matches_compiled_bytes() {
        let bytes = compile(&sample()).expect("compile");
        let digest = compiled_crypto_hash(&sample()).expect("hash");
        assert_eq!(digest.len(), 64);
        assert!(verify_crypto_hash(&bytes, &digest));
        assert!(!verify_crypto_hash(b"other", &digest));
    }
}
