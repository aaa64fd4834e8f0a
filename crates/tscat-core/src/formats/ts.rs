//! # TS Format
//!
//! Reader and writer for Qt Linguist translation source files (`.ts`).
//!
//! ```text
//! <TS version="2.1" language="uk">
//! <context>
//!     <name>Collection</name>
//!     <message numerus="yes">
//!         <location filename="ListView.py" line="400"/>
//!         <source>%n coin(s) selected</source>
//!         <translation type="unfinished">
//!             <numerusform></numerusform>
//!             ...
//!         </translation>
//!     </message>
//! </context>
//! </TS>
//! ```
//!
//! Text inside `source`, `translation`, `numerusform` and the comment
//! elements is kept byte for byte, including surrounding whitespace.
//! Characters XML 1.0 cannot carry are written as `<byte value="x1b"/>`.
//!
//! ## Security
//!
//! The parser rejects input larger than `MAX_TS_INPUT_SIZE` before reading
//! it and stops once `MAX_MESSAGES` messages have been seen.

use crate::primitives::{MAX_MESSAGES, MAX_PLURAL_FORMS, MAX_TS_INPUT_SIZE, TS_ROOT_ELEMENT};
use crate::{
    Catalog, Context, LineRef, Location, Message, Translation, TranslationStatus,
    TranslationText, TscatError, types::DEFAULT_TS_VERSION,
};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use std::fmt::{Display, Write as _};

// =============================================================================
// READER
// =============================================================================

/// Parse a TS document.
///
/// # Errors
///
/// - `TscatError::LimitExceeded` for oversized input or too many messages
/// - `TscatError::Xml` for malformed XML
/// - `TscatError::InvalidStructure` for XML that is not a TS document
pub fn parse_ts(input: &str) -> Result<Catalog, TscatError> {
    if input.len() > MAX_TS_INPUT_SIZE {
        return Err(TscatError::LimitExceeded(format!(
            "TS input size {} bytes exceeds maximum {} bytes",
            input.len(),
            MAX_TS_INPUT_SIZE
        )));
    }
    TsParser::new(input).parse()
}

/// Streaming parser state.
struct TsParser<'a> {
    reader: Reader<&'a [u8]>,
    message_count: usize,
}

/// Element names compared as raw bytes.
fn is(e: &BytesStart<'_>, name: &[u8]) -> bool {
    e.name().as_ref() == name
}

impl<'a> TsParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            message_count: 0,
        }
    }

    fn xml_error(&self, err: impl Display) -> TscatError {
        TscatError::Xml {
            position: u64::try_from(self.reader.buffer_position()).unwrap_or(u64::MAX),
            message: err.to_string(),
        }
    }

    fn next(&mut self) -> Result<Event<'a>, TscatError> {
        match self.reader.read_event() {
            Ok(event) => Ok(event),
            Err(e) => Err(self.xml_error(e)),
        }
    }

    fn attr(&self, e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, TscatError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.xml_error(err))?;
            if attr.key.as_ref() == name {
                let value = attr.unescape_value().map_err(|err| self.xml_error(err))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn unexpected_eof(&self, inside: &str) -> TscatError {
        TscatError::InvalidStructure(format!("unexpected end of input inside <{inside}>"))
    }

    // -------------------------------------------------------------------------
    // Document
    // -------------------------------------------------------------------------

    fn parse(mut self) -> Result<Catalog, TscatError> {
        loop {
            match self.next()? {
                Event::Start(e) if is(&e, TS_ROOT_ELEMENT.as_bytes()) => {
                    let mut catalog = self.header(&e)?;
                    self.ts_body(&mut catalog)?;
                    return Ok(catalog);
                }
                Event::Empty(e) if is(&e, TS_ROOT_ELEMENT.as_bytes()) => {
                    return self.header(&e);
                }
                Event::Start(e) | Event::Empty(e) => {
                    return Err(TscatError::InvalidStructure(format!(
                        "root element is <{}>, expected <{}>",
                        String::from_utf8_lossy(e.name().as_ref()),
                        TS_ROOT_ELEMENT
                    )));
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|err| self.xml_error(err))?;
                    if !text.trim().is_empty() {
                        return Err(TscatError::InvalidStructure(
                            "text before root element".to_string(),
                        ));
                    }
                }
                Event::Eof => {
                    return Err(TscatError::InvalidStructure(
                        "document has no <TS> element".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }

    fn header(&self, e: &BytesStart<'_>) -> Result<Catalog, TscatError> {
        Ok(Catalog {
            version: self
                .attr(e, b"version")?
                .unwrap_or_else(|| DEFAULT_TS_VERSION.to_string()),
            language: self.attr(e, b"language")?.filter(|l| !l.is_empty()),
            source_language: self.attr(e, b"sourcelanguage")?.filter(|l| !l.is_empty()),
            contexts: Vec::new(),
        })
    }

    fn ts_body(&mut self, catalog: &mut Catalog) -> Result<(), TscatError> {
        loop {
            match self.next()? {
                Event::Start(e) if is(&e, b"context") => {
                    let context = self.context()?;
                    catalog.contexts.push(context);
                }
                Event::Start(e) | Event::Empty(e) if is(&e, b"message") => {
                    return Err(TscatError::InvalidStructure(
                        "<message> outside of <context>".to_string(),
                    ));
                }
                Event::Start(e) => self.skip(e.name().as_ref().to_vec())?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof(TS_ROOT_ELEMENT)),
                _ => {}
            }
        }
    }

    fn skip(&mut self, name: Vec<u8>) -> Result<(), TscatError> {
        let mut depth = 0usize;
        loop {
            match self.next()? {
                Event::Start(e) if e.name().as_ref() == name.as_slice() => depth += 1,
                Event::End(e) if e.name().as_ref() == name.as_slice() => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Event::Eof => {
                    return Err(self.unexpected_eof(&String::from_utf8_lossy(&name)));
                }
                _ => {}
            }
        }
    }

    // -------------------------------------------------------------------------
    // Context & message
    // -------------------------------------------------------------------------

    fn context(&mut self) -> Result<Context, TscatError> {
        let mut context = Context::default();
        loop {
            match self.next()? {
                Event::Start(e) if is(&e, b"name") => context.name = self.text("name")?,
                Event::Start(e) if is(&e, b"comment") => {
                    context.comment = Some(self.text("comment")?);
                }
                Event::Start(e) if is(&e, b"message") => {
                    let message = self.message(&e, false)?;
                    context.messages.push(message);
                }
                Event::Empty(e) if is(&e, b"message") => {
                    let message = self.message(&e, true)?;
                    context.messages.push(message);
                }
                Event::Start(e) => self.skip(e.name().as_ref().to_vec())?,
                Event::End(_) => return Ok(context),
                Event::Eof => return Err(self.unexpected_eof("context")),
                _ => {}
            }
        }
    }

    fn message(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<Message, TscatError> {
        self.message_count += 1;
        if self.message_count > MAX_MESSAGES {
            return Err(TscatError::LimitExceeded(format!(
                "catalog has more than {MAX_MESSAGES} messages"
            )));
        }

        let mut message = Message {
            id: self.attr(start, b"id")?,
            numerus: self.attr(start, b"numerus")?.as_deref() == Some("yes"),
            ..Message::default()
        };
        if empty {
            return Ok(message);
        }

        loop {
            match self.next()? {
                Event::Empty(e) if is(&e, b"location") => {
                    let location = self.location(&e)?;
                    message.locations.push(location);
                }
                Event::Start(e) if is(&e, b"location") => {
                    let location = self.location(&e)?;
                    message.locations.push(location);
                    self.skip(b"location".to_vec())?;
                }
                Event::Start(e) if is(&e, b"source") => message.source = self.text("source")?,
                Event::Start(e) if is(&e, b"oldsource") => {
                    message.old_source = Some(self.text("oldsource")?);
                }
                Event::Start(e) if is(&e, b"comment") => {
                    message.comment = Some(self.text("comment")?);
                }
                Event::Start(e) if is(&e, b"extracomment") => {
                    message.extra_comment = Some(self.text("extracomment")?);
                }
                Event::Start(e) if is(&e, b"translatorcomment") => {
                    message.translator_comment = Some(self.text("translatorcomment")?);
                }
                Event::Start(e) if is(&e, b"translation") => {
                    let status = self.status(&e)?;
                    let text = self.translation_text()?;
                    message.translation = Translation { status, text };
                }
                Event::Empty(e) if is(&e, b"translation") => {
                    message.translation = Translation {
                        status: self.status(&e)?,
                        text: TranslationText::default(),
                    };
                }
                Event::Start(e) => self.skip(e.name().as_ref().to_vec())?,
                Event::End(_) => return Ok(message),
                Event::Eof => return Err(self.unexpected_eof("message")),
                _ => {}
            }
        }
    }

    fn location(&self, e: &BytesStart<'_>) -> Result<Location, TscatError> {
        let line = match self.attr(e, b"line")? {
            Some(raw) => Some(LineRef::parse(&raw).ok_or_else(|| {
                TscatError::InvalidStructure(format!("invalid location line '{raw}'"))
            })?),
            None => None,
        };
        Ok(Location {
            filename: self.attr(e, b"filename")?,
            line,
        })
    }

    fn status(&self, e: &BytesStart<'_>) -> Result<TranslationStatus, TscatError> {
        match self.attr(e, b"type")? {
            None => Ok(TranslationStatus::Finished),
            Some(raw) => TranslationStatus::from_attr(&raw).ok_or_else(|| {
                TscatError::InvalidStructure(format!("unknown translation type '{raw}'"))
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Text content
    // -------------------------------------------------------------------------

    /// Read character data up to the end tag of `element`.
    fn text(&mut self, element: &str) -> Result<String, TscatError> {
        let mut out = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => {
                    out.push_str(&t.unescape().map_err(|err| self.xml_error(err))?);
                }
                Event::CData(c) => out.push_str(&self.cdata(c.into_inner().into_owned())?),
                Event::Empty(e) if is(&e, b"byte") => out.push(self.byte(&e)?),
                Event::Start(e) => {
                    return Err(TscatError::InvalidStructure(format!(
                        "unexpected <{}> inside <{element}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
                Event::End(_) => return Ok(out),
                Event::Eof => return Err(self.unexpected_eof(element)),
                _ => {}
            }
        }
    }

    /// Read the body of `<translation>`: plain text or `<numerusform>`s.
    fn translation_text(&mut self) -> Result<TranslationText, TscatError> {
        let mut text = String::new();
        let mut forms: Vec<String> = Vec::new();
        let mut variant_seen = false;

        loop {
            match self.next()? {
                Event::Text(t) => {
                    text.push_str(&t.unescape().map_err(|err| self.xml_error(err))?);
                }
                Event::CData(c) => text.push_str(&self.cdata(c.into_inner().into_owned())?),
                Event::Empty(e) if is(&e, b"byte") => text.push(self.byte(&e)?),
                Event::Start(e) if is(&e, b"numerusform") => {
                    if forms.len() >= MAX_PLURAL_FORMS {
                        return Err(TscatError::LimitExceeded(format!(
                            "translation has more than {MAX_PLURAL_FORMS} plural forms"
                        )));
                    }
                    forms.push(self.text("numerusform")?);
                }
                Event::Empty(e) if is(&e, b"numerusform") => forms.push(String::new()),
                // Only the first (longest) length variant is kept.
                Event::Start(e) if is(&e, b"lengthvariant") => {
                    let variant = self.text("lengthvariant")?;
                    if !variant_seen {
                        text.push_str(&variant);
                        variant_seen = true;
                    }
                }
                Event::Start(e) => {
                    return Err(TscatError::InvalidStructure(format!(
                        "unexpected <{}> inside <translation>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.unexpected_eof("translation")),
                _ => {}
            }
        }

        if forms.is_empty() {
            return Ok(TranslationText::Singular(text));
        }
        if !text.trim().is_empty() {
            return Err(TscatError::InvalidStructure(
                "translation mixes text and <numerusform>".to_string(),
            ));
        }
        Ok(TranslationText::Plural(forms))
    }

    fn cdata(&self, bytes: Vec<u8>) -> Result<String, TscatError> {
        String::from_utf8(bytes).map_err(|err| self.xml_error(err))
    }

    /// Decode `<byte value="x1b"/>` (hex with `x` prefix) or `<byte value="27"/>`.
    fn byte(&self, e: &BytesStart<'_>) -> Result<char, TscatError> {
        let raw = self
            .attr(e, b"value")?
            .ok_or_else(|| TscatError::InvalidStructure("<byte> without value".to_string()))?;
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .ok_or_else(|| TscatError::InvalidStructure(format!("invalid byte value '{raw}'")))
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Serialize a catalog in Qt Linguist's layout.
///
/// This is a pure transformation - no file I/O.
#[must_use]
pub fn write_ts(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(catalog.message_count() * 160 + 128);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n");

    let _ = write!(out, "<TS version=\"{}\"", escape(&catalog.version));
    if let Some(language) = &catalog.language {
        let _ = write!(out, " language=\"{}\"", escape(language));
    }
    if let Some(source_language) = &catalog.source_language {
        let _ = write!(out, " sourcelanguage=\"{}\"", escape(source_language));
    }
    out.push_str(">\n");

    for context in &catalog.contexts {
        write_context(&mut out, context);
    }

    out.push_str("</TS>\n");
    out
}

fn write_context(out: &mut String, context: &Context) {
    out.push_str("<context>\n");
    write_element(out, 1, "name", &context.name);
    if let Some(comment) = &context.comment {
        write_element(out, 1, "comment", comment);
    }
    for message in &context.messages {
        write_message(out, message);
    }
    out.push_str("</context>\n");
}

fn write_message(out: &mut String, message: &Message) {
    out.push_str("    <message");
    if let Some(id) = &message.id {
        let _ = write!(out, " id=\"{}\"", escape(id));
    }
    if message.numerus {
        out.push_str(" numerus=\"yes\"");
    }
    out.push_str(">\n");

    for location in &message.locations {
        out.push_str("        <location");
        if let Some(filename) = &location.filename {
            let _ = write!(out, " filename=\"{}\"", escape(filename));
        }
        if let Some(line) = &location.line {
            let _ = write!(out, " line=\"{line}\"");
        }
        out.push_str("/>\n");
    }

    write_element(out, 2, "source", &message.source);
    let optional = [
        ("oldsource", &message.old_source),
        ("comment", &message.comment),
        ("extracomment", &message.extra_comment),
        ("translatorcomment", &message.translator_comment),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            write_element(out, 2, name, value);
        }
    }

    write_translation(out, &message.translation);
    out.push_str("    </message>\n");
}

fn write_translation(out: &mut String, translation: &Translation) {
    out.push_str("        <translation");
    if let Some(kind) = translation.status.as_attr() {
        let _ = write!(out, " type=\"{kind}\"");
    }

    match &translation.text {
        TranslationText::Singular(text) if text.is_empty() => out.push_str("/>\n"),
        TranslationText::Plural(forms) if forms.is_empty() => out.push_str("/>\n"),
        TranslationText::Singular(text) => {
            let _ = writeln!(out, ">{}</translation>", escape_text(text));
        }
        TranslationText::Plural(forms) => {
            out.push_str(">\n");
            for form in forms {
                write_element(out, 3, "numerusform", form);
            }
            out.push_str("        </translation>\n");
        }
    }
}

fn write_element(out: &mut String, level: usize, name: &str, text: &str) {
    for _ in 0..level {
        out.push_str("    ");
    }
    let _ = writeln!(out, "<{name}>{}</{name}>", escape_text(text));
}

/// Escape character data, encoding XML-forbidden control characters as `<byte>`.
fn escape_text(text: &str) -> String {
    if !text.chars().any(is_forbidden) {
        return escape(text).into_owned();
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut run_start = 0;
    for (idx, ch) in text.char_indices() {
        if is_forbidden(ch) {
            out.push_str(&escape(&text[run_start..idx]));
            let _ = write!(out, "<byte value=\"x{:x}\"/>", u32::from(ch));
            run_start = idx + ch.len_utf8();
        }
    }
    out.push_str(&escape(&text[run_start..]));
    out
}

fn is_forbidden(ch: char) -> bool {
    ch.is_control() && !matches!(ch, '\t' | '\n' | '\r') && u32::from(ch) < 0x20
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" ?><!DOCTYPE TS><TS language="uk" version="2.0">
<context>
    <name>Collection</name>
    <message>
        <location filename="Collection.py" line="555"/>
        <source>Can&apos;t open collection %s</source>
        <translation>Неможливо відкрити колекцію %s</translation>
    </message>
    <message>
        <location filename="Collection.py" line="381"/>
        <source>file is readonly</source>
        <translation type="unfinished"/>
    </message>
</context>
<context>
    <name>ListView</name>
    <message numerus="yes">
        <location filename="ListView.py" line="400"/>
        <source>%n coin(s) selected</source>
        <translation type="unfinished"><numerusform></numerusform><numerusform></numerusform><numerusform></numerusform></translation>
    </message>
</context>
</TS>
"#;

    #[test]
    fn parses_header_and_contexts() {
        let catalog = parse_ts(SAMPLE).expect("parse");
        assert_eq!(catalog.version, "2.0");
        assert_eq!(catalog.language.as_deref(), Some("uk"));
        assert_eq!(catalog.contexts.len(), 2);
        assert_eq!(catalog.contexts[0].name, "Collection");
        assert_eq!(catalog.message_count(), 3);
    }

    #[test]
    fn unescapes_entities_in_source() {
        let catalog = parse_ts(SAMPLE).expect("parse");
        let message = &catalog.contexts[0].messages[0];
        assert_eq!(message.source, "Can't open collection %s");
        assert_eq!(
            message.locations,
            vec![Location::new("Collection.py", 555)]
        );
        assert!(message.translation.is_usable());
    }

    #[test]
    fn parses_unfinished_and_numerus() {
        let catalog = parse_ts(SAMPLE).expect("parse");
        let unfinished = &catalog.contexts[0].messages[1];
        assert_eq!(unfinished.status(), TranslationStatus::Unfinished);
        assert!(unfinished.translation.text.is_empty());

        let plural = &catalog.contexts[1].messages[0];
        assert!(plural.numerus);
        assert_eq!(
            plural.translation.text,
            TranslationText::Plural(vec![String::new(); 3])
        );
    }

    #[test]
    fn preserves_whitespace_in_text() {
        let input = "<TS version=\"2.1\"><context><name>A</name><message>\
                     <source>  Name: </source><translation> Назва: </translation>\
                     </message></context></TS>";
        let catalog = parse_ts(input).expect("parse");
        let message = &catalog.contexts[0].messages[0];
        assert_eq!(message.source, "  Name: ");
        assert_eq!(message.translation.text, TranslationText::Singular(" Назва: ".into()));
    }

    #[test]
    fn decodes_byte_elements() {
        let input = "<TS><context><name>A</name><message>\
                     <source>a<byte value=\"x1b\"/>b</source><translation>c<byte value=\"7\"/></translation>\
                     </message></context></TS>";
        let catalog = parse_ts(input).expect("parse");
        let message = &catalog.contexts[0].messages[0];
        assert_eq!(message.source, "a\u{1b}b");
        assert_eq!(message.translation.text, TranslationText::Singular("c\u{7}".into()));
    }

    #[test]
    fn rejects_wrong_root() {
        let result = parse_ts("<resources><string/></resources>");
        assert!(matches!(result, Err(TscatError::InvalidStructure(_))));
    }

    #[test]
    fn rejects_message_outside_context() {
        let result = parse_ts("<TS><message><source>x</source></message></TS>");
        assert!(matches!(result, Err(TscatError::InvalidStructure(_))));
    }

    #[test]
    fn rejects_truncated_document() {
        let result = parse_ts("<TS><context><name>A</name><message><source>x</source>");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_mixed_plural_translation() {
        let input = "<TS><context><name>A</name><message numerus=\"yes\"><source>%n</source>\
                     <translation>text<numerusform>a</numerusform></translation>\
                     </message></context></TS>";
        assert!(matches!(parse_ts(input), Err(TscatError::InvalidStructure(_))));
    }

    #[test]
    fn rejects_unknown_translation_type() {
        let input = "<TS><context><name>A</name><message><source>x</source>\
                     <translation type=\"draft\">y</translation></message></context></TS>";
        assert!(matches!(parse_ts(input), Err(TscatError::InvalidStructure(_))));
    }

    #[test]
    fn skips_unknown_elements() {
        let input = "<TS><defaultcodec>UTF-8</defaultcodec><context><name>A</name>\
                     <message><source>x</source><userdata><a>1</a></userdata>\
                     <translation>y</translation></message></context></TS>";
        let catalog = parse_ts(input).expect("parse");
        assert_eq!(catalog.contexts[0].messages[0].source, "x");
    }

    #[test]
    fn relative_locations_roundtrip() {
        let input = "<TS><context><name>A</name><message>\
                     <location line=\"+3\"/><source>x</source><translation>y</translation>\
                     </message></context></TS>";
        let catalog = parse_ts(input).expect("parse");
        let written = write_ts(&catalog);
        assert!(written.contains("<location line=\"+3\"/>"));
        assert_eq!(parse_ts(&written).expect("reparse"), catalog);
    }

    #[test]
    fn writer_uses_qt_layout() {
        let catalog = parse_ts(SAMPLE).expect("parse");
        let written = write_ts(&catalog);

        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n"));
        assert!(written.contains("<TS version=\"2.0\" language=\"uk\">\n"));
        assert!(written.contains("        <source>Can&apos;t open collection %s</source>\n"));
        assert!(written.contains("        <translation type=\"unfinished\"/>\n"));
        assert!(written.contains("            <numerusform></numerusform>\n"));
    }

    #[test]
    fn writer_roundtrips_sample() {
        let catalog = parse_ts(SAMPLE).expect("parse");
        let reparsed = parse_ts(&write_ts(&catalog)).expect("reparse");
        assert_eq!(reparsed, catalog);
    }

    #[test]
    fn writer_never_invents_text_for_empty_plural() {
        let catalog = Catalog::new("uk").with_context(
            Context::new("ListView").with_message(Message::plural("%n coin(s)", vec![])),
        );
        let written = write_ts(&catalog);
        assert!(written.contains("        <translation/>\n"));

        let reparsed = parse_ts(&written).expect("reparse");
        let message = &reparsed.contexts[0].messages[0];
        assert!(message.numerus);
        assert!(message.translation.text.is_empty());
        assert!(!message.translation.is_usable());
    }

    #[test]
    fn writer_encodes_control_characters() {
        assert_eq!(escape_text("a\u{1b}<b"), "a<byte value=\"x1b\"/>&lt;b");
        assert_eq!(escape_text("line\nbreak"), "line\nbreak");
    }
}
