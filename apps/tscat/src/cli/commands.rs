//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::TscatConfig;
use std::path::{Path, PathBuf};
use tscat_core::{
    CatalogFormat, CatalogSession, LintConfig, MergeOptions, TscatError, merge,
    primitives::MAX_TS_INPUT_SIZE, write_ts,
};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), TscatError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| TscatError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(TscatError::LimitExceeded(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
///
/// Canonicalization resolves `..` and symlinks before anything is read.
fn validate_file_path(path: &Path) -> Result<PathBuf, TscatError> {
    let canonical = path.canonicalize().map_err(|e| {
        TscatError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(TscatError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, TscatError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        TscatError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(TscatError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| TscatError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Load a catalog file in any supported format.
pub fn load_session(path: &Path) -> Result<CatalogSession, TscatError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_TS_INPUT_SIZE as u64)?;

    let data = std::fs::read(&validated)
        .map_err(|e| TscatError::IoError(format!("Read '{}': {}", path.display(), e)))?;
    let session = CatalogSession::from_bytes(&data)?;

    tracing::debug!(
        path = %validated.display(),
        format = %session.format(),
        messages = session.catalog().message_count(),
        "Loaded catalog"
    );
    Ok(session)
}

fn write_output(path: &Path, data: &[u8]) -> Result<PathBuf, TscatError> {
    let validated = validate_output_path(path)?;
    std::fs::write(&validated, data)
        .map_err(|e| TscatError::IoError(format!("Write '{}': {}", validated.display(), e)))?;
    Ok(validated)
}

fn render_json(value: &serde_json::Value) -> Result<String, TscatError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TscatError::SerializationError(format!("JSON output: {}", e)))
}

fn print_json(value: &serde_json::Value) {
    match render_json(value) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Failed to write JSON output: {}", e),
    }
}

// =============================================================================
// LINT COMMAND
// =============================================================================

/// Lint a catalog. Returns whether the report passed.
pub fn cmd_lint(file: &Path, config: &LintConfig, json_mode: bool) -> Result<bool, TscatError> {
    let session = load_session(file)?;
    let report = session.lint(config);

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "passed": report.passed(),
            "errors": report.errors(),
            "warnings": report.warnings(),
            "fail_on": report.fail_on,
            "findings": report.findings,
        }));
        return Ok(report.passed());
    }

    for finding in &report.findings {
        println!("{}", finding);
    }
    if !report.findings.is_empty() {
        println!();
    }
    println!(
        "{}: {} error(s), {} warning(s), {} finding(s) total",
        file.display(),
        report.errors(),
        report.warnings(),
        report.findings.len()
    );
    println!(
        "Result: {}",
        if report.passed() { "PASSED" } else { "FAILED" }
    );

    Ok(report.passed())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show completion statistics.
pub fn cmd_stats(file: &Path, json_mode: bool) -> Result<(), TscatError> {
    let session = load_session(file)?;
    let stats = session.stats();

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "format": session.format(),
            "language": stats.language,
            "contexts": stats.contexts,
            "messages": stats.messages,
            "finished": stats.finished,
            "unfinished": stats.unfinished,
            "empty": stats.empty,
            "retired": stats.retired,
            "numerus": stats.numerus,
            "percent_complete": stats.percent_complete,
            "progress": stats.progress,
        }));
        return Ok(());
    }

    println!("tscat Catalog Statistics");
    println!("========================");
    println!("File:       {}", file.display());
    println!("Format:     {}", session.format());
    println!(
        "Language:   {}",
        stats.language.as_deref().unwrap_or("(none)")
    );
    println!();
    println!("Contexts:   {}", stats.contexts);
    println!("Messages:   {}", stats.messages);
    println!("Finished:   {}", stats.finished);
    println!("Unfinished: {}", stats.unfinished);
    println!("Empty:      {}", stats.empty);
    println!("Retired:    {}", stats.retired);
    println!("Plural:     {}", stats.numerus);
    println!();
    println!("Complete:   {}% ({})", stats.percent_complete, stats.progress);

    Ok(())
}

// =============================================================================
// LOOKUP COMMAND
// =============================================================================

/// Translate one string.
pub fn cmd_lookup(
    file: &Path,
    json_mode: bool,
    context: &str,
    source: &str,
    comment: Option<&str>,
    count: Option<i64>,
) -> Result<(), TscatError> {
    let session = load_session(file)?;
    let lookup = session.lookup(context, source, comment, count);

    if json_mode {
        print_json(&serde_json::json!({
            "context": context,
            "source": source,
            "comment": comment,
            "n": count,
            "translation": lookup.text,
            "found": lookup.found,
        }));
        return Ok(());
    }

    if !lookup.found {
        tracing::info!(context, source, "No finished translation, using source");
    }
    println!("{}", lookup.text);

    Ok(())
}

// =============================================================================
// COMPILE / EXPORT COMMANDS
// =============================================================================

/// Write the compiled catalog and print its checksum.
pub fn cmd_compile(file: &Path, output: &Path, json_mode: bool) -> Result<(), TscatError> {
    let session = load_session(file)?;
    let data = session.compile()?;
    let checksum = session.checksum();
    let written = write_output(output, &data)?;

    if json_mode {
        print_json(&serde_json::json!({
            "output": written.to_string_lossy(),
            "bytes": data.len(),
            "entries": session.translator().len(),
            "checksum": checksum,
        }));
        return Ok(());
    }

    println!("Checksum: {}", checksum);
    println!(
        "Compiled {} entries ({} bytes) to {:?}",
        session.translator().len(),
        data.len(),
        written
    );

    Ok(())
}

/// Convert a catalog to another format.
pub fn cmd_export(
    file: &Path,
    output: &Path,
    format: CatalogFormat,
    json_mode: bool,
) -> Result<(), TscatError> {
    let session = load_session(file)?;
    let data = session.export(format)?;
    let written = write_output(output, &data)?;

    if json_mode {
        print_json(&serde_json::json!({
            "output": written.to_string_lossy(),
            "format": format,
            "bytes": data.len(),
            "checksum": session.checksum(),
        }));
        return Ok(());
    }

    if format == CatalogFormat::Compiled {
        println!("Checksum: {}", session.checksum());
    }
    println!("Exported {} bytes to {:?}", data.len(), written);

    Ok(())
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

/// Update an existing translation from a template and write it as TS.
pub fn cmd_merge(
    existing: &Path,
    template: &Path,
    output: &Path,
    drop_obsolete: bool,
    json_mode: bool,
) -> Result<(), TscatError> {
    let existing_session = load_session(existing)?;
    let template_session = load_session(template)?;

    let (merged, report) = merge(
        existing_session.catalog(),
        template_session.catalog(),
        MergeOptions { drop_obsolete },
    );
    let written = write_output(output, write_ts(&merged).as_bytes())?;

    tracing::info!(
        kept = report.kept,
        added = report.added,
        revived = report.revived,
        vanished = report.vanished,
        dropped = report.dropped,
        "Merged catalog"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "output": written.to_string_lossy(),
            "messages": merged.message_count(),
            "report": report,
        }));
        return Ok(());
    }

    println!("Merged into {:?}", written);
    println!("  Kept:     {}", report.kept);
    println!("  Added:    {}", report.added);
    println!("  Revived:  {}", report.revived);
    println!("  Vanished: {}", report.vanished);
    println!("  Dropped:  {}", report.dropped);

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 hash of the compiled catalog.
pub fn cmd_hash(file: &Path, json_mode: bool) -> Result<(), TscatError> {
    let session = load_session(file)?;
    let hash = session.crypto_hash()?;
    let checksum = session.checksum();

    if json_mode {
        print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": hash,
            "checksum": checksum,
            "entries": session.translator().len(),
        }));
        return Ok(());
    }

    println!("BLAKE3:   {}", hash);
    println!("Checksum: {}", checksum);
    println!("Entries:  {}", session.translator().len());

    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(file: &Path, config: TscatConfig) -> Result<(), TscatError> {
    let source = validate_file_path(file)?;
    let session = load_session(&source)?;
    let server = &config.server;

    println!("tscat Catalog Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", server.host);
    println!("  Port:       {}", server.port);
    println!("  Catalog:    {}", source.display());
    println!("  Entries:    {}", session.translator().len());
    println!(
        "  Auth:       {}",
        if server.api_key.is_some() { "bearer key" } else { "disabled" }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /health - Health check");
    println!("  GET  /status - Catalog statistics");
    println!("  POST /lookup - Translate a string");
    println!("  GET  /lint   - Lint report");
    println!("  POST /export - Export compiled catalog");
    println!("  GET  /hash   - BLAKE3 hash of compiled catalog");
    println!("  POST /reload - Reload the catalog file");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", server.host, server.port);
    let state = api::AppState::new(session, config).with_source(source);
    api::run_server(&addr, state).await
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tscat_core::Severity;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="uk">
<context>
    <name>MainWindow</name>
    <message>
        <source>Open collection</source>
        <translation>Відкрити колекцію</translation>
    </message>
</context>
</TS>
"#;

    #[test]
    fn load_session_reads_ts_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lang_uk.ts");
        std::fs::write(&path, SAMPLE).expect("write");

        let session = load_session(&path).expect("load");
        assert_eq!(session.format(), CatalogFormat::Ts);
        assert_eq!(
            session.lookup("MainWindow", "Open collection", None, None).text,
            "Відкрити колекцію"
        );
    }

    #[test]
    fn json_output_is_pretty_and_never_blank() {
        let text = render_json(&serde_json::json!({"file": "lang_uk.ts", "passed": true}))
            .expect("render");
        assert!(text.starts_with('{'));
        assert!(text.contains("\n  \"file\": \"lang_uk.ts\""));

        let text = render_json(&serde_json::Value::Null).expect("render");
        assert_eq!(text, "null");
    }

    #[test]
    fn load_session_rejects_directories_and_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_session(dir.path()).is_err());
        assert!(load_session(&dir.path().join("missing.ts")).is_err());
    }

    #[test]
    fn output_parent_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ok = validate_output_path(&dir.path().join("out.tsqm")).expect("valid");
        assert_eq!(ok.file_name().and_then(|n| n.to_str()), Some("out.tsqm"));

        let missing = dir.path().join("nope").join("out.tsqm");
        assert!(validate_output_path(&missing).is_err());
    }

    #[test]
    fn compile_then_load_compiled_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("lang_uk.ts");
        let output = dir.path().join("lang_uk.tsqm");
        std::fs::write(&input, SAMPLE).expect("write");

        cmd_compile(&input, &output, true).expect("compile");
        let compiled = load_session(&output).expect("load compiled");
        assert_eq!(compiled.format(), CatalogFormat::Compiled);
        assert_eq!(
            compiled.checksum(),
            load_session(&input).expect("load").checksum()
        );
    }

    #[test]
    fn lint_failure_threshold_is_respected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ts");
        std::fs::write(
            &path,
            SAMPLE.replace("Відкрити колекцію", "Відкрити колекцію %1"),
        )
        .expect("write");

        let strict = LintConfig {
            fail_on: Severity::Warning,
            ..LintConfig::default()
        };
        assert!(!cmd_lint(&path, &strict, true).expect("lint"));

        let lenient = LintConfig {
            placeholders: false,
            ..strict
        };
        assert!(cmd_lint(&path, &lenient, true).expect("lint"));
    }
}
