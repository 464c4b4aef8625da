//! Corpus-folder ingestion: discovers Markdown files recursively, runs each
//! through the table-flattening preprocessor, and stitches the results into
//! one corpus text ready for index construction. Unreadable files are
//! reported, not fatal.

use crate::error::IngestError;
use crate::models::CorpusFingerprint;
use crate::preprocess::prepare_markdown;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_markdown_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_markdown = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
            });

        if is_markdown {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct CorpusReport {
    /// Preprocessed corpus text, files separated by blank lines; feed it to
    /// [`crate::FactIndex::from_text`].
    pub text: String,
    pub files: Vec<CorpusFingerprint>,
    pub skipped_files: Vec<SkippedFile>,
}

/// Loads every Markdown file under `folder`, skipping unreadable ones with
/// a reason. Errors only when the folder holds no Markdown at all.
pub fn build_corpus_best_effort(folder: &Path) -> Result<CorpusReport, IngestError> {
    let files = discover_markdown_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no markdown files found in {}",
            folder.display()
        )));
    }

    let mut text = String::new();
    let mut fingerprints = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        let load_result = (|| {
            let fingerprint = build_corpus_fingerprint(&path)?;
            let prepared = prepare_markdown(&path)?;
            Ok::<_, IngestError>((fingerprint, prepared))
        })();

        match load_result {
            Ok((fingerprint, prepared)) => {
                if !text.is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(&prepared);
                fingerprints.push(fingerprint);
            }
            Err(error) => skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    Ok(CorpusReport {
        text,
        files: fingerprints,
        skipped_files,
    })
}

fn build_corpus_fingerprint(path: &Path) -> Result<CorpusFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(CorpusFingerprint {
        document_id: generate_document_id(path),
        title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
