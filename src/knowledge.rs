//! Locating and decoding the active reference document.
//!
//! Every failure here collapses to "no document": lookups must keep working
//! with an empty text, so nothing in this module surfaces an error to callers.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use roxmltree::Document;
use zip::ZipArchive;

use crate::config::AppConfig;
use crate::models::{DocType, KnowledgeDoc};

const DEFAULT_BASENAMES: [&str; 2] = ["thoughts", "dice_thoughts"];
const KNOWN_EXTENSIONS: [&str; 3] = ["md", "pdf", "docx"];

#[derive(Clone)]
pub struct KnowledgeStore {
    override_path: Option<PathBuf>,
    knowledge_dir: PathBuf,
    root_dir: PathBuf,
}

impl KnowledgeStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            override_path: config.knowledge_path.clone(),
            knowledge_dir: config.knowledge_dir.clone(),
            root_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    #[cfg(test)]
    pub fn with_dirs(
        override_path: Option<PathBuf>,
        knowledge_dir: PathBuf,
        root_dir: PathBuf,
    ) -> Self {
        Self {
            override_path,
            knowledge_dir,
            root_dir,
        }
    }

    /// Resolve and decode the current reference document. Absent or undecodable
    /// documents come back as empty text, which is a valid input downstream.
    pub async fn load(&self) -> KnowledgeDoc {
        let Some(path) = self.locate().await else {
            return KnowledgeDoc::default();
        };

        let doc_type = doc_type_for(&path);
        let text = match decode(&path, doc_type).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("failed decoding {}: {err:#}", path.display());
                String::new()
            }
        };

        KnowledgeDoc {
            text,
            source_path: Some(path),
            doc_type: Some(doc_type),
        }
    }

    async fn locate(&self) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.override_path {
            candidates.push(path.clone());
        }
        for ext in KNOWN_EXTENSIONS {
            candidates.push(self.knowledge_dir.join(format!("{}.{ext}", DEFAULT_BASENAMES[0])));
        }
        for ext in KNOWN_EXTENSIONS {
            candidates.push(self.root_dir.join(format!("{}.{ext}", DEFAULT_BASENAMES[1])));
        }

        for candidate in candidates {
            if tokio::fs::metadata(&candidate).await.is_ok() {
                return Some(candidate);
            }
        }

        if let Some(found) = first_document_in(&self.knowledge_dir).await {
            return Some(found);
        }
        first_document_in(&self.root_dir).await
    }
}

/// First `.md`/`.pdf`/`.docx` entry in a directory, by name, for determinism.
async fn first_document_in(dir: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| KNOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if matches {
            names.push(path);
        }
    }
    names.sort();
    names.into_iter().next()
}

pub fn doc_type_for(path: &Path) -> DocType {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("md") => DocType::Md,
        Some("pdf") => DocType::Pdf,
        Some("docx") => DocType::Docx,
        _ => DocType::Unknown,
    }
}

async fn decode(path: &Path, doc_type: DocType) -> Result<String> {
    match doc_type {
        DocType::Md | DocType::Unknown => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed reading {}", path.display())),
        DocType::Pdf => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
                .await
                .context("PDF extraction task panicked")?
                .context("failed to extract text from PDF")
        }
        DocType::Docx => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || decode_docx(&path))
                .await
                .context("DOCX extraction task panicked")?
        }
    }
}

/// Pull paragraph text out of `word/document.xml`. Paragraphs come back
/// blank-line separated so heading paragraphs stay on their own lines for the
/// segmenter.
fn decode_docx(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("failed to open DOCX: {}", path.display()))?;
    let mut archive = ZipArchive::new(file).context("DOCX is not a valid ZIP archive")?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX missing word/document.xml")?
        .read_to_string(&mut document_xml)
        .context("failed to read word/document.xml")?;

    let doc = Document::parse(&document_xml).context("failed to parse DOCX XML")?;

    let mut paragraphs = Vec::new();
    for paragraph in doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "p")
    {
        let text = paragraph
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "t")
            .filter_map(|node| node.text())
            .collect::<Vec<_>>()
            .join("");

        let normalized = normalize_paragraph(&text);
        if !normalized.is_empty() {
            paragraphs.push(normalized);
        }
    }

    Ok(paragraphs.join("\n\n"))
}

fn normalize_paragraph(input: &str) -> String {
    input
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
