use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Only affects user-facing strings; matching semantics are language-blind.
/// Anything other than "hi" on the wire coerces to English.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Hi,
    #[default]
    #[serde(other)]
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }
}

/// Where the thought text came from. `Error` means an internal failure was
/// absorbed and the deterministic fallback was substituted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Document,
    Generated,
    Fallback,
    Error,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Document => "document",
            Provenance::Generated => "generated",
            Provenance::Fallback => "fallback",
            Provenance::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtRequest {
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub human_seq: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtResponse {
    pub text: String,
    pub from: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<LookupDebug>,
}

/// Diagnostics attached when the answer did not come from verbatim extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupDebug {
    pub knowledge_path: Option<String>,
    pub knowledge_chars: usize,
    pub used_extraction: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Md,
    Pdf,
    Docx,
    Unknown,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Md => "md",
            DocType::Pdf => "pdf",
            DocType::Docx => "docx",
            DocType::Unknown => "unknown",
        }
    }
}

/// Decoded plain text of the active reference document. An empty `text` with
/// `source_path: None` means no document is available, which is a valid state.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeDoc {
    pub text: String,
    pub source_path: Option<PathBuf>,
    pub doc_type: Option<DocType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub pages: Vec<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<DocType>,
    pub source_path: Option<String>,
}
