//! The lookup pipeline: verbatim extraction, then the generative collaborator,
//! then the deterministic fallback. The outer boundary never fails: any
//! internal error becomes the fallback text with provenance `error`.

use anyhow::Result;

use crate::config::AppConfig;
use crate::extract::extract_answers_grouped_by_chapter;
use crate::gemini::GeminiClient;
use crate::knowledge::KnowledgeStore;
use crate::matcher::SequenceMatcher;
use crate::models::{KnowledgeDoc, Language, LookupDebug, Provenance, ThoughtRequest, ThoughtResponse};
use crate::sequence::{candidate_keys, human_form, hyphen_form, normalize_sequence};

#[derive(Clone)]
pub struct ThoughtService {
    config: AppConfig,
    knowledge: KnowledgeStore,
    gemini: GeminiClient,
}

impl ThoughtService {
    pub fn new(config: AppConfig, knowledge: KnowledgeStore, gemini: GeminiClient) -> Self {
        Self {
            config,
            knowledge,
            gemini,
        }
    }

    /// Run one lookup. Always returns a response; every error path collapses
    /// into deterministic fallback text.
    pub async fn lookup(&self, request: ThoughtRequest) -> ThoughtResponse {
        let digits = normalize_sequence(&request.sequence);

        match self.lookup_inner(&request, &digits).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("lookup failed, returning fallback: {err:#}");
                ThoughtResponse {
                    text: fallback_thought(&digits, request.language),
                    from: Provenance::Error,
                    debug: None,
                }
            }
        }
    }

    async fn lookup_inner(
        &self,
        request: &ThoughtRequest,
        digits: &str,
    ) -> Result<ThoughtResponse> {
        if digits.is_empty() {
            return Ok(empty_sequence_response(request.language));
        }

        // Nothing is cached between lookups; the document is re-resolved and
        // re-read every time.
        let doc = self.knowledge.load().await;
        self.lookup_in_document(request, digits, &doc).await
    }

    /// Pipeline body over an explicit document, so tests and the offline CLI
    /// can drive it without the filesystem.
    pub async fn lookup_in_document(
        &self,
        request: &ThoughtRequest,
        digits: &str,
        doc: &KnowledgeDoc,
    ) -> Result<ThoughtResponse> {
        // Empty sequences skip matching and the collaborator entirely, no
        // matter which entry point the caller came through.
        if digits.is_empty() {
            return Ok(empty_sequence_response(request.language));
        }

        let keys = candidate_keys(digits);
        let human_seq = request
            .human_seq
            .clone()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| human_form(digits));

        let matcher = SequenceMatcher::compile(digits, &keys)?;
        if let Some(text) = extract_answers_grouped_by_chapter(&doc.text, &matcher) {
            return Ok(ThoughtResponse {
                text,
                from: Provenance::Document,
                debug: None,
            });
        }

        let debug = LookupDebug {
            knowledge_path: doc
                .source_path
                .as_ref()
                .map(|p| p.display().to_string()),
            knowledge_chars: doc.text.chars().count(),
            used_extraction: false,
        };

        if let Some(generated) = self.try_generate(&human_seq, &keys, doc, request.language).await
        {
            return Ok(ThoughtResponse {
                text: generated,
                from: Provenance::Generated,
                debug: Some(debug),
            });
        }

        Ok(ThoughtResponse {
            text: fallback_thought(digits, request.language),
            from: Provenance::Fallback,
            debug: Some(debug),
        })
    }

    /// The only suspension point in the pipeline. Misconfiguration, transport
    /// failures, and blank replies all degrade to `None`.
    async fn try_generate(
        &self,
        human_seq: &str,
        keys: &[String],
        doc: &KnowledgeDoc,
        language: Language,
    ) -> Option<String> {
        if !self.gemini.is_configured() {
            tracing::warn!("generative collaborator not configured; skipping");
            return None;
        }

        let prompt = build_extraction_prompt(
            human_seq,
            keys,
            &doc.text,
            self.config.max_doc_chars,
            language,
        );

        match self
            .gemini
            .generate(&prompt, system_instruction(language))
            .await
        {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!("generative collaborator returned empty text");
                None
            }
            Err(err) => {
                tracing::warn!("generative collaborator failed: {err:#}");
                None
            }
        }
    }
}

fn empty_sequence_response(language: Language) -> ThoughtResponse {
    ThoughtResponse {
        text: fallback_thought("", language),
        from: Provenance::Fallback,
        debug: None,
    }
}

/// Last-resort, content-free thought. Has no failure modes.
pub fn fallback_thought(digits: &str, language: Language) -> String {
    let hyphen = hyphen_form(digits);
    match language {
        Language::Hi => format!("विचार संख्या {hyphen}"),
        Language::En => format!("Thought number {hyphen}"),
    }
}

fn system_instruction(language: Language) -> &'static str {
    match language {
        Language::Hi => {
            "आपका कार्य: केवल दस्तावेज़ से मिलान करने वाले exact (verbatim) अनुच्छेद/पंक्तियाँ निकालना। कोई पैराफ्रेस नहीं। फॉर्मेट का कड़ाई से पालन करें।"
        }
        Language::En => {
            "Your job: extract ONLY exact (verbatim) lines/paragraphs from the document that match. No paraphrasing. Follow the output format strictly."
        }
    }
}

fn no_entry_sentence(human_seq: &str, language: Language) -> String {
    match language {
        Language::Hi => format!("\"{human_seq} के लिए कोई स्पष्ट प्रविष्टि नहीं मिली।\""),
        Language::En => format!("\"No explicit entry found for {human_seq}.\""),
    }
}

fn build_extraction_prompt(
    human_seq: &str,
    keys: &[String],
    doc_text: &str,
    max_doc_chars: usize,
    language: Language,
) -> String {
    let truncated: String = if doc_text.chars().count() > max_doc_chars {
        let head: String = doc_text.chars().take(max_doc_chars).collect();
        format!("{head}\n... [TRUNCATED]")
    } else {
        doc_text.to_string()
    };

    format!(
        "Sequence: {human_seq}\n\
         Equivalent formats: {}\n\n\
         BEGIN DOCUMENT\n\
         {truncated}\n\
         END DOCUMENT\n\n\
         RULES\n\
         1) Find exact (verbatim) occurrences of ONLY this sequence (any of the equivalent formats). Do NOT match if the sequence is part of a longer sequence (e.g., 32,1, 1-32, 132, etc.).\n\
         2) For each match, take the nearest preceding heading as Chapter.\n\
         3) Output plain text blocks:\n\
         Chapter: <heading line>\n\
         Answer:\n\
         <exact line or paragraph>\n\n\
         If none found, output exactly: {}",
        keys.join(", "),
        no_entry_sentence(human_seq, language)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;
    use crate::models::DocType;
    use std::path::PathBuf;

    fn test_config() -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            knowledge_dir: PathBuf::from("/nonexistent"),
            knowledge_path: None,
            gemini: GeminiConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: None,
                model: "gemini-1.5-flash".to_string(),
            },
            max_doc_chars: 200_000,
            page_target_chars: 1_400,
        }
    }

    fn service() -> ThoughtService {
        let config = test_config();
        let knowledge = KnowledgeStore::with_dirs(
            None,
            config.knowledge_dir.clone(),
            PathBuf::from("/nonexistent"),
        );
        let gemini = GeminiClient::new(&config.gemini);
        ThoughtService::new(config, knowledge, gemini)
    }

    fn request(sequence: &str, language: Language) -> ThoughtRequest {
        ThoughtRequest {
            sequence: sequence.to_string(),
            human_seq: None,
            title: None,
            language,
        }
    }

    fn doc(text: &str) -> KnowledgeDoc {
        KnowledgeDoc {
            text: text.to_string(),
            source_path: Some(PathBuf::from("/tmp/thoughts.md")),
            doc_type: Some(DocType::Md),
        }
    }

    #[tokio::test]
    async fn empty_sequence_short_circuits_to_fallback() {
        let response = service().lookup(request("abc", Language::En)).await;
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, fallback_thought("", Language::En));
    }

    #[tokio::test]
    async fn verbatim_match_has_document_provenance() {
        let svc = service();
        let document = doc("# Chapter One\n1-2-3\nthe matched line\n");
        let response = svc
            .lookup_in_document(&request("123", Language::En), "123", &document)
            .await
            .expect("lookup");
        assert_eq!(response.from, Provenance::Document);
        assert_eq!(
            response.text,
            "Chapter: # Chapter One\nAnswer:\n1-2-3\nthe matched line"
        );
        assert!(response.debug.is_none());
    }

    #[tokio::test]
    async fn no_match_without_collaborator_falls_back() {
        let svc = service();
        let document = doc("# Chapter One\nnothing relevant here\n");
        let response = svc
            .lookup_in_document(&request("123", Language::En), "123", &document)
            .await
            .expect("lookup");
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, "Thought number 1-2-3");

        let debug = response.debug.expect("debug metadata");
        assert!(!debug.used_extraction);
        assert_eq!(debug.knowledge_chars, document.text.chars().count());
    }

    #[tokio::test]
    async fn empty_sequence_skips_pipeline_even_with_explicit_document() {
        let svc = service();
        let document = doc("# Chapter One\n1-2-3\nwould otherwise match\n");
        let response = svc
            .lookup_in_document(&request("abc", Language::En), "", &document)
            .await
            .expect("lookup");
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, fallback_thought("", Language::En));
        // No debug metadata: the matcher and collaborator stages never ran.
        assert!(response.debug.is_none());
    }

    #[tokio::test]
    async fn unreachable_collaborator_degrades_to_fallback() {
        let mut config = test_config();
        config.gemini.api_key = Some("k".to_string());
        let knowledge = KnowledgeStore::with_dirs(
            None,
            config.knowledge_dir.clone(),
            PathBuf::from("/nonexistent"),
        );
        let gemini = GeminiClient::new(&config.gemini);
        let svc = ThoughtService::new(config, knowledge, gemini);

        let document = doc("# Chapter One\nnothing relevant here\n");
        let response = svc
            .lookup_in_document(&request("123", Language::En), "123", &document)
            .await
            .expect("lookup");
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, fallback_thought("123", Language::En));
    }

    #[tokio::test]
    async fn empty_document_reaches_fallback_without_error() {
        let svc = service();
        let response = svc
            .lookup_in_document(&request("24", Language::En), "24", &KnowledgeDoc::default())
            .await
            .expect("lookup");
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, "Thought number 2-4");
    }

    #[tokio::test]
    async fn whole_lookup_never_errors_even_without_a_document() {
        let response = service().lookup(request("4 4 1", Language::En)).await;
        assert_eq!(response.from, Provenance::Fallback);
        assert_eq!(response.text, "Thought number 4-4-1");
    }

    #[test]
    fn fallback_thought_is_localized() {
        assert_eq!(fallback_thought("24", Language::En), "Thought number 2-4");
        assert_eq!(fallback_thought("24", Language::Hi), "विचार संख्या 2-4");
    }

    #[test]
    fn prompt_lists_keys_and_truncates_long_documents() {
        let keys = candidate_keys("12");
        let long_doc = "z".repeat(250);
        let prompt = build_extraction_prompt("1 → 2", &keys, &long_doc, 200, Language::En);
        assert!(prompt.contains("Sequence: 1 → 2"));
        assert!(prompt.contains("1-2"));
        assert!(prompt.contains("... [TRUNCATED]"));
        assert!(prompt.contains("No explicit entry found for 1 → 2."));

        let short = build_extraction_prompt("1 → 2", &keys, "tiny", 200, Language::En);
        assert!(!short.contains("TRUNCATED"));
        assert!(short.contains("BEGIN DOCUMENT\ntiny\nEND DOCUMENT"));
    }
}
