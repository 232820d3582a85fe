use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub knowledge_dir: PathBuf,
    pub knowledge_path: Option<PathBuf>,
    pub gemini: GeminiConfig,
    pub max_doc_chars: usize,
    pub page_target_chars: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let knowledge_path = env::var("KNOWLEDGE_PATH").ok().map(|raw| {
            let path = PathBuf::from(&raw);
            if path.is_absolute() {
                path
            } else {
                env::current_dir().unwrap_or_default().join(path)
            }
        });

        Self {
            bind_addr: env::var("SPINDLE_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            knowledge_dir: env::var("SPINDLE_KNOWLEDGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./knowledge")),
            knowledge_path,
            gemini: GeminiConfig {
                base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
                api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            },
            max_doc_chars: env::var("MAX_DOC_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200_000),
            page_target_chars: env::var("PAGE_TARGET_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_400),
        }
    }
}
