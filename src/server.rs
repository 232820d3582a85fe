use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::knowledge::KnowledgeStore;
use crate::models::{BookResponse, Language, Provenance, ThoughtRequest, ThoughtResponse};
use crate::paginate::paginate;
use crate::thought::{fallback_thought, ThoughtService};

#[derive(Clone)]
struct AppState {
    knowledge: KnowledgeStore,
    thoughts: ThoughtService,
    page_target_chars: usize,
}

pub async fn run_server(
    config: AppConfig,
    knowledge: KnowledgeStore,
    thoughts: ThoughtService,
) -> Result<()> {
    let state = AppState {
        knowledge,
        thoughts,
        page_target_chars: config.page_target_chars,
    };

    let app = Router::new()
        .route("/api/thought", post(thought_handler))
        .route("/api/book", get(book_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// The lookup operation. Never fails outward: the service absorbs internal
/// errors, and even an unreadable request body gets the fallback text.
async fn thought_handler(
    State(state): State<AppState>,
    request: Result<Json<ThoughtRequest>, JsonRejection>,
) -> Json<ThoughtResponse> {
    match request {
        Ok(Json(request)) => Json(state.thoughts.lookup(request).await),
        Err(rejection) => {
            tracing::warn!("malformed thought request: {rejection}");
            Json(ThoughtResponse {
                text: fallback_thought("", Language::En),
                from: Provenance::Error,
                debug: None,
            })
        }
    }
}

/// The reading view. An absent document is an empty page list, not an error.
async fn book_handler(State(state): State<AppState>) -> Json<BookResponse> {
    let doc = state.knowledge.load().await;
    let pages = paginate(&doc.text, doc.doc_type, state.page_target_chars);

    Json(BookResponse {
        pages,
        doc_type: doc.doc_type,
        source_path: doc.source_path.map(|p| p.display().to_string()),
    })
}
