//! Page splitting for the book-reading view. Independent of lookup.

use crate::models::DocType;

/// Split decoded document text into display pages. The strategy follows the
/// resolved document type: PDFs keep their extractor's form-feed page breaks,
/// Markdown splits on top-level headings when it has at least two, and
/// everything else packs paragraphs up to the target character budget.
pub fn paginate(text: &str, doc_type: Option<DocType>, target_chars: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    match doc_type {
        Some(DocType::Pdf) => {
            let pages: Vec<String> = text
                .split('\u{0C}')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if pages.is_empty() {
                vec![text.trim().to_string()]
            } else {
                pages
            }
        }
        Some(DocType::Md) => {
            let segments = split_by_top_level_headings(text);
            if segments.len() >= 2 {
                segments
            } else {
                chunk_into_pages(text, target_chars)
            }
        }
        Some(DocType::Docx) => chunk_into_pages(text, target_chars),
        Some(DocType::Unknown) | None => vec![text.trim().to_string()],
    }
}

/// One segment per `# ` heading; text before the first heading is its own
/// segment.
fn split_by_top_level_headings(text: &str) -> Vec<String> {
    let mut segments: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let is_top_heading = line.starts_with('#')
            && line[1..].starts_with(char::is_whitespace);
        if is_top_heading && !current.iter().all(|l| l.trim().is_empty()) {
            segments.push(std::mem::take(&mut current));
        }
        current.push(line);
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Greedily pack blank-line-delimited paragraphs into pages. A paragraph is
/// never split across pages, even when it alone exceeds the budget.
fn chunk_into_pages(text: &str, target_chars: usize) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }

    let mut pages: Vec<String> = Vec::new();
    let mut page = String::new();
    for paragraph in paragraphs {
        let projected = page.len() + if page.is_empty() { 0 } else { 2 } + paragraph.len();
        if projected > target_chars && !page.is_empty() {
            pages.push(std::mem::take(&mut page));
            page = paragraph;
        } else if page.is_empty() {
            page = paragraph;
        } else {
            page.push_str("\n\n");
            page.push_str(&paragraph);
        }
    }
    if !page.trim().is_empty() {
        pages.push(page);
    }

    if pages.is_empty() {
        vec![normalized.trim().to_string()]
    } else {
        pages
    }
}
