//! Verbatim answer extraction: scan the document once, collect matched blocks,
//! and group them under their nearest preceding heading.

use crate::matcher::{is_heading, SequenceMatcher};

const UNTITLED_CHAPTER: &str = "Untitled";

struct ChapterBucket {
    label: String,
    answers: Vec<String>,
}

/// Returns the rendered `Chapter:`/`Answer:` records, or `None` when the
/// document is empty or nothing matched (the caller then falls back).
pub fn extract_answers_grouped_by_chapter(
    doc_text: &str,
    matcher: &SequenceMatcher,
) -> Option<String> {
    if doc_text.trim().is_empty() {
        return None;
    }

    let lines: Vec<&str> = doc_text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .collect();

    let mut buckets: Vec<ChapterBucket> = Vec::new();
    let mut current_index: Option<usize> = None;
    let mut seen_blocks: Vec<String> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if is_heading(line) {
            buckets.push(ChapterBucket {
                label: line.trim().to_string(),
                answers: Vec::new(),
            });
            current_index = Some(buckets.len() - 1);
            i += 1;
            continue;
        }

        if matcher.line_matches(line) {
            let (block, end) = collect_block(&lines, i);
            if !block.is_empty() && !seen_blocks.contains(&block) {
                let index = match current_index {
                    Some(index) => index,
                    None => {
                        buckets.push(ChapterBucket {
                            label: UNTITLED_CHAPTER.to_string(),
                            answers: Vec::new(),
                        });
                        current_index = Some(buckets.len() - 1);
                        buckets.len() - 1
                    }
                };
                buckets[index].answers.push(block.clone());
                seen_blocks.push(block);
            }
            // Resume past the consumed block so its lines are not rematched.
            i = end;
            continue;
        }

        i += 1;
    }

    let mut records = Vec::new();
    for bucket in buckets.iter().filter(|b| !b.answers.is_empty()) {
        for answer in &bucket.answers {
            records.push(format!("Chapter: {}\nAnswer:\n{}", bucket.label, answer));
        }
    }

    if records.is_empty() {
        None
    } else {
        Some(records.join("\n\n"))
    }
}

/// Greedily take contiguous non-blank, non-heading lines starting at `start`.
fn collect_block(lines: &[&str], start: usize) -> (String, usize) {
    let mut acc = Vec::new();
    let mut j = start;
    while j < lines.len() && !is_heading(lines[j]) && !lines[j].trim().is_empty() {
        acc.push(lines[j]);
        j += 1;
    }
    (acc.join("\n"), j)
}
