use crate::boundary::{ceil_char_boundary, floor_char_boundary};
use crate::types::Span;

const SENTENCE_DELIMS: [&str; 4] = [". ", ".\n", "? ", "! "];

/// Character-budget excerpt around `anchor`, snapped outward to sentence
/// boundaries when one lies within 100 chars of a raw edge. The returned
/// span is the untrimmed window; the string has edge whitespace trimmed.
pub fn extract_chars(text: &str, anchor: usize, budget: usize) -> (String, Span) {
    let mut start = floor_char_boundary(text, anchor.saturating_sub(budget));
    let mut end = ceil_char_boundary(text, (anchor + budget).min(text.len()));

    if start > 0 {
        let region_start = floor_char_boundary(text, start.saturating_sub(100));
        let region = &text[region_start..start];
        if let Some(off) = SENTENCE_DELIMS.iter().filter_map(|d| region.rfind(d)).max() {
            start = region_start + off + 2;
        }
    }

    if end < text.len() {
        let region_end = ceil_char_boundary(text, (end + 100).min(text.len()));
        let region = &text[end..region_end];
        if let Some(off) = SENTENCE_DELIMS.iter().filter_map(|d| region.find(d)).min() {
            end += off + 1;
        }
    }

    // Snapping moves edges by at most ~100 chars; keep the anchor inside.
    start = start.min(anchor);
    end = end.max(anchor);
    (text[start..end].trim().to_string(), Span::new(start, end))
}

/// Word-budget excerpt around a matched span: up to `budget` whitespace
/// delimited words on each side, no sentence snapping. Used for archive
/// mentions and body citations, where the surrounding prose matters more
/// than clean sentence edges.
pub fn extract_words(text: &str, span: Span, budget: usize) -> (String, Span) {
    let start = floor_char_boundary(text, span.start.min(text.len()));
    let end = ceil_char_boundary(text, span.end.min(text.len()));

    let before = &text[..start];
    let context_start = if before.split_whitespace().count() > budget {
        words_back_boundary(before, budget)
    } else {
        0
    };

    let after = &text[end..];
    let context_end = if after.split_whitespace().count() > budget {
        end + words_forward_boundary(after, budget)
    } else {
        text.len()
    };

    (
        text[context_start..context_end].trim().to_string(),
        Span::new(context_start, context_end),
    )
}

/// Byte offset in `before` where the window keeping the last `budget`
/// words begins.
fn words_back_boundary(before: &str, budget: usize) -> usize {
    let to_skip = before.split_whitespace().count() - budget;
    let mut word_count = 0;
    let mut prev_space = true;
    for (i, ch) in before.char_indices() {
        if ch.is_whitespace() {
            if !prev_space {
                word_count += 1;
                if word_count == to_skip {
                    return i + ch.len_utf8();
                }
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
    }
    0
}

/// Byte offset into `after` just past its first `budget` words.
fn words_forward_boundary(after: &str, budget: usize) -> usize {
    let mut word_count = 0;
    let mut in_word = false;
    for (i, ch) in after.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                word_count += 1;
                in_word = false;
                if word_count == budget {
                    return i;
                }
            }
        } else {
            in_word = true;
        }
    }
    after.len()
}
