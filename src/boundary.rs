use once_cell::sync::Lazy;
use regex::Regex;

/// Short DOI prefix used for density scans: "10.NNNN/".
pub(crate) static DOI_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"10\.\d{4}/").unwrap());

/// Reference-section heading keywords. Word-bounded so "preferences" and
/// similar embeddings do not count.
static HEADER_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:References|Bibliography|Literature Cited|Cited Literature|Reference List)\b",
    )
    .unwrap()
});

/// Find where the reference section begins by looking for DOI-dense regions.
///
/// Requires at least 4 DOI prefixes. A 4-wide sliding window spanning fewer
/// than 1000 chars marks the boundary, but only if the density continues
/// (the next 10 DOIs stay within 5000 chars) or fewer than 10 DOIs remain.
/// Returns `text.len()` if no such window exists.
pub fn doi_density_start(text: &str) -> usize {
    let positions: Vec<usize> = DOI_PREFIX_RE.find_iter(text).map(|m| m.start()).collect();
    if positions.len() < 4 {
        return text.len();
    }
    for i in 0..positions.len() - 3 {
        let span = positions[i + 3] - positions[i];
        if span < 1000 {
            if i + 10 < positions.len() {
                // Verify the density continues — a methods section can
                // contain a short burst of DOIs without being back matter.
                if positions[i + 10] - positions[i] < 5000 {
                    return positions[i];
                }
            } else {
                // Near the end of the text, almost certainly references.
                return positions[i];
            }
        }
    }
    text.len()
}

/// Find the reference section via its heading keyword.
///
/// Takes the *last* match across all keywords (references sit near the end
/// of a paper) and returns the end of that match, or `text.len()` if no
/// keyword occurs.
pub fn header_keyword_start(text: &str) -> usize {
    HEADER_KEYWORD_RE
        .find_iter(text)
        .last()
        .map(|m| m.end())
        .unwrap_or(text.len())
}

/// Markers used by the DOI-density classifier. Newline-suffixed forms avoid
/// matching inline prose like "see references therein".
const SECTION_MARKERS: [&str; 4] = [
    "references\n",
    "bibliography\n",
    "literature cited",
    "works cited",
];

/// Sections that follow the bibliography in many layouts; a mention after
/// one of these is back in trailing matter, not the reference list.
const TRAILING_SECTIONS: [&str; 5] = [
    "acknowledgments",
    "supplementary",
    "appendix",
    "author contributions",
    "[hyperlinks]",
];

/// Classify whether `pos` falls inside the reference list (DOI-density
/// variant). Looks back up to 5000 chars for a section marker and counts
/// DOI prefixes after it; independently, a ±200-char window dense with DOI
/// prefixes also counts (reference lists without a heading).
pub fn in_reference_list(text: &str, pos: usize) -> bool {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    let window_start = floor_char_boundary(text, pos.saturating_sub(5000));
    let before = text[window_start..pos].to_lowercase();

    for marker in SECTION_MARKERS {
        if let Some(marker_pos) = before.rfind(marker) {
            let after_marker = &before[marker_pos..];
            if DOI_PREFIX_RE.find_iter(after_marker).count() > 3 {
                return true;
            }
        }
    }

    let near_start = floor_char_boundary(text, pos.saturating_sub(200));
    let near_end = ceil_char_boundary(text, (pos + 200).min(text.len()));
    DOI_PREFIX_RE.find_iter(&text[near_start..near_end]).count() > 2
}

/// Classify whether `pos` falls inside the bibliography (trailing-section
/// variant). True when a heading keyword precedes `pos` and no trailing
/// section (acknowledgments, appendix, ...) intervenes.
pub fn in_bibliography(text: &str, pos: usize) -> bool {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    let Some(last) = HEADER_KEYWORD_RE.find_iter(&text[..pos]).last() else {
        return false;
    };
    let between = text[last.end()..pos].to_lowercase();
    !TRAILING_SECTIONS
        .iter()
        .any(|section| between.contains(section))
}

/// Largest char-boundary offset `<= i`.
pub(crate) fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char-boundary offset `>= i`.
pub(crate) fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doi_list(n: usize, gap: usize) -> String {
        (0..n)
            .map(|i| format!("10.1234/ref{i}"))
            .collect::<Vec<_>>()
            .join(&" ".repeat(gap))
    }

    #[test]
    fn density_boundary_found_in_dense_tail() {
        let body = "Main text without any identifiers. ".repeat(50);
        let refs = doi_list(12, 20);
        let text = format!("{body}{refs}");
        let start = doi_density_start(&text);
        assert_eq!(start, body.len());
    }

    #[test]
    fn density_boundary_absent_with_few_dois() {
        let text = "Only 10.1234/one and 10.5678/two appear here.";
        assert_eq!(doi_density_start(text), text.len());
    }

    #[test]
    fn density_ignores_sparse_methods_burst() {
        // 4 DOIs close together, then the remaining ones spread far apart:
        // the continuation check must reject the early window.
        let burst = doi_list(4, 10);
        let sparse = (0..10)
            .map(|i| format!("10.9999/x{i}"))
            .collect::<Vec<_>>()
            .join(&" ".repeat(700));
        let text = format!("{burst} {} {sparse}", "filler text ".repeat(200));
        let start = doi_density_start(&text);
        assert!(start > burst.len());
    }

    #[test]
    fn header_keyword_takes_last_match() {
        let text = "As discussed in the References below.\nMore text.\nReferences\n1. A";
        let start = header_keyword_start(text);
        let expected = text.rfind("References").unwrap() + "References".len();
        assert_eq!(start, expected);
    }

    #[test]
    fn header_keyword_absent() {
        let text = "No back matter here at all.";
        assert_eq!(header_keyword_start(text), text.len());
    }

    #[test]
    fn reference_list_detected_after_marker() {
        let refs = doi_list(6, 10);
        let text = format!("Body text here.\nReferences\n{refs}");
        let pos = text.len() - 5;
        assert!(in_reference_list(&text, pos));
    }

    #[test]
    fn reference_list_detected_by_local_density() {
        // No heading at all, but the surrounding window is DOI-dense.
        let refs = doi_list(8, 5);
        let text = format!("{}{refs}", "plain body ".repeat(30));
        let pos = text.len() - 10;
        assert!(in_reference_list(&text, pos));
    }

    #[test]
    fn body_position_not_in_reference_list() {
        let text = format!("Plain body text. {}", doi_list(6, 400));
        assert!(!in_reference_list(&text, 5));
    }

    #[test]
    fn bibliography_ends_at_trailing_section() {
        let text = "Body.\nReferences\n1. Entry one.\nAcknowledgments\nWe thank everyone.";
        let in_refs = text.find("Entry one").unwrap();
        let in_ack = text.find("thank").unwrap();
        assert!(in_bibliography(text, in_refs));
        assert!(!in_bibliography(text, in_ack));
    }

    #[test]
    fn bibliography_without_heading_is_false() {
        assert!(!in_bibliography("no heading anywhere", 10));
    }
}
