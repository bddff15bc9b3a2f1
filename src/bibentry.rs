use once_cell::sync::Lazy;
use regex::Regex;

use crate::boundary::{ceil_char_boundary, floor_char_boundary};
use crate::types::{Match, PatternKind, Span};

/// Entry-start shapes searched backwards from a position inside the
/// bibliography. Works for both newline-separated and inline reference
/// formats ("...title. 29. Next Author...").
static ENTRY_START_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:^|\s)(\d{1,4})\.\s+[A-Z]",
        r"(?:^|\s)\[(\d{1,4})\]\s+[A-Z]",
        r"(?:^|\n)(\d{1,4})\.\s",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Shapes marking the start of the following entry.
static ENTRY_END_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\s(\d{1,4})\.\s+[A-Z]",
        r"\s\[(\d{1,4})\]\s+[A-Z]",
        r"\n(\d{1,4})\.\s",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static HYPERLINKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n?\[HYPERLINKS\]").unwrap());

/// Extract the bibliography entry containing `pos`, including its leading
/// reference number. Scans up to `max_chars` each way for entry markers and
/// drops any appended hyperlinks section.
pub fn bibliography_entry(text: &str, pos: usize, max_chars: usize) -> String {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    let search_start = floor_char_boundary(text, pos.saturating_sub(max_chars));
    let before = &text[search_start..pos];

    // Closest entry marker before the position wins; step past the leading
    // whitespace the patterns consume so the entry starts at the digit.
    let mut entry_start = search_start;
    let mut best = None;
    for re in ENTRY_START_RES.iter() {
        for m in re.find_iter(before) {
            if best.map_or(true, |b| m.start() > b) {
                best = Some(m.start());
                entry_start = search_start + m.start();
                while entry_start < pos
                    && matches!(text.as_bytes()[entry_start], b' ' | b'\t' | b'\n')
                {
                    entry_start += 1;
                }
            }
        }
    }

    let search_end = ceil_char_boundary(text, (pos + max_chars).min(text.len()));
    let after = &text[pos..search_end];
    let mut entry_end = search_end;
    for re in ENTRY_END_RES.iter() {
        if let Some(m) = re.find(after) {
            entry_end = entry_end.min(pos + m.start());
        }
    }

    let mut entry = text[entry_start..entry_end].trim();
    if let Some(m) = HYPERLINKS_RE.find(entry) {
        entry = entry[..m.start()].trim();
    }
    entry.to_string()
}

static REF_NUM_START_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^(\d{1,3})\.\s", r"^\[(\d{1,3})\]\s", r"^(\d{1,3})\s+[A-Z]"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// "50. Ramachandran S" / "50 Ramachandran S" / "[50] Author". 1-3 digits
/// so years never qualify.
static REF_NUM_ANYWHERE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(\d{1,3})\.\s+[A-Z][a-z]+\s+[A-Z]",
        r"\b(\d{1,3})\s+[A-Z][a-z]+\s+[A-Z]",
        r"\[(\d{1,3})\]\s+[A-Z]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Pull the reference number out of a bibliography entry. Entry-leading
/// forms are tried first; otherwise the numbered-author candidate closest
/// before `locator` (the archive substring that led us here) wins, since
/// extraction artifacts can prepend stray text to the entry.
pub fn entry_reference_number(entry: &str, locator: Option<&str>) -> Option<u32> {
    let trimmed = entry.trim();
    for re in REF_NUM_START_RES.iter() {
        if let Some(caps) = re.captures(trimmed) {
            return caps[1].parse().ok();
        }
    }

    let locator_pos = locator
        .and_then(|l| entry.find(l))
        .unwrap_or(entry.len());

    let mut best: Option<(usize, u32)> = None;
    for re in REF_NUM_ANYWHERE_RES.iter() {
        for caps in re.captures_iter(entry) {
            let at = caps.get(0).unwrap().start();
            if at < locator_pos && best.map_or(true, |(b, _)| at > b) {
                if let Ok(num) = caps[1].parse() {
                    best = Some((at, num));
                }
            }
        }
    }
    best.map(|(_, num)| num)
}

static FIG_NEARBY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:figure|table|fig\.|tab\.)\s*\d").unwrap());

static BRACKET_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+)-(\d+)\]").unwrap());
static PAREN_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)-(\d+)\)").unwrap());

/// Find body-text citations of reference `n`. Covers exact brackets and
/// parentheses, comma lists containing `n`, dashed ranges spanning `n`, and
/// the spaced shapes a lost superscript leaves behind ("text) 50 .",
/// "word 50 The", trailing "50"). Callers pass only the text before the
/// bibliography boundary.
pub fn body_citations(body: &str, n: u32) -> Vec<Match> {
    let mut out = Vec::new();

    for re in [&*BRACKET_RANGE_RE, &*PAREN_RANGE_RE] {
        for caps in re.captures_iter(body) {
            let (lo, hi): (u32, u32) = match (caps[1].parse(), caps[2].parse()) {
                (Ok(lo), Ok(hi)) => (lo, hi),
                _ => continue,
            };
            if lo <= n && n <= hi {
                let whole = caps.get(0).unwrap();
                push_unless_figure(
                    body,
                    n,
                    Span::new(whole.start(), whole.end()),
                    whole.as_str(),
                    PatternKind::NumberRange,
                    &mut out,
                );
            }
        }
    }

    let exact = [
        (format!(r"\[{n}\]"), PatternKind::Bracket),
        (format!(r"\({n}\)"), PatternKind::Paren),
        (format!(r"\[[\d,\s]*\b{n}\b[\d,\s]*\]"), PatternKind::Bracket),
        (format!(r"\([\d,\s]*\b{n}\b[\d,\s]*\)"), PatternKind::Paren),
    ];
    for (pattern, kind) in &exact {
        let re = Regex::new(pattern).unwrap();
        for m in re.find_iter(body) {
            push_unless_figure(
                body,
                n,
                Span::new(m.start(), m.end()),
                m.as_str(),
                *kind,
                &mut out,
            );
        }
    }

    // Spaced superscript leftovers. The shapes require a closing bracket,
    // paren, or letter just before; that anchor char is matched explicitly
    // and group 1 carries the citation itself.
    let spaced = [
        format!(r"[)\]A-Za-z](\s+{n}\s+[.,])"),
        format!(r"[)\]A-Za-z](\s+{n}\s+[A-Z])"),
        format!(r"[)\]A-Za-z](\s+{n})(?:\s|$)"),
    ];
    for pattern in &spaced {
        let re = Regex::new(pattern).unwrap();
        for caps in re.captures_iter(body) {
            let g = caps.get(1).unwrap();
            push_unless_figure(
                body,
                n,
                Span::new(g.start(), g.end()),
                g.as_str(),
                PatternKind::SuperscriptSpaced,
                &mut out,
            );
        }
    }

    out.sort_by_key(|m| (m.span.start, m.span.end));
    out.dedup_by(|a, b| a.span == b.span && a.matched == b.matched);
    out
}

fn push_unless_figure(
    body: &str,
    n: u32,
    span: Span,
    matched: &str,
    pattern: PatternKind,
    out: &mut Vec<Match>,
) {
    let lo = floor_char_boundary(body, span.start.saturating_sub(30));
    let hi = ceil_char_boundary(body, (span.end + 30).min(body.len()));
    for m in FIG_NEARBY_RE.find_iter(&body[lo..hi]) {
        // The digit class at the pattern tail pins the match to a number;
        // compare that number against n.
        let tail = &body[lo + m.end() - 1..hi];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.parse() == Ok(n) {
            return;
        }
    }
    out.push(Match {
        span,
        matched: matched.to_string(),
        pattern,
        reference_number: Some(n),
    });
}
