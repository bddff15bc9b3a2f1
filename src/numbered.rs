use once_cell::sync::Lazy;
use regex::Regex;

use crate::boundary::{ceil_char_boundary, floor_char_boundary};
use crate::dedup;
use crate::types::{Match, PatternKind, Span};

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]").unwrap());

/// Parenthetical citation lists: (42), (15, 16), (17-20). Groups limited to
/// 1-3 digits so years never parse as citation numbers.
static PAREN_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{1,3}(?:\s*[,–-]\s*\d{1,3})*)\)").unwrap());

/// Comma-separated superscript run directly after a word: "cortex105,106".
static SUPER_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z](\d{1,3}(?:,\d{1,3})+)").unwrap());

/// Free-standing dashed range: "11 - 15", "16–20".
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})\s*[–-]\s*(\d{1,3})").unwrap());

/// Range inside a bracket or parenthesis content string.
static INNER_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*[–-]\s*(\d+)").unwrap());

static FOUR_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static SHORT_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,3}\b").unwrap());
static DIGIT_BEFORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d\s*$").unwrap());
static LETTER_BEFORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]\s*$").unwrap());

/// Unit token immediately after a dashed range: "10-20 kHz", "5-10 ms".
static UNIT_AFTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*[kMG]?[HzΩωms%°]").unwrap());

/// Surrounding patterns that disqualify a dashed range as a citation:
/// DOI prefixes, ORCIDs, frequency/impedance units, probe designations,
/// version-code suffixes. Accumulated from observed false positives.
static RANGE_DENY_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"10\.",
        r"0000-",
        r"\d{4}-\d{4}",
        r"[kMG]?Hz",
        r"[kMG]?Ω",
        r"\d+\s*[kMG]?[Ωω]",
        r"[A-Z]\d+x\d+",
        r"-\d{2,4}\.",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Find every plausible in-text citation of reference number `n`.
///
/// The sub-patterns are independent and non-exclusive; candidates whose
/// ±30-char context names a figure or table are discarded, and the result
/// is deduplicated by start offset.
pub fn find_numbered_citations(text: &str, n: u32) -> Vec<Match> {
    let word_re = Regex::new(&format!(r"\b{n}\b")).unwrap();
    let mut matches = Vec::new();

    collect_bracketed(text, n, &word_re, &mut matches);
    collect_parenthetical(text, n, &word_re, &mut matches);
    collect_superscripts(text, n, &mut matches);
    collect_ranges(text, n, &mut matches);

    let fig_re = Regex::new(&format!(r"(?i)(?:figure|table|fig\.|tab\.)\s*{n}\b")).unwrap();
    matches.retain(|m| !is_figure_or_table(text, m.span, &fig_re));

    let mut matches = dedup::dedup_by_start(matches);
    matches.sort_by_key(|m| m.span.start);
    matches
}

fn push(matches: &mut Vec<Match>, span: Span, text: &str, pattern: PatternKind, n: u32) {
    matches.push(Match {
        span,
        matched: text[span.start..span.end].to_string(),
        pattern,
        reference_number: Some(n),
    });
}

/// [42], [41,42,43], [40-45].
fn collect_bracketed(text: &str, n: u32, word_re: &Regex, matches: &mut Vec<Match>) {
    for caps in BRACKET_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let content = caps.get(1).unwrap().as_str();
        let span = Span::new(whole.start(), whole.end());
        if word_re.is_match(content) {
            push(matches, span, text, PatternKind::Bracket, n);
        } else if content_range_contains(content, n) {
            push(matches, span, text, PatternKind::Bracket, n);
        }
    }
}

/// (42), (15, 16), (17-20) — rejecting anything containing a bare year.
fn collect_parenthetical(text: &str, n: u32, word_re: &Regex, matches: &mut Vec<Match>) {
    for caps in PAREN_LIST_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let content = caps.get(1).unwrap().as_str();
        if FOUR_DIGIT_RE.is_match(content) {
            continue;
        }
        let span = Span::new(whole.start(), whole.end());
        if word_re.is_match(content) {
            push(matches, span, text, PatternKind::Paren, n);
        } else if content_range_contains(content, n) {
            push(matches, span, text, PatternKind::Paren, n);
        }
    }
}

fn content_range_contains(content: &str, n: u32) -> bool {
    if !content.contains('-') && !content.contains('–') {
        return false;
    }
    INNER_RANGE_RE.captures_iter(content).any(|r| {
        let (Ok(a), Ok(b)) = (r[1].parse::<u32>(), r[2].parse::<u32>()) else {
            return false;
        };
        a <= n && n <= b
    })
}

/// Superscript citations that survive plain-text extraction: a number glued
/// to (or spaced after) the preceding word, optionally in a comma group.
fn collect_superscripts(text: &str, n: u32, matches: &mut Vec<Match>) {
    // "reported previously42" or "studies42,43"
    let glued_re = Regex::new(&format!(r"[A-Za-z]{n}(?:[,\s]|$)")).unwrap();
    for m in glued_re.find_iter(text) {
        push(
            matches,
            Span::new(m.start(), m.end()),
            text,
            PatternKind::Superscript,
            n,
        );
    }

    // "cortex105,106" where n sits anywhere in the group
    for caps in SUPER_GROUP_RE.captures_iter(text) {
        let group = caps.get(1).unwrap().as_str();
        if group
            .split(',')
            .filter_map(|part| part.parse::<u32>().ok())
            .any(|v| v == n)
        {
            let whole = caps.get(0).unwrap();
            push(
                matches,
                Span::new(whole.start(), whole.end()),
                text,
                PatternKind::SuperscriptGroup,
                n,
            );
        }
    }

    // "circuits 5 , 7" (Europe PMC XML spacing). Citations cluster, so
    // require a second short number in the lookaround window.
    let spaced_re =
        Regex::new(&format!(r"[A-Za-z]\s+{n}(?:\s*[,–-]\s*\d+)*(?:\s|$|[,.])")).unwrap();
    for m in spaced_re.find_iter(text) {
        let w_start = floor_char_boundary(text, m.start().saturating_sub(5));
        let w_end = ceil_char_boundary(text, (m.end() + 20).min(text.len()));
        if SHORT_NUMBER_RE.find_iter(&text[w_start..w_end]).count() >= 2 {
            push(
                matches,
                Span::new(m.start(), m.end()),
                text,
                PatternKind::SuperscriptSpaced,
                n,
            );
        }
    }

    // "text) 62 using..." — citation after a closing parenthesis, common
    // when superscripts follow identifiers.
    let post_paren_re =
        Regex::new(&format!(r"\)\s*{n}(?:\s*[,–-]\s*\d+)*(?:\s|$|[,.])")).unwrap();
    for m in post_paren_re.find_iter(text) {
        push(
            matches,
            Span::new(m.start(), m.end()),
            text,
            PatternKind::PostParen,
            n,
        );
    }
}

/// Dashed ranges like "11 – 15" anywhere in text, heavily guarded: the
/// range must follow a word (not a number) and must not sit in identifier
/// or measurement context.
fn collect_ranges(text: &str, n: u32, matches: &mut Vec<Match>) {
    for caps in RANGE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let (Ok(a), Ok(b)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        if !(a <= n && n <= b) {
            continue;
        }

        let before_start = floor_char_boundary(text, whole.start().saturating_sub(30));
        let after_end = ceil_char_boundary(text, (whole.end() + 30).min(text.len()));
        let before = &text[before_start..whole.start()];
        let after = &text[whole.end()..after_end];
        let context = &text[before_start..after_end];

        if RANGE_DENY_RES.iter().any(|re| re.is_match(context)) {
            continue;
        }
        if UNIT_AFTER_RE.is_match(after) {
            continue;
        }
        if DIGIT_BEFORE_RE.is_match(before) {
            continue;
        }
        if !LETTER_BEFORE_RE.is_match(before) {
            continue;
        }
        push(
            matches,
            Span::new(whole.start(), whole.end()),
            text,
            PatternKind::NumberRange,
            n,
        );
    }
}

fn is_figure_or_table(text: &str, span: Span, fig_re: &Regex) -> bool {
    let start = floor_char_boundary(text, span.start.saturating_sub(30));
    let end = ceil_char_boundary(text, (span.end + 30).min(text.len()));
    fig_re.is_match(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(text: &str, n: u32) -> Vec<usize> {
        find_numbered_citations(text, n)
            .into_iter()
            .map(|m| m.span.start)
            .collect()
    }

    #[test]
    fn bracketed_single_number() {
        let text = "as shown in earlier work [12] and elsewhere";
        let hits = find_numbered_citations(text, 12);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].span.start, text.find("[12]").unwrap());
        assert_eq!(hits[0].matched, "[12]");
        assert_eq!(hits[0].reference_number, Some(12));
    }

    #[test]
    fn bracketed_comma_list() {
        let text = "consistent with prior reports [41,42,43].";
        assert_eq!(starts(text, 42), vec![text.find('[').unwrap()]);
        assert!(starts(text, 44).is_empty());
    }

    #[test]
    fn bracketed_range_inclusion() {
        let text = "established models [5-10] but see [8-10] as well";
        let hits = starts(text, 7);
        assert_eq!(hits, vec![text.find("[5-10]").unwrap()]);
        assert!(starts(text, 3).is_empty());
    }

    #[test]
    fn parenthetical_list_and_range() {
        let text = "previous studies (15, 16) and reviews (17-20) agree";
        assert_eq!(starts(text, 16), vec![text.find("(15").unwrap()]);
        assert_eq!(starts(text, 18), vec![text.find("(17").unwrap()]);
    }

    #[test]
    fn parenthetical_year_not_a_citation() {
        // A bare year inside parentheses is an author-year artifact.
        let text = "as described (2016) in the methods";
        assert!(starts(text, 201).is_empty());
        assert!(starts(text, 16).is_empty());
    }

    #[test]
    fn glued_superscript() {
        let text = "as reported previously42, the effect persists";
        let hits = find_numbered_citations(text, 42);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pattern, PatternKind::Superscript);
    }

    #[test]
    fn superscript_comma_group() {
        let text = "recordings from cortex105,106 show this";
        assert_eq!(starts(text, 106).len(), 1);
        assert!(starts(text, 107).is_empty());
    }

    #[test]
    fn spaced_superscript_requires_clustering() {
        let clustered = "neural circuits 5 , 7 have been described";
        assert!(!starts(clustered, 5).is_empty());
        // A lone spaced number with no neighbors is too ambiguous.
        let lone = "neural circuits 5 have been described extensively here";
        assert!(starts(lone, 5).is_empty());
    }

    #[test]
    fn citation_after_closing_paren() {
        let text = "(RRID:AB_123456) 62 using standard methods";
        let hits = find_numbered_citations(text, 62);
        assert!(hits.iter().any(|m| m.pattern == PatternKind::PostParen));
    }

    #[test]
    fn unit_range_denied() {
        let text = "signals were recorded at 10-20 kHz during each session";
        for n in 10..=20 {
            let hits = find_numbered_citations(text, n);
            assert!(
                hits.iter().all(|m| m.pattern != PatternKind::NumberRange),
                "n={n} must not match as a citation range"
            );
        }
        assert!(starts(text, 15).is_empty());
    }

    #[test]
    fn word_preceded_range_accepted() {
        let text = "this was reported in studies 10-20 with good agreement";
        assert!(!starts(text, 15).is_empty());
        assert!(starts(text, 9).is_empty());
    }

    #[test]
    fn orcid_range_denied() {
        let text = "ORCID 0000-0002-1825-0097 lists the author";
        assert!(starts(text, 2).is_empty());
    }

    #[test]
    fn number_preceded_range_denied() {
        let text = "values between 3 5-10 were observed";
        assert!(starts(text, 7).is_empty());
    }

    #[test]
    fn figure_reference_excluded() {
        // Clustering alone would accept "Figure 42 , 43"; the figure/table
        // context check must override it.
        let text = "summarized in Figure 42 , 43 of the supplement";
        assert!(starts(text, 42).is_empty());
        assert!(!find_numbered_citations("established earlier [42] here", 42).is_empty());
    }

    #[test]
    fn duplicate_starts_collapse() {
        // Bracket content matching both the word and range paths must
        // produce a single match.
        let text = "see [5-10] here";
        assert_eq!(starts(text, 5).len(), 1);
    }
}
