use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::boundary::{doi_density_start, floor_char_boundary};
use crate::types::{ReferenceResolution, ResolutionMethod};

/// Full DOI shape used when counting reference-list entries positionally.
static DOI_FULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s]+").unwrap());

/// Line-leading 1-3 digit token followed by ".", ")" or whitespace.
/// The trailing context is validated separately; the regex crate has no
/// lookahead.
static LINE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(\d{1,3})([.)\s])").unwrap());

/// Map a target DOI to its reference-list number.
///
/// Strategy 1 scans the 500 chars before the first DOI occurrence for an
/// explicit line-leading entry number. Strategy 2 counts DOI occurrences
/// from the density boundary onward and returns the 1-based index of the
/// one containing the target. `None` if both fail; callers must then fall
/// back to author-year/title matching.
pub fn resolve_reference_number(text: &str, doi: &str) -> Option<ReferenceResolution> {
    if let Some(number) = explicit_number(text, doi) {
        debug!(number, "resolved reference number from explicit entry marker");
        return Some(ReferenceResolution {
            number,
            method: ResolutionMethod::ExplicitNumber,
        });
    }
    if let Some(number) = positional_count(text, doi) {
        debug!(number, "resolved reference number by position in reference list");
        return Some(ReferenceResolution {
            number,
            method: ResolutionMethod::PositionalCount,
        });
    }
    debug!(doi, "reference number not resolvable");
    None
}

fn find_doi_position(text: &str, doi: &str) -> Option<usize> {
    let re = Regex::new(&format!("(?i){}", regex::escape(doi))).ok()?;
    re.find(text).map(|m| m.start())
}

fn explicit_number(text: &str, doi: &str) -> Option<u32> {
    let doi_pos = find_doi_position(text, doi)?;
    let window_start = floor_char_boundary(text, doi_pos.saturating_sub(500));
    let preceding = &text[window_start..doi_pos];

    let mut last_valid = None;
    for caps in LINE_NUMBER_RE.captures_iter(preceding) {
        let whole = caps.get(0).unwrap();
        let digits = caps.get(1).unwrap();
        let sep = caps.get(2).unwrap().as_str();
        let after = &preceding[whole.end()..];

        // "12.3" is a decimal, not an entry marker; "12/" is part of an
        // identifier.
        if sep == "." && after.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if after.starts_with(|c: char| c.is_ascii_digit() || c == '/') {
            continue;
        }
        let num: u32 = digits.as_str().parse().ok()?;
        // A "10" right before a 4-digit-and-slash run is the start of a DOI
        // string, not reference number ten.
        if num == 10 && looks_like_doi_continuation(after) {
            continue;
        }
        last_valid = Some(num);
    }
    last_valid
}

fn looks_like_doi_continuation(after: &str) -> bool {
    static CONT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}/").unwrap());
    let probe_end = crate::boundary::ceil_char_boundary(after, after.len().min(20));
    CONT_RE.is_match(&after[..probe_end])
}

fn positional_count(text: &str, doi: &str) -> Option<u32> {
    let ref_start = doi_density_start(text);
    if ref_start >= text.len() {
        return None;
    }
    let section = &text[ref_start..];
    let needle = doi.to_lowercase();
    for (i, m) in DOI_FULL_RE.find_iter(section).enumerate() {
        if m.as_str().to_lowercase().contains(&needle) {
            return Some(i as u32 + 1);
        }
    }
    None
}
