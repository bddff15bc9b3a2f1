use std::cmp::Reverse;
use std::collections::HashSet;

use crate::types::{ArchiveMatch, Match, Span};

/// Drop numbered-citation matches sharing an exact start offset; the first
/// occurrence wins. Independent sub-patterns frequently fire on the same
/// bracket or parenthesis.
pub fn dedup_by_start(matches: Vec<Match>) -> Vec<Match> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert(m.span.start))
        .collect()
}

/// Bucket-level dedup for author-year and title matches: positions within
/// the same 100-char bucket are one logical citation, because the pattern
/// variants overlap heavily ("Smith (2020)" inside "(see Smith (2020))").
/// The bucket set is shared across calls so author-year and title hits for
/// the same citation collapse together.
pub fn dedup_by_bucket(matches: Vec<Match>, seen_buckets: &mut HashSet<usize>) -> Vec<Match> {
    matches
        .into_iter()
        .filter(|m| seen_buckets.insert(m.span.start / 100))
        .collect()
}

/// One position group of body citations: several sub-patterns can fire on
/// the same citation ("text 29 ." and "text 29"), so hits whose spans lie
/// within `gap` chars collapse into one group carrying every distinct
/// matched string.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    pub span: Span,
    pub matched_strings: Vec<String>,
}

pub fn group_nearby(matches: Vec<Match>, gap: usize) -> Vec<MatchGroup> {
    let mut groups: Vec<MatchGroup> = Vec::new();
    for m in matches {
        match groups.iter_mut().find(|g| g.span.near(&m.span, gap)) {
            Some(g) => {
                g.span = g.span.union(&m.span);
                if !g.matched_strings.contains(&m.matched) {
                    g.matched_strings.push(m.matched);
                }
            }
            None => groups.push(MatchGroup {
                span: m.span,
                matched_strings: vec![m.matched],
            }),
        }
    }
    groups
}

/// Merge archive-ID detections: matches for the same extracted ID whose
/// spans overlap or lie within `proximity` chars become one detection with
/// the unioned span and every distinct matched substring retained.
///
/// Candidates are ordered by (id, start, descending length) first so the
/// longest, most specific match at a position becomes the representative;
/// the result is ordered by start offset.
pub fn merge_archive_matches(
    mut matches: Vec<ArchiveMatch>,
    proximity: usize,
) -> Vec<ArchiveMatch> {
    matches.sort_by(|a, b| {
        (a.id.as_str(), a.span.start, Reverse(a.span.len()))
            .cmp(&(b.id.as_str(), b.span.start, Reverse(b.span.len())))
    });

    let mut merged: Vec<ArchiveMatch> = Vec::new();
    for m in matches {
        let existing = merged
            .iter_mut()
            .find(|e| e.id == m.id && e.span.near(&m.span, proximity));
        match existing {
            Some(e) => {
                e.span = e.span.union(&m.span);
                for s in m.matched_strings {
                    if !e.matched_strings.contains(&s) {
                        e.matched_strings.push(s);
                    }
                }
            }
            None => merged.push(m),
        }
    }

    merged.sort_by_key(|m| m.span.start);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArchivePattern, PatternKind, Span};

    fn m(start: usize, end: usize) -> Match {
        Match {
            span: Span::new(start, end),
            matched: String::new(),
            pattern: PatternKind::Bracket,
            reference_number: Some(1),
        }
    }

    fn am(id: &str, start: usize, end: usize, s: &str) -> ArchiveMatch {
        ArchiveMatch {
            archive: "DANDI Archive",
            id: id.to_string(),
            pattern: ArchivePattern::Doi,
            span: Span::new(start, end),
            matched_strings: vec![s.to_string()],
        }
    }

    #[test]
    fn exact_start_dedup_keeps_first() {
        let out = dedup_by_start(vec![m(10, 16), m(10, 14), m(30, 34)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].span.end, 16);
    }

    #[test]
    fn bucket_dedup_shares_state_across_calls() {
        let mut seen = HashSet::new();
        let first = dedup_by_bucket(vec![m(120, 130), m(150, 160)], &mut seen);
        assert_eq!(first.len(), 1);
        // A later call in the same engine invocation sees the same buckets.
        let second = dedup_by_bucket(vec![m(199, 205), m(310, 320)], &mut seen);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].span.start, 310);
    }

    #[test]
    fn nearby_hits_form_one_group() {
        let mut a = m(100, 105);
        a.matched = "[50]".into();
        let mut b = m(103, 106);
        b.matched = " 50".into();
        let mut c = m(400, 404);
        c.matched = "[50]".into();
        let groups = group_nearby(vec![a, b, c], 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].span, Span::new(100, 106));
        assert_eq!(groups[0].matched_strings, vec!["[50]", " 50"]);
        assert_eq!(groups[1].matched_strings, vec!["[50]"]);
    }

    #[test]
    fn nearby_same_id_matches_merge() {
        let a = am("000130", 100, 120, "10.48324/dandi.000130");
        let b = am("000130", 170, 185, "DANDI: 000130");
        let out = merge_archive_matches(vec![a, b], 200);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].span, Span::new(100, 185));
        assert_eq!(out[0].matched_strings.len(), 2);
    }

    #[test]
    fn distant_same_id_matches_stay_separate() {
        let a = am("000130", 100, 120, "x");
        let b = am("000130", 1000, 1020, "y");
        let out = merge_archive_matches(vec![a, b], 200);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn different_ids_never_merge() {
        let a = am("000130", 100, 120, "x");
        let b = am("000131", 110, 130, "y");
        let out = merge_archive_matches(vec![a, b], 200);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn longest_match_becomes_representative() {
        let short = am("000130", 102, 110, "short");
        let long = am("000130", 100, 125, "longer form");
        let out = merge_archive_matches(vec![short, long], 200);
        assert_eq!(out.len(), 1);
        // Sorted by (id, start, -len): the longer match at 100 leads.
        assert_eq!(out[0].matched_strings[0], "longer form");
    }

    #[test]
    fn duplicate_matched_strings_collapse() {
        let a = am("000130", 100, 120, "DANDI: 000130");
        let b = am("000130", 140, 160, "DANDI: 000130");
        let out = merge_archive_matches(vec![a, b], 200);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].matched_strings, vec!["DANDI: 000130"]);
    }
}
