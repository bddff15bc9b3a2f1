use std::collections::HashSet;

use tracing::debug;

use crate::archives::find_archive_matches;
use crate::authoryear::{find_author_year_citations, find_title_mentions};
use crate::bibentry::{bibliography_entry, body_citations, entry_reference_number};
use crate::boundary::{floor_char_boundary, header_keyword_start, in_bibliography, in_reference_list};
use crate::context::{extract_chars, extract_words};
use crate::dedup::{dedup_by_bucket, dedup_by_start, group_nearby, merge_archive_matches};
use crate::numbered::find_numbered_citations;
use crate::resolve::resolve_reference_number;
use crate::types::{ArchiveMention, ContextExcerpt, Match, Method, PaperTarget};

const BIB_ENTRY_WINDOW: usize = 500;
const BODY_GROUP_GAP: usize = 10;

/// Caller-supplied knobs. Nothing here changes which patterns exist, only
/// window sizes and bibliography handling.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Character budget each side of a citation for sentence-snapped excerpts.
    pub context_chars: usize,
    /// Word budget each side for archive-mention and body-citation excerpts.
    pub context_words: usize,
    /// Accepted distance from the target's publication year.
    pub year_tolerance: u32,
    /// Same-identifier archive detections this close merge into one.
    pub proximity_threshold: usize,
    /// Drop matches classified as inside the reference list.
    pub exclude_bibliography: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            context_chars: 500,
            context_words: 100,
            year_tolerance: 1,
            proximity_threshold: 200,
            exclude_bibliography: true,
        }
    }
}

/// Locate in-text citations of `target` and return a sentence-snapped
/// excerpt per citation, ordered by position.
///
/// Numbered matching runs only when the target DOI resolves to a
/// reference-list number; on resolution failure the author-year and title
/// strategies still run, so a partial target degrades instead of erroring.
pub fn find_citation_contexts(
    text: &str,
    target: &PaperTarget,
    cfg: &EngineConfig,
) -> Vec<ContextExcerpt> {
    if text.is_empty() || target.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();

    if let Some(doi) = &target.doi {
        if let Some(resolution) = resolve_reference_number(text, doi) {
            let matches = find_numbered_citations(text, resolution.number);
            debug!(
                number = resolution.number,
                count = matches.len(),
                "numbered citation candidates"
            );
            let kept = matches
                .into_iter()
                .filter(|m| !cfg.exclude_bibliography || !in_reference_list(text, m.span.start))
                .collect();
            for m in dedup_by_start(kept) {
                out.push(excerpt_for(text, &m, Method::NumberedCitation, cfg));
            }
        }
    }

    // Author-year and title hits share one bucket set: both families often
    // fire on the same citation and must collapse to a single excerpt.
    let mut buckets = HashSet::new();

    if let (false, Some(year)) = (target.authors.is_empty(), target.year) {
        let matches = find_author_year_citations(text, &target.authors, year, cfg.year_tolerance);
        debug!(count = matches.len(), "author-year candidates");
        for m in dedup_by_bucket(matches, &mut buckets) {
            if cfg.exclude_bibliography && in_reference_list(text, m.span.start) {
                continue;
            }
            out.push(excerpt_for(text, &m, Method::AuthorYear, cfg));
        }
    }

    if let Some(title) = &target.title {
        let matches = find_title_mentions(text, title);
        debug!(count = matches.len(), "title mention candidates");
        for m in dedup_by_bucket(matches, &mut buckets) {
            if cfg.exclude_bibliography && in_reference_list(text, m.span.start) {
                continue;
            }
            out.push(excerpt_for(text, &m, Method::TitleMention, cfg));
        }
    }

    out.sort_by_key(|e| e.anchor);
    out
}

fn excerpt_for(text: &str, m: &Match, method: Method, cfg: &EngineConfig) -> ContextExcerpt {
    let (excerpt, span) = extract_chars(text, m.span.start, cfg.context_chars);
    ContextExcerpt {
        text: excerpt,
        start: span.start,
        end: span.end,
        anchor: m.span.start,
        method,
        reference_number: m.reference_number,
        matched: vec![m.matched.clone()],
    }
}

/// Locate dataset-archive identifiers and return one mention per merged
/// detection, each with a word-budget excerpt. A mention sitting in the
/// bibliography additionally gets its entry text, recovered reference
/// number, and an excerpt per body-citation group of that number.
pub fn find_archive_contexts(text: &str, cfg: &EngineConfig) -> Vec<ArchiveMention> {
    if text.is_empty() {
        return Vec::new();
    }

    let raw = find_archive_matches(text);
    debug!(count = raw.len(), "raw archive detections");
    let merged = merge_archive_matches(raw, cfg.proximity_threshold);

    let bib_start = floor_char_boundary(text, header_keyword_start(text));

    let mut mentions = Vec::new();
    for m in merged {
        let (excerpt, span) = extract_words(text, m.span, cfg.context_words);
        let mut excerpts = vec![ContextExcerpt {
            text: excerpt,
            start: span.start,
            end: span.end,
            anchor: m.span.start,
            method: Method::Archive(m.pattern),
            reference_number: None,
            matched: m.matched_strings.clone(),
        }];

        let in_bib = in_bibliography(text, m.span.start);
        let mut bib_entry = None;
        let mut reference_number = None;
        if in_bib {
            let entry = bibliography_entry(text, m.span.start, BIB_ENTRY_WINDOW);
            reference_number =
                entry_reference_number(&entry, m.matched_strings.first().map(String::as_str));
            debug!(id = %m.id, ?reference_number, "bibliography mention");
            if let Some(n) = reference_number {
                let citations = body_citations(&text[..bib_start], n);
                for group in group_nearby(citations, BODY_GROUP_GAP) {
                    let (excerpt, span) = extract_words(text, group.span, cfg.context_words);
                    excerpts.push(ContextExcerpt {
                        text: excerpt,
                        start: span.start,
                        end: span.end,
                        anchor: group.span.start,
                        method: Method::BodyCitation,
                        reference_number: Some(n),
                        matched: group.matched_strings,
                    });
                }
            }
            bib_entry = Some(entry);
        }

        mentions.push(ArchiveMention {
            archive: m.archive,
            id: m.id,
            pattern: m.pattern,
            start: m.span.start,
            end: m.span.end,
            in_bibliography: in_bib,
            reference_number,
            bib_entry,
            matched_strings: m.matched_strings,
            excerpts,
        });
    }
    mentions
}
