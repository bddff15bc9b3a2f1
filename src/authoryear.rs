use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::{Match, PatternKind, Span};

/// Strip diacritics from a surname: Unicode decomposition with combining
/// marks dropped, so "Muñoz" also matches text spelling it "Munoz".
pub(crate) fn normalize_surname(name: &str) -> String {
    name.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Distinct escaped spellings of a surname (raw plus normalized).
fn surname_variants(name: &str) -> Vec<String> {
    let mut variants = vec![regex::escape(name)];
    let normalized = normalize_surname(name);
    if normalized != name {
        variants.push(regex::escape(&normalized));
    }
    variants
}

/// Find author-year citations of a work: "(Smith et al., 2020)",
/// "Smith and Jones (2020)", "(Smith, 2020)", and the year-independent
/// numbered-with-name forms "Smith (42)" / "Smith et al. (42)".
///
/// `tolerance` widens the year both ways (preprints are often cited with
/// an adjacent year). No deduplication happens at this level.
pub fn find_author_year_citations(
    text: &str,
    authors: &[String],
    year: i32,
    tolerance: u32,
) -> Vec<Match> {
    if authors.is_empty() {
        return Vec::new();
    }

    let mut years = vec![year.to_string()];
    for delta in 1..=tolerance as i32 {
        years.push((year - delta).to_string());
        years.push((year + delta).to_string());
    }

    let firsts = surname_variants(&authors[0]);
    let seconds: Vec<String> = if authors.len() == 2 {
        surname_variants(&authors[1])
    } else {
        Vec::new()
    };

    let mut patterns = Vec::new();
    for first in &firsts {
        for y in &years {
            if authors.len() == 1 {
                // (Smith, 2020) / Smith (2020) / Smith, 2020
                patterns.push(format!(r"\({first}\s*,?\s*{y}[a-z]?\)"));
                patterns.push(format!(r"{first}\s*\({y}[a-z]?\)"));
                patterns.push(format!(r"{first}\s*,\s*{y}[a-z]?"));
            } else if authors.len() == 2 {
                // Smith and Jones, 2020 in all three shapes
                for second in &seconds {
                    patterns.push(format!(
                        r"\({first}\s+(?:and|&)\s+{second}\s*,?\s*{y}[a-z]?\)"
                    ));
                    patterns.push(format!(
                        r"{first}\s+(?:and|&)\s+{second}\s*\({y}[a-z]?\)"
                    ));
                    patterns.push(format!(
                        r"{first}\s+(?:and|&)\s+{second}\s*,\s*{y}[a-z]?"
                    ));
                }
            }
            // "et al." shapes. Applied for any author count: citing text
            // frequently writes "Doe et al." even when the metadata lists a
            // single surname, and a truncated author list must not cost
            // recall.
            patterns.push(format!(r"\({first}\s+et\s+al\.?\s*,?\s*{y}[a-z]?\)"));
            patterns.push(format!(r"{first}\s+et\s+al\.?\s*\({y}[a-z]?\)"));
            patterns.push(format!(r"{first}\s+et\s+al\.?\s*,\s*{y}[a-z]?"));
            // No-comma style: "Li et al. 2015" (common in Annual Reviews)
            patterns.push(format!(r"{first}\s+et\s+al\.?\s+{y}[a-z]?"));
        }

        // Numbered references with the author named: "Smith (42)"
        if authors.len() == 1 {
            patterns.push(format!(r"{first}\s*\(\d+\)"));
        } else if authors.len() == 2 {
            for second in &seconds {
                patterns.push(format!(r"{first}\s+(?:and|&)\s+{second}\s*\(\d+\)"));
            }
        }
        patterns.push(format!(r"{first}\s+et\s+al\.?\s*\(\d+\)"));
    }

    let mut matches = Vec::new();
    for pattern in &patterns {
        let re = Regex::new(&format!("(?i){pattern}")).unwrap();
        for m in re.find_iter(text) {
            matches.push(Match {
                span: Span::new(m.start(), m.end()),
                matched: m.as_str().to_string(),
                pattern: PatternKind::AuthorYear,
                reference_number: None,
            });
        }
    }
    matches
}

const TITLE_STOP_WORDS: [&str; 11] = [
    "the", "a", "an", "of", "in", "on", "for", "and", "or", "to", "with",
];

/// Find verbatim mentions of a paper title. Short titles are skipped
/// entirely; otherwise the first few content words are searched as a
/// phrase, case-insensitively.
pub fn find_title_mentions(text: &str, title: &str) -> Vec<Match> {
    if title.chars().count() < 20 {
        return Vec::new();
    }
    let content_words: Vec<&str> = title
        .split_whitespace()
        .filter(|w| !TITLE_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if content_words.len() < 3 {
        return Vec::new();
    }
    let phrase = content_words[..content_words.len().min(5)].join(" ");
    let re = Regex::new(&format!("(?i){}", regex::escape(&phrase))).unwrap();
    re.find_iter(text)
        .map(|m| Match {
            span: Span::new(m.start(), m.end()),
            matched: m.as_str().to_string(),
            pattern: PatternKind::TitleMention,
            reference_number: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn hit_count(text: &str, names: &[&str], year: i32, tol: u32) -> usize {
        let raw = find_author_year_citations(text, &authors(names), year, tol);
        // Collapse overlapping pattern variants the way the orchestrator
        // does, by 100-char bucket.
        let mut buckets: Vec<usize> = raw.iter().map(|m| m.span.start / 100).collect();
        buckets.sort_unstable();
        buckets.dedup();
        buckets.len()
    }

    #[test]
    fn year_tolerance_is_symmetric() {
        for (cited, expect) in [
            ("(Smith, 2019)", 1),
            ("(Smith, 2020)", 1),
            ("(Smith, 2021)", 1),
            ("(Smith, 2022)", 0),
            ("(Smith, 2018)", 0),
        ] {
            let text = format!("as shown {cited} previously");
            assert_eq!(hit_count(&text, &["Smith"], 2020, 1), expect, "{cited}");
        }
    }

    #[test]
    fn single_author_shapes() {
        assert_eq!(hit_count("see Smith (2020) here", &["Smith"], 2020, 0), 1);
        assert_eq!(hit_count("see Smith, 2020 here", &["Smith"], 2020, 0), 1);
        assert_eq!(hit_count("see (Smith 2020) here", &["Smith"], 2020, 0), 1);
    }

    #[test]
    fn two_author_shapes() {
        let names = ["Smith", "Jones"];
        assert_eq!(
            hit_count("found by Smith and Jones (2020)", &names, 2020, 0),
            1
        );
        assert_eq!(hit_count("found (Smith & Jones, 2020)", &names, 2020, 0), 1);
        // Single-author shapes do not apply with two surnames.
        assert_eq!(hit_count("found (Smith, 2020)", &names, 2020, 0), 0);
    }

    #[test]
    fn et_al_shapes_including_no_comma() {
        let names = ["Li", "Wang", "Chen"];
        for text in [
            "(Li et al., 2015)",
            "Li et al. (2015)",
            "Li et al., 2015",
            "Li et al. 2015",
        ] {
            assert!(hit_count(text, &names, 2015, 0) >= 1, "{text}");
        }
    }

    #[test]
    fn et_al_applies_with_single_listed_surname() {
        // Truncated metadata must still catch "et al." citations.
        let text = "Prior work (Doe et al., 2019) established X.";
        assert_eq!(hit_count(text, &["Doe"], 2019, 1), 1);
    }

    #[test]
    fn diacritics_fold_to_ascii() {
        let text = "consistent with (Munoz et al., 2018)";
        assert_eq!(hit_count(text, &["Muñoz"], 2018, 0), 1);
    }

    #[test]
    fn lettered_year_suffix() {
        assert_eq!(hit_count("see (Smith, 2020a) here", &["Smith"], 2020, 0), 1);
    }

    #[test]
    fn numbered_with_name() {
        assert_eq!(hit_count("shown by Smith (42) earlier", &["Smith"], 2020, 0), 1);
        assert!(hit_count("Doe et al. (7) report", &["Doe", "Roe"], 2019, 0) >= 1);
    }

    #[test]
    fn title_phrase_search() {
        let title = "A map of the whole-brain connectome in the larval zebrafish";
        // Stop words stripped: map, whole-brain, connectome, larval, zebrafish
        let text = "We reuse the map whole-brain connectome larval zebrafish dataset.";
        let hits = find_title_mentions(text, title);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pattern, PatternKind::TitleMention);
    }

    #[test]
    fn short_or_thin_titles_skipped() {
        assert!(find_title_mentions("anything", "Short title").is_empty());
        assert!(find_title_mentions("anything", "of the and or to with in on a").is_empty());
    }
}
