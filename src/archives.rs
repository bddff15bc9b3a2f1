use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ArchiveMatch, ArchivePattern, Span};

/// Recognition patterns for one dataset archive. Each pattern captures the
/// dataset identifier in group 1.
pub struct ArchiveSpec {
    pub name: &'static str,
    patterns: Vec<(Regex, ArchivePattern)>,
}

fn spec(name: &'static str, patterns: &[(&str, ArchivePattern)]) -> ArchiveSpec {
    ArchiveSpec {
        name,
        patterns: patterns
            .iter()
            .map(|(p, kind)| (Regex::new(&format!("(?i){p}")).unwrap(), *kind))
            .collect(),
    }
}

/// The archive recognition table: DOI forms, canonical URL forms, and
/// direct text mentions per archive. Loaded once; never mutated.
pub static ARCHIVES: Lazy<Vec<ArchiveSpec>> = Lazy::new(|| {
    use ArchivePattern::*;
    vec![
        spec(
            "DANDI Archive",
            &[
                // 10.48324/dandi.000130 or 10.48324/dandi.000130/0.210914.1539
                (r"10\.48324/dandi\.(\d{6})", Doi),
                (r"dandiarchive\.org/dandiset/(\d{6})", Url),
                (r"gui\.dandiarchive\.org/#/dandiset/(\d{6})", GuiUrl),
                (r"DANDI:\s*(\d{6})", TextColon),
                (r"DANDI\s+(\d{6})", TextSpace),
                (r"dandiset\s+(\d{6})", DandisetText),
                (r"dandiset/(\d{6})", DandisetPath),
                (r"DANDI(?:\s+archive)?(?:\s+identifier)?[:\s]+(\d{6})", Identifier),
            ],
        ),
        spec(
            "OpenNeuro",
            &[
                // 10.18112/openneuro.ds000001
                (r"10\.18112/openneuro\.(ds\d{6})", Doi),
                (r"openneuro\.org/datasets/(ds\d{6})", Url),
                (r"OpenNeuro:\s*(ds\d{6})", TextColon),
                (r"OpenNeuro\s+(ds\d{6})", TextSpace),
                (r"\b(ds\d{6})\b", DatasetId),
            ],
        ),
        spec(
            "Figshare",
            &[
                // 10.6084/m9.figshare.9598406 or .../9598406.v2
                (r"10\.6084/m9\.figshare\.(\d+)", Doi),
                (r"figshare\.com/articles/[^/]+/(\d+)", Url),
                (r"figshare\.com/ndownloader/files/(\d+)", DownloadUrl),
                (r"figshare:\s*(\d{6,})", TextColon),
                (r"figshare\s+(\d{6,})", TextSpace),
            ],
        ),
        spec(
            "PhysioNet",
            &[
                // 10.13026/C2KX0P or 10.13026/xxxx-xxxx
                (r"10\.13026/([A-Za-z0-9-]+)", Doi),
                // URL must be followed by a version segment to exclude
                // common non-dataset paths.
                (r"physionet\.org/content/([a-z][a-z0-9-]{2,})/\d", Url),
                (r"physionet\.org/physiobank/database/([a-z][a-z0-9-]{2,})", PhysiobankUrl),
                (r"PhysioNet\s+database\s+([a-z][a-z0-9-]{3,})", TextDatabase),
            ],
        ),
    ]
});

/// Run every archive pattern over the text and collect raw detections.
/// No target is needed and no deduplication happens here; callers merge
/// nearby same-id detections afterwards.
pub fn find_archive_matches(text: &str) -> Vec<ArchiveMatch> {
    let mut matches = Vec::new();
    for archive in ARCHIVES.iter() {
        for (re, kind) in &archive.patterns {
            for caps in re.captures_iter(text) {
                let whole = caps.get(0).unwrap();
                let id = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
                matches.push(ArchiveMatch {
                    archive: archive.name,
                    id: id.to_string(),
                    pattern: *kind,
                    span: Span::new(whole.start(), whole.end()),
                    matched_strings: vec![whole.as_str().to_string()],
                });
            }
        }
    }
    matches
}
