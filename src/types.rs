use serde::Serialize;

/// A half-open byte range into the source text. Offsets always land on
/// `char` boundaries, and `start <= end <= text.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the spans overlap or lie within `gap` bytes of each other.
    pub fn near(&self, other: &Span, gap: usize) -> bool {
        !(self.end + gap < other.start || self.start > other.end + gap)
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Which sub-pattern of the matcher produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Bracket,
    Paren,
    Superscript,
    SuperscriptGroup,
    SuperscriptSpaced,
    PostParen,
    NumberRange,
    AuthorYear,
    TitleMention,
}

/// A single in-text detection, before context extraction.
#[derive(Debug, Clone)]
pub struct Match {
    pub span: Span,
    pub matched: String,
    pub pattern: PatternKind,
    pub reference_number: Option<u32>,
}

/// Description of the work we are looking for. At least one identifying
/// field must be present; otherwise the engine returns no matches.
#[derive(Debug, Clone, Default)]
pub struct PaperTarget {
    pub doi: Option<String>,
    /// Surnames in citation order; the first is the anchor for matching.
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub title: Option<String>,
}

impl PaperTarget {
    pub fn is_empty(&self) -> bool {
        self.doi.is_none()
            && self.authors.is_empty()
            && self.year.is_none()
            && self.title.is_none()
    }
}

/// How a reference-list number was recovered for a DOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ExplicitNumber,
    PositionalCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceResolution {
    pub number: u32,
    pub method: ResolutionMethod,
}

/// Pattern type within a per-archive table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivePattern {
    Doi,
    Url,
    GuiUrl,
    TextColon,
    TextSpace,
    DandisetText,
    DandisetPath,
    Identifier,
    DatasetId,
    DownloadUrl,
    PhysiobankUrl,
    TextDatabase,
}

/// A dataset-archive identifier found in text.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveMatch {
    pub archive: &'static str,
    pub id: String,
    pub pattern: ArchivePattern,
    #[serde(flatten)]
    pub span: Span,
    /// All distinct matched substrings folded into this detection.
    pub matched_strings: Vec<String>,
}

/// Detection method tag carried on every excerpt handed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    NumberedCitation,
    AuthorYear,
    TitleMention,
    BodyCitation,
    #[serde(untagged)]
    Archive(ArchivePattern),
}

/// A merged archive-ID detection together with its context excerpts. When
/// the mention sits inside the bibliography, the entry text and recovered
/// reference number are carried so body citations can be traced back.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveMention {
    pub archive: &'static str,
    pub id: String,
    pub pattern: ArchivePattern,
    pub start: usize,
    pub end: usize,
    pub in_bibliography: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bib_entry: Option<String>,
    pub matched_strings: Vec<String>,
    pub excerpts: Vec<ContextExcerpt>,
}

/// A bounded excerpt of text surrounding a detection.
/// Invariant: `start <= anchor <= end`.
#[derive(Debug, Clone, Serialize)]
pub struct ContextExcerpt {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Offset of the triggering match inside the source text.
    pub anchor: usize,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
}
