//! Strategy trait, identifiers and the request/outcome types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::EditablePage;
use crate::domain::Rgb;
use crate::error::PatchResult;

/// Identifies a replacement method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyId {
    Clean,
    Minimal,
    Direct,
    Overlay,
    Precise,
    Standard,
    /// The unconditional watermark fallback.
    Simple,
}

impl StrategyId {
    /// Every method, in default fallback order.
    pub const ALL: [StrategyId; 7] = [
        StrategyId::Clean,
        StrategyId::Minimal,
        StrategyId::Direct,
        StrategyId::Overlay,
        StrategyId::Precise,
        StrategyId::Standard,
        StrategyId::Simple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Clean => "clean",
            StrategyId::Minimal => "minimal",
            StrategyId::Direct => "direct",
            StrategyId::Overlay => "overlay",
            StrategyId::Precise => "precise",
            StrategyId::Standard => "standard",
            StrategyId::Simple => "simple",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = StrategyId::ALL.iter().map(StrategyId::as_str).collect();
                format!("unknown method '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Ordered list of methods to attempt for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOrder(Vec<StrategyId>);

impl FallbackOrder {
    pub fn new(ids: impl IntoIterator<Item = StrategyId>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Starts the default chain at `first` and continues through the rest
    /// of it, `simple` included.
    pub fn starting_at(first: StrategyId) -> Self {
        Self::new(StrategyId::ALL.into_iter().skip_while(|id| *id != first))
    }

    /// Only `id`; nothing is tried after it.
    pub fn only(id: StrategyId) -> Self {
        Self(vec![id])
    }

    pub fn ids(&self) -> &[StrategyId] {
        &self.0
    }
}

impl Default for FallbackOrder {
    fn default() -> Self {
        Self::new(StrategyId::ALL)
    }
}

/// What to replace, and the colour used for replaced text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReplacement {
    pub old_text: String,
    pub new_text: String,
    pub accent: Rgb,
}

/// One file to patch.
#[derive(Debug, Clone)]
pub struct ReplacementRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub replacement: TextReplacement,
}

/// What a successful strategy did to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyReport {
    /// Regions blanked.
    pub regions_erased: usize,
    /// Text runs drawn.
    pub runs_inserted: usize,
}

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: StrategyId,
    /// `None` when the attempt succeeded.
    pub error: Option<String>,
    pub not_found: bool,
}

/// Result of running the pipeline for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementOutcome {
    pub succeeded: bool,
    pub strategy_used: Option<StrategyId>,
    /// Why the file failed, or a note about how it succeeded.
    pub reason: Option<String>,
    pub attempts: Vec<StrategyAttempt>,
}

impl ReplacementOutcome {
    /// True when output was written by the watermark fallback, which does
    /// not imply the old text was found.
    pub fn is_watermark_only(&self) -> bool {
        self.strategy_used == Some(StrategyId::Simple)
    }
}

/// A way of replacing text on one page.
///
/// Implementations return [`crate::PatchError::TextNotFound`] when the old
/// text is absent; any error makes the pipeline move to the next method.
pub trait ReplacementStrategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn apply(
        &self,
        page: &mut dyn EditablePage,
        replacement: &TextReplacement,
    ) -> PatchResult<StrategyReport>;
}
