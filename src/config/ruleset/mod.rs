
use std::path::PathBuf;
use tracing::debug;

/// Ruleset file names, in order of preference
pub const RULESET_CANDIDATES: [&str; 3] = ["phpcs.xml", "phpcs.xml.dist", "ruleset.xml"];

/// Number of directories inspected, starting directory included
pub const MAX_SEARCH_DEPTH: usize = 4;

/// Looks for a ruleset file in a directory and its closest ancestors
#[derive(Debug, Clone)]
pub struct RulesetLocator {
    start: PathBuf,
}

impl RulesetLocator {
    #[inline]
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    #[inline]
    pub fn locate(&self) -> Option<PathBuf> {
        for dir in self.start.ancestors().take(MAX_SEARCH_DEPTH) {
            for candidate in RULESET_CANDIDATES {
                let path = dir.join(candidate);
                if path.is_file() {
                    debug!("Found ruleset: {}", path.display());
                    return Some(path);
                }
            }
        }

        None
    }
}
