//! Glob filtering for document identities.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled skip rules matched against document identities.
///
/// Invalid patterns are logged and dropped rather than failing the whole
/// configuration; a typo in one pattern must not turn diagnosis off.
#[derive(Debug, Clone)]
pub struct SkipList {
    set: GlobSet,
}

impl SkipList {
    pub fn build<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(error) => {
                    tracing::warn!(pattern, %error, "ignoring invalid skip pattern");
                }
            }
        }
        let set = match builder.build() {
            Ok(set) => set,
            Err(error) => {
                tracing::warn!(%error, "failed to compile skip patterns, none applied");
                GlobSet::empty()
            }
        };
        Self { set }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::build(crate::config::DEFAULT_SKIP)
    }
}
