//! DOS-style wildcard patterns for the filter endpoint
//!
//! A pattern is classified once, up front, by where its `*`s sit:
//! `*word*` is a substring match, `word*` a prefix match, `*word` a suffix
//! match and a bare `word` an exact match. Matching is case-insensitive and
//! applies to file names only.

/// A classified wildcard pattern, lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `*word*`
    Contains(String),
    /// `word*`
    Prefix(String),
    /// `*word`
    Suffix(String),
    /// `word`
    Exact(String),
}

impl Pattern {
    /// Classify a raw pattern
    ///
    /// Leading and trailing runs of `*` decide the kind. A pattern made only
    /// of `*`s is `Contains("")` and matches every name.
    pub fn classify(raw: &str) -> Self {
        let pattern = raw.to_lowercase();
        let leading = pattern.starts_with('*');
        let trailing = pattern.ends_with('*');
        let core = pattern.trim_matches('*').to_string();

        match (leading, trailing) {
            (true, true) => Self::Contains(core),
            (true, false) => Self::Suffix(core),
            (false, true) => Self::Prefix(core),
            (false, false) => Self::Exact(pattern),
        }
    }

    /// Whether `name` matches
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self {
            Self::Contains(core) => name.contains(core.as_str()),
            Self::Prefix(core) => name.starts_with(core.as_str()),
            Self::Suffix(core) => name.ends_with(core.as_str()),
            Self::Exact(pattern) => name == *pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*movie*", Pattern::Contains("movie".into()))]
    #[case("Movie*", Pattern::Prefix("movie".into()))]
    #[case("*.MKV", Pattern::Suffix(".mkv".into()))]
    #[case("movie.mkv", Pattern::Exact("movie.mkv".into()))]
    #[case("*", Pattern::Contains(String::new()))]
    #[case("**", Pattern::Contains(String::new()))]
    fn test_classify(#[case] raw: &str, #[case] expected: Pattern) {
        assert_eq!(Pattern::classify(raw), expected);
    }

    #[rstest]
    #[case("Movie.2024.1080p.mkv", "*movie*", true)]
    #[case("Movie.2024.1080p.mkv", "*MOVIE*", true)]
    #[case("Movie.2024.1080p.mkv", "*1080*", true)]
    #[case("Movie.2024.1080p.mkv", "*notfound*", false)]
    #[case("Movie.2024.1080p.mkv", "movie*", true)]
    #[case("Movie.2024.1080p.mkv", "MOVIE*", true)]
    #[case("Movie.2024.1080p.mkv", "2024*", false)]
    #[case("Movie.2024.1080p.mkv", "*.mkv", true)]
    #[case("Movie.2024.1080p.mkv", "*.MKV", true)]
    #[case("Movie.2024.1080p.mkv", "*.avi", false)]
    #[case("Movie.mkv", "movie.mkv", true)]
    #[case("Movie.mkv", "MOVIE.MKV", true)]
    #[case("Movie.mkv", "other.mkv", false)]
    #[case("anything.at.all", "*", true)]
    fn test_matches(#[case] name: &str, #[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(Pattern::classify(pattern).matches(name), expected);
    }
}
