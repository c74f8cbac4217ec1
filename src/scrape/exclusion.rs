// Site exclusion: a substring denylist over page URLs.

/// Default denylist: pages on these sites are video or social feeds with
/// little prose for the NER model to work with.
pub const DEFAULT_EXCLUDED_SITES: [&str; 2] = ["facebook", "youtube"];

/// Decides whether a URL is skipped before it is ever fetched.
#[derive(Debug, Clone)]
pub struct SiteFilter {
    excluded: Vec<String>,
}

impl SiteFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// True iff some configured substring occurs in `url`.
    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded.iter().any(|site| url.contains(site.as_str()))
    }

    pub fn sites(&self) -> &[String] {
        &self.excluded
    }
}

impl Default for SiteFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_SITES)
    }
}
