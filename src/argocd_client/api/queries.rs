use reqwest::Url;

/// Filters for `GET /applications`.
///
/// Empty values are treated as absent and never reach the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListAppsQuery<'a> {
    pub selector: Option<&'a str>,
    pub project: Option<&'a str>,
}

impl<'a> ListAppsQuery<'a> {
    pub fn new(selector: Option<&'a str>, project: Option<&'a str>) -> Self {
        Self { selector, project }
    }

    fn pairs(&self) -> impl Iterator<Item = (&'static str, &'a str)> {
        [("selector", self.selector), ("project", self.project)]
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
    }

    pub fn apply(&self, url: &mut Url) {
        let mut pairs = self.pairs().peekable();
        if pairs.peek().is_none() {
            return;
        }
        let mut serializer = url.query_pairs_mut();
        for (key, value) in pairs {
            serializer.append_pair(key, value);
        }
    }
}
