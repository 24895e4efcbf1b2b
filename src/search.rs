use crate::models::Article;

/// SearchQuery
///
/// The parsed form of the free-text `search` field of `/shownews`. Matching is
/// case-insensitive and any single term is enough for an article to match; articles
/// that match more often rank higher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// No query given: list everything, newest first.
    All,
    /// Lowercase word terms, deduplicated, in the order they were typed.
    Terms(Vec<String>),
}

impl SearchQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|text| !text.trim().is_empty()) else {
            return SearchQuery::All;
        };

        let mut terms: Vec<String> = Vec::new();
        for term in tokenize(raw) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        SearchQuery::Terms(terms)
    }

    /// Postgres `to_tsquery` expression OR-ing every term. `None` for `All`, or when the
    /// query held no word characters at all.
    pub fn to_tsquery(&self) -> Option<String> {
        match self {
            SearchQuery::All => None,
            SearchQuery::Terms(terms) if terms.is_empty() => None,
            SearchQuery::Terms(terms) => Some(terms.join(" | ")),
        }
    }

    /// Relevance of an article: total occurrences of the query terms across its title,
    /// content and author name. Zero means no match.
    pub fn score(&self, article: &Article) -> usize {
        let SearchQuery::Terms(terms) = self else {
            return 0;
        };

        [&article.title, &article.content, &article.authorname]
            .into_iter()
            .flat_map(|field| tokenize(field))
            .filter(|word| terms.contains(word))
            .count()
    }
}

// Word characters only, so the output is always safe to splice into a tsquery.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
