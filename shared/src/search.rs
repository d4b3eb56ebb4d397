//! Keyword search predicate builder
//!
//! A keyword string such as `"red shoes" size 10` is split into terms. A record
//! matches when every term is found (case-insensitive substring) in at least one
//! of the searchable fields: the OR-groups are combined with AND.
//!
//! The predicate is generic over the field type `F`. The backend instantiates it
//! with column names and renders SQL; in-memory callers instantiate it with
//! [`FieldAccessor`] functions and call [`SearchPredicate::matches`].

/// Reads one searchable text field from a record
pub type FieldAccessor<T> = for<'a> fn(&'a T) -> Option<&'a str>;

/// Split a keyword string into search terms.
///
/// Whitespace separates terms, except that text wrapped in double quotes is
/// kept as one term. Quotes are stripped, the quoted text is trimmed and runs of
/// two or more whitespace characters inside it collapse to a single space.
/// An unmatched or empty pair of quotes is treated as ordinary text.
pub fn normalize_query(query: &str) -> Vec<String> {
    let chars: Vec<char> = query.chars().collect();
    let mut terms = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '"' {
            let closing = chars[i + 1..].iter().position(|&c| c == '"').map(|p| p + i + 1);
            if let Some(close) = closing.filter(|&close| close > i + 1) {
                let quoted: String = chars[i + 1..close].iter().collect();
                push_term(&mut terms, &quoted);
                i = close + 1;
                continue;
            }
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        let bare: String = chars[start..i].iter().collect();
        push_term(&mut terms, &bare);
    }

    terms
}

fn push_term(terms: &mut Vec<String>, raw: &str) {
    let term = collapse_whitespace(raw.trim());
    if !term.is_empty() {
        terms.push(term);
    }
}

/// Replace every run of two or more whitespace characters with one space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(c);
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.chars().count() >= 2 {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

/// AND-of-ORs keyword predicate over a set of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate<F> {
    terms: Vec<String>,
    fields: Vec<F>,
}

/// Build a search predicate for `keyword` across `fields`.
///
/// Returns `None` when the keyword contains no terms, in which case the caller
/// should not filter at all.
pub fn build_search_predicate<F: Clone>(keyword: &str, fields: &[F]) -> Option<SearchPredicate<F>> {
    let terms = normalize_query(keyword);
    if terms.is_empty() {
        return None;
    }
    Some(SearchPredicate {
        terms,
        fields: fields.to_vec(),
    })
}

impl<F> SearchPredicate<F> {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Evaluate the predicate with a caller-supplied term/field test.
    ///
    /// Every term must satisfy `term_matches` for at least one field.
    pub fn evaluate(&self, mut term_matches: impl FnMut(&str, &F) -> bool) -> bool {
        self.terms
            .iter()
            .all(|term| self.fields.iter().any(|field| term_matches(term, field)))
    }

    /// Visit each OR-group in order: `(term, fields)`.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[F])> {
        self.terms.iter().map(|t| (t.as_str(), self.fields.as_slice()))
    }
}

impl<T> SearchPredicate<FieldAccessor<T>> {
    /// Test a record in memory
    pub fn matches(&self, record: &T) -> bool {
        self.evaluate(|term, accessor| {
            accessor(record).is_some_and(|value| contains_ignore_case(value, term))
        })
    }
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Escape `%`, `_` and `\` so a term can be embedded in a `LIKE` pattern
/// with `ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%` pattern for a case-insensitive substring match
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Product {
        name: String,
        description: Option<String>,
    }

    fn name(p: &Product) -> Option<&str> {
        Some(&p.name)
    }

    fn description(p: &Product) -> Option<&str> {
        p.description.as_deref()
    }

    #[test]
    fn test_quoted_phrase_is_one_term() {
        assert_eq!(
            normalize_query("\"red shoes\" size 10"),
            vec!["red shoes", "size", "10"]
        );
    }

    #[test]
    fn test_quoted_phrase_is_trimmed_and_collapsed() {
        assert_eq!(
            normalize_query("  some random  words \"with   quotes  \" and   spaces"),
            vec!["some", "random", "words", "with quotes", "and", "spaces"]
        );
    }

    #[test]
    fn test_unclosed_quote_is_plain_text() {
        assert_eq!(normalize_query("\"red shoes"), vec!["\"red", "shoes"]);
        assert_eq!(normalize_query("\"\" x"), vec!["\"\"", "x"]);
    }

    #[test]
    fn test_empty_keyword_has_no_predicate() {
        assert!(build_search_predicate("", &["name"]).is_none());
        assert!(build_search_predicate("   \t ", &["name"]).is_none());
    }

    #[test]
    fn test_every_term_must_match_some_field() {
        let product = Product {
            name: "Red Shoes".to_string(),
            description: Some("size 10 leather".to_string()),
        };
        let fields = [name as FieldAccessor<Product>, description];

        let hit = build_search_predicate("\"red shoes\" size 10", &fields).unwrap();
        assert_eq!(hit.terms().len(), 3);
        assert!(hit.matches(&product));

        let miss = build_search_predicate("red boots", &fields).unwrap();
        assert!(!miss.matches(&product));
    }

    #[test]
    fn test_missing_field_value_never_matches() {
        let product = Product {
            name: "Lamp".to_string(),
            description: None,
        };
        let only_description = [description as FieldAccessor<Product>];
        let predicate = build_search_predicate("lamp", &only_description).unwrap();
        assert!(!predicate.matches(&product));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
