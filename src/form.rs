//! `application/x-www-form-urlencoded` encoding for bodies and query strings.

use crate::params::ParameterSet;
use url::form_urlencoded;
use url::Url;

/// The content type of a form-encoded body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encodes `params` as `key=value` pairs joined by `&`.
///
/// Spaces become `+` and everything outside the unreserved set is
/// percent-encoded, as browsers do for HTML forms.
///
/// # Examples
///
/// ```
/// let params = postie::param_set([("q", "rust & go"), ("page", "1")]);
/// assert_eq!(postie::form::encode(&params), "page=1&q=rust+%26+go");
/// ```
pub fn encode(params: &ParameterSet) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Adds `params` to the query already present on `url`.
///
/// Nothing already in the URL is dropped: a key that appears in both keeps
/// both values. The result is re-encoded canonically, sorted by key with the
/// URL's own values ahead of the added ones. An empty result removes the
/// query entirely.
///
/// # Examples
///
/// ```
/// let mut url = url::Url::parse("http://x/y?b=1&a=2").unwrap();
/// postie::form::merge_query(&mut url, &postie::param_set([("b", "3")]));
/// assert_eq!(url.as_str(), "http://x/y?a=2&b=1&b=3");
/// ```
pub fn merge_query(url: &mut Url, params: &ParameterSet) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    // Stable, so values under one key keep their order.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_set;

    #[test]
    fn test_encode_escapes_reserved_characters() {
        let params = param_set([("name", "Jane Doe"), ("path", "/a?b=c&d"), ("emoji", "\u{e9}")]);
        assert_eq!(
            encode(&params),
            "emoji=%C3%A9&name=Jane+Doe&path=%2Fa%3Fb%3Dc%26d"
        );
    }

    #[test]
    fn test_encode_empty_set() {
        assert_eq!(encode(&ParameterSet::new()), "");
    }

    #[test]
    fn test_merge_keeps_existing_and_duplicates() {
        let mut url = Url::parse("http://example.com/search?q=old&lang=en").unwrap();
        merge_query(&mut url, &param_set([("q", "new"), ("page", "2")]));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("lang".to_string(), "en".to_string()),
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "old".to_string()),
                ("q".to_string(), "new".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_reencodes_canonically() {
        let mut url = Url::parse("http://example.com/?b=x%20y&a").unwrap();
        merge_query(&mut url, &ParameterSet::new());
        assert_eq!(url.as_str(), "http://example.com/?a=&b=x+y");
    }

    #[test]
    fn test_merge_with_nothing_drops_the_query() {
        let mut url = Url::parse("http://example.com/path?").unwrap();
        merge_query(&mut url, &ParameterSet::new());
        assert_eq!(url.as_str(), "http://example.com/path");
    }

    #[test]
    fn test_merge_preserves_fragment() {
        let mut url = Url::parse("http://example.com/p#frag").unwrap();
        merge_query(&mut url, &param_set([("k", "v")]));
        assert_eq!(url.as_str(), "http://example.com/p?k=v#frag");
    }
}
