use url::Url;

/// Returns a copy of `url` with the given query parameters appended.
///
/// Parameters with a `None` value are omitted entirely instead of being serialized as empty
/// strings. Query parameters already present on `url` are preserved.
pub(crate) fn with_query_params<'a>(
    url: &Url,
    params: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> Url {
    let mut url = url.clone();
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            if let Some(value) = value {
                pairs.append_pair(key, value);
            }
        }
    }
    // query_pairs_mut() leaves a dangling "?" behind when no pairs were appended.
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::with_query_params;

    #[test]
    fn appends_params_and_preserves_existing_query() {
        let url = Url::parse("https://example.com/webview.html?flag=1").unwrap();
        let url = with_query_params(
            &url,
            [
                ("nvtnclb-screen", Some("home")),
                ("nvtnclb-experiment", None),
            ],
        );
        assert_eq!(
            url.as_str(),
            "https://example.com/webview.html?flag=1&nvtnclb-screen=home"
        );
    }

    #[test]
    fn omits_none_values_entirely() {
        let url = Url::parse("https://example.com/webview.html").unwrap();
        let url = with_query_params(
            &url,
            [
                ("nvtnclb-clientid", None),
                ("nvtnclb-screen", Some("home")),
            ],
        );
        assert_eq!(
            url.as_str(),
            "https://example.com/webview.html?nvtnclb-screen=home"
        );
    }

    #[test]
    fn leaves_no_dangling_question_mark_when_all_values_are_none() {
        let url = Url::parse("https://example.com/webview.html").unwrap();
        let result = with_query_params(
            &url,
            [("nvtnclb-experiment", None), ("nvtnclb-treatment", None)],
        );
        assert_eq!(result.query(), None);
        assert_eq!(result, url);
    }

    #[test]
    fn percent_encodes_values() {
        let url = Url::parse("https://example.com/webview.html").unwrap();
        let url = with_query_params(&url, [("nvtnclb-screen", Some("home screen/1"))]);
        assert_eq!(url.query(), Some("nvtnclb-screen=home+screen%2F1"));
    }
}
