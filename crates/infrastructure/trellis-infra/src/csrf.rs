use percent_encoding::percent_decode_str;

/// Reads cookie `name` out of a `Cookie:` style header (`a=1; b=2`).
/// Values are percent-decoded; empty values count as absent.
pub fn csrf_token_from_cookies(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| {
            percent_decode_str(v.trim().trim_matches('"'))
                .decode_utf8_lossy()
                .into_owned()
        })
        .filter(|v| !v.is_empty())
}
