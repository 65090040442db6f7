//! Job-site credential helpers.

const SESSION_COOKIE: &str = "JSESSIONID";

/// Extract the CSRF token the job site expects from a raw `Cookie` header.
///
/// The token is the `JSESSIONID` cookie value with surrounding quotes
/// removed. Everything after the first `=` belongs to the value, since
/// session ids may carry base64 padding.
#[must_use]
pub fn csrf_from_cookie_header(cookie: &str) -> Option<String> {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.replace('"', ""))
        })
        .filter(|token| !token.is_empty())
}
