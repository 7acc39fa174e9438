use lambda_http::http::HeaderMap;
use tarefas_atoms::users::{SessionState, Viewer};

/// Set by the identity provider in front of the API.
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Identity forwarded with the request. No user id means anonymous; a
/// missing display name falls back to the id.
pub fn viewer_from_headers(headers: &HeaderMap) -> Option<Viewer> {
    let id = header(headers, USER_ID_HEADER)?;
    let name = header(headers, USER_NAME_HEADER).unwrap_or(id);
    Some(Viewer::new(id, name))
}

pub fn session_from_headers(headers: &HeaderMap) -> SessionState {
    viewer_from_headers(headers).into()
}
