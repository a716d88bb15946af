//! URL construction for probe targets.

/// Render `host:port`, omitting the port for 80 and 443.
#[inline]
#[must_use]
pub fn convert_host_port(host: &str, port: u16) -> String {
    match port {
        80 | 443 => host.to_string(),
        _ => format!("{}:{}", host, port),
    }
}

/// Build the probe URL. Port 443 selects `https`, anything else `http`.
/// A non-empty `uri` is appended as `/<uri>`.
#[must_use]
pub fn get_url(host: &str, port: u16, uri: Option<&str>) -> String {
    let protocol = if port == 443 { "https" } else { "http" };
    let mut url = format!("{}://{}", protocol, convert_host_port(host, port));
    if let Some(uri) = uri.filter(|u| !u.is_empty()) {
        url.push('/');
        url.push_str(uri);
    }
    url
}
