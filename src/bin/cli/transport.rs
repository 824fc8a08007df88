use url::Url;

/// Build a websocket URL from a base string (like "localhost:3000" or "http://host:3000").
pub fn build_ws_url(base: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(base).or_else(|_| Url::parse(&format!("http://{}", base)))?;

    match url.scheme() {
        "http" => url.set_scheme("ws").ok(),
        "https" => url.set_scheme("wss").ok(),
        "ws" | "wss" => Some(()),
        _ => None,
    }
    .ok_or_else(|| anyhow::anyhow!("Unsupported URL scheme: {}", url.scheme()))?;

    if url.path() != "/ws" {
        url.set_path("/ws");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_becomes_ws() {
        let url = build_ws_url("localhost:3000").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:3000/ws");
    }

    #[test]
    fn https_becomes_wss() {
        let url = build_ws_url("https://example.com").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/ws");
    }

    #[test]
    fn ftp_is_rejected() {
        assert!(build_ws_url("ftp://example.com").is_err());
    }
}
