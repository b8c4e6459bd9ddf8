//! Resolving a remote DevTools endpoint to its WebSocket URL.

use {serde::Deserialize, tracing::debug};

use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Turn a configured endpoint into a CDP WebSocket URL.
///
/// `ws://`/`wss://` URLs are used as-is. `http://`/`https://` endpoints are
/// resolved through `/json/version`.
pub async fn resolve_ws_endpoint(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<String, FetchError> {
    let connect_failed = |message: String| FetchError::ConnectFailed {
        endpoint: endpoint.to_string(),
        message,
    };

    let parsed = url::Url::parse(endpoint).map_err(|e| connect_failed(e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => return Ok(endpoint.to_string()),
        "http" | "https" => {},
        other => return Err(connect_failed(format!("unsupported scheme '{other}'"))),
    }

    let version_url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    debug!(url = %version_url, "resolving DevTools endpoint");

    let response = client
        .get(&version_url)
        .send()
        .await
        .map_err(|e| connect_failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(connect_failed(format!("{version_url} returned {status}")));
    }
    let info: VersionInfo = response
        .json()
        .await
        .map_err(|e| connect_failed(format!("unexpected /json/version body: {e}")))?;
    Ok(info.web_socket_debugger_url)
}
