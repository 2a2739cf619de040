//! Helpers shared by the reqwest adapters.

use std::time::Duration;

use reqwest::Client;

const PREVIEW_CHAR_LIMIT: usize = 160;

/// Build a client, applying `timeout` only when one is configured.
pub(super) fn build_client(
    timeout: Option<Duration>,
    user_agent: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    builder.build()
}

/// Whitespace-compacted, truncated rendering of a response body for logs
/// and error messages.
pub(super) fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
