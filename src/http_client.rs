use crate::{
    error::{ClientError, Result},
    types::ProgressFn,
};
use futures_util::{Stream, StreamExt as _, stream};
use reqwest::{Client, Response, StatusCode};

/// Create the HTTP client used for all requests to the gateway
///
/// No request timeout is set: a request stays outstanding until the device
/// answers or the connection fails.
pub fn device_http_client() -> anyhow::Result<Client> {
    use anyhow::Context;

    // the gateway is always reached directly on the local network
    Client::builder()
        .no_proxy()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to create gateway HTTP client")
}

/// Handle HTTP response by checking status and extracting body
///
/// The device reports success with 200 only, so other 2xx codes count as failures.
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "GET /api/get-device-info")
///
/// # Returns
/// * `Ok(String)` - The response body if the status is 200
/// * `Err(ClientError::Protocol)` - For any other status
/// * `Err(ClientError::Transport)` - If reading the body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| ClientError::Transport(format!("{context_msg}: failed to read body: {e}")))?;

    if status != StatusCode::OK {
        log::debug!("{context_msg} failed with status {status} and body: {body}");
        return Err(ClientError::Protocol {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Split `content` into chunks of `chunk_size` bytes, reporting the running
/// byte count to `progress` as each chunk is handed to the transport
pub fn progress_stream(
    content: Vec<u8>,
    chunk_size: usize,
    progress: ProgressFn,
) -> impl Stream<Item = std::result::Result<Vec<u8>, std::io::Error>> + Send + 'static {
    let total = content.len() as u64;
    let chunks: Vec<Vec<u8>> = content
        .chunks(chunk_size.max(1))
        .map(<[u8]>::to_vec)
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(sent, Some(total));
        Ok(chunk)
    })
}
