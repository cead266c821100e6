//! Engine.IO long-polling session
//!
//! Used when a WebSocket cannot be opened. Every GET returns a batch of
//! packets separated by [`RECORD_SEPARATOR`](crate::protocol::RECORD_SEPARATOR);
//! every POST carries one batch upstream.

use crate::protocol::{
    decode_payload, encode_payload, Handshake, Packet, ENGINE_IO_VERSION, RECORD_SEPARATOR,
    SOCKET_IO_PATH,
};
use crate::{Error, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, warn};

/// Build the Engine.IO endpoint for `base_url` and `transport`
pub fn endpoint(base_url: &str, transport: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::Transport(format!("invalid socket url '{}': {}", base_url, e)))?;
    url.set_path(SOCKET_IO_PATH);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", &ENGINE_IO_VERSION.to_string())
        .append_pair("transport", transport);
    Ok(url)
}

/// An open long-polling session
#[derive(Debug, Clone)]
pub struct PollingSession {
    http: reqwest::Client,
    url: Url,
    handshake: Handshake,
    request_timeout: Duration,
}

impl PollingSession {
    /// Open a session and return it with any packets that followed the open packet
    pub async fn open(
        http: &reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<(Self, Vec<Packet>)> {
        let url = endpoint(base_url, "polling")?;
        debug!("Opening polling session at {}", url);

        let body = http
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut packets = decode_payload(&body)?.into_iter();
        let handshake = match packets.next() {
            Some(Packet::Open(handshake)) => handshake,
            other => {
                return Err(Error::Protocol(format!(
                    "expected open packet, got {:?}",
                    other
                )));
            }
        };

        let mut url = url;
        url.query_pairs_mut().append_pair("sid", &handshake.sid);

        let session = Self {
            http: http.clone(),
            url,
            handshake,
            request_timeout: timeout,
        };
        Ok((session, packets.collect()))
    }

    /// Session parameters
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Wait for the next downstream batch
    pub async fn poll(&self) -> Result<Vec<Packet>> {
        let body = self
            .http
            .get(self.url.clone())
            .timeout(self.handshake.liveness_window())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(decode_batch(&body))
    }

    /// Send a batch upstream, bounded by the session's request timeout
    pub async fn post(&self, packets: &[Packet]) -> Result<()> {
        self.http
            .post(self.url.clone())
            .timeout(self.request_timeout)
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(encode_payload(packets))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Decode a downstream batch, skipping packets that fail to decode
fn decode_batch(body: &str) -> Vec<Packet> {
    body.split(RECORD_SEPARATOR)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| match Packet::decode(raw) {
            Ok(packet) => Some(packet),
            Err(e) => {
                warn!("Skipping undecodable packet {:?}: {}", raw, e);
                None
            }
        })
        .collect()
}
