use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Client;
use tokio::sync::mpsc::Sender;
use tokio::time::{MissedTickBehavior, interval};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{COOKIE, ORIGIN, USER_AGENT};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, instrument, warn};

use super::{FeedBatch, FeedError, parse_screener_message};

const DEXES_URL: &str = "https://dd.dexscreener.com/ds-data/dexes";
const ORIGIN_VALUE: &str = "https://io.dexscreener.com";
const CLIENT_NAME: &str = "dex-screener-app";
const USER_AGENT_VALUE: &str = "DEX Screener/2.0.852004 Mozilla/5.0 (Linux; Android 11; sdk_gphone_x86 Build/RSR1.201013.001; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/125.0.6422.165 Mobile Safari/537.36";

/// Client for the DexScreener screener WebSocket.
///
/// Each connection attempt:
/// 1. fetches session cookies from the public dexes endpoint,
/// 2. opens the socket with the app's origin/user-agent headers,
/// 3. sends a `ping` text frame on a fixed cadence,
/// 4. parses every frame and forwards batches into `sender`.
///
/// Connection loss is never fatal: the loop waits `reconnect_delay` and
/// starts over.
pub struct DexScreenerWsClient {
    pub ws_url: String,
    http: Client,
    ping_every: Duration,
    reconnect_delay: Duration,
}

impl DexScreenerWsClient {
    pub fn new(ws_url: String) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_VALUE)
            .build()?;

        Ok(Self {
            ws_url,
            http,
            ping_every: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(5),
        })
    }

    /// Fetch the cookies the socket handshake expects.
    ///
    /// Only the `name=value` part of every `Set-Cookie` header is kept.
    async fn fetch_cookies(&self) -> Result<Option<String>, FeedError> {
        let resp = self
            .http
            .get(DEXES_URL)
            .header("Accept-Encoding", "gzip, deflate, br")
            .send()
            .await?;

        let cookies: Vec<String> = resp
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        if cookies.is_empty() {
            Ok(None)
        } else {
            Ok(Some(cookies.join("; ")))
        }
    }

    /// Runs a single connection until the server closes it or an error occurs.
    ///
    /// Returns `Ok(true)` when the consumer dropped its receiver and the
    /// loop should stop for good.
    async fn run_connection(&self, sender: &Sender<FeedBatch>) -> Result<bool, FeedError> {
        let cookies = self.fetch_cookies().await?;

        let mut request = self.ws_url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert("x-client-name", HeaderValue::from_static(CLIENT_NAME));
        if let Some(cookie) = cookies {
            headers.insert(COOKIE, HeaderValue::from_str(&cookie)?);
        }

        let (ws, _) = connect_async(request).await?;
        info!("dexscreener stream connected");

        let (mut write, mut read) = ws.split();

        let mut ping = interval(self.ping_every);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ping.tick().await;

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    write.send(Message::Text("ping".to_string().into())).await?;
                    debug!("keep-alive ping sent");
                }
                frame = read.next() => {
                    let Some(frame) = frame else {
                        return Ok(false);
                    };

                    let raw = match frame? {
                        Message::Text(text) => text.as_str().to_owned(),
                        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => text,
                            Err(_) => {
                                debug!(len = bytes.len(), "skipping non-utf8 binary frame");
                                continue;
                            }
                        },
                        Message::Close(reason) => {
                            info!(?reason, "dexscreener stream closed by server");
                            return Ok(false);
                        }
                        _ => continue,
                    };

                    match parse_screener_message(&raw) {
                        Ok(Some(batch)) => {
                            debug!(
                                pairs = batch.pairs.len(),
                                malformed = batch.malformed,
                                "screener batch received"
                            );
                            if sender.send(batch).await.is_err() {
                                return Ok(true);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "unparseable screener frame"),
                    }
                }
            }
        }
    }

    /// Main WebSocket loop; only returns once the consumer is gone.
    #[instrument(skip(self, sender), fields(url = %self.ws_url))]
    pub async fn run_ws_loop(&self, sender: Sender<FeedBatch>) -> anyhow::Result<()> {
        loop {
            info!("connecting to dexscreener stream");

            match self.run_connection(&sender).await {
                Ok(true) => {
                    info!("feed consumer dropped; stopping stream");
                    return Ok(());
                }
                Ok(false) => warn!("dexscreener stream ended"),
                Err(e) => error!(error = %e, "dexscreener stream failed"),
            }

            if sender.is_closed() {
                return Ok(());
            }

            info!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}
