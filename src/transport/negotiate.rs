//! Hub handshake.
//!
//! Opening the socket takes two steps:
//!
//! 1. `GET <negotiate>?connectionData=<hubs>&clientProtocol=1.5` returns a
//!    connection token (and usually a session cookie).
//! 2. The socket is opened at `<connect>` with the token and the same
//!    `connectionData`, over `ws` or `wss` to match the base URL.

// ============================================================================
// Imports
// ============================================================================

use reqwest::header::SET_COOKIE;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{DEFAULT_HUB, NegotiateResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default negotiation path.
pub const DEFAULT_NEGOTIATE_PATH: &str = "/signalr/negotiate";

/// Default socket path.
pub const DEFAULT_CONNECT_PATH: &str = "/signalr/connect";

/// Hub client protocol version.
pub const DEFAULT_CLIENT_PROTOCOL: &str = "1.5";

// ============================================================================
// Negotiated
// ============================================================================

/// Result of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Connection token.
    pub token: String,
    /// Session cookie to replay on the socket request.
    pub cookie: Option<String>,
}

// ============================================================================
// HubEndpoint
// ============================================================================

/// Location of a streaming hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubEndpoint {
    base_url: Url,
    hub: String,
    negotiate_path: String,
    connect_path: String,
    client_protocol: String,
}

impl HubEndpoint {
    /// Creates an endpoint with default paths and protocol.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not an absolute
    /// `http`, `https`, `ws` or `wss` URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid live base URL '{base_url}': {e}")))?;
        socket_scheme(&base_url)?;

        Ok(Self {
            base_url,
            hub: DEFAULT_HUB.to_string(),
            negotiate_path: DEFAULT_NEGOTIATE_PATH.to_string(),
            connect_path: DEFAULT_CONNECT_PATH.to_string(),
            client_protocol: DEFAULT_CLIENT_PROTOCOL.to_string(),
        })
    }

    /// Sets the hub name.
    #[must_use]
    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = hub.into();
        self
    }

    /// Sets the negotiation and socket paths.
    #[must_use]
    pub fn with_paths(mut self, negotiate: impl Into<String>, connect: impl Into<String>) -> Self {
        self.negotiate_path = negotiate.into();
        self.connect_path = connect.into();
        self
    }

    /// Sets the client protocol version.
    #[must_use]
    pub fn with_client_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.client_protocol = protocol.into();
        self
    }

    /// Returns the hub name.
    #[inline]
    #[must_use]
    pub fn hub(&self) -> &str {
        &self.hub
    }

    /// Returns the base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL-encoded `[{"name":"<hub>"}]`.
    #[must_use]
    pub fn connection_data(&self) -> String {
        let hubs = serde_json::json!([{ "name": self.hub }]).to_string();
        urlencoding::encode(&hubs).into_owned()
    }

    /// Builds the negotiation URL.
    #[must_use]
    pub fn negotiate_url(&self) -> String {
        let mut url = self.base_url.clone();
        url.set_path(&self.joined_path(&self.negotiate_path));
        url.set_query(Some(&format!(
            "connectionData={}&clientProtocol={}",
            self.connection_data(),
            self.client_protocol
        )));
        url.to_string()
    }

    /// Builds the socket URL for a negotiated token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL scheme has no socket
    /// counterpart.
    pub fn socket_url(&self, token: &str) -> Result<String> {
        let mut url = self.base_url.clone();
        url.set_scheme(socket_scheme(&self.base_url)?)
            .map_err(|()| Error::config("Cannot switch base URL to a socket scheme"))?;
        url.set_path(&self.joined_path(&self.connect_path));
        url.set_query(Some(&format!(
            "clientProtocol={}&transport=webSockets&connectionToken={}&connectionData={}",
            self.client_protocol,
            urlencoding::encode(token),
            self.connection_data()
        )));
        Ok(url.to_string())
    }

    /// Performs the HTTP negotiation.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the request fails
    /// - [`Error::Negotiation`] if the response carries no token, which is
    ///   what the server answers when no session is live
    pub async fn negotiate(&self, http: &reqwest::Client) -> Result<Negotiated> {
        let response = http
            .get(self.negotiate_url())
            .send()
            .await?
            .error_for_status()?;

        let cookie = cookie_header(response.headers().get_all(SET_COOKIE));
        let body: NegotiateResponse = response.json().await?;
        let token = body.into_token()?;

        debug!(hub = %self.hub, "Negotiation complete");
        Ok(Negotiated { token, cookie })
    }

    fn joined_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Maps a base URL scheme to its socket scheme.
fn socket_scheme(url: &Url) -> Result<&'static str> {
    match url.scheme() {
        "http" | "ws" => Ok("ws"),
        "https" | "wss" => Ok("wss"),
        other => Err(Error::config(format!("Unsupported live URL scheme '{other}'"))),
    }
}

/// Folds `Set-Cookie` headers into one `Cookie` header value.
fn cookie_header<'a>(values: impl IntoIterator<Item = &'a reqwest::header::HeaderValue>) -> Option<String> {
    let pairs: Vec<&str> = values
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::header::HeaderValue;

    use crate::testing::{Route, http_server};

    const HUBS: &str = "%5B%7B%22name%22%3A%22Streaming%22%7D%5D";

    #[test]
    fn test_connection_data_encoding() {
        let endpoint = HubEndpoint::new("https://live.test").unwrap();
        assert_eq!(endpoint.connection_data(), HUBS);
    }

    #[test]
    fn test_negotiate_url() {
        let endpoint = HubEndpoint::new("https://live.test").unwrap();
        assert_eq!(
            endpoint.negotiate_url(),
            format!("https://live.test/signalr/negotiate?connectionData={HUBS}&clientProtocol=1.5")
        );
    }

    #[test]
    fn test_socket_url_scheme_follows_base() {
        let secure = HubEndpoint::new("https://live.test").unwrap();
        let url = secure.socket_url("a+b/c=").unwrap();
        assert_eq!(
            url,
            format!(
                "wss://live.test/signalr/connect?clientProtocol=1.5&transport=webSockets&connectionToken=a%2Bb%2Fc%3D&connectionData={HUBS}"
            )
        );

        let plain = HubEndpoint::new("http://127.0.0.1:8080/proxy/").unwrap();
        assert!(
            plain
                .socket_url("t")
                .unwrap()
                .starts_with("ws://127.0.0.1:8080/proxy/signalr/connect?")
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(HubEndpoint::new("not a url"), Err(Error::Config { .. })));
        assert!(matches!(HubEndpoint::new("ftp://live.test"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_cookie_header() {
        let values = [
            HeaderValue::from_static("GCLB=abc; path=/; HttpOnly"),
            HeaderValue::from_static("AWSALB=xyz; Expires=Thu"),
        ];
        assert_eq!(cookie_header(&values).as_deref(), Some("GCLB=abc; AWSALB=xyz"));
        assert_eq!(cookie_header(std::iter::empty()), None);
    }

    #[tokio::test]
    async fn test_negotiate_round_trip() {
        let base = http_server(vec![Route::ok(
            "/signalr/negotiate",
            r#"{"ConnectionToken":"tok-1","ConnectionId":"c"}"#,
        )])
        .await;
        let endpoint = HubEndpoint::new(&base).unwrap();

        let negotiated = endpoint.negotiate(&reqwest::Client::new()).await.unwrap();
        assert_eq!(negotiated.token, "tok-1");
        assert_eq!(negotiated.cookie, None);
    }

    #[tokio::test]
    async fn test_negotiate_without_token() {
        let base = http_server(vec![Route::ok("/signalr/negotiate", "{}")]).await;
        let endpoint = HubEndpoint::new(&base).unwrap();

        let err = endpoint.negotiate(&reqwest::Client::new()).await.unwrap_err();
        assert!(matches!(err, Error::Negotiation { .. }));
    }
}
