use ember_crypto::CipherError;

/// Client-side failures. The transport variants only exist when the
/// `transport` feature is enabled.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session was closed and its key destroyed.
    #[error("session is closed")]
    SessionClosed,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[cfg(feature = "transport")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with an error body.
    #[cfg(feature = "transport")]
    #[error("relay refused ({status}): {code}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[cfg(feature = "transport")]
    #[error("event stream failed: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[cfg(feature = "transport")]
impl ClientError {
    /// The relay's stable error code, when this is an API refusal.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
