use thiserror::Error;

/// Errors raised while turning user input into a [`crate::LocationQuery`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocationError {
    #[error("Please enter a location.")]
    Empty,

    #[error("Latitude must be between -90 and 90 (got {0}).")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be between -180 and 180 (got {0}).")]
    LongitudeOutOfRange(f64),

    #[error("Malformed coordinates '{0}'. Example: 37.5665,126.9780")]
    MalformedCoordinates(String),
}

/// Errors surfaced by a weather provider after any applicable retries.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(
        "No OpenWeather API key configured.\n\
         Hint: set OPENWEATHER_API_KEY or run `weatherdash configure`."
    )]
    MissingApiKey,

    #[error("The API key was rejected by the provider.")]
    InvalidApiKey,

    #[error("The requested location could not be found. Check the city name.")]
    NotFound,

    #[error("Request limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Provider returned an error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("The request timed out. Check your network connection.")]
    Timeout,

    #[error("Could not connect to the weather service. Check your internet connection.")]
    Connection,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Transport-level failures are the only ones worth another attempt.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection | Self::Request(_))
    }

    /// Map an HTTP status onto the error taxonomy. Returns `None` for non-error statuses.
    pub fn from_status(status: u16, body: &str) -> Option<Self> {
        match status {
            401 => Some(Self::InvalidApiKey),
            404 => Some(Self::NotFound),
            429 => Some(Self::RateLimited),
            s if s >= 400 => Some(Self::Api {
                status: s,
                body: truncate_body(body),
            }),
            _ => None,
        }
    }
}

/// JSON decoding happens after the body is read, so any reqwest error here is a
/// transport failure, including a body cut short by the peer.
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection
        } else {
            Self::Request(err.to_string())
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(ClientError::from_status(401, ""), Some(ClientError::InvalidApiKey)));
        assert!(matches!(ClientError::from_status(404, ""), Some(ClientError::NotFound)));
        assert!(matches!(ClientError::from_status(429, ""), Some(ClientError::RateLimited)));
        assert!(matches!(
            ClientError::from_status(503, "down"),
            Some(ClientError::Api { status: 503, .. })
        ));
        assert!(ClientError::from_status(200, "").is_none());
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(ClientError::Timeout.is_transport());
        assert!(ClientError::Connection.is_transport());
        assert!(ClientError::Request("reset".into()).is_transport());
        assert!(!ClientError::NotFound.is_transport());
        assert!(!ClientError::RateLimited.is_transport());
        assert!(!ClientError::MissingApiKey.is_transport());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "가".repeat(100);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
