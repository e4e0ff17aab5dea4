use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum EmissionsError {
    #[error(
        "request timed out, the emissions service may be slow or unreachable. \
         Try increasing --timeout or check your connection"
    )]
    Timeout,

    #[error("connection failed, check your internet connection ({0})")]
    ConnectionFailed(String),

    #[error("DNS resolution failed ({0}), check your internet connection")]
    DnsResolution(String),

    #[error("HTTP proxy error, check your --http-proxy URL is correct ({0})")]
    ProxyError(String),

    #[error("TLS/SSL error talking to the emissions service ({0})")]
    TlsError(String),

    #[error("unexpected HTTP status {0} from the emissions service")]
    HttpStatus(u16),

    #[error("failed to decode emissions data: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid airport code \"{0}\", must be exactly 3 letters (e.g. ZRH, BOS, JFK)")]
    InvalidAirport(String),

    #[error("{0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmissionsError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::DnsResolution(_) => "dns_error",
            Self::ProxyError(_) => "proxy_error",
            Self::TlsError(_) => "tls_error",
            Self::HttpStatus(_) => "http_error",
            Self::Decode(_) => "decode_error",
            Self::Config(_) => "config_error",
            Self::InvalidAirport(_) => "invalid_airport",
            Self::Validation(_) => "validation_error",
            Self::Io(_) => "io_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidAirport(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConnectionFailed(_)
            | Self::DnsResolution(_)
            | Self::ProxyError(_)
            | Self::TlsError(_)
            | Self::HttpStatus(_)
            | Self::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for EmissionsError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": {
                "status": self.kind(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub fn from_http_error(err: wreq::Error) -> EmissionsError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return EmissionsError::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return EmissionsError::DnsResolution(msg);
        }
        return EmissionsError::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return EmissionsError::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return EmissionsError::TlsError(msg);
    }

    EmissionsError::ConnectionFailed(msg)
}
