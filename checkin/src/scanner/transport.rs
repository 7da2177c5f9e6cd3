//! Transports carrying a scan to the validation service.

use crate::api::checkin::{CheckInRequest, CheckInResponse};
use crate::app::CheckInService;
use crate::config::Config;
use crate::types::{TicketId, TicketIdentity};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures (no verdict from the service)
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be sent or the response not read
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with something that is not a check-in response
    #[error("Unexpected response (status {status}): {detail}")]
    UnexpectedResponse {
        /// HTTP status
        status: u16,
        /// Parse failure detail
        detail: String,
    },
}

/// Boxed future returned by transports
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CheckInResponse, TransportError>> + Send + 'a>>;

/// Delivers a check-in request and returns the service's verdict
pub trait CheckInTransport: Send + Sync {
    /// Submit one request
    fn submit(&self, request: CheckInRequest) -> TransportFuture<'_>;
}

/// JSON over HTTP to `POST {base_url}/api/checkin/qr`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    passphrase: Option<String>,
}

impl HttpTransport {
    /// Transport to the service at `base_url`
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            passphrase: None,
        })
    }

    /// Transport described by `SCANNER_BASE_URL`, `SCANNER_REQUEST_TIMEOUT_MS`
    /// and `KIOSK_PASSPHRASE`
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = Self::new(&config.scanner.base_url, config.scanner.request_timeout())?;
        Ok(match &config.checkin.kiosk_passphrase {
            Some(passphrase) => transport.with_passphrase(passphrase.as_str()),
            None => transport,
        })
    }

    /// Send the kiosk passphrase with every request
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Service base URL, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a ticket from `GET {base_url}/api/tickets/{id}`
    ///
    /// # Errors
    ///
    /// [`TransportError::UnexpectedResponse`] for any non-2xx answer, including
    /// an unknown ticket.
    pub async fn fetch_ticket(&self, ticket_id: &TicketId) -> Result<TicketIdentity, TransportError> {
        let response = self
            .client
            .get(format!("{}/api/tickets/{ticket_id}", self.base_url))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::UnexpectedResponse {
                status: status.as_u16(),
                detail: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| TransportError::UnexpectedResponse {
            status: status.as_u16(),
            detail: e.to_string(),
        })
    }
}

impl CheckInTransport for HttpTransport {
    fn submit(&self, request: CheckInRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self
                .client
                .post(format!("{}/api/checkin/qr", self.base_url))
                .json(&request);
            if let Some(passphrase) = &self.passphrase {
                builder = builder.header(echopass_web::PASSPHRASE_HEADER, passphrase);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            // 400 and 500 carry a check-in response too
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Request(e.to_string()))?;

            serde_json::from_slice(&body).map_err(|e| TransportError::UnexpectedResponse {
                status,
                detail: e.to_string(),
            })
        })
    }
}

/// In-process transport calling the service directly
#[derive(Clone)]
pub struct LocalTransport {
    service: CheckInService,
}

impl LocalTransport {
    /// Transport into `service`
    #[must_use]
    pub const fn new(service: CheckInService) -> Self {
        Self { service }
    }
}

impl CheckInTransport for LocalTransport {
    fn submit(&self, request: CheckInRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let response = match self
                .service
                .validate(request.ticket_data, request.timestamp)
                .await
            {
                Ok(success) => CheckInResponse::success(success.ticket_id.as_str(), success.timestamp),
                Err(error) => CheckInResponse::failure(error.to_string()),
            };
            Ok(response)
        })
    }
}
