//! The issuer boundary: the one network call this crate makes.
//!
//! [`TicketIssuer`] is the seam between the refresh coordinator and the
//! remote service. [`HttpTicketIssuer`] is the production implementation;
//! tests substitute their own.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{IssuerConfig, Secret};
use crate::error::TicketError;

/// Raw `{ticket, expires_in}` pair as reported by the issuer, before the
/// expiry buffer is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTicket {
    pub ticket: String,
    pub expires_in: i64,
}

/// One network round trip to the issuing service.
#[async_trait]
pub trait TicketIssuer: Send + Sync {
    /// Fetch a fresh ticket.
    ///
    /// Surfaces transport failures and issuer-reported application errors;
    /// lifetime validation is the coordinator's concern.
    async fn fetch_ticket(&self) -> Result<IssuedTicket, TicketError>;
}

#[async_trait]
impl<T: TicketIssuer + ?Sized> TicketIssuer for Arc<T> {
    async fn fetch_ticket(&self) -> Result<IssuedTicket, TicketError> {
        (**self).fetch_ticket().await
    }
}

/// Wire format of the issuer response. Application errors are reported
/// in-band: a non-zero `errcode` means the request was rejected.
#[derive(Debug, Deserialize)]
struct IssuerResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    ticket: String,
    #[serde(default)]
    expires_in: i64,
}

/// HTTP implementation of [`TicketIssuer`].
///
/// Performs a GET against the configured endpoint with the managed access
/// token as a query parameter and decodes the JSON body. The HTTP client
/// carries a request timeout so a hung issuer fails the fetch instead of
/// stalling the coordinator forever.
pub struct HttpTicketIssuer {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Secret,
}

impl HttpTicketIssuer {
    /// Build an issuer client from its configuration.
    pub fn new(config: IssuerConfig) -> Result<Self, TicketError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(TicketError::transport)?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            access_token: config.access_token,
        })
    }
}

#[async_trait]
impl TicketIssuer for HttpTicketIssuer {
    async fn fetch_ticket(&self) -> Result<IssuedTicket, TicketError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("access_token", self.access_token.expose());

        tracing::debug!("fetching fresh ticket from issuer");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(TicketError::transport)?;

        let body: IssuerResponse = response.json().await.map_err(TicketError::transport)?;

        if body.errcode != 0 {
            tracing::warn!(code = body.errcode, "issuer rejected ticket request");
            return Err(TicketError::Issuer {
                code: body.errcode,
                message: body.errmsg,
            });
        }

        Ok(IssuedTicket {
            ticket: body.ticket,
            expires_in: body.expires_in,
        })
    }
}
