//! # Ticketforge
//!
//! Single-flight cache and adaptive renewal loop for short-lived issuer
//! tickets.
//!
//! A process keeps exactly one authoritative copy of a short-lived access
//! ticket. Readers are served straight from the cache; every refresh funnels
//! through one serialized coordinator, so the issuer sees at most one fetch
//! at a time; a background timer renews the ticket proactively and retunes
//! itself to each newly learned lifetime.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use ticketforge::{HttpTicketIssuer, IssuerConfig, Secret, TicketServer};
//!
//! # async fn example() -> Result<(), ticketforge::TicketError> {
//! let config = IssuerConfig::new(
//!     "https://issuer.example.com/ticket".parse().unwrap(),
//!     Secret::new("access-token"),
//! );
//! let server = TicketServer::spawn(HttpTicketIssuer::new(config)?);
//!
//! // Fast path: served from the cache once a ticket is known.
//! let ticket = server.ticket().await?;
//!
//! // A downstream rejection forces a refresh keyed by the stale copy.
//! let ticket = server.refresh_ticket(&ticket).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod issuer;
pub mod server;
pub mod ticket;

mod schedule;

// Re-export commonly used types at crate root
pub use cache::TicketCache;
pub use config::{ConfigError, IssuerConfig, Secret};
pub use error::TicketError;
pub use issuer::{HttpTicketIssuer, IssuedTicket, TicketIssuer};
pub use server::TicketServer;
pub use ticket::{Ticket, buffered_expiry};
