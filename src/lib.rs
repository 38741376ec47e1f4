//! llhls-unix - chunk transport over Unix domain sockets.
//!
//! A producer process listens on a local stream socket and serves discrete
//! media chunks (TS/MP4 segments). A consumer opens
//! `llhls:<socket path>?<chunk id>`, the identifier is sent NUL-terminated,
//! and the producer streams the chunk back and closes the connection. If the
//! producer cannot serve the chunk it appends a fixed ASCII marker
//! ([`constants::MAGIC_ERROR`]) to the stream, and the reader turns that into
//! [`TransportError::ProducerFailed`].
//!
//! # Modules
//!
//! - [`locator`] - `llhls:` locator parsing
//! - [`connector`] - socket allocation and connect-with-retry
//! - [`dispatcher`] - chunk request encoding and send
//! - [`session`] - non-blocking reader, writer, lifecycle
//! - [`window`] - trailing-byte window for marker detection
//! - [`registry`] - scheme → opener table
//! - [`config`] - [`TransportOptions`] from JSON and environment
//! - [`socket`] - platform primitives behind [`socket::SocketOps`]
//!
//! # Example
//!
//! ```no_run
//! use llhls_unix::{ReadOutcome, Session, TransportOptions};
//!
//! let mut session = Session::open("llhls:/tmp/producer.sock?seg42", &TransportOptions::default())?;
//! let mut buf = [0u8; 4096];
//! loop {
//!     match session.read(&mut buf)? {
//!         ReadOutcome::Data(n) => { /* consume buf[..n] */ let _ = n; }
//!         ReadOutcome::WouldBlock => { /* poll session.raw_fd() */ }
//!         ReadOutcome::EndOfStream => break,
//!     }
//! }
//! # Ok::<(), llhls_unix::TransportError>(())
//! ```

pub mod commands;
pub mod config;
pub mod connector;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod locator;
pub mod registry;
pub mod retry;
pub mod session;
pub mod socket;
pub mod window;

// Re-export commonly used types
pub use config::TransportOptions;
pub use error::{Result, TransportError};
pub use locator::Locator;
pub use registry::{ProtocolEntry, ProtocolFlags, ProtocolRegistry, Transport};
pub use retry::RetryPolicy;
pub use session::{ReadOutcome, Session};
pub use window::{TrailingWindow, WindowMode};
