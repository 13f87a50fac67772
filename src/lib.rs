//! Line and raw reads over a blocking socket, with a deadline that holds across receives.
//!
//! [`BufferedReader`] wraps a [`Transport`] (a [`TcpStream`](std::net::TcpStream), a unix
//! stream, or anything implementing the trait) and offers two ways to read from it:
//!
//! - [`read`](BufferedReader::read) hands out bytes already buffered, or issues a single
//!   receive when there are none.
//! - [`read_line`](BufferedReader::read_line) returns one `\n` terminated line, with the line
//!   ending stripped. It may take several receives to find the delimiter, and the configured
//!   timeout bounds all of them together. Bytes that arrive after the delimiter are kept for the
//!   next call.
//!
//! # Quick start
//!
//! ```no_run
//! use buffered_socket::BufferedReader;
//! use std::net::TcpStream;
//! use std::time::Duration;
//!
//! # fn main() -> buffered_socket::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:6379")?;
//! let mut reader = BufferedReader::builder(stream)
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! reader.send_all(b"PING\r\n")?;
//! let reply = reader.read_line(512)?;
//! assert_eq!(reply, b"+PONG");
//!
//! // Closed here, or when `reader` goes out of scope
//! reader.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate organisation
//!
//! - [`BufferedReader`]: the primary type, owning a transport and a remainder buffer.
//! - [`BufferedReaderBuilder`]: configures buffer capacity and timeout before constructing a
//!   [`BufferedReader`].
//! - [`Transport`]: the blocking stream seam.
//! - [`buffer::FifoBuffer`]: the standalone remainder buffer.
//! - [`Error`]: every failure the crate reports.
//! - [`constants`]: default sizes used throughout the crate.

pub mod buffer;
pub mod constants;
mod deadline;
mod error;
mod reader;
mod transport;

pub use error::{Error, Result};
pub use reader::{BufferedReader, BufferedReaderBuilder};
pub use transport::Transport;
