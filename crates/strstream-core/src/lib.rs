//! Core functionalities: a serial-like byte stream over an in-memory string
//! buffer, paced at a simulated baud rate.

pub mod bounded;
pub mod clock;
pub mod config;
pub mod error;
pub mod pacing;
pub mod rxbuf;
pub mod source;
pub mod stream;

pub use bounded::BoundedString;
pub use clock::{Clock, MockClock, SystemClock};
pub use config::{DataBits, PacingConfig, Parity, StopBits};
pub use error::{BufferError, ConfigError};
pub use pacing::Pacer;
pub use rxbuf::{RxBuffer, RxSink, RX_CAPACITY};
pub use source::{ByteSource, SharedSource};
pub use stream::{ByteStream, StringStream};
