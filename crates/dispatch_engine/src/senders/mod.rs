//! Bundled `MessageSender` implementations

mod http;
mod log;
mod mock;

pub use http::{HttpSender, HttpSenderConfig};
pub use log::LogSender;
pub use mock::{MockSender, MockSenderConfig, SentMessage};
