pub mod client;
pub mod connectors;
pub mod dns;
mod error;
mod stream;

pub use crate::client::Client;
pub use crate::error::ClientError;
