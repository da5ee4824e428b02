use thiserror::Error;

#[derive(Debug, Error)]
pub enum UdpSourceError {
    #[error("invalid address '{input}': {message}")]
    Address { input: String, message: String },
}
