use std::{error::Error, fmt, io};

pub type EchoResult<T> = std::result::Result<T, EchoError>;

/// Everything a send or receive-matching call can fail with. No call is
/// retried inside the engine; each yields one message or one of these.
#[derive(Debug)]
pub enum EchoError {
    /// A message body refused to encode. No body kind defined so far can
    /// actually produce this.
    Encode(String),
    /// Input ended before the fixed part of a header or body.
    TooShort { expected: usize, actual: usize },
    /// A received packet failed structural decoding for a reason other than
    /// truncation.
    Decode(String),
    /// The read deadline elapsed before any reply arrived.
    Timeout,
    /// Opaque passthrough from the socket layer.
    Transport(io::Error),
}

impl EchoError {
    /// Decode-class failures are the ones [`DecodePolicy::Skip`] may drop.
    ///
    /// [`DecodePolicy::Skip`]: crate::DecodePolicy::Skip
    pub(crate) fn is_decode_failure(&self) -> bool {
        matches!(self, EchoError::TooShort { .. } | EchoError::Decode(_))
    }
}

impl fmt::Display for EchoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EchoError::Encode(message) => write!(f, "could not encode message body: {message}"),
            EchoError::TooShort { expected, actual } => {
                write!(f, "message too short: expected at least {expected} bytes, got {actual}")
            }
            EchoError::Decode(message) => write!(f, "malformed packet: {message}"),
            EchoError::Timeout => write!(f, "timed out waiting for a reply"),
            EchoError::Transport(error) => write!(f, "transport error: {error}"),
        }
    }
}

impl Error for EchoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EchoError::Transport(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for EchoError {
    fn from(error: io::Error) -> EchoError {
        // Both kinds signal an elapsed deadline, depending on platform.
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => EchoError::Timeout,
            _ => EchoError::Transport(error),
        }
    }
}
