#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use echo_error::{EchoError, EchoResult};
pub use echo_session::{DecodePolicy, EchoSession};
pub use icmp::{
    checksum_ok, EchoBody, EchoKey, IcmpBody, IcmpMessage, ECHO_REPLY_V4, ECHO_REPLY_V6,
    ECHO_REQUEST_V4, ECHO_REQUEST_V6,
};
pub use transport::{DgramSocket, RawSocket, Transport};

mod echo_error;
mod echo_session;
mod icmp;
mod transport;
