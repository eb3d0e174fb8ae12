mod message;

pub use message::{
    checksum_ok, EchoBody, EchoKey, IcmpBody, IcmpMessage, ECHO_REPLY_V4, ECHO_REPLY_V6,
    ECHO_REQUEST_V4, ECHO_REQUEST_V6,
};
