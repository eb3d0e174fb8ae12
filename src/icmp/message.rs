use crate::echo_error::{EchoError, EchoResult};
use rand::Rng;

pub const ECHO_REPLY_V4: u8 = 0;
pub const ECHO_REQUEST_V4: u8 = 8;
pub const ECHO_REQUEST_V6: u8 = 128;
pub const ECHO_REPLY_V6: u8 = 129;

const HEADER_LEN: usize = 4;
const ECHO_BODY_MIN_LEN: usize = 4;

/// An ICMP message: the 4-byte header plus an optional typed body.
///
/// The `checksum` field holds whatever the wire holds: on decode it is parsed
/// verbatim and never validated (see [`checksum_ok`]), on encode it seeds the
/// checksum bytes of the outgoing buffer before the computed complement is
/// XORed over them. A zeroed seed therefore yields the classic RFC 1071
/// result, and a pre-seeded field survives encoding of the ICMPv6 echo family
/// untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IcmpMessage {
    pub message_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub body: Option<IcmpBody>,
}

/// Message bodies keyed by the header type. Echo is the only kind decoded so
/// far; other types carry their body opaquely as `None` on the message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IcmpBody {
    Echo(EchoBody),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EchoBody {
    pub identifier: u16,
    pub sequence: u16,
    pub data: Vec<u8>,
}

/// The correlation fields a caller chooses when sending an echo request and
/// compares against the body of a reply.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EchoKey {
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpMessage {
    pub fn new_echo(message_type: u8, key: EchoKey, data: Vec<u8>) -> IcmpMessage {
        IcmpMessage {
            message_type,
            code: 0,
            checksum: 0,
            body: Some(IcmpBody::Echo(EchoBody {
                identifier: key.identifier,
                sequence: key.sequence,
                data,
            })),
        }
    }

    /// Binary encoding of the message: header, body, checksum filled in.
    ///
    /// For the ICMPv6 echo family the checksum bytes are left exactly as
    /// constructed from the `checksum` field; the layer below owns them
    /// because the ICMPv6 checksum covers an IP pseudo-header.
    pub fn encode(&self) -> EchoResult<Vec<u8>> {
        let [seed_hi, seed_lo] = self.checksum.to_be_bytes();
        let mut bytes = vec![self.message_type, self.code, seed_hi, seed_lo];
        if let Some(body) = &self.body {
            if body.encoded_len() != 0 {
                body.encode_into(&mut bytes)?;
            }
        }
        if checksum_is_deferred(self.message_type) {
            return Ok(bytes);
        }
        // XOR instead of overwrite: the seed bytes stay in play, so a caller
        // that zeroed the field gets the standard checksum and one that
        // pre-seeded it gets the seed folded through.
        let complement = !ones_complement_sum(&bytes);
        bytes[2] ^= (complement >> 8) as u8;
        bytes[3] ^= (complement & 0xff) as u8;
        Ok(bytes)
    }

    /// Parses `bytes` as an ICMP message.
    ///
    /// A recognized echo type with trailing bytes gets a decoded [`EchoBody`];
    /// an unrecognized type keeps its body opaque (`None`) rather than
    /// failing. The checksum is taken verbatim and not verified.
    pub fn decode(bytes: &[u8]) -> EchoResult<IcmpMessage> {
        if bytes.len() < HEADER_LEN {
            return Err(EchoError::TooShort {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let message_type = bytes[0];
        let code = bytes[1];
        let checksum = u16::from_be_bytes([bytes[2], bytes[3]]);
        let body = if bytes.len() > HEADER_LEN && is_echo_kind(message_type) {
            Some(IcmpBody::Echo(EchoBody::decode(&bytes[HEADER_LEN..])?))
        } else {
            None
        };
        Ok(IcmpMessage {
            message_type,
            code,
            checksum,
            body,
        })
    }

    pub fn is_echo_request(&self) -> bool {
        matches!(self.message_type, ECHO_REQUEST_V4 | ECHO_REQUEST_V6)
    }

    pub fn echo(&self) -> Option<&EchoBody> {
        match &self.body {
            Some(IcmpBody::Echo(echo)) => Some(echo),
            None => None,
        }
    }
}

impl IcmpBody {
    fn encoded_len(&self) -> usize {
        match self {
            IcmpBody::Echo(echo) => echo.encoded_len(),
        }
    }

    // Infallible for every body kind defined so far; the Result stays for
    // kinds whose encoding can actually refuse.
    fn encode_into(&self, out: &mut Vec<u8>) -> EchoResult<()> {
        match self {
            IcmpBody::Echo(echo) => {
                echo.encode_into(out);
                Ok(())
            }
        }
    }
}

impl EchoBody {
    pub fn key(&self) -> EchoKey {
        EchoKey {
            identifier: self.identifier,
            sequence: self.sequence,
        }
    }

    fn encoded_len(&self) -> usize {
        ECHO_BODY_MIN_LEN + self.data.len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.identifier.to_be_bytes());
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.extend_from_slice(&self.data);
    }

    fn decode(bytes: &[u8]) -> EchoResult<EchoBody> {
        if bytes.len() < ECHO_BODY_MIN_LEN {
            return Err(EchoError::TooShort {
                expected: ECHO_BODY_MIN_LEN,
                actual: bytes.len(),
            });
        }
        Ok(EchoBody {
            identifier: u16::from_be_bytes([bytes[0], bytes[1]]),
            sequence: u16::from_be_bytes([bytes[2], bytes[3]]),
            data: bytes[ECHO_BODY_MIN_LEN..].to_vec(),
        })
    }
}

impl EchoKey {
    pub fn new(identifier: u16, sequence: u16) -> EchoKey {
        EchoKey {
            identifier,
            sequence,
        }
    }

    /// A key with a random identifier, for callers without a natural one.
    pub fn with_random_identifier(sequence: u16) -> EchoKey {
        EchoKey {
            identifier: rand::thread_rng().gen(),
            sequence,
        }
    }
}

/// Whether a fully encoded message carries a correct checksum.
///
/// Decode deliberately skips this; call it on the received bytes when
/// validation is wanted. Only meaningful for the IPv4 family — ICMPv6
/// checksums cover a pseudo-header this crate never sees.
pub fn checksum_ok(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && ones_complement_sum(bytes) == 0xffff
}

fn is_echo_kind(message_type: u8) -> bool {
    matches!(
        message_type,
        ECHO_REQUEST_V4 | ECHO_REPLY_V4 | ECHO_REQUEST_V6 | ECHO_REPLY_V6
    )
}

// The ICMPv6 echo family: checksummed by the layer below.
fn checksum_is_deferred(message_type: u8) -> bool {
    matches!(message_type, ECHO_REQUEST_V6 | ECHO_REPLY_V6)
}

// One's-complement sum of big-endian 16-bit words; an odd trailing byte is
// the high half of a final word. Carries folded back twice.
#[allow(clippy::cast_possible_truncation)]
fn ones_complement_sum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = bytes.chunks_exact(2);
    for word in words.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(*last) << 8;
    }
    sum = (sum >> 16) + (sum & 0xffff);
    sum += sum >> 16;
    sum as u16
}
