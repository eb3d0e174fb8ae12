use crate::echo_error::{EchoError, EchoResult};
use crate::icmp::{EchoKey, IcmpMessage};
use crate::transport::Transport;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// What to do with a received packet that fails structural decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodePolicy {
    /// Abort the exchange: a malformed packet is a hard protocol violation.
    Abort,
    /// Drop the packet like unrelated traffic and keep reading.
    Skip,
}

/// One blocking request/reply exchange at a time over a caller-supplied
/// transport.
///
/// The session holds no state besides the transport handle and the decode
/// policy, so concurrent use is governed entirely by what the transport
/// guarantees. Cancellation is the transport's read deadline: set it once
/// before an exchange and every blocking read after it elapses fails with
/// [`EchoError::Timeout`].
pub struct EchoSession<T> {
    transport: T,
    decode_policy: DecodePolicy,
}

impl<T> EchoSession<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> EchoSession<T> {
        Self::with_policy(transport, DecodePolicy::Abort)
    }

    pub fn with_policy(transport: T, decode_policy: DecodePolicy) -> EchoSession<T> {
        EchoSession {
            transport,
            decode_policy,
        }
    }

    /// Sets the read deadline for subsequent receives.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> EchoResult<()> {
        self.transport.set_read_timeout(timeout).map_err(EchoError::Transport)
    }

    /// Encodes an echo request carrying `key` and `payload` and writes it to
    /// `target`. Returns the number of bytes the transport accepted.
    pub fn send_to(
        &self,
        target: IpAddr,
        message_type: u8,
        key: EchoKey,
        payload: &[u8],
    ) -> EchoResult<usize> {
        let message = IcmpMessage::new_echo(message_type, key, payload.to_vec());
        let bytes = message.encode()?;
        let addr: socket2::SockAddr = SocketAddr::new(target, 0).into();
        let n = self.transport.send_to(&bytes, &addr).map_err(EchoError::Transport)?;
        tracing::trace!("sent {} byte echo request to {}", n, target);
        Ok(n)
    }

    /// Reads packets until one decodes to something other than an echo
    /// request and returns it.
    ///
    /// Echo requests are other parties' probes, or copies of our own outbound
    /// packet on a loopback or broadcast-visible medium, so they are dropped
    /// and the read repeats. Nothing bounds that loop except the transport's
    /// deadline: a medium that only ever delivers echo requests keeps the
    /// call spinning until the deadline fires.
    ///
    /// Whether the returned message carries the identifier/sequence the
    /// caller probed with stays the caller's decision; compare
    /// [`EchoBody::key`] against your key as strictly as the situation
    /// demands.
    ///
    /// [`EchoBody::key`]: crate::EchoBody::key
    pub fn receive_matching(&self, buf: &mut [u8]) -> EchoResult<IcmpMessage> {
        loop {
            let (n, from) = self.transport.recv_from(buf)?;
            let message = match IcmpMessage::decode(&buf[..n]) {
                Ok(message) => message,
                Err(e) if self.decode_policy == DecodePolicy::Skip && e.is_decode_failure() => {
                    tracing::warn!("dropping undecodable {} byte packet from {}: {}", n, from, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if message.is_echo_request() {
                tracing::trace!("skipping echo request from {}", from);
                continue;
            }
            return Ok(message);
        }
    }

    /// A full exchange: send to `target`, then receive until a message whose
    /// echo body equals `key` arrives. Replies to other probes in flight on
    /// the same socket are dropped; errors and the deadline abort as usual.
    pub fn exchange(
        &self,
        target: IpAddr,
        message_type: u8,
        key: EchoKey,
        payload: &[u8],
        buf: &mut [u8],
    ) -> EchoResult<IcmpMessage> {
        self.send_to(target, message_type, key, payload)?;
        loop {
            let reply = self.receive_matching(buf)?;
            if reply.echo().map(|echo| echo.key()) == Some(key) {
                return Ok(reply);
            }
            tracing::trace!(
                "ignoring reply that does not match id={} seq={}",
                key.identifier,
                key.sequence
            );
        }
    }
}
