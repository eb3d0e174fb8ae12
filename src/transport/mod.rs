use std::io;
use std::net::IpAddr;
use std::time::Duration;

mod dgram;
mod raw;

pub use dgram::DgramSocket;
pub use raw::RawSocket;

/// A connectionless socket that moves whole ICMP messages.
///
/// One message per call in both directions. `recv_from` truncates to the
/// caller's buffer and reports the sender, which the caller needs to
/// attribute replies on a shared medium. The read deadline is the only
/// cancellation mechanism the engine relies on: once it elapses, a blocking
/// read must fail with a `WouldBlock`/`TimedOut` kind instead of blocking
/// forever.
pub trait Transport: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)>;
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy, PartialEq, Eq)]
    pub(crate) enum OnSend {
        ReturnErr,
        ReturnDefault,
    }

    pub(crate) enum OnReceive {
        Frame(Vec<u8>),
        WouldBlock,
        Closed,
    }

    #[derive(Clone)]
    pub(crate) struct TransportMock {
        on_send: OnSend,
        incoming: Arc<Mutex<VecDeque<OnReceive>>>,
        sent: Arc<Mutex<Vec<(Vec<u8>, IpAddr)>>>,
        read_cnt: Arc<Mutex<u16>>,
    }

    impl TransportMock {
        pub(crate) fn new(on_send: OnSend, incoming: Vec<OnReceive>) -> Self {
            Self {
                on_send,
                incoming: Arc::new(Mutex::new(incoming.into())),
                sent: Arc::new(Mutex::new(vec![])),
                read_cnt: Arc::new(Mutex::new(0)),
            }
        }

        pub(crate) fn should_send_number_of_messages(&self, n: usize) -> &Self {
            assert!(n == self.sent.lock().unwrap().len());
            self
        }

        pub(crate) fn should_send_to_address(&self, addr: &IpAddr) -> &Self {
            assert!(self.sent.lock().unwrap().iter().any(|e| *addr == e.1));
            self
        }

        pub(crate) fn should_read_number_of_times(&self, n: u16) -> &Self {
            assert!(n == *self.read_cnt.lock().unwrap());
            self
        }

        pub(crate) fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().iter().map(|e| e.0.clone()).collect()
        }
    }

    impl Transport for TransportMock {
        fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
            if self.on_send == OnSend::ReturnErr {
                return Err(io::Error::new(io::ErrorKind::Other, "simulating error in mock"));
            }
            self.sent.lock().unwrap().push((
                buf.to_vec(),
                addr.as_socket()
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::Other, "error in extracting IP address from SockAddr")
                    })?
                    .ip(),
            ));
            Ok(buf.len())
        }

        fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
            *self.read_cnt.lock().unwrap() += 1;
            match self.incoming.lock().unwrap().pop_front() {
                None | Some(OnReceive::WouldBlock) => Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "simulating would-block in mock",
                )),
                Some(OnReceive::Closed) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "socket closed")),
                Some(OnReceive::Frame(frame)) => {
                    let n = frame.len().min(buf.len());
                    buf[..n].copy_from_slice(&frame[..n]);
                    Ok((n, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))))
                }
            }
        }

        fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }
}
