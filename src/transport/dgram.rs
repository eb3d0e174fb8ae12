use super::Transport;
use socket2::{Domain, Protocol, Type};
use std::{io, net::IpAddr, time::Duration};

/// An unprivileged `SOCK_DGRAM` ICMP socket. The kernel strips the IP header
/// from received IPv4 frames, so both families deliver bare ICMP messages.
pub struct DgramSocket {
    socket: socket2::Socket,
}

impl DgramSocket {
    pub fn create_v4(timeout: Duration) -> io::Result<DgramSocket> {
        Self::create(Domain::IPV4, Protocol::ICMPV4, timeout)
    }

    pub fn create_v6(timeout: Duration) -> io::Result<DgramSocket> {
        Self::create(Domain::IPV6, Protocol::ICMPV6, timeout)
    }

    fn create(domain: Domain, protocol: Protocol, timeout: Duration) -> io::Result<DgramSocket> {
        tracing::trace!("creating ICMP datagram socket");
        let socket = socket2::Socket::new(domain, Type::DGRAM, Some(protocol))?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(DgramSocket { socket })
    }
}

impl Transport for DgramSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        // Socket2 gives a safety guaranty which allows us to do an unsafe cast
        // from `&mut [u8]` to `&mut [std::mem::MaybeUninit<u8>]`. In fact, even
        // if we use MaybeUninit here we have to use unsafe somewhere to copy
        // the data out of MaybeUninit.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        let (n, socket_addr) = socket2::Socket::recv_from(&self.socket, unsafe {
            &mut *(std::ptr::addr_of_mut!(*buf) as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sender address is not an IP address"))?
            .ip();
        Ok((n, ip))
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }
}
