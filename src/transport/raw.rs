use super::Transport;
use pnet_packet::{ipv4::Ipv4Packet, Packet};
use socket2::{Domain, Protocol, Type};
use std::{io, net::IpAddr, time::Duration};

const RECV_BUFFER_LEN: usize = 2048;

/// A `SOCK_RAW` ICMP socket; needs root or `CAP_NET_RAW`.
///
/// On a raw IPv4 socket the kernel hands over the whole IP packet, so
/// received frames are parsed and only the ICMP payload is copied out. Raw
/// IPv6 sockets deliver the ICMPv6 message as-is.
pub struct RawSocket {
    socket: socket2::Socket,
    strips_ip_header: bool,
}

impl RawSocket {
    pub fn create_v4(timeout: Duration) -> io::Result<RawSocket> {
        Self::create(Domain::IPV4, Protocol::ICMPV4, true, timeout)
    }

    pub fn create_v6(timeout: Duration) -> io::Result<RawSocket> {
        Self::create(Domain::IPV6, Protocol::ICMPV6, false, timeout)
    }

    fn create(
        domain: Domain,
        protocol: Protocol,
        strips_ip_header: bool,
        timeout: Duration,
    ) -> io::Result<RawSocket> {
        tracing::trace!("creating raw ICMP socket");
        let socket = socket2::Socket::new(domain, Type::RAW, Some(protocol))?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(RawSocket {
            socket,
            strips_ip_header,
        })
    }
}

impl Transport for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let mut recv_buf = [0u8; RECV_BUFFER_LEN];
        // See DgramSocket::recv_from for the MaybeUninit cast.
        let (n, socket_addr) = socket2::Socket::recv_from(&self.socket, unsafe {
            &mut *(std::ptr::addr_of_mut!(recv_buf) as *mut [u8] as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sender address is not an IP address"))?
            .ip();
        let message = if self.strips_ip_header {
            let packet = Ipv4Packet::new(&recv_buf[..n]).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "received frame shorter than an IPv4 header")
            })?;
            packet.payload().to_vec()
        } else {
            recv_buf[..n].to_vec()
        };
        let n_copied = message.len().min(buf.len());
        buf[..n_copied].copy_from_slice(&message[..n_copied]);
        Ok((n_copied, ip))
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }
}
