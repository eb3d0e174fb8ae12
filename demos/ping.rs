use std::net::IpAddr;
use std::time::{Duration, Instant};

use rand::Rng;

use echo_probe::{
    checksum_ok, DgramSocket, EchoError, EchoKey, EchoSession, ECHO_REPLY_V4, ECHO_REQUEST_V4,
    ECHO_REQUEST_V6,
};

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

const PAYLOAD_SIZE: usize = 56;

#[derive(argh::FromArgs)]
/// ping - send ICMP echo requests to an IP address
struct Args {
    #[argh(option, short = 'c', default = "4")]
    /// stop after <count> echo requests
    count: u16,

    #[argh(option, short = 'W', default = "1000")]
    /// reply timeout in milliseconds
    timeout_ms: u64,

    #[argh(positional)]
    /// IP address (v4 or v6)
    address: String,
}

fn main() -> Result<(), GenericError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Args = argh::from_env();
    let target: IpAddr = args.address.parse()?;
    let timeout = Duration::from_millis(args.timeout_ms);

    let socket = if target.is_ipv4() {
        DgramSocket::create_v4(timeout)?
    } else {
        DgramSocket::create_v6(timeout)?
    };
    let session = EchoSession::new(socket);
    let message_type = if target.is_ipv4() {
        ECHO_REQUEST_V4
    } else {
        ECHO_REQUEST_V6
    };

    let mut payload = [0u8; PAYLOAD_SIZE];
    rand::thread_rng().fill(&mut payload[..]);
    let identifier: u16 = rand::thread_rng().gen();
    let mut buf = [0u8; 1024];

    for sequence in 1..=args.count {
        let key = EchoKey::new(identifier, sequence);
        let sent_at = Instant::now();
        session.send_to(target, message_type, key, &payload)?;

        match wait_for_reply(&session, key, &mut buf) {
            Ok(n) => println!(
                "{} bytes from {}: icmp_seq={} time={:?}",
                n,
                target,
                sequence,
                sent_at.elapsed()
            ),
            Err(EchoError::Timeout) => println!("no reply for icmp_seq={sequence}"),
            Err(e) => return Err(e.into()),
        }

        if sequence < args.count {
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    Ok(())
}

fn wait_for_reply<T>(
    session: &EchoSession<T>,
    key: EchoKey,
    buf: &mut [u8],
) -> Result<usize, EchoError>
where
    T: echo_probe::Transport,
{
    loop {
        let message = session.receive_matching(buf)?;
        // Datagram sockets rewrite the identifier, so only the sequence number
        // identifies our probe here.
        match message.echo() {
            Some(echo) if echo.sequence == key.sequence => {
                let n = 4 + 4 + echo.data.len();
                if message.message_type == ECHO_REPLY_V4 && !checksum_ok(&buf[..n]) {
                    tracing::warn!("reply with a bad checksum from the peer");
                }
                return Ok(n);
            }
            _ => {}
        }
    }
}
