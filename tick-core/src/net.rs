use std::io;
use std::net::TcpStream;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};

/// Включить TCP keep-alive: после `idle` простоя ядро начинает слать пробы.
///
/// В std нет ручки для keep-alive, поэтому через socket2.
pub fn enable_keepalive(stream: &TcpStream, idle: Duration) -> io::Result<()> {
    let keepalive = TcpKeepalive::new().with_time(idle);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn keepalive_is_enabled_on_connected_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (_server, _) = listener.accept().unwrap();

        enable_keepalive(&client, Duration::from_secs(60)).unwrap();
        assert!(SockRef::from(&client).keepalive().unwrap());
    }
}
