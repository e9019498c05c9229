use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

use super::CaptureError;

/// `127.0.0.1` with an OS-assigned port.
pub const EPHEMERAL_LOOPBACK: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    0,
);

/// Bind a listener on `addr` and report the address it actually got.
///
/// A bind failure is final for the current attempt.
pub async fn bind_loopback(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), CaptureError> {
    let listener = TcpListener::bind(addr).await.map_err(CaptureError::Bind)?;
    let local_addr = listener.local_addr().map_err(CaptureError::Bind)?;

    tracing::debug!(%local_addr, "Bound loopback listener");

    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ephemeral_bind_gets_a_concrete_port() {
        let (_listener, addr) = bind_loopback(EPHEMERAL_LOOPBACK).await.unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let (_held, addr) = bind_loopback(EPHEMERAL_LOOPBACK).await.unwrap();

        let result = bind_loopback(addr).await;
        assert!(matches!(result, Err(CaptureError::Bind(_))));
    }
}
