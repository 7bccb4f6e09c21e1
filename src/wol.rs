//! Wake-on-LAN magic packets

use crate::{
    defaults::{WOL_BROADCAST_ADDRESS, WOL_DEFAULT_PORT},
    error::{AppError, Result},
    types::MacAddress,
};
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Six `0xFF` bytes followed by the MAC address repeated sixteen times
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    let octets = mac.octets();
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

/// Resolve the destination, defaulting to the limited broadcast address and port 9
pub fn destination(ip: Option<&str>, port: Option<u16>) -> Result<SocketAddr> {
    let ip = ip.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(WOL_BROADCAST_ADDRESS);
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid IP address for wake-on-LAN: '{}'", ip)))?;
    Ok(SocketAddr::new(ip, port.unwrap_or(WOL_DEFAULT_PORT)))
}

/// Send one magic packet from a broadcast-enabled socket
pub async fn send_magic_packet(mac: &MacAddress, target: SocketAddr) -> Result<()> {
    let bind_addr: SocketAddr = if target.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| AppError::network(format!("Failed to open UDP socket: {}", e)))?;
    if target.is_ipv4() {
        socket
            .set_broadcast(true)
            .map_err(|e| AppError::network(format!("Failed to enable broadcast: {}", e)))?;
    }

    let packet = magic_packet(mac);
    let sent = socket
        .send_to(&packet, target)
        .await
        .map_err(|e| AppError::network(format!("Failed to send magic packet to {}: {}", target, e)))?;

    if sent != packet.len() {
        return Err(AppError::network(format!(
            "Magic packet truncated: sent {} of {} bytes",
            sent,
            packet.len()
        )));
    }

    Ok(())
}
