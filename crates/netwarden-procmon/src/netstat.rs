//! Socket table reader for platforms without procfs, backed by `netstat2`

use netstat2::{
    get_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState,
};
use netwarden_core::{AddressFamily, NetWardenError, Protocol, RawSocket, Result, SocketSource};
use std::net::SocketAddr;

use crate::procnet::UDP_STATE;

/// Reads sockets through the platform's native socket APIs
#[derive(Debug, Default)]
pub struct NetstatSource;

impl NetstatSource {
    pub fn new() -> Self {
        Self
    }
}

impl SocketSource for NetstatSource {
    fn name(&self) -> &str {
        "netstat"
    }

    fn sockets(&self) -> Result<Vec<RawSocket>> {
        let infos = get_sockets_info(
            AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
            ProtocolFlags::TCP | ProtocolFlags::UDP,
        )
        .map_err(|e| {
            let message = e.to_string();
            let lower = message.to_lowercase();
            if lower.contains("permission") || lower.contains("not permitted") || lower.contains("denied") {
                NetWardenError::PermissionDenied(message)
            } else {
                NetWardenError::Other(format!("socket enumeration failed: {}", message))
            }
        })?;

        Ok(infos
            .into_iter()
            .map(|info| {
                let pid = info.associated_pids.first().copied();
                match info.protocol_socket_info {
                    ProtocolSocketInfo::Tcp(tcp) => {
                        let local = SocketAddr::new(tcp.local_addr, tcp.local_port);
                        let remote = SocketAddr::new(tcp.remote_addr, tcp.remote_port);
                        RawSocket {
                            protocol: Protocol::Tcp,
                            family: AddressFamily::of(&tcp.local_addr),
                            local: Some(local),
                            remote: (!remote.ip().is_unspecified() || remote.port() != 0)
                                .then_some(remote),
                            state: Some(tcp_state_name(&tcp.state).to_string()),
                            pid,
                        }
                    }
                    ProtocolSocketInfo::Udp(udp) => RawSocket {
                        protocol: Protocol::Udp,
                        family: AddressFamily::of(&udp.local_addr),
                        local: Some(SocketAddr::new(udp.local_addr, udp.local_port)),
                        remote: None,
                        state: Some(UDP_STATE.to_string()),
                        pid,
                    },
                }
            })
            .collect())
    }
}

fn tcp_state_name(state: &TcpState) -> &'static str {
    match state {
        TcpState::Closed => "CLOSE",
        TcpState::Listen => "LISTEN",
        TcpState::SynSent => "SYN_SENT",
        TcpState::SynReceived => "SYN_RECV",
        TcpState::Established => "ESTABLISHED",
        TcpState::FinWait1 => "FIN_WAIT1",
        TcpState::FinWait2 => "FIN_WAIT2",
        TcpState::CloseWait => "CLOSE_WAIT",
        TcpState::Closing => "CLOSING",
        TcpState::LastAck => "LAST_ACK",
        TcpState::TimeWait => "TIME_WAIT",
        _ => "UNKNOWN",
    }
}
