use std::net::Ipv4Addr;

/// Returned by [`local_ip`] when no usable interface address is found.
pub const DEFAULT_LOCAL_IP: &str = "localhost";

/// The first non-loopback IPv4 address of the host's network interfaces,
/// or `"localhost"`.
pub fn local_ip() -> String {
    pick_local_ip(interface_ipv4_addrs())
}

/// The host name, or `""` if it cannot be read.
#[cfg(unix)]
pub fn local_hostname() -> String {
    nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(not(unix))]
pub fn local_hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_default()
}

fn pick_local_ip(addrs: impl IntoIterator<Item = Ipv4Addr>) -> String {
    addrs
        .into_iter()
        .find(|ip| !ip.is_loopback() && !ip.is_unspecified())
        .map_or_else(|| DEFAULT_LOCAL_IP.to_string(), |ip| ip.to_string())
}

#[cfg(unix)]
fn interface_ipv4_addrs() -> Vec<Ipv4Addr> {
    use std::net::SocketAddrV4;

    match nix::ifaddrs::getifaddrs() {
        Ok(addrs) => addrs
            .filter_map(|ifaddr| ifaddr.address)
            .filter_map(|addr| addr.as_sockaddr_in().map(|sin| *SocketAddrV4::from(*sin).ip()))
            .collect(),
        Err(err) => {
            tracing::debug!(error = %err, "failed to list network interfaces");
            Vec::new()
        }
    }
}

#[cfg(not(unix))]
fn interface_ipv4_addrs() -> Vec<Ipv4Addr> {
    Vec::new()
}
