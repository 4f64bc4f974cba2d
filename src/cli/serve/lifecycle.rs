//! Server lifecycle management.

use crate::{bridge::watch::SourceWatcher, core::register_server, log, sprite::SpriteLoader};
use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, thread};
use tiny_http::Server;
use tokio::runtime::Handle;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 asks the OS; report the real one
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Register server for graceful shutdown.
///
/// On Ctrl+C the global handler unblocks the server and signals `shutdown_tx`.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Start the source watcher on `runtime`; it stops on the shutdown signal.
pub fn spawn_watcher(
    runtime: &Handle,
    sources: Vec<PathBuf>,
    loader: SpriteLoader,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let watcher = SourceWatcher::new(sources, loader).context("failed to start file watcher")?;
    let task = runtime.spawn(watcher.run());

    let abort = task.abort_handle();
    thread::spawn(move || {
        let _ = shutdown_rx.recv();
        abort.abort();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, TcpListener};

    #[test]
    fn test_bind_skips_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let (_server, addr) = bind_with_retry(IpAddr::V4(Ipv4Addr::LOCALHOST), port).unwrap();
        assert_ne!(addr.port(), port);
    }
}
