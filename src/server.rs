// SPDX-License-Identifier: MIT

//! The accept loop. One connection is handled to completion before the next is accepted, so
//! nothing here is shared between requests and uploads never race each other.

use crate::config::Config;
use crate::error::AppError;
use crate::http::Handler;
use crate::storage::ensure_dir;
use log::{debug, error, info, trace, warn};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How long the loop sleeps when no client is waiting.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn prepare_stream(stream: &TcpStream, read_timeout: Duration) -> std::io::Result<()> {
    // Accepted sockets inherit the listener's nonblocking flag on some platforms
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(read_timeout))?;
    Ok(())
}

pub fn run_server(
    config: Config,
    shutdown_rx: Option<mpsc::Receiver<()>>,
    addr_tx: Option<mpsc::Sender<SocketAddr>>,
) -> Result<(), AppError> {
    if !config.root.is_dir() {
        return Err(AppError::DirectoryNotFound(
            config.root.to_string_lossy().into_owned(),
        ));
    }

    let upload_root = config.upload_root();
    ensure_dir(&upload_root)?;
    trace!("Upload directory ready: {}", upload_root.display());

    let handler = Handler::new(&config);
    let read_timeout = config.read_timeout();

    let bind_address = config.bind_address();
    debug!("Binding server to address: {bind_address}");
    let listener = TcpListener::bind(&bind_address)?;
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    if let Some(tx) = addr_tx
        && tx.send(local_addr).is_err()
    {
        return Err(AppError::InvalidConfiguration(
            "Failed to send server address to caller".to_string(),
        ));
    }

    info!(
        "Server started on http://{local_addr} (uploads in '{}')",
        upload_root.display()
    );

    let mut handled: u64 = 0;
    'server_loop: loop {
        if let Some(ref rx) = shutdown_rx
            && rx.try_recv().is_ok()
        {
            info!("Shutdown signal received. Shutting down.");
            break 'server_loop;
        }

        match listener.accept() {
            Ok((mut stream, peer_addr)) => {
                let log_prefix = format!("[{peer_addr}]");
                info!("{log_prefix} Client connected.");

                if let Err(e) = prepare_stream(&stream, read_timeout) {
                    error!("{log_prefix} Failed to configure stream: {e}");
                    continue;
                }

                let start_time = Instant::now();
                match handler.handle_connection(&mut stream, &log_prefix) {
                    Ok(bytes) => debug!("{log_prefix} Wrote {bytes} response bytes"),
                    Err(e) => warn!("{log_prefix} Client handling error: {e}"),
                }
                drop(stream);

                handled += 1;
                info!(
                    "{log_prefix} Client request handled in {:?}.",
                    start_time.elapsed()
                );
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                error!("Error accepting connection: {e}");
            }
        }
    }

    info!("Handled {handled} connections");
    Ok(())
}
