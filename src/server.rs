use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;

use tokio::net::UnixListener;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Concurrency;
use crate::error::ServeError;
use crate::ports;
use crate::push::Pusher;

mod request;

/// World-accessible: delivery agents run as arbitrary local users.
const SOCKET_MODE: u32 = 0o777;

/// Binds the notify socket, replacing whatever was left at `path`.
pub fn bind(path: &Path) -> Result<UnixListener, ServeError> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), "failed to remove stale socket: {err}"),
    }
    let listener = UnixListener::bind(path).map_err(|source| ServeError::Bind {
        path: path.to_path_buf(),
        source,
    })?;
    if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(SOCKET_MODE))
    {
        warn!(path = %path.display(), "failed to open socket permissions: {err}");
    }
    Ok(listener)
}

/// Accepts notify requests until accepting fails.
///
/// Serialized mode handles each connection on the accept loop itself.
/// Concurrent mode spawns a task per connection and stops accepting while
/// `max_in_flight` requests are running.
pub async fn serve<S, T>(
    listener: UnixListener,
    pusher: Pusher<S, T>,
    concurrency: Concurrency,
) -> Result<(), ServeError>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let admission = match concurrency {
        Concurrency::Serialized => None,
        Concurrency::Concurrent { max_in_flight } => Some(Arc::new(Semaphore::new(max_in_flight))),
    };
    info!(?concurrency, "waiting for requests");

    loop {
        let (stream, _) = listener.accept().await.map_err(ServeError::Accept)?;
        match &admission {
            None => request::handle(stream, &pusher).await,
            Some(admission) => {
                let permit = Arc::clone(admission).acquire_owned().await?;
                let pusher = pusher.clone();
                tokio::spawn(async move {
                    request::handle(stream, &pusher).await;
                    drop(permit);
                });
            }
        }
    }
}
