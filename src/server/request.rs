use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use crate::error::RequestError;
use crate::ports;
use crate::push::Pusher;
use crate::push::subscriptions::{self, Listing};

/// Serves one notify request: a mailbox path on a single line, answered with
/// a single summary line. The connection is shut down on every path out.
pub(crate) async fn handle<C, S, T>(mut conn: C, pusher: &Pusher<S, T>)
where
    C: AsyncRead + AsyncWrite + Unpin,
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    match read_request(&mut conn).await {
        Ok(mailbox) => {
            let mut reply = Reply::new(&mut conn);
            respond(&mailbox, pusher, &mut reply).await;
            reply.write(b"\n").await;
        }
        Err(err) => warn!("{err}"),
    }
    if let Err(err) = conn.shutdown().await {
        warn!("failed to close connection: {err}");
    }
}

/// Reads the mailbox path as raw bytes; paths need not be UTF-8.
async fn read_request<C>(conn: &mut C) -> Result<Vec<u8>, RequestError>
where
    C: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(conn);
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).await? == 0 {
        return Err(RequestError::Closed);
    }
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    if line.is_empty() {
        return Err(RequestError::Empty);
    }
    Ok(line)
}

async fn respond<W, S, T>(mailbox: &[u8], pusher: &Pusher<S, T>, reply: &mut Reply<'_, W>)
where
    W: AsyncWrite + Unpin,
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let path = Path::new(OsStr::from_bytes(mailbox));
    info!(mailbox = %path.display(), "push requested");
    let entries = match subscriptions::list(path).await {
        Listing::Disabled => {
            reply.write(b"Push ").await;
            reply.write(mailbox).await;
            reply.write(b" disabled").await;
            info!(mailbox = %path.display(), "push disabled");
            return;
        }
        Listing::Entries(entries) => entries,
    };

    reply.write(b"Push ").await;
    reply.write(mailbox).await;
    reply.write(b" to").await;
    for entry in entries {
        let record = match subscriptions::load(&entry).await {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping subscription: {err}");
                continue;
            }
        };
        let device = record.subscription.token_prefix();
        let fragment = match pusher.push_record(&record).await {
            Ok(response) => format!(" {device} ({})", response.status),
            Err(err) => {
                error!(mailbox = %path.display(), device, "push failed: {err}");
                format!(" {device} (error)")
            }
        };
        reply.write(fragment.as_bytes()).await;
    }
}

/// Response line under construction. Once the peer stops reading, further
/// writes are dropped so the remaining subscriptions are still processed.
struct Reply<'a, W> {
    writer: &'a mut W,
    broken: bool,
}

impl<'a, W> Reply<'a, W>
where
    W: AsyncWrite + Unpin,
{
    fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            broken: false,
        }
    }

    async fn write(&mut self, bytes: &[u8]) {
        if self.broken {
            return;
        }
        if let Err(err) = self.writer.write_all(bytes).await {
            warn!("failed to write response: {err}");
            self.broken = true;
        }
    }
}
