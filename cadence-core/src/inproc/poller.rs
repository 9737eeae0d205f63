//! Inproc poller.

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use super::context::InprocContext;
use super::socket::InprocSubSocket;
use crate::error::{CadenceError, Result};
use crate::transport::{Poller, ReadySet, SocketId, SubSocket};

/// Poller over inproc subscriber sockets.
///
/// Waits on the readiness signal of the context its first socket came from.
/// Sockets from other contexts are still scanned, but publishes on them do not
/// wake a sleeping poll.
#[derive(Debug, Default)]
pub struct InprocPoller {
    sockets: Vec<InprocSubSocket>,
    context: Option<InprocContext>,
}

impl InprocPoller {
    fn ready(&self) -> ReadySet {
        self.sockets
            .iter()
            .enumerate()
            .filter(|(_, socket)| socket.has_pending())
            .map(|(i, _)| SocketId(i))
            .collect()
    }
}

impl Poller for InprocPoller {
    type Socket = InprocSubSocket;

    fn new() -> Self {
        Self::default()
    }

    fn register_socket(&mut self, socket: InprocSubSocket) -> SocketId {
        let context = self
            .context
            .get_or_insert_with(|| socket.context().clone());
        if !context.same_context(socket.context()) {
            warn!(
                "[POLL] Socket '{}' belongs to another context; its publishes will not wake this poller",
                socket.endpoint()
            );
        }
        self.sockets.push(socket);
        SocketId(self.sockets.len() - 1)
    }

    fn poll(&mut self, timeout_ms: i32) -> Result<ReadySet> {
        let deadline = u64::try_from(timeout_ms)
            .ok()
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let Some(ctx) = self.context.as_ref() else {
            return match deadline {
                Some(deadline) => {
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    Ok(ReadySet::new())
                }
                None => Err(CadenceError::Poll(
                    "cannot wait indefinitely on a poller with no sockets".to_string(),
                )),
            };
        };

        loop {
            let seen = ctx.signal().generation();
            let ready = self.ready();
            if !ready.is_empty() {
                trace!("[POLL] {} sockets ready", ready.len());
                return Ok(ready);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(ready);
            }
            ctx.signal().wait_change(seen, deadline);
        }
    }

    fn socket_mut(&mut self, id: SocketId) -> Option<&mut InprocSubSocket> {
        self.sockets.get_mut(id.0)
    }

    fn len(&self) -> usize {
        self.sockets.len()
    }
}
