//! Named publish routing.

use std::fmt;

use hashbrown::HashMap;
use tracing::{debug, trace};

use cadence_core::error::{CadenceError, Result};
use cadence_core::inproc::InprocTransport;
use cadence_core::message::Message;
use cadence_core::transport::{PubSocket, Transport};

use crate::framing::MessageBuilder;

pub use cadence_core::options::MSG_MULTIPLE_PUBLISHERS;

/// One publisher socket per configured topic, addressed by name.
pub struct PubMaster<T: Transport = InprocTransport> {
    sockets: HashMap<String, T::PubSocket>,
    order: Vec<String>,
}

impl<T: Transport> PubMaster<T> {
    /// Open a publisher for every topic in `topics`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::InvalidConfig`] for duplicate topics and the
    /// connect error of the first topic that fails to open.
    pub fn new<I, S>(context: &T::Context, topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sockets = HashMap::new();
        let mut order = Vec::new();

        for name in topics {
            let name = name.as_ref();
            if sockets.contains_key(name) {
                return Err(CadenceError::invalid_config(format!(
                    "topic '{name}' is listed twice"
                )));
            }
            let socket = <T::PubSocket as PubSocket>::connect(context, name)?;
            sockets.insert(name.to_string(), socket);
            order.push(name.to_string());
        }

        debug!("[PubMaster] Publishing {} topics over {}", order.len(), T::NAME);
        Ok(Self { sockets, order })
    }

    fn socket_mut(&mut self, name: &str) -> Result<&mut T::PubSocket> {
        self.sockets
            .get_mut(name)
            .ok_or_else(|| CadenceError::unknown_topic(name))
    }

    /// Flatten `builder` and publish it on `name`.
    ///
    /// Returns the number of bytes handed to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::UnknownTopic`] before touching the transport if
    /// `name` is not configured, otherwise the transport's send error.
    pub fn send(&mut self, name: &str, builder: &mut MessageBuilder) -> Result<usize> {
        let socket = self.socket_mut(name)?;
        let sent = socket.send(builder.to_bytes())?;
        trace!("[PubMaster] '{}' sent {} bytes", name, sent);
        Ok(sent)
    }

    /// Publish already flattened bytes on `name`.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_bytes(&mut self, name: &str, data: &[u8]) -> Result<usize> {
        self.socket_mut(name)?.send(data)
    }

    /// Publish a prepared frame on `name`.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_message(&mut self, name: &str, message: &Message) -> Result<usize> {
        self.socket_mut(name)?.send_message(message)
    }

    /// Configured topics in configuration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<T: Transport> fmt::Debug for PubMaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubMaster")
            .field("transport", &T::NAME)
            .field("topics", &self.order)
            .finish()
    }
}
