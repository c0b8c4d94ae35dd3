//! Realtime Channel: push notifications of server-side mutations.

mod channel;
mod event;
mod listeners;
mod policy;
mod socket;

pub use channel::{ChannelStatus, RealtimeChannel};
pub use event::{parse_message, EventKind, RealtimeEvent};
pub use listeners::{Listener, ListenerRegistry};
pub use policy::ReconnectPolicy;
pub use socket::{Socket, SocketConnector, WebSocketConnector};
