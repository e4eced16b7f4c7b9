//! Event handlers: a callback bound to one packet kind (or every packet) and one priority tier.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::packet::{Packet, PacketKind};
use crate::error::Result;
use crate::protocol::context::HandlerContext;

/// Priority tier. Higher tiers run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Tiers in dispatch order.
    pub const DISPATCH_ORDER: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

/// Which packets a handler receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every decoded packet (global handler)
    Any,
    Kind(PacketKind),
}

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id() -> String {
    format!("handler-{}", NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
}

type Callback =
    Box<dyn Fn(&dyn Packet, &HandlerContext<'_>) -> Result<()> + Send + Sync + 'static>;

pub struct EventHandler {
    id: String,
    priority: Priority,
    target: Target,
    callback: Callback,
}

impl EventHandler {
    /// Handler for packets of type `P`. The router only calls it with a `P`.
    pub fn on<P, F>(priority: Priority, handler: F) -> Self
    where
        P: Packet,
        F: Fn(&P) -> Result<()> + Send + Sync + 'static,
    {
        Self::on_with_context::<P, _>(priority, move |packet, _| handler(packet))
    }

    /// Like [`on`](Self::on), also receiving the connection the packet arrived on.
    pub fn on_with_context<P, F>(priority: Priority, handler: F) -> Self
    where
        P: Packet,
        F: Fn(&P, &HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: generate_id(),
            priority,
            target: Target::Kind(PacketKind::of::<P>()),
            callback: Box::new(
                move |packet: &dyn Packet, ctx: &HandlerContext<'_>| match packet
                    .downcast_ref::<P>()
                {
                    Some(packet) => handler(packet, ctx),
                    None => Ok(()),
                },
            ),
        }
    }

    /// Global handler invoked for every dispatched packet.
    pub fn any<F>(priority: Priority, handler: F) -> Self
    where
        F: Fn(&dyn Packet) -> Result<()> + Send + Sync + 'static,
    {
        Self::any_with_context(priority, move |packet, _| handler(packet))
    }

    pub fn any_with_context<F>(priority: Priority, handler: F) -> Self
    where
        F: Fn(&dyn Packet, &HandlerContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: generate_id(),
            priority,
            target: Target::Any,
            callback: Box::new(handler),
        }
    }

    /// Replace the generated identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub(crate) fn call(&self, packet: &dyn Packet, ctx: &HandlerContext<'_>) -> Result<()> {
        (self.callback)(packet, ctx)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
