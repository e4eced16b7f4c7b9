use std::collections::HashMap;

use tracing::{debug, error};

use crate::config::{DispatchPolicy, RouterConfig};
use crate::core::packet::{Packet, PacketKind};
use crate::error::{ProtocolError, Result};
use crate::protocol::context::HandlerContext;
use crate::protocol::handler::{EventHandler, Priority, Target};
use crate::utils::metrics::global_metrics;

/// Handlers for one packet kind, bucketed by priority.
///
/// Identifiers are unique across all three buckets.
#[derive(Debug, Default)]
pub(crate) struct HandlerList {
    high: Vec<EventHandler>,
    medium: Vec<EventHandler>,
    low: Vec<EventHandler>,
}

impl HandlerList {
    fn bucket(&self, priority: Priority) -> &[EventHandler] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    fn bucket_mut(&mut self, priority: Priority) -> &mut Vec<EventHandler> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.iter().any(|handler| handler.id() == id)
    }

    pub(crate) fn add(&mut self, handler: EventHandler) -> Result<()> {
        if self.contains(handler.id()) {
            return Err(ProtocolError::IdentifierCollision(handler.id().to_owned()));
        }
        self.bucket_mut(handler.priority()).push(handler);
        Ok(())
    }

    /// Handlers in dispatch order: HIGH, MEDIUM, LOW, insertion order within a tier.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &EventHandler> + '_ {
        Priority::DISPATCH_ORDER
            .into_iter()
            .flat_map(move |priority| self.bucket(priority).iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every handler in order under `policy`.
    ///
    /// Handlers that already ran are never undone.
    fn call(
        &self,
        packet: &dyn Packet,
        ctx: &HandlerContext<'_>,
        policy: DispatchPolicy,
    ) -> Result<()> {
        let mut first_error = None;

        for handler in self.iter() {
            global_metrics().handler_invoked();
            if let Err(e) = handler.call(packet, ctx) {
                global_metrics().handler_error();
                error!(
                    handler = handler.id(),
                    packet = packet.packet_name(),
                    error = %e,
                    "Handler failed"
                );
                match policy {
                    DispatchPolicy::FailFast => return Err(e),
                    DispatchPolicy::RunAll => {
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Routes decoded packets to handlers registered for their kind, after the global handlers.
///
/// Built mutably, then shared read-only (e.g. behind an `Arc`) once traffic flows.
#[derive(Debug, Default)]
pub struct EventRouter {
    global: HandlerList,
    by_kind: HashMap<PacketKind, HandlerList>,
    config: RouterConfig,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Add a handler. Fails if its identifier is already bound in the target list.
    pub fn register(&mut self, handler: EventHandler) -> Result<()> {
        let list = match handler.target() {
            Target::Any => &mut self.global,
            Target::Kind(kind) => self.by_kind.entry(kind).or_default(),
        };

        let id = handler.id().to_owned();
        let priority = handler.priority();
        if let Err(e) = list.add(handler) {
            global_metrics().registration_error();
            error!(handler = %id, error = %e, "Rejected handler registration");
            return Err(e);
        }

        debug!(handler = %id, ?priority, "Registered handler");
        Ok(())
    }

    /// Invoke global handlers, then the handlers for the packet's concrete kind, with no
    /// originating connection.
    pub fn dispatch(&self, packet: &dyn Packet) -> Result<()> {
        self.dispatch_with(packet, &HandlerContext::detached())
    }

    /// Like [`dispatch`](Self::dispatch) for a packet received on the connection in `ctx`.
    pub fn dispatch_with(&self, packet: &dyn Packet, ctx: &HandlerContext<'_>) -> Result<()> {
        global_metrics().dispatch();
        let policy = self.config.dispatch_policy;

        let global = self.global.call(packet, ctx, policy);
        if policy == DispatchPolicy::FailFast && global.is_err() {
            return global;
        }

        let specific = match self.by_kind.get(&packet.kind()) {
            Some(list) => list.call(packet, ctx, policy),
            None => Ok(()),
        };

        global.and(specific)
    }

    /// Total handlers across all lists.
    pub fn handler_count(&self) -> usize {
        self.global.len() + self.by_kind.values().map(HandlerList::len).sum::<usize>()
    }

    pub fn has_handlers_for<P: Packet>(&self) -> bool {
        self.by_kind
            .get(&PacketKind::of::<P>())
            .is_some_and(|list| !list.is_empty())
    }
}
