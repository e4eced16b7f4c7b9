//! # Event Routing
//!
//! Priority-ordered, type-routed dispatch of decoded packets.
//!
//! Every [`EventHandler`] is bound to one packet kind, or to every packet, and to one
//! [`Priority`] tier. [`EventRouter::dispatch`] runs the global handlers first, then the
//! handlers of the packet's kind; within each list the order is HIGH, MEDIUM, LOW and
//! insertion order inside a tier.
//!
//! Handlers that need to answer the sender take a [`HandlerContext`], which carries the
//! connection the packet arrived on.

pub mod context;
pub mod handler;
pub mod router;

pub use context::HandlerContext;
pub use handler::{EventHandler, Priority, Target};
pub use router::EventRouter;

#[cfg(test)]
mod tests;
