//! # Packet Contract
//!
//! Every message type exchanged between peers implements [`Packet`]. The codec only frames the
//! packet id; the payload is produced by [`Packet::write`] and consumed by [`Packet::read`],
//! which must mirror each other field for field.
//!
//! Decoding starts from `P::default()`, so concrete packets also implement [`Default`].
//!
//! ```rust
//! use packet_delivery::core::cursor::ByteCursor;
//! use packet_delivery::core::packet::Packet;
//! use packet_delivery::error::Result;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Chat {
//!     author: String,
//!     text: String,
//! }
//!
//! impl Packet for Chat {
//!     fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
//!         cursor.write_string(&self.author)?;
//!         cursor.write_string(&self.text)
//!     }
//!
//!     fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
//!         self.author = cursor.read_string()?;
//!         self.text = cursor.read_string()?;
//!         Ok(())
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;

use crate::core::cursor::ByteCursor;
use crate::error::Result;

/// Variant tag identifying a concrete packet type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketKind(TypeId);

impl PacketKind {
    #[inline]
    pub fn of<P: Packet>() -> Self {
        Self(TypeId::of::<P>())
    }
}

impl fmt::Debug for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketKind({:?})", self.0)
    }
}

/// Runtime type information for packets behind `dyn Packet`.
///
/// Implemented for every `'static` type; never implement it by hand. Call it through
/// `&dyn Packet`: on a `Box<dyn Packet>` method resolution picks the box itself.
pub trait PacketAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn packet_name(&self) -> &'static str;
}

impl<T: Any> PacketAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn packet_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A message type that serializes its own fields through a [`ByteCursor`].
pub trait Packet: PacketAny + fmt::Debug + Send + Sync {
    /// Append this packet's payload.
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()>;

    /// Populate this packet from a payload produced by [`Packet::write`].
    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()>;

    /// Tag of the concrete runtime type.
    fn kind(&self) -> PacketKind {
        PacketKind(self.as_any().type_id())
    }
}

impl dyn Packet {
    /// Borrow the concrete packet if it is a `P`.
    pub fn downcast_ref<P: Packet>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }

    pub fn is<P: Packet>(&self) -> bool {
        self.as_any().is::<P>()
    }
}
