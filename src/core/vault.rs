//! # Packet Vault
//!
//! Ordered registry of packet types. Registration order assigns dense, 0-based ids; the
//! vault keeps both directions of the mapping plus a constructor for every id so the decoder
//! can build a fresh instance without reflection.
//!
//! Both peers must register the same types in the same order before any connection goes
//! live. Nothing is negotiated on the wire: a mismatch surfaces as
//! [`ProtocolError::UnknownId`] or as garbage payloads, and the connection must be closed.
//!
//! ```rust
//! # use packet_delivery::core::cursor::ByteCursor;
//! # use packet_delivery::core::packet::Packet;
//! # use packet_delivery::error::Result;
//! use packet_delivery::core::vault::PacketVault;
//!
//! # #[derive(Debug, Default)] struct Ping;
//! # impl Packet for Ping {
//! #     fn write(&self, _: &mut ByteCursor<'_>) -> Result<()> { Ok(()) }
//! #     fn read(&mut self, _: &mut ByteCursor<'_>) -> Result<()> { Ok(()) }
//! # }
//! let mut vault = PacketVault::new();
//! assert_eq!(vault.register::<Ping>().unwrap(), 0);
//! assert!(vault.register::<Ping>().is_err());
//! ```

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::packet::{Packet, PacketKind};
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Wire identifier of a registered packet type.
pub type PacketId = u32;

type Factory = fn() -> Box<dyn Packet>;

fn instantiate_default<P: Packet + Default>() -> Box<dyn Packet> {
    Box::new(P::default())
}

/// What the vault knows about one registered type.
#[derive(Debug, Clone, Copy)]
pub struct PacketDescriptor {
    pub kind: PacketKind,
    pub name: &'static str,
    factory: Factory,
}

impl PacketDescriptor {
    /// A fresh zero-valued instance of this type.
    pub fn instantiate(&self) -> Box<dyn Packet> {
        (self.factory)()
    }
}

#[derive(Debug, Default)]
pub struct PacketVault {
    packets: Vec<PacketDescriptor>,
    ids: HashMap<PacketKind, PacketId>,
}

impl PacketVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with<P: Packet + Default>(mut self) -> Result<Self> {
        self.register::<P>()?;
        Ok(self)
    }

    /// Append `P` and return its id. Registering the same type twice is rejected.
    pub fn register<P: Packet + Default>(&mut self) -> Result<PacketId> {
        let kind = PacketKind::of::<P>();
        let name = std::any::type_name::<P>();

        if self.ids.contains_key(&kind) {
            global_metrics().registration_error();
            warn!(packet = name, "Rejected duplicate packet registration");
            return Err(ProtocolError::DuplicatePacket(name));
        }

        let id = PacketId::try_from(self.packets.len())
            .map_err(|_| ProtocolError::LengthOverflow(self.packets.len()))?;
        self.packets.push(PacketDescriptor {
            kind,
            name,
            factory: instantiate_default::<P>,
        });
        self.ids.insert(kind, id);

        debug!(packet = name, id, "Registered packet type");
        Ok(id)
    }

    /// Id of a packet kind; fails if the kind was never registered here.
    pub fn id_of(&self, kind: PacketKind) -> Result<PacketId> {
        self.ids
            .get(&kind)
            .copied()
            .ok_or(ProtocolError::UnknownType("<unregistered packet kind>"))
    }

    /// Id of `P`, reporting the type name on a miss.
    pub fn id_of_type<P: Packet>(&self) -> Result<PacketId> {
        self.ids
            .get(&PacketKind::of::<P>())
            .copied()
            .ok_or(ProtocolError::UnknownType(std::any::type_name::<P>()))
    }

    /// Id of the packet's concrete runtime type.
    pub fn id_of_packet(&self, packet: &dyn Packet) -> Result<PacketId> {
        self.ids
            .get(&packet.kind())
            .copied()
            .ok_or_else(|| ProtocolError::UnknownType(packet.packet_name()))
    }

    /// Descriptor registered under `id`. A miss means the peers' vaults disagree.
    pub fn type_of(&self, id: PacketId) -> Result<&PacketDescriptor> {
        self.packets
            .get(id as usize)
            .ok_or(ProtocolError::UnknownId(id))
    }

    /// Build a zero-valued instance of the type registered under `id`.
    pub fn instantiate(&self, id: PacketId) -> Result<Box<dyn Packet>> {
        self.type_of(id).map(PacketDescriptor::instantiate)
    }

    pub fn name_of(&self, id: PacketId) -> Option<&'static str> {
        self.packets.get(id as usize).map(|d| d.name)
    }

    pub fn contains<P: Packet>(&self) -> bool {
        self.ids.contains_key(&PacketKind::of::<P>())
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Registered types in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PacketId, &PacketDescriptor)> + '_ {
        self.packets
            .iter()
            .enumerate()
            .map(|(idx, descriptor)| (idx as PacketId, descriptor))
    }
}
