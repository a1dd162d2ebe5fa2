//! Machine-init bring-up for the Altera SoCFPGA family (Cyclone 5, Arria 5, Arria 10).
//!
//! Releases peripheral resets, programs each EMAC's PHY interface mode with the reset ordering
//! its variant requires, and provides skew fixups for the Micrel PHYs found on the development
//! boards.

pub mod bringup;
pub mod emac;
pub mod error;
pub mod phy;
pub mod region;
pub mod regs;
pub mod reset;
pub mod variant;

pub use bringup::{Bringup, RestartMode, SiliconId};
pub use emac::{EmacSequencer, PhyInterfaceMode, PortConfig, SequenceState, RESET_HOLD};
pub use error::BringupError;
pub use phy::{phy_uid, FixupRegistry, PhyBus, PhyFixup};
pub use region::{
    AccessLog, ControlBlock, ControlRegions, MmioRegion, RegisterBlock, RegisterRegion, SimRegion,
};
pub use variant::{resolve_variant, Variant, VariantProfile};
