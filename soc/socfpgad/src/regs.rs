//! Register offsets and bit definitions for the SoCFPGA system, reset and clock managers.
//!
//! Cyclone 5 and Arria 5 share one layout; Arria 10 moves most of it. Offsets are in bytes from
//! the start of the owning control block.

use bitflags::bitflags;

// System manager
pub const SYSMGR_SILICON_ID1: u32 = 0x00;
pub const SYSMGR_SILICON_ID1_REV_MASK: u32 = 0x0000_ffff;
pub const SYSMGR_SILICON_ID1_REV_SHIFT: u32 = 0;
pub const SYSMGR_SILICON_ID1_ID_MASK: u32 = 0xffff_0000;
pub const SYSMGR_SILICON_ID1_ID_SHIFT: u32 = 16;
pub const SOCFPGA_ID_DEFAULT: u32 = 0x1;
pub const SOCFPGA_REVISION_DEFAULT: u32 = 0x1;

/// Cyclone 5 / Arria 5 EMAC group control, one PHYSEL field per port.
pub const SYSMGR_EMACGRP_CTRL: u32 = 0x60;
pub const SYSMGR_EMACGRP_CTRL_PHYSEL_WIDTH: u32 = 2;
pub const SYSMGR_EMACGRP_CTRL_PHYSEL_MASK: u32 = 0x3;

/// Arria 10 per-port EMAC control registers.
pub const SYSMGR_A10_EMAC0_CTRL: u32 = 0x44;
pub const SYSMGR_A10_EMAC1_CTRL: u32 = 0x48;
pub const SYSMGR_A10_EMAC2_CTRL: u32 = 0x4c;

// Reset manager
pub const RSTMGR_CTRL: u32 = 0x04;
pub const RSTMGR_PERMODRST: u32 = 0x14;
pub const RSTMGR_A10_CTRL: u32 = 0x0c;
pub const RSTMGR_A10_PER0MODRST: u32 = 0x24;
pub const RSTMGR_A10_PER1MODRST: u32 = 0x28;

// Clock manager
/// Peripheral PLL clock enables, Cyclone 5 / Arria 5 only.
pub const CLKMGR_PERPLL_EN: u32 = 0xa0;
pub const CLKMGR_PERPLL_EN_ALL: u32 = 0xffff;

bitflags! {
    /// Peripheral module reset bits. A set bit holds the module in reset.
    ///
    /// EMAC0 and EMAC1 sit at the same place in the Cyclone 5 PERMODRST and the Arria 10
    /// PER0MODRST registers; the remaining bits only exist on Arria 10.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PerModRst: u32 {
        const EMAC0 = 1 << 0;
        const EMAC1 = 1 << 1;
        const EMAC2 = 1 << 2;
        const EMAC0_ECC = 1 << 8;
        const EMAC1_ECC = 1 << 9;
        const EMAC2_ECC = 1 << 10;
    }
}

bitflags! {
    /// Software reset requests in the reset manager CTRL register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RstMgrCtrl: u32 {
        const SWCOLDRSTREQ = 1 << 0;
        const SWWARMRSTREQ = 1 << 1;
    }
}

/// Values of a port's PHYSEL field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PhySel {
    GmiiMii = 0x0,
    Rgmii = 0x1,
    Rmii = 0x2,
}

impl PhySel {
    pub fn bits(self) -> u32 {
        self as u32
    }
}
