//! Silicon variant detection and the per-variant register layout.

use std::fmt;
use std::str::FromStr;

use crate::emac::PhyInterfaceMode;
use crate::error::{BringupError, Result};
use crate::regs::*;
use crate::reset::ResetDomain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Cyclone5,
    Arria5,
    Arria10,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Self::Cyclone5, Self::Arria5, Self::Arria10];

    /// Machine compatible string identifying this variant.
    pub fn compatible(self) -> &'static str {
        match self {
            Self::Cyclone5 => "altr,socfpga-cyclone5",
            Self::Arria5 => "altr,socfpga-arria5",
            Self::Arria10 => "altr,socfpga-arria10",
        }
    }

    pub fn profile(self) -> &'static VariantProfile {
        match self {
            Self::Cyclone5 => &CYCLONE5,
            Self::Arria5 => &ARRIA5,
            Self::Arria10 => &ARRIA10,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cyclone5 => "Cyclone 5",
            Self::Arria5 => "Arria 5",
            Self::Arria10 => "Arria 10",
        })
    }
}

impl FromStr for Variant {
    type Err = BringupError;

    fn from_str(compatible: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.compatible() == compatible)
            .ok_or_else(|| BringupError::UnknownVariant(compatible.to_string()))
    }
}

/// Picks the variant from a machine's compatible list. The first recognized entry wins, as a
/// device tree root usually also lists the generic `altr,socfpga`.
pub fn resolve_variant<'a>(compatibles: impl IntoIterator<Item = &'a str>) -> Result<Variant> {
    let mut seen = Vec::new();
    for compatible in compatibles {
        if let Ok(variant) = compatible.parse() {
            return Ok(variant);
        }
        seen.push(compatible);
    }
    Err(BringupError::UnknownVariant(seen.join(", ")))
}

/// Where one EMAC port's controls live.
#[derive(Debug)]
pub struct PortLayout {
    /// System manager register holding the port's PHYSEL field.
    pub ctrl_offset: u32,
    /// Bit position of the PHYSEL field within `ctrl_offset`.
    pub physel_shift: u32,
    pub reset: ResetDomain,
}

/// Everything about a variant the bring-up sequences need to know.
#[derive(Debug)]
pub struct VariantProfile {
    pub variant: Variant,
    /// Machine-init releases everything but the EMACs with one read-modify-write of
    /// `peripheral_resets[0]`, leaving the EMACs to the port sequencer. Otherwise every register
    /// in `peripheral_resets` is cleared outright.
    pub selective_reset: bool,
    /// Ports carry an ECC reset line next to the main one.
    pub has_ecc_reset: bool,
    pub supports_rmii: bool,
    pub peripheral_resets: &'static [u32],
    /// Reset manager register taking software restart requests.
    pub reset_ctrl: u32,
    /// Clock manager register enabling the peripheral PLL outputs before a restart.
    pub pll_enable: Option<u32>,
    ports: &'static [PortLayout],
}

impl VariantProfile {
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port(&self, port: usize) -> Result<&PortLayout> {
        self.ports.get(port).ok_or(BringupError::UnknownPort(port))
    }

    pub fn control_register_offset(&self, port: usize) -> Result<u32> {
        Ok(self.port(port)?.ctrl_offset)
    }

    pub fn reset_bitmask(&self, port: usize) -> Result<PerModRst> {
        Ok(self.port(port)?.reset.bits)
    }

    pub fn ecc_reset_bitmask(&self, port: usize) -> Result<Option<PerModRst>> {
        Ok(self.port(port)?.reset.ecc.map(|ecc| ecc.bits))
    }

    /// Main reset bits of every EMAC port.
    pub fn emac_resets(&self) -> PerModRst {
        self.ports
            .iter()
            .fold(PerModRst::empty(), |mask, port| mask | port.reset.bits)
    }

    pub fn interface_mode_encoding(&self, mode: PhyInterfaceMode) -> Result<PhySel> {
        match mode {
            PhyInterfaceMode::Rgmii | PhyInterfaceMode::RgmiiId => Ok(PhySel::Rgmii),
            PhyInterfaceMode::Mii | PhyInterfaceMode::Gmii | PhyInterfaceMode::Sgmii => {
                Ok(PhySel::GmiiMii)
            }
            // The Cyclone 5 and Arria 5 RMII path is broken in silicon.
            PhyInterfaceMode::Rmii if self.supports_rmii => Ok(PhySel::Rmii),
            PhyInterfaceMode::Rmii => Err(BringupError::UnsupportedMode(mode)),
        }
    }
}

const C5_PORTS: [PortLayout; 2] = [
    PortLayout {
        ctrl_offset: SYSMGR_EMACGRP_CTRL,
        physel_shift: 0,
        reset: ResetDomain::new("EMAC0", RSTMGR_PERMODRST, PerModRst::EMAC0),
    },
    PortLayout {
        ctrl_offset: SYSMGR_EMACGRP_CTRL,
        physel_shift: SYSMGR_EMACGRP_CTRL_PHYSEL_WIDTH,
        reset: ResetDomain::new("EMAC1", RSTMGR_PERMODRST, PerModRst::EMAC1),
    },
];

const A10_EMAC0_ECC: ResetDomain =
    ResetDomain::new("EMAC0_ECC", RSTMGR_A10_PER0MODRST, PerModRst::EMAC0_ECC);
const A10_EMAC1_ECC: ResetDomain =
    ResetDomain::new("EMAC1_ECC", RSTMGR_A10_PER0MODRST, PerModRst::EMAC1_ECC);
const A10_EMAC2_ECC: ResetDomain =
    ResetDomain::new("EMAC2_ECC", RSTMGR_A10_PER0MODRST, PerModRst::EMAC2_ECC);

const A10_PORTS: [PortLayout; 3] = [
    PortLayout {
        ctrl_offset: SYSMGR_A10_EMAC0_CTRL,
        physel_shift: 0,
        reset: ResetDomain::new("EMAC0", RSTMGR_A10_PER0MODRST, PerModRst::EMAC0)
            .with_ecc(&A10_EMAC0_ECC),
    },
    PortLayout {
        ctrl_offset: SYSMGR_A10_EMAC1_CTRL,
        physel_shift: 0,
        reset: ResetDomain::new("EMAC1", RSTMGR_A10_PER0MODRST, PerModRst::EMAC1)
            .with_ecc(&A10_EMAC1_ECC),
    },
    PortLayout {
        ctrl_offset: SYSMGR_A10_EMAC2_CTRL,
        physel_shift: 0,
        reset: ResetDomain::new("EMAC2", RSTMGR_A10_PER0MODRST, PerModRst::EMAC2)
            .with_ecc(&A10_EMAC2_ECC),
    },
];

// Arria 5 is register-compatible with Cyclone 5.
const C5_FAMILY: VariantProfile = VariantProfile {
    variant: Variant::Cyclone5,
    selective_reset: true,
    has_ecc_reset: false,
    supports_rmii: false,
    peripheral_resets: &[RSTMGR_PERMODRST],
    reset_ctrl: RSTMGR_CTRL,
    pll_enable: Some(CLKMGR_PERPLL_EN),
    ports: &C5_PORTS,
};

static CYCLONE5: VariantProfile = VariantProfile {
    variant: Variant::Cyclone5,
    ..C5_FAMILY
};

static ARRIA5: VariantProfile = VariantProfile {
    variant: Variant::Arria5,
    ..C5_FAMILY
};

static ARRIA10: VariantProfile = VariantProfile {
    variant: Variant::Arria10,
    selective_reset: false,
    has_ecc_reset: true,
    supports_rmii: true,
    peripheral_resets: &[RSTMGR_A10_PER0MODRST, RSTMGR_A10_PER1MODRST],
    reset_ctrl: RSTMGR_A10_CTRL,
    pll_enable: None,
    ports: &A10_PORTS,
};
