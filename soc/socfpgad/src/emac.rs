//! Per-port EMAC bring-up: select the MAC-to-PHY interface and release the port from reset.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use common::timeout::hold;

use crate::error::{BringupError, Result};
use crate::region::{RegisterBlock, RegisterRegion};
use crate::regs::{PhySel, SYSMGR_EMACGRP_CTRL_PHYSEL_MASK};
use crate::reset::{ResetController, ResetDomain};
use crate::variant::VariantProfile;

/// Minimum time an EMAC stays in reset, and settles after release, on Arria 10.
pub const RESET_HOLD: Duration = Duration::from_micros(1);

/// Electrical interface between a MAC and its PHY.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhyInterfaceMode {
    Mii,
    Gmii,
    Rgmii,
    RgmiiId,
    Sgmii,
    Rmii,
}

impl PhyInterfaceMode {
    /// Name used by the device tree `phy-mode` property.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mii => "mii",
            Self::Gmii => "gmii",
            Self::Rgmii => "rgmii",
            Self::RgmiiId => "rgmii-id",
            Self::Sgmii => "sgmii",
            Self::Rmii => "rmii",
        }
    }
}

impl fmt::Display for PhyInterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhyInterfaceMode {
    type Err = BringupError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "mii" => Self::Mii,
            "gmii" => Self::Gmii,
            "rgmii" => Self::Rgmii,
            "rgmii-id" => Self::RgmiiId,
            "sgmii" => Self::Sgmii,
            "rmii" => Self::Rmii,
            _ => return Err(BringupError::InvalidPhyMode(s.to_string())),
        })
    }
}

/// A port attach request resolved against the active variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortConfig {
    pub port: usize,
    pub mode: PhyInterfaceMode,
    pub encoding: PhySel,
    pub ctrl_offset: u32,
    pub physel_shift: u32,
    pub reset: ResetDomain,
}

impl PortConfig {
    /// Checks the interface mode first, then the port, so an unsupported mode is reported even
    /// for a port the variant lacks.
    pub fn resolve(profile: &VariantProfile, port: usize, mode: PhyInterfaceMode) -> Result<Self> {
        let encoding = profile.interface_mode_encoding(mode)?;
        let layout = profile.port(port)?;
        Ok(Self {
            port,
            mode,
            encoding,
            ctrl_offset: layout.ctrl_offset,
            physel_shift: layout.physel_shift,
            reset: layout.reset,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    ModeResolved,
    EccReset,
    Reset,
    ModeProgrammed,
    Released,
    Done,
    Failed,
}

/// Runs the one-shot bring-up of a single EMAC port.
///
/// The sequence is never retried: a half-applied reset sequence leaves bits in states a second
/// attempt can't infer.
pub struct EmacSequencer<'a, R> {
    profile: &'static VariantProfile,
    sys_mgr: &'a mut RegisterBlock<R>,
    resets: ResetController<'a, R>,
    state: SequenceState,
}

impl<'a, R: RegisterRegion> EmacSequencer<'a, R> {
    pub fn new(
        profile: &'static VariantProfile,
        sys_mgr: &'a mut RegisterBlock<R>,
        rst_mgr: &'a mut RegisterBlock<R>,
    ) -> Self {
        Self {
            profile,
            sys_mgr,
            resets: ResetController::new(rst_mgr, profile),
            state: SequenceState::Idle,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn run(&mut self, port: usize, mode: PhyInterfaceMode) -> Result<()> {
        let config = match PortConfig::resolve(self.profile, port, mode) {
            Ok(config) => config,
            Err(err) => {
                self.state = SequenceState::Failed;
                return Err(err);
            }
        };
        self.enter(SequenceState::ModeResolved);
        log::debug!(
            "emac{}: {} -> PHYSEL {:?}",
            config.port,
            config.mode,
            config.encoding
        );

        match config.reset.ecc {
            Some(ecc) => self.sequence_with_ecc(&config, ecc),
            None => self.sequence(&config),
        }

        self.enter(SequenceState::Done);
        Ok(())
    }

    /// Cyclone 5 / Arria 5: the port has been held in reset since machine-init, so program the
    /// interface and release it.
    fn sequence(&mut self, config: &PortConfig) {
        self.enter(SequenceState::Reset);
        self.program_mode(config);
        self.resets.deassert(&config.reset);
        self.enter(SequenceState::Released);
    }

    /// Arria 10: ECC reset wraps the main reset on both edges, and reset has a minimum pulse
    /// width before and after release.
    fn sequence_with_ecc(&mut self, config: &PortConfig, ecc: &ResetDomain) {
        self.resets.assert(ecc);
        self.enter(SequenceState::EccReset);
        self.resets.assert(&config.reset);
        self.enter(SequenceState::Reset);

        self.program_mode(config);
        hold(RESET_HOLD);

        self.resets.deassert(&config.reset);
        self.resets.deassert(ecc);
        self.enter(SequenceState::Released);

        hold(RESET_HOLD);
    }

    fn program_mode(&mut self, config: &PortConfig) {
        self.sys_mgr.write_field(
            config.ctrl_offset,
            SYSMGR_EMACGRP_CTRL_PHYSEL_MASK,
            config.physel_shift,
            config.encoding.bits(),
        );
        self.enter(SequenceState::ModeProgrammed);
    }

    fn enter(&mut self, state: SequenceState) {
        log::trace!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }
}
