//! Reset manager access. Nothing else in the crate writes reset manager registers.

use crate::region::{RegisterBlock, RegisterRegion};
use crate::regs::{PerModRst, RstMgrCtrl};
use crate::variant::VariantProfile;

/// A named group of reset bits in one reset manager register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetDomain {
    pub name: &'static str,
    pub offset: u32,
    pub bits: PerModRst,
    /// ECC reset line sequenced alongside this one, if the silicon has it.
    pub ecc: Option<&'static ResetDomain>,
}

impl ResetDomain {
    pub const fn new(name: &'static str, offset: u32, bits: PerModRst) -> Self {
        Self {
            name,
            offset,
            bits,
            ecc: None,
        }
    }

    pub const fn with_ecc(mut self, ecc: &'static ResetDomain) -> Self {
        self.ecc = Some(ecc);
        self
    }
}

pub struct ResetController<'a, R> {
    regs: &'a mut RegisterBlock<R>,
    profile: &'static VariantProfile,
}

impl<'a, R: RegisterRegion> ResetController<'a, R> {
    pub fn new(regs: &'a mut RegisterBlock<R>, profile: &'static VariantProfile) -> Self {
        Self { regs, profile }
    }

    /// Takes every peripheral out of reset at machine-init.
    ///
    /// With selective reset the EMAC bits stay asserted: the port sequencer releases each EMAC
    /// after programming its PHY interface, and releasing them here would race that step.
    pub fn release_all_peripherals(&mut self) {
        let profile = self.profile;
        if profile.selective_reset {
            let emacs = profile.emac_resets();
            for &offset in profile.peripheral_resets {
                self.regs.modify(offset, |_| emacs.bits());
            }
            log::debug!("released all peripherals except {:?}", emacs);
        } else {
            for &offset in profile.peripheral_resets {
                self.regs.write(offset, 0);
            }
            log::debug!("released all peripherals");
        }
    }

    pub fn assert(&mut self, domain: &ResetDomain) {
        log::trace!("assert reset {}", domain.name);
        self.regs.set_bits(domain.offset, domain.bits.bits());
    }

    pub fn deassert(&mut self, domain: &ResetDomain) {
        log::trace!("deassert reset {}", domain.name);
        self.regs.clear_bits(domain.offset, domain.bits.bits());
    }

    pub fn is_asserted(&self, domain: &ResetDomain) -> bool {
        PerModRst::from_bits_retain(self.regs.read(domain.offset)).contains(domain.bits)
    }

    /// Sets a software reset request in the variant's CTRL register. The SoC resets as soon as
    /// the write lands.
    pub fn request_restart(&mut self, request: RstMgrCtrl) {
        log::info!("requesting restart {:?}", request);
        self.regs.set_bits(self.profile.reset_ctrl, request.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{AccessLog, ControlBlock, SimRegion};
    use crate::regs::*;
    use crate::variant::Variant;

    fn rst_mgr(log: &AccessLog) -> (SimRegion, RegisterBlock<SimRegion>) {
        let sim = SimRegion::new(ControlBlock::RstMgr, log)
            .with_value(RSTMGR_PERMODRST, 0xffff_ffff)
            .with_value(RSTMGR_A10_PER0MODRST, 0xffff_ffff)
            .with_value(RSTMGR_A10_PER1MODRST, 0xffff_ffff);
        (sim.clone(), RegisterBlock::new(ControlBlock::RstMgr, sim))
    }

    #[test]
    fn selective_release_keeps_emacs_in_reset() {
        for variant in [Variant::Cyclone5, Variant::Arria5] {
            let log = AccessLog::new();
            let (sim, mut regs) = rst_mgr(&log);
            ResetController::new(&mut regs, variant.profile()).release_all_peripherals();

            assert_eq!(log.entries(), [(ControlBlock::RstMgr, RSTMGR_PERMODRST, 0x3)]);
            let value = PerModRst::from_bits_retain(sim.peek(RSTMGR_PERMODRST));
            assert!(value.contains(PerModRst::EMAC0 | PerModRst::EMAC1));
        }
    }

    #[test]
    fn selective_release_asserts_emacs_that_were_running() {
        let log = AccessLog::new();
        let sim = SimRegion::new(ControlBlock::RstMgr, &log).with_value(RSTMGR_PERMODRST, 0x7c);
        let mut regs = RegisterBlock::new(ControlBlock::RstMgr, sim.clone());
        ResetController::new(&mut regs, Variant::Cyclone5.profile()).release_all_peripherals();
        assert_eq!(sim.peek(RSTMGR_PERMODRST), 0x3);
    }

    #[test]
    fn blanket_release_zeroes_both_groups() {
        let log = AccessLog::new();
        let (sim, mut regs) = rst_mgr(&log);
        ResetController::new(&mut regs, Variant::Arria10.profile()).release_all_peripherals();

        assert_eq!(
            log.entries(),
            [
                (ControlBlock::RstMgr, RSTMGR_A10_PER0MODRST, 0),
                (ControlBlock::RstMgr, RSTMGR_A10_PER1MODRST, 0),
            ]
        );
        assert_eq!(sim.peek(RSTMGR_PERMODRST), 0xffff_ffff);
    }

    #[test]
    fn assert_and_deassert_touch_one_domain() {
        let log = AccessLog::new();
        let sim = SimRegion::new(ControlBlock::RstMgr, &log).with_value(RSTMGR_PERMODRST, 0x1);
        let mut regs = RegisterBlock::new(ControlBlock::RstMgr, sim.clone());
        let profile = Variant::Cyclone5.profile();
        let emac1 = &profile.port(1).unwrap().reset;

        let mut resets = ResetController::new(&mut regs, profile);
        resets.assert(emac1);
        assert!(resets.is_asserted(emac1));
        resets.deassert(emac1);
        assert!(!resets.is_asserted(emac1));

        assert_eq!(sim.peek(RSTMGR_PERMODRST), 0x1);
    }

    #[test]
    fn restart_request_keeps_other_ctrl_bits() {
        let log = AccessLog::new();
        let sim = SimRegion::new(ControlBlock::RstMgr, &log)
            .with_value(RSTMGR_CTRL, 0x10)
            .with_value(RSTMGR_A10_CTRL, 0x10);

        let mut regs = RegisterBlock::new(ControlBlock::RstMgr, sim.clone());
        ResetController::new(&mut regs, Variant::Arria5.profile())
            .request_restart(RstMgrCtrl::SWCOLDRSTREQ);
        ResetController::new(&mut regs, Variant::Arria10.profile())
            .request_restart(RstMgrCtrl::SWWARMRSTREQ);

        assert_eq!(
            log.entries(),
            [
                (ControlBlock::RstMgr, RSTMGR_CTRL, 0x11),
                (ControlBlock::RstMgr, RSTMGR_A10_CTRL, 0x12),
            ]
        );
    }
}
