use crate::emac::{EmacSequencer, PhyInterfaceMode};
use crate::error::{BringupError, Result};
use crate::phy::FixupRegistry;
use crate::region::{ControlBlock, ControlRegions, RegisterBlock, RegisterRegion};
use crate::regs::*;
use crate::reset::ResetController;
use crate::variant::{resolve_variant, Variant, VariantProfile};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiliconId {
    pub id: u32,
    pub revision: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartMode {
    Warm,
    Cold,
}

/// Machine-level peripheral bring-up.
///
/// [`Bringup::run`] is called once at machine-init; [`Bringup::attach_port`] once per EMAC as the
/// device framework attaches it. Both borrow `self` mutably, which serializes every
/// read-modify-write on the shared manager registers.
pub struct Bringup<R> {
    profile: Option<&'static VariantProfile>,
    /// Why `profile` is unset after `run`.
    unresolved: Option<BringupError>,
    sys_mgr: Option<RegisterBlock<R>>,
    rst_mgr: Option<RegisterBlock<R>>,
    clk_mgr: Option<RegisterBlock<R>>,
    fixups: FixupRegistry,
}

impl<R: RegisterRegion> Bringup<R> {
    pub fn new(regions: ControlRegions<R>) -> Self {
        Self {
            profile: None,
            unresolved: None,
            sys_mgr: regions
                .sys_mgr
                .map(|r| RegisterBlock::new(ControlBlock::SysMgr, r)),
            rst_mgr: regions
                .rst_mgr
                .map(|r| RegisterBlock::new(ControlBlock::RstMgr, r)),
            clk_mgr: regions
                .clk_mgr
                .map(|r| RegisterBlock::new(ControlBlock::ClkMgr, r)),
            fixups: FixupRegistry::new(),
        }
    }

    pub fn variant(&self) -> Option<Variant> {
        self.profile.map(|profile| profile.variant)
    }

    pub fn fixups(&self) -> &FixupRegistry {
        &self.fixups
    }

    /// Machine-init: pick the variant from the machine's compatible strings, release peripheral
    /// resets and register the PHY fixups. Failures are logged and skip only the steps that
    /// depend on them.
    pub fn run<'a>(&mut self, compatibles: impl IntoIterator<Item = &'a str>) {
        if let Some(profile) = self.profile {
            log::warn!("machine-init already ran for {}", profile.variant);
            return;
        }
        match resolve_variant(compatibles) {
            Ok(variant) => {
                log::info!("SoCFPGA {}", variant);
                self.profile = Some(variant.profile());
            }
            Err(err) => {
                log::error!("{}, leaving peripherals unconfigured", err);
                self.unresolved = Some(err);
            }
        }

        let SiliconId { id, revision } = self.silicon_id();
        log::info!("silicon id {} revision {}", id, revision);

        if let Err(err) = self.release_peripherals() {
            log::error!("peripheral reset release skipped: {}", err);
        }

        self.fixups.register_builtin();
    }

    fn release_peripherals(&mut self) -> Result<()> {
        let profile = self.profile()?;
        let rst_mgr = Self::region(&mut self.rst_mgr, ControlBlock::RstMgr)?;
        ResetController::new(rst_mgr, profile).release_all_peripherals();
        Ok(())
    }

    /// Configures the interface mode of EMAC `port` and takes it out of reset.
    ///
    /// Without a recognized variant there is nothing to configure and the call succeeds.
    pub fn attach_port(&mut self, port: usize, mode: PhyInterfaceMode) -> Result<()> {
        let Some(profile) = self.profile else {
            log::debug!("emac{}: no variant, leaving {} unconfigured", port, mode);
            return Ok(());
        };
        let sys_mgr = Self::region(&mut self.sys_mgr, ControlBlock::SysMgr)?;
        let rst_mgr = Self::region(&mut self.rst_mgr, ControlBlock::RstMgr)?;

        EmacSequencer::new(profile, sys_mgr, rst_mgr).run(port, mode)?;
        log::info!("emac{}: {} ready", port, mode);
        Ok(())
    }

    /// Silicon id and revision from the system manager, or the defaults if it is absent.
    pub fn silicon_id(&self) -> SiliconId {
        match &self.sys_mgr {
            Some(sys_mgr) => {
                let raw = sys_mgr.read(SYSMGR_SILICON_ID1);
                SiliconId {
                    id: (raw & SYSMGR_SILICON_ID1_ID_MASK) >> SYSMGR_SILICON_ID1_ID_SHIFT,
                    revision: (raw & SYSMGR_SILICON_ID1_REV_MASK) >> SYSMGR_SILICON_ID1_REV_SHIFT,
                }
            }
            None => SiliconId {
                id: SOCFPGA_ID_DEFAULT,
                revision: SOCFPGA_REVISION_DEFAULT,
            },
        }
    }

    /// Requests a software warm or cold reset of the whole SoC.
    pub fn restart(&mut self, mode: RestartMode) -> Result<()> {
        let profile = self.profile()?;
        let request = match mode {
            RestartMode::Warm => RstMgrCtrl::SWWARMRSTREQ,
            RestartMode::Cold => RstMgrCtrl::SWCOLDRSTREQ,
        };

        if let Some(pll_enable) = profile.pll_enable {
            let clk_mgr = Self::region(&mut self.clk_mgr, ControlBlock::ClkMgr)?;
            clk_mgr.write(pll_enable, CLKMGR_PERPLL_EN_ALL);
        }
        let rst_mgr = Self::region(&mut self.rst_mgr, ControlBlock::RstMgr)?;
        ResetController::new(rst_mgr, profile).request_restart(request);
        Ok(())
    }

    fn profile(&self) -> Result<&'static VariantProfile> {
        self.profile.ok_or_else(|| {
            self.unresolved
                .clone()
                .unwrap_or_else(|| BringupError::UnknownVariant(String::new()))
        })
    }

    fn region(
        slot: &mut Option<RegisterBlock<R>>,
        block: ControlBlock,
    ) -> Result<&mut RegisterBlock<R>> {
        slot.as_mut().ok_or(BringupError::MissingControlRegion(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{AccessLog, SimRegion};

    #[test]
    fn silicon_id_splits_fields() {
        let log = AccessLog::new();
        let mut regions = ControlRegions::simulated(&log);
        regions.sys_mgr = regions
            .sys_mgr
            .map(|sys| sys.with_value(SYSMGR_SILICON_ID1, 0x0002_0001));
        let bringup = Bringup::new(regions);
        assert_eq!(bringup.silicon_id(), SiliconId { id: 2, revision: 1 });
    }

    #[test]
    fn silicon_id_defaults_without_system_manager() {
        let bringup = Bringup::<SimRegion>::new(ControlRegions::default());
        assert_eq!(bringup.silicon_id(), SiliconId { id: 1, revision: 1 });
    }

    #[test]
    fn run_twice_keeps_first_variant() {
        let log = AccessLog::new();
        let mut bringup = Bringup::new(ControlRegions::simulated(&log));
        bringup.run(["altr,socfpga-arria5"]);
        bringup.run(["altr,socfpga-arria10"]);
        assert_eq!(bringup.variant(), Some(Variant::Arria5));
        assert_eq!(bringup.fixups().len(), 2);
    }

    #[test]
    fn cyclone5_restart_enables_plls_first() {
        let log = AccessLog::new();
        let mut bringup = Bringup::new(ControlRegions::simulated(&log));
        bringup.run(["altr,socfpga-cyclone5"]);
        log.clear();

        bringup.restart(RestartMode::Warm).unwrap();
        assert_eq!(
            log.entries(),
            [
                (ControlBlock::ClkMgr, CLKMGR_PERPLL_EN, 0xffff),
                (ControlBlock::RstMgr, RSTMGR_CTRL, RstMgrCtrl::SWWARMRSTREQ.bits()),
            ]
        );
    }

    #[test]
    fn arria10_restart_skips_clock_manager() {
        let log = AccessLog::new();
        let mut regions = ControlRegions::simulated(&log);
        regions.clk_mgr = None;
        let mut bringup = Bringup::new(regions);
        bringup.run(["altr,socfpga-arria10"]);
        log.clear();

        bringup.restart(RestartMode::Cold).unwrap();
        assert_eq!(
            log.entries(),
            [(ControlBlock::RstMgr, RSTMGR_A10_CTRL, RstMgrCtrl::SWCOLDRSTREQ.bits())]
        );
    }

    #[test]
    fn restart_needs_a_variant() {
        let log = AccessLog::new();
        let mut bringup = Bringup::new(ControlRegions::simulated(&log));
        bringup.run(["altr,socfpga"]);
        assert!(matches!(
            bringup.restart(RestartMode::Warm),
            Err(BringupError::UnknownVariant(_))
        ));
        assert!(log.writes().is_empty());
    }
}
