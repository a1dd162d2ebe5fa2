//! Board-level skew fixups for Micrel gigabit PHYs.
//!
//! The skew values depend on an FPGA I/O delay of 600ps applied to the TX_CLK output towards
//! the PHY. See the Altera application notes on RGMII timing.

/// Register writes on a PHY's management bus.
pub trait PhyBus {
    fn write(&mut self, reg: u16, value: u16);
}

/// Builds the 32-bit PHY identifier from MII registers 2 (ID1) and 3 (ID2).
pub fn phy_uid(id1: u16, id2: u16) -> u32 {
    (u32::from(id1) << 16) | u32::from(id2)
}

pub const MICREL_PHY_ID_MASK: u32 = 0x00ff_fff0;
pub const PHY_ID_KSZ9021RLRN: u32 = 0x0022_1611;
pub const PHY_ID_KSZ9031: u32 = 0x0022_1620;

// KSZ9021 extended register access
const KSZ9021_EXTREG_CTRL: u16 = 11;
const KSZ9021_EXTREG_DATA_WRITE: u16 = 12;
const KSZ9021_EXTREG_WRITE: u16 = 0x8000;
const KSZ9021_RGMII_CLK_CTRL_PAD_SKEW: u16 = 260;
const KSZ9021_RGMII_RX_DATA_PAD_SKEW: u16 = 261;

// KSZ9031 MMD indirect access
const KSZ9031_MMD_ACCESS_CONTROL: u16 = 0xd;
const KSZ9031_MMD_ACCESS_DATA: u16 = 0xe;
const KSZ9031_MMD_OP_DATANOINC: u16 = 0x4000;

const KSZ9031_CLOCK_SKEW: u16 = 0x3fc;
const KSZ9031_CTRL_SKEW: u16 = 0x070;
const KSZ9031_RXD_SKEW: u16 = 0x7777;
const KSZ9031_TXD_SKEW: u16 = 0x0;

/// (MMD device, register, value), applied in order.
const KSZ9031_MMD_WRITES: [(u16, u16, u16); 6] = [
    (2, 8, KSZ9031_CLOCK_SKEW),
    (2, 4, KSZ9031_CTRL_SKEW),
    (2, 5, KSZ9031_RXD_SKEW),
    (2, 6, KSZ9031_TXD_SKEW),
    (0, 4, 0x0006),
    (0, 3, 0x1a80),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhyFixup {
    /// KSZ9021RL/RN: minimum RX data delay, maximum RX/TX clock delay, minimum control delay.
    Ksz9021,
    /// KSZ9031RNX: clock, control and data pad skews through MMD device 2.
    Ksz9031,
}

impl PhyFixup {
    pub fn apply<B: PhyBus + ?Sized>(self, bus: &mut B) {
        match self {
            Self::Ksz9021 => ksz9021_fixup(bus),
            Self::Ksz9031 => ksz9031_fixup(bus),
        }
    }
}

fn ksz9021_fixup<B: PhyBus + ?Sized>(bus: &mut B) {
    // The control write selects which extended register the next data write lands in.
    bus.write(KSZ9021_EXTREG_CTRL, KSZ9021_RGMII_RX_DATA_PAD_SKEW | KSZ9021_EXTREG_WRITE);
    bus.write(KSZ9021_EXTREG_DATA_WRITE, 0x0000);

    bus.write(KSZ9021_EXTREG_CTRL, KSZ9021_RGMII_CLK_CTRL_PAD_SKEW | KSZ9021_EXTREG_WRITE);
    bus.write(KSZ9021_EXTREG_DATA_WRITE, 0xa0d0);
    // Leave the clock/control skew register selected for reads.
    bus.write(KSZ9021_EXTREG_CTRL, KSZ9021_RGMII_CLK_CTRL_PAD_SKEW);
}

/// One MMD register write. The four accesses form a unit and must not be interleaved with other
/// MMD accesses.
fn ksz9031_write_mmd<B: PhyBus + ?Sized>(bus: &mut B, device: u16, reg: u16, value: u16) {
    bus.write(KSZ9031_MMD_ACCESS_CONTROL, device);
    bus.write(KSZ9031_MMD_ACCESS_DATA, reg);
    bus.write(KSZ9031_MMD_ACCESS_CONTROL, device | KSZ9031_MMD_OP_DATANOINC);
    bus.write(KSZ9031_MMD_ACCESS_DATA, value);
}

fn ksz9031_fixup<B: PhyBus + ?Sized>(bus: &mut B) {
    for (device, reg, value) in KSZ9031_MMD_WRITES {
        ksz9031_write_mmd(bus, device, reg, value);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhyFixupEntry {
    pub phy_id: u32,
    pub mask: u32,
    pub fixup: PhyFixup,
}

impl PhyFixupEntry {
    pub fn matches(&self, phy_id: u32) -> bool {
        phy_id & self.mask == self.phy_id & self.mask
    }
}

#[derive(Debug, Default)]
pub struct FixupRegistry {
    entries: Vec<PhyFixupEntry>,
}

impl FixupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `fixup` for PHYs matching `phy_id` under `mask`. Registering the same
    /// `(phy_id, mask)` again replaces the earlier fixup.
    pub fn register(&mut self, phy_id: u32, mask: u32, fixup: PhyFixup) {
        let entry = PhyFixupEntry {
            phy_id,
            mask,
            fixup,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.phy_id == phy_id && e.mask == mask)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        log::debug!("registered {:?} fixup for PHY {:#010x}/{:#010x}", fixup, phy_id, mask);
    }

    /// Registers the Micrel fixups used on SoCFPGA development boards.
    pub fn register_builtin(&mut self) {
        self.register(PHY_ID_KSZ9021RLRN, MICREL_PHY_ID_MASK, PhyFixup::Ksz9021);
        self.register(PHY_ID_KSZ9031, MICREL_PHY_ID_MASK, PhyFixup::Ksz9031);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, phy_id: u32) -> Option<PhyFixup> {
        self.entries
            .iter()
            .find(|entry| entry.matches(phy_id))
            .map(|entry| entry.fixup)
    }

    /// Runs the fixup registered for `phy_id`, if any. Most PHYs have none.
    pub fn apply<B: PhyBus + ?Sized>(&self, phy_id: u32, bus: &mut B) {
        if let Some(fixup) = self.lookup(phy_id) {
            log::info!("applying {:?} fixup to PHY {:#010x}", fixup, phy_id);
            fixup.apply(bus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(u16, u16)>);

    impl PhyBus for Recorder {
        fn write(&mut self, reg: u16, value: u16) {
            self.0.push((reg, value));
        }
    }

    const CTRL: u16 = 0xd;
    const DATA: u16 = 0xe;

    #[rustfmt::skip]
    const KSZ9031_LOG: [(u16, u16); 24] = [
        (CTRL, 2), (DATA, 8), (CTRL, 2 | 0x4000), (DATA, 0x3fc),
        (CTRL, 2), (DATA, 4), (CTRL, 2 | 0x4000), (DATA, 0x070),
        (CTRL, 2), (DATA, 5), (CTRL, 2 | 0x4000), (DATA, 0x7777),
        (CTRL, 2), (DATA, 6), (CTRL, 2 | 0x4000), (DATA, 0x0),
        (CTRL, 0), (DATA, 4), (CTRL, 0x4000), (DATA, 0x0006),
        (CTRL, 0), (DATA, 3), (CTRL, 0x4000), (DATA, 0x1a80),
    ];

    #[test]
    fn ksz9031_skew_writes_in_order() {
        let mut bus = Recorder::default();
        PhyFixup::Ksz9031.apply(&mut bus);
        assert_eq!(bus.0, KSZ9031_LOG);
    }

    #[test]
    fn ksz9021_selects_then_writes() {
        let mut bus = Recorder::default();
        PhyFixup::Ksz9021.apply(&mut bus);

        assert_eq!(
            bus.0,
            [
                (11, 261 | 0x8000),
                (12, 0x0000),
                (11, 260 | 0x8000),
                (12, 0xa0d0),
                (11, 0x104),
            ]
        );
    }

    #[test]
    fn lookup_masks_revision() {
        let mut registry = FixupRegistry::new();
        registry.register_builtin();
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.lookup(PHY_ID_KSZ9021RLRN), Some(PhyFixup::Ksz9021));
        assert_eq!(registry.lookup(0x0022_161f), Some(PhyFixup::Ksz9021));
        assert_eq!(registry.lookup(phy_uid(0x0022, 0x1622)), Some(PhyFixup::Ksz9031));
        // Marvell 88E1512
        assert_eq!(registry.lookup(0x0141_0dd1), None);
    }

    #[test]
    fn unmatched_phy_is_left_alone() {
        let mut registry = FixupRegistry::new();
        registry.register_builtin();
        let mut bus = Recorder::default();
        registry.apply(0x0007_c0f1, &mut bus);
        assert!(bus.0.is_empty());
    }

    #[test]
    fn reregistering_a_key_replaces_it() {
        let mut registry = FixupRegistry::new();
        registry.register(PHY_ID_KSZ9031, MICREL_PHY_ID_MASK, PhyFixup::Ksz9021);
        registry.register(PHY_ID_KSZ9031, MICREL_PHY_ID_MASK, PhyFixup::Ksz9031);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(PHY_ID_KSZ9031), Some(PhyFixup::Ksz9031));
    }
}
