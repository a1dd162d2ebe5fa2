//! Access to the memory-mapped control blocks.
//!
//! The bring-up code never sees a raw register pointer. It gets a [`RegisterBlock`] per control
//! block, whose modifying operations all take `&mut self`, so a read-modify-write can't be
//! interleaved with another write to the same block.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use common::io::{Io, Mmio};
use common::{MemoryType, Prot};
use syscall::error::{Error, ERANGE};

use crate::regs::*;

/// The SoC control blocks this crate programs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlBlock {
    SysMgr,
    RstMgr,
    ClkMgr,
}

impl ControlBlock {
    pub const ALL: [ControlBlock; 3] = [Self::SysMgr, Self::RstMgr, Self::ClkMgr];

    /// Device tree compatible string of the node describing this block.
    pub fn compatible(self) -> &'static str {
        match self {
            Self::SysMgr => "altr,sys-mgr",
            Self::RstMgr => "altr,rst-mgr",
            Self::ClkMgr => "altr,clk-mgr",
        }
    }

    /// Bytes from the start of the block up to the end of the last register any variant uses.
    pub fn span(self) -> usize {
        let last = match self {
            Self::SysMgr => SYSMGR_EMACGRP_CTRL,
            Self::RstMgr => RSTMGR_A10_PER1MODRST,
            Self::ClkMgr => CLKMGR_PERPLL_EN,
        };
        last as usize + 4
    }
}

impl fmt::Display for ControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SysMgr => "sys-mgr",
            Self::RstMgr => "rst-mgr",
            Self::ClkMgr => "clk-mgr",
        })
    }
}

/// 32-bit register access at byte offsets within one control block.
pub trait RegisterRegion {
    fn read32(&self, offset: u32) -> u32;
    fn write32(&mut self, offset: u32, value: u32);
}

/// A control block mapped into this address space.
pub struct MmioRegion {
    virt: usize,
    size: usize,
}

impl MmioRegion {
    /// Maps `size` bytes of device memory at `phys` for `block`.
    ///
    /// Fails with `ERANGE` if `size` doesn't cover every register the crate accesses in `block`.
    ///
    /// # Safety
    ///
    /// `phys..phys + size` must be the register window of `block`, and nothing else may drive
    /// those registers while the region is alive.
    pub unsafe fn map(block: ControlBlock, phys: usize, size: usize) -> syscall::Result<Self> {
        if size < block.span() {
            log::error!("{} window {:#x} at {:#010x} is too small", block, size, phys);
            return Err(Error::new(ERANGE));
        }
        let virt = common::physmap(phys, size, Prot::RW, MemoryType::DeviceMemory)? as usize;
        Ok(Self { virt, size })
    }

    fn reg(&self, offset: u32) -> &'static mut Mmio<u32> {
        let offset = offset as usize;
        assert!(offset % 4 == 0 && offset + 4 <= self.size, "bad offset {offset:#x}");
        unsafe { Mmio::at(self.virt + offset) }
    }
}

impl Drop for MmioRegion {
    fn drop(&mut self) {
        unsafe {
            let _ = common::physunmap(self.virt as *mut (), self.size);
        }
    }
}

impl RegisterRegion for MmioRegion {
    fn read32(&self, offset: u32) -> u32 {
        self.reg(offset).read()
    }

    fn write32(&mut self, offset: u32, value: u32) {
        self.reg(offset).write(value)
    }
}

/// One recorded register write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub block: ControlBlock,
    pub offset: u32,
    pub value: u32,
    pub at: Instant,
}

/// Ordered log of every write made to a set of [`SimRegion`]s.
#[derive(Clone, Debug, Default)]
pub struct AccessLog(Rc<RefCell<Vec<Access>>>);

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<Access> {
        self.0.borrow().clone()
    }

    /// Writes as `(block, offset, value)`, without timestamps.
    pub fn entries(&self) -> Vec<(ControlBlock, u32, u32)> {
        self.0
            .borrow()
            .iter()
            .map(|access| (access.block, access.offset, access.value))
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, access: Access) {
        self.0.borrow_mut().push(access);
    }
}

/// A register file held in memory, standing in for hardware on hosts without the SoC.
///
/// Clones share their registers and log, so a caller can keep a handle to inspect state after
/// handing the region over.
#[derive(Clone, Debug)]
pub struct SimRegion {
    block: ControlBlock,
    regs: Rc<RefCell<BTreeMap<u32, u32>>>,
    log: AccessLog,
}

impl SimRegion {
    pub fn new(block: ControlBlock, log: &AccessLog) -> Self {
        Self {
            block,
            regs: Rc::default(),
            log: log.clone(),
        }
    }

    /// Presets a register without recording a write.
    pub fn with_value(self, offset: u32, value: u32) -> Self {
        self.regs.borrow_mut().insert(offset, value);
        self
    }

    pub fn peek(&self, offset: u32) -> u32 {
        self.regs.borrow().get(&offset).copied().unwrap_or(0)
    }
}

impl RegisterRegion for SimRegion {
    fn read32(&self, offset: u32) -> u32 {
        self.peek(offset)
    }

    fn write32(&mut self, offset: u32, value: u32) {
        self.regs.borrow_mut().insert(offset, value);
        self.log.push(Access {
            block: self.block,
            offset,
            value,
            at: Instant::now(),
        });
    }
}

/// Owned access to one control block.
pub struct RegisterBlock<R> {
    block: ControlBlock,
    region: R,
}

impl<R: RegisterRegion> RegisterBlock<R> {
    pub fn new(block: ControlBlock, region: R) -> Self {
        Self { block, region }
    }

    pub fn block(&self) -> ControlBlock {
        self.block
    }

    pub fn read(&self, offset: u32) -> u32 {
        self.region.read32(offset)
    }

    pub fn write(&mut self, offset: u32, value: u32) {
        log::trace!("{} +{:#04x} <- {:#010x}", self.block, offset, value);
        self.region.write32(offset, value);
    }

    /// Reads the register once, applies `f` to the local copy and writes the result back once.
    pub fn modify(&mut self, offset: u32, f: impl FnOnce(u32) -> u32) {
        let value = f(self.read(offset));
        self.write(offset, value);
    }

    pub fn set_bits(&mut self, offset: u32, bits: u32) {
        self.modify(offset, |value| value | bits);
    }

    pub fn clear_bits(&mut self, offset: u32, bits: u32) {
        self.modify(offset, |value| value & !bits);
    }

    /// Replaces the `mask`-wide field at `shift` with `value`.
    pub fn write_field(&mut self, offset: u32, mask: u32, shift: u32, value: u32) {
        self.modify(offset, |ctrl| (ctrl & !(mask << shift)) | ((value & mask) << shift));
    }
}

/// Control blocks handed over by platform discovery. Any of them may be absent.
pub struct ControlRegions<R> {
    pub sys_mgr: Option<R>,
    pub rst_mgr: Option<R>,
    pub clk_mgr: Option<R>,
}

impl<R> Default for ControlRegions<R> {
    fn default() -> Self {
        Self {
            sys_mgr: None,
            rst_mgr: None,
            clk_mgr: None,
        }
    }
}

impl ControlRegions<SimRegion> {
    /// A full set of simulated blocks sharing one access log.
    pub fn simulated(log: &AccessLog) -> Self {
        Self {
            sys_mgr: Some(SimRegion::new(ControlBlock::SysMgr, log)),
            rst_mgr: Some(SimRegion::new(ControlBlock::RstMgr, log)),
            clk_mgr: Some(SimRegion::new(ControlBlock::ClkMgr, log)),
        }
    }
}
