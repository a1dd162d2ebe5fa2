use anyhow::{anyhow, Context, Result};
use fdt::node::FdtNode;
use fdt::Fdt;

use socfpga::{AccessLog, Bringup, BringupError, ControlBlock, ControlRegions, PhyInterfaceMode};

#[cfg(target_os = "redox")]
type Region = socfpga::MmioRegion;
#[cfg(not(target_os = "redox"))]
type Region = socfpga::SimRegion;

/// EMAC nodes by DWMAC revision and base address. 3.70a is the Cyclone 5 / Arria 5 MAC, 3.72a
/// the Arria 10 one.
const EMAC_PORTS: [(&str, usize, usize); 5] = [
    ("snps,dwmac-3.70a", 0xff70_0000, 0),
    ("snps,dwmac-3.70a", 0xff70_2000, 1),
    ("snps,dwmac-3.72a", 0xff80_0000, 0),
    ("snps,dwmac-3.72a", 0xff80_2000, 1),
    ("snps,dwmac-3.72a", 0xff80_4000, 2),
];

const DEFAULT_REGION_SIZE: usize = 0x1000;

#[cfg(target_os = "redox")]
fn get_dtb() -> Result<Vec<u8>> {
    std::fs::read("/scheme/kernel.dtb").context("failed to read /scheme/kernel.dtb")
}

#[cfg(not(target_os = "redox"))]
fn get_dtb() -> Result<Vec<u8>> {
    let path = std::env::args()
        .nth(1)
        .context("usage: socfpgad <machine.dtb>")?;
    std::fs::read(&path).with_context(|| format!("failed to read {path}"))
}

#[cfg(target_os = "redox")]
fn map_region(
    block: ControlBlock,
    base: usize,
    size: usize,
    _access_log: &AccessLog,
) -> Result<Region> {
    unsafe { socfpga::MmioRegion::map(block, base, size) }
        .map_err(|err| anyhow!("failed to map {block} at {base:#010x}: {err}"))
}

/// Without the SoC's physical memory the sequences run against simulated registers, so a host
/// run shows exactly which writes a board would receive.
#[cfg(not(target_os = "redox"))]
fn map_region(
    block: ControlBlock,
    base: usize,
    _size: usize,
    access_log: &AccessLog,
) -> Result<Region> {
    log::debug!("simulating {} at {:#010x}", block, base);
    Ok(socfpga::SimRegion::new(block, access_log))
}

fn first_reg(node: &FdtNode<'_, '_>) -> Option<(usize, usize)> {
    let reg = node.reg()?.next()?;
    Some((
        reg.starting_address as usize,
        reg.size.unwrap_or(DEFAULT_REGION_SIZE),
    ))
}

fn string_property<'a>(node: &FdtNode<'_, 'a>, name: &str) -> Option<&'a str> {
    node.property(name).and_then(|prop| prop.as_str())
}

fn discover_regions(fdt: &Fdt<'_>, access_log: &AccessLog) -> ControlRegions<Region> {
    let mut regions = ControlRegions::default();
    for block in ControlBlock::ALL {
        let region = fdt
            .find_compatible(&[block.compatible()])
            .and_then(|node| first_reg(&node))
            .ok_or(BringupError::MissingControlRegion(block))
            .map_err(anyhow::Error::from)
            .and_then(|(base, size)| map_region(block, base, size, access_log));
        let region = match region {
            Ok(region) => Some(region),
            Err(err) => {
                log::error!("{:#}", err);
                None
            }
        };
        match block {
            ControlBlock::SysMgr => regions.sys_mgr = region,
            ControlBlock::RstMgr => regions.rst_mgr = region,
            ControlBlock::ClkMgr => regions.clk_mgr = region,
        }
    }
    regions
}

fn emac_port(node: &FdtNode<'_, '_>) -> Option<(usize, &'static str)> {
    let compatible = node.compatible()?;
    let (base, _) = first_reg(node)?;
    compatible.all().find_map(|compat| {
        EMAC_PORTS
            .iter()
            .find(|&&(name, port_base, _)| name == compat && port_base == base)
            .map(|&(name, _, port)| (port, name))
    })
}

/// Attaches every enabled EMAC in device tree order.
fn attach_ports(fdt: &Fdt<'_>, bringup: &mut Bringup<Region>) {
    for node in fdt.all_nodes() {
        let Some((port, compat)) = emac_port(&node) else {
            continue;
        };
        if string_property(&node, "status") == Some("disabled") {
            log::debug!("{}: disabled", node.name);
            continue;
        }
        log::debug!("{}: {} port {}", node.name, compat, port);

        let result = string_property(&node, "phy-mode")
            .unwrap_or_default()
            .parse::<PhyInterfaceMode>()
            .and_then(|mode| bringup.attach_port(port, mode));
        if let Err(err) = result {
            log::error!("{}: attach failed ({}): {}", node.name, err.errno(), err);
        }
    }
}

fn main() -> Result<()> {
    common::setup_logging(
        "misc",
        "soc",
        "socfpgad",
        common::output_level(),
        common::file_level(),
    );

    let dtb = get_dtb()?;
    let fdt = Fdt::new(&dtb).map_err(|err| anyhow!("failed to parse dtb: {}", err))?;
    log::info!("machine {}", fdt.root().model());

    let access_log = AccessLog::new();
    let mut bringup = Bringup::new(discover_regions(&fdt, &access_log));
    bringup.run(fdt.root().compatible().all());
    log::info!("{} PHY fixups registered", bringup.fixups().len());

    attach_ports(&fdt, &mut bringup);

    #[cfg(not(target_os = "redox"))]
    log::info!("dry run finished after {} register writes", access_log.writes().len());

    Ok(())
}
