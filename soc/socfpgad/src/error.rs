use syscall::error::{Error, EINVAL, ENODEV};
use thiserror::Error;

use crate::emac::PhyInterfaceMode;
use crate::region::ControlBlock;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BringupError {
    #[error("unrecognized platform identity {0:?}")]
    UnknownVariant(String),

    #[error("port {0} has no EMAC mapping on this variant")]
    UnknownPort(usize),

    #[error("interface mode {0} is not supported on this variant")]
    UnsupportedMode(PhyInterfaceMode),

    #[error("unknown phy-mode {0:?}")]
    InvalidPhyMode(String),

    #[error("{0} control region was not discovered")]
    MissingControlRegion(ControlBlock),
}

impl BringupError {
    /// The errno a device framework reports for this failure.
    pub fn errno(&self) -> i32 {
        match self {
            Self::MissingControlRegion(_) => ENODEV,
            _ => EINVAL,
        }
    }
}

impl From<BringupError> for Error {
    fn from(err: BringupError) -> Self {
        Error::new(err.errno())
    }
}

pub type Result<T, E = BringupError> = std::result::Result<T, E>;
