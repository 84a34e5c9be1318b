//! EEPROM patching
//!
//! A patch image is written to syscon EEPROM in fixed-size blocks with
//! `EEP SET <address> <length> <data>`. The syscon only accepts these after
//! authentication.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::protocol::{ProtocolError, SerialLink, Session};

/// Bytes written per `EEP SET`
pub const DEFAULT_BLOCK_SIZE: usize = 0x40;

/// EEPROM address of the first patch region
const FIRST_REGION_ADDRESS: u32 = 0x2800;

/// Errors from [`PatchPlan::apply`]
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Session is not authenticated")]
    NotAuthenticated,

    #[error("Patch image too small: need {needed} bytes, got {actual}")]
    ImageTooSmall { needed: usize, actual: usize },

    #[error("Block size must be non-zero")]
    InvalidBlockSize,

    #[error(transparent)]
    Transport(#[from] ProtocolError),
}

/// Syscon revision whose EEPROM layout the patch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    /// CXR713: second region at 0x7400
    Cxr713,
    /// CXR714: second region at 0x4400
    Cxr714,
}

impl PatchTarget {
    fn second_region_address(&self) -> u32 {
        match self {
            PatchTarget::Cxr713 => 0x7400,
            PatchTarget::Cxr714 => 0x4400,
        }
    }
}

impl FromStr for PatchTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cxr713" => Ok(PatchTarget::Cxr713),
            "cxr714" => Ok(PatchTarget::Cxr714),
            other => Err(format!("unknown patch target '{}'", other)),
        }
    }
}

/// A contiguous slice of the image and where it lands in EEPROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRegion {
    /// Display name
    pub name: String,
    /// Offset of the region inside the patch image
    pub image_offset: usize,
    /// EEPROM address of the first byte
    pub eeprom_address: u32,
    /// Region length in bytes
    pub length: usize,
}

impl PatchRegion {
    /// Byte range of this region in the image
    pub fn image_range(&self) -> Range<usize> {
        self.image_offset..self.image_offset + self.length
    }
}

/// One `EEP SET` command derived from the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchBlock {
    /// Index into [`PatchPlan::regions`]
    pub region: usize,
    /// EEPROM address of the block
    pub address: u32,
    /// Command line to send
    pub command: String,
}

/// Outcome of writing one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReport {
    /// Index into [`PatchPlan::regions`]
    pub region: usize,
    /// EEPROM address of the block
    pub address: u32,
    /// Status returned for the `EEP SET`
    pub status: u32,
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}: {:#x}", self.address, self.status)
    }
}

/// Layout of a patch image in EEPROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    /// Bytes per `EEP SET`
    pub block_size: usize,
    /// Regions, written in order
    pub regions: Vec<PatchRegion>,
}

impl PatchPlan {
    /// Standard two-region layout: image `[0x000, 0x400)` to 0x2800 and
    /// image `[0x400, 0x1000)` to the revision-specific second area.
    pub fn for_target(target: PatchTarget) -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            regions: vec![
                PatchRegion {
                    name: "First region".to_string(),
                    image_offset: 0x000,
                    eeprom_address: FIRST_REGION_ADDRESS,
                    length: 0x400,
                },
                PatchRegion {
                    name: "Second region".to_string(),
                    image_offset: 0x400,
                    eeprom_address: target.second_region_address(),
                    length: 0xC00,
                },
            ],
        }
    }

    /// Minimum image length covering every region
    pub fn image_len(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.image_range().end)
            .max()
            .unwrap_or(0)
    }

    /// Every `EEP SET` command for `image`, in write order
    pub fn blocks(&self, image: &[u8]) -> Result<Vec<PatchBlock>, PatchError> {
        if self.block_size == 0 {
            return Err(PatchError::InvalidBlockSize);
        }
        let needed = self.image_len();
        if image.len() < needed {
            return Err(PatchError::ImageTooSmall {
                needed,
                actual: image.len(),
            });
        }

        let mut blocks = Vec::new();
        for (index, region) in self.regions.iter().enumerate() {
            let data = &image[region.image_range()];
            for (n, chunk) in data.chunks(self.block_size).enumerate() {
                let address = region.eeprom_address + (n * self.block_size) as u32;
                blocks.push(PatchBlock {
                    region: index,
                    address,
                    command: eep_set_command(address, chunk),
                });
            }
        }
        Ok(blocks)
    }

    /// Write `image` through an authenticated session.
    ///
    /// Every block is attempted once; non-zero statuses are reported in the
    /// returned list rather than aborting.
    pub fn apply<L: SerialLink>(
        &self,
        session: &mut Session<L>,
        image: &[u8],
        wait: Duration,
    ) -> Result<Vec<BlockReport>, PatchError> {
        if !session.is_authenticated() {
            return Err(PatchError::NotAuthenticated);
        }

        let blocks = self.blocks(image)?;
        let mut reports = Vec::with_capacity(blocks.len());
        for block in blocks {
            let result = session.command(&block.command, wait)?;
            if result.status != 0 {
                warn!(
                    address = block.address,
                    status = result.status,
                    "EEP SET rejected"
                );
            }
            reports.push(BlockReport {
                region: block.region,
                address: block.address,
                status: result.status,
            });
        }

        let failed = reports.iter().filter(|r| r.status != 0).count();
        info!(blocks = reports.len(), failed, "patch applied");
        Ok(reports)
    }
}

/// `EEP SET` command line: lowercase hex address, length and data
pub fn eep_set_command(address: u32, data: &[u8]) -> String {
    format!("EEP SET {:x} {:x} {}", address, data.len(), hex::encode(data))
}
