//! # Physical Layout
//!
//! Arithmetic mapping a sector and replica to byte offsets in the backing
//! device.  The device holds, in order:
//!
//! 1. one sector with the sealed header,
//! 2. the primary MAC table, padded to a sector boundary,
//! 3. the primary data region,
//! 4. the secondary MAC table,
//! 5. the secondary data region.
//!
//! All of it is computed from two parameters, the sector size and the sector
//! count, which are validated once and carried in a `Geometry`.  Bit 31 of
//! the sector count is reserved, because the 32-bit tag that binds a sector
//! to its position uses that bit to distinguish the two replicas.

use crate::crypto::{ENCRYPTION_BLOCK_SIZE,MAC_TAG_SIZE};
use crate::header::HEADER_SIZE;
use crate::DYNERR;

/// Largest supported sector, bounding the single per-session buffer.
pub const MAX_SECTOR_SIZE: u32 = 65536;

const REPLICA_TAG_BIT: u32 = 0x8000_0000;

/// Enumerates layout errors.  The `Display` trait will print the equivalent long message.
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("invalid sector size")]
    InvalidSectorSize,
    #[error("invalid sector count")]
    InvalidSectorCount,
    #[error("volume exceeds addressable size")]
    VolumeTooLarge
}

#[derive(Clone,Copy,PartialEq,Debug)]
pub enum Replica {
    Primary,
    Secondary
}

impl Replica {
    pub fn other(&self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary
        }
    }
}

/// One replica of one logical sector.
#[derive(Clone,Copy,PartialEq,Debug)]
pub struct SectorAddr {
    pub index: u32,
    pub replica: Replica
}

impl SectorAddr {
    pub fn primary(index: u32) -> Self {
        Self { index, replica: Replica::Primary }
    }
    pub fn secondary(index: u32) -> Self {
        Self { index, replica: Replica::Secondary }
    }
    /// Same sector, the other replica.
    pub fn flip(&self) -> Self {
        Self { index: self.index, replica: self.replica.other() }
    }
    /// The 32-bit tag binding ciphertext and MAC to this address.  Tag 0 is
    /// reserved for the header, so the primary replica of sector `s` gets
    /// `s+1` and the secondary gets the same with bit 31 set.
    pub fn tag(&self) -> u32 {
        match self.replica {
            Replica::Primary => self.index + 1,
            Replica::Secondary => (self.index | REPLICA_TAG_BIT) + 1
        }
    }
}

/// Round `num` up to the nearest multiple of `modulus`.  A zero modulus or an
/// overflowing result is a contract violation and panics.
pub fn roundup(num: u64,modulus: u64) -> u64 {
    if modulus == 0 {
        panic!("roundup with zero modulus");
    }
    let remainder = num % modulus;
    if remainder == 0 {
        return num;
    }
    match num.checked_add(modulus - remainder) {
        Some(ans) => ans,
        None => panic!("overflow rounding {} up to a multiple of {}",num,modulus)
    }
}

/// Validated volume parameters and the derived region sizes.
#[derive(Clone,Copy)]
pub struct Geometry {
    sector_size: u32,
    sector_count: u32,
    volume_size: u64,
    mac_table_size: u64
}

impl Geometry {
    /// Validate `sector_size` and `sector_count` and derive the region sizes.
    pub fn new(sector_size: u32,sector_count: u32) -> Result<Self,DYNERR> {
        if sector_size == 0 || sector_size % ENCRYPTION_BLOCK_SIZE as u32 != 0 {
            return Err(Box::new(Error::InvalidSectorSize));
        }
        // header and its MAC must fit in one sector
        if (sector_size as usize) < HEADER_SIZE + MAC_TAG_SIZE {
            return Err(Box::new(Error::InvalidSectorSize));
        }
        // sector must fit in the session buffer
        if sector_size > MAX_SECTOR_SIZE {
            return Err(Box::new(Error::InvalidSectorSize));
        }
        if sector_count & REPLICA_TAG_BIT != 0 {
            return Err(Box::new(Error::InvalidSectorCount));
        }
        let volume_size = sector_size as u64 * sector_count as u64;
        let mac_table_size = roundup(sector_count as u64 * MAC_TAG_SIZE as u64,sector_size as u64);
        // the whole footprint must stay within a signed 64-bit range
        match (mac_table_size + volume_size).checked_mul(2).and_then(|x| x.checked_add(sector_size as u64)) {
            Some(total) if total <= i64::MAX as u64 => Ok(Self {
                sector_size,
                sector_count,
                volume_size,
                mac_table_size
            }),
            _ => Err(Box::new(Error::VolumeTooLarge))
        }
    }
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }
    pub fn volume_size(&self) -> u64 {
        self.volume_size
    }
    pub fn mac_table_size(&self) -> u64 {
        self.mac_table_size
    }
    /// Total backing-device footprint: the header sector plus two copies of
    /// the MAC table and data region.
    pub fn total_size(&self) -> u64 {
        self.sector_size as u64 + 2 * (self.mac_table_size + self.volume_size)
    }
    /// Byte offset of a replica's MAC table, which is also the start of the
    /// replica's span of the device.
    pub fn replica_base(&self,replica: Replica) -> u64 {
        match replica {
            Replica::Primary => self.sector_size as u64,
            Replica::Secondary => self.sector_size as u64 + self.mac_table_size + self.volume_size
        }
    }
    /// Byte offset of the ciphertext of `addr`.
    pub fn data_offset(&self,addr: SectorAddr) -> u64 {
        self.replica_base(addr.replica) + self.mac_table_size + addr.index as u64 * self.sector_size as u64
    }
    /// Byte offset of the MAC table entry of `addr`.
    pub fn mac_offset(&self,addr: SectorAddr) -> u64 {
        self.replica_base(addr.replica) + addr.index as u64 * MAC_TAG_SIZE as u64
    }
}
