//! # Backing Devices
//!
//! A volume sits on top of an object implementing the `BlockDevice` trait.
//! The device is an opaque byte store; it never interprets sectors, MACs, or
//! the header.  Besides storage it supplies the session's entropy, so hosts
//! with unusual random sources (hardware RNG, test fixtures) can inject them
//! at the same seam.
//!
//! Two implementations are provided.  `MemoryDevice` keeps the whole device
//! in a byte buffer and is what the test suite runs against.  `FileDevice`
//! maps the device onto a host file and is what the CLI uses.

use std::fs;
use std::io::{Read,Seek,SeekFrom,Write};
use rand::rngs::OsRng;
use rand::RngCore;
use crate::{STDRESULT,DYNERR};

/// Enumerates device errors.  The `Display` trait will print the equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("access past end of device")]
    OutOfBounds
}

/// A byte-addressable random-access store holding one volume.
///
/// Transfers are exact: a range extending past the end of the device is an
/// error and no bytes are transferred.  On a reported success the bytes are
/// durable as far as the device can promise.
pub trait BlockDevice {
    /// Read exactly `dst.len()` bytes starting at `offset`.
    fn physical_read(&mut self,dst: &mut [u8],offset: u64) -> STDRESULT;
    /// Write all of `src` starting at `offset`.
    fn physical_write(&mut self,offset: u64,src: &[u8]) -> STDRESULT;
    /// Fill `dst` with cryptographically secure random bytes.  Must not fail.
    fn read_urandom(&mut self,dst: &mut [u8]);
}

/// Fixed-size in-memory device, initially all zero.
#[derive(Clone)]
pub struct MemoryDevice {
    data: Vec<u8>
}

impl MemoryDevice {
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0;len]
        }
    }
    fn check(&self,offset: u64,len: usize) -> STDRESULT {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.data.len() as u64 => Ok(()),
            _ => Err(Box::new(Error::OutOfBounds))
        }
    }
}

impl BlockDevice for MemoryDevice {
    fn physical_read(&mut self,dst: &mut [u8],offset: u64) -> STDRESULT {
        self.check(offset,dst.len())?;
        let beg = offset as usize;
        dst.copy_from_slice(&self.data[beg..beg+dst.len()]);
        Ok(())
    }
    fn physical_write(&mut self,offset: u64,src: &[u8]) -> STDRESULT {
        self.check(offset,src.len())?;
        let beg = offset as usize;
        self.data[beg..beg+src.len()].copy_from_slice(src);
        Ok(())
    }
    fn read_urandom(&mut self,dst: &mut [u8]) {
        OsRng.fill_bytes(dst);
    }
}

/// File-backed device.  The file length is the device size.
pub struct FileDevice {
    file: fs::File,
    len: u64
}

impl FileDevice {
    /// Create or truncate a file of exactly `len` bytes.
    pub fn create(path: &str,len: u64) -> Result<Self,DYNERR> {
        let file = fs::OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
        file.set_len(len)?;
        Ok(Self {
            file,
            len
        })
    }
    /// Open an existing file; its current length is the device size.
    pub fn open(path: &str) -> Result<Self,DYNERR> {
        let file = fs::OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len
        })
    }
    fn check(&self,offset: u64,len: usize) -> STDRESULT {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(Box::new(Error::OutOfBounds))
        }
    }
}

impl BlockDevice for FileDevice {
    fn physical_read(&mut self,dst: &mut [u8],offset: u64) -> STDRESULT {
        self.check(offset,dst.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(dst)?;
        Ok(())
    }
    fn physical_write(&mut self,offset: u64,src: &[u8]) -> STDRESULT {
        self.check(offset,src.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(src)?;
        Ok(())
    }
    fn read_urandom(&mut self,dst: &mut [u8]) {
        OsRng.fill_bytes(dst);
    }
}
