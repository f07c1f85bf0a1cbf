//! # Volume Sessions
//!
//! A `Volume` is an open session imposing the secure-volume format on an
//! owned `BlockDevice`.  `create` initializes a device and leaves it closed;
//! `open` verifies the header and produces a session; `close` hands the
//! device back with all key material wiped.
//!
//! ## Replica Policy
//!
//! Every sector exists twice.  Reads try the primary replica and fall back
//! to the secondary when authentication fails, counting the mismatch.
//! Writes always refresh both replicas: a read-modify-write that had to fall
//! back writes the damaged replica first, so the copy that is known good
//! survives until the new pair is fully in place.  After any successful
//! write both replicas hold fresh ciphertext and MAC for the new plaintext.
//!
//! ## Resource Discipline
//!
//! A session owns a single sector-sized buffer which holds whatever plaintext
//! or ciphertext is in flight; no per-operation allocation takes place.  Keys
//! live in the session until `close` and are zeroized there, or when the
//! session is dropped.

use log::{error,info,trace,warn};
use zeroize::{Zeroize,ZeroizeOnDrop};
use crate::crypto;
use crate::crypto::{ENCRYPTION_KEY_SIZE,MAC_KEY_SIZE,MAC_TAG_SIZE};
use crate::dev::BlockDevice;
use crate::header::{Header,SEALED_SIZE};
use crate::layout::{Geometry,Replica,SectorAddr};
use crate::{DYNERR,STDRESULT};

/// Enumerates volume errors.  The `Display` trait will print the equivalent long message.
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("sector authentication failed")]
    SectorAuth,
    #[error("request outside volume boundaries")]
    OutOfRange
}

/// Key material for a session, wiped on drop.
#[derive(Zeroize,ZeroizeOnDrop)]
struct Keys {
    mac: [u8;MAC_KEY_SIZE],
    encryption: [u8;ENCRYPTION_KEY_SIZE]
}

impl Keys {
    fn copy_from(mac_key: &[u8;MAC_KEY_SIZE],encryption_key: &[u8;ENCRYPTION_KEY_SIZE]) -> Self {
        Self {
            mac: *mac_key,
            encryption: *encryption_key
        }
    }
}

fn is_auth_failure(e: &DYNERR) -> bool {
    matches!(e.downcast_ref::<Error>(),Some(Error::SectorAuth))
}

/// Authenticated read of one replica of one sector.  On success `buf` holds
/// the plaintext.  A MAC mismatch surfaces as `Error::SectorAuth` and leaves
/// `buf` holding unauthenticated ciphertext.
fn read_sector(dev: &mut dyn BlockDevice,geo: &Geometry,keys: &Keys,addr: SectorAddr,buf: &mut [u8]) -> STDRESULT {
    trace!("read sector {} ({:?})",addr.index,addr.replica);
    if addr.index >= geo.sector_count() {
        return Err(Box::new(Error::OutOfRange));
    }
    let mut stored = [0u8;MAC_TAG_SIZE];
    dev.physical_read(buf,geo.data_offset(addr))?;
    dev.physical_read(&mut stored,geo.mac_offset(addr))?;
    if !crypto::mac_verify(&stored,&keys.mac,buf,addr.tag()) {
        return Err(Box::new(Error::SectorAuth));
    }
    crypto::decrypt(buf,&keys.encryption,addr.tag());
    Ok(())
}

/// Encrypt, MAC, and persist one replica of one sector.  `buf` enters as
/// plaintext and leaves as ciphertext.
fn write_sector(dev: &mut dyn BlockDevice,geo: &Geometry,keys: &Keys,addr: SectorAddr,buf: &mut [u8]) -> STDRESULT {
    trace!("write sector {} ({:?})",addr.index,addr.replica);
    if addr.index >= geo.sector_count() {
        return Err(Box::new(Error::OutOfRange));
    }
    crypto::encrypt(buf,&keys.encryption,addr.tag());
    let mut tag = [0u8;MAC_TAG_SIZE];
    crypto::mac(&mut tag,&keys.mac,buf,addr.tag());
    dev.physical_write(geo.data_offset(addr),buf)?;
    dev.physical_write(geo.mac_offset(addr),&tag)
}

/// Persist both replicas of a sector, `first` first.  `buf` enters as
/// plaintext; between the two writes it is decrypted back, since each replica
/// gets its own ciphertext under its own tag.
fn write_sector_pair(dev: &mut dyn BlockDevice,geo: &Geometry,keys: &Keys,index: u32,first: Replica,buf: &mut [u8]) -> STDRESULT {
    let addr = SectorAddr { index, replica: first };
    write_sector(dev,geo,keys,addr,buf)?;
    crypto::decrypt(buf,&keys.encryption,addr.tag());
    write_sector(dev,geo,keys,addr.flip(),buf)
}

/// An open session against a backing device.
pub struct Volume {
    dev: Box<dyn BlockDevice>,
    geo: Geometry,
    keys: Keys,
    buffer: Vec<u8>,
    corruption_count: u64
}

impl Volume {
    /// Initialize a volume on `dev`.  The header sector is written first,
    /// then both MAC tables are filled end to end with random bytes so that
    /// unwritten entries are indistinguishable from real ones, then every
    /// sector's two replicas are initialized with valid ciphertext and MAC of
    /// random plaintext.  No session is left open; call `open` next.
    pub fn create(dev: &mut dyn BlockDevice,mac_key: &[u8;MAC_KEY_SIZE],encryption_key: &[u8;ENCRYPTION_KEY_SIZE],sector_size: u32,sector_count: u32) -> STDRESULT {
        let geo = Geometry::new(sector_size,sector_count)?;
        let keys = Keys::copy_from(mac_key,encryption_key);
        let mut buf = vec![0u8;sector_size as usize];
        info!("creating volume, {} sectors of {} bytes",sector_count,sector_size);

        dev.read_urandom(&mut buf);
        Header { sector_size, sector_count }.seal(&mut buf[0..SEALED_SIZE],&keys.mac,&keys.encryption);
        dev.physical_write(0,&buf)?;

        for replica in [Replica::Primary,Replica::Secondary] {
            let mut offset = geo.replica_base(replica);
            let mut remaining = geo.mac_table_size();
            while remaining > 0 {
                let chunk = remaining.min(buf.len() as u64) as usize;
                dev.read_urandom(&mut buf[0..chunk]);
                dev.physical_write(offset,&buf[0..chunk])?;
                offset += chunk as u64;
                remaining -= chunk as u64;
            }
        }

        for index in 0..sector_count {
            dev.read_urandom(&mut buf);
            write_sector_pair(dev,&geo,&keys,index,Replica::Primary,&mut buf)?;
        }
        buf.zeroize();
        Ok(())
    }

    /// Open a previously created volume, taking ownership of the device.
    /// Fails if the header does not verify under these keys or carries
    /// parameters that no longer validate.
    pub fn open(mut dev: Box<dyn BlockDevice>,mac_key: &[u8;MAC_KEY_SIZE],encryption_key: &[u8;ENCRYPTION_KEY_SIZE]) -> Result<Self,DYNERR> {
        let mut raw = [0u8;SEALED_SIZE];
        dev.physical_read(&mut raw,0)?;
        let header = Header::unseal(&mut raw,mac_key,encryption_key)?;
        let geo = Geometry::new(header.sector_size,header.sector_count)?;
        info!("opened volume, {} sectors of {} bytes",geo.sector_count(),geo.sector_size());
        Ok(Self {
            dev,
            geo,
            keys: Keys::copy_from(mac_key,encryption_key),
            buffer: vec![0u8;header.sector_size as usize],
            corruption_count: 0
        })
    }

    pub fn sector_size(&self) -> u32 {
        self.geo.sector_size()
    }
    pub fn sector_count(&self) -> u32 {
        self.geo.sector_count()
    }
    pub fn volume_size(&self) -> u64 {
        self.geo.volume_size()
    }
    pub fn geometry(&self) -> Geometry {
        self.geo
    }
    /// Number of sector MAC mismatches seen over the life of the session.
    pub fn corruption_count(&self) -> u64 {
        self.corruption_count
    }
    /// Access the underlying device, e.g. to inspect it in tests.  Writing
    /// through this handle bypasses the envelope entirely.
    pub fn device_mut(&mut self) -> &mut dyn BlockDevice {
        self.dev.as_mut()
    }

    fn check_range(&self,offset: u64,len: u64) -> STDRESULT {
        let end = match offset.checked_add(len) {
            Some(end) => end,
            None => return Err(Box::new(Error::OutOfRange))
        };
        if offset >= self.geo.volume_size() || end == 0 || end - 1 >= self.geo.volume_size() {
            return Err(Box::new(Error::OutOfRange));
        }
        Ok(())
    }

    /// Read a sector into the session buffer, trying the primary replica
    /// first and the secondary if the primary fails to authenticate.
    /// Returns the replica that verified.
    fn read_either(&mut self,index: u32) -> Result<Replica,DYNERR> {
        let addr = SectorAddr::primary(index);
        match read_sector(self.dev.as_mut(),&self.geo,&self.keys,addr,&mut self.buffer) {
            Ok(()) => Ok(Replica::Primary),
            Err(e) if is_auth_failure(&e) => {
                self.corruption_count += 1;
                warn!("primary replica of sector {} failed authentication, trying secondary",index);
                match read_sector(self.dev.as_mut(),&self.geo,&self.keys,addr.flip(),&mut self.buffer) {
                    Ok(()) => Ok(Replica::Secondary),
                    Err(e2) => {
                        if is_auth_failure(&e2) {
                            self.corruption_count += 1;
                            error!("both replicas of sector {} failed authentication",index);
                        }
                        Err(e2)
                    }
                }
            },
            Err(e) => Err(e)
        }
    }

    /// Fill `dst` with plaintext starting at byte `offset` of the logical
    /// address space.  The whole range must lie inside the volume.  On
    /// failure the contents of `dst` are indeterminate.
    pub fn read(&mut self,dst: &mut [u8],offset: u64) -> STDRESULT {
        self.check_range(offset,dst.len() as u64)?;
        let sector_size = self.geo.sector_size() as u64;
        let mut sector_offset = (offset % sector_size) as usize;
        let mut index = (offset / sector_size) as u32;
        let mut done = 0;
        while done < dst.len() {
            let chunk = (dst.len() - done).min(sector_size as usize - sector_offset);
            self.read_either(index)?;
            dst[done..done+chunk].copy_from_slice(&self.buffer[sector_offset..sector_offset+chunk]);
            sector_offset = 0;
            done += chunk;
            index += 1;
        }
        Ok(())
    }

    /// Write `src` at byte `offset` of the logical address space.  The whole
    /// range must lie inside the volume.  Partial sectors are
    /// read-modify-write; a mid-operation failure leaves the disk
    /// self-consistent but the logical range indeterminate.
    pub fn write(&mut self,offset: u64,src: &[u8]) -> STDRESULT {
        self.check_range(offset,src.len() as u64)?;
        let sector_size = self.geo.sector_size() as usize;
        let mut sector_offset = (offset % sector_size as u64) as usize;
        let mut index = (offset / sector_size as u64) as u32;
        let mut done = 0;
        while done < src.len() {
            let chunk = (src.len() - done).min(sector_size - sector_offset);
            // a partial sector must be read back first, and the replica that
            // supplied the data is then written LAST, keeping a good copy on
            // disk until the new pair is in place
            let first = match chunk < sector_size {
                true => self.read_either(index)?.other(),
                false => Replica::Primary
            };
            self.buffer[sector_offset..sector_offset+chunk].copy_from_slice(&src[done..done+chunk]);
            write_sector_pair(self.dev.as_mut(),&self.geo,&self.keys,index,first,&mut self.buffer)?;
            sector_offset = 0;
            done += chunk;
            index += 1;
        }
        Ok(())
    }

    /// Reserved for a future write-back cache; at present every write is
    /// persistent before it returns and there is nothing to flush.
    pub fn flush(&mut self) -> STDRESULT {
        Ok(())
    }

    /// Flush and end the session, handing the device back.  Key material is
    /// wiped here, as it also would be on drop.
    pub fn close(mut self) -> Result<Box<dyn BlockDevice>,DYNERR> {
        self.flush()?;
        self.buffer.zeroize();
        Ok(self.dev)
    }
}
