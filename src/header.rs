//! # Volume Header
//!
//! The first sector of the device identifies the volume.  Its leading 64
//! bytes are the header proper: magic, version, and the two geometry
//! parameters, with the remainder of the 64 bytes random.  The header is
//! encrypted and MACed under the volume keys with the reserved tag 0, so
//! nothing about the volume, not even its existence as such, is legible
//! without the keys.  On disk the first sector reads
//! `ciphertext(64) || mac(32) || random fill`.
//!
//! Unlike data sectors the header is not replicated; a header that fails to
//! verify is terminal for `open`.

use crate::crypto;
use crate::crypto::{ENCRYPTION_KEY_SIZE,MAC_KEY_SIZE,MAC_TAG_SIZE};
use crate::DYNERR;

pub const HEADER_SIZE: usize = 64;
/// Bytes of the first sector that are covered by the seal.
pub const SEALED_SIZE: usize = HEADER_SIZE + MAC_TAG_SIZE;
/// Sector tag reserved for the header.
pub const HEADER_TAG: u32 = 0;

const MAGIC: [u8;8] = *b"TITANTSV";
const VERSION: u16 = 0x0100;

/// Enumerates header errors.  The `Display` trait will print the equivalent long message.
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("header authentication failed")]
    Auth,
    #[error("unrecognized volume signature")]
    Magic,
    #[error("unsupported volume version")]
    Version
}

/// Identifying fields of a volume, serialized into the first sector.
pub struct Header {
    pub sector_size: u32,
    pub sector_count: u32
}

impl Header {
    /// Serialize, encrypt, and MAC the header into `dst`, which must hold
    /// exactly `SEALED_SIZE` bytes already filled with random data.  The
    /// fields overwrite the first 18 bytes, the random fill behind them
    /// becomes the header padding, and the MAC lands in the last 32.
    pub fn seal(&self,dst: &mut [u8],mac_key: &[u8;MAC_KEY_SIZE],encryption_key: &[u8;ENCRYPTION_KEY_SIZE]) {
        if dst.len() != SEALED_SIZE {
            panic!("seal buffer is {} bytes, expected {}",dst.len(),SEALED_SIZE);
        }
        let (body,tag) = dst.split_at_mut(HEADER_SIZE);
        body[0..8].copy_from_slice(&MAGIC);
        body[8..10].copy_from_slice(&u16::to_le_bytes(VERSION));
        body[10..14].copy_from_slice(&u32::to_le_bytes(self.sector_size));
        body[14..18].copy_from_slice(&u32::to_le_bytes(self.sector_count));
        crypto::encrypt(body,encryption_key,HEADER_TAG);
        let mut calculated = [0u8;MAC_TAG_SIZE];
        crypto::mac(&mut calculated,mac_key,body,HEADER_TAG);
        tag.copy_from_slice(&calculated);
    }

    /// Verify and decode the first `SEALED_SIZE` bytes of the device.  The
    /// MAC is checked in constant time before anything is decrypted; `raw`
    /// holds plaintext afterwards only if verification succeeded.
    pub fn unseal(raw: &mut [u8;SEALED_SIZE],mac_key: &[u8;MAC_KEY_SIZE],encryption_key: &[u8;ENCRYPTION_KEY_SIZE]) -> Result<Self,DYNERR> {
        let (body,tag) = raw.split_at_mut(HEADER_SIZE);
        if !crypto::mac_verify(tag,mac_key,body,HEADER_TAG) {
            return Err(Box::new(Error::Auth));
        }
        crypto::decrypt(body,encryption_key,HEADER_TAG);
        if body[0..8] != MAGIC {
            return Err(Box::new(Error::Magic));
        }
        if u16::from_le_bytes([body[8],body[9]]) != VERSION {
            return Err(Box::new(Error::Version));
        }
        Ok(Self {
            sector_size: u32::from_le_bytes([body[10],body[11],body[12],body[13]]),
            sector_count: u32::from_le_bytes([body[14],body[15],body[16],body[17]])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> ([u8;MAC_KEY_SIZE],[u8;ENCRYPTION_KEY_SIZE]) {
        let mut mac_key = [0u8;MAC_KEY_SIZE];
        let mut encryption_key = [0u8;ENCRYPTION_KEY_SIZE];
        for i in 0..64 {
            mac_key[i] = 0x11 ^ i as u8;
            encryption_key[i] = 0xee ^ i as u8;
        }
        (mac_key,encryption_key)
    }

    fn sealed(sector_size: u32,sector_count: u32) -> [u8;SEALED_SIZE] {
        let (mac_key,encryption_key) = test_keys();
        let mut raw = [0x5au8;SEALED_SIZE];
        Header { sector_size, sector_count }.seal(&mut raw,&mac_key,&encryption_key);
        raw
    }

    #[test]
    fn round_trip() {
        let (mac_key,encryption_key) = test_keys();
        let mut raw = sealed(4096,256);
        let header = Header::unseal(&mut raw,&mac_key,&encryption_key).expect("unseal failed");
        assert_eq!(header.sector_size,4096);
        assert_eq!(header.sector_count,256);
    }

    #[test]
    fn tampering_is_detected() {
        let (mac_key,encryption_key) = test_keys();
        for flip in [0,HEADER_SIZE-1,HEADER_SIZE,SEALED_SIZE-1] {
            let mut raw = sealed(512,16);
            raw[flip] ^= 0x80;
            match Header::unseal(&mut raw,&mac_key,&encryption_key) {
                Err(e) => assert_eq!(e.downcast_ref::<Error>(),Some(&Error::Auth)),
                Ok(_) => panic!("tampered header verified")
            }
        }
    }

    #[test]
    fn wrong_keys_fail() {
        let (mac_key,encryption_key) = test_keys();
        let mut other = mac_key.clone();
        other[0] ^= 1;
        let mut raw = sealed(512,16);
        assert!(Header::unseal(&mut raw,&other,&encryption_key).is_err());
        // with the right MAC key but the wrong encryption key the seal
        // verifies and the decrypted magic is garbage
        let mut other = encryption_key.clone();
        other[63] ^= 1;
        let mut raw = sealed(512,16);
        match Header::unseal(&mut raw,&mac_key,&other) {
            Err(e) => assert_eq!(e.downcast_ref::<Error>(),Some(&Error::Magic)),
            Ok(_) => panic!("unseal with wrong encryption key succeeded")
        }
    }

    #[test]
    fn version_is_checked() {
        let (mac_key,encryption_key) = test_keys();
        let mut raw = [0u8;SEALED_SIZE];
        {
            let (body,tag) = raw.split_at_mut(HEADER_SIZE);
            body[0..8].copy_from_slice(&MAGIC);
            body[8..10].copy_from_slice(&u16::to_le_bytes(0x0200));
            crypto::encrypt(body,&encryption_key,HEADER_TAG);
            let mut calculated = [0u8;MAC_TAG_SIZE];
            crypto::mac(&mut calculated,&mac_key,body,HEADER_TAG);
            tag.copy_from_slice(&calculated);
        }
        match Header::unseal(&mut raw,&mac_key,&encryption_key) {
            Err(e) => assert_eq!(e.downcast_ref::<Error>(),Some(&Error::Version)),
            Ok(_) => panic!("future version accepted")
        }
    }

    #[test]
    fn padding_does_not_affect_fields() {
        let (mac_key,encryption_key) = test_keys();
        let mut raw1 = [0x00u8;SEALED_SIZE];
        let mut raw2 = [0xffu8;SEALED_SIZE];
        Header { sector_size: 512, sector_count: 3 }.seal(&mut raw1,&mac_key,&encryption_key);
        Header { sector_size: 512, sector_count: 3 }.seal(&mut raw2,&mac_key,&encryption_key);
        // different padding, different ciphertext
        assert_ne!(raw1,raw2);
        let h1 = Header::unseal(&mut raw1,&mac_key,&encryption_key).expect("unseal failed");
        let h2 = Header::unseal(&mut raw2,&mac_key,&encryption_key).expect("unseal failed");
        assert_eq!((h1.sector_size,h1.sector_count),(h2.sector_size,h2.sector_count));
    }
}
