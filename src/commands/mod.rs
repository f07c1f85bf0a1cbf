//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod mkvol;
pub mod get;
pub mod put;
pub mod stat;

use log::debug;
use sha2::{Digest,Sha256};
use zeroize::Zeroize;
use crate::crypto::{ENCRYPTION_KEY_SIZE,MAC_KEY_SIZE};
use crate::dev::FileDevice;
use crate::volume::Volume;
use crate::DYNERR;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("key file must hold exactly {len} bytes",len = MAC_KEY_SIZE + ENCRYPTION_KEY_SIZE)]
    BadKeyFile,
    #[error("Command could not be interpreted")]
    InvalidCommand
}

/// Read a key file holding the MAC key followed by the encryption key.
pub fn read_key_file(path: &str) -> Result<([u8;MAC_KEY_SIZE],[u8;ENCRYPTION_KEY_SIZE]),DYNERR> {
    let mut raw = std::fs::read(path)?;
    if raw.len() != MAC_KEY_SIZE + ENCRYPTION_KEY_SIZE {
        raw.zeroize();
        return Err(Box::new(CommandError::BadKeyFile));
    }
    // log a short fingerprint, never the keys
    debug!("key file fingerprint {}",hex::encode(&Sha256::digest(&raw)[0..4]));
    let mut mac_key = [0u8;MAC_KEY_SIZE];
    let mut encryption_key = [0u8;ENCRYPTION_KEY_SIZE];
    mac_key.copy_from_slice(&raw[0..MAC_KEY_SIZE]);
    encryption_key.copy_from_slice(&raw[MAC_KEY_SIZE..]);
    raw.zeroize();
    Ok((mac_key,encryption_key))
}

/// Open the volume image at `img_path` with the keys in `key_path`.
pub fn open_volume(img_path: &str,key_path: &str) -> Result<Volume,DYNERR> {
    let (mut mac_key,mut encryption_key) = read_key_file(key_path)?;
    let dev = FileDevice::open(img_path)?;
    let ans = Volume::open(Box::new(dev),&mac_key,&encryption_key);
    mac_key.zeroize();
    encryption_key.zeroize();
    ans
}
