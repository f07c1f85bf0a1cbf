//! # Cryptographic Envelope
//!
//! Pure functions mapping a sector payload and its 32-bit tag to ciphertext
//! and MAC and back.  Encryption is Threefish-512 applied to each 64-byte
//! block with a tweak formed from the sector tag and the block index, and the
//! MAC is HMAC-SHA-256 over the ciphertext followed by the little-endian tag.
//! Both constructions are part of the on-disk format and cannot be varied
//! without breaking compatibility.
//!
//! The tag binds every ciphertext and MAC to one position on the disk: the
//! header uses tag 0, data sector `s` uses `s+1` in the primary replica and
//! `0x8000_0001 + s` in the secondary, so moving a valid sector somewhere
//! else on the device is detected just like flipping its bits.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt,BlockEncrypt};
use hmac::{Hmac,Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use threefish::Threefish512;

pub const MAC_KEY_SIZE: usize = 64;
pub const ENCRYPTION_KEY_SIZE: usize = 64;
pub const MAC_TAG_SIZE: usize = 32;
pub const ENCRYPTION_BLOCK_SIZE: usize = 64;

type HmacSha256 = Hmac<Sha256>;

/// Tweak for block `block_num` of the sector identified by `sector_tag`.
/// The byte placement (tag at 0, block index at 8) is fixed by the format.
fn tweak(sector_tag: u32,block_num: u64) -> [u8;16] {
    let mut ans = [0u8;16];
    ans[0..4].copy_from_slice(&u32::to_le_bytes(sector_tag));
    ans[8..16].copy_from_slice(&u64::to_le_bytes(block_num));
    ans
}

/// Encrypt `buf` in place under `sector_tag`.  Call on whole sectors, or the
/// whole header, only; a length that is not a multiple of the encryption
/// block is a contract violation and panics.
pub fn encrypt(buf: &mut [u8],key: &[u8;ENCRYPTION_KEY_SIZE],sector_tag: u32) {
    if buf.len() % ENCRYPTION_BLOCK_SIZE != 0 {
        panic!("encrypt length {} is not a multiple of the encryption block",buf.len());
    }
    for (i,block) in buf.chunks_exact_mut(ENCRYPTION_BLOCK_SIZE).enumerate() {
        let tf = Threefish512::new_with_tweak(key,&tweak(sector_tag,i as u64));
        tf.encrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// Inverse of `encrypt`, same alignment contract.
pub fn decrypt(buf: &mut [u8],key: &[u8;ENCRYPTION_KEY_SIZE],sector_tag: u32) {
    if buf.len() % ENCRYPTION_BLOCK_SIZE != 0 {
        panic!("decrypt length {} is not a multiple of the encryption block",buf.len());
    }
    for (i,block) in buf.chunks_exact_mut(ENCRYPTION_BLOCK_SIZE).enumerate() {
        let tf = Threefish512::new_with_tweak(key,&tweak(sector_tag,i as u64));
        tf.decrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// 32-byte MAC over `buf` followed by the little-endian sector tag.
pub fn mac(dst: &mut [u8;MAC_TAG_SIZE],key: &[u8;MAC_KEY_SIZE],buf: &[u8],sector_tag: u32) {
    let mut hm = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    hm.update(buf);
    hm.update(&u32::to_le_bytes(sector_tag));
    dst.copy_from_slice(&hm.finalize().into_bytes());
}

/// Recompute the MAC of `buf` and compare against `expected` without early
/// exit.  Returns whether they match.
pub fn mac_verify(expected: &[u8],key: &[u8;MAC_KEY_SIZE],buf: &[u8],sector_tag: u32) -> bool {
    let mut calculated = [0u8;MAC_TAG_SIZE];
    mac(&mut calculated,key,buf,sector_tag);
    calculated[..].ct_eq(expected).into()
}
