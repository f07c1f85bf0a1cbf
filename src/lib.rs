//! # `tsvkit` main library
//!
//! This library provides an authenticated, encrypted, fixed-size block volume
//! layered on top of an opaque byte-addressable backing device.  Reads return
//! plaintext authenticated against a stored MAC table, writes transparently
//! encrypt, MAC, and persist.  Every sector is mirrored, so a bounded amount
//! of on-disk damage is repaired transparently from the surviving replica.
//!
//! ## Architecture
//!
//! Volume operations are built around two objects:
//! * `dev::BlockDevice` is the storage seam, a byte-addressable store that does
//!   not interpret its contents
//! * `volume::Volume` is an open session imposing the volume format on some
//!   owned `BlockDevice`
//!
//! When a `Volume` is opened it takes ownership of a `BlockDevice` and uses it
//! as storage until `close` hands it back.  Underneath the session sit three
//! small modules: `crypto` (the per-sector envelope), `layout` (geometry and
//! offset arithmetic), and `header` (the identifying first sector).
//!
//! ## On-Disk Format
//!
//! The backing device holds, in order: one sector with the encrypted and
//! MACed header, the primary MAC table, the primary data region, the
//! secondary MAC table, and the secondary data region.  Sector payloads are
//! Threefish-512 ciphertext tweaked by position, MAC entries are HMAC-SHA-256
//! over the ciphertext bound to the same position.  The format is fixed; see
//! the module docs for the byte-level details.
//!
//! ## Corruption Recovery
//!
//! A sector whose primary replica fails authentication is served from the
//! secondary replica, and the session counts the mismatch.  Writing a sector
//! always refreshes both replicas, damaged one first, so a read-back followed
//! by a write-back repairs any single-replica damage.

pub mod dev;
pub mod crypto;
pub mod layout;
pub mod header;
pub mod volume;
pub mod commands;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;
