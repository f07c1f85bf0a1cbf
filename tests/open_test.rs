// header verification when opening volumes
use rand::RngCore;
use tsvkit::dev::{BlockDevice,MemoryDevice};
use tsvkit::volume::Volume;

const MAC_KEY_SIZE: usize = 64;
const ENCRYPTION_KEY_SIZE: usize = 64;

fn random_keys() -> ([u8;MAC_KEY_SIZE],[u8;ENCRYPTION_KEY_SIZE]) {
    let mut mac_key = [0u8;MAC_KEY_SIZE];
    let mut encryption_key = [0u8;ENCRYPTION_KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut mac_key);
    rand::thread_rng().fill_bytes(&mut encryption_key);
    (mac_key,encryption_key)
}

#[test]
fn blank_device_fails() {
    let (mac_key,encryption_key) = random_keys();
    let dev = MemoryDevice::new(5*512);
    assert!(Volume::open(Box::new(dev),&mac_key,&encryption_key).is_err());
}

#[test]
fn random_device_fails() {
    let (mac_key,encryption_key) = random_keys();
    for _ in 0..16 {
        let mut dev = MemoryDevice::new(5*512);
        let mut noise = vec![0u8;3*512];
        rand::thread_rng().fill_bytes(&mut noise);
        dev.physical_write(0,&noise).expect("write failed");
        assert!(Volume::open(Box::new(dev),&mac_key,&encryption_key).is_err());
    }
}

#[test]
fn keys_are_checked() {
    let (mac_key,encryption_key) = random_keys();
    let mut dev = MemoryDevice::new(5*512);
    Volume::create(&mut dev,&mac_key,&encryption_key,512,1).expect("create failed");

    let (wrong_mac,wrong_encryption) = random_keys();
    assert!(Volume::open(Box::new(dev.clone()),&wrong_mac,&encryption_key).is_err(),"wrong MAC key should fail");
    assert!(Volume::open(Box::new(dev.clone()),&mac_key,&wrong_encryption).is_err(),"wrong encryption key should fail");

    let vol = Volume::open(Box::new(dev),&mac_key,&encryption_key).expect("open with the right keys failed");
    assert_eq!(vol.sector_size(),512);
    assert_eq!(vol.sector_count(),1);
    assert_eq!(vol.volume_size(),512);
    vol.close().expect("close failed");
}
