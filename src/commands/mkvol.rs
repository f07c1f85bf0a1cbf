use clap;
use log::info;
use zeroize::Zeroize;
use crate::dev::FileDevice;
use crate::layout::Geometry;
use crate::volume::Volume;
use crate::STDRESULT;

pub fn mkvol(cmd: &clap::ArgMatches) -> STDRESULT {
    let img_path = cmd.get_one::<String>("dimg").unwrap();
    let key_path = cmd.get_one::<String>("keyfile").unwrap();
    let sector_size = *cmd.get_one::<u32>("secsize").unwrap();
    let sector_count = *cmd.get_one::<u32>("count").unwrap();
    // validate before touching the file system so a bad request does not
    // leave an empty image behind
    let geo = Geometry::new(sector_size,sector_count)?;
    let (mut mac_key,mut encryption_key) = super::read_key_file(key_path)?;
    let mut dev = FileDevice::create(img_path,geo.total_size())?;
    let ans = Volume::create(&mut dev,&mac_key,&encryption_key,sector_size,sector_count);
    mac_key.zeroize();
    encryption_key.zeroize();
    ans?;
    info!("created {} byte volume in {}",geo.volume_size(),img_path);
    return Ok(());
}
