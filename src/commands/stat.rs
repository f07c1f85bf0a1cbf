use clap;
use log::warn;
use crate::STDRESULT;

pub fn stat(cmd: &clap::ArgMatches) -> STDRESULT {
    let img_path = cmd.get_one::<String>("dimg").unwrap();
    let key_path = cmd.get_one::<String>("keyfile").unwrap();
    let mut vol = super::open_volume(img_path,key_path)?;
    let mut obj = json::object! {
        sector_size: vol.sector_size(),
        sector_count: vol.sector_count(),
        volume_size: vol.volume_size(),
        mac_table_size: vol.geometry().mac_table_size(),
        total_size: vol.geometry().total_size()
    };
    if cmd.get_flag("scrub") {
        // walk every sector through the normal read path; replica fallback
        // accumulates in the corruption count, a sector with both replicas
        // bad makes the volume unreadable
        let mut readable = true;
        let mut buf = vec![0u8;vol.sector_size() as usize];
        for index in 0..vol.sector_count() as u64 {
            if vol.read(&mut buf,index * vol.sector_size() as u64).is_err() {
                warn!("sector {} is unreadable",index);
                readable = false;
            }
        }
        obj["bad_replicas"] = vol.corruption_count().into();
        obj["readable"] = readable.into();
    }
    let s = match cmd.get_one::<u16>("indent") {
        Some(spaces) => json::stringify_pretty(obj,*spaces),
        None => json::stringify(obj)
    };
    println!("{}",s);
    vol.close()?;
    return Ok(());
}
