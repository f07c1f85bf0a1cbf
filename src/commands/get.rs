use clap;
use std::io::Write;
use crate::STDRESULT;

pub fn get(cmd: &clap::ArgMatches) -> STDRESULT {
    let img_path = cmd.get_one::<String>("dimg").unwrap();
    let key_path = cmd.get_one::<String>("keyfile").unwrap();
    let offset = *cmd.get_one::<u64>("offset").unwrap();
    let length = *cmd.get_one::<u64>("length").unwrap();
    let mut vol = super::open_volume(img_path,key_path)?;
    let mut buf = vec![0u8;length as usize];
    vol.read(&mut buf,offset)?;
    std::io::stdout().write_all(&buf)?;
    vol.close()?;
    return Ok(());
}
