use clap;
use std::io::Read;
use crate::STDRESULT;

pub fn put(cmd: &clap::ArgMatches) -> STDRESULT {
    let img_path = cmd.get_one::<String>("dimg").unwrap();
    let key_path = cmd.get_one::<String>("keyfile").unwrap();
    let offset = *cmd.get_one::<u64>("offset").unwrap();
    let buf = match cmd.get_one::<String>("file") {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    let mut vol = super::open_volume(img_path,key_path)?;
    vol.write(offset,&buf)?;
    vol.close()?;
    return Ok(());
}
