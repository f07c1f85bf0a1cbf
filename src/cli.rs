use clap::{arg,crate_version,Command,ValueHint};

pub fn build_cli() -> Command {
    let long_help = "tsvkit is always invoked with exactly one of several subcommands.
The subcommands are generally designed to function as nodes in a pipeline.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

The key file holds 128 raw bytes, the MAC key followed by the encryption key.

Examples:
---------
create a volume:   `tsvkit mkvol -d vol.tsv -k keys.bin -s 4096 -n 256`
store a file:      `tsvkit put -d vol.tsv -k keys.bin -o 0 -f secret.txt`
read it back:      `tsvkit get -d vol.tsv -k keys.bin -o 0 -l 1024 > out.bin`
check the volume:  `tsvkit stat -d vol.tsv -k keys.bin --scrub`";

    let mut main_cmd = Command::new("tsvkit")
        .about("Authenticated encrypted volumes with mirrored corruption recovery.")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("mkvol")
            .arg(
                arg!(-d --dimg <PATH> "volume image path to create")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-k --keyfile <PATH> "key file, MAC key then encryption key")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-s --secsize <BYTES> "bytes per sector")
                    .value_parser(clap::value_parser!(u32))
                    .required(true),
            )
            .arg(
                arg!(-n --count <SECTORS> "number of sectors")
                    .value_parser(clap::value_parser!(u32))
                    .required(true),
            )
            .about("write a blank volume image to the given path"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("get")
            .arg(
                arg!(-d --dimg <PATH> "path to volume image")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-k --keyfile <PATH> "key file, MAC key then encryption key")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-o --offset <BYTE> "byte offset into the volume")
                    .value_parser(clap::value_parser!(u64))
                    .required(true),
            )
            .arg(
                arg!(-l --length <BYTES> "how many bytes to read")
                    .value_parser(clap::value_parser!(u64))
                    .required(true),
            )
            .about("read a byte range from a volume to stdout"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("put")
            .arg(
                arg!(-d --dimg <PATH> "path to volume image")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-k --keyfile <PATH> "key file, MAC key then encryption key")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-o --offset <BYTE> "byte offset into the volume")
                    .value_parser(clap::value_parser!(u64))
                    .required(true),
            )
            .arg(
                arg!(-f --file <PATH> "local file to write, omit to use stdin")
                    .value_hint(ValueHint::FilePath)
                    .required(false),
            )
            .about("write bytes into a volume at the given offset"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("stat")
            .arg(
                arg!(-d --dimg <PATH> "path to volume image")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(
                arg!(-k --keyfile <PATH> "key file, MAC key then encryption key")
                    .value_hint(ValueHint::FilePath)
                    .required(true),
            )
            .arg(arg!(--scrub "read every sector and count bad replicas").action(clap::ArgAction::SetTrue))
            .arg(
                arg!(--indent <SPACES> "indent in faithful JSON output")
                    .value_parser(clap::value_parser!(u16))
                    .required(false),
            )
            .about("print volume parameters as a JSON string"),
    );
    return main_cmd;
}
