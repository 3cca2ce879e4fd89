use clap::{arg,crate_version,value_parser,ArgMatches,Command};
use lumpcodec::lump;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

/// Ask before replacing a file.  Writing at an output offset patches an
/// existing image in place, so there is nothing to ask.
fn ok_to_overwrite(path_out: &str,out_offset: u64) -> bool {
    if out_offset > 0 {
        return true;
    }
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will be replaced by the lump");
            return true;
        }
        return false;
    }
    true
}

/// gather the options common to both subcommands
fn options(cmd: &ArgMatches) -> lump::Options {
    let mut opt = lump::STD_OPTIONS;
    if let Some(offset) = cmd.get_one::<u64>("in-offset") {
        opt.in_offset = *offset;
    }
    if let Some(offset) = cmd.get_one::<u64>("out-offset") {
        opt.out_offset = *offset;
    }
    opt
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `lumpcodec compress -i MAP01.raw -o MAP01.lmp`
Expand:        `lumpcodec expand -s 32768 -i MAP01.lmp -o MAP01.raw`";

    let mut main_cmd = Command::new("lumpcodec")
        .about("Compress and expand Doom 64 lumps")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(--"in-offset" <BYTES> "starting position in the input").value_parser(value_parser!(u64)))
        .arg(arg!(--"out-offset" <BYTES> "starting position in the output").value_parser(value_parser!(u64)))
        .about("compress a lump"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-s --size <BYTES> "expected size of the expanded lump").value_parser(value_parser!(usize)))
        .arg(arg!(--"in-offset" <BYTES> "starting position in the input").value_parser(value_parser!(u64)))
        .arg(arg!(--"out-offset" <BYTES> "starting position in the output").value_parser(value_parser!(u64)))
        .about("expand a lump"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let opt = options(cmd);
        if !ok_to_overwrite(path_out,opt.out_offset) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let (in_size,out_size) = lump::compress(&mut in_file,&mut out_file,&opt)?;
        if opt.out_offset == 0 {
            out_file.set_len(out_size)?;
        }
        eprintln!("compressed {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut opt = options(cmd);
        opt.expanded_size = cmd.get_one::<usize>("size").copied();
        if !ok_to_overwrite(path_out,opt.out_offset) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path_out)?;
        let (in_size,out_size) = lump::expand(&mut in_file,&mut out_file,&opt)?;
        if opt.out_offset == 0 {
            out_file.set_len(out_size)?;
        }
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    Ok(())
}
