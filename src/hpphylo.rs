extern crate clap;
use clap::*;
use hpphylo::libs::stage::{DispatchError, Registry};
use std::path::PathBuf;

mod cmd_hpphylo;

fn main() -> anyhow::Result<()> {
    let app = Command::new("hpphylo")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`hpphylo` - Phylogenetics stages of the haplotype pipeline")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Log more, repeat for even more"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Only log warnings and errors"),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .env("HPPHYLO_LOGFILE")
                .global(true)
                .help("Append log messages to this file instead of stderr"),
        )
        .after_help(
            r###"Stages:

* multiple_align - Align sequences with MAFFT

Global options (-v, -q, --logfile) may also follow the stage name.
`RUST_LOG` overrides the log level chosen by -v / -q.

"###,
        );

    let registry = Registry::new(app).register_all(cmd_hpphylo::STAGES)?;

    let invocation = match registry.parse(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(DispatchError::Usage(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    let globals = invocation.global_matches();
    hpphylo::libs::logging::init(
        globals.get_count("verbose"),
        globals.get_flag("quiet"),
        globals.get_one::<PathBuf>("logfile").map(PathBuf::as_path),
    )?;

    invocation.dispatch()
}
