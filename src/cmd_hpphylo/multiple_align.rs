use anyhow::Context;
use hpphylo::libs::fasta;
use hpphylo::libs::mafft::{Mafft, MafftOptions, Order, OutputFormat, SeqType, Strategy};
use hpphylo::libs::stage::{ParamSpec, Params, StageSlot};
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Combined input handed to MAFFT, inside `--outdir`.
const ALL_SEQUENCES: &str = "all_sequences.fasta";

const IO: &str = "Input/Output";
const MAFFT: &str = "MAFFT Options";
const SETTINGS: &str = "Settings";

// Declare the stage's parameters and bind its handler
pub fn stageparser(slot: StageSlot) -> StageSlot {
    slot.about("Aligns consensus and haplotype sequences with MAFFT")
        .after_help(
            r###"
Gathers sequences from a FASTA file and/or from sample directories, writes them
to <outdir>/all_sequences.fasta and aligns them with MAFFT.

Notes:
* At least one of --seqs / --dir_list is required
* Each directory in --dir_list contributes final.fna, or ph_haplotypes.fna
  when final.fna is absent; directories with neither are skipped
* Lines of --dir_list that are blank or start with '#' are ignored
* Supports both plain text and gzipped (.gz) sequence files
* --algo expands to MAFFT's own flag sets:
    linsi  --localpair --maxiterate 1000
    ginsi  --globalpair --maxiterate 1000
    einsi  --genafpair --ep 0 --maxiterate 1000
    fftnsi --retree 2 --maxiterate 1000
    fftns  --retree 2 --maxiterate 0
    nwns   --retree 2 --maxiterate 0 --nofft
    nwnsi  --retree 2 --maxiterate 1000 --nofft
  --maxiterate, --retree, --op and --ep given explicitly override these
* The alignment is named alignment.fasta, alignment.clw or alignment.phy
  depending on the output format, unless --out_align is given
* `mafft` must be in $PATH, except with --fastaonly or --debug

Examples:
1. Align the sequences of one FASTA file:
   hpphylo multiple_align --seqs all_consensus.fasta --outdir align

2. Align the assemblies of several samples with L-INS-i:
   hpphylo multiple_align --dir_list samples.txt --algo linsi --ncpu 4

3. Only collect the sequences:
   hpphylo multiple_align --dir_list samples.txt --fastaonly

4. Show the MAFFT command without running it:
   hpphylo multiple_align --seqs all_consensus.fasta --phylipout --debug

"###,
        )
        // Input/Output
        .param(
            ParamSpec::file("seqs")
                .value_name("FILE")
                .heading(IO)
                .help("FASTA file with sequences to be aligned"),
        )
        .param(
            ParamSpec::file("dir_list")
                .value_name("FILE")
                .heading(IO)
                .help("File listing sample directories, one per line"),
        )
        .param(
            ParamSpec::text("out_align")
                .value_name("NAME")
                .heading(IO)
                .help("Name of the alignment file"),
        )
        .param(
            ParamSpec::dir("outdir")
                .default(".")
                .value_name("DIR")
                .heading(IO)
                .help("Output directory"),
        )
        .param(
            ParamSpec::flag("nuc")
                .heading(IO)
                .help("Assume nucleotide sequences"),
        )
        .param(
            ParamSpec::flag("amino")
                .heading(IO)
                .help("Assume amino acid sequences"),
        )
        .param(
            ParamSpec::flag("clustalout")
                .heading(IO)
                .help("Write the alignment in Clustal format"),
        )
        .param(
            ParamSpec::flag("phylipout")
                .heading(IO)
                .help("Write the alignment in PHYLIP format"),
        )
        .param(
            ParamSpec::flag("inputorder")
                .heading(IO)
                .help("Keep the input order in the output"),
        )
        .param(
            ParamSpec::flag("reorder")
                .heading(IO)
                .help("Order the output by the guide tree"),
        )
        .param(
            ParamSpec::flag("treeout")
                .heading(IO)
                .help("Also write the guide tree"),
        )
        .param(
            ParamSpec::flag("quiet_mafft")
                .heading(IO)
                .help("Silence MAFFT's progress messages"),
        )
        // MAFFT Options
        .param(
            ParamSpec::choice("algo", &Strategy::NAMES)
                .heading(MAFFT)
                .help("Named alignment strategy"),
        )
        .param(
            ParamSpec::flag("auto")
                .heading(MAFFT)
                .help("Let MAFFT choose the strategy from the data size"),
        )
        .param(
            ParamSpec::int("maxiterate")
                .value_name("N")
                .heading(MAFFT)
                .help("Number of cycles of iterative refinement"),
        )
        .param(
            ParamSpec::int("retree")
                .value_name("N")
                .heading(MAFFT)
                .help("Number of times the guide tree is built"),
        )
        .param(
            ParamSpec::float("op")
                .value_name("F")
                .heading(MAFFT)
                .help("Gap opening penalty"),
        )
        .param(
            ParamSpec::float("ep")
                .value_name("F")
                .heading(MAFFT)
                .help("Offset value, works like a gap extension penalty"),
        )
        .param(
            ParamSpec::flag("memsave")
                .heading(MAFFT)
                .help("Use the Myers-Miller algorithm to save memory"),
        )
        // Settings
        .param(
            ParamSpec::int("ncpu")
                .default("1")
                .env("HPPHYLO_NCPU")
                .value_name("N")
                .heading(SETTINGS)
                .help("Number of CPUs to use"),
        )
        .param(
            ParamSpec::flag("fastaonly")
                .heading(SETTINGS)
                .help("Only write the combined FASTA file, do not align"),
        )
        .param(
            ParamSpec::flag("debug")
                .heading(SETTINGS)
                .help("Print the MAFFT command but do not run it"),
        )
        .one_of("input", &["seqs", "dir_list"])
        .conflicts("nuc", "amino")
        .conflicts("clustalout", "phylipout")
        .conflicts("inputorder", "reorder")
        .handler(execute)
}

// command implementation
pub fn execute(params: &Params) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let outdir = params.path("outdir").unwrap_or(Path::new("."));
    let options = mafft_options(params)?;
    let out_align = match params.text("out_align") {
        Some(name) => name.to_string(),
        None => format!("alignment.{}", options.format.extension()),
    };
    let is_fastaonly = params.flag("fastaonly");
    let is_debug = params.flag("debug");

    let all_seqs = outdir.join(ALL_SEQUENCES);
    let out_path = outdir.join(&out_align);
    if !is_fastaonly {
        check_out_path(&out_path, &all_seqs, options.treeout)?;
    }

    //----------------------------
    // Sequences
    //----------------------------
    let dirs = match params.path("dir_list") {
        Some(list) => fasta::read_dir_list(list)?,
        None => vec![],
    };
    let gathered = fasta::gather(params.path("seqs"), &dirs)?;
    if !gathered.skipped.is_empty() {
        tracing::warn!(
            "{} sample director{} skipped: {}",
            gathered.skipped.len(),
            if gathered.skipped.len() == 1 { "y" } else { "ies" },
            gathered.skipped.iter().map(|d| d.display()).join(", ")
        );
    }
    if gathered.records.is_empty() {
        anyhow::bail!("no sequences found to align");
    }

    fasta::write_records(&all_seqs, &gathered.records)?;
    tracing::info!(
        n = gathered.records.len(),
        file = %all_seqs.display(),
        "wrote combined sequences"
    );

    if is_fastaonly {
        return Ok(());
    }

    //----------------------------
    // Alignment
    //----------------------------
    if is_debug {
        let mafft = Mafft::locate(options.clone()).unwrap_or_else(|_| Mafft::new("mafft", options));
        println!(
            "{} > {}",
            mafft.command_line(&all_seqs).join(" "),
            out_path.display()
        );
        return Ok(());
    }

    let mafft = Mafft::locate(options)?;
    mafft.run(&all_seqs, &out_path)?;

    if mafft.options().treeout {
        let tree = Mafft::tree_file(&all_seqs);
        let dest = tree_path(&out_path);
        std::fs::rename(&tree, &dest)
            .with_context(|| format!("could not move {} to {}", tree.display(), dest.display()))?;
        tracing::info!(file = %dest.display(), "wrote guide tree");
    }

    tracing::info!(file = %out_path.display(), "alignment finished");

    Ok(())
}

// The alignment must not replace the combined input or the tree MAFFT writes
// next to it
fn check_out_path(out_path: &Path, all_seqs: &Path, treeout: bool) -> anyhow::Result<()> {
    if out_path == all_seqs {
        anyhow::bail!(
            "--out_align {} would overwrite the combined input {}",
            out_path.display(),
            all_seqs.display()
        );
    }
    if treeout && out_path == Mafft::tree_file(all_seqs) {
        anyhow::bail!(
            "--out_align {} would overwrite the guide tree written by mafft",
            out_path.display()
        );
    }
    Ok(())
}

/// `alignment.fasta` -> `alignment.tree`. An alignment already ending in
/// `.tree` keeps its full name and gains another `.tree`.
fn tree_path(alignment: &Path) -> PathBuf {
    let dest = alignment.with_extension("tree");
    if dest == alignment {
        Mafft::tree_file(alignment)
    } else {
        dest
    }
}

fn mafft_options(params: &Params) -> anyhow::Result<MafftOptions> {
    let seqtype = if params.flag("nuc") {
        Some(SeqType::Nucleotide)
    } else if params.flag("amino") {
        Some(SeqType::Amino)
    } else {
        None
    };

    let format = if params.flag("clustalout") {
        OutputFormat::Clustal
    } else if params.flag("phylipout") {
        OutputFormat::Phylip
    } else {
        OutputFormat::Fasta
    };

    let order = if params.flag("inputorder") {
        Some(Order::Input)
    } else if params.flag("reorder") {
        Some(Order::Aligned)
    } else {
        None
    };

    let strategy = params
        .text("algo")
        .map(|name| name.parse::<Strategy>())
        .transpose()?;

    let ncpu = params.int("ncpu").unwrap_or(1);
    anyhow::ensure!(ncpu >= 1, "--ncpu must be at least 1, got {}", ncpu);

    Ok(MafftOptions {
        seqtype,
        format,
        order,
        treeout: params.flag("treeout"),
        quiet: params.flag("quiet_mafft"),
        auto: params.flag("auto"),
        strategy,
        maxiterate: params.int("maxiterate"),
        retree: params.int("retree"),
        op: params.float("op"),
        ep: params.float("ep"),
        memsave: params.flag("memsave"),
        threads: usize::try_from(ncpu)?,
    })
}
