use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

/// Named MAFFT strategies and the flags `mafft` expands them to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Linsi,
    Ginsi,
    Einsi,
    Fftnsi,
    Fftns,
    Nwns,
    Nwnsi,
}

impl Strategy {
    pub const NAMES: [&'static str; 7] = ["linsi", "ginsi", "einsi", "fftnsi", "fftns", "nwns", "nwnsi"];

    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            Strategy::Linsi => &["--localpair", "--maxiterate", "1000"],
            Strategy::Ginsi => &["--globalpair", "--maxiterate", "1000"],
            Strategy::Einsi => &["--genafpair", "--ep", "0", "--maxiterate", "1000"],
            Strategy::Fftnsi => &["--retree", "2", "--maxiterate", "1000"],
            Strategy::Fftns => &["--retree", "2", "--maxiterate", "0"],
            Strategy::Nwns => &["--retree", "2", "--maxiterate", "0", "--nofft"],
            Strategy::Nwnsi => &["--retree", "2", "--maxiterate", "1000", "--nofft"],
        }
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let strategy = match s {
            "linsi" => Strategy::Linsi,
            "ginsi" => Strategy::Ginsi,
            "einsi" => Strategy::Einsi,
            "fftnsi" => Strategy::Fftnsi,
            "fftns" => Strategy::Fftns,
            "nwns" => Strategy::Nwns,
            "nwnsi" => Strategy::Nwnsi,
            _ => anyhow::bail!("unknown MAFFT strategy '{}'", s),
        };
        Ok(strategy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqType {
    Nucleotide,
    Amino,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Fasta,
    Clustal,
    Phylip,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Fasta => "fasta",
            OutputFormat::Clustal => "clw",
            OutputFormat::Phylip => "phy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Same order as the input
    Input,
    /// Order of the guide tree
    Aligned,
}

/// Everything passed to `mafft` apart from the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct MafftOptions {
    pub seqtype: Option<SeqType>,
    pub format: OutputFormat,
    pub order: Option<Order>,
    pub treeout: bool,
    pub quiet: bool,
    pub auto: bool,
    pub strategy: Option<Strategy>,
    pub maxiterate: Option<i64>,
    pub retree: Option<i64>,
    pub op: Option<f64>,
    pub ep: Option<f64>,
    pub memsave: bool,
    pub threads: usize,
}

impl Default for MafftOptions {
    fn default() -> Self {
        Self {
            seqtype: None,
            format: OutputFormat::Fasta,
            order: None,
            treeout: false,
            quiet: false,
            auto: false,
            strategy: None,
            maxiterate: None,
            retree: None,
            op: None,
            ep: None,
            memsave: false,
            threads: 1,
        }
    }
}

impl MafftOptions {
    /// Command line arguments. Explicit tuning values come after the
    /// strategy flags, so they override the strategy's own.
    ///
    /// ```
    /// use hpphylo::libs::mafft::{MafftOptions, Strategy};
    ///
    /// let opts = MafftOptions {
    ///     strategy: Some(Strategy::Linsi),
    ///     maxiterate: Some(10),
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     opts.args().join(" "),
    ///     "--localpair --maxiterate 1000 --maxiterate 10 --thread 1"
    /// );
    /// ```
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![];

        match self.seqtype {
            Some(SeqType::Nucleotide) => args.push("--nuc".to_string()),
            Some(SeqType::Amino) => args.push("--amino".to_string()),
            None => {}
        }

        if self.auto {
            args.push("--auto".to_string());
        }
        if let Some(strategy) = self.strategy {
            args.extend(strategy.flags().iter().map(|s| s.to_string()));
        }
        if let Some(n) = self.maxiterate {
            args.push("--maxiterate".to_string());
            args.push(n.to_string());
        }
        if let Some(n) = self.retree {
            args.push("--retree".to_string());
            args.push(n.to_string());
        }
        if let Some(op) = self.op {
            args.push("--op".to_string());
            args.push(op.to_string());
        }
        if let Some(ep) = self.ep {
            args.push("--ep".to_string());
            args.push(ep.to_string());
        }
        if self.memsave {
            args.push("--memsave".to_string());
        }

        match self.format {
            OutputFormat::Fasta => {}
            OutputFormat::Clustal => args.push("--clustalout".to_string()),
            OutputFormat::Phylip => args.push("--phylipout".to_string()),
        }
        match self.order {
            Some(Order::Input) => args.push("--inputorder".to_string()),
            Some(Order::Aligned) => args.push("--reorder".to_string()),
            None => {}
        }
        if self.treeout {
            args.push("--treeout".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }

        args.push("--thread".to_string());
        args.push(self.threads.to_string());

        args
    }
}

/// A `mafft` executable together with the options to run it with.
#[derive(Debug, Clone)]
pub struct Mafft {
    bin: PathBuf,
    options: MafftOptions,
}

impl Mafft {
    pub fn new(bin: impl Into<PathBuf>, options: MafftOptions) -> Self {
        Self {
            bin: bin.into(),
            options,
        }
    }

    /// Finds `mafft` in `PATH`.
    pub fn locate(options: MafftOptions) -> anyhow::Result<Self> {
        let bin = which::which("mafft")
            .context("mafft not found in PATH. Please install MAFFT first.")?;
        Ok(Self::new(bin, options))
    }

    pub fn options(&self) -> &MafftOptions {
        &self.options
    }

    /// The full command line, executable first and input last.
    pub fn command_line(&self, input: &Path) -> Vec<String> {
        let mut line = vec![self.bin.to_string_lossy().to_string()];
        line.extend(self.options.args());
        line.push(input.to_string_lossy().to_string());
        line
    }

    /// Where `mafft --treeout` leaves the guide tree for `input`.
    pub fn tree_file(input: &Path) -> PathBuf {
        let mut name = input.as_os_str().to_owned();
        name.push(".tree");
        PathBuf::from(name)
    }

    /// Aligns `input`, writing the alignment to `output`. `output` is only
    /// created once `mafft` has succeeded.
    pub fn run(&self, input: &Path, output: &Path) -> anyhow::Result<()> {
        tracing::info!(cmd = %self.command_line(input).join(" "), "running mafft");
        let result = std::process::Command::new(&self.bin)
            .args(self.options.args())
            .arg(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to execute {}", self.bin.display()))?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !result.status.success() {
            anyhow::bail!("mafft failed ({}): {}", result.status, stderr.trim());
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "mafft", "{}", line);
        }

        std::fs::write(output, &result.stdout)
            .with_context(|| format!("could not write {}", output.display()))?;

        Ok(())
    }
}
