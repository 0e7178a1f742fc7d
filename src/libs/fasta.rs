use anyhow::Context;
use noodles_fasta as fasta;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Files looked for, in order, inside each sample directory.
pub const SAMPLE_FILES: [&str; 2] = ["final.fna", "ph_haplotypes.fna"];

/// Sequences collected for one alignment.
#[derive(Debug, Default)]
pub struct Gathered {
    pub records: Vec<fasta::Record>,
    /// Sample directories without any of [`SAMPLE_FILES`]
    pub skipped: Vec<PathBuf>,
}

impl Gathered {
    pub fn names(&self) -> anyhow::Result<Vec<String>> {
        self.records
            .iter()
            .map(|r| Ok(String::from_utf8(r.name().into())?))
            .collect()
    }
}

pub fn read_records(path: &Path) -> anyhow::Result<Vec<fasta::Record>> {
    let reader = crate::reader(&path.to_string_lossy())?;
    let mut fa_in = fasta::io::Reader::new(reader);

    let mut records = vec![];
    for result in fa_in.records() {
        let record = result.with_context(|| format!("malformed FASTA in {}", path.display()))?;
        records.push(record);
    }

    Ok(records)
}

/// Reads a list of sample directories, one per line. Blank lines and lines
/// starting with `#` are skipped.
pub fn read_dir_list(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let reader = crate::reader(&path.to_string_lossy())?;

    let mut dirs = vec![];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        dirs.push(PathBuf::from(line));
    }

    Ok(dirs)
}

/// The sequence file a sample directory contributes, if any.
pub fn sample_file(dir: &Path) -> Option<PathBuf> {
    SAMPLE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Collects the records of `seqs` followed by those of every directory in
/// `dirs`, in order.
pub fn gather(seqs: Option<&Path>, dirs: &[PathBuf]) -> anyhow::Result<Gathered> {
    let mut gathered = Gathered::default();

    if let Some(seqs) = seqs {
        let records = read_records(seqs)?;
        tracing::debug!(file = %seqs.display(), n = records.len(), "read sequences");
        gathered.records.extend(records);
    }

    for dir in dirs {
        match sample_file(dir) {
            Some(file) => {
                let records = read_records(&file)?;
                tracing::debug!(file = %file.display(), n = records.len(), "read sample");
                gathered.records.extend(records);
            }
            None => {
                tracing::warn!(
                    dir = %dir.display(),
                    "no {} in sample directory, skipping",
                    SAMPLE_FILES.join(" or ")
                );
                gathered.skipped.push(dir.clone());
            }
        }
    }

    Ok(gathered)
}

/// Writes records one sequence per line.
pub fn write_records(path: &Path, records: &[fasta::Record]) -> anyhow::Result<()> {
    let mut writer = crate::writer(&path.to_string_lossy())?;
    {
        let mut fa_out = fasta::io::writer::Builder::default()
            .set_line_base_count(usize::MAX)
            .build_from_writer(&mut writer);
        for record in records {
            fa_out.write_record(record)?;
        }
    }
    writer.flush()?;

    Ok(())
}
