use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn fasta_names(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter_map(|l| l.strip_prefix('>'))
        .map(|l| l.split_whitespace().next().unwrap_or(""))
        .collect()
}

#[test]
fn command_help() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("hpphylo")?;
    let output = cmd.arg("multiple_align").arg("--help").output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    for flag in [
        "--seqs",
        "--dir_list",
        "--out_align",
        "--outdir",
        "--nuc",
        "--amino",
        "--clustalout",
        "--phylipout",
        "--inputorder",
        "--reorder",
        "--treeout",
        "--quiet_mafft",
        "--algo",
        "--auto",
        "--maxiterate",
        "--retree",
        "--op",
        "--ep",
        "--memsave",
        "--ncpu",
        "--fastaonly",
        "--debug",
    ] {
        assert!(stdout.contains(flag), "{} listed", flag);
    }
    assert!(stdout.contains("Input/Output:"));
    assert!(stdout.contains("MAFFT Options:"));

    // defaults only where declared
    assert!(stdout.contains("[default: 1]"));
    assert!(stdout.contains("[default: .]"));
    let seqs_line = stdout.lines().find(|l| l.contains("--seqs")).unwrap();
    assert!(!seqs_line.contains("default"));

    Ok(())
}

#[test]
fn command_requires_input() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align").arg("--fastaonly");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--seqs"));

    Ok(())
}

#[test]
fn command_missing_seqs_file() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/not_there.fasta");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--seqs"))
        .stderr(predicate::str::contains("file does not exist"));

    Ok(())
}

#[test]
fn command_bad_values() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--ncpu")
        .arg("four");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--ncpu"));

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--algo")
        .arg("muscle");
    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--algo"));

    Ok(())
}

#[test]
fn command_conflicting_flags() -> anyhow::Result<()> {
    for (a, b) in [
        ("--nuc", "--amino"),
        ("--clustalout", "--phylipout"),
        ("--inputorder", "--reorder"),
    ] {
        let mut cmd = Command::cargo_bin("hpphylo")?;
        cmd.arg("multiple_align")
            .arg("--seqs")
            .arg("tests/multiple_align/seqs.fasta")
            .arg(a)
            .arg(b);
        cmd.assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("cannot be used with"));
    }

    Ok(())
}

#[test]
fn command_fastaonly_seqs() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--fastaonly");
    cmd.assert().success().stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(tempdir.path().join("all_sequences.fasta"))?;
    assert_eq!(fasta_names(&content), vec!["ref_HXB2", "sampleA", "sampleB"]);
    assert_eq!(content.lines().count(), 6);
    assert!(!tempdir.path().join("alignment.fasta").exists());

    Ok(())
}

#[test]
fn command_fastaonly_dir_list() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.env_remove("RUST_LOG")
        .arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--dir_list")
        .arg("tests/multiple_align/dirs.list")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--fastaonly");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("sample3"));

    let content = std::fs::read_to_string(tempdir.path().join("all_sequences.fasta"))?;
    assert_eq!(
        fasta_names(&content),
        vec![
            "ref_HXB2",
            "sampleA",
            "sampleB",
            "sample1_final",
            "sample2_hap1",
            "sample2_hap2"
        ]
    );

    Ok(())
}

#[test]
fn command_fastaonly_twice() -> anyhow::Result<()> {
    let mut outputs = vec![];
    for _ in 0..2 {
        let tempdir = TempDir::new()?;
        let mut cmd = Command::cargo_bin("hpphylo")?;
        cmd.arg("multiple_align")
            .arg("--dir_list")
            .arg("tests/multiple_align/dirs.list")
            .arg("--outdir")
            .arg(tempdir.path())
            .arg("--fastaonly");
        cmd.assert().success();

        outputs.push(std::fs::read_to_string(
            tempdir.path().join("all_sequences.fasta"),
        )?);
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(fasta_names(&outputs[0]).len(), 3);

    Ok(())
}

#[test]
fn command_no_sequences() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/empty.fasta")
        .arg("--outdir")
        .arg(tempdir.path());
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no sequences found to align"));

    Ok(())
}

#[test]
fn command_bad_ncpu() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--ncpu")
        .arg("0");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--ncpu must be at least 1"));

    Ok(())
}

#[test]
fn command_debug() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    let output = cmd
        .arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--algo")
        .arg("linsi")
        .arg("--nuc")
        .arg("--phylipout")
        .arg("--ncpu")
        .arg("4")
        .arg("--debug")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("mafft"));
    assert!(stdout.contains("--nuc --localpair --maxiterate 1000 --phylipout --thread 4"));
    assert!(stdout.contains("all_sequences.fasta > "));
    assert!(stdout.trim_end().ends_with("alignment.phy"));

    // the combined input is written, nothing is aligned
    assert!(tempdir.path().join("all_sequences.fasta").exists());
    assert!(!tempdir.path().join("alignment.phy").exists());

    Ok(())
}

#[test]
fn command_debug_overrides() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.env("HPPHYLO_NCPU", "3")
        .arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--algo")
        .arg("fftns")
        .arg("--maxiterate")
        .arg("2")
        .arg("--out_align")
        .arg("env.aln")
        .arg("--debug");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "--retree 2 --maxiterate 0 --maxiterate 2 --thread 3",
        ))
        .stdout(predicate::str::contains("env.aln"));

    Ok(())
}

#[test]
fn command_out_align_keeps_input() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--out_align")
        .arg("all_sequences.fasta");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("would overwrite the combined input"));

    assert!(!tempdir.path().join("all_sequences.fasta").exists());

    Ok(())
}

#[test]
fn command_mafft() -> anyhow::Result<()> {
    if which::which("mafft").is_err() {
        eprintln!("Skipping command_mafft: mafft not installed");
        return Ok(());
    }

    let tempdir = TempDir::new()?;

    let mut cmd = Command::cargo_bin("hpphylo")?;
    cmd.arg("multiple_align")
        .arg("--seqs")
        .arg("tests/multiple_align/seqs.fasta")
        .arg("--dir_list")
        .arg("tests/multiple_align/dirs.list")
        .arg("--outdir")
        .arg(tempdir.path())
        .arg("--nuc")
        .arg("--inputorder")
        .arg("--treeout")
        .arg("--quiet_mafft");
    cmd.assert().success();

    let aln = std::fs::read_to_string(tempdir.path().join("alignment.fasta"))?;
    assert_eq!(fasta_names(&aln).len(), 6);
    assert_eq!(fasta_names(&aln)[0], "ref_HXB2");
    assert!(tempdir.path().join("alignment.tree").exists());

    Ok(())
}
