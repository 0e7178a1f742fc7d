//! Stage modules for the `hpphylo` binary.

use hpphylo::libs::stage::StageDef;

pub mod multiple_align;

/// Live stages, in the order `--help` lists them.
pub const STAGES: &[StageDef] = &[
    StageDef::new("multiple_align", multiple_align::stageparser),
    // StageDef::new("build_tree", build_tree::stageparser),
];
