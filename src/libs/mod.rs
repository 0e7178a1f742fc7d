pub mod fasta;
pub mod io;
pub mod logging;
pub mod mafft;
pub mod stage;
