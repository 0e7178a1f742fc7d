//! Exposing independently written stages as subcommands of one executable.
//!
//! Each stage is a [`StageDef`]: a name plus a registration function that
//! declares the stage's parameters on a [`StageSlot`] and binds its handler.
//! The [`Registry`] collects the stages under a root `clap::Command`, parses
//! the command line, and calls the selected handler with a [`Params`] holding
//! only the parameters that stage declared.
//!
//! ```
//! use hpphylo::libs::stage::{ParamSpec, Params, Registry, StageDef, StageSlot};
//!
//! fn count(slot: StageSlot) -> StageSlot {
//!     slot.about("Counts things")
//!         .param(ParamSpec::text("input").required())
//!         .param(ParamSpec::int("threads").default("1"))
//!         .handler(|params: &Params| {
//!             assert_eq!(params.text("input"), Some("foo.fa"));
//!             assert_eq!(params.int("threads"), Some(1));
//!             Ok(())
//!         })
//! }
//!
//! let registry = Registry::new(clap::Command::new("tool"))
//!     .register_all(&[StageDef::new("count", count)])
//!     .unwrap();
//! registry
//!     .parse_and_dispatch(["tool", "count", "--input", "foo.fa"])
//!     .unwrap();
//! ```

mod error;
mod params;
mod registry;
mod schema;
mod slot;

pub use error::{DispatchError, StageError};
pub use params::{Params, Value};
pub use registry::{Configured, Invocation, Registry, StageDef, Unconfigured};
pub use schema::{ParamKind, ParamSpec, Schema};
pub use slot::{BoundStage, StageSlot};

/// A stage's entry point.
pub type Handler = Box<dyn Fn(&Params) -> anyhow::Result<()>>;
