use super::{BoundStage, DispatchError, Handler, Params, StageError, StageSlot};
use clap::error::ErrorKind;
use clap::{ArgMatches, Command};
use indexmap::IndexMap;
use std::ffi::OsString;
use std::marker::PhantomData;

/// A stage as the executable knows it: its subcommand name and the function
/// that declares it.
#[derive(Clone, Copy)]
pub struct StageDef {
    name: &'static str,
    stageparser: fn(StageSlot) -> StageSlot,
}

impl StageDef {
    pub const fn new(name: &'static str, stageparser: fn(StageSlot) -> StageSlot) -> Self {
        Self { name, stageparser }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for StageDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StageDef").field(&self.name).finish()
    }
}

/// Stages may still be added.
#[derive(Debug)]
pub struct Unconfigured;

/// Registration is closed; ready to parse.
#[derive(Debug)]
pub struct Configured;

/// Stages attached to a root command.
///
/// `Registry<Unconfigured>` accepts stages; [`Registry::configure`] closes it.
/// A `Registry<Configured>` is consumed by [`Registry::parse`], so each
/// registry serves exactly one command line.
pub struct Registry<S> {
    root: Command,
    stages: IndexMap<String, BoundStage>,
    _state: PhantomData<S>,
}

impl Registry<Unconfigured> {
    /// Wraps `root`. Arguments already on `root` (usually global flags) stay
    /// with the root and can't be redeclared by a stage.
    pub fn new(root: Command) -> Self {
        Self {
            root: root.subcommand_required(true).arg_required_else_help(true),
            stages: IndexMap::new(),
            _state: PhantomData,
        }
    }

    /// Lets `stageparser` declare stage `name` and attaches it.
    pub fn register<F>(mut self, name: &'static str, stageparser: F) -> Result<Self, StageError>
    where
        F: FnOnce(StageSlot) -> StageSlot,
    {
        if self.stages.contains_key(name) {
            return Err(StageError::DuplicateStage(name.to_string()));
        }

        let mut reserved: Vec<String> = vec![];
        for arg in self.root.get_arguments() {
            reserved.push(arg.get_id().as_str().to_string());
            if let Some(long) = arg.get_long() {
                reserved.push(format!("--{}", long));
            }
            if let Some(short) = arg.get_short() {
                reserved.push(format!("-{}", short));
            }
        }
        reserved.extend(
            ["help", "--help", "-h", "version", "--version", "-V"].map(String::from),
        );

        let (command, stage) = stageparser(StageSlot::new(name, reserved)).finish()?;
        self.root = self.root.subcommand(command);
        self.stages.insert(name.to_string(), stage);

        Ok(self)
    }

    /// Registers every stage in order, then closes registration.
    pub fn register_all(self, defs: &[StageDef]) -> Result<Registry<Configured>, StageError> {
        defs.iter()
            .try_fold(self, |registry, def| registry.register(def.name, def.stageparser))
            .map(Registry::configure)
    }

    pub fn configure(self) -> Registry<Configured> {
        Registry {
            root: self.root,
            stages: self.stages,
            _state: PhantomData,
        }
    }
}

impl<S> Registry<S> {
    pub fn command(&self) -> &Command {
        &self.root
    }

    /// Stage names in registration order, which is also help order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }

    pub fn stage(&self, name: &str) -> Option<&BoundStage> {
        self.stages.get(name)
    }
}

impl<S> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root.get_name())
            .field("stages", &self.stages.values().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry<Configured> {
    /// Parses `argv` (program name first) and resolves the selected stage.
    pub fn parse<I, T>(mut self, argv: I) -> Result<Invocation, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.root.try_get_matches_from_mut(argv)?;

        let Some((name, sub_matches)) = matches.subcommand() else {
            let err = self
                .root
                .error(ErrorKind::MissingSubcommand, "a stage name is required");
            return Err(err.into());
        };
        let Some(stage) = self.stages.shift_remove(name) else {
            let err = self.root.error(
                ErrorKind::InvalidSubcommand,
                format!("unrecognized stage '{}'", name),
            );
            return Err(err.into());
        };

        let params = Params::from_matches(stage.name(), stage.schema(), sub_matches)?;
        let stage_name = stage.name().to_string();

        Ok(Invocation {
            stage: stage_name,
            params,
            handler: stage.into_handler(),
            matches,
        })
    }

    /// [`Registry::parse`] followed by [`Invocation::dispatch`].
    pub fn parse_and_dispatch<I, T>(self, argv: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.parse(argv)?
            .dispatch()
            .map_err(DispatchError::Handler)
    }
}

/// A parsed command line bound to its stage handler.
pub struct Invocation {
    stage: String,
    params: Params,
    handler: Handler,
    matches: ArgMatches,
}

impl Invocation {
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// What the handler will receive.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Root-level matches, for global flags the handler never sees.
    pub fn global_matches(&self) -> &ArgMatches {
        &self.matches
    }

    /// Runs the handler. Its error comes back as is.
    pub fn dispatch(self) -> anyhow::Result<()> {
        tracing::debug!(
            stage = %self.stage,
            params = ?self.params.names().collect::<Vec<_>>(),
            "dispatching"
        );
        (self.handler)(&self.params)
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("stage", &self.stage)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
