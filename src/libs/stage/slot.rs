use super::{Handler, ParamSpec, Params, Schema, StageError};
use clap::{ArgGroup, Command};

/// The builder a stage receives during registration.
///
/// A stage describes itself on the slot (help text, parameters, constraints)
/// and binds its handler. The registry then validates the result with
/// [`StageSlot::finish`], which returns the first mistake as a [`StageError`].
pub struct StageSlot {
    name: String,
    reserved: Vec<String>,
    command: Command,
    schema: Schema,
    conflicts: Vec<(&'static str, &'static str)>,
    groups: Vec<(&'static str, Vec<&'static str>)>,
    handler: Option<Handler>,
    error: Option<StageError>,
}

impl StageSlot {
    /// `reserved` lists what the root command already owns: argument ids,
    /// `--long` and `-s` flags.
    pub fn new(name: &'static str, reserved: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            reserved,
            command: Command::new(name),
            schema: Schema::new(),
            conflicts: vec![],
            groups: vec![],
            handler: None,
            error: None,
        }
    }

    pub fn about(mut self, about: &'static str) -> Self {
        self.command = self.command.about(about);
        self
    }

    pub fn after_help(mut self, text: &'static str) -> Self {
        self.command = self.command.after_help(text);
        self
    }

    /// Declares a parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Some(name) = spec.names().into_iter().find(|n| self.reserved.contains(n)) {
            self.error = Some(StageError::ReservedParam {
                stage: self.name.clone(),
                param: name,
            });
            return self;
        }

        let arg = spec.to_arg();
        match self.schema.push(spec) {
            Ok(()) => self.command = self.command.arg(arg),
            Err(dup) => {
                let param = self
                    .schema
                    .clash(&dup)
                    .unwrap_or_else(|| dup.id().to_string());
                self.error = Some(StageError::DuplicateParam {
                    stage: self.name.clone(),
                    param,
                })
            }
        }
        self
    }

    /// `a` and `b` cannot be given together.
    pub fn conflicts(mut self, a: &'static str, b: &'static str) -> Self {
        self.conflicts.push((a, b));
        self
    }

    /// At least one of `ids` must be given.
    pub fn one_of(mut self, group: &'static str, ids: &[&'static str]) -> Self {
        self.groups.push((group, ids.to_vec()));
        self
    }

    /// Binds the function invoked when this stage is selected.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Params) -> anyhow::Result<()> + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Validates the declaration and splits it into the subcommand to attach
    /// and the stage to keep for dispatch.
    pub fn finish(self) -> Result<(Command, BoundStage), StageError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut command = self.command;

        let constrained = self
            .conflicts
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .chain(self.groups.iter().flat_map(|(_, ids)| ids.iter().copied()));
        for id in constrained {
            if !self.schema.contains(id) {
                return Err(StageError::UnknownParam {
                    stage: self.name,
                    param: id.to_string(),
                });
            }
        }

        for (a, b) in &self.conflicts {
            let b = *b;
            command = command.mut_arg(*a, |arg| arg.conflicts_with(b));
        }
        for (group, ids) in self.groups {
            command = command.group(
                ArgGroup::new(group)
                    .args(ids)
                    .required(true)
                    .multiple(true),
            );
        }

        let handler = self
            .handler
            .ok_or_else(|| StageError::MissingHandler(self.name.clone()))?;

        Ok((
            command,
            BoundStage {
                name: self.name,
                schema: self.schema,
                handler,
            },
        ))
    }
}

/// A validated stage: what the dispatcher needs after parsing.
pub struct BoundStage {
    name: String,
    schema: Schema,
    handler: Handler,
}

impl BoundStage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn into_handler(self) -> Handler {
        self.handler
    }
}

impl std::fmt::Debug for BoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundStage")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
