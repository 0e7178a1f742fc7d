use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction};
use std::path::PathBuf;

/// The value type a parameter accepts on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `--flag`, true when present
    Flag,
    /// `-vvv`, number of occurrences
    Count,
    Text,
    /// One of a closed set of words
    Choice(&'static [&'static str]),
    Int,
    Float,
    /// Path to a file that must exist at parse time
    File,
    /// Path to a directory that must exist at parse time
    Dir,
    /// Any path, existing or not
    Path,
}

/// One named parameter of a stage.
///
/// The id doubles as the long flag unless [`ParamSpec::long`] overrides it.
///
/// ```
/// use hpphylo::libs::stage::ParamSpec;
///
/// let spec = ParamSpec::int("ncpu").default("1").help("Number of CPUs");
/// let arg = spec.to_arg();
/// assert_eq!(arg.get_id().as_str(), "ncpu");
/// assert_eq!(arg.get_long(), Some("ncpu"));
/// assert_eq!(arg.get_default_values()[0].to_str(), Some("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    id: &'static str,
    kind: ParamKind,
    long: Option<&'static str>,
    short: Option<char>,
    required: bool,
    default: Option<&'static str>,
    env: Option<&'static str>,
    value_name: Option<&'static str>,
    heading: Option<&'static str>,
    help: &'static str,
}

impl ParamSpec {
    pub fn new(id: &'static str, kind: ParamKind) -> Self {
        Self {
            id,
            kind,
            long: None,
            short: None,
            required: false,
            default: None,
            env: None,
            value_name: None,
            heading: None,
            help: "",
        }
    }

    pub fn flag(id: &'static str) -> Self {
        Self::new(id, ParamKind::Flag)
    }

    pub fn count(id: &'static str) -> Self {
        Self::new(id, ParamKind::Count)
    }

    pub fn text(id: &'static str) -> Self {
        Self::new(id, ParamKind::Text)
    }

    pub fn choice(id: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(id, ParamKind::Choice(values))
    }

    pub fn int(id: &'static str) -> Self {
        Self::new(id, ParamKind::Int)
    }

    pub fn float(id: &'static str) -> Self {
        Self::new(id, ParamKind::Float)
    }

    pub fn file(id: &'static str) -> Self {
        Self::new(id, ParamKind::File)
    }

    pub fn dir(id: &'static str) -> Self {
        Self::new(id, ParamKind::Dir)
    }

    pub fn path(id: &'static str) -> Self {
        Self::new(id, ParamKind::Path)
    }

    pub fn long(mut self, long: &'static str) -> Self {
        self.long = Some(long);
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default used when the flag is absent. Only parameters with a default
    /// show one in `--help`.
    pub fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub fn env(mut self, name: &'static str) -> Self {
        self.env = Some(name);
        self
    }

    pub fn value_name(mut self, name: &'static str) -> Self {
        self.value_name = Some(name);
        self
    }

    pub fn heading(mut self, heading: &'static str) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The long flag, without dashes.
    pub fn long_name(&self) -> &'static str {
        self.long.unwrap_or(self.id)
    }

    /// The id and flags as they would collide with other arguments:
    /// `id`, `--long`, and `-s` when a short flag is set.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![self.id.to_string(), format!("--{}", self.long_name())];
        if let Some(short) = self.short {
            names.push(format!("-{}", short));
        }
        names
    }

    /// Renders the parameter as a `clap` argument.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.id)
            .long(self.long_name())
            .help(self.help);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }

        arg = match self.kind {
            ParamKind::Flag => arg.action(ArgAction::SetTrue),
            ParamKind::Count => arg.action(ArgAction::Count),
            ParamKind::Text => arg.num_args(1),
            ParamKind::Choice(values) => arg
                .num_args(1)
                .value_parser(PossibleValuesParser::new(values.iter().copied())),
            ParamKind::Int => arg
                .num_args(1)
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true),
            ParamKind::Float => arg
                .num_args(1)
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
            ParamKind::File => arg.num_args(1).value_parser(existing_file),
            ParamKind::Dir => arg.num_args(1).value_parser(existing_dir),
            ParamKind::Path => arg.num_args(1).value_parser(value_parser!(PathBuf)),
        };

        if self.required {
            arg = arg.required(true);
        }
        if let Some(default) = self.default {
            arg = arg.default_value(default);
        }
        if let Some(env) = self.env {
            arg = arg.env(env);
        }
        if let Some(value_name) = self.value_name {
            arg = arg.value_name(value_name);
        }
        if let Some(heading) = self.heading {
            arg = arg.help_heading(heading);
        }

        arg
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file does not exist: {}", value))
    }
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("directory does not exist: {}", value))
    }
}

/// The declared parameters of one stage, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    params: Vec<ParamSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `spec`, handing it back if its id or one of its flags is
    /// already taken.
    pub fn push(&mut self, spec: ParamSpec) -> Result<(), ParamSpec> {
        if self.clash(&spec).is_some() {
            return Err(spec);
        }
        self.params.push(spec);
        Ok(())
    }

    /// The first of `spec`'s [names](ParamSpec::names) some declared
    /// parameter already uses.
    pub fn clash(&self, spec: &ParamSpec) -> Option<String> {
        let taken: Vec<String> = self.params.iter().flat_map(ParamSpec::names).collect();
        spec.names().into_iter().find(|name| taken.contains(name))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.params.iter().any(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
