use super::{ParamKind, Schema, StageError};
use clap::ArgMatches;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// A resolved parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Flag(bool),
    Count(u8),
    Text(String),
    Int(i64),
    Float(f64),
    Path(PathBuf),
}

/// The parameters handed to a stage handler: exactly the ids the stage
/// declared, in declaration order. Optional parameters without a default that
/// the user left out are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: IndexMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls the values of `schema`'s parameters out of a stage's matches.
    /// Ids outside the schema, like global flags propagated from the root
    /// command, are never looked at.
    pub fn from_matches(
        stage: &str,
        schema: &Schema,
        matches: &ArgMatches,
    ) -> Result<Self, StageError> {
        let mut params = Params::new();

        for spec in schema.iter() {
            let id = spec.id();
            let fail = |err: clap::parser::MatchesError| StageError::Extract {
                stage: stage.to_string(),
                param: id.to_string(),
                message: err.to_string(),
            };

            let value = match spec.kind() {
                ParamKind::Flag => matches
                    .try_get_one::<bool>(id)
                    .map_err(fail)?
                    .map(|v| Value::Flag(*v)),
                ParamKind::Count => matches
                    .try_get_one::<u8>(id)
                    .map_err(fail)?
                    .map(|v| Value::Count(*v)),
                ParamKind::Text | ParamKind::Choice(_) => matches
                    .try_get_one::<String>(id)
                    .map_err(fail)?
                    .map(|v| Value::Text(v.clone())),
                ParamKind::Int => matches
                    .try_get_one::<i64>(id)
                    .map_err(fail)?
                    .map(|v| Value::Int(*v)),
                ParamKind::Float => matches
                    .try_get_one::<f64>(id)
                    .map_err(fail)?
                    .map(|v| Value::Float(*v)),
                ParamKind::File | ParamKind::Dir | ParamKind::Path => matches
                    .try_get_one::<PathBuf>(id)
                    .map_err(fail)?
                    .map(|v| Value::Path(v.clone())),
            };

            if let Some(value) = value {
                params.insert(id, value);
            }
        }

        Ok(params)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(id.into(), value)
    }

    /// Builder form of [`Params::insert`].
    pub fn with(mut self, id: impl Into<String>, value: Value) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// `false` when absent.
    pub fn flag(&self, id: &str) -> bool {
        matches!(self.get(id), Some(Value::Flag(true)))
    }

    /// `0` when absent.
    pub fn count(&self, id: &str) -> u8 {
        match self.get(id) {
            Some(Value::Count(n)) => *n,
            _ => 0,
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.get(id) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn int(&self, id: &str) -> Option<i64> {
        match self.get(id) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn float(&self, id: &str) -> Option<f64> {
        match self.get(id) {
            Some(Value::Float(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        match self.get(id) {
            Some(Value::Path(p)) => Some(p.as_path()),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::stage::ParamSpec;
    use clap::Command;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        for spec in [
            ParamSpec::text("input").required(),
            ParamSpec::int("threads").default("1"),
            ParamSpec::float("op"),
            ParamSpec::flag("memsave"),
            ParamSpec::path("out"),
        ] {
            schema.push(spec).unwrap();
        }
        schema
    }

    fn command(schema: &Schema) -> Command {
        schema
            .iter()
            .fold(Command::new("demo"), |cmd, spec| cmd.arg(spec.to_arg()))
            .arg(
                clap::Arg::new("extra")
                    .long("extra")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    #[test]
    fn extracts_declared_values_only() {
        let schema = schema();
        let matches = command(&schema)
            .try_get_matches_from(["demo", "--input", "a.fa", "--op", "1.53", "--extra"])
            .unwrap();

        let params = Params::from_matches("demo", &schema, &matches).unwrap();
        assert_eq!(
            params.names().collect::<Vec<_>>(),
            vec!["input", "threads", "op", "memsave"]
        );
        assert_eq!(params.text("input"), Some("a.fa"));
        assert_eq!(params.int("threads"), Some(1));
        assert_eq!(params.float("op"), Some(1.53));
        assert!(!params.flag("memsave"));
        assert!(params.path("out").is_none());
        assert!(!params.contains("extra"));
    }

    #[test]
    fn typed_getters_do_not_coerce() {
        let params = Params::new()
            .with("threads", Value::Int(4))
            .with("input", Value::Text("x".to_string()));

        assert_eq!(params.int("threads"), Some(4));
        assert_eq!(params.text("threads"), None);
        assert_eq!(params.int("input"), None);
        assert_eq!(params.count("verbose"), 0);
        assert_eq!(params.len(), 2);
    }
}
