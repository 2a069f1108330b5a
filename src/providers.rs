//! Term provider surface.
//!
//! Providers parse on-disk column data into per-split term sequences; that
//! parsing lives outside this crate. The scheduling layer needs exactly two
//! things: a lazy term source per (field, split), and a field-name-keyed
//! registry of providers built once per run.

use std::fmt;
use std::io;
use std::path::Path;

use crate::executor::ExecutorService;
use crate::shard::Shard;
use crate::term::{Term, TermType};

/// Lazy term sequence for one (field, split) pair.
///
/// Sources are finite and not restartable within a run: once `next_term`
/// returns `None`, it keeps returning `None`.
pub trait TermSource: Send {
    /// Next term in this split's sequence, or `None` once exhausted.
    fn next_term(&mut self) -> Option<Term>;
}

/// Per-field term provider: yields one lazy source per split.
pub trait TermProvider: Send + Sync {
    /// Type of every term this provider yields.
    fn term_type(&self) -> TermType;

    /// Lazy term sequence for `split`.
    ///
    /// A given split is requested at most once per run.
    fn split_source(&self, split: usize) -> Box<dyn TermSource>;
}

/// Field-name-keyed provider registry for one term type.
///
/// Built once per run by the [`ProviderFactory`]; field order follows the
/// caller's field-name list.
pub struct TermProviders {
    fields: Vec<(String, Box<dyn TermProvider>)>,
}

impl TermProviders {
    /// Wraps an ordered `(field name, provider)` list.
    pub fn new(fields: Vec<(String, Box<dyn TermProvider>)>) -> Self {
        Self { fields }
    }

    /// An empty registry, for runs with no fields of this type.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Provider for `field`, if registered.
    pub fn get(&self, field: &str) -> Option<&dyn TermProvider> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, provider)| provider.as_ref())
    }

    /// Iterates `(field name, provider)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn TermProvider)> {
        self.fields
            .iter()
            .map(|(name, provider)| (name.as_str(), provider.as_ref()))
    }
}

impl fmt::Debug for TermProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|(name, _)| name))
            .finish()
    }
}

/// Builds both provider registries at runner construction. External seam:
/// the implementation decides how shard data becomes term sequences.
pub trait ProviderFactory: Send + Sync {
    /// Builds the registry for `field_names` over `shards`.
    ///
    /// `split_dir` is the staging directory for split intermediates and
    /// `executor` the submission service, for factories that parallelize
    /// their own setup.
    ///
    /// # Errors
    /// Any failure aborts runner construction.
    fn providers(
        &self,
        shards: &[Shard],
        field_names: &[String],
        term_type: TermType,
        split_dir: &Path,
        num_splits: usize,
        executor: &dyn ExecutorService,
    ) -> Result<TermProviders, ProviderError>;
}

/// Fatal provider-construction failure.
#[derive(Debug)]
#[non_exhaustive]
pub enum ProviderError {
    /// I/O failure while staging split data.
    Io(io::Error),
    /// A requested field exists in no shard.
    UnknownField(String),
    /// Any other factory-specific failure.
    Other(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::UnknownField(field) => write!(f, "unknown field: {field}"),
            Self::Other(detail) => write!(f, "provider failure: {detail}"),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProviderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
