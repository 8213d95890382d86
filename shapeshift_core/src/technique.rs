use rand_core::RngCore;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Grouping label attached to every `Technique`.
///
/// The four built-in families are named variants; anything else supplied by an
/// external technique lands in `Other` and is compared by its label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Encoding,
    Mutation,
    Structural,
    Context,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Encoding => "encoding",
            Category::Mutation => "mutation",
            Category::Structural => "structural",
            Category::Context => "context",
            Category::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "encoding" => Category::Encoding,
            "mutation" => Category::Mutation,
            "structural" => Category::Structural,
            "context" => Category::Context,
            other => Category::Other(other.to_string()),
        })
    }
}

/// A `Technique` turns one payload into zero or more candidate variants.
///
/// Techniques are the pluggable unit of the engine. They are constructed once, registered
/// with a [`TechniqueRegistry`](crate::registry::TechniqueRegistry) and then shared read-only
/// (behind `Arc`) by every engine in the process, which is why the trait requires
/// `Send + Sync` and `transform` only takes `&self`.
///
/// Randomized techniques (random casing, random split points, ...) must draw from the
/// supplied `rng` rather than a thread-local generator so that a seeded engine reproduces
/// its output exactly.
pub trait Technique: Send + Sync {
    /// Unique identifier, used for selection on the command line and in result records.
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Produces candidate variants for `payload`.
    ///
    /// # Returns
    /// * `Ok(candidates)`: possibly empty when the transformation does not apply
    ///   (payload too short, nothing to substitute, ...). Duplicates and candidates equal
    ///   to the payload are allowed; the engine deduplicates.
    /// * `Err(error)`: unexpected input. The engine logs the error and treats the call as
    ///   having produced nothing.
    fn transform(&self, payload: &str, rng: &mut dyn RngCore)
    -> Result<Vec<String>, anyhow::Error>;
}

impl fmt::Debug for dyn Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Technique")
            .field("name", &self.name())
            .field("category", &self.category())
            .finish()
    }
}
