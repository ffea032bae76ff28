//! Object identities.
//!
//! An `Identity` is the key under which a servant is registered in a
//! [`NodeRegistry`](crate::registry::NodeRegistry). It is a plain value: cheap
//! to clone, comparable and hashable, and serializable so it can travel inside
//! remote references.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Name of the well-known root directory identity.
pub const ROOT_NAME: &str = "RootDir";

/// Unique address of one servant within a registry.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    /// Usually empty; kept so identities can be grouped by kind of object.
    pub category: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }

    /// The fixed identity of the tree root (`"RootDir"`, no category).
    ///
    /// A fresh client can always locate the root through this identity and
    /// the host endpoint alone.
    pub fn root() -> Self {
        Self::new(ROOT_NAME, "")
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_NAME && self.category.is_empty()
    }
}

/// Writes one component, escaping `/` and `\` with a backslash.
fn write_escaped(f: &mut fmt::Formatter<'_>, part: &str) -> fmt::Result {
    for c in part.chars() {
        if c == '/' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

impl fmt::Display for Identity {
    /// `name` when the category is empty, else `category/name`. A `/` or
    /// `\` inside either component is written as `\/` or `\\`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.category.is_empty() {
            write_escaped(f, &self.category)?;
            f.write_char('/')?;
        }
        write_escaped(f, &self.name)
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    /// Parses the `Display` form back. The first unescaped `/` separates the
    /// category from the name; a second one, a dangling `\`, or an empty
    /// name is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidIdentity(s.to_string());
        let mut category = None;
        let mut current = String::with_capacity(s.len());
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => current.push(chars.next().ok_or_else(invalid)?),
                '/' if category.is_none() => category = Some(std::mem::take(&mut current)),
                '/' => return Err(invalid()),
                c => current.push(c),
            }
        }

        if current.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(current, category.unwrap_or_default()))
    }
}
