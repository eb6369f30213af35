use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one utility network (e.g. `"power"`, `"water"`).
///
/// Networks are independent: the same grid cell may belong to several of
/// them at once. Cloning a `Connection` built from a string literal is free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connection(Cow<'static, str>);

impl Connection {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Build a connection from a runtime string (e.g. read from a config or
    /// a membership snapshot).
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Connection {
    fn from(name: &'static str) -> Self {
        Connection::new(name)
    }
}
