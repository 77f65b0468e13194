//! Cache key types: [`Fingerprint`] identifies a cached command invocation,
//! [`DatabaseKey`] names a server-side key it depends on.

use std::fmt;

/// A byte string naming a key on the server.
pub type DatabaseKey = Vec<u8>;

/// The identity of a cached command invocation.
///
/// A fingerprint is the uppercased command name followed by its positional
/// arguments, e.g. `("GET", "foo")` or `("MGET", "foo", "bar")`. Two
/// fingerprints are equal iff their token sequences are equal element-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    tokens: Vec<Vec<u8>>,
}

impl Fingerprint {
    /// Builds a fingerprint from a command name and its arguments.
    ///
    /// The command name is uppercased; arguments are taken verbatim.
    pub fn new(command: &str, args: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Self {
        let mut tokens = Vec::with_capacity(1);
        tokens.push(command.to_ascii_uppercase().into_bytes());
        tokens.extend(args.into_iter().map(Into::into));
        Self { tokens }
    }

    /// The uppercased command name, the first token.
    pub fn command(&self) -> &[u8] {
        &self.tokens[0]
    }

    /// The positional arguments, excluding the command name.
    pub fn args(&self) -> &[Vec<u8>] {
        &self.tokens[1..]
    }

    /// All tokens including the command name, for diagnostics and tests.
    pub fn tokens(&self) -> &[Vec<u8>] {
        &self.tokens
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", String::from_utf8_lossy(token))?;
        }
        write!(f, ")")
    }
}
