// src/registry.rs

//! Custom token registration.
//!
//! Callers extend the language with their own tokens (`[user]`,
//! `[datetime]`, ...) by registering a name, an arity, and a function
//! producing the substitution text. The table is owned by one interpreter
//! instance; there is no process-wide registry. Registering a duplicate
//! name is a caller programming error and is reported as an `Err` at
//! registration time, never at render time.

use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// The substitution function for a registered token. Receives the token's
/// arguments and returns the replacement text, which is rendered in the
/// currently active style.
pub type TokenFn = Box<dyn Fn(&[String]) -> String>;

/// A registered custom token: its function and declared argument count.
///
/// When a template invokes the token with fewer trailing fields than
/// `arity`, the function receives an empty argument slice, not a partial
/// one.
pub struct RegisteredToken {
    pub func: TokenFn,
    pub arity: usize,
}

impl fmt::Debug for RegisteredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredToken")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Error returned when registering a token name that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateToken(pub String);

impl fmt::Display for DuplicateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token {} already registered", self.0)
    }
}

impl Error for DuplicateToken {}

/// Name -> token table. Names are stored lowercase; all lookups are
/// case-insensitive.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<String, RegisteredToken>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        TokenRegistry::default()
    }

    /// Registers a token. The name is matched case-insensitively in
    /// templates. Duplicate names fail here, at registration time.
    pub fn register(
        &mut self,
        name: &str,
        arity: usize,
        func: impl Fn(&[String]) -> String + 'static,
    ) -> Result<(), DuplicateToken> {
        let key = name.to_ascii_lowercase();
        if self.tokens.contains_key(&key) {
            return Err(DuplicateToken(key));
        }
        debug!("registered custom token {:?} (arity {})", key, arity);
        self.tokens.insert(
            key,
            RegisteredToken {
                func: Box::new(func),
                arity,
            },
        );
        Ok(())
    }

    /// Looks a token up by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&RegisteredToken> {
        self.tokens.get(&name.to_ascii_lowercase())
    }
}
