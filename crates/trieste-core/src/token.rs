//! Token kinds.
//!
//! A [`TokenDef`] is a static descriptor carrying a name and a bitset of
//! behavioral flags. A [`Token`] is a pointer to one; token identity is
//! pointer identity, so two tokens with the same name but different
//! definitions are different kinds.
//!
//! Front-ends declare their tokens with the [`tokens!`] macro:
//!
//! ```
//! use trieste_core::tokens;
//!
//! tokens! {
//!     Calculation = "calculation" [symtab | defbeforeuse];
//!     Assign = "assign" [lookup | shadowing];
//!     Ident = "ident" [print];
//!     Expression = "expression";
//! }
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Behavioral flag bits for token definitions.
#[allow(non_upper_case_globals)]
pub mod flag {
    pub type Flag = u32;

    pub const none: Flag = 0;

    /// Print the location when printing an AST node of this type.
    pub const print: Flag = 1 << 0;

    /// Nodes of this type own a symbol table.
    pub const symtab: Flag = 1 << 1;

    /// Lookups in this node's symbol table only return definitions whose
    /// location precedes the query.
    pub const defbeforeuse: Flag = 1 << 2;

    /// A definition of this type hides parent-scope lookups.
    pub const shadowing: Flag = 1 << 3;

    /// Definitions of this type can be found when looking up.
    pub const lookup: Flag = 1 << 4;

    /// Definitions of this type can be found when looking down.
    pub const lookdown: Flag = 1 << 5;

    /// This type may not appear in user pattern matches.
    pub const internal: Flag = 1 << 6;
}

/// Static descriptor of a token kind.
#[derive(Debug)]
pub struct TokenDef {
    pub name: &'static str,
    pub flags: flag::Flag,
}

impl TokenDef {
    pub const fn new(name: &'static str, flags: flag::Flag) -> Self {
        TokenDef { name, flags }
    }

    pub const fn has(&self, f: flag::Flag) -> bool {
        (self.flags & f) != 0
    }
}

/// A token kind: a pointer to a static [`TokenDef`].
#[derive(Clone, Copy)]
pub struct Token(&'static TokenDef);

impl Token {
    pub const fn new(def: &'static TokenDef) -> Self {
        Token(def)
    }

    pub fn name(self) -> &'static str {
        self.0.name
    }

    pub fn has(self, f: flag::Flag) -> bool {
        self.0.has(f)
    }

    pub fn flags(self) -> flag::Flag {
        self.0.flags
    }

    pub fn in_list(self, list: &[Token]) -> bool {
        list.contains(&self)
    }

    fn addr(self) -> usize {
        self.0 as *const TokenDef as usize
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

/// An unordered set of token kinds.
pub type TokenSet = HashSet<Token>;

/// Declares token statics.
///
/// Each entry is `Name = "printed-name" [flag | flag | ...];` with the flag
/// list optional. Flags are the names in [`flag`].
#[macro_export]
macro_rules! tokens {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $str:literal $([$($fl:ident)|+])? ;)*) => {$(
        $(#[$meta])*
        #[allow(non_upper_case_globals)]
        $vis static $name: $crate::Token = {
            static DEF: $crate::TokenDef = $crate::TokenDef::new(
                $str,
                $crate::flag::none $($(| $crate::flag::$fl)+)?,
            );
            $crate::Token::new(&DEF)
        };
    )*};
}

tokens! {
    /// Placeholder kind; also the "no binding" marker in WF shapes.
    pub Invalid = "invalid";
    /// Emitted by tree builders for unterminated constructs.
    pub Unclosed = "unclosed";
    /// Root of a pipeline tree; owns the process-wide symbol table and the
    /// fresh-name counter.
    pub Top = "top" [symtab];
    /// Parser-level token grouping.
    pub Group = "group";
    pub File = "file";
    pub Directory = "directory";
    /// A rewrite result whose children splice into the parent in place.
    pub Seq = "seq";
    /// A rewrite result that bubbles up to the nearest matching ancestor.
    pub Lift = "lift";
    /// Symbol-table include marker.
    pub Include = "include";
    pub Error = "error";
    pub ErrorMsg = "errormsg" [print];
    pub ErrorAst = "errorast";
    /// Rule-effect sentinel: the rule matched but rewrites nothing.
    pub NoChange = "nochange";
}
