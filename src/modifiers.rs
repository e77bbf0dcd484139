//! Declaration modifiers resolved once from whole tokens.
//!
//! A dump line like `public static readonly int Count; // 0x0` carries its
//! modifiers as leading keywords. They are turned into a flag set at parse
//! time so later checks never have to scan text again.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Internal,
    Static,
    Sealed,
    Abstract,
    Virtual,
    Override,
    Readonly,
    Const,
    Extern,
    New,
    Unsafe,
    Volatile,
}

impl Modifier {
    pub const ALL: [Modifier; 15] = [
        Modifier::Public,
        Modifier::Private,
        Modifier::Protected,
        Modifier::Internal,
        Modifier::Static,
        Modifier::Sealed,
        Modifier::Abstract,
        Modifier::Virtual,
        Modifier::Override,
        Modifier::Readonly,
        Modifier::Const,
        Modifier::Extern,
        Modifier::New,
        Modifier::Unsafe,
        Modifier::Volatile,
    ];

    pub fn from_keyword(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.keyword() == token)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Internal => "internal",
            Modifier::Static => "static",
            Modifier::Sealed => "sealed",
            Modifier::Abstract => "abstract",
            Modifier::Virtual => "virtual",
            Modifier::Override => "override",
            Modifier::Readonly => "readonly",
            Modifier::Const => "const",
            Modifier::Extern => "extern",
            Modifier::New => "new",
            Modifier::Unsafe => "unsafe",
            Modifier::Volatile => "volatile",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }

    /// Splits the leading run of modifier keywords off a token list.
    ///
    /// Returns the collected set and the tokens that follow it.
    pub fn split_leading<'a, 'b>(tokens: &'b [&'a str]) -> (Self, &'b [&'a str]) {
        let mut modifiers = Self::empty();
        let mut consumed = 0;
        for token in tokens {
            match Modifier::from_keyword(token) {
                Some(m) => {
                    modifiers.insert(m);
                    consumed += 1;
                }
                None => break,
            }
        }
        (modifiers, &tokens[consumed..])
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Self::empty();
        for m in iter {
            set.insert(m);
        }
        set
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for m in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(m.keyword())?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Modifiers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_leading_stops_at_first_non_keyword() {
        let tokens = ["public", "static", "readonly", "int", "Count"];
        let (mods, rest) = Modifiers::split_leading(&tokens);
        assert!(mods.contains(Modifier::Public));
        assert!(mods.contains(Modifier::Static));
        assert!(mods.contains(Modifier::Readonly));
        assert!(!mods.contains(Modifier::Const));
        assert_eq!(rest, &["int", "Count"]);
    }

    #[test]
    fn keywords_match_whole_tokens_only() {
        assert_eq!(Modifier::from_keyword("static"), Some(Modifier::Static));
        assert_eq!(Modifier::from_keyword("staticky"), None);
        assert_eq!(Modifier::from_keyword("Static"), None);
    }

    #[test]
    fn display_uses_keyword_table_order() {
        let mods: Modifiers = [Modifier::Override, Modifier::Public].into_iter().collect();
        assert_eq!(mods.to_string(), "public override");
        assert_eq!(Modifiers::empty().to_string(), "");
    }

    #[test]
    fn serializes_as_plain_string() {
        let mods: Modifiers = [Modifier::Private, Modifier::Static].into_iter().collect();
        assert_eq!(serde_json::to_string(&mods).unwrap(), "\"private static\"");
    }
}
