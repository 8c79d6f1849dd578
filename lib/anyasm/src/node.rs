use std::collections::HashSet;
use std::fmt;

use crate::body::DataElement;
use crate::expression::Expression;

/// A Positioned String. That is, a String which also has information on the
/// line number and the column range.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PString {
    /// The actual value.
    pub value: String,

    /// Line number where it has been found.
    pub line: usize,

    /// The start column where it has been found.
    pub start: usize,

    /// The end column where it has been found.
    pub end: usize,
}

impl PString {
    pub fn new(value: impl Into<String>, line: usize, start: usize, end: usize) -> Self {
        Self {
            value: value.into(),
            line,
            start,
            end,
        }
    }

    /// Returns true if the string has either an empty value or an empty range.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() || (self.start == self.end)
    }

    /// Returns an empty tuple if the string contains a valid identifier, or a
    /// String containing the error otherwise. Words which are reserved by the
    /// current CPU description cannot be used as identifiers either.
    pub fn is_valid_identifier(&self, reserved: &HashSet<String>) -> Result<(), String> {
        if self.value.trim().is_empty() {
            return Err(String::from("empty identifier"));
        }

        // You cannot assign into a name which is reserved.
        if reserved.contains(&self.value.to_lowercase()) {
            return Err(format!("cannot use reserved name '{}'", self.value));
        }

        let mut alpha_seen = false;
        for (index, c) in self.value.chars().enumerate() {
            if index == 0 && !(c.is_alphabetic() || c == '_') {
                return Err(format!(
                    "name '{}' must start with an alphabetic character",
                    self.value
                ));
            }
            if !(c.is_alphanumeric() || c == '_') {
                return Err(format!(
                    "invalid character '{}' in name '{}'",
                    c, self.value
                ));
            }
            if c.is_alphabetic() {
                alpha_seen = true;
            }
        }

        // We need at least one alphabetic character. Otherwise it might be
        // confusing with numbers.
        if !alpha_seen {
            return Err(format!(
                "name '{}' requires at least one alphabetic character",
                self.value
            ));
        }

        Ok(())
    }
}

impl fmt::Display for PString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// One argument to an instruction, exactly as the parser saw it. The matcher
/// classifies these into its own element kinds; labels and nested
/// instructions are rejected there, never silently reinterpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentNode {
    /// Anything which reads as an expression, from a bare number to a
    /// parenthesized formula over symbols.
    Expression(Expression),

    /// A reserved word of the CPU description (e.g. the `y` on `($20), y`).
    Keyword(String),

    /// A punctuation character of the CPU description (e.g. `#`, `(`, `,`).
    Punctuation(char),

    /// A label definition. Only valid at statement level.
    Label(String),

    /// A nested instruction. Only valid at statement level.
    Instruction(String),
}

impl fmt::Display for ArgumentNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgumentNode::Expression(expression) => write!(f, "{}", expression),
            ArgumentNode::Keyword(word) => write!(f, "{}", word),
            ArgumentNode::Punctuation(c) => write!(f, "{}", c),
            ArgumentNode::Label(name) => write!(f, "{}:", name),
            ArgumentNode::Instruction(name) => write!(f, "{}", name),
        }
    }
}

/// Everything a source line can state.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name = expression`.
    Assignment {
        name: PString,
        expression: Expression,
    },

    /// `name:`.
    Label(PString),

    /// `.org expression`.
    Origin(Expression),

    /// `.byte ...` / `.word ...`: expressions with their encodings already
    /// attached.
    Data(Vec<DataElement>),

    /// A mnemonic plus its raw argument nodes.
    Instruction {
        mnemonic: PString,
        arguments: Vec<ArgumentNode>,
    },
}

/// A Positioned Statement: a statement plus the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PStatement {
    pub statement: Statement,
    pub line: usize,
}

impl PStatement {
    pub fn new(statement: Statement, line: usize) -> Self {
        Self { statement, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> HashSet<String> {
        ["x", "y", "a"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identifier_validation() {
        let ok = |value: &str| {
            PString::new(value, 0, 0, value.len())
                .is_valid_identifier(&reserved())
                .unwrap()
        };
        ok("foo");
        ok("foo_bar2");
        ok("_start");
        ok("fe");

        let err = |value: &str| {
            PString::new(value, 0, 0, value.len())
                .is_valid_identifier(&reserved())
                .unwrap_err()
        };
        assert_eq!(err(""), "empty identifier");
        assert_eq!(err("X"), "cannot use reserved name 'X'");
        assert_eq!(err("1up"), "name '1up' must start with an alphabetic character");
        assert_eq!(err("foo.bar"), "invalid character '.' in name 'foo.bar'");
        assert_eq!(
            err("_1"),
            "name '_1' requires at least one alphabetic character"
        );
    }

    #[test]
    fn empty_positioned_strings() {
        assert!(PString::default().is_empty());
        assert!(PString::new("foo", 0, 4, 4).is_empty());
        assert!(!PString::new("foo", 0, 0, 3).is_empty());
    }
}
