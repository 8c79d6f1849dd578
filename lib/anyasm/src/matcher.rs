use std::collections::{BTreeMap, BTreeSet};

use crate::node::ArgumentNode;

/// How the matcher sees one argument token. Every concrete expression shape
/// collapses into `Integer` on purpose: which notation a statement follows
/// is decided by its punctuation/keyword skeleton alone, and the winning
/// mode's own argument table takes it from there.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatcherElement {
    Integer,
    Keyword(String),
    Punctuation(char),
}

/// One structural match: an addressing mode plus which of its notations the
/// arguments followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub mode: String,
    pub notation: usize,
}

#[derive(Debug, Default)]
struct MatcherNode {
    children: BTreeMap<MatcherElement, MatcherNode>,

    // (priority, mode name, notation index) of every notation ending here,
    // kept sorted so the encoder tries preferred modes first and error
    // messages come out stable.
    terminal: BTreeSet<(u64, String, usize)>,
}

/// A trie over argument shapes. Built once while loading a CPU description;
/// queries never mutate it.
#[derive(Debug, Default)]
pub struct Matcher {
    root: MatcherNode,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one notation of `mode`. Each position holds the alternative
    /// elements accepted there: a plain token has exactly one, an enum
    /// placeholder has one keyword per entry.
    pub fn add_notation(
        &mut self,
        priority: u64,
        mode: &str,
        notation: usize,
        positions: &[Vec<MatcherElement>],
    ) {
        Self::add(&mut self.root, priority, mode, notation, positions);
    }

    fn add(
        node: &mut MatcherNode,
        priority: u64,
        mode: &str,
        notation: usize,
        positions: &[Vec<MatcherElement>],
    ) {
        match positions.split_first() {
            Some((alternatives, rest)) => {
                for element in alternatives {
                    let child = node.children.entry(element.clone()).or_default();
                    Self::add(child, priority, mode, notation, rest);
                }
            }
            None => {
                node.terminal.insert((priority, mode.to_string(), notation));
            }
        }
    }

    /// All the addressing modes the given argument list could be written in,
    /// sorted by (priority, mode name, notation). An empty result is not an
    /// error: it reads as "no mode is written like this".
    pub fn matches(&self, arguments: &[ArgumentNode]) -> Result<Vec<Match>, String> {
        let mut node = &self.root;
        for argument in arguments {
            let element = Self::classify(argument)?;
            match node.children.get(&element) {
                Some(child) => node = child,
                None => return Ok(Vec::new()),
            }
        }

        Ok(node
            .terminal
            .iter()
            .map(|(_, mode, notation)| Match {
                mode: mode.clone(),
                notation: *notation,
            })
            .collect())
    }

    fn classify(argument: &ArgumentNode) -> Result<MatcherElement, String> {
        match argument {
            ArgumentNode::Expression(_) => Ok(MatcherElement::Integer),
            ArgumentNode::Keyword(word) => Ok(MatcherElement::Keyword(word.to_lowercase())),
            ArgumentNode::Punctuation(c) => Ok(MatcherElement::Punctuation(*c)),
            ArgumentNode::Label(name) => {
                Err(format!("label '{}' is not allowed as an argument", name))
            }
            ArgumentNode::Instruction(name) => Err(format!(
                "instruction '{}' is not allowed as an argument",
                name
            )),
        }
    }
}
