use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::body::DataElement;
use crate::errors::CpuError;
use crate::matcher::{Matcher, MatcherElement};
use crate::parser;

/// What a notation placeholder accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentType {
    /// Any integer expression inside of the inclusive bounds.
    Range { minimum: u64, maximum: u64 },

    /// One keyword out of a fixed set, each standing for a value.
    Enum(BTreeMap<String, u64>),

    /// A concrete integer which is replaced through a lookup table.
    Map(BTreeMap<u64, u64>),

    /// Any expression, bound through unchecked.
    Any,
}

/// One token of a notation.
#[derive(Debug, Clone, PartialEq)]
pub enum NotationElement {
    /// Stands for one of the mode's named arguments.
    Placeholder(String),

    /// A literal reserved word (e.g. the `y` on `($20), y`).
    Keyword(String),

    /// A literal punctuation character (e.g. `#`, `(`, `,`).
    Punctuation(char),
}

pub type Notation = Vec<NotationElement>;

/// One way of addressing memory on this CPU: the surface syntaxes it can be
/// written in, the types its arguments must satisfy, and the byte template
/// it encodes to.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressingMode {
    pub name: String,

    /// Lower goes first whenever several modes share a notation shape (e.g.
    /// zero page shadowing absolute on a 6502).
    pub priority: u64,

    pub notations: Vec<Notation>,

    /// Argument name → type, as referenced by the notations.
    pub arguments: HashMap<String, ArgumentType>,

    /// The bytes this mode encodes to. Free symbols are the argument names
    /// plus the reserved `opcode` and `pc`.
    pub template: Vec<DataElement>,
}

/// An instruction is little more than the opcode it takes under each of the
/// addressing modes it supports.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,

    /// Addressing mode name → opcode.
    pub opcodes: HashMap<String, u64>,
}

/// A full CPU description: addressing modes, instructions, and the lexical
/// sets the parser needs in order to split instruction arguments the way
/// this CPU writes them. Built either from the table in `opcodes` or from a
/// TOML document through [`Cpu::from_toml`].
#[derive(Debug, Default)]
pub struct Cpu {
    pub name: String,
    pub modes: HashMap<String, AddressingMode>,
    pub instructions: HashMap<String, Instruction>,

    /// Every punctuation character appearing in some notation.
    pub punctuation: HashSet<char>,

    /// Every keyword appearing in some notation or enum table.
    pub reserved_words: HashSet<String>,

    matcher: Matcher,
}

impl Cpu {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Register an addressing mode: validate it, thread its notations into
    /// the matcher, and absorb its keywords and punctuation into the lexical
    /// sets.
    pub fn add_mode(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        if self.modes.contains_key(&mode.name) {
            return Err(CpuError {
                message: format!("modes.{}: defined twice", mode.name),
            });
        }
        if mode.notations.is_empty() {
            return Err(CpuError {
                message: format!("modes.{}: at least one notation is required", mode.name),
            });
        }

        for (name, argument) in &mode.arguments {
            match argument {
                ArgumentType::Enum(entries) if entries.is_empty() => {
                    return Err(CpuError {
                        message: format!(
                            "modes.{}.arguments.{}: enum requires at least one entry",
                            mode.name, name
                        ),
                    });
                }
                ArgumentType::Range { minimum, maximum } if minimum > maximum => {
                    return Err(CpuError {
                        message: format!(
                            "modes.{}.arguments.{}: range is inverted",
                            mode.name, name
                        ),
                    });
                }
                _ => {}
            }
        }

        // The template may only reference the mode's own arguments plus the
        // reserved `opcode` and `pc` symbols.
        let mut symbols = BTreeSet::new();
        for element in &mode.template {
            element.expression.collect_variables(&mut symbols);
        }
        for symbol in symbols {
            if symbol != "opcode" && symbol != "pc" && !mode.arguments.contains_key(&symbol) {
                return Err(CpuError {
                    message: format!(
                        "modes.{}.encoding: unknown symbol '{}'",
                        mode.name, symbol
                    ),
                });
            }
        }

        for (notation_index, notation) in mode.notations.iter().enumerate() {
            let mut positions = Vec::with_capacity(notation.len());
            let mut seen = HashSet::new();

            for element in notation {
                match element {
                    NotationElement::Placeholder(name) => {
                        if !seen.insert(name.clone()) {
                            return Err(CpuError {
                                message: format!(
                                    "modes.{}.notation: placeholder '{}' appears twice",
                                    mode.name, name
                                ),
                            });
                        }
                        match mode.arguments.get(name) {
                            Some(ArgumentType::Enum(entries)) => positions.push(
                                entries
                                    .keys()
                                    .map(|keyword| MatcherElement::Keyword(keyword.clone()))
                                    .collect(),
                            ),
                            Some(_) => positions.push(vec![MatcherElement::Integer]),
                            None => {
                                return Err(CpuError {
                                    message: format!(
                                        "modes.{}.notation: placeholder '{}' has no argument type",
                                        mode.name, name
                                    ),
                                });
                            }
                        }
                    }
                    NotationElement::Keyword(word) => {
                        self.reserved_words.insert(word.to_lowercase());
                        positions.push(vec![MatcherElement::Keyword(word.to_lowercase())]);
                    }
                    NotationElement::Punctuation(c) => {
                        self.punctuation.insert(*c);
                        positions.push(vec![MatcherElement::Punctuation(*c)]);
                    }
                }
            }

            self.matcher
                .add_notation(mode.priority, &mode.name, notation_index, &positions);
        }

        for argument in mode.arguments.values() {
            if let ArgumentType::Enum(entries) = argument {
                for keyword in entries.keys() {
                    self.reserved_words.insert(keyword.to_lowercase());
                }
            }
        }

        self.modes.insert(mode.name.clone(), mode);
        Ok(())
    }

    pub fn add_instruction(&mut self, instruction: Instruction) -> Result<(), CpuError> {
        if self.instructions.contains_key(&instruction.mnemonic) {
            return Err(CpuError {
                message: format!("instructions.{}: defined twice", instruction.mnemonic),
            });
        }
        for mode_name in instruction.opcodes.keys() {
            if !self.modes.contains_key(mode_name) {
                return Err(CpuError {
                    message: format!(
                        "instructions.{}: unknown addressing mode '{}'",
                        instruction.mnemonic, mode_name
                    ),
                });
            }
        }

        self.instructions
            .insert(instruction.mnemonic.clone(), instruction);
        Ok(())
    }

    /// Load a CPU description out of a TOML document. See `cpus/mos6502.toml`
    /// for a complete example of the format.
    pub fn from_toml(text: &str) -> Result<Cpu, CpuError> {
        let root: toml::Table = text.parse().map_err(|err: toml::de::Error| CpuError {
            message: format!("invalid cpu description: {}", err.message()),
        })?;

        let cpu_table = as_table(fetch(&root, "cpu")?, "cpu")?;
        let name = as_str(fetch(cpu_table, "cpu.name")?, "cpu.name")?;
        let mut cpu = Cpu::new(name);

        let modes = as_table(fetch(&root, "modes")?, "modes")?;
        for (index, (mode_name, mode_value)) in modes.iter().enumerate() {
            let path = format!("modes.{}", mode_name);
            let table = as_table(mode_value, &path)?;

            let mut arguments = HashMap::new();
            if let Some(arguments_value) = table.get("arguments") {
                let arguments_path = format!("{}.arguments", path);
                for (argument_name, argument_value) in
                    as_table(arguments_value, &arguments_path)?
                {
                    let argument_path = format!("{}.{}", arguments_path, argument_name);
                    arguments.insert(
                        argument_name.clone(),
                        argument_type(argument_value, &argument_path)?,
                    );
                }
            }

            let priority = match table.get("priority") {
                Some(value) => as_integer(value, &format!("{}.priority", path))?,
                None => index as u64,
            };

            let notation_path = format!("{}.notation", path);
            let notation_value = as_array(fetch(table, &notation_path)?, &notation_path)?;
            let mut notations = Vec::new();
            if notation_value.iter().any(|value| value.is_array()) {
                // A list of alternate notations.
                for alternate in notation_value {
                    notations.push(notation(
                        &arguments,
                        as_array(alternate, &notation_path)?,
                        &notation_path,
                    )?);
                }
            } else {
                notations.push(notation(&arguments, notation_value, &notation_path)?);
            }

            let encoding_path = format!("{}.encoding", path);
            let mut template = Vec::new();
            for element in as_array(fetch(table, &encoding_path)?, &encoding_path)? {
                let text = as_str(element, &encoding_path)?;
                template.push(parser::parse_data_element(text).map_err(|message| CpuError {
                    message: format!("{}: {}", encoding_path, message),
                })?);
            }

            cpu.add_mode(AddressingMode {
                name: mode_name.clone(),
                priority,
                notations,
                arguments,
                template,
            })?;
        }

        let instructions = as_table(fetch(&root, "instructions")?, "instructions")?;
        for (mnemonic, instruction_value) in instructions {
            let path = format!("instructions.{}", mnemonic);
            let mut opcodes = HashMap::new();
            for (mode_name, opcode_value) in as_table(instruction_value, &path)? {
                opcodes.insert(
                    mode_name.clone(),
                    as_integer(opcode_value, &format!("{}.{}", path, mode_name))?,
                );
            }

            cpu.add_instruction(Instruction {
                mnemonic: mnemonic.to_lowercase(),
                opcodes,
            })?;
        }

        Ok(cpu)
    }
}

fn fetch<'a>(table: &'a toml::Table, path: &str) -> Result<&'a toml::Value, CpuError> {
    let key = match path.rsplit_once('.') {
        Some((_, key)) => key,
        None => path,
    };
    table.get(key).ok_or_else(|| CpuError {
        message: format!("{}: missing", path),
    })
}

fn as_table<'a>(value: &'a toml::Value, path: &str) -> Result<&'a toml::Table, CpuError> {
    value.as_table().ok_or_else(|| CpuError {
        message: format!("{}: expected a table", path),
    })
}

fn as_array<'a>(value: &'a toml::Value, path: &str) -> Result<&'a Vec<toml::Value>, CpuError> {
    value.as_array().ok_or_else(|| CpuError {
        message: format!("{}: expected an array", path),
    })
}

fn as_str<'a>(value: &'a toml::Value, path: &str) -> Result<&'a str, CpuError> {
    value.as_str().ok_or_else(|| CpuError {
        message: format!("{}: expected a string", path),
    })
}

fn as_integer(value: &toml::Value, path: &str) -> Result<u64, CpuError> {
    match value.as_integer() {
        Some(integer) if integer >= 0 => Ok(integer as u64),
        Some(_) => Err(CpuError {
            message: format!("{}: must not be negative", path),
        }),
        None => Err(CpuError {
            message: format!("{}: expected an integer", path),
        }),
    }
}

fn argument_type(value: &toml::Value, path: &str) -> Result<ArgumentType, CpuError> {
    let table = as_table(value, path)?;
    let type_path = format!("{}.type", path);
    let type_name = as_str(fetch(table, &type_path)?, &type_path)?;

    match type_name {
        "range" => {
            let minimum_path = format!("{}.minimum", path);
            let maximum_path = format!("{}.maximum", path);
            Ok(ArgumentType::Range {
                minimum: as_integer(fetch(table, &minimum_path)?, &minimum_path)?,
                maximum: as_integer(fetch(table, &maximum_path)?, &maximum_path)?,
            })
        }
        "enum" => {
            let values_path = format!("{}.values", path);
            let mut entries = BTreeMap::new();
            for (keyword, entry) in as_table(fetch(table, &values_path)?, &values_path)? {
                entries.insert(
                    keyword.to_lowercase(),
                    as_integer(entry, &format!("{}.{}", values_path, keyword))?,
                );
            }
            Ok(ArgumentType::Enum(entries))
        }
        "map" => {
            let values_path = format!("{}.values", path);
            let mut entries = BTreeMap::new();
            for (key, entry) in as_table(fetch(table, &values_path)?, &values_path)? {
                // Keys are written as strings but read as integer literals,
                // so hexadecimal spellings like "$10" work too.
                let from = parser::parse_expression(key)
                    .ok()
                    .and_then(|expression| expression.value())
                    .and_then(|value| value.unsigned_value().ok())
                    .ok_or_else(|| CpuError {
                        message: format!("{}: invalid key '{}'", values_path, key),
                    })?;
                entries.insert(from, as_integer(entry, &format!("{}.{}", values_path, key))?);
            }
            Ok(ArgumentType::Map(entries))
        }
        "any" => Ok(ArgumentType::Any),
        other => Err(CpuError {
            message: format!("{}: unknown argument type '{}'", type_path, other),
        }),
    }
}

fn notation(
    arguments: &HashMap<String, ArgumentType>,
    elements: &[toml::Value],
    path: &str,
) -> Result<Notation, CpuError> {
    let mut notation = Vec::with_capacity(elements.len());
    for element in elements {
        notation.push(notation_element(arguments, as_str(element, path)?, path)?);
    }
    Ok(notation)
}

fn notation_element(
    arguments: &HashMap<String, ArgumentType>,
    text: &str,
    path: &str,
) -> Result<NotationElement, CpuError> {
    let trimmed = text.trim();

    if arguments.contains_key(trimmed) {
        return Ok(NotationElement::Placeholder(trimmed.to_string()));
    }

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_alphanumeric() && c != '_' {
            return Ok(NotationElement::Punctuation(c));
        }
    }

    if !trimmed.is_empty()
        && trimmed.chars().all(|c| c.is_alphanumeric() || c == '_')
        && trimmed.chars().any(|c| c.is_alphabetic())
    {
        return Ok(NotationElement::Keyword(trimmed.to_lowercase()));
    }

    Err(CpuError {
        message: format!("{}: invalid element '{}'", path, text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::node::ArgumentNode;

    const LOADER: &str = r##"
[cpu]
name = "loader"

[modes.immediate]
notation = ["#", "value"]
encoding = ["opcode", "value:1"]

[modes.immediate.arguments.value]
type = "range"
minimum = 0
maximum = 255

[modes.absolute]
notation = ["value"]
encoding = ["opcode", "value:2"]

[modes.absolute.arguments.value]
type = "range"
minimum = 0
maximum = 65535

[instructions.lda]
immediate = 0xA9
absolute = 0xAD
"##;

    #[test]
    fn loading_a_description() {
        let cpu = Cpu::from_toml(LOADER).unwrap();

        assert_eq!(cpu.name, "loader");
        assert_eq!(cpu.modes.len(), 2);
        assert_eq!(cpu.instructions["lda"].opcodes["immediate"], 0xA9);
        assert_eq!(cpu.instructions["lda"].opcodes["absolute"], 0xAD);
        assert!(cpu.punctuation.contains(&'#'));
        assert!(cpu.reserved_words.is_empty());

        // Priorities default to declaration order.
        assert_eq!(cpu.modes["immediate"].priority, 0);
        assert_eq!(cpu.modes["absolute"].priority, 1);

        // The immediate template carries a forced 1-byte encoding.
        let element = &cpu.modes["immediate"].template[1];
        assert_eq!(element.expression, Expression::variable("value"));
        assert_eq!(element.encoding.unwrap().size, 1);
    }

    #[test]
    fn loaded_notations_drive_the_matcher() {
        let cpu = Cpu::from_toml(LOADER).unwrap();
        let expression = ArgumentNode::Expression(Expression::from(5u64));

        let matches = cpu
            .matcher()
            .matches(&[ArgumentNode::Punctuation('#'), expression.clone()])
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].mode, "immediate");

        let matches = cpu.matcher().matches(&[expression]).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].mode, "absolute");
    }

    #[test]
    fn enums_fan_out_and_reserve_their_keywords() {
        let cpu = Cpu::from_toml(
            r#"
[cpu]
name = "registers"

[modes.register]
notation = ["mov", "reg"]
encoding = ["opcode + reg"]

[modes.register.arguments.reg]
type = "enum"

[modes.register.arguments.reg.values]
r0 = 0
r1 = 1

[instructions.inc]
register = 0x40
"#,
        )
        .unwrap();

        assert!(cpu.reserved_words.contains("mov"));
        assert!(cpu.reserved_words.contains("r0"));
        assert!(cpu.reserved_words.contains("r1"));

        for register in ["r0", "r1"] {
            let matches = cpu
                .matcher()
                .matches(&[
                    ArgumentNode::Keyword(String::from("mov")),
                    ArgumentNode::Keyword(String::from(register)),
                ])
                .unwrap();
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].mode, "register");
        }
    }

    #[test]
    fn maps_read_their_keys_as_integer_literals() {
        let cpu = Cpu::from_toml(
            r#"
[cpu]
name = "mapped"

[modes.vector]
notation = ["value"]
encoding = ["opcode + value"]

[modes.vector.arguments.value]
type = "map"

[modes.vector.arguments.value.values]
"$00" = 0
"$08" = 1
"16" = 2

[instructions.rst]
vector = 0xC7
"#,
        )
        .unwrap();

        match &cpu.modes["vector"].arguments["value"] {
            ArgumentType::Map(entries) => {
                assert_eq!(entries[&0x00], 0);
                assert_eq!(entries[&0x08], 1);
                assert_eq!(entries[&16], 2);
            }
            other => panic!("expected a map, got {:?}", other),
        }
    }

    #[test]
    fn alternate_notations() {
        let cpu = Cpu::from_toml(
            r#"
[cpu]
name = "alternates"

[modes.accumulator]
notation = [[], ["a"]]
encoding = ["opcode"]

[instructions.asl]
accumulator = 0x0A
"#,
        )
        .unwrap();

        assert_eq!(cpu.modes["accumulator"].notations.len(), 2);
        assert_eq!(cpu.matcher().matches(&[]).unwrap().len(), 1);
        assert_eq!(
            cpu.matcher()
                .matches(&[ArgumentNode::Keyword(String::from("A"))])
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn description_validation() {
        let assert_cpu_error = |text: &str, message: &str| {
            assert_eq!(Cpu::from_toml(text).unwrap_err().message, message);
        };

        assert_cpu_error("", "cpu: missing");
        assert_cpu_error("[cpu]\nname = 2\n", "cpu.name: expected a string");
        assert_cpu_error(
            "[cpu]\nname = \"x\"\n[modes.m]\nencoding = []\n[instructions]\n",
            "modes.m.notation: missing",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = ["v"]
encoding = ["opcode", "typo"]

[modes.m.arguments.v]
type = "any"

[instructions]
"#,
            "modes.m.encoding: unknown symbol 'typo'",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = ["v"]
encoding = ["v"]

[modes.m.arguments.v]
type = "range"
minimum = 10
maximum = 2

[instructions]
"#,
            "modes.m.arguments.v: range is inverted",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = ["v"]
encoding = ["v"]

[modes.m.arguments.v]
type = "enum"

[modes.m.arguments.v.values]

[instructions]
"#,
            "modes.m.arguments.v: enum requires at least one entry",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = []
encoding = ["opcode"]

[instructions.nop]
other = 0xEA
"#,
            "instructions.nop: unknown addressing mode 'other'",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = []
encoding = ["opcode"]

[instructions.nop]
m = -1
"#,
            "instructions.nop.m: must not be negative",
        );
        assert_cpu_error(
            r#"
[cpu]
name = "x"

[modes.m]
notation = ["v"]
encoding = ["v"]

[modes.m.arguments.v]
type = "weird"

[instructions]
"#,
            "modes.m.arguments.v.type: unknown argument type 'weird'",
        );
    }

    // A word which is not declared as an argument reads as a keyword, so
    // this can only happen by building the mode directly.
    #[test]
    fn placeholders_must_have_an_argument_type() {
        let mut cpu = Cpu::new("direct");
        let err = cpu
            .add_mode(AddressingMode {
                name: String::from("m"),
                priority: 0,
                notations: vec![vec![NotationElement::Placeholder(String::from("value"))]],
                arguments: HashMap::new(),
                template: Vec::new(),
            })
            .unwrap_err();
        assert_eq!(
            err.message,
            "modes.m.notation: placeholder 'value' has no argument type"
        );
    }

    #[test]
    fn big_endian_template_elements() {
        let cpu = Cpu::from_toml(
            r#"
[cpu]
name = "wide"

[modes.extended]
notation = ["value"]
encoding = ["opcode", "value:2be"]

[modes.extended.arguments.value]
type = "range"
minimum = 0
maximum = 65535

[instructions.ldd]
extended = 0xCC
"#,
        )
        .unwrap();

        let encoding = cpu.modes["extended"].template[1].encoding.unwrap();
        assert_eq!(encoding.size, 2);
        assert_eq!(encoding.byte_order, crate::encoding::ByteOrder::Big);
    }
}
