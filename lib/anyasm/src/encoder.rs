use std::collections::BTreeSet;

use crate::body::{Body, DataElement, IfClause};
use crate::cpu::{AddressingMode, ArgumentType, Cpu, NotationElement};
use crate::encoding::SizeRange;
use crate::eval::{Environment, EvaluationContext};
use crate::expression::{BinaryOperator, Expression};
use crate::node::{ArgumentNode, PString};
use crate::value::Value;

/// Turn one instruction into the body of bytes it encodes to.
///
/// The matcher proposes every addressing mode the arguments could be written
/// in; candidates the instruction doesn't implement are set aside for error
/// reporting, and each remaining one is tried in priority order. Trying a
/// candidate binds its arguments plus `opcode` and `pc`, evaluates the
/// mode's template, and collects the argument ranges and encoding widths
/// into a guard expression. A guard which is already false discards the
/// candidate; one which is already true settles the instruction on the spot.
/// Anything still open comes back as a conditional body which keeps
/// narrowing as the surrounding symbols resolve, with an "arguments out of
/// range" arm at the end in case every guard eventually fails.
pub fn encode_instruction(
    cpu: &Cpu,
    mnemonic: &PString,
    arguments: &[ArgumentNode],
    environment: &Environment,
    object: Option<&str>,
    offset: SizeRange,
) -> Result<Body, String> {
    let instruction = cpu
        .instructions
        .get(&mnemonic.value.to_lowercase())
        .ok_or_else(|| format!("unknown instruction '{}'", mnemonic.value))?;

    let matches = cpu.matcher().matches(arguments)?;
    if matches.is_empty() {
        return Err(String::from("addressing mode not recognized"));
    }

    let mut outer = EvaluationContext::new(environment);
    if let Some(object) = object {
        outer = outer.with_object(object);
    }

    let mut clauses = Vec::new();
    let mut unimplemented = BTreeSet::new();
    let mut implemented = false;

    for candidate in &matches {
        let Some(opcode) = instruction.opcodes.get(&candidate.mode) else {
            unimplemented.insert(candidate.mode.clone());
            continue;
        };
        implemented = true;

        // The matcher only ever reports notations it was fed out of
        // `cpu.modes`, so these lookups cannot miss.
        let mode = cpu.modes.get(&candidate.mode).ok_or_else(|| {
            format!("internal error: unknown addressing mode '{}'", candidate.mode)
        })?;
        let notation = mode.notations.get(candidate.notation).ok_or_else(|| {
            format!(
                "internal error: unknown notation of addressing mode '{}'",
                candidate.mode
            )
        })?;

        if let Some((guard, elements)) =
            encode_candidate(mode, notation, arguments, *opcode, &outer, offset)?
        {
            let decided = guard.value() == Some(Value::Boolean(true));
            clauses.push(IfClause::new(guard, Body::data(elements)));
            if decided {
                break;
            }
        }
    }

    if !implemented {
        let modes: Vec<String> = unimplemented.into_iter().collect();
        return Err(if modes.len() == 1 {
            format!(
                "instruction '{}' doesn't support addressing mode {}",
                mnemonic.value, modes[0]
            )
        } else {
            format!(
                "instruction '{}' doesn't support any of the addressing modes {}",
                mnemonic.value,
                modes.join(", ")
            )
        });
    }
    if clauses.is_empty() {
        return Err(String::from("arguments out of range"));
    }

    clauses.push(IfClause::new(
        Expression::from(true),
        Body::error("arguments out of range"),
    ));
    Ok(Body::conditional(clauses))
}

// One (mode, notation) attempt. None means the guard is already known to be
// false, so the candidate is out of the running.
fn encode_candidate(
    mode: &AddressingMode,
    notation: &[NotationElement],
    arguments: &[ArgumentNode],
    opcode: u64,
    outer: &EvaluationContext,
    offset: SizeRange,
) -> Result<Option<(Expression, Vec<DataElement>)>, String> {
    let mut bindings = Environment::with_parent(outer.environment);
    let mut constraints = Vec::new();

    for (element, argument) in notation.iter().zip(arguments) {
        let NotationElement::Placeholder(name) = element else {
            continue;
        };
        match mode.arguments.get(name) {
            Some(ArgumentType::Range { minimum, maximum }) => {
                let resolved = resolve(argument_expression(argument)?, outer)?;
                constraints.push(Expression::function(
                    "in_range",
                    vec![
                        Expression::from(*minimum),
                        Expression::from(*maximum),
                        resolved.clone(),
                    ],
                )?);
                bindings.define_variable(name.clone(), resolved);
            }
            Some(ArgumentType::Enum(entries)) => {
                // Enum placeholders reach the trie as keyword elements, so
                // a match guarantees a keyword node in this position.
                let ArgumentNode::Keyword(word) = argument else {
                    return Err(String::from("internal error: expected a keyword argument"));
                };
                let value = entries
                    .get(word)
                    .ok_or_else(|| format!("invalid enum argument '{}'", word))?;
                bindings.define_variable(name.clone(), Expression::from(*value));
            }
            Some(ArgumentType::Map(entries)) => {
                let resolved = resolve(argument_expression(argument)?, outer)?;
                let from = resolved
                    .value()
                    .ok_or_else(|| String::from("map arguments must be known up front"))?;
                let to = entries.get(&from.unsigned_value()?).ok_or_else(|| {
                    format!("invalid map argument '{}'", from)
                })?;
                bindings.define_variable(name.clone(), Expression::from(*to));
            }
            Some(ArgumentType::Any) => {
                let resolved = resolve(argument_expression(argument)?, outer)?;
                bindings.define_variable(name.clone(), resolved);
            }
            None => {
                return Err(format!(
                    "internal error: placeholder '{}' has no argument type",
                    name
                ))
            }
        }
    }

    bindings.define_variable("opcode", Expression::from(opcode));
    bindings.define_label("pc", offset);

    let mut context = EvaluationContext::new(&bindings);
    if let Some(object) = &outer.object {
        context = context.with_object(object.clone());
    }

    let mut elements = Vec::with_capacity(mode.template.len());
    for element in &mode.template {
        let resolved = resolve(&element.expression, &context)?;
        if let Some(encoding) = element.encoding {
            match resolved.value() {
                Some(value) => {
                    // The value is known and this variant can't hold it;
                    // another one might.
                    if !encoding.fits(&value) {
                        return Ok(None);
                    }
                }
                None => constraints.push(Expression::function(
                    "in_range",
                    vec![
                        Expression::from(encoding.minimum()),
                        Expression::from(encoding.maximum()),
                        resolved.clone(),
                    ],
                )?),
            }
        }
        elements.push(DataElement::new(resolved, element.encoding));
    }

    let mut guard = Expression::from(true);
    for constraint in constraints {
        if constraint.value() == Some(Value::Boolean(false)) {
            return Ok(None);
        }
        guard = Expression::binary(guard, BinaryOperator::LogicalAnd, constraint)?;
    }
    Ok(Some((guard, elements)))
}

// Non-enum placeholders reach the trie as the integer wildcard, which only
// an expression node matches.
fn argument_expression(argument: &ArgumentNode) -> Result<&Expression, String> {
    match argument {
        ArgumentNode::Expression(expression) => Ok(expression),
        _ => Err(String::from("internal error: expected an expression argument")),
    }
}

fn resolve(expression: &Expression, context: &EvaluationContext) -> Result<Expression, String> {
    Ok(match expression.evaluate(context)? {
        Some(evaluated) => evaluated,
        None => expression.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Statement;
    use crate::opcodes::MOS6502;
    use crate::parser::Parser;

    fn parse_instruction(cpu: &Cpu, line: &str) -> (PString, Vec<ArgumentNode>) {
        let mut parser = Parser::new(cpu);
        parser.parse(line.as_bytes()).unwrap();
        match parser.statements.pop().unwrap().statement {
            Statement::Instruction {
                mnemonic,
                arguments,
            } => (mnemonic, arguments),
            other => panic!("expected an instruction, got {:?}", other),
        }
    }

    fn encode(
        cpu: &Cpu,
        line: &str,
        environment: &Environment,
        offset: SizeRange,
    ) -> Result<Body, String> {
        let (mnemonic, arguments) = parse_instruction(cpu, line);
        encode_instruction(cpu, &mnemonic, &arguments, environment, None, offset)
    }

    fn assert_encodes(cpu: &Cpu, line: &str, bytes: &[u8]) {
        let environment = Environment::new();
        let body = encode(cpu, line, &environment, SizeRange::exact(0)).unwrap();
        let mut out = Vec::new();
        body.encode(&mut out).unwrap();
        assert_eq!(out, bytes, "{}", line);
    }

    fn assert_encode_error(cpu: &Cpu, line: &str, message: &str) {
        let environment = Environment::new();
        let result = encode(cpu, line, &environment, SizeRange::exact(0));
        assert_eq!(result.unwrap_err(), message, "{}", line);
    }

    #[test]
    fn literal_operands_across_the_modes() {
        assert_encodes(&MOS6502, "nop", &[0xEA]);
        assert_encodes(&MOS6502, "lda #$05", &[0xA9, 0x05]);
        assert_encodes(&MOS6502, "lda $10", &[0xA5, 0x10]);
        assert_encodes(&MOS6502, "lda $1234", &[0xAD, 0x34, 0x12]);
        assert_encodes(&MOS6502, "lda $10, x", &[0xB5, 0x10]);
        assert_encodes(&MOS6502, "lda $1234, y", &[0xB9, 0x34, 0x12]);
        assert_encodes(&MOS6502, "lda ($10, x)", &[0xA1, 0x10]);
        assert_encodes(&MOS6502, "lda ($10), y", &[0xB1, 0x10]);
        assert_encodes(&MOS6502, "jmp ($1234)", &[0x6C, 0x34, 0x12]);
        assert_encodes(&MOS6502, "ldx $10, y", &[0xB6, 0x10]);
    }

    #[test]
    fn bare_and_explicit_accumulator() {
        assert_encodes(&MOS6502, "asl", &[0x0A]);
        assert_encodes(&MOS6502, "asl a", &[0x0A]);
        assert_encodes(&MOS6502, "asl $10", &[0x06, 0x10]);
    }

    #[test]
    fn variables_resolve_through_the_environment() {
        let mut environment = Environment::new();
        environment.define_variable("five", Expression::from(5u64));

        let body = encode(&MOS6502, "lda #five", &environment, SizeRange::exact(0)).unwrap();
        let mut out = Vec::new();
        body.encode(&mut out).unwrap();
        assert_eq!(out, vec![0xA9, 0x05]);
    }

    #[test]
    fn unknown_instructions_keep_their_spelling() {
        assert_encode_error(&MOS6502, "foo #$12", "unknown instruction 'foo'");
        assert_encode_error(&MOS6502, "FOO #$12", "unknown instruction 'FOO'");
    }

    #[test]
    fn shapes_no_mode_is_written_in() {
        assert_encode_error(&MOS6502, "lda #$05, x", "addressing mode not recognized");
    }

    #[test]
    fn unsupported_modes_are_reported() {
        assert_encode_error(
            &MOS6502,
            "sta #$05",
            "instruction 'sta' doesn't support addressing mode immediate",
        );
        assert_encode_error(
            &MOS6502,
            "nop $05",
            "instruction 'nop' doesn't support any of the addressing modes \
             absolute, relative, zeropage",
        );
    }

    #[test]
    fn out_of_range_arguments() {
        assert_encode_error(&MOS6502, "lda #$1ff", "arguments out of range");
        assert_encode_error(&MOS6502, "asl $10000", "arguments out of range");
        assert_encode_error(&MOS6502, "lda ($100), y", "arguments out of range");
    }

    #[test]
    fn forward_references_defer_to_a_conditional() {
        let environment = Environment::new();
        let body = encode(&MOS6502, "lda later", &environment, SizeRange::exact(0)).unwrap();

        // Zero page arm, absolute arm, and the out-of-range fallback.
        match &body {
            Body::If(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected a conditional body, got {:?}", other),
        }
        assert_eq!(body.size_range(), SizeRange::new(2, Some(3)));

        // Once the label lands, re-evaluation settles on the absolute arm.
        let mut resolved = Environment::new();
        resolved.define_label("later", SizeRange::exact(0x1234));
        let settled = body
            .evaluate(&EvaluationContext::new(&resolved))
            .unwrap()
            .unwrap();
        let mut out = Vec::new();
        settled.encode(&mut out).unwrap();
        assert_eq!(out, vec![0xAD, 0x34, 0x12]);
    }

    #[test]
    fn branches_subtract_the_program_counter() {
        let mut environment = Environment::new();
        environment.define_label("loop", SizeRange::exact(0));

        let body = encode(&MOS6502, "bne loop", &environment, SizeRange::exact(4)).unwrap();
        let mut out = Vec::new();
        body.encode(&mut out).unwrap();
        assert_eq!(out, vec![0xD0, 0xFA]);
    }

    #[test]
    fn branches_out_of_reach() {
        let mut environment = Environment::new();
        environment.define_label("far", SizeRange::exact(0x300));

        let result = encode(&MOS6502, "bne far", &environment, SizeRange::exact(0));
        assert_eq!(result.unwrap_err(), "arguments out of range");
    }

    // Argument types the 6502 never uses.

    const TOY: &str = r##"
[cpu]
name = "toy"

[modes.register]
notation = ["#", "r"]
encoding = ["opcode", "r:1"]

[modes.register.arguments.r]
type = "enum"

[modes.register.arguments.r.values]
r0 = 0
r1 = 1

[modes.banked]
notation = ["value", ",", "bank"]
encoding = ["opcode", "value:1", "bank:1"]

[modes.banked.arguments.value]
type = "range"
minimum = 0
maximum = 255

[modes.banked.arguments.bank]
type = "map"

[modes.banked.arguments.bank.values]
"0" = 0
"$10" = 8

[modes.raw]
notation = ["!", "value"]
encoding = ["opcode", "value:2"]

[modes.raw.arguments.value]
type = "any"

[instructions.mov]
register = 0x01
banked = 0x02

[instructions.put]
raw = 0x03
"##;

    #[test]
    fn enum_arguments_encode_their_entry() {
        let toy = Cpu::from_toml(TOY).unwrap();
        assert_encodes(&toy, "mov #r0", &[0x01, 0x00]);
        assert_encodes(&toy, "mov #R1", &[0x01, 0x01]);
    }

    #[test]
    fn map_arguments_translate_their_keys() {
        let toy = Cpu::from_toml(TOY).unwrap();
        assert_encodes(&toy, "mov $20, $10", &[0x02, 0x20, 0x08]);
        assert_encode_error(&toy, "mov $20, 3", "invalid map argument '$03'");
        assert_encode_error(&toy, "mov $20, nah", "map arguments must be known up front");
    }

    #[test]
    fn any_arguments_skip_the_range_check() {
        let toy = Cpu::from_toml(TOY).unwrap();
        assert_encodes(&toy, "put !$1234", &[0x03, 0x34, 0x12]);
        assert_encode_error(&toy, "put !$12345", "arguments out of range");
    }
}
