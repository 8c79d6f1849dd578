use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;

use crate::body::Body;
use crate::cpu::Cpu;
use crate::encoder::encode_instruction;
use crate::encoding::SizeRange;
use crate::errors::{Error, EvalError};
use crate::eval::{Environment, EvaluationContext};
use crate::expression::{BinaryOperator, Expression};
use crate::node::{PStatement, PString, Statement};
use crate::parser::Parser;

// Sizes only ever narrow, so label tables settle quickly; the cap covers
// sources whose tables never stop moving.
const MAX_PASSES: usize = 10;

/// One assembled statement: the bytes it produced and the source line they
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub line: usize,
}

/// The driver. Parsing happens once; after that the statements are walked
/// over and over, each pass re-encoding them against the label table the
/// previous pass produced, until the table stops moving. A final emission
/// pass then resolves every body against the settled symbols and turns it
/// into bytes.
pub struct Assembler<'a> {
    cpu: &'a Cpu,
}

// Where a label ended up: the region it belongs to plus its offset range
// inside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LabelSlot {
    region: usize,
    offset: SizeRange,
}

// A statement which produces bytes.
struct Slot {
    line: usize,
    region: usize,
    body: Body,
}

struct Walk {
    labels: HashMap<String, LabelSlot>,

    // (line, base address) of every region. Region 0 is implicit; each
    // `.org` opens the next one.
    origins: Vec<(usize, Option<u64>)>,

    slots: Vec<Slot>,
    errors: Vec<EvalError>,
}

impl<'a> Assembler<'a> {
    pub fn new(cpu: &'a Cpu) -> Self {
        Self { cpu }
    }

    pub fn assemble(&self, reader: impl Read) -> Result<Vec<Encoded>, Vec<Error>> {
        let mut parser = Parser::new(self.cpu);
        if let Err(parse_errors) = parser.parse(reader) {
            return Err(parse_errors.into_iter().map(Error::Parse).collect());
        }
        self.assemble_statements(&parser.statements)
    }

    pub fn assemble_statements(
        &self,
        statements: &[PStatement],
    ) -> Result<Vec<Encoded>, Vec<Error>> {
        let mut previous = HashMap::new();
        let mut walk = self.walk(statements, &previous);

        for _ in 1..MAX_PASSES {
            if walk.labels == previous {
                break;
            }
            previous = walk.labels.clone();
            walk = self.walk(statements, &previous);
        }

        // A table which is still moving means any per-line errors from the
        // last pass may be transient, so they get replaced wholesale.
        if walk.labels != previous {
            return Err(EvalError::global("label addresses do not settle").into());
        }
        if !walk.errors.is_empty() {
            return Err(walk.errors.into_iter().map(Error::Eval).collect());
        }
        self.emit(statements, &walk)
    }

    // One pass over the statements: track offsets, re-encode every
    // instruction against the previous pass's labels, and come out with a
    // fresher label table.
    fn walk(&self, statements: &[PStatement], previous: &HashMap<String, LabelSlot>) -> Walk {
        let mut environment = Environment::new();
        let mut errors = Vec::new();
        let mut defined = HashSet::new();

        // Labels from the previous pass cover forward references; the walk
        // below overwrites each one as it passes its definition.
        for (name, slot) in previous {
            environment.define_label(name.clone(), slot.offset);
            environment.define_variable(name.clone(), label_reference(name, slot));
        }

        // Assignments are position independent, so they all go in up front.
        for statement in statements {
            if let Statement::Assignment { name, expression } = &statement.statement {
                if let Err(message) = definable(name) {
                    errors.push(EvalError::new(statement.line, message));
                    continue;
                }
                if !defined.insert(name.value.clone()) {
                    errors.push(EvalError::new(
                        statement.line,
                        format!("'{}' is already defined", name.value),
                    ));
                    continue;
                }
                environment.define_variable(name.value.clone(), expression.clone());
            }
        }

        let mut labels = HashMap::new();
        let mut origins = vec![(0, Some(0))];
        let mut slots = Vec::new();
        let mut region = 0usize;
        let mut offset = SizeRange::exact(0);
        environment.define_object(object_name(0), 0);

        for statement in statements {
            match &statement.statement {
                Statement::Assignment { .. } => {}

                Statement::Label(name) => {
                    if let Err(message) = definable(name) {
                        errors.push(EvalError::new(statement.line, message));
                        continue;
                    }
                    if !defined.insert(name.value.clone()) {
                        errors.push(EvalError::new(
                            statement.line,
                            format!("'{}' is already defined", name.value),
                        ));
                        continue;
                    }
                    let slot = LabelSlot { region, offset };
                    labels.insert(name.value.clone(), slot);
                    environment.define_label(name.value.clone(), offset);
                    environment.define_variable(name.value.clone(), label_reference(&name.value, &slot));
                }

                Statement::Origin(expression) => {
                    region += 1;
                    offset = SizeRange::exact(0);
                    let address = match resolve(expression, &EvaluationContext::new(&environment)) {
                        Ok(resolved) => resolved
                            .value()
                            .and_then(|value| value.unsigned_value().ok()),
                        Err(message) => {
                            errors.push(EvalError::new(statement.line, message));
                            None
                        }
                    };
                    origins.push((statement.line, address));
                    if let Some(address) = address {
                        environment.define_object(object_name(region), address);
                    }
                }

                Statement::Data(elements) => {
                    let context =
                        EvaluationContext::new(&environment).with_object(object_name(region));
                    let body = Body::data(elements.clone());
                    let body = match body.evaluate(&context) {
                        Ok(Some(evaluated)) => evaluated,
                        Ok(None) => body,
                        Err(message) => {
                            errors.push(EvalError::new(statement.line, message));
                            continue;
                        }
                    };
                    offset = offset + body.size_range();
                    slots.push(Slot {
                        line: statement.line,
                        region,
                        body,
                    });
                }

                Statement::Instruction {
                    mnemonic,
                    arguments,
                } => {
                    let object = object_name(region);
                    match encode_instruction(
                        self.cpu,
                        mnemonic,
                        arguments,
                        &environment,
                        Some(object.as_str()),
                        offset,
                    ) {
                        Ok(body) => {
                            offset = offset + body.size_range();
                            slots.push(Slot {
                                line: statement.line,
                                region,
                                body,
                            });
                        }
                        Err(message) => errors.push(EvalError::new(statement.line, message)),
                    }
                }
            }
        }

        Walk {
            labels,
            origins,
            slots,
            errors,
        }
    }

    // Resolve every body against the settled symbols and encode it. Bodies
    // which still don't collapse get blamed on the symbols that never
    // resolved.
    fn emit(&self, statements: &[PStatement], walk: &Walk) -> Result<Vec<Encoded>, Vec<Error>> {
        let mut environment = Environment::new();
        for statement in statements {
            if let Statement::Assignment { name, expression } = &statement.statement {
                environment.define_variable(name.value.clone(), expression.clone());
            }
        }
        for (name, slot) in &walk.labels {
            environment.define_label(name.clone(), slot.offset);
            environment.define_variable(name.clone(), label_reference(name, slot));
        }

        let mut errors = Vec::new();
        for (region, (line, address)) in walk.origins.iter().enumerate() {
            match address {
                Some(address) => environment.define_object(object_name(region), *address),
                None => errors.push(EvalError::new(*line, "unknown origin address")),
            }
        }

        let mut undefined = BTreeSet::new();
        let mut output = Vec::new();

        for slot in &walk.slots {
            let context =
                EvaluationContext::new(&environment).with_object(object_name(slot.region));
            let body = match slot.body.evaluate(&context) {
                Ok(Some(body)) => body,
                Ok(None) => slot.body.clone(),
                Err(message) => {
                    errors.push(EvalError::new(slot.line, message));
                    continue;
                }
            };

            let mut bytes = Vec::new();
            match body.encode(&mut bytes) {
                Ok(()) => output.push(Encoded {
                    bytes,
                    line: slot.line,
                }),
                Err(message) => {
                    let mut names = BTreeSet::new();
                    body.collect_variables(&mut names);
                    let mut blamed = false;
                    for name in names {
                        if environment.get_variable(&name).is_none()
                            && environment.get_label(&name).is_none()
                            && environment.get_function(&name).is_none()
                        {
                            blamed = true;
                            if undefined.insert(name.clone()) {
                                errors.push(EvalError::new(
                                    slot.line,
                                    format!("undefined symbol '{}'", name),
                                ));
                            }
                        }
                    }
                    if !blamed {
                        errors.push(EvalError::new(slot.line, message));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors.into_iter().map(Error::Eval).collect())
        }
    }
}

fn object_name(region: usize) -> String {
    format!("@{}", region)
}

// What a label's name stands for inside expressions: its region's base
// address plus its offset in there.
fn label_reference(name: &str, slot: &LabelSlot) -> Expression {
    Expression::binary(
        Expression::object(object_name(slot.region)),
        BinaryOperator::Add,
        Expression::label(name, slot.offset),
    )
    .unwrap_or_else(|_| Expression::label(name, slot.offset))
}

// `opcode` and `pc` belong to encoding templates and can't be defined from
// source.
fn definable(name: &PString) -> Result<(), String> {
    if name.value == "pc" || name.value == "opcode" {
        return Err(format!("cannot use reserved name '{}'", name.value));
    }
    Ok(())
}

fn resolve(expression: &Expression, context: &EvaluationContext) -> Result<Expression, String> {
    Ok(match expression.evaluate(context)? {
        Some(evaluated) => evaluated,
        None => expression.clone(),
    })
}
