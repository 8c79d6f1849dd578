use std::collections::BTreeSet;
use std::fmt;

use crate::encoding::SizeRange;
use crate::eval::EvaluationContext;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    BitwiseNot,
    LowByte,
    HighByte,
    BankByte,
}

impl UnaryOperator {
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        match self {
            UnaryOperator::Plus => Ok(value.clone()),
            UnaryOperator::Minus => value.negate(),
            UnaryOperator::BitwiseNot => value.bitwise_not(),
            UnaryOperator::LowByte => value.bitwise_and(&Value::Unsigned(0xff)),
            UnaryOperator::HighByte => value
                .shift_right(&Value::Unsigned(8))?
                .bitwise_and(&Value::Unsigned(0xff)),
            UnaryOperator::BankByte => value
                .shift_right(&Value::Unsigned(16))?
                .bitwise_and(&Value::Unsigned(0xff)),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            UnaryOperator::Plus => "",
            UnaryOperator::Minus => "-",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::LowByte => "<",
            UnaryOperator::HighByte => ">",
            UnaryOperator::BankByte => "^",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn apply(&self, left: &Value, right: &Value) -> Result<Value, String> {
        match self {
            BinaryOperator::Add => left.add(right),
            BinaryOperator::Subtract => left.subtract(right),
            BinaryOperator::Multiply => left.multiply(right),
            BinaryOperator::Divide => left.divide(right),
            BinaryOperator::Modulo => left.modulo(right),
            BinaryOperator::ShiftLeft => left.shift_left(right),
            BinaryOperator::ShiftRight => left.shift_right(right),
            BinaryOperator::BitwiseAnd => left.bitwise_and(right),
            BinaryOperator::BitwiseOr => left.bitwise_or(right),
            BinaryOperator::BitwiseXor => left.bitwise_xor(right),
            BinaryOperator::LogicalAnd => left.logical_and(right),
            BinaryOperator::LogicalOr => left.logical_or(right),
            BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
            BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
            BinaryOperator::Less => Ok(Value::Boolean(left < right)),
            BinaryOperator::LessEqual => Ok(Value::Boolean(left <= right)),
            BinaryOperator::Greater => Ok(Value::Boolean(left > right)),
            BinaryOperator::GreaterEqual => Ok(Value::Boolean(left >= right)),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// A symbolic expression: the closed set of node kinds the assembler works
/// with. Trees are immutable, and the only way to build unary/binary nodes
/// is through the smart constructors below, which fold constants and apply
/// a catalog of algebraic simplifications on the way in. That keeps trees
/// small and makes the range inference used for addressing mode selection
/// actually bite.
///
/// `Value` and `Variable` nodes optionally carry an explicit byte size
/// (the `:2` annotation), which overrides the natural width of whatever
/// they resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value {
        value: Value,
        byte_size: Option<u64>,
    },
    Variable {
        name: String,
        byte_size: Option<u64>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Function {
        name: String,
        arguments: Vec<Expression>,
    },
    Label {
        name: String,
        offset: SizeRange,
    },
    Object {
        name: String,
    },
    Void,
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Value {
            value,
            byte_size: None,
        }
    }
}

impl From<u64> for Expression {
    fn from(value: u64) -> Self {
        Expression::from(Value::from(value))
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::from(Value::from(value))
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Expression::from(Value::from(value))
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Void
    }
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Expression {
        Expression::Variable {
            name: name.into(),
            byte_size: None,
        }
    }

    pub fn object(name: impl Into<String>) -> Expression {
        Expression::Object { name: name.into() }
    }

    /// A reference to a label's offset within its object. Collapses to a
    /// plain value as soon as the offset is exact.
    pub fn label(name: impl Into<String>, offset: SizeRange) -> Expression {
        match offset.size() {
            Some(size) => Expression::from(Value::Unsigned(size)),
            None => Expression::Label {
                name: name.into(),
                offset,
            },
        }
    }

    /// A function call node. The `in_range` builtin is lowered right here
    /// into `(lower <= argument) && (argument <= upper)`, so it resolves
    /// statically whenever the argument's range allows it.
    pub fn function(
        name: impl Into<String>,
        arguments: Vec<Expression>,
    ) -> Result<Expression, String> {
        let name = name.into();
        if name == "in_range" {
            if let [lower, upper, argument] = arguments.as_slice() {
                let above = Expression::binary(
                    lower.clone(),
                    BinaryOperator::LessEqual,
                    argument.clone(),
                )?;
                let below = Expression::binary(
                    argument.clone(),
                    BinaryOperator::LessEqual,
                    upper.clone(),
                )?;
                return Expression::binary(above, BinaryOperator::LogicalAnd, below);
            }
        }
        Ok(Expression::Function { name, arguments })
    }

    pub fn unary(operator: UnaryOperator, operand: Expression) -> Result<Expression, String> {
        if operator == UnaryOperator::Plus {
            return Ok(operand);
        }
        if let Some(value) = operand.value() {
            return Ok(Expression::from(operator.apply(&value)?));
        }
        Ok(Expression::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn binary(
        left: Expression,
        operator: BinaryOperator,
        right: Expression,
    ) -> Result<Expression, String> {
        if let (Some(left_value), Some(right_value)) = (left.value(), right.value()) {
            return Ok(Expression::from(operator.apply(&left_value, &right_value)?));
        }

        match operator {
            BinaryOperator::Add => {
                if let Some(right_value) = right.value() {
                    if right_value == Value::Unsigned(0) {
                        // N + 0 -> N
                        return Ok(left);
                    }
                    if let Expression::Binary {
                        left: inner_left,
                        operator: inner_operator,
                        right: inner_right,
                    } = &left
                    {
                        if let Some(inner_value) = inner_right.value() {
                            match inner_operator {
                                BinaryOperator::Add => {
                                    // (N + A) + B -> N + (A+B)
                                    let folded = inner_value.add(&right_value)?;
                                    return Expression::binary(
                                        (**inner_left).clone(),
                                        BinaryOperator::Add,
                                        Expression::from(folded),
                                    );
                                }
                                BinaryOperator::Subtract => {
                                    // (N - A) + B -> N + (B-A)
                                    let folded = inner_value.negate()?.add(&right_value)?;
                                    return Expression::binary(
                                        (**inner_left).clone(),
                                        BinaryOperator::Add,
                                        Expression::from(folded),
                                    );
                                }
                                _ => {}
                            }
                        }
                    }
                }
                if let Some(left_value) = left.value() {
                    if left_value == Value::Unsigned(0) {
                        // 0 + N -> N
                        return Ok(right);
                    }
                    if let Expression::Binary {
                        left: inner_left,
                        operator: inner_operator,
                        right: inner_right,
                    } = &right
                    {
                        if let Some(inner_value) = inner_left.value() {
                            match inner_operator {
                                BinaryOperator::Add => {
                                    // A + (B + N) -> N + (A+B)
                                    let folded = left_value.add(&inner_value)?;
                                    return Expression::binary(
                                        (**inner_right).clone(),
                                        BinaryOperator::Add,
                                        Expression::from(folded),
                                    );
                                }
                                BinaryOperator::Subtract => {
                                    // A + (B - N) -> (A+B) - N
                                    let folded = left_value.add(&inner_value)?;
                                    return Expression::binary(
                                        Expression::from(folded),
                                        BinaryOperator::Subtract,
                                        (**inner_right).clone(),
                                    );
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }

            BinaryOperator::Subtract => {
                if is_unsigned(&right, 0) {
                    // N - 0 -> N
                    return Ok(left);
                }
                if is_unsigned(&left, 0) {
                    // 0 - N -> -N
                    return Expression::unary(UnaryOperator::Minus, right);
                }
                // Differences against a shared base collapse; this is what
                // resolves relative addressing before the base is known.
                match (as_addition(&left), as_addition(&right)) {
                    (Some((left_base, left_offset)), Some((right_base, right_offset)))
                        if same_base(left_base, right_base) =>
                    {
                        // (base + N) - (base + M) -> N - M
                        return Expression::binary(
                            left_offset.clone(),
                            BinaryOperator::Subtract,
                            right_offset.clone(),
                        );
                    }
                    (None, Some((right_base, right_offset))) if same_base(&left, right_base) => {
                        // base - (base + M) -> -M
                        return Expression::unary(UnaryOperator::Minus, right_offset.clone());
                    }
                    (Some((left_base, left_offset)), None) if same_base(left_base, &right) => {
                        // (base + N) - base -> N
                        return Ok(left_offset.clone());
                    }
                    (None, None) if same_base(&left, &right) => {
                        // base - base -> 0
                        return Ok(Expression::from(0u64));
                    }
                    _ => {}
                }
            }

            BinaryOperator::Multiply => {
                if is_unsigned(&left, 0) {
                    // 0 * N -> 0
                    return Ok(left);
                }
                if is_unsigned(&left, 1) {
                    // 1 * N -> N
                    return Ok(right);
                }
                if is_unsigned(&right, 0) {
                    // N * 0 -> 0
                    return Ok(right);
                }
                if is_unsigned(&right, 1) {
                    // N * 1 -> N
                    return Ok(left);
                }
            }

            BinaryOperator::Divide => {
                if is_unsigned(&right, 1) {
                    // N / 1 -> N
                    return Ok(left);
                }
            }

            // Comparisons resolve early when the ranges of both sides
            // already decide them. A missing bound decides nothing.
            BinaryOperator::Equal => {
                if bounds_disjoint(&left, &right) {
                    return Ok(Expression::from(false));
                }
            }

            BinaryOperator::NotEqual => {
                if bounds_disjoint(&left, &right) {
                    return Ok(Expression::from(true));
                }
            }

            BinaryOperator::Greater => {
                if bound_holds(left.minimum_value(), right.maximum_value(), |a, b| a > b) {
                    return Ok(Expression::from(true));
                }
                if bound_holds(left.maximum_value(), right.minimum_value(), |a, b| a <= b) {
                    return Ok(Expression::from(false));
                }
            }

            BinaryOperator::GreaterEqual => {
                if bound_holds(left.minimum_value(), right.maximum_value(), |a, b| a >= b) {
                    return Ok(Expression::from(true));
                }
                if bound_holds(left.maximum_value(), right.minimum_value(), |a, b| a < b) {
                    return Ok(Expression::from(false));
                }
            }

            BinaryOperator::Less => {
                if bound_holds(left.minimum_value(), right.maximum_value(), |a, b| a >= b) {
                    return Ok(Expression::from(false));
                }
                if bound_holds(left.maximum_value(), right.minimum_value(), |a, b| a < b) {
                    return Ok(Expression::from(true));
                }
            }

            BinaryOperator::LessEqual => {
                if bound_holds(left.minimum_value(), right.maximum_value(), |a, b| a > b) {
                    return Ok(Expression::from(false));
                }
                if bound_holds(left.maximum_value(), right.minimum_value(), |a, b| a <= b) {
                    return Ok(Expression::from(true));
                }
            }

            BinaryOperator::LogicalAnd => {
                if is_truthy(&left) {
                    // true && X -> X
                    return Ok(right);
                }
                if is_truthy(&right) {
                    // X && true -> X
                    return Ok(left);
                }
            }

            BinaryOperator::LogicalOr => {
                if is_falsy(&left) {
                    // false || X -> X
                    return Ok(right);
                }
                if is_falsy(&right) {
                    // X || false -> X
                    return Ok(left);
                }
            }

            BinaryOperator::BitwiseAnd => {
                if is_unsigned(&left, 0) {
                    // 0 & X -> 0
                    return Ok(left);
                }
                if is_unsigned(&right, 0) {
                    // X & 0 -> 0
                    return Ok(right);
                }
            }

            BinaryOperator::BitwiseOr | BinaryOperator::BitwiseXor => {
                if is_unsigned(&left, 0) {
                    // 0 | X -> X
                    return Ok(right);
                }
                if is_unsigned(&right, 0) {
                    // X | 0 -> X
                    return Ok(left);
                }
            }

            BinaryOperator::Modulo | BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => {}
        }

        Ok(Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    /// The concrete value of this node, if it is one.
    pub fn value(&self) -> Option<Value> {
        match self {
            Expression::Value { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    pub fn byte_size(&self) -> Option<u64> {
        match self {
            Expression::Value { byte_size, .. } | Expression::Variable { byte_size, .. } => {
                *byte_size
            }
            _ => None,
        }
    }

    /// Attach an explicit byte size. It is an error to squeeze a concrete
    /// value into fewer bytes than it needs.
    pub fn with_byte_size(self, size: u64) -> Result<Expression, String> {
        match self {
            Expression::Value { value, .. } => {
                if size != 0 && value.default_size() != 0 && size < value.default_size() {
                    return Err(String::from("value overflow"));
                }
                Ok(Expression::Value {
                    value,
                    byte_size: Some(size),
                })
            }
            Expression::Variable { name, .. } => Ok(Expression::Variable {
                name,
                byte_size: Some(size),
            }),
            other => Ok(other),
        }
    }

    /// The byte width this expression wants to be encoded in: the explicit
    /// annotation when there is one, the value's natural width otherwise,
    /// 0 when neither is known.
    pub fn default_size(&self) -> u64 {
        match self {
            Expression::Value { value, byte_size } => {
                byte_size.unwrap_or_else(|| value.default_size())
            }
            Expression::Variable { byte_size, .. } => byte_size.unwrap_or(0),
            _ => 0,
        }
    }

    /// A sound lower bound, or None when no useful bound is known.
    pub fn minimum_value(&self) -> Option<Value> {
        match self {
            Expression::Value { value, .. } => Some(value.clone()),
            Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Minus => {
                    operand.maximum_value().and_then(|value| value.negate().ok())
                }
                UnaryOperator::LowByte | UnaryOperator::HighByte | UnaryOperator::BankByte => {
                    Some(Value::Unsigned(0))
                }
                _ => None,
            },
            Expression::Binary {
                left,
                operator,
                right,
            } => match operator {
                BinaryOperator::Add => {
                    fold_bounds(left.minimum_value(), right.minimum_value(), *operator)
                }
                BinaryOperator::Subtract => {
                    fold_bounds(left.minimum_value(), right.maximum_value(), *operator)
                }
                _ => None,
            },
            Expression::Label { offset, .. } => Some(Value::Unsigned(offset.minimum)),
            _ => None,
        }
    }

    /// A sound upper bound, or None when no useful bound is known.
    pub fn maximum_value(&self) -> Option<Value> {
        match self {
            Expression::Value { value, .. } => Some(value.clone()),
            Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Minus => {
                    operand.minimum_value().and_then(|value| value.negate().ok())
                }
                UnaryOperator::LowByte | UnaryOperator::HighByte | UnaryOperator::BankByte => {
                    Some(Value::Unsigned(0xff))
                }
                _ => None,
            },
            Expression::Binary {
                left,
                operator,
                right,
            } => match operator {
                BinaryOperator::Add => {
                    fold_bounds(left.maximum_value(), right.maximum_value(), *operator)
                }
                BinaryOperator::Subtract => {
                    fold_bounds(left.maximum_value(), right.minimum_value(), *operator)
                }
                _ => None,
            },
            Expression::Label { offset, .. } => offset.maximum.map(Value::Unsigned),
            _ => None,
        }
    }

    /// Resolve this expression one step further against the given context.
    /// Returns None when nothing changed, so callers can tell progress from
    /// stagnation without comparing trees.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Option<Expression>, String> {
        match self {
            Expression::Value { .. } | Expression::Void => Ok(None),

            Expression::Variable { name, byte_size } => {
                if context.is_evaluating(name) {
                    return Err(format!("circular definition of {}", name));
                }
                if let Some(bound) = context.environment.get_variable(name) {
                    let mut resolved = bound.clone();
                    if !context.shallow {
                        if let Some(evaluated) =
                            resolved.evaluate(&context.evaluating_variable(name))?
                        {
                            resolved = evaluated;
                        }
                    }
                    if let Some(size) = byte_size {
                        if resolved.byte_size() != Some(*size) {
                            resolved = resolved.with_byte_size(*size)?;
                        }
                    }
                    return Ok(Some(resolved));
                }
                if let Some(offset) = context.environment.get_label(name) {
                    // A label reference becomes "object base + offset", so
                    // differences of labels within one object collapse even
                    // while the base address is still unknown.
                    let reference = match &context.object {
                        Some(object) => Expression::binary(
                            Expression::object(object.clone()),
                            BinaryOperator::Add,
                            Expression::label(name.clone(), offset),
                        )?,
                        None => Expression::label(name.clone(), offset),
                    };
                    return Ok(Some(match reference.evaluate(context)? {
                        Some(evaluated) => evaluated,
                        None => reference,
                    }));
                }
                Ok(None)
            }

            Expression::Unary { operator, operand } => match operand.evaluate(context)? {
                Some(new_operand) => Expression::unary(*operator, new_operand).map(Some),
                None => Ok(None),
            },

            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let new_left = left.evaluate(context)?;
                let new_right = right.evaluate(context)?;
                if new_left.is_none() && new_right.is_none() {
                    return Ok(None);
                }
                Expression::binary(
                    new_left.unwrap_or_else(|| (**left).clone()),
                    *operator,
                    new_right.unwrap_or_else(|| (**right).clone()),
                )
                .map(Some)
            }

            Expression::Function { name, arguments } => {
                let mut changed = false;
                let mut new_arguments = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    match argument.evaluate(context)? {
                        Some(new_argument) => {
                            new_arguments.push(new_argument);
                            changed = true;
                        }
                        None => new_arguments.push(argument.clone()),
                    }
                }
                match context.environment.get_function(name) {
                    Some(function) => function.call(&new_arguments).map(Some),
                    None if changed => Expression::function(name.clone(), new_arguments).map(Some),
                    None => Ok(None),
                }
            }

            Expression::Label { name, offset } => match context.environment.get_label(name) {
                Some(new_offset) if new_offset != *offset => {
                    Ok(Some(Expression::label(name.clone(), new_offset)))
                }
                _ => Ok(None),
            },

            Expression::Object { name } => match context.environment.get_object(name) {
                Some(address) => Ok(Some(Expression::from(Value::Unsigned(address)))),
                None => Ok(None),
            },
        }
    }

    /// Gather the names of all variables mentioned in this tree. Used to
    /// report which symbols kept an expression from resolving.
    pub fn collect_variables(&self, variables: &mut BTreeSet<String>) {
        match self {
            Expression::Variable { name, .. } => {
                variables.insert(name.clone());
            }
            Expression::Unary { operand, .. } => operand.collect_variables(variables),
            Expression::Binary { left, right, .. } => {
                left.collect_variables(variables);
                right.collect_variables(variables);
            }
            Expression::Function { name, arguments } => {
                // A function call which survives evaluation is a call to a
                // function which was never defined.
                variables.insert(name.clone());
                for argument in arguments {
                    argument.collect_variables(variables);
                }
            }
            _ => {}
        }
    }
}

fn as_addition(expression: &Expression) -> Option<(&Expression, &Expression)> {
    match expression {
        Expression::Binary {
            left,
            operator: BinaryOperator::Add,
            right,
        } => Some((&**left, &**right)),
        _ => None,
    }
}

/// Two nodes stand for the same base when they name the same variable or
/// the same object.
fn same_base(left: &Expression, right: &Expression) -> bool {
    match (left, right) {
        (Expression::Variable { name: a, .. }, Expression::Variable { name: b, .. }) => a == b,
        (Expression::Object { name: a }, Expression::Object { name: b }) => a == b,
        _ => false,
    }
}

fn is_unsigned(expression: &Expression, constant: u64) -> bool {
    expression
        .value()
        .map_or(false, |value| value == Value::Unsigned(constant))
}

fn is_truthy(expression: &Expression) -> bool {
    expression
        .value()
        .and_then(|value| value.boolean_value().ok())
        .unwrap_or(false)
}

fn is_falsy(expression: &Expression) -> bool {
    expression
        .value()
        .and_then(|value| value.boolean_value().ok().map(|truth| !truth))
        .unwrap_or(false)
}

fn bound_holds(a: Option<Value>, b: Option<Value>, test: fn(&Value, &Value) -> bool) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => test(&a, &b),
        _ => false,
    }
}

fn bounds_disjoint(left: &Expression, right: &Expression) -> bool {
    bound_holds(left.minimum_value(), right.maximum_value(), |a, b| a > b)
        || bound_holds(left.maximum_value(), right.minimum_value(), |a, b| a < b)
}

fn fold_bounds(a: Option<Value>, b: Option<Value>, operator: BinaryOperator) -> Option<Value> {
    match (a, b) {
        (Some(a), Some(b)) => operator.apply(&a, &b).ok(),
        _ => None,
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Value { value, byte_size } => {
                write!(f, "{}", value)?;
                if let Some(size) = byte_size {
                    if *size != value.default_size() {
                        write!(f, ":{}", size)?;
                    }
                }
                Ok(())
            }
            Expression::Variable { name, byte_size } => {
                write!(f, "{}", name)?;
                if let Some(size) = byte_size {
                    write!(f, ":{}", size)?;
                }
                Ok(())
            }
            Expression::Unary { operator, operand } => write!(f, "{}{}", operator, operand),
            Expression::Binary {
                left,
                operator,
                right,
            } => write!(f, "({}{}{})", left, operator, right),
            Expression::Function { name, arguments } => {
                write!(f, "{}(", name)?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            Expression::Label { name, .. } => write!(f, "{}", name),
            Expression::Object { name } => write!(f, "{}", name),
            Expression::Void => Ok(()),
        }
    }
}
