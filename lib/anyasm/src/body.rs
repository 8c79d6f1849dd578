use std::collections::BTreeSet;
use std::fmt;

use crate::encoding::{ByteOrder, IntegerEncoding, SizeRange};
use crate::eval::EvaluationContext;
use crate::expression::Expression;

/// One piece of output data: an expression and, optionally, the explicit
/// encoding it should be laid down with. Without one the value's natural
/// width is used once it is known.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    pub expression: Expression,
    pub encoding: Option<IntegerEncoding>,
}

impl DataElement {
    pub fn new(expression: Expression, encoding: Option<IntegerEncoding>) -> Self {
        Self {
            expression,
            encoding,
        }
    }

    /// How many bytes this element will occupy. Exact once the value or
    /// the encoding pins it down, a range while only bounds are known.
    pub fn size_range(&self) -> SizeRange {
        if self.expression.value().is_some() {
            return SizeRange::exact(match self.encoding {
                Some(encoding) => encoding.size,
                None => self.expression.default_size(),
            });
        }

        let minimum = self.expression.minimum_value();
        let maximum = self.expression.maximum_value();
        if let (Some(minimum), Some(maximum)) = (minimum, maximum) {
            let (a, b) = match self.encoding {
                Some(encoding) => (encoding.size, encoding.size),
                None => (minimum.default_size(), maximum.default_size()),
            };
            return SizeRange::new(a.min(b), Some(a.max(b)));
        }

        if let Some(encoding) = self.encoding {
            return SizeRange::exact(encoding.size);
        }

        // Nothing known yet, so assume any integer width.
        SizeRange::new(1, Some(8))
    }
}

/// One arm of a conditional body.
#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Expression,
    pub body: Body,
}

impl IfClause {
    pub fn new(condition: Expression, body: Body) -> Self {
        Self { condition, body }
    }

    fn is_true(&self) -> bool {
        matches!(
            self.condition
                .value()
                .and_then(|value| value.boolean_value().ok()),
            Some(true)
        )
    }

    fn is_false(&self) -> bool {
        matches!(
            self.condition
                .value()
                .and_then(|value| value.boolean_value().ok()),
            Some(false)
        )
    }
}

/// The output of a statement: either plain data, a conditional chain whose
/// winning arm is not known yet, or an error that fires if it is ever
/// emitted. Conditional chains only exist through [`Body::conditional`],
/// which filters clauses that are already decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Data(Vec<DataElement>),
    If(Vec<IfClause>),
    Error(String),
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl Body {
    pub fn data(elements: Vec<DataElement>) -> Body {
        Body::Data(elements)
    }

    pub fn error(message: impl Into<String>) -> Body {
        Body::Error(message.into())
    }

    pub fn empty() -> Body {
        Body::Data(Vec::new())
    }

    /// Build a conditional body, dropping clauses that are statically false
    /// and cutting the chain at the first statically true one. A chain that
    /// starts with a true clause is that clause's body, full stop.
    pub fn conditional(clauses: Vec<IfClause>) -> Body {
        let mut filtered: Vec<IfClause> = Vec::new();
        for clause in clauses {
            if clause.is_false() {
                continue;
            }
            let is_true = clause.is_true();
            filtered.push(clause);
            if is_true {
                if filtered.len() == 1 {
                    return filtered.remove(0).body;
                }
                break;
            }
        }
        if filtered.is_empty() {
            return Body::empty();
        }
        Body::If(filtered)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Body::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Data(elements) if elements.is_empty())
    }

    pub fn size_range(&self) -> SizeRange {
        match self {
            Body::Data(elements) => elements
                .iter()
                .fold(SizeRange::exact(0), |sum, element| {
                    sum + element.size_range()
                }),
            Body::If(clauses) => {
                // Error arms abort assembly, so they don't weigh in here.
                let mut range: Option<SizeRange> = None;
                for clause in clauses {
                    if clause.body.is_error() {
                        continue;
                    }
                    let clause_range = clause.body.size_range();
                    range = Some(match range {
                        Some(current) => current.union(&clause_range),
                        None => clause_range,
                    });
                }
                range.unwrap_or_else(|| SizeRange::exact(0))
            }
            Body::Error(_) => SizeRange::exact(0),
        }
    }

    /// Resolve everything in this body one step further. None means nothing
    /// changed. A conditional chain collapses into its first clause's body
    /// the moment that clause's condition turns true.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Option<Body>, String> {
        match self {
            Body::Data(elements) => {
                let mut new_elements = Vec::with_capacity(elements.len());
                let mut changed = false;
                for element in elements {
                    match element.expression.evaluate(context)? {
                        Some(expression) => {
                            changed = true;
                            new_elements.push(DataElement::new(expression, element.encoding));
                        }
                        None => new_elements.push(element.clone()),
                    }
                }
                if changed {
                    Ok(Some(Body::Data(new_elements)))
                } else {
                    Ok(None)
                }
            }

            Body::If(clauses) => {
                let mut new_clauses = Vec::with_capacity(clauses.len());
                let mut changed = false;
                for clause in clauses {
                    let condition = match clause.condition.evaluate(context)? {
                        Some(condition) => {
                            changed = true;
                            condition
                        }
                        None => clause.condition.clone(),
                    };
                    let settled = IfClause::new(condition, clause.body.clone());
                    if new_clauses.is_empty() && settled.is_true() {
                        return Ok(Some(match clause.body.evaluate(context)? {
                            Some(body) => body,
                            None => clause.body.clone(),
                        }));
                    }
                    let body = match clause.body.evaluate(context)? {
                        Some(body) => {
                            changed = true;
                            body
                        }
                        None => clause.body.clone(),
                    };
                    new_clauses.push(IfClause::new(settled.condition, body));
                }
                if changed {
                    Ok(Some(Body::conditional(new_clauses)))
                } else {
                    Ok(None)
                }
            }

            Body::Error(_) => Ok(None),
        }
    }

    /// Append the encoded bytes of this body. Everything must have
    /// collapsed to concrete data by now.
    pub fn encode(&self, bytes: &mut Vec<u8>) -> Result<(), String> {
        match self {
            Body::Data(elements) => {
                for element in elements {
                    let value = element
                        .expression
                        .value()
                        .ok_or_else(|| String::from("unknown value"))?;
                    let encoding = match element.encoding {
                        Some(encoding) => encoding,
                        None => IntegerEncoding::new(
                            element.expression.default_size(),
                            value.is_signed(),
                            ByteOrder::Little,
                        ),
                    };
                    bytes.extend(encoding.encode(&value)?);
                }
                Ok(())
            }
            Body::If(_) => Err(String::from("unknown value")),
            Body::Error(message) => Err(message.clone()),
        }
    }

    pub fn collect_variables(&self, variables: &mut BTreeSet<String>) {
        match self {
            Body::Data(elements) => {
                for element in elements {
                    element.expression.collect_variables(variables);
                }
            }
            Body::If(clauses) => {
                for clause in clauses {
                    clause.condition.collect_variables(variables);
                    clause.body.collect_variables(variables);
                }
            }
            Body::Error(_) => {}
        }
    }

    /// A listing rendition of this body, every line starting with `prefix`.
    pub fn serialize(&self, prefix: &str) -> String {
        match self {
            Body::Data(elements) => {
                let mut line = format!("{}.data ", prefix);
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        line.push_str(", ");
                    }
                    line.push_str(&element.expression.to_string());
                    if let Some(encoding) = &element.encoding {
                        let natural = element.expression.value().map_or(false, |value| {
                            IntegerEncoding::for_value(&value) == Some(*encoding)
                        });
                        if !natural {
                            line.push_str(&encoding.to_string());
                        }
                    }
                }
                line.push('\n');
                line
            }

            Body::If(clauses) => {
                let mut out = String::new();
                let Some(first_clause) = clauses.first() else {
                    return out;
                };
                if first_clause.is_true() {
                    return first_clause.body.serialize(prefix);
                }
                let inner_prefix = format!("{}  ", prefix);
                let mut first = true;
                for clause in clauses {
                    if clause.is_true() {
                        out.push_str(&format!("{}}}\n{}.else {{\n", prefix, prefix));
                    } else if first {
                        out.push_str(&format!("{}.if {} {{\n", prefix, clause.condition));
                    } else {
                        out.push_str(&format!(
                            "{}}}\n{}.else_if {} {{\n",
                            prefix, prefix, clause.condition
                        ));
                    }
                    out.push_str(&clause.body.serialize(&inner_prefix));
                    first = false;
                }
                out.push_str(&format!("{}}}\n", prefix));
                out
            }

            Body::Error(message) => format!("{}.error \"{}\"\n", prefix, message),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.serialize(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Environment;
    use crate::expression::BinaryOperator;
    use crate::value::Value;

    fn byte(value: u64) -> DataElement {
        DataElement::new(Expression::from(value), Some(IntegerEncoding::unsigned(1)))
    }

    #[test]
    fn data_sizes_add_up() {
        let body = Body::data(vec![
            byte(0xa9),
            DataElement::new(
                Expression::from(0x1234u64),
                Some(IntegerEncoding::unsigned(2)),
            ),
        ]);
        assert_eq!(body.size_range(), SizeRange::exact(3));
    }

    #[test]
    fn unresolved_element_sizes() {
        let with_encoding = DataElement::new(
            Expression::variable("x"),
            Some(IntegerEncoding::unsigned(2)),
        );
        assert_eq!(with_encoding.size_range(), SizeRange::exact(2));

        let with_bounds = DataElement::new(
            Expression::label("foo", SizeRange::new(2, Some(4))),
            None,
        );
        assert_eq!(with_bounds.size_range(), SizeRange::exact(1));

        let unknown = DataElement::new(Expression::variable("x"), None);
        assert_eq!(unknown.size_range(), SizeRange::new(1, Some(8)));
    }

    #[test]
    fn encoding_a_data_body() {
        let body = Body::data(vec![
            byte(0xa9),
            DataElement::new(Expression::from(0x05u64), None),
            DataElement::new(
                Expression::from(0x1234u64),
                Some(IntegerEncoding::unsigned(2)),
            ),
        ]);

        let mut bytes = Vec::new();
        body.encode(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0xa9, 0x05, 0x34, 0x12]);
    }

    #[test]
    fn encoding_requires_concrete_values() {
        let body = Body::data(vec![DataElement::new(Expression::variable("x"), None)]);
        let mut bytes = Vec::new();
        assert_eq!(body.encode(&mut bytes).unwrap_err(), "unknown value");
    }

    #[test]
    fn error_bodies_fire_on_encode() {
        let body = Body::error("arguments out of range");
        let mut bytes = Vec::new();
        assert_eq!(
            body.encode(&mut bytes).unwrap_err(),
            "arguments out of range"
        );
    }

    #[test]
    fn conditional_construction_filters_decided_clauses() {
        let one = Body::data(vec![byte(1)]);
        let two = Body::data(vec![byte(2)]);

        // A chain that opens with a true clause is just that body.
        let body = Body::conditional(vec![
            IfClause::new(Expression::from(true), one.clone()),
            IfClause::new(Expression::variable("c"), two.clone()),
        ]);
        assert_eq!(body, one);

        // False clauses disappear, and a later true clause ends the chain.
        let body = Body::conditional(vec![
            IfClause::new(Expression::from(false), one.clone()),
            IfClause::new(Expression::variable("c"), two.clone()),
            IfClause::new(Expression::from(true), one.clone()),
            IfClause::new(Expression::variable("d"), two.clone()),
        ]);
        match &body {
            Body::If(clauses) => {
                assert_eq!(clauses.len(), 2);
                assert!(clauses[1].is_true());
            }
            other => panic!("expected a conditional body, got {:?}", other),
        }

        // Nothing left means an empty body.
        assert!(Body::conditional(vec![IfClause::new(
            Expression::from(false),
            one
        )])
        .is_empty());
    }

    #[test]
    fn conditional_sizes_union_over_arms() {
        let short = Body::data(vec![byte(1), byte(2)]);
        let long = Body::data(vec![byte(1), byte(2), byte(3)]);
        let body = Body::conditional(vec![
            IfClause::new(Expression::variable("c"), short),
            IfClause::new(Expression::variable("d"), long),
            IfClause::new(Expression::from(true), Body::error("out of range")),
        ]);
        assert_eq!(body.size_range(), SizeRange::new(2, Some(3)));
    }

    #[test]
    fn conditional_collapse_on_evaluation() {
        let mut environment = Environment::new();
        environment.define_variable("wide", Expression::from(false));
        let context = EvaluationContext::new(&environment);

        let condition = Expression::binary(
            Expression::variable("wide"),
            BinaryOperator::Equal,
            Expression::from(false),
        )
        .unwrap();
        let body = Body::conditional(vec![
            IfClause::new(condition, Body::data(vec![byte(0xa9)])),
            IfClause::new(Expression::from(true), Body::error("out of range")),
        ]);

        let collapsed = body.evaluate(&context).unwrap().unwrap();
        assert_eq!(collapsed, Body::data(vec![byte(0xa9)]));
    }

    #[test]
    fn data_evaluation_reports_progress() {
        let mut environment = Environment::new();
        environment.define_variable("x", Expression::from(7u64));
        let context = EvaluationContext::new(&environment);

        let body = Body::data(vec![DataElement::new(
            Expression::variable("x"),
            Some(IntegerEncoding::unsigned(1)),
        )]);
        let evaluated = body.evaluate(&context).unwrap().unwrap();
        let mut bytes = Vec::new();
        evaluated.encode(&mut bytes).unwrap();
        assert_eq!(bytes, vec![7]);

        assert!(evaluated.evaluate(&context).unwrap().is_none());
    }

    #[test]
    fn collecting_unresolved_symbols() {
        let body = Body::conditional(vec![IfClause::new(
            Expression::variable("c"),
            Body::data(vec![DataElement::new(Expression::variable("x"), None)]),
        )]);
        let mut variables = BTreeSet::new();
        body.collect_variables(&mut variables);
        assert_eq!(
            variables.into_iter().collect::<Vec<_>>(),
            vec!["c", "x"]
        );
    }

    #[test]
    fn listing_format() {
        let body = Body::data(vec![
            byte(0xa9),
            DataElement::new(
                Expression::from(0x05u64),
                Some(IntegerEncoding::unsigned(2)),
            ),
        ]);
        assert_eq!(body.to_string(), ".data $a9, $05:2\n");

        let chain = Body::conditional(vec![
            IfClause::new(Expression::variable("c"), Body::data(vec![byte(0xa9)])),
            IfClause::new(Expression::from(true), Body::error("out of range")),
        ]);
        assert_eq!(
            chain.to_string(),
            ".if c {\n  .data $a9\n}\n.else {\n  .error \"out of range\"\n}\n"
        );
    }

    #[test]
    fn value_types_refuse_encoding() {
        let body = Body::data(vec![DataElement::new(
            Expression::from(Value::Boolean(true)),
            None,
        )]);
        let mut bytes = Vec::new();
        assert_eq!(
            body.encode(&mut bytes).unwrap_err(),
            "can't encode boolean"
        );
    }
}
