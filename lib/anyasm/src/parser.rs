use std::io::{self, BufRead, Read};

use crate::body::DataElement;
use crate::cpu::Cpu;
use crate::encoding::{ByteOrder, IntegerEncoding};
use crate::errors::ParseError;
use crate::expression::{BinaryOperator, Expression, UnaryOperator};
use crate::node::{ArgumentNode, PStatement, PString, Statement};
use crate::value::Value;

/// Parse `input` as a standalone expression. The grammar is the usual C
/// operator set over decimal, hexadecimal (`$`/`0x`), binary (`%`/`0b`) and
/// character literals, identifiers, function calls, and parentheses.
pub fn parse_expression(input: &str) -> Result<Expression, String> {
    let mut cursor = Cursor::new(input);
    let expression = cursor.expression(0)?;

    cursor.skip_whitespace();
    if let Some(c) = cursor.peek() {
        return Err(format!("unexpected character '{}'", c));
    }
    Ok(expression)
}

/// Parse `input` as an expression with an optional `:[-]N[be]` encoding
/// suffix (e.g. `value:2`, `target - pc:-1`, `addr:2be`).
pub fn parse_data_element(input: &str) -> Result<DataElement, String> {
    let trimmed = input.trim();

    if let Some((head, tail)) = trimmed.rsplit_once(':') {
        if let Some(encoding) = encoding_suffix(tail.trim()) {
            return Ok(DataElement::new(parse_expression(head)?, Some(encoding)));
        }
    }
    Ok(DataElement::new(parse_expression(trimmed)?, None))
}

fn encoding_suffix(text: &str) -> Option<IntegerEncoding> {
    let (body, byte_order) = match text.strip_suffix("be") {
        Some(body) => (body, ByteOrder::Big),
        None => (text, ByteOrder::Little),
    };
    let (digits, signed) = match body.strip_prefix('-') {
        Some(digits) => (digits, true),
        None => (body, false),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let size = digits.parse::<u64>().ok()?;
    if size == 0 || size > 8 {
        return None;
    }
    Some(IntegerEncoding::new(size, signed, byte_order))
}

// An expression with an optional positive `:N` byte-size annotation, as
// instruction arguments and assignment values are written.
fn parse_argument_expression(text: &str) -> Result<Expression, String> {
    if let Some((head, tail)) = text.rsplit_once(':') {
        let digits = tail.trim();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let size = digits
                .parse::<u64>()
                .map_err(|_| format!("invalid byte size ':{}'", digits))?;
            if size == 0 || size > 8 {
                return Err(format!("invalid byte size ':{}'", digits));
            }
            return parse_expression(head)?.with_byte_size(size);
        }
    }
    parse_expression(text)
}

struct Cursor {
    chars: Vec<char>,
    position: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.position + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn advance(&mut self, amount: usize) {
        self.position += amount;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                digits.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        digits
    }

    // Precedence climbing. Every operator is left-associative; the table
    // follows C.
    fn expression(&mut self, minimum: u8) -> Result<Expression, String> {
        let mut left = self.unary()?;

        loop {
            self.skip_whitespace();
            let Some((operator, precedence, length)) = self.binary_operator() else {
                break;
            };
            if precedence < minimum {
                break;
            }
            self.advance(length);

            let right = self.expression(precedence + 1)?;
            left = Expression::binary(left, operator, right)?;
        }
        Ok(left)
    }

    fn binary_operator(&self) -> Option<(BinaryOperator, u8, usize)> {
        let first = self.peek()?;
        let second = self.peek_at(1);

        match (first, second) {
            ('<', Some('<')) => Some((BinaryOperator::ShiftLeft, 8, 2)),
            ('>', Some('>')) => Some((BinaryOperator::ShiftRight, 8, 2)),
            ('<', Some('=')) => Some((BinaryOperator::LessEqual, 7, 2)),
            ('>', Some('=')) => Some((BinaryOperator::GreaterEqual, 7, 2)),
            ('=', Some('=')) => Some((BinaryOperator::Equal, 6, 2)),
            ('!', Some('=')) => Some((BinaryOperator::NotEqual, 6, 2)),
            ('&', Some('&')) => Some((BinaryOperator::LogicalAnd, 2, 2)),
            ('|', Some('|')) => Some((BinaryOperator::LogicalOr, 1, 2)),
            ('*', _) => Some((BinaryOperator::Multiply, 10, 1)),
            ('/', _) => Some((BinaryOperator::Divide, 10, 1)),
            ('%', _) => Some((BinaryOperator::Modulo, 10, 1)),
            ('+', _) => Some((BinaryOperator::Add, 9, 1)),
            ('-', _) => Some((BinaryOperator::Subtract, 9, 1)),
            ('<', _) => Some((BinaryOperator::Less, 7, 1)),
            ('>', _) => Some((BinaryOperator::Greater, 7, 1)),
            ('=', _) => Some((BinaryOperator::Equal, 6, 1)),
            ('&', _) => Some((BinaryOperator::BitwiseAnd, 5, 1)),
            ('^', _) => Some((BinaryOperator::BitwiseXor, 4, 1)),
            ('|', _) => Some((BinaryOperator::BitwiseOr, 3, 1)),
            _ => None,
        }
    }

    fn unary(&mut self) -> Result<Expression, String> {
        self.skip_whitespace();
        let operator = match self.peek() {
            Some('-') => Some(UnaryOperator::Minus),
            Some('+') => Some(UnaryOperator::Plus),
            Some('~') => Some(UnaryOperator::BitwiseNot),
            Some('<') => Some(UnaryOperator::LowByte),
            Some('>') => Some(UnaryOperator::HighByte),
            Some('^') => Some(UnaryOperator::BankByte),
            _ => None,
        };

        match operator {
            Some(operator) => {
                self.advance(1);
                let operand = self.unary()?;
                Expression::unary(operator, operand)
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expression, String> {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Err(String::from("unexpected end of expression"));
        };

        match c {
            '(' => {
                self.advance(1);
                let inner = self.expression(0)?;
                self.skip_whitespace();
                if self.bump() != Some(')') {
                    return Err(String::from("expected ')'"));
                }
                Ok(inner)
            }
            '$' => {
                self.advance(1);
                self.number(16, "hexadecimal")
            }
            '%' => {
                self.advance(1);
                self.number(2, "binary")
            }
            '\'' => self.character(),
            '0' if matches!(self.peek_at(1), Some('x') | Some('X')) => {
                self.advance(2);
                self.number(16, "hexadecimal")
            }
            '0' if matches!(self.peek_at(1), Some('b') | Some('B')) => {
                self.advance(2);
                self.number(2, "binary")
            }
            _ if c.is_ascii_digit() => self.number(10, "decimal"),
            _ if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => Err(format!("unexpected character '{}'", c)),
        }
    }

    fn number(&mut self, radix: u32, kind: &str) -> Result<Expression, String> {
        let digits = self.digits(radix);
        if digits.is_empty() {
            return Err(format!("expecting {} digits", kind));
        }

        match u64::from_str_radix(&digits, radix) {
            Ok(value) => Ok(Expression::from(value)),
            Err(_) => Err(format!("{} literal '{}' is out of range", kind, digits)),
        }
    }

    fn character(&mut self) -> Result<Expression, String> {
        self.advance(1);
        let c = match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some(other) => return Err(format!("unknown escape '\\{}'", other)),
                None => return Err(String::from("unterminated character literal")),
            },
            Some(c) => c,
            None => return Err(String::from("unterminated character literal")),
        };

        if self.bump() != Some('\'') {
            return Err(String::from("unterminated character literal"));
        }
        Ok(Expression::from(c as u64))
    }

    fn identifier(&mut self) -> Result<Expression, String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.position += 1;
            } else {
                break;
            }
        }

        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.advance(1);
            let mut arguments = Vec::new();
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.advance(1);
            } else {
                loop {
                    arguments.push(self.expression(0)?);
                    self.skip_whitespace();
                    match self.bump() {
                        Some(',') => {}
                        Some(')') => break,
                        _ => return Err(String::from("expected ')'")),
                    }
                }
            }
            return Expression::function(name, arguments);
        }

        Ok(Expression::variable(name))
    }
}

/// The statement parser. Lines are independent of each other, and at most
/// one error is reported per line; parsing always continues on the next
/// one. The CPU description decides how instruction arguments split: its
/// punctuation characters separate, its reserved words read as keywords,
/// and everything in between is an expression.
#[derive(Debug)]
pub struct Parser<'a> {
    cpu: &'a Cpu,
    line: usize,

    /// Everything parsed so far.
    pub statements: Vec<PStatement>,

    /// Every error found so far.
    pub errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(cpu: &'a Cpu) -> Self {
        Self {
            cpu,
            line: 0,
            statements: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn parse(&mut self, reader: impl Read) -> Result<(), Vec<ParseError>> {
        for line in io::BufReader::new(reader).lines() {
            match line {
                Ok(text) => {
                    if let Err(message) = self.parse_line(&text) {
                        self.errors.push(ParseError {
                            line: self.line,
                            message,
                        });
                    }
                }
                Err(err) => {
                    self.errors.push(ParseError {
                        line: self.line,
                        message: format!("could not read input: {}", err),
                    });
                    break;
                }
            }
            self.line += 1;
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<(), String> {
        self.parse_fragment(strip_comment(line), 0)
    }

    // `base` is the column where `text` starts on the full source line.
    fn parse_fragment(&mut self, text: &str, base: usize) -> Result<(), String> {
        let leading = text.len() - text.trim_start().len();
        let content = text.trim();
        if content.is_empty() {
            return Ok(());
        }
        let base = base + leading;

        // Directives.
        if content.starts_with('.') {
            let (word, rest) = match content.find(char::is_whitespace) {
                Some(index) => content.split_at(index),
                None => (content, ""),
            };
            return match word {
                ".byte" => self.parse_data(rest, 1),
                ".word" => self.parse_data(rest, 2),
                ".org" => {
                    let expression = parse_expression(rest)?;
                    self.push(Statement::Origin(expression));
                    Ok(())
                }
                _ => Err(format!("unknown directive '{}'", word)),
            };
        }

        // Everything else starts with an identifier: a label, an assignment,
        // or an instruction.
        let mut length = 0;
        for c in content.chars() {
            let valid = if length == 0 {
                c.is_alphabetic() || c == '_'
            } else {
                c.is_alphanumeric() || c == '_'
            };
            if !valid {
                break;
            }
            length += c.len_utf8();
        }
        if length == 0 {
            return Err(format!(
                "unexpected character '{}'",
                content.chars().next().unwrap_or_default()
            ));
        }

        let name = PString::new(&content[..length], self.line, base, base + length);
        let rest = &content[length..];

        if let Some(remainder) = rest.strip_prefix(':') {
            name.is_valid_identifier(&self.cpu.reserved_words)?;
            self.push(Statement::Label(name));
            return self.parse_fragment(remainder, base + length + 1);
        }

        let after = rest.trim_start();
        if after.starts_with('=') && !after.starts_with("==") {
            name.is_valid_identifier(&self.cpu.reserved_words)?;
            let expression = parse_argument_expression(&after[1..])?;
            self.push(Statement::Assignment { name, expression });
            return Ok(());
        }

        let arguments = self.parse_arguments(rest)?;
        self.push(Statement::Instruction {
            mnemonic: name,
            arguments,
        });
        Ok(())
    }

    fn parse_data(&mut self, text: &str, size: u64) -> Result<(), String> {
        if text.trim().is_empty() {
            return Err(String::from("expecting at least one value"));
        }

        let mut elements = Vec::new();
        for piece in split_list(text) {
            if piece.trim().is_empty() {
                return Err(String::from("empty expression"));
            }
            let mut element = parse_data_element(piece)?;
            if element.encoding.is_none() {
                let signed = matches!(element.expression.value(), Some(Value::Signed(_)));
                element.encoding = Some(IntegerEncoding::new(size, signed, ByteOrder::Little));
            }
            elements.push(element);
        }

        self.push(Statement::Data(elements));
        Ok(())
    }

    fn parse_arguments(&self, text: &str) -> Result<Vec<ArgumentNode>, String> {
        let mut arguments = Vec::new();
        let mut chunk = String::new();
        let mut in_char = false;
        let mut escaped = false;

        for c in text.chars() {
            if in_char {
                chunk.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '\'' {
                    in_char = false;
                }
            } else if c == '\'' {
                in_char = true;
                chunk.push(c);
            } else if self.cpu.punctuation.contains(&c) {
                self.flush_chunk(&mut chunk, &mut arguments)?;
                arguments.push(ArgumentNode::Punctuation(c));
            } else {
                chunk.push(c);
            }
        }
        self.flush_chunk(&mut chunk, &mut arguments)?;

        Ok(arguments)
    }

    fn flush_chunk(
        &self,
        chunk: &mut String,
        arguments: &mut Vec<ArgumentNode>,
    ) -> Result<(), String> {
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            let lowercase = trimmed.to_lowercase();
            if self.cpu.reserved_words.contains(&lowercase) {
                arguments.push(ArgumentNode::Keyword(lowercase));
            } else {
                arguments.push(ArgumentNode::Expression(parse_argument_expression(trimmed)?));
            }
        }
        chunk.clear();
        Ok(())
    }

    fn push(&mut self, statement: Statement) {
        self.statements.push(PStatement::new(statement, self.line));
    }
}

// Cut an inline `;` comment off, leaving character literals alone.
fn strip_comment(line: &str) -> &str {
    let mut in_char = false;
    let mut escaped = false;

    for (index, c) in line.char_indices() {
        if in_char {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                in_char = false;
            }
            continue;
        }
        match c {
            '\'' => in_char = true,
            ';' => return &line[..index],
            _ => {}
        }
    }
    line
}

// Split on top-level commas, skipping parenthesized groups and character
// literals.
fn split_list(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_char = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_char {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                in_char = false;
            }
            continue;
        }
        match c {
            '\'' => in_char = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    // Expressions

    fn assert_folds(input: &str, value: Value) {
        assert_eq!(parse_expression(input).unwrap().value(), Some(value));
    }

    fn assert_tree(input: &str, rendered: &str) {
        assert_eq!(parse_expression(input).unwrap().to_string(), rendered);
    }

    #[test]
    fn literals() {
        assert_folds("42", Value::Unsigned(42));
        assert_folds("$ff", Value::Unsigned(255));
        assert_folds("0x10", Value::Unsigned(16));
        assert_folds("%1010", Value::Unsigned(10));
        assert_folds("0b11", Value::Unsigned(3));
        assert_folds("'A'", Value::Unsigned(65));
        assert_folds("'\\n'", Value::Unsigned(10));
        assert_folds("-5", Value::Signed(-5));
    }

    #[test]
    fn precedence_follows_c() {
        assert_folds("2 + 3 * 4", Value::Unsigned(14));
        assert_folds("(2 + 3) * 4", Value::Unsigned(20));
        assert_folds("1 << 2 + 3", Value::Unsigned(32));
        assert_folds("$ff & %1111", Value::Unsigned(15));
        assert_folds("10 % 3", Value::Unsigned(1));
        assert_folds("1 == 1 && 2 < 3", Value::Boolean(true));
        assert_folds("1 | 2 ^ 2", Value::Unsigned(1));
    }

    #[test]
    fn byte_extraction_operators() {
        assert_folds("<$1234", Value::Unsigned(0x34));
        assert_folds(">$1234", Value::Unsigned(0x12));
        assert_folds("^$123456", Value::Unsigned(0x12));
        assert_folds("~0", Value::Unsigned(u64::MAX));
    }

    #[test]
    fn unresolved_trees_render_back() {
        assert_tree("x + 3 * 4", "(x+$0c)");
        assert_tree("f(1, x)", "f($01, x)");
        assert_tree("in_range(0, 10, x)", "(($00<=x)&&(x<=$0a))");
        assert_tree("value == 2", "(value=$02)");
    }

    #[test]
    fn expression_errors() {
        let assert_expression_error = |input: &str, message: &str| {
            assert_eq!(parse_expression(input).unwrap_err(), message);
        };

        assert_expression_error("", "unexpected end of expression");
        assert_expression_error("1 +", "unexpected end of expression");
        assert_expression_error("(1", "expected ')'");
        assert_expression_error("1)", "unexpected character ')'");
        assert_expression_error("1 2", "unexpected character '2'");
        assert_expression_error("1 / 0", "division by zero");
        assert_expression_error("$", "expecting hexadecimal digits");
        assert_expression_error("'a", "unterminated character literal");
        assert_expression_error("#4", "unexpected character '#'");
    }

    #[test]
    fn data_elements_and_suffixes() {
        let element = parse_data_element("$12:2").unwrap();
        assert_eq!(element.encoding, Some(IntegerEncoding::unsigned(2)));

        let element = parse_data_element("target - pc:-1").unwrap();
        assert_eq!(element.encoding, Some(IntegerEncoding::signed(1)));

        let element = parse_data_element("addr:2be").unwrap();
        assert_eq!(
            element.encoding,
            Some(IntegerEncoding::new(2, false, ByteOrder::Big))
        );

        let element = parse_data_element("$a9").unwrap();
        assert_eq!(element.encoding, None);
    }

    // Statements

    fn test_cpu() -> Cpu {
        Cpu::from_toml(
            r##"
[cpu]
name = "test"

[modes.implied]
notation = []
encoding = ["opcode"]

[modes.immediate]
notation = ["#", "value"]
encoding = ["opcode", "value:1"]

[modes.immediate.arguments.value]
type = "range"
minimum = 0
maximum = 255

[modes.indirect_y]
notation = ["(", "value", ")", ",", "y"]
encoding = ["opcode", "value:1"]

[modes.indirect_y.arguments.value]
type = "range"
minimum = 0
maximum = 255

[instructions.nop]
implied = 0xEA

[instructions.lda]
immediate = 0xA9
indirect_y = 0xB1
"##,
        )
        .unwrap()
    }

    fn parse_all(source: &str) -> Vec<PStatement> {
        let cpu = test_cpu();
        let mut parser = Parser::new(&cpu);
        parser.parse(source.as_bytes()).unwrap();
        parser.statements
    }

    fn parse_one(source: &str) -> Statement {
        let mut statements = parse_all(source);
        assert_eq!(statements.len(), 1);
        statements.pop().unwrap().statement
    }

    #[test]
    fn assignments() {
        match parse_one("five = 2 + 3") {
            Statement::Assignment { name, expression } => {
                assert_eq!(name.value, "five");
                assert_eq!(name.start, 0);
                assert_eq!(name.end, 4);
                assert_eq!(expression.value(), Some(Value::Unsigned(5)));
            }
            other => panic!("expected an assignment, got {:?}", other),
        }

        match parse_one("addr = $10:2") {
            Statement::Assignment { expression, .. } => {
                assert_eq!(expression.default_size(), 2);
            }
            other => panic!("expected an assignment, got {:?}", other),
        }
    }

    #[test]
    fn labels() {
        match parse_one("main:") {
            Statement::Label(name) => assert_eq!(name.value, "main"),
            other => panic!("expected a label, got {:?}", other),
        }

        let statements = parse_all("main: nop");
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0].statement, Statement::Label(_)));
        assert!(matches!(
            statements[1].statement,
            Statement::Instruction { .. }
        ));
        assert_eq!(statements[1].line, 0);
    }

    #[test]
    fn comments_and_line_numbers() {
        let statements = parse_all("\n; a comment\nnop ; trailing\n");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].line, 2);
    }

    #[test]
    fn data_directives() {
        match parse_one(".byte 1, $02, 'a'") {
            Statement::Data(elements) => {
                assert_eq!(elements.len(), 3);
                for element in &elements {
                    assert_eq!(element.encoding, Some(IntegerEncoding::unsigned(1)));
                }
                assert_eq!(elements[2].expression.value(), Some(Value::Unsigned(97)));
            }
            other => panic!("expected data, got {:?}", other),
        }

        match parse_one(".word $1234") {
            Statement::Data(elements) => {
                assert_eq!(elements[0].encoding, Some(IntegerEncoding::unsigned(2)));
            }
            other => panic!("expected data, got {:?}", other),
        }

        // An explicit suffix wins over the directive's width, and negative
        // values turn the default signed.
        match parse_one(".byte $12:2, -1") {
            Statement::Data(elements) => {
                assert_eq!(elements[0].encoding, Some(IntegerEncoding::unsigned(2)));
                assert_eq!(elements[1].encoding, Some(IntegerEncoding::signed(1)));
            }
            other => panic!("expected data, got {:?}", other),
        }

        match parse_one(".org $8000") {
            Statement::Origin(expression) => {
                assert_eq!(expression.value(), Some(Value::Unsigned(0x8000)));
            }
            other => panic!("expected an origin, got {:?}", other),
        }
    }

    #[test]
    fn instruction_arguments_follow_the_cpu() {
        match parse_one("lda #$05") {
            Statement::Instruction {
                mnemonic,
                arguments,
            } => {
                assert_eq!(mnemonic.value, "lda");
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[0], ArgumentNode::Punctuation('#'));
                match &arguments[1] {
                    ArgumentNode::Expression(expression) => {
                        assert_eq!(expression.value(), Some(Value::Unsigned(5)));
                    }
                    other => panic!("expected an expression, got {:?}", other),
                }
            }
            other => panic!("expected an instruction, got {:?}", other),
        }

        match parse_one("lda (base + 2), Y") {
            Statement::Instruction { arguments, .. } => {
                assert_eq!(arguments.len(), 5);
                assert_eq!(arguments[0], ArgumentNode::Punctuation('('));
                match &arguments[1] {
                    ArgumentNode::Expression(expression) => {
                        assert_eq!(expression.to_string(), "(base+$02)");
                    }
                    other => panic!("expected an expression, got {:?}", other),
                }
                assert_eq!(arguments[2], ArgumentNode::Punctuation(')'));
                assert_eq!(arguments[3], ArgumentNode::Punctuation(','));
                assert_eq!(arguments[4], ArgumentNode::Keyword(String::from("y")));
            }
            other => panic!("expected an instruction, got {:?}", other),
        }
    }

    #[test]
    fn argument_annotations() {
        match parse_one("lda addr:2") {
            Statement::Instruction { arguments, .. } => match &arguments[0] {
                ArgumentNode::Expression(expression) => {
                    assert_eq!(expression.to_string(), "addr:2");
                }
                other => panic!("expected an expression, got {:?}", other),
            },
            other => panic!("expected an instruction, got {:?}", other),
        }
    }

    #[test]
    fn character_punctuation_does_not_split() {
        match parse_one("lda #','") {
            Statement::Instruction { arguments, .. } => {
                assert_eq!(arguments.len(), 2);
                match &arguments[1] {
                    ArgumentNode::Expression(expression) => {
                        assert_eq!(expression.value(), Some(Value::Unsigned(44)));
                    }
                    other => panic!("expected an expression, got {:?}", other),
                }
            }
            other => panic!("expected an instruction, got {:?}", other),
        }
    }

    #[test]
    fn parse_errors_accumulate_with_their_lines() {
        let cpu = test_cpu();
        let mut parser = Parser::new(&cpu);
        let errors = parser
            .parse("y = 1\nnop\n.weird 2\nfive =\n".as_bytes())
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "cannot use reserved name 'y' (line 1)");
        assert_eq!(errors[1].to_string(), "unknown directive '.weird' (line 3)");
        assert_eq!(
            errors[2].to_string(),
            "unexpected end of expression (line 4)"
        );

        // Good lines still made it through.
        assert_eq!(parser.statements.len(), 1);
    }
}
