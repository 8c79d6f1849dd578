use std::cmp::Ordering;
use std::fmt;

/// A constant as it is being juggled around by expressions: a discriminated
/// union over the handful of cases an assembler actually needs. Values are
/// immutable: every operation hands back a fresh `Value` (or an error
/// message for the caller to attribute to a source line).
///
/// Integers are normalized so that a non-negative number is always
/// `Unsigned` and a `Signed` value is always strictly negative. This way
/// each mixed signed/unsigned operation has exactly one interesting case to
/// handle instead of four.
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Float(f64),
    Signed(i64),
    Unsigned(u64),
    String(String),
    Void,
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Unsigned(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        if value < 0 {
            Value::Signed(value)
        } else {
            Value::Unsigned(value as u64)
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl Value {
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Value::Signed(_))
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Value::Unsigned(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// The human readable name of the case, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Float(_) => "float",
            Value::Signed(_) => "signed",
            Value::Unsigned(_) => "unsigned",
            Value::String(_) => "string",
            Value::Void => "void",
        }
    }

    pub fn unsigned_value(&self) -> Result<u64, String> {
        match self {
            Value::Unsigned(value) => Ok(*value),
            _ => Err(format!(
                "can't convert value of type {} to unsigned",
                self.type_name()
            )),
        }
    }

    pub fn signed_value(&self) -> Result<i64, String> {
        match self {
            Value::Signed(value) => Ok(*value),
            Value::Unsigned(value) => {
                if *value > i64::MAX as u64 {
                    Err(String::from("can't convert too large value to signed"))
                } else {
                    Ok(*value as i64)
                }
            }
            _ => Err(format!(
                "can't convert value of type {} to signed",
                self.type_name()
            )),
        }
    }

    pub fn float_value(&self) -> Result<f64, String> {
        match self {
            Value::Float(value) => Ok(*value),
            Value::Signed(value) => Ok(*value as f64),
            Value::Unsigned(value) => Ok(*value as f64),
            _ => Err(format!(
                "can't convert value of type {} to float",
                self.type_name()
            )),
        }
    }

    pub fn boolean_value(&self) -> Result<bool, String> {
        match self {
            Value::Boolean(value) => Ok(*value),
            Value::Float(value) => Ok(*value != 0.0),
            Value::Signed(value) => Ok(*value != 0),
            Value::Unsigned(value) => Ok(*value != 0),
            Value::String(value) => Ok(!value.is_empty()),
            Value::Void => Err(String::from("can't convert value of type void to boolean")),
        }
    }

    /// The minimum power-of-two byte width (1, 2, 4 or 8) which round-trips
    /// this value without loss. Returns 0 for cases which have no meaningful
    /// byte width.
    pub fn default_size(&self) -> u64 {
        match self {
            Value::Signed(value) => {
                if *value >= i8::MIN as i64 {
                    1
                } else if *value >= i16::MIN as i64 {
                    2
                } else if *value >= i32::MIN as i64 {
                    4
                } else {
                    8
                }
            }
            Value::Unsigned(value) => {
                if *value <= u8::MAX as u64 {
                    1
                } else if *value <= u16::MAX as u64 {
                    2
                } else if *value <= u32::MAX as u64 {
                    4
                } else {
                    8
                }
            }
            _ => 0,
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, String> {
        if self.is_float() || other.is_float() {
            return Ok(Value::Float(self.float_value()? + other.float_value()?));
        }
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => {
                Ok(Value::Unsigned(add_unsigned(*a, *b)?))
            }
            (Value::Signed(a), Value::Signed(b)) => {
                Ok(Value::from(add_signed(*a, *b)?))
            }
            (Value::Signed(a), Value::Unsigned(b)) => add_mixed(*a, *b),
            (Value::Unsigned(a), Value::Signed(b)) => add_mixed(*b, *a),
            _ => Err(format!(
                "can't add {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, String> {
        if self.is_float() || other.is_float() {
            return Ok(Value::Float(self.float_value()? - other.float_value()?));
        }
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => {
                if a >= b {
                    Ok(Value::Unsigned(a - b))
                } else {
                    Ok(Value::from(negate_unsigned(b - a)?))
                }
            }
            (Value::Signed(a), Value::Signed(b)) => {
                // Both sides are strictly negative, so the difference always
                // fits into an i64.
                Ok(Value::from(a - b))
            }
            (Value::Signed(a), Value::Unsigned(b)) => {
                Ok(Value::from(add_signed(*a, negate_unsigned(*b)?)?))
            }
            (Value::Unsigned(a), Value::Signed(b)) => {
                Ok(Value::Unsigned(add_unsigned(*a, negate_signed(*b))?))
            }
            _ => Err(format!(
                "can't subtract {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, String> {
        if self.is_float() || other.is_float() {
            return Ok(Value::Float(self.float_value()? * other.float_value()?));
        }
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => {
                Ok(Value::Unsigned(multiply_unsigned(*a, *b)?))
            }
            (Value::Signed(a), Value::Signed(b)) => Ok(Value::Unsigned(multiply_unsigned(
                negate_signed(*a),
                negate_signed(*b),
            )?)),
            (Value::Signed(a), Value::Unsigned(b)) => Ok(Value::from(negate_unsigned(
                multiply_unsigned(negate_signed(*a), *b)?,
            )?)),
            (Value::Unsigned(a), Value::Signed(b)) => Ok(Value::from(negate_unsigned(
                multiply_unsigned(*a, negate_signed(*b))?,
            )?)),
            _ => Err(format!(
                "can't multiply {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value, String> {
        if matches!(other, Value::Unsigned(0)) || matches!(other, Value::Float(f) if *f == 0.0) {
            return Err(String::from("division by zero"));
        }
        if self.is_float() || other.is_float() {
            return Ok(Value::Float(self.float_value()? / other.float_value()?));
        }
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a / b)),
            (Value::Signed(a), Value::Signed(b)) => {
                Ok(Value::Unsigned(negate_signed(*a) / negate_signed(*b)))
            }
            (Value::Signed(a), Value::Unsigned(b)) => {
                Ok(Value::from(negate_unsigned(negate_signed(*a) / b)?))
            }
            (Value::Unsigned(a), Value::Signed(b)) => {
                Ok(Value::from(negate_unsigned(a / negate_signed(*b))?))
            }
            _ => Err(format!(
                "can't divide {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn modulo(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(_), Value::Unsigned(0)) => Err(String::from("division by zero")),
            (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a % b)),
            _ => Err(format!(
                "can't compute modulus of {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn bitwise_and(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a & b)),
            _ => Err(format!(
                "can't bitwise and {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn bitwise_or(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a | b)),
            _ => Err(format!(
                "can't bitwise or {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn bitwise_xor(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => Ok(Value::Unsigned(a ^ b)),
            _ => Err(format!(
                "can't bitwise exclusive or {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn bitwise_not(&self) -> Result<Value, String> {
        match self {
            Value::Signed(value) => Ok(Value::from(!value)),
            Value::Unsigned(value) => Ok(Value::Unsigned(!value)),
            _ => Err(format!("can't bitwise negate {}", self.type_name())),
        }
    }

    pub fn logical_and(&self, other: &Value) -> Result<Value, String> {
        Ok(Value::Boolean(
            self.boolean_value()? && other.boolean_value()?,
        ))
    }

    pub fn logical_or(&self, other: &Value) -> Result<Value, String> {
        Ok(Value::Boolean(
            self.boolean_value()? || other.boolean_value()?,
        ))
    }

    /// Shift right. A negative shift amount shifts in the other direction.
    pub fn shift_right(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => {
                if *b >= 64 {
                    Ok(Value::Unsigned(0))
                } else {
                    Ok(Value::Unsigned(a >> b))
                }
            }
            (Value::Signed(a), Value::Unsigned(b)) => {
                if *b >= 64 {
                    Ok(Value::from(-1i64))
                } else {
                    Ok(Value::from(a >> b))
                }
            }
            (Value::Unsigned(a), Value::Signed(b)) => {
                Ok(Value::Unsigned(shift_left_unsigned(*a, negate_signed(*b))?))
            }
            (Value::Signed(a), Value::Signed(b)) => {
                Ok(Value::from(shift_left_signed(*a, negate_signed(*b))?))
            }
            _ => Err(format!(
                "can't shift {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    /// Shift left. A negative shift amount shifts in the other direction.
    /// Shifting bits out of the 64 bit lane is reported as an overflow.
    pub fn shift_left(&self, other: &Value) -> Result<Value, String> {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => {
                Ok(Value::Unsigned(shift_left_unsigned(*a, *b)?))
            }
            (Value::Signed(a), Value::Unsigned(b)) => {
                Ok(Value::from(shift_left_signed(*a, *b)?))
            }
            (Value::Unsigned(a), Value::Signed(b)) => {
                let amount = negate_signed(*b);
                if amount >= 64 {
                    Ok(Value::Unsigned(0))
                } else {
                    Ok(Value::Unsigned(a >> amount))
                }
            }
            (Value::Signed(a), Value::Signed(b)) => {
                let amount = negate_signed(*b);
                if amount >= 64 {
                    Ok(Value::from(-1i64))
                } else {
                    Ok(Value::from(a >> amount))
                }
            }
            _ => Err(format!(
                "can't shift {} and {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn negate(&self) -> Result<Value, String> {
        match self {
            Value::Float(value) => Ok(Value::Float(-value)),
            Value::Signed(value) => Ok(Value::Unsigned(negate_signed(*value))),
            Value::Unsigned(value) => Ok(Value::from(negate_unsigned(*value)?)),
            _ => Err(format!("can't negate {}", self.type_name())),
        }
    }
}

/// The magnitude of a strictly negative number, which always fits into an
/// u64 (including i64::MIN).
fn negate_signed(value: i64) -> u64 {
    if value == i64::MIN {
        1u64 << 63
    } else {
        (-value) as u64
    }
}

/// Negate a magnitude into an i64, failing when it does not fit.
fn negate_unsigned(value: u64) -> Result<i64, String> {
    if value > 1u64 << 63 {
        Err(String::from("integer overflow"))
    } else if value == 1u64 << 63 {
        Ok(i64::MIN)
    } else {
        Ok(-(value as i64))
    }
}

fn add_unsigned(a: u64, b: u64) -> Result<u64, String> {
    a.checked_add(b).ok_or_else(|| String::from("integer overflow"))
}

fn add_signed(a: i64, b: i64) -> Result<i64, String> {
    a.checked_add(b).ok_or_else(|| String::from("integer overflow"))
}

fn multiply_unsigned(a: u64, b: u64) -> Result<u64, String> {
    a.checked_mul(b).ok_or_else(|| String::from("integer overflow"))
}

/// Add a strictly negative number and a magnitude, two's-complement style.
fn add_mixed(signed: i64, unsigned: u64) -> Result<Value, String> {
    let magnitude = negate_signed(signed);
    if unsigned >= magnitude {
        Ok(Value::Unsigned(unsigned - magnitude))
    } else {
        Ok(Value::from(negate_unsigned(magnitude - unsigned)?))
    }
}

fn shift_left_unsigned(a: u64, b: u64) -> Result<u64, String> {
    if b >= 64 {
        if a == 0 {
            return Ok(0);
        }
        return Err(String::from("integer overflow"));
    }
    let value = a << b;
    if value >> b != a {
        return Err(String::from("integer overflow"));
    }
    Ok(value)
}

fn shift_left_signed(a: i64, b: u64) -> Result<i64, String> {
    if b >= 64 {
        return Err(String::from("integer overflow"));
    }
    let value = a << b;
    if value >> b != a {
        return Err(String::from("integer overflow"));
    }
    Ok(value)
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Void, Value::Void) => true,
            (Value::Signed(a), Value::Signed(b)) => a == b,
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            // Thanks to normalization a signed value can never equal an
            // unsigned one, but floats do compare against any number.
            (Value::Float(a), _) if other.is_number() => {
                other.float_value().map(|b| *a == b).unwrap_or(false)
            }
            (_, Value::Float(b)) if self.is_number() => {
                self.float_value().map(|a| a == *b).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Signed(a), Value::Signed(b)) => a.partial_cmp(b),
            (Value::Unsigned(a), Value::Unsigned(b)) => a.partial_cmp(b),
            // A signed value is strictly negative, an unsigned one never is.
            (Value::Signed(_), Value::Unsigned(_)) => Some(Ordering::Less),
            (Value::Unsigned(_), Value::Signed(_)) => Some(Ordering::Greater),
            (Value::Float(_), _) | (_, Value::Float(_))
                if self.is_number() && other.is_number() =>
            {
                let a = self.float_value().ok()?;
                let b = other.float_value().ok()?;
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Signed(value) => write!(f, "{}", value),
            Value::Unsigned(value) => {
                let width = (self.default_size() * 2) as usize;
                write!(f, "${:0width$x}", value)
            }
            Value::String(value) => write!(f, "\"{}\"", value),
            Value::Void => write!(f, "void"),
        }
    }
}
