use std::fmt;
use std::ops;

use crate::value::Value;

/// How many bytes a piece of output will take once everything is known: a
/// closed or half-open interval. Statements whose size depends on an
/// unresolved symbol carry a range like `(2, 3)` until the symbol settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub minimum: u64,
    pub maximum: Option<u64>,
}

impl SizeRange {
    pub fn new(minimum: u64, maximum: Option<u64>) -> Self {
        Self { minimum, maximum }
    }

    /// A range that has already collapsed to a single size.
    pub fn exact(size: u64) -> Self {
        Self {
            minimum: size,
            maximum: Some(size),
        }
    }

    /// The single size this range stands for, if it has collapsed.
    pub fn size(&self) -> Option<u64> {
        if self.maximum == Some(self.minimum) {
            Some(self.minimum)
        } else {
            None
        }
    }

    /// The smallest range containing both operands.
    pub fn union(&self, other: &SizeRange) -> SizeRange {
        SizeRange {
            minimum: self.minimum.min(other.minimum),
            maximum: match (self.maximum, other.maximum) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

impl ops::Add for SizeRange {
    type Output = SizeRange;

    fn add(self, other: SizeRange) -> SizeRange {
        SizeRange {
            minimum: self.minimum + other.minimum,
            maximum: match (self.maximum, other.maximum) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.maximum {
            Some(maximum) => write!(f, "({}, {})", self.minimum, maximum),
            None => write!(f, "({},)", self.minimum),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// How an integer is laid down into output bytes: signedness, byte count
/// and byte order. Rendered as the `:2` / `:-2` suffix known from byte
/// templates, with a `be` tail for the rare big-endian target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerEncoding {
    pub size: u64,
    pub signed: bool,
    pub byte_order: ByteOrder,
}

impl IntegerEncoding {
    pub fn new(size: u64, signed: bool, byte_order: ByteOrder) -> Self {
        Self {
            size,
            signed,
            byte_order,
        }
    }

    pub fn unsigned(size: u64) -> Self {
        Self::new(size, false, ByteOrder::Little)
    }

    pub fn signed(size: u64) -> Self {
        Self::new(size, true, ByteOrder::Little)
    }

    /// The natural encoding of a concrete integer: signedness from its
    /// sign, size from the smallest width it round-trips through.
    pub fn for_value(value: &Value) -> Option<IntegerEncoding> {
        if !value.is_integer() {
            return None;
        }
        Some(IntegerEncoding::new(
            value.default_size(),
            value.is_signed(),
            ByteOrder::Little,
        ))
    }

    pub fn minimum(&self) -> Value {
        if self.signed {
            if self.size >= 8 {
                Value::from(i64::MIN)
            } else {
                Value::from(-(1i64 << (8 * self.size - 1)))
            }
        } else {
            Value::Unsigned(0)
        }
    }

    pub fn maximum(&self) -> Value {
        if self.signed {
            if self.size >= 8 {
                Value::from(i64::MAX)
            } else {
                Value::Unsigned((1u64 << (8 * self.size - 1)) - 1)
            }
        } else if self.size >= 8 {
            Value::Unsigned(u64::MAX)
        } else {
            Value::Unsigned((1u64 << (8 * self.size)) - 1)
        }
    }

    pub fn fits(&self, value: &Value) -> bool {
        value.is_integer() && *value >= self.minimum() && *value <= self.maximum()
    }

    /// Turn a concrete integer into bytes, two's-complement for signed
    /// encodings.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, String> {
        if !value.is_integer() {
            return Err(format!("can't encode {}", value.type_name()));
        }
        if !self.fits(value) {
            return Err(String::from("value overflow"));
        }
        let bits = if self.signed {
            value.signed_value()? as u64
        } else {
            value.unsigned_value()?
        };
        let mut bytes = Vec::with_capacity(self.size as usize);
        for index in 0..self.size {
            bytes.push((bits >> (8 * index)) as u8);
        }
        if self.byte_order == ByteOrder::Big {
            bytes.reverse();
        }
        Ok(bytes)
    }
}

impl fmt::Display for IntegerEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ":{}{}", if self.signed { "-" } else { "" }, self.size)?;
        if self.byte_order == ByteOrder::Big {
            write!(f, "be")?;
        }
        Ok(())
    }
}
