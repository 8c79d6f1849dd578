use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Cpu(CpuError),
    Eval(EvalError),
}

impl From<ParseError> for Vec<Error> {
    fn from(err: ParseError) -> Self {
        vec![Error::Parse(err)]
    }
}

impl From<CpuError> for Vec<Error> {
    fn from(err: CpuError) -> Self {
        vec![Error::Cpu(err)]
    }
}

impl From<EvalError> for Vec<Error> {
    fn from(err: EvalError) -> Self {
        vec![Error::Eval(err)]
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(parse_error) => write!(f, "{}", parse_error),
            Error::Cpu(cpu_error) => write!(f, "{}", cpu_error),
            Error::Eval(eval_error) => write!(f, "{}", eval_error),
        }
    }
}

/// An error which occurred while parsing source code or argument notation.
/// The `line` is zero-based and gets printed as one-based.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line + 1)
    }
}

/// An error raised while loading or validating a CPU description. These are
/// not tied to a source line but to a path of keys inside of the description,
/// which is already part of the message.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuError {
    pub message: String,
}

impl std::error::Error for CpuError {}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// An error which occurred when evaluating expressions or instruction bodies.
/// If `global` is set, then the error belongs to the program as a whole and
/// not to any specific line (e.g. a label table which never settles).
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub line: usize,
    pub message: String,
    pub global: bool,
}

impl std::error::Error for EvalError {}

impl EvalError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        EvalError {
            line,
            message: message.into(),
            global: false,
        }
    }

    pub fn global(message: impl Into<String>) -> Self {
        EvalError {
            line: 0,
            message: message.into(),
            global: true,
        }
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError {
            line: err.line,
            message: err.message,
            global: false,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.global {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (line {})", self.message, self.line + 1)
        }
    }
}
