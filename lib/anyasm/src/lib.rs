#[macro_use]
extern crate lazy_static;

pub mod assembler;
pub mod body;
pub mod cpu;
pub mod encoder;
pub mod encoding;
pub mod errors;
pub mod eval;
pub mod expression;
pub mod matcher;
pub mod node;
pub mod opcodes;
pub mod parser;
pub mod value;
