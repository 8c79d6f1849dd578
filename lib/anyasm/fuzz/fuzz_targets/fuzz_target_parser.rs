#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parser = anyasm::parser::Parser::new(&anyasm::opcodes::MOS6502);
    let _ = parser.parse(data);
});
