#![no_main]

use anyasm::assembler::Assembler;
use anyasm::opcodes::MOS6502;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = Assembler::new(&MOS6502).assemble(data);
});
