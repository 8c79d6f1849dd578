use std::sync::LazyLock;

use crate::cpu::Cpu;

/// The MOS 6502, which is always built in. The description itself lives in
/// `cpus/mos6502.toml` and goes through [`Cpu::from_toml`] exactly like a
/// user-provided one.
pub static MOS6502: LazyLock<Cpu> = LazyLock::new(|| {
    Cpu::from_toml(include_str!("../cpus/mos6502.toml")).expect("builtin 6502 description")
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::IntegerEncoding;

    #[test]
    fn the_builtin_description_loads() {
        assert_eq!(MOS6502.name, "MOS 6502");
        assert_eq!(MOS6502.modes.len(), 13);
        assert_eq!(MOS6502.instructions.len(), 56);
    }

    #[test]
    fn well_known_opcodes() {
        let lda = &MOS6502.instructions["lda"];
        assert_eq!(lda.opcodes["immediate"], 0xA9);
        assert_eq!(lda.opcodes["absolute"], 0xAD);
        assert_eq!(lda.opcodes["indirect_y"], 0xB1);

        assert_eq!(MOS6502.instructions["nop"].opcodes["implied"], 0xEA);
        assert_eq!(MOS6502.instructions["jmp"].opcodes["indirect"], 0x6C);
        assert_eq!(MOS6502.instructions["asl"].opcodes["accumulator"], 0x0A);
    }

    #[test]
    fn zero_page_is_preferred_over_absolute() {
        assert!(MOS6502.modes["zeropage"].priority < MOS6502.modes["absolute"].priority);
        assert!(MOS6502.modes["zeropage_x"].priority < MOS6502.modes["absolute_x"].priority);
        assert!(MOS6502.modes["zeropage_y"].priority < MOS6502.modes["absolute_y"].priority);
    }

    #[test]
    fn branches_emit_a_signed_displacement() {
        let relative = &MOS6502.modes["relative"];
        assert_eq!(relative.template.len(), 2);
        assert_eq!(relative.template[1].encoding, Some(IntegerEncoding::signed(1)));
    }

    #[test]
    fn lexical_sets_cover_the_notations() {
        for c in ['#', '(', ')', ','] {
            assert!(MOS6502.punctuation.contains(&c));
        }
        for word in ["a", "x", "y"] {
            assert!(MOS6502.reserved_words.contains(word));
        }
    }

    #[test]
    fn bare_and_explicit_accumulator_spellings() {
        assert_eq!(MOS6502.modes["accumulator"].notations.len(), 2);
        assert!(MOS6502.modes["accumulator"].notations[0].is_empty());
    }
}
