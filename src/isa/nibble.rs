use crate::decoder::{Decoded, Decoder, Op};
use crate::program::Word;

/// Decoder for the 8-bit control unit word: opcode in the high nibble,
/// operand in the low nibble. Every one of the 256 words decodes.
pub struct NibbleDecoder;

impl NibbleDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NibbleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NibbleDecoder {
    fn decode(&self, word: Word) -> Decoded {
        Decoded {
            op: Op::from_opcode(word.opcode()),
            operand: word.operand(),
            raw: word,
        }
    }
}
