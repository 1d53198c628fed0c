//! Code 128 (code set B) encoder.
//!
//! The symbol is start B, one symbol per character, the mod-103 checksum and
//! the stop pattern. Only printable ASCII (space through `~`) is encodable;
//! anything else rejects the whole SKU.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("cannot encode an empty SKU")]
    Empty,
    #[error("character {ch:?} at position {position} is not supported by Code 128 set B")]
    UnsupportedCharacter { ch: char, position: usize },
    #[error("barcode needs {modules} modules but only {available_px}px are available")]
    TooWide { modules: usize, available_px: u32 },
}

const START_B: u8 = 104;
const STOP: usize = 106;
const CHECKSUM_MODULUS: u32 = 103;

/// Bar/space widths per symbol value, starting with a bar.
const PATTERNS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232", "2331112",
];

/// An encoded barcode: symbol values plus the module sequence to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code128 {
    symbols: Vec<u8>,
}

impl Code128 {
    pub fn encode(text: &str) -> Result<Self, BarcodeError> {
        if text.is_empty() {
            return Err(BarcodeError::Empty);
        }

        let mut symbols = Vec::with_capacity(text.len() + 3);
        symbols.push(START_B);
        for (position, ch) in text.chars().enumerate() {
            if !(' '..='~').contains(&ch) {
                return Err(BarcodeError::UnsupportedCharacter { ch, position });
            }
            symbols.push(ch as u8 - b' ');
        }

        let weighted: u32 = symbols
            .iter()
            .enumerate()
            .map(|(i, &value)| i.max(1) as u32 * value as u32)
            .sum();
        symbols.push((weighted % CHECKSUM_MODULUS) as u8);
        symbols.push(STOP as u8);
        Ok(Self { symbols })
    }

    /// Start, data, checksum and stop values in order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// One entry per module, `true` for a bar.
    pub fn modules(&self) -> Vec<bool> {
        let mut modules = Vec::with_capacity(self.symbols.len() * 11 + 2);
        for &value in &self.symbols {
            for (i, width) in PATTERNS[value as usize].bytes().enumerate() {
                let bar = i % 2 == 0;
                modules.extend(std::iter::repeat(bar).take((width - b'0') as usize));
            }
        }
        modules
    }

    /// Widest whole-pixel module width, up to `preferred`, that fits `available_px`.
    pub fn module_width(&self, preferred: u32, available_px: u32) -> Result<u32, BarcodeError> {
        let modules = self.modules().len();
        let fit = available_px / modules.max(1) as u32;
        match preferred.min(fit) {
            0 => Err(BarcodeError::TooWide {
                modules,
                available_px,
            }),
            width => Ok(width),
        }
    }
}
