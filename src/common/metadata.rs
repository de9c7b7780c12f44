use std::fmt::{Display, Error, Formatter};
use std::ops::{Deref, Not};

use super::codec::Mode;
use super::mask::MaskPattern;

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Color {
    Light,
    Dark,
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl Color {
    pub fn select<T>(&self, dark: T, light: T) -> T {
        match self {
            Self::Dark => dark,
            Self::Light => light,
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// The 2-bit indicator carried in the format information, per ISO/IEC
    /// 18004 §8.9. Not the same ordering as the enum.
    pub fn format_bits(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }
}

pub static EC_LEVELS: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Version {
    Micro(usize),
    Normal(usize),
}

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        match self {
            Self::Micro(v) => v,
            Self::Normal(v) => v,
        }
    }
}

impl Version {
    pub const fn width(self) -> usize {
        match self {
            Self::Micro(v) => v * 2 + 9,
            Self::Normal(v) => v * 4 + 17,
        }
    }

    pub fn total_codewords(self) -> usize {
        match self {
            Self::Micro(v) => MICRO_TOTAL_CODEWORDS[v - 1],
            Self::Normal(v) => TOTAL_CODEWORDS[v - 1],
        }
    }

    pub fn supports(self, ecl: ECLevel) -> bool {
        match self {
            Self::Micro(v) => MICRO_DATA_BITS[v - 1][ecl as usize] > 0,
            Self::Normal(_) => true,
        }
    }

    pub fn supports_mode(self, mode: Mode) -> bool {
        match (self, mode) {
            (Self::Normal(_), _) => true,
            (Self::Micro(1), m) => m == Mode::Numeric,
            (Self::Micro(2), m) => matches!(m, Mode::Numeric | Mode::Alphanumeric),
            (Self::Micro(_), _) => true,
        }
    }

    /// Data capacity in bits for the given error correction level. Micro
    /// versions M1 and M3 end in a 4-bit codeword, so this is not always a
    /// multiple of 8. Zero means the level is unsupported (Micro only).
    pub fn data_bit_capacity(self, ecl: ECLevel) -> usize {
        match self {
            Self::Micro(v) => MICRO_DATA_BITS[v - 1][ecl as usize],
            Self::Normal(_) => {
                let (b1s, b1c, b2s, b2c) = self.data_codewords_per_block(ecl);
                (b1s * b1c + b2s * b2c) * 8
            }
        }
    }

    /// Bit length of the final codeword stream (data + parity), which is the
    /// number of data modules the grid carries before remainder bits.
    pub fn total_bit_capacity(self, ecl: ECLevel) -> usize {
        match self {
            Self::Micro(_) => {
                let (_, b1c, _, _) = self.data_codewords_per_block(ecl);
                self.data_bit_capacity(ecl) + b1c * self.ecc_per_block(ecl) * 8
            }
            Self::Normal(_) => self.total_codewords() * 8,
        }
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        match self {
            Self::Micro(v) => MICRO_ECC_PER_BLOCK[v - 1][ecl as usize],
            Self::Normal(v) => EC_BLOCKS[v - 1][ecl as usize].0,
        }
    }

    /// (block1 size, block1 count, block2 size, block2 count) of data
    /// codewords. Micro symbols always hold a single block.
    pub fn data_codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        match self {
            Self::Micro(v) => (MICRO_DATA_BITS[v - 1][ecl as usize].div_ceil(8), 1, 0, 0),
            Self::Normal(v) => {
                let (_, c1, k1, c2, k2) = EC_BLOCKS[v - 1][ecl as usize];
                (k1, c1, k2, c2)
            }
        }
    }

    pub fn mode_bits(self) -> usize {
        match self {
            Self::Micro(v) => v - 1,
            Self::Normal(_) => 4,
        }
    }

    pub fn mode_indicator(self, mode: Mode) -> u8 {
        match self {
            Self::Micro(_) => match mode {
                Mode::Numeric => 0b00,
                Mode::Alphanumeric => 0b01,
                Mode::Byte => 0b10,
                Mode::Kanji => 0b11,
            },
            Self::Normal(_) => mode as u8,
        }
    }

    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        let index = match mode {
            Mode::Numeric => 0,
            Mode::Alphanumeric => 1,
            Mode::Byte => 2,
            Mode::Kanji => 3,
        };
        match self {
            Self::Micro(v) => MICRO_CHAR_CNT_BITS[v - 1][index],
            Self::Normal(1..=9) => [10, 9, 8, 8][index],
            Self::Normal(10..=26) => [12, 11, 16, 10][index],
            Self::Normal(27..=40) => [14, 13, 16, 12][index],
            Self::Normal(_) => unreachable!("Invalid version"),
        }
    }

    pub fn terminator_bits(self) -> usize {
        match self {
            Self::Micro(v) => 2 * v + 1,
            Self::Normal(_) => 4,
        }
    }

    pub fn remainder_bits(self) -> usize {
        match self {
            Self::Micro(_) => 0,
            Self::Normal(v) => REMAINDER_BITS[v - 1],
        }
    }

    pub fn alignment_pattern(self) -> &'static [i16] {
        match self {
            Self::Micro(_) => &[],
            Self::Normal(v) => ALIGNMENT_PATTERN_COORDS[v - 1],
        }
    }

    /// The BCH-protected 18-bit version codeword, defined for versions 7-40.
    pub fn info(self) -> u32 {
        match self {
            Self::Normal(v @ 7..=40) => VERSION_INFOS[v - 7],
            _ => unreachable!("Version info only exists for versions 7-40"),
        }
    }

    /// Index of the (version, ec level) pair in the Micro QR format
    /// information, per ISO/IEC 18004 Table 13.
    fn micro_symbol_number(self, ecl: ECLevel) -> u32 {
        debug_assert!(self.supports(ecl), "Unsupported ec level");

        match (self, ecl) {
            (Self::Micro(1), ECLevel::L) => 0,
            (Self::Micro(2), ECLevel::L) => 1,
            (Self::Micro(2), ECLevel::M) => 2,
            (Self::Micro(3), ECLevel::L) => 3,
            (Self::Micro(3), ECLevel::M) => 4,
            (Self::Micro(4), ECLevel::L) => 5,
            (Self::Micro(4), ECLevel::M) => 6,
            (Self::Micro(4), ECLevel::Q) => 7,
            _ => unreachable!("Invalid micro symbol"),
        }
    }
}

// Format & version info codewords
//------------------------------------------------------------------------------

pub fn format_info(ver: Version, ecl: ECLevel, mask: MaskPattern) -> u32 {
    match ver {
        Version::Micro(_) => {
            let index = (ver.micro_symbol_number(ecl) << 2) | *mask as u32;
            FORMAT_INFOS_MICRO[index as usize] as u32
        }
        Version::Normal(_) => {
            let index = (ecl.format_bits() << 3) | *mask as u32;
            FORMAT_INFOS_QR[index as usize] as u32
        }
    }
}

/// BCH(15, 5) codeword for 5 data bits: the data followed by the remainder of
/// `data * x^10` modulo the generator `x^10+x^8+x^5+x^4+x^2+x+1`, XORed with
/// the symbology's fixed format mask.
pub const fn bch_format_info(data: u16, xor_mask: u16) -> u16 {
    let mut enc = (data as u32) << 10;
    let mut i = 14;
    while i >= 10 {
        if (enc >> i) & 1 == 1 {
            enc ^= 0x537 << (i - 10);
        }
        i -= 1;
    }
    ((((data as u32) << 10) | enc) as u16) ^ xor_mask
}

/// BCH(18, 6) codeword for the version information, generator
/// `x^12+x^11+x^10+x^9+x^8+x^5+x^2+1`.
pub const fn bch_version_info(data: u32) -> u32 {
    let mut enc = data << 12;
    let mut i = 17;
    while i >= 12 {
        if (enc >> i) & 1 == 1 {
            enc ^= 0x1F25 << (i - 12);
        }
        i -= 1;
    }
    (data << 12) | enc
}

pub const FORMAT_MASK_QR: u16 = 0x5412;
pub const FORMAT_MASK_MICRO: u16 = 0x4445;

const fn build_micro_format_infos() -> [u16; 32] {
    let mut infos = [0u16; 32];
    let mut i = 0;
    while i < 32 {
        infos[i] = bch_format_info(i as u16, FORMAT_MASK_MICRO);
        i += 1;
    }
    infos
}

// Metadata for display & reporting
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Metadata {
    pub version: Option<Version>,
    pub ec_level: Option<ECLevel>,
    pub mask: Option<MaskPattern>,
}

impl Metadata {
    pub fn new(version: Option<Version>, ec_level: Option<ECLevel>, mask: Option<MaskPattern>) -> Self {
        Self { version, ec_level, mask }
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(
            f,
            "{{ Version: {:?}, Ec level: {:?}, Mask: {:?} }}",
            self.version, self.ec_level, self.mask
        )
    }
}

// Global constants
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BIT_LEN: usize = 15;

pub const VERSION_INFO_BIT_LEN: usize = 18;

// Format info coordinates MSB first, around the top left finder.
pub static FORMAT_INFO_COORDS_QR_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

// Second copy split between the bottom left and top right finders.
pub static FORMAT_INFO_COORDS_QR_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

pub static FORMAT_INFO_COORDS_MICRO: [(i16, i16); 15] = [
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 6),
    (8, 7),
    (8, 8),
    (7, 8),
    (6, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
];

// Version info coordinates MSB first; 3x6 block above the bottom left finder.
pub static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

// 6x3 block left of the top right finder.
pub static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

// 15-bit format codewords indexed by (ec indicator << 3) | mask.
// ISO/IEC 18004:2006 Annex C, Table C.1.
#[rustfmt::skip]
pub static FORMAT_INFOS_QR: [u16; 32] = [
    0x5412, 0x5125, 0x5E7C, 0x5B4B, 0x45F9, 0x40CE, 0x4F97, 0x4AA0,
    0x77C4, 0x72F3, 0x7DAA, 0x789D, 0x662F, 0x6318, 0x6C41, 0x6976,
    0x1689, 0x13BE, 0x1CE7, 0x19D0, 0x0762, 0x0255, 0x0D0C, 0x083B,
    0x355F, 0x3068, 0x3F31, 0x3A06, 0x24B4, 0x2183, 0x2EDA, 0x2BED,
];

// 15-bit format codewords indexed by (symbol number << 2) | mask.
pub static FORMAT_INFOS_MICRO: [u16; 32] = build_micro_format_infos();

// 18-bit version codewords for versions 7-40, ISO/IEC 18004:2006 Annex D.
#[rustfmt::skip]
pub static VERSION_INFOS: [u32; 34] = [
    0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D,
    0x0F928, 0x10B78, 0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9,
    0x177EC, 0x18EC4, 0x191E1, 0x1AFAB, 0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75,
    0x1F250, 0x209D5, 0x216F0, 0x228BA, 0x2379F, 0x24B0B, 0x2542E, 0x26A64,
    0x27541, 0x28C69,
];

#[rustfmt::skip]
static TOTAL_CODEWORDS: [usize; 40] = [
    26, 44, 70, 100, 134, 172, 196, 242, 292, 346, 404, 466, 532, 581, 655,
    733, 815, 901, 991, 1085, 1156, 1258, 1364, 1474, 1588, 1706, 1828, 1921,
    2051, 2185, 2323, 2465, 2611, 2761, 2876, 3034, 3196, 3362, 3532, 3706,
];

static MICRO_TOTAL_CODEWORDS: [usize; 4] = [5, 10, 17, 24];

#[rustfmt::skip]
static REMAINDER_BITS: [usize; 40] = [
    0, 7, 7, 7, 7, 7, 0, 0, 0, 0, 0, 0, 0, 3, 3, 3, 3, 3, 3, 3,
    4, 4, 4, 4, 4, 4, 4, 3, 3, 3, 3, 3, 3, 3, 0, 0, 0, 0, 0, 0,
];

// Micro QR data capacity in bits per [L, M, Q, H]; zero marks an unsupported
// level. M1 and M3 end in a 4-bit codeword.
static MICRO_DATA_BITS: [[usize; 4]; 4] = [
    [20, 0, 0, 0],
    [40, 32, 0, 0],
    [84, 68, 0, 0],
    [128, 112, 80, 0],
];

static MICRO_ECC_PER_BLOCK: [[usize; 4]; 4] = [
    [2, 0, 0, 0],
    [5, 6, 0, 0],
    [6, 8, 0, 0],
    [8, 10, 14, 0],
];

// Count indicator widths per [Numeric, Alphanumeric, Byte, Kanji].
static MICRO_CHAR_CNT_BITS: [[usize; 4]; 4] = [
    [3, 0, 0, 0],
    [4, 3, 0, 0],
    [5, 4, 4, 3],
    [6, 5, 5, 4],
];

// Per version and [L, M, Q, H]: (ecc per block, block1 count, block1 data
// codewords, block2 count, block2 data codewords).
// ISO/IEC 18004:2006 Table 9.
#[rustfmt::skip]
static EC_BLOCKS: [[(usize, usize, usize, usize, usize); 4]; 40] = [
    [(7, 1, 19, 0, 0),     (10, 1, 16, 0, 0),    (13, 1, 13, 0, 0),    (17, 1, 9, 0, 0)],
    [(10, 1, 34, 0, 0),    (16, 1, 28, 0, 0),    (22, 1, 22, 0, 0),    (28, 1, 16, 0, 0)],
    [(15, 1, 55, 0, 0),    (26, 1, 44, 0, 0),    (18, 2, 17, 0, 0),    (22, 2, 13, 0, 0)],
    [(20, 1, 80, 0, 0),    (18, 2, 32, 0, 0),    (26, 2, 24, 0, 0),    (16, 4, 9, 0, 0)],
    [(26, 1, 108, 0, 0),   (24, 2, 43, 0, 0),    (18, 2, 15, 2, 16),   (22, 2, 11, 2, 12)],
    [(18, 2, 68, 0, 0),    (16, 4, 27, 0, 0),    (24, 4, 19, 0, 0),    (28, 4, 15, 0, 0)],
    [(20, 2, 78, 0, 0),    (18, 4, 31, 0, 0),    (18, 2, 14, 4, 15),   (26, 4, 13, 1, 14)],
    [(24, 2, 97, 0, 0),    (22, 2, 38, 2, 39),   (22, 4, 18, 2, 19),   (26, 4, 14, 2, 15)],
    [(30, 2, 116, 0, 0),   (22, 3, 36, 2, 37),   (20, 4, 16, 4, 17),   (24, 4, 12, 4, 13)],
    [(18, 2, 68, 2, 69),   (26, 4, 43, 1, 44),   (24, 6, 19, 2, 20),   (28, 6, 15, 2, 16)],
    [(20, 4, 81, 0, 0),    (30, 1, 50, 4, 51),   (28, 4, 22, 4, 23),   (24, 3, 12, 8, 13)],
    [(24, 2, 92, 2, 93),   (22, 6, 36, 2, 37),   (26, 4, 20, 6, 21),   (28, 7, 14, 4, 15)],
    [(26, 4, 107, 0, 0),   (22, 8, 37, 1, 38),   (24, 8, 20, 4, 21),   (22, 12, 11, 4, 12)],
    [(30, 3, 115, 1, 116), (24, 4, 40, 5, 41),   (20, 11, 16, 5, 17),  (24, 11, 12, 5, 13)],
    [(22, 5, 87, 1, 88),   (24, 5, 41, 5, 42),   (30, 5, 24, 7, 25),   (24, 11, 12, 7, 13)],
    [(24, 5, 98, 1, 99),   (28, 7, 45, 3, 46),   (24, 15, 19, 2, 20),  (30, 3, 15, 13, 16)],
    [(28, 1, 107, 5, 108), (28, 10, 46, 1, 47),  (28, 1, 22, 15, 23),  (28, 2, 14, 17, 15)],
    [(30, 5, 120, 1, 121), (26, 9, 43, 4, 44),   (28, 17, 22, 1, 23),  (28, 2, 14, 19, 15)],
    [(28, 3, 113, 4, 114), (26, 3, 44, 11, 45),  (26, 17, 21, 4, 22),  (26, 9, 13, 16, 14)],
    [(28, 3, 107, 5, 108), (26, 3, 41, 13, 42),  (30, 15, 24, 5, 25),  (28, 15, 15, 10, 16)],
    [(28, 4, 116, 4, 117), (26, 17, 42, 0, 0),   (28, 17, 22, 6, 23),  (30, 19, 16, 6, 17)],
    [(28, 2, 111, 7, 112), (28, 17, 46, 0, 0),   (30, 7, 24, 16, 25),  (24, 34, 13, 0, 0)],
    [(30, 4, 121, 5, 122), (28, 4, 47, 14, 48),  (30, 11, 24, 14, 25), (30, 16, 15, 14, 16)],
    [(30, 6, 117, 4, 118), (28, 6, 45, 14, 46),  (30, 11, 24, 16, 25), (30, 30, 16, 2, 17)],
    [(26, 8, 106, 4, 107), (28, 8, 47, 13, 48),  (30, 7, 24, 22, 25),  (30, 22, 15, 13, 16)],
    [(28, 10, 114, 2, 115),(28, 19, 46, 4, 47),  (28, 28, 22, 6, 23),  (30, 33, 16, 4, 17)],
    [(30, 8, 122, 4, 123), (28, 22, 45, 3, 46),  (30, 8, 23, 26, 24),  (30, 12, 15, 28, 16)],
    [(30, 3, 117, 10, 118),(28, 3, 45, 23, 46),  (30, 4, 24, 31, 25),  (30, 11, 15, 31, 16)],
    [(30, 7, 116, 7, 117), (28, 21, 45, 7, 46),  (30, 1, 23, 37, 24),  (30, 19, 15, 26, 16)],
    [(30, 5, 115, 10, 116),(28, 19, 47, 10, 48), (30, 15, 24, 25, 25), (30, 23, 15, 25, 16)],
    [(30, 13, 115, 3, 116),(28, 2, 46, 29, 47),  (30, 42, 24, 1, 25),  (30, 23, 15, 28, 16)],
    [(30, 17, 115, 0, 0),  (28, 10, 46, 23, 47), (30, 10, 24, 35, 25), (30, 19, 15, 35, 16)],
    [(30, 17, 115, 1, 116),(28, 14, 46, 21, 47), (30, 29, 24, 19, 25), (30, 11, 15, 46, 16)],
    [(30, 13, 115, 6, 116),(28, 14, 46, 23, 47), (30, 44, 24, 7, 25),  (30, 59, 16, 1, 17)],
    [(30, 12, 121, 7, 122),(28, 12, 47, 26, 48), (30, 39, 24, 14, 25), (30, 22, 15, 41, 16)],
    [(30, 6, 121, 14, 122),(28, 6, 47, 34, 48),  (30, 46, 24, 10, 25), (30, 2, 15, 64, 16)],
    [(30, 17, 122, 4, 123),(28, 29, 46, 14, 47), (30, 49, 24, 10, 25), (30, 24, 15, 46, 16)],
    [(30, 4, 122, 18, 123),(28, 13, 46, 32, 47), (30, 48, 24, 14, 25), (30, 42, 15, 32, 16)],
    [(30, 20, 117, 4, 118),(28, 40, 47, 7, 48),  (30, 43, 24, 22, 25), (30, 10, 15, 67, 16)],
    [(30, 19, 118, 6, 119),(28, 18, 47, 31, 48), (30, 34, 24, 34, 25), (30, 20, 15, 61, 16)],
];

// Alignment pattern center coordinates, ISO/IEC 18004:2006 Annex E.
static ALIGNMENT_PATTERN_COORDS: [&[i16]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];
