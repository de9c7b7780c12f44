use encoding_rs::SHIFT_JIS;

use crate::common::metadata::Version;

// Mode
//------------------------------------------------------------------------------

/// Encodation modes, ordered by generality. The discriminant doubles as the
/// 4-bit mode indicator of full-size QR symbols.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
}

pub static MODES: [Mode; 4] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji];

// Indicators without a data payload of their own.
pub const ECI_INDICATOR: u8 = 0b0111;
pub const GS1_INDICATOR: u8 = 0b0101;

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

impl Mode {
    /// Whether a single byte is representable in this mode. Kanji operates on
    /// byte pairs; see [`is_kanji_pair`].
    pub fn contains(self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => alphanumeric_value(byte).is_some(),
            Self::Byte => true,
            Self::Kanji => false,
        }
    }

    /// Payload bit length of `byte_count` input bytes in this mode, excluding
    /// indicator overhead.
    pub fn encoded_len(self, byte_count: usize) -> usize {
        match self {
            Self::Numeric => (byte_count / 3) * 10 + [0, 4, 7][byte_count % 3],
            Self::Alphanumeric => (byte_count / 2) * 11 + (byte_count & 1) * 6,
            Self::Byte => byte_count * 8,
            Self::Kanji => {
                debug_assert!(byte_count & 1 == 0, "Kanji data must be byte pairs");
                (byte_count / 2) * 13
            }
        }
    }

    /// Packs one chunk (1-3 digits, 1-2 alphanumerics, 1 byte or 1 kanji
    /// pair) into its bit group. Returns the value and its bit width.
    pub fn encode_chunk(self, chunk: &[u8]) -> (u16, usize) {
        match self {
            Self::Numeric => {
                debug_assert!((1..=3).contains(&chunk.len()), "Invalid numeric chunk");
                let mut val = 0u16;
                for &b in chunk {
                    debug_assert!(b.is_ascii_digit(), "Invalid numeric byte: {b}");
                    val = val * 10 + (b - b'0') as u16;
                }
                (val, [4, 7, 10][chunk.len() - 1])
            }
            Self::Alphanumeric => match *chunk {
                [a] => (alphanumeric_value(a).expect("Invalid alphanumeric byte") as u16, 6),
                [a, b] => {
                    let a = alphanumeric_value(a).expect("Invalid alphanumeric byte") as u16;
                    let b = alphanumeric_value(b).expect("Invalid alphanumeric byte") as u16;
                    (a * 45 + b, 11)
                }
                _ => unreachable!("Invalid alphanumeric chunk"),
            },
            Self::Byte => {
                debug_assert!(chunk.len() == 1, "Invalid byte chunk");
                (chunk[0] as u16, 8)
            }
            Self::Kanji => {
                debug_assert!(chunk.len() == 2, "Invalid kanji chunk");
                let cp = ((chunk[0] as u16) << 8) | chunk[1] as u16;
                let offset = if cp < 0xE040 { cp - 0x8140 } else { cp - 0xC140 };
                ((offset >> 8) * 0xC0 + (offset & 0xFF), 13)
            }
        }
    }
}

fn alphanumeric_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'Z' => Some(byte - b'A' + 10),
        b' ' => Some(36),
        b'$' => Some(37),
        b'%' => Some(38),
        b'*' => Some(39),
        b'+' => Some(40),
        b'-' => Some(41),
        b'.' => Some(42),
        b'/' => Some(43),
        b':' => Some(44),
        _ => None,
    }
}

/// Whether two bytes form a Shift JIS double-byte character inside the QR
/// Kanji mode ranges 0x8140-0x9FFC and 0xE040-0xEBBF, and decode to a real
/// character.
pub fn is_kanji_pair(hi: u8, lo: u8) -> bool {
    let cp = ((hi as u16) << 8) | lo as u16;
    if !matches!(cp, 0x8140..=0x9FFC | 0xE040..=0xEBBF) {
        return false;
    }
    let pair = [hi, lo];
    let (decoded, _, failed) = SHIFT_JIS.decode(&pair);
    !failed && decoded.chars().count() == 1 && !decoded.contains('\u{FFFD}')
}

// Segment
//------------------------------------------------------------------------------

/// A contiguous run of input bytes committed to one mode. Segments of an
/// encoding partition the input exactly.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Segment<'a> {
    pub mode: Mode,
    pub data: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, data: &'a [u8]) -> Self {
        Self { mode, data }
    }

    /// Character count for the count indicator: bytes, except kanji which
    /// counts double-byte characters.
    pub fn char_count(&self) -> usize {
        match self.mode {
            Mode::Kanji => self.data.len() / 2,
            _ => self.data.len(),
        }
    }

    /// Total bit length including mode and count indicators for the given
    /// version.
    pub fn bit_len(&self, ver: Version) -> usize {
        ver.mode_bits() + ver.char_cnt_bits(self.mode) + self.mode.encoded_len(self.data.len())
    }
}
