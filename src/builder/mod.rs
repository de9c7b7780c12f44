mod qr;

pub use qr::{Module, Row, QR};

use std::ops::Deref;

use crate::common::{
    bit_utils::BitStream,
    codec::{encode, encode_with_version},
    ec::ecc,
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

/// Per-call pipeline assembling a QR or Micro QR symbol: segmentation and
/// bit stream encoding, Reed-Solomon blocks, placement and masking. Holds
/// only the request; every build allocates its own grid.
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    eci: Option<u32>,
    gs1: bool,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::L, mask: None, eci: None, gs1: false }
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    /// Minimum error correction level; the builder boosts it when the
    /// chosen version has room.
    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    /// ECI designator, emitted as a header before the data segments.
    pub fn eci(&mut self, designator: u32) -> &mut Self {
        self.eci = Some(designator);
        self
    }

    /// Marks the symbol as GS1 formatted (FNC1 in first position).
    pub fn gs1(&mut self, gs1: bool) -> &mut Self {
        self.gs1 = gs1;
        self
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        if let Some(v) = self.version {
            if !matches!(v, Version::Normal(1..=40) | Version::Micro(1..=4)) {
                return Err(QRError::InvalidOption("version out of range"));
            }
        }
        if let Some(m) = self.mask {
            let limit = match self.version {
                Some(Version::Micro(_)) => 4,
                _ => 8,
            };
            if *m >= limit {
                return Err(QRError::InvalidOption("mask index out of range"));
            }
        }

        // Encode data optimally
        let (encoded_data, version, ec_level) = match self.version {
            Some(v) => {
                let (bs, ecl) = encode_with_version(self.data, v, self.ec_level, self.eci, self.gs1)?;
                (bs, v, ecl)
            }
            None => encode(self.data, self.ec_level, self.eci, self.gs1)?,
        };

        // Construct payload with ecc & interleaving
        let payload = Self::assemble_payload(&encoded_data, version, ec_level);
        let expected = version.total_bit_capacity(ec_level);
        if payload.len() != expected {
            return Err(QRError::InvariantViolation { expected, got: payload.len() });
        }

        // Construct QR
        let mut qr = QR::new(version, ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload);
        match self.mask {
            Some(m) => qr.apply_mask(m),
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr)
    }

    // Codeword stream: data blocks interleaved, then parity blocks. Micro
    // symbols hold a single block and the data part may end mid-byte.
    fn assemble_payload(encoded_data: &BitStream, version: Version, ec_level: ECLevel) -> BitStream {
        let (data_blocks, ecc_blocks) = Self::compute_ecc(encoded_data.data(), version, ec_level);
        let mut payload = BitStream::new(version.total_bit_capacity(ec_level));
        match version {
            Version::Micro(_) => {
                payload.append(encoded_data, encoded_data.len());
                payload.extend(&ecc_blocks[0]);
            }
            Version::Normal(_) => {
                payload.extend(&Self::interleave(&data_blocks));
                payload.extend(&Self::interleave(&ecc_blocks));
            }
        }
        payload
    }

    // ECC: Error Correction Codeword generator
    fn compute_ecc(data: &[u8], version: Version, ec_level: ECLevel) -> (Vec<&[u8]>, Vec<Vec<u8>>) {
        let data_blocks = Self::blockify(data, version, ec_level);

        let ecc_size_per_block = version.ecc_per_block(ec_level);
        let ecc_blocks = data_blocks.iter().map(|b| ecc(b, ecc_size_per_block)).collect::<Vec<_>>();

        (data_blocks, ecc_blocks)
    }

    fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let (block1_size, block1_count, block2_size, block2_count) =
            version.data_codewords_per_block(ec_level);

        let total_blocks = block1_count + block2_count;
        let total_block1_size = block1_size * block1_count;
        let total_size = total_block1_size + block2_size * block2_count;

        debug_assert!(
            total_size == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            total_size
        );

        let mut data_blocks = Vec::with_capacity(total_blocks);
        data_blocks.extend(data[..total_block1_size].chunks(block1_size));
        if block2_size > 0 {
            data_blocks.extend(data[total_block1_size..].chunks(block2_size));
        }
        data_blocks
    }

    fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::codec::encode_with_version;
    use crate::common::error::QRError;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_add_ec_simple() {
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let expected_ecc = [b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17"];
        let (_, ecc) = QRBuilder::compute_ecc(msg, Version::Normal(1), ECLevel::M);
        assert_eq!(&*ecc, expected_ecc);
    }

    #[test]
    fn test_add_ec_complex() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let expected_ec = [
            b"\xd5\xc7\x0b\x2d\x73\xf7\xf1\xdf\xe5\xf8\x9a\x75\x9a\x6f\x56\xa1\x6f\x27",
            b"\x57\xcc\x60\x3c\xca\xb6\x7c\x9d\xc8\x86\x1b\x81\xd1\x11\xa3\xa3\x78\x85",
            b"\x94\x74\xb1\xd4\x4c\x85\x4b\xf2\xee\x4c\xc3\xe6\xbd\x0a\x6c\xf0\xc0\x8d",
            b"\xeb\x9f\x05\xad\x18\x93\x3b\x21\x6a\x28\xff\xac\x52\x02\x83\x20\xb2\xec",
        ];
        let (_, ecc) = QRBuilder::compute_ecc(msg, Version::Normal(5), ECLevel::Q);
        assert_eq!(&*ecc, &expected_ec[..]);
    }

    #[test]
    fn test_interleave() {
        let blocks = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 0]];
        let interleaved = QRBuilder::interleave(&blocks);
        let exp_interleaved = vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0];
        assert_eq!(interleaved, exp_interleaved);
    }

    #[test]
    fn test_blockify_uneven_blocks() {
        // Version 5-Q: 2 blocks of 15 and 2 blocks of 16 data codewords
        let data: Vec<u8> = (0..62).collect();
        let blocks = QRBuilder::blockify(&data, Version::Normal(5), ECLevel::Q);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].len(), 15);
        assert_eq!(blocks[1].len(), 15);
        assert_eq!(blocks[2].len(), 16);
        assert_eq!(blocks[3].len(), 16);
        assert_eq!(blocks[2][0], 30);
    }

    #[test]
    fn test_micro_payload_layout() {
        let ver = Version::Micro(1);
        let (enc, ecl) = encode_with_version(b"123", ver, ECLevel::L, None, false).unwrap();
        let payload = QRBuilder::assemble_payload(&enc, ver, ecl);
        assert_eq!(payload.len(), 36);
        for i in 0..enc.len() {
            assert_eq!(payload.bit(i), enc.bit(i), "bit {i}");
        }
    }

    #[test_case("Hello, world!", Version::Normal(1), ECLevel::L)]
    #[test_case("TEST", Version::Normal(1), ECLevel::M)]
    #[test_case("12345", Version::Normal(1), ECLevel::Q)]
    #[test_case("OK", Version::Normal(1), ECLevel::H)]
    #[test_case(&"A11111111111111".repeat(11), Version::Normal(7), ECLevel::M)]
    #[test_case(&"aAAAAAA1111111111111AAAAAAa".repeat(3), Version::Normal(7), ECLevel::Q)]
    #[test_case(&"1234567890".repeat(15), Version::Normal(7), ECLevel::H)]
    #[test_case(&"A11111111111111".repeat(20), Version::Normal(10), ECLevel::M)]
    #[test_case(&"1234567890".repeat(28), Version::Normal(10), ECLevel::H)]
    #[test_case(&"A111111111111111".repeat(100), Version::Normal(27), ECLevel::M)]
    #[test_case(&"1234567890".repeat(145), Version::Normal(27), ECLevel::H)]
    #[test_case(&"A111111111111111".repeat(97), Version::Normal(40), ECLevel::M)]
    #[test_case(&"1234567890".repeat(305), Version::Normal(40), ECLevel::H)]
    fn test_builder(data: &str, version: Version, ec_level: ECLevel) {
        let qr = QRBuilder::new(data.as_bytes())
            .version(version)
            .ec_level(ec_level)
            .build()
            .unwrap();

        assert_eq!(qr.version(), version);
        assert!(qr.ec_level() >= ec_level);
        assert_eq!(qr.width(), version.width());
        assert!(qr.mask().is_some());
    }

    #[test]
    fn test_builder_forced_mask() {
        let qr = QRBuilder::new(b"FORCED MASK")
            .version(Version::Normal(2))
            .mask(MaskPattern::new(3))
            .build()
            .unwrap();
        assert_eq!(*qr.mask().unwrap(), 3);
    }

    #[test]
    fn test_builder_version_out_of_range() {
        for ver in [Version::Normal(0), Version::Normal(41), Version::Micro(0), Version::Micro(5)] {
            let res = QRBuilder::new(b"1").version(ver).build();
            assert_eq!(res.unwrap_err(), QRError::InvalidOption("version out of range"));
        }
    }

    #[test]
    fn test_builder_mask_out_of_range() {
        let res = QRBuilder::new(b"123")
            .version(Version::Micro(2))
            .mask(MaskPattern::new(5))
            .build();
        assert_eq!(res.unwrap_err(), QRError::InvalidOption("mask index out of range"));
    }

    #[test]
    fn test_builder_data_overflow() {
        let data = "1234567890".repeat(306);
        let res = QRBuilder::new(data.as_bytes())
            .version(Version::Normal(40))
            .ec_level(ECLevel::H)
            .build();
        assert!(matches!(res, Err(QRError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_builder_micro() {
        for (ver, data) in [
            (Version::Micro(1), "1234".as_bytes()),
            (Version::Micro(2), "12345678".as_bytes()),
            (Version::Micro(3), "MICRO QR".as_bytes()),
            (Version::Micro(4), b"\x93\x5f\xe4\xaa\x93\x5f" as &[u8]),
        ] {
            let qr = QRBuilder::new(data).version(ver).build().unwrap();
            assert_eq!(qr.width(), ver.width());
            assert!(*qr.mask().unwrap() < 4);
        }
    }
}
