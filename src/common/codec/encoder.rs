pub use encode::*;

// Encoder
//------------------------------------------------------------------------------

pub mod encode {
    use std::mem::swap;

    use super::writer;
    use crate::common::bit_utils::BitStream;
    use crate::common::codec::{is_kanji_pair, Mode, Segment, MODES};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version, EC_LEVELS};

    /// Encodes data into a bit stream, choosing the smallest full-size
    /// version that fits and boosting the error correction level as far as
    /// the chosen version allows.
    pub fn encode(
        data: &[u8],
        ecl: ECLevel,
        eci: Option<u32>,
        gs1: bool,
    ) -> QRResult<(BitStream, Version, ECLevel)> {
        validate(data, None, eci, gs1)?;

        let header_len = header_bit_len(eci, gs1);
        let (ver, segs) = find_optimal_version_and_segments(data, ecl, header_len)?;
        let required = required_bit_len(&segs, ver, header_len);
        let ecl = boost_ec_level(ver, ecl, required);
        let bs = serialize(&segs, ver, ecl, eci, gs1);
        Ok((bs, ver, ecl))
    }

    /// Encodes data for a caller-selected version, full-size or Micro. The
    /// error correction level is still boosted within the version's limits.
    pub fn encode_with_version(
        data: &[u8],
        ver: Version,
        ecl: ECLevel,
        eci: Option<u32>,
        gs1: bool,
    ) -> QRResult<(BitStream, ECLevel)> {
        validate(data, Some(ver), eci, gs1)?;
        if !ver.supports(ecl) {
            return Err(QRError::InvalidOption("EC level not supported by this version"));
        }

        let segs = match ver {
            Version::Micro(_) => vec![micro_segment(data, ver)?],
            Version::Normal(_) => compute_optimal_segments(data, ver),
        };
        let header_len = header_bit_len(eci, gs1);
        let required = required_bit_len(&segs, ver, header_len);
        let bcap = ver.data_bit_capacity(ecl);
        if required > bcap {
            return Err(QRError::CapacityExceeded { required, capacity: bcap });
        }
        let ecl = boost_ec_level(ver, ecl, required);
        Ok((serialize(&segs, ver, ecl, eci, gs1), ecl))
    }

    fn validate(data: &[u8], ver: Option<Version>, eci: Option<u32>, gs1: bool) -> QRResult<()> {
        if data.is_empty() {
            return Err(QRError::InvalidOption("data is empty"));
        }
        if let Some(designator) = eci {
            if designator >= 1_000_000 {
                return Err(QRError::InvalidOption("ECI designator out of range"));
            }
        }
        if let Some(Version::Micro(_)) = ver {
            if eci.is_some() || gs1 {
                return Err(QRError::InvalidOption("ECI and GS1 are not available in Micro QR"));
            }
        }
        Ok(())
    }

    /// Bit length of the ECI header and GS1 indicator, which precede the
    /// data segments in full-size symbols.
    pub fn header_bit_len(eci: Option<u32>, gs1: bool) -> usize {
        let eci_len = match eci {
            None => 0,
            Some(d) if d < 128 => 12,
            Some(d) if d < 16384 => 20,
            Some(_) => 28,
        };
        eci_len + if gs1 { 4 } else { 0 }
    }

    // Bit length of headers, segments and the full terminator. The
    // terminator is counted whole, so capacity checks never rely on the
    // truncated-terminator allowance.
    fn required_bit_len(segs: &[Segment], ver: Version, header_len: usize) -> usize {
        header_len + segs.iter().map(|s| s.bit_len(ver)).sum::<usize>() + ver.terminator_bits()
    }

    fn find_optimal_version_and_segments(
        data: &[u8],
        ecl: ECLevel,
        header_len: usize,
    ) -> QRResult<(Version, Vec<Segment>)> {
        let mut segs = vec![];
        let mut required = 0;
        for v in 1..=40 {
            let ver = Version::Normal(v);
            let bcap = ver.data_bit_capacity(ecl);
            // Count indicator widths change at these versions
            if v == 1 || v == 10 || v == 27 {
                segs = compute_optimal_segments(data, ver);
                required = required_bit_len(&segs, ver, header_len);
            }
            if required <= bcap {
                return Ok((ver, segs));
            }
        }
        Err(QRError::CapacityExceeded {
            required,
            capacity: Version::Normal(40).data_bit_capacity(ecl),
        })
    }

    // Highest level whose capacity still holds the data, never below the
    // requested minimum.
    fn boost_ec_level(ver: Version, ecl: ECLevel, required: usize) -> ECLevel {
        EC_LEVELS
            .iter()
            .rev()
            .find(|&&cand| {
                cand >= ecl && ver.supports(cand) && required <= ver.data_bit_capacity(cand)
            })
            .copied()
            .unwrap_or(ecl)
    }

    fn serialize(
        segs: &[Segment],
        ver: Version,
        ecl: ECLevel,
        eci: Option<u32>,
        gs1: bool,
    ) -> BitStream {
        let bcap = ver.data_bit_capacity(ecl);
        let mut bs = BitStream::new(bcap);
        if let Some(designator) = eci {
            writer::push_eci_header(designator, &mut bs);
        }
        if gs1 {
            writer::push_gs1_indicator(ver, &mut bs);
        }
        for seg in segs {
            writer::push_segment(*seg, ver, &mut bs);
        }
        writer::push_terminator(ver, &mut bs);
        writer::pad_remaining_capacity(&mut bs);
        bs
    }

    // Mode segmentation
    //--------------------------------------------------------------------------

    // Input unit for segmentation: one byte, or one Shift JIS double-byte
    // pair eligible for kanji mode. (start, byte length)
    type Token = (usize, usize);

    fn tokenize(data: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if i + 1 < data.len() && is_kanji_pair(data[i], data[i + 1]) {
                tokens.push((i, 2));
                i += 2;
            } else {
                tokens.push((i, 1));
                i += 1;
            }
        }
        tokens
    }

    // Encoded cost of one token in a mode, in units of 1/6 bit, or None if
    // the mode cannot hold it.
    fn token_cost(data: &[u8], token: Token, mode: Mode) -> Option<usize> {
        let (start, len) = token;
        match (mode, len) {
            (Mode::Numeric, 1) if mode.contains(data[start]) => Some(20),
            (Mode::Alphanumeric, 1) if mode.contains(data[start]) => Some(33),
            (Mode::Byte, 1) => Some(48),
            (Mode::Byte, 2) => Some(96),
            (Mode::Kanji, 2) => Some(78),
            _ => None,
        }
    }

    // Dynamic programming over tokens to compute optimal mode segments
    fn compute_optimal_segments(data: &[u8], ver: Version) -> Vec<Segment> {
        debug_assert!(!data.is_empty(), "Empty data");

        let tokens = tokenize(data);
        let len = tokens.len();
        let mut prev_cost = [0usize; 4];
        MODES
            .iter()
            .enumerate()
            .for_each(|(i, &m)| prev_cost[i] = (ver.mode_bits() + ver.char_cnt_bits(m)) * 6);
        let mut cur_cost = [usize::MAX; 4];
        let mut min_path = vec![[usize::MAX; 4]; len];
        for (i, token) in tokens.iter().enumerate() {
            for (j, to_mode) in MODES.iter().enumerate() {
                let encoded_char_size = match token_cost(data, *token, *to_mode) {
                    Some(cost) => cost,
                    None => continue,
                };
                for (k, from_mode) in MODES.iter().enumerate() {
                    if prev_cost[k] == usize::MAX {
                        continue;
                    }
                    let mut cost = 0;
                    if to_mode != from_mode {
                        cost += (prev_cost[k] + 5) / 6 * 6;
                        cost += (ver.mode_bits() + ver.char_cnt_bits(*to_mode)) * 6;
                    } else {
                        cost += prev_cost[k];
                    }
                    cost += encoded_char_size;
                    if cost < cur_cost[j] {
                        cur_cost[j] = cost;
                        min_path[i][j] = k;
                    }
                }
            }
            swap(&mut prev_cost, &mut cur_cost);
            cur_cost.fill(usize::MAX);
        }

        let char_modes = trace_optimal_modes(min_path, prev_cost);
        build_segments(data, &tokens, char_modes)
    }

    // Backtrack min_path and identify the optimal mode per token
    fn trace_optimal_modes(min_path: Vec<[usize; 4]>, prev_cost: [usize; 4]) -> Vec<Mode> {
        let len = min_path.len();
        let mut mode_index = 0;
        for i in 1..4 {
            if prev_cost[i] < prev_cost[mode_index] {
                mode_index = i;
            }
        }
        (0..len)
            .rev()
            .scan(mode_index, |mi, i| {
                let old_mi = *mi;
                *mi = min_path[i][*mi];
                Some(MODES[old_mi])
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    // Merge per-token modes into contiguous segments
    fn build_segments<'a>(
        data: &'a [u8],
        tokens: &[Token],
        char_modes: Vec<Mode>,
    ) -> Vec<Segment<'a>> {
        let mut segs: Vec<Segment> = vec![];
        let mut seg_start = 0;
        let mut seg_mode = char_modes[0];
        for (i, &m) in char_modes.iter().enumerate().skip(1) {
            if seg_mode != m {
                segs.push(Segment::new(seg_mode, &data[seg_start..tokens[i].0]));
                seg_mode = m;
                seg_start = tokens[i].0;
            }
        }
        segs.push(Segment::new(seg_mode, &data[seg_start..]));

        segs
    }

    // Micro QR holds a single segment in the narrowest mode covering the
    // whole input, subject to the version's mode restrictions.
    fn micro_segment(data: &[u8], ver: Version) -> QRResult<Segment> {
        debug_assert!(matches!(ver, Version::Micro(_)), "Not a micro version");

        if data.iter().all(|b| Mode::Numeric.contains(*b)) {
            return Ok(Segment::new(Mode::Numeric, data));
        }
        if ver.supports_mode(Mode::Alphanumeric)
            && data.iter().all(|b| Mode::Alphanumeric.contains(*b))
        {
            return Ok(Segment::new(Mode::Alphanumeric, data));
        }
        if ver.supports_mode(Mode::Kanji)
            && data.len() & 1 == 0
            && data.chunks(2).all(|p| is_kanji_pair(p[0], p[1]))
        {
            return Ok(Segment::new(Mode::Kanji, data));
        }
        if ver.supports_mode(Mode::Byte) {
            return Ok(Segment::new(Mode::Byte, data));
        }

        let widest = if ver.supports_mode(Mode::Alphanumeric) {
            Mode::Alphanumeric
        } else {
            Mode::Numeric
        };
        let (position, &byte) = data
            .iter()
            .enumerate()
            .find(|(_, b)| !widest.contains(**b))
            .expect("Some byte must be outside the widest mode");
        Err(QRError::InvalidCharacter { position, byte })
    }

    #[cfg(test)]
    mod encode_tests {
        use test_case::test_case;

        use super::{
            boost_ec_level, compute_optimal_segments, encode, encode_with_version,
            find_optimal_version_and_segments, micro_segment, ECLevel, Mode, QRError, Segment,
            Version,
        };

        #[test_case("1111111", Version::Normal(1), vec![(Mode::Numeric, 0, None)])]
        #[test_case("AAAAA", Version::Normal(1), vec![(Mode::Alphanumeric, 0, None)])]
        #[test_case("aaaaa", Version::Normal(1), vec![(Mode::Byte, 0, None)])]
        #[test_case("1111111AAAA", Version::Normal(1), vec![(Mode::Numeric, 0, Some(7)), (Mode::Alphanumeric, 7, None)])]
        #[test_case("111111AAAA", Version::Normal(1), vec![(Mode::Alphanumeric, 0, None)])]
        #[test_case("aaa11111a", Version::Normal(1), vec![(Mode::Byte, 0, None)])]
        #[test_case("aaa111111a", Version::Normal(1), vec![(Mode::Byte, 0, Some(3)), (Mode::Numeric, 3, Some(9)), (Mode::Byte, 9, None)])]
        #[test_case("aaa1111A", Version::Normal(1), vec![(Mode::Byte, 0, None)])]
        #[test_case("aaa1111AA", Version::Normal(1), vec![(Mode::Byte, 0, Some(3)), (Mode::Alphanumeric, 3, None)])]
        #[test_case("aaa1111111AA", Version::Normal(1), vec![(Mode::Byte, 0, Some(3)), (Mode::Numeric, 3, Some(10)), (Mode::Alphanumeric, 10, None)])]
        fn test_compute_optimal_segments(
            data: &str,
            ver: Version,
            chunks: Vec<(Mode, usize, Option<usize>)>,
        ) {
            let segs = compute_optimal_segments(data.as_bytes(), ver);
            assert_eq!(segs.len(), chunks.len());
            for (seg, &(mode, start, end)) in segs.iter().zip(chunks.iter()) {
                let exp_seg = match end {
                    Some(e) => Segment::new(mode, data[start..e].as_bytes()),
                    None => Segment::new(mode, data[start..].as_bytes()),
                };
                assert_eq!(*seg, exp_seg);
            }
        }

        #[test]
        fn test_compute_optimal_segments_repeated() {
            let data = "A11111111111111".repeat(23);
            let ver = Version::Normal(9);
            let segs = compute_optimal_segments(data.as_bytes(), ver);
            assert_eq!(segs.len(), 46);
            for (i, c) in data.as_bytes().chunks(15).enumerate() {
                assert_eq!(segs[i * 2], Segment::new(Mode::Alphanumeric, &c[..1]));
                assert_eq!(segs[i * 2 + 1], Segment::new(Mode::Numeric, &c[1..]));
            }
        }

        #[test]
        fn test_compute_optimal_segments_kanji() {
            let mut data = b"point".to_vec();
            data.extend(b"\x93\x5f".repeat(5));
            data.extend(b"12345678901");
            let segs = compute_optimal_segments(&data, Version::Normal(1));
            assert_eq!(segs.len(), 3);
            assert_eq!(segs[0], Segment::new(Mode::Byte, &data[..5]));
            assert_eq!(segs[1], Segment::new(Mode::Kanji, &data[5..15]));
            assert_eq!(segs[2], Segment::new(Mode::Numeric, &data[15..]));
        }

        #[test]
        fn test_segments_partition_input() {
            let data = b"HELLO world 1234567890 \x93\x5f\xe4\xaa end";
            let segs = compute_optimal_segments(data, Version::Normal(2));
            let mut pos = 0;
            for seg in &segs {
                assert_eq!(seg.data, &data[pos..pos + seg.data.len()]);
                pos += seg.data.len();
            }
            assert_eq!(pos, data.len());
        }

        #[test_case("aaaaa11111AAA", Version::Normal(1))]
        #[test_case(&"A11111111111111".repeat(2), Version::Normal(2))]
        #[test_case(&"A11111111111111".repeat(4), Version::Normal(3))]
        #[test_case(&"aAAAAAAAAAAA".repeat(5), Version::Normal(4))]
        #[test_case(&"aAAAAAAAAAAA".repeat(21), Version::Normal(10))]
        #[test_case(&"a".repeat(2953), Version::Normal(40))]
        fn test_find_optimal_version(data: &str, exp_ver: Version) {
            let (ver, _) =
                find_optimal_version_and_segments(data.as_bytes(), ECLevel::L, 0).unwrap();
            assert_eq!(ver, exp_ver);
        }

        #[test]
        fn test_numeric_capacity_boundary() {
            // 40 digits fill version 1-L exactly once the terminator is
            // counted; the 41st overflows to version 2.
            let data = "1".repeat(40);
            let (ver, _) = find_optimal_version_and_segments(data.as_bytes(), ECLevel::L, 0).unwrap();
            assert_eq!(ver, Version::Normal(1));

            let data = "1".repeat(41);
            let (ver, _) = find_optimal_version_and_segments(data.as_bytes(), ECLevel::L, 0).unwrap();
            assert_eq!(ver, Version::Normal(2));
        }

        #[test]
        fn test_data_overflow() {
            let data = "a".repeat(2954);
            let res = find_optimal_version_and_segments(data.as_bytes(), ECLevel::L, 0);
            assert!(matches!(res, Err(QRError::CapacityExceeded { .. })));
        }

        #[test]
        fn test_boost_ec_level() {
            let ver = Version::Normal(1);
            assert_eq!(boost_ec_level(ver, ECLevel::L, 32), ECLevel::H);
            assert_eq!(boost_ec_level(ver, ECLevel::L, 100), ECLevel::Q);
            assert_eq!(boost_ec_level(ver, ECLevel::L, 110), ECLevel::M);
            assert_eq!(boost_ec_level(ver, ECLevel::L, 150), ECLevel::L);
            // Never below the requested minimum
            assert_eq!(boost_ec_level(ver, ECLevel::Q, 150), ECLevel::Q);
            // Micro versions skip unsupported levels
            assert_eq!(boost_ec_level(Version::Micro(2), ECLevel::L, 30), ECLevel::M);
            assert_eq!(boost_ec_level(Version::Micro(4), ECLevel::L, 60), ECLevel::Q);
        }

        #[test]
        fn test_encode_boosts_ec_level() {
            let (_, ver, ecl) = encode(b"1234", ECLevel::L, None, false).unwrap();
            assert_eq!(ver, Version::Normal(1));
            assert_eq!(ecl, ECLevel::H);

            let data = "1".repeat(40);
            let (_, ver, ecl) = encode(data.as_bytes(), ECLevel::L, None, false).unwrap();
            assert_eq!(ver, Version::Normal(1));
            assert_eq!(ecl, ECLevel::L);
        }

        #[test]
        fn test_encode_empty_data() {
            assert_eq!(
                encode(b"", ECLevel::L, None, false),
                Err(QRError::InvalidOption("data is empty"))
            );
        }

        #[test]
        fn test_encode_with_version_overflow() {
            let data = "a".repeat(20);
            let res = encode_with_version(data.as_bytes(), Version::Normal(1), ECLevel::L, None, false);
            assert!(matches!(res, Err(QRError::CapacityExceeded { .. })));
        }

        #[test]
        fn test_micro_segment_modes() {
            let m2 = Version::Micro(2);
            assert_eq!(
                micro_segment(b"12345", m2).unwrap(),
                Segment::new(Mode::Numeric, b"12345")
            );
            assert_eq!(
                micro_segment(b"AB12", m2).unwrap(),
                Segment::new(Mode::Alphanumeric, b"AB12")
            );
            assert_eq!(
                micro_segment(b"\x93\x5f\xe4\xaa", Version::Micro(3)).unwrap(),
                Segment::new(Mode::Kanji, b"\x93\x5f\xe4\xaa")
            );
            assert_eq!(
                micro_segment(b"ab", Version::Micro(3)).unwrap(),
                Segment::new(Mode::Byte, b"ab")
            );
        }

        #[test]
        fn test_micro_segment_restrictions() {
            assert_eq!(
                micro_segment(b"12A", Version::Micro(1)),
                Err(QRError::InvalidCharacter { position: 2, byte: b'A' })
            );
            assert_eq!(
                micro_segment(b"abc", Version::Micro(2)),
                Err(QRError::InvalidCharacter { position: 0, byte: b'a' })
            );
        }

        #[test]
        fn test_micro_rejects_eci_and_gs1() {
            let res = encode_with_version(b"123", Version::Micro(2), ECLevel::L, Some(26), false);
            assert!(matches!(res, Err(QRError::InvalidOption(_))));
            let res = encode_with_version(b"123", Version::Micro(2), ECLevel::L, None, true);
            assert!(matches!(res, Err(QRError::InvalidOption(_))));
        }

        #[test]
        fn test_encode_micro_m2_numeric() {
            let (bs, ecl) =
                encode_with_version(b"12345", Version::Micro(2), ECLevel::L, None, false).unwrap();
            assert_eq!(ecl, ECLevel::M);
            assert_eq!(bs.len(), 32);
        }

        #[test]
        fn test_encode_m1() {
            let (bs, ecl) =
                encode_with_version(b"123", Version::Micro(1), ECLevel::L, None, false).unwrap();
            assert_eq!(ecl, ECLevel::L);
            assert_eq!(bs.len(), 20);
            assert_eq!(bs.data(), &[0b0110_0011, 0b1101_1000, 0b0000_0000]);
        }
    }
}

// Writer for encoded data
//------------------------------------------------------------------------------

pub(super) mod writer {
    use crate::common::bit_utils::BitStream;
    use crate::common::codec::{Mode, Segment, ECI_INDICATOR, GS1_INDICATOR, PADDING_CODEWORDS};
    use crate::common::metadata::Version;

    pub fn push_segment(seg: Segment, ver: Version, out: &mut BitStream) {
        push_header(&seg, ver, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
            Mode::Kanji => push_kanji_data(seg.data, out),
        }
    }

    fn push_header(seg: &Segment, ver: Version, out: &mut BitStream) {
        out.push_bits(ver.mode_indicator(seg.mode), ver.mode_bits());
        let char_cnt = seg.char_count();
        let len_bits = ver.char_cnt_bits(seg.mode);
        debug_assert!(
            char_cnt < (1 << len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {len_bits}"
        );
        out.push_bits(char_cnt as u16, len_bits);
    }

    pub fn push_eci_header(designator: u32, out: &mut BitStream) {
        out.push_bits(ECI_INDICATOR, 4);
        match designator {
            0..=127 => out.push_bits(designator as u8, 8),
            128..=16383 => out.push_bits(0b10u16 << 14 | designator as u16, 16),
            _ => out.push_bits(0b110u32 << 21 | designator, 24),
        }
    }

    pub fn push_gs1_indicator(ver: Version, out: &mut BitStream) {
        debug_assert!(matches!(ver, Version::Normal(_)), "GS1 is QR only");
        out.push_bits(GS1_INDICATOR, ver.mode_bits());
    }

    fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let (val, len) = Mode::Numeric.encode_chunk(chunk);
            out.push_bits(val, len);
        }
    }

    fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let (val, len) = Mode::Alphanumeric.encode_chunk(chunk);
            out.push_bits(val, len);
        }
    }

    fn push_byte_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(1) {
            let (val, len) = Mode::Byte.encode_chunk(chunk);
            out.push_bits(val, len);
        }
    }

    fn push_kanji_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let (val, len) = Mode::Kanji.encode_chunk(chunk);
            out.push_bits(val, len);
        }
    }

    pub fn push_terminator(ver: Version, out: &mut BitStream) {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = std::cmp::min(ver.terminator_bits(), bit_capacity - bit_len);
            out.push_bits(0u16, term_len);
        }
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        push_padding_bits(out);
        push_padding_codewords(out);
    }

    fn push_padding_bits(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            let padding_bits_len = std::cmp::min(8 - offset, out.capacity() - out.len());
            out.push_bits(0u8, padding_bits_len);
        }
    }

    fn push_padding_codewords(out: &mut BitStream) {
        debug_assert!(
            out.len() & 7 == 0 || out.capacity() == out.len(),
            "Bit offset should be zero before padding codewords: {}",
            out.len() & 7
        );

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });

        // M1 and M3 end in a 4-bit codeword, zero when unused
        let tail = out.capacity() - out.len();
        if tail > 0 {
            out.push_bits(0u8, tail);
        }
    }

}
