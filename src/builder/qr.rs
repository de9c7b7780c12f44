use std::ops::Deref;

use crate::common::bit_utils::BitStream;
use crate::common::iter::EncRegionIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{
    format_info, Color, ECLevel, Metadata, Version, FORMAT_INFO_BIT_LEN,
    FORMAT_INFO_COORDS_MICRO, FORMAT_INFO_COORDS_QR_MAIN, FORMAT_INFO_COORDS_QR_SIDE,
    VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

/// One output row of the symbol. The height field is a scale factor for
/// row-height-scaled symbologies; QR rows are always square.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub modules: Vec<u8>,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub fn new(ver: Version, ecl: ECLevel) -> Self {
        debug_assert!(
            matches!(ver, Version::Micro(1..=4) | Version::Normal(1..=40)),
            "Invalid version"
        );

        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mask: None }
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(Some(self.ver), Some(self.ecl), self.mask)
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "row should be greater than or equal to w");
        debug_assert!(-w <= c && c < w, "column should be greater than or equal to w");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}

#[cfg(test)]
mod qr_util_tests {
    use crate::builder::{Module, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    #[test]
    fn test_index_wrap() {
        let mut qr = QR::new(Version::Normal(1), ECLevel::L);
        let w = qr.w as i16;
        qr.set(-1, -1, Module::Func(Color::Dark));
        assert_eq!(qr.get(w - 1, w - 1), Module::Func(Color::Dark));
        qr.set(0, 0, Module::Func(Color::Dark));
        assert_eq!(qr.get(-w, -w), Module::Func(Color::Dark));
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_bound() {
        let qr = QR::new(Version::Normal(1), ECLevel::L);
        let w = qr.w as i16;
        qr.get(w, 0);
    }

    #[test]
    #[should_panic]
    fn test_col_index_overwrap() {
        let qr = QR::new(Version::Normal(1), ECLevel::L);
        let w = qr.w as i16;
        qr.get(0, -(w + 1));
    }
}

// Finder pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        match self.ver {
            Version::Micro(_) => {}
            Version::Normal(_) => {
                self.draw_finder_pattern_at(3, -4);
                self.draw_finder_pattern_at(-4, 3);
            }
        }
    }

    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_left, dr_right) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_top, dc_bottom) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_left..=dr_right {
            for j in dc_top..=dc_bottom {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Module::Func(Color::Light),
                        (3 | -3, _) | (_, 3 | -3) => Module::Func(Color::Dark),
                        (2 | -2, _) | (_, 2 | -2) => Module::Func(Color::Light),
                        _ => Module::Func(Color::Dark),
                    },
                );
            }
        }
    }
}


// Timing pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_timing_pattern(&mut self) {
        let w = self.w as i16;
        let (off, last) = match self.ver {
            Version::Micro(_) => (0, w - 1),
            Version::Normal(_) => (6, w - 9),
        };
        self.draw_line(off, 8, off, last);
        self.draw_line(8, off, last, off);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                let m =
                    if j & 1 == 0 { Module::Func(Color::Dark) } else { Module::Func(Color::Light) };
                self.set(r1, j, m);
            }
        } else {
            for i in r1..=r2 {
                let m =
                    if i & 1 == 0 { Module::Func(Color::Dark) } else { Module::Func(Color::Light) };
                self.set(i, c1, m);
            }
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Module::Func(Color::Dark),
                        _ => Module::Func(Color::Light),
                    },
                )
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_pattern();
        self.draw_alignment_patterns();
    }
}

#[cfg(test)]
mod all_function_patterns_test {
    use crate::builder::QR;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_all_function_patterns() {
        let mut qr = QR::new(Version::Normal(3), ECLevel::L);
        qr.draw_all_function_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.............Ffffffff\n\
             fFFFFFfF.............FfFFFFFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFFFFFfF.............FfFFFFFf\n\
             fffffffFfFfFfFfFfFfFfFfffffff\n\
             FFFFFFFF.............FFFFFFFF\n\
             ......f......................\n\
             ......F......................\n\
             ......f......................\n\
             ......F......................\n\
             ......f......................\n\
             ......F......................\n\
             ......f......................\n\
             ......F......................\n\
             ......f......................\n\
             ......F......................\n\
             ......f......................\n\
             ......F......................\n\
             ......f.............fffff....\n\
             FFFFFFFF............fFFFf....\n\
             fffffffF............fFfFf....\n\
             fFFFFFfF............fFFFf....\n\
             fFfffFfF............fffff....\n\
             fFfffFfF.....................\n\
             fFfffFfF.....................\n\
             fFFFFFfF.....................\n\
             fffffffF.....................\n"
        );
    }

    #[test]
    fn test_all_function_patterns_micro() {
        let mut qr = QR::new(Version::Micro(2), ECLevel::L);
        qr.draw_all_function_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffFfFfFf\n\
             fFFFFFfF.....\n\
             fFfffFfF.....\n\
             fFfffFfF.....\n\
             fFfffFfF.....\n\
             fFFFFFfF.....\n\
             fffffffF.....\n\
             FFFFFFFF.....\n\
             f............\n\
             F............\n\
             f............\n\
             F............\n\
             f............\n"
        );
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, format_info: u32) {
        match self.ver {
            Version::Micro(_) => {
                self.draw_number(
                    format_info,
                    FORMAT_INFO_BIT_LEN,
                    Module::Format(Color::Light),
                    Module::Format(Color::Dark),
                    &FORMAT_INFO_COORDS_MICRO,
                );
            }
            Version::Normal(_) => {
                self.draw_number(
                    format_info,
                    FORMAT_INFO_BIT_LEN,
                    Module::Format(Color::Light),
                    Module::Format(Color::Dark),
                    &FORMAT_INFO_COORDS_QR_MAIN,
                );
                self.draw_number(
                    format_info,
                    FORMAT_INFO_BIT_LEN,
                    Module::Format(Color::Light),
                    Module::Format(Color::Dark),
                    &FORMAT_INFO_COORDS_QR_SIDE,
                );
                self.set(-8, 8, Module::Format(Color::Dark));
            }
        }
    }

    fn draw_version_info(&mut self) {
        match self.ver {
            Version::Micro(_) | Version::Normal(1..=6) => {}
            Version::Normal(7..=40) => {
                let ver_info = self.ver.info();
                self.draw_number(
                    ver_info,
                    VERSION_INFO_BIT_LEN,
                    Module::Version(Color::Light),
                    Module::Version(Color::Dark),
                    &VERSION_INFO_COORDS_BL,
                );
                self.draw_number(
                    ver_info,
                    VERSION_INFO_BIT_LEN,
                    Module::Version(Color::Light),
                    Module::Version(Color::Dark),
                    &VERSION_INFO_COORDS_TR,
                );
            }
            _ => unreachable!(),
        }
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_clr: Module,
        on_clr: Module,
        coords: &[(i16, i16)],
    ) {
        let mut mask = 1 << (bit_len - 1);
        for (r, c) in coords {
            if number & mask == 0 {
                self.set(*r, *c, off_clr);
            } else {
                self.set(*r, *c, on_clr);
            }
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub fn draw_encoding_region(&mut self, payload: BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found in debug");
    }

    fn draw_payload(&mut self, payload: BitStream) {
        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload {
            let module = Module::Data(if bit { Color::Dark } else { Color::Light });
            for (r, c) in coords.by_ref() {
                if matches!(self.get(r, c), Module::Empty) {
                    self.set(r, c, module);
                    break;
                }
            }
        }
        self.fill_remainder_bits(&mut coords);
    }

    // Cells left after the payload are the remainder bits, always light
    fn fill_remainder_bits(&mut self, coords: impl Iterator<Item = (i16, i16)>) {
        let mut filled = 0;
        for (r, c) in coords {
            if matches!(self.get(r, c), Module::Empty) {
                self.set(r, c, Module::Data(Color::Light));
                filled += 1;
            }
        }
        debug_assert_eq!(filled, self.ver.remainder_bits(), "Unexpected remainder bit count");
    }

    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_function(self.ver);
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_fn(r, c) {
                    if let Module::Data(clr) = self.get(r, c) {
                        self.set(r, c, Module::Data(!clr))
                    }
                }
            }
        }
        let format_info = format_info(self.ver, self.ecl, pattern);
        self.draw_format_info(format_info);
    }
}

// Render
//------------------------------------------------------------------------------

impl QR {
    /// Rows of 0/1 module values, dark as 1, for downstream renderers.
    pub fn to_rows(&self) -> Vec<Row> {
        let w = self.w as i16;
        (0..w)
            .map(|r| Row {
                modules: (0..w).map(|c| (*self.get(r, c) == Color::Dark) as u8).collect(),
                height: 1.0,
            })
            .collect()
    }

    /// Textual rendition with the quiet zone, for terminals and diagnostics.
    pub fn to_str(&self, module_sz: usize) -> String {
        let qz_sz = if let Version::Normal(_) = self.ver { 4 } else { 2 } * module_sz;
        let qr_sz = self.w * module_sz;
        let total_sz = qz_sz + qr_sz + qz_sz;

        let mut canvas = String::new();
        for i in 0..total_sz {
            for j in 0..total_sz {
                if i < qz_sz || i >= qz_sz + qr_sz || j < qz_sz || j >= qz_sz + qr_sz {
                    canvas.push('█');
                    continue;
                }
                let r = ((i - qz_sz) / module_sz) as i16;
                let c = ((j - qz_sz) / module_sz) as i16;
                let clr = *self.get(r, c);
                canvas.push(clr.select(' ', '█'));
            }
            canvas.push('\n');
        }

        canvas
    }
}
