use std::cmp::Reverse;
use std::ops::Deref;

use super::metadata::{Color, Version};
use crate::builder::QR;

// Mask pattern
//------------------------------------------------------------------------------

/// Mask reference as carried in the format information: 3 bits for QR,
/// 2 bits for Micro QR.
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Micro QR mask references select from the QR mask set.
static MICRO_MASK_MAP: [u8; 4] = [1, 4, 6, 7];

mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        ((r * c) & 1) + ((r * c) % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self, version: Version) -> fn(i16, i16) -> bool {
        let pattern = match version {
            Version::Micro(_) => MICRO_MASK_MAP[self.0 as usize],
            Version::Normal(_) => self.0,
        };
        match pattern {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid pattern"),
        }
    }
}

// Mask selection
//------------------------------------------------------------------------------

/// Tries every candidate mask on a copy of the grid and commits the winner:
/// lowest penalty for QR, highest edge score for Micro QR, first seen on
/// ties.
pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = match qr.version() {
        Version::Micro(_) => (0..4)
            .min_by_key(|m| {
                let mut qr = qr.clone();
                qr.apply_mask(MaskPattern(*m));
                Reverse(compute_micro_score(&qr))
            })
            .expect("Should return at least 1 mask"),
        Version::Normal(_) => (0..8)
            .min_by_key(|m| {
                let mut qr = qr.clone();
                qr.apply_mask(MaskPattern(*m));
                compute_total_penalty(&qr)
            })
            .expect("Should return at least 1 mask"),
    };
    let best_mask = MaskPattern(best_mask);
    qr.apply_mask(best_mask);
    best_mask
}

/// Sum of the four ISO/IEC 18004 penalty rules for full-size QR symbols.
pub fn compute_total_penalty(qr: &QR) -> u32 {
    let adj_pen = compute_adjacent_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen_h = compute_finder_pattern_penalty(qr, true);
    let fp_pen_v = compute_finder_pattern_penalty(qr, false);
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen_h + fp_pen_v + bal_pen
}

/// Micro QR evaluation score over the dark counts of the right and bottom
/// edges (timing cells at index 0 excluded). Higher is better.
pub fn compute_micro_score(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let sum1 = (1..w).filter(|&r| *qr.get(r, w - 1) == Color::Dark).count() as u32;
    let sum2 = (1..w).filter(|&c| *qr.get(w - 1, c) == Color::Dark).count() as u32;
    if sum1 <= sum2 {
        sum1 * 16 + sum2
    } else {
        sum2 * 16 + sum1
    }
}

// Rule 1: each run of 5 or more same-colored modules costs 3 + (len - 5).
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let mut pen = 0;
    for i in 0..w {
        pen += line_run_penalty((0..w).map(|c| *qr.get(i, c)));
        pen += line_run_penalty((0..w).map(|r| *qr.get(r, i)));
    }
    pen
}

fn line_run_penalty(line: impl Iterator<Item = Color>) -> u32 {
    let mut pen = 0;
    let mut last = None;
    let mut run = 0usize;
    for clr in line {
        if last == Some(clr) {
            run += 1;
        } else {
            if run >= 5 {
                pen += (run - 2) as u32;
            }
            last = Some(clr);
            run = 1;
        }
    }
    if run >= 5 {
        pen += (run - 2) as u32;
    }
    pen
}

// Rule 2: every 2x2 block of one color costs 3; overlaps count.
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// Rule 3: a 1011101 pattern with 4 light modules on either side costs 40.
// Cells beyond the grid count as light, since the quiet zone is light.
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    static PATTERN: [Color; 7] = [
        Color::Dark,
        Color::Light,
        Color::Dark,
        Color::Dark,
        Color::Dark,
        Color::Light,
        Color::Dark,
    ];
    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let get = |x: i16| if is_hor { *qr.get(i, x) } else { *qr.get(x, i) };
        for j in 0..=w - 7 {
            if (0..7).any(|k| get(j + k) != PATTERN[k as usize]) {
                continue;
            }
            let is_light = |x: i16| x < 0 || x >= w || get(x) == Color::Light;
            if (j - 4..j).all(is_light) || (j + 7..j + 11).all(is_light) {
                pen += 40;
            }
        }
    }
    pen
}

// Rule 4: every 5% the dark proportion deviates from 50% costs 10.
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark_cnt = qr.count_dark_modules();
    let w = qr.width();
    let pct = dark_cnt * 100 / (w * w);
    (pct.abs_diff(50) / 5 * 10) as u32
}

#[cfg(test)]
mod mask_tests {
    use test_case::test_case;

    use super::*;
    use crate::common::metadata::Color::{Dark, Light};

    #[test_case(0, &[(0, 0), (1, 1), (4, 2)], &[(0, 1), (1, 0)])]
    #[test_case(1, &[(0, 0), (0, 5), (2, 3)], &[(1, 0), (3, 7)])]
    #[test_case(2, &[(0, 0), (5, 3), (1, 6)], &[(0, 1), (4, 2)])]
    #[test_case(3, &[(0, 0), (1, 2), (2, 1)], &[(0, 1), (2, 2)])]
    fn test_mask_functions(pattern: u8, dark: &[(i16, i16)], light: &[(i16, i16)]) {
        let f = MaskPattern::new(pattern).mask_function(Version::Normal(1));
        for &(r, c) in dark {
            assert!(f(r, c), "({r}, {c}) should be flipped");
        }
        for &(r, c) in light {
            assert!(!f(r, c), "({r}, {c}) shouldn't be flipped");
        }
    }

    #[test]
    fn test_micro_masks_map_to_qr_set() {
        for m in 0..4u8 {
            let micro = MaskPattern::new(m).mask_function(Version::Micro(2));
            let qr = MaskPattern::new(MICRO_MASK_MAP[m as usize]).mask_function(Version::Normal(1));
            assert_eq!(micro as usize, qr as usize);
        }
    }

    #[test]
    fn test_line_run_penalty() {
        assert_eq!(line_run_penalty([Dark; 4].into_iter()), 0);
        assert_eq!(line_run_penalty([Dark; 5].into_iter()), 3);
        assert_eq!(line_run_penalty([Dark; 7].into_iter()), 5);
        let line = [Dark, Dark, Dark, Dark, Dark, Light, Light, Light, Light, Light, Light];
        assert_eq!(line_run_penalty(line.into_iter()), 3 + 4);
        let line = [Dark, Light, Dark, Light, Dark, Light];
        assert_eq!(line_run_penalty(line.into_iter()), 0);
    }
}
