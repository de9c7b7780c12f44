use super::metadata::Version;

// Iterator over the encoding region of the grid
//------------------------------------------------------------------------------

/// Walks the two-module-wide placement columns from the bottom right cell,
/// alternating upward and downward, skipping the vertical timing column.
/// Yields every cell; the caller filters out reserved modules.
pub struct EncRegionIter {
    r: i16,
    c: i16,
    width: i16,
    vert_timing_col: i16,
}

impl EncRegionIter {
    pub const fn new(version: Version) -> Self {
        let w = version.width() as i16;
        let vert_timing_col = match version {
            Version::Micro(_) => 0,
            Version::Normal(_) => 6,
        };
        Self { r: w - 1, c: w - 1, width: w, vert_timing_col }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);

    fn next(&mut self) -> Option<Self::Item> {
        let adjusted_col = if self.c <= self.vert_timing_col { self.c + 1 } else { self.c };
        if self.c < 0 {
            return None;
        }
        let res = (self.r, self.c);
        let col_type = (self.width - adjusted_col) % 4;
        match col_type {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == self.vert_timing_col + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::EncRegionIter;
    use crate::common::metadata::Version;

    #[test]
    fn test_starts_bottom_right_and_zigzags_up() {
        let mut iter = EncRegionIter::new(Version::Normal(1));
        assert_eq!(iter.next(), Some((20, 20)));
        assert_eq!(iter.next(), Some((20, 19)));
        assert_eq!(iter.next(), Some((19, 20)));
        assert_eq!(iter.next(), Some((19, 19)));
        assert_eq!(iter.next(), Some((18, 20)));
    }

    #[test]
    fn test_visits_every_cell_outside_timing_column() {
        for version in [Version::Normal(1), Version::Normal(7), Version::Micro(2)] {
            let w = version.width() as i16;
            let timing_col = match version {
                Version::Micro(_) => 0,
                Version::Normal(_) => 6,
            };
            let mut seen = std::collections::HashSet::new();
            for (r, c) in EncRegionIter::new(version) {
                assert!((0..w).contains(&r) && (0..w).contains(&c));
                assert_ne!(c, timing_col);
                assert!(seen.insert((r, c)), "Duplicate cell ({r}, {c})");
            }
            assert_eq!(seen.len(), (w * (w - 1)) as usize);
        }
    }
}
