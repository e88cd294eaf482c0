//! Adaptive color palette
//!
//! Colors are appended in first-seen order until the palette holds
//! [`PalettePolicy::capacity`] entries. A color close enough to an existing
//! entry (see [`similarity_threshold`]) is merged into its nearest neighbour
//! instead of growing the palette.

use crate::color::Color;
use crate::config::PalettePolicy;

/// Palette slots addressable by a nonzero `u8` grid value
pub const MAX_SLOTS: usize = 255;

/// Merge distance for a palette that currently holds `len` entries
pub fn similarity_threshold(len: usize, policy: &PalettePolicy) -> f32 {
    (len as f32 * policy.threshold_scale).clamp(policy.min_threshold, policy.max_threshold)
}

/// Index of the entry closest to `color`, first one on ties
///
/// Returns `None` for an empty palette.
pub fn nearest_color_index(color: &Color, palette: &[Color]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, entry) in palette.iter().enumerate() {
        let d = color.distance_squared(entry);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Outcome of [`Palette::add_or_match`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteMatch {
    /// The color was appended at this index
    Added(usize),
    /// The color merged into a similar existing entry
    Matched(usize),
    /// The palette is full; this is the nearest entry
    Remapped(usize),
}

impl PaletteMatch {
    /// Zero-based palette index
    pub fn index(self) -> usize {
        match self {
            PaletteMatch::Added(i) | PaletteMatch::Matched(i) | PaletteMatch::Remapped(i) => i,
        }
    }
}

/// Ordered, append-only palette
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
    policy: PalettePolicy,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(PalettePolicy::default())
    }
}

impl Palette {
    pub fn new(policy: PalettePolicy) -> Self {
        Self {
            colors: Vec::new(),
            policy,
        }
    }

    /// Palette seeded with `preset`
    ///
    /// Presets longer than [`MAX_SLOTS`] are truncated. A preset at or above
    /// the policy capacity never grows.
    pub fn with_preset(preset: &[Color], policy: PalettePolicy) -> Self {
        let len = preset.len().min(MAX_SLOTS);
        Self {
            colors: preset[..len].to_vec(),
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Whether new colors can no longer be appended
    pub fn is_full(&self) -> bool {
        self.colors.len() >= self.policy.capacity
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn into_colors(self) -> Vec<Color> {
        self.colors
    }

    pub fn policy(&self) -> &PalettePolicy {
        &self.policy
    }

    /// Current merge distance
    pub fn threshold(&self) -> f32 {
        similarity_threshold(self.colors.len(), &self.policy)
    }

    pub fn nearest_color_index(&self, color: &Color) -> Option<usize> {
        nearest_color_index(color, &self.colors)
    }

    /// Find or insert a palette entry for `color`
    pub fn add_or_match(&mut self, color: Color) -> PaletteMatch {
        if self.is_full() {
            if let Some(i) = self.nearest_color_index(&color) {
                return PaletteMatch::Remapped(i);
            }
        }

        let threshold = self.threshold();
        let within = self
            .colors
            .iter()
            .any(|entry| color.distance(entry) <= threshold);
        if within {
            if let Some(i) = self.nearest_color_index(&color) {
                return PaletteMatch::Matched(i);
            }
        }

        self.colors.push(color);
        PaletteMatch::Added(self.colors.len() - 1)
    }
}

/// MagicaVoxel's default palette in `0xAABBGGRR` order; slot 0 is reserved
pub const DEFAULT_PALETTE: [u32; 256] = [
    0x00000000, 0xffffffff, 0xffccffff, 0xff99ffff, 0xff66ffff, 0xff33ffff, 0xff00ffff, 0xffffccff,
    0xffccccff, 0xff99ccff, 0xff66ccff, 0xff33ccff, 0xff00ccff, 0xffff99ff, 0xffcc99ff, 0xff9999ff,
    0xff6699ff, 0xff3399ff, 0xff0099ff, 0xffff66ff, 0xffcc66ff, 0xff9966ff, 0xff6666ff, 0xff3366ff,
    0xff0066ff, 0xffff33ff, 0xffcc33ff, 0xff9933ff, 0xff6633ff, 0xff3333ff, 0xff0033ff, 0xffff00ff,
    0xffcc00ff, 0xff9900ff, 0xff6600ff, 0xff3300ff, 0xff0000ff, 0xffffffcc, 0xffccffcc, 0xff99ffcc,
    0xff66ffcc, 0xff33ffcc, 0xff00ffcc, 0xffffcccc, 0xffcccccc, 0xff99cccc, 0xff66cccc, 0xff33cccc,
    0xff00cccc, 0xffff99cc, 0xffcc99cc, 0xff9999cc, 0xff6699cc, 0xff3399cc, 0xff0099cc, 0xffff66cc,
    0xffcc66cc, 0xff9966cc, 0xff6666cc, 0xff3366cc, 0xff0066cc, 0xffff33cc, 0xffcc33cc, 0xff9933cc,
    0xff6633cc, 0xff3333cc, 0xff0033cc, 0xffff00cc, 0xffcc00cc, 0xff9900cc, 0xff6600cc, 0xff3300cc,
    0xff0000cc, 0xffffff99, 0xffccff99, 0xff99ff99, 0xff66ff99, 0xff33ff99, 0xff00ff99, 0xffffcc99,
    0xffcccc99, 0xff99cc99, 0xff66cc99, 0xff33cc99, 0xff00cc99, 0xffff9999, 0xffcc9999, 0xff999999,
    0xff669999, 0xff339999, 0xff009999, 0xffff6699, 0xffcc6699, 0xff996699, 0xff666699, 0xff336699,
    0xff006699, 0xffff3399, 0xffcc3399, 0xff993399, 0xff663399, 0xff333399, 0xff003399, 0xffff0099,
    0xffcc0099, 0xff990099, 0xff660099, 0xff330099, 0xff000099, 0xffffff66, 0xffccff66, 0xff99ff66,
    0xff66ff66, 0xff33ff66, 0xff00ff66, 0xffffcc66, 0xffcccc66, 0xff99cc66, 0xff66cc66, 0xff33cc66,
    0xff00cc66, 0xffff9966, 0xffcc9966, 0xff999966, 0xff669966, 0xff339966, 0xff009966, 0xffff6666,
    0xffcc6666, 0xff996666, 0xff666666, 0xff336666, 0xff006666, 0xffff3366, 0xffcc3366, 0xff993366,
    0xff663366, 0xff333366, 0xff003366, 0xffff0066, 0xffcc0066, 0xff990066, 0xff660066, 0xff330066,
    0xff000066, 0xffffff33, 0xffccff33, 0xff99ff33, 0xff66ff33, 0xff33ff33, 0xff00ff33, 0xffffcc33,
    0xffcccc33, 0xff99cc33, 0xff66cc33, 0xff33cc33, 0xff00cc33, 0xffff9933, 0xffcc9933, 0xff999933,
    0xff669933, 0xff339933, 0xff009933, 0xffff6633, 0xffcc6633, 0xff996633, 0xff666633, 0xff336633,
    0xff006633, 0xffff3333, 0xffcc3333, 0xff993333, 0xff663333, 0xff333333, 0xff003333, 0xffff0033,
    0xffcc0033, 0xff990033, 0xff660033, 0xff330033, 0xff000033, 0xffffff00, 0xffccff00, 0xff99ff00,
    0xff66ff00, 0xff33ff00, 0xff00ff00, 0xffffcc00, 0xffcccc00, 0xff99cc00, 0xff66cc00, 0xff33cc00,
    0xff00cc00, 0xffff9900, 0xffcc9900, 0xff999900, 0xff669900, 0xff339900, 0xff009900, 0xffff6600,
    0xffcc6600, 0xff996600, 0xff666600, 0xff336600, 0xff006600, 0xffff3300, 0xffcc3300, 0xff993300,
    0xff663300, 0xff333300, 0xff003300, 0xffff0000, 0xffcc0000, 0xff990000, 0xff660000, 0xff330000,
    0xff0000ee, 0xff0000dd, 0xff0000bb, 0xff0000aa, 0xff000088, 0xff000077, 0xff000055, 0xff000044,
    0xff000022, 0xff000011, 0xff00ee00, 0xff00dd00, 0xff00bb00, 0xff00aa00, 0xff008800, 0xff007700,
    0xff005500, 0xff004400, 0xff002200, 0xff001100, 0xffee0000, 0xffdd0000, 0xffbb0000, 0xffaa0000,
    0xff880000, 0xff770000, 0xff550000, 0xff440000, 0xff220000, 0xff110000, 0xffeeeeee, 0xffdddddd,
    0xffbbbbbb, 0xffaaaaaa, 0xff888888, 0xff777777, 0xff555555, 0xff444444, 0xff222222, 0xff111111,
];

/// The default palette without the reserved slot (255 colors)
pub fn default_preset() -> Vec<Color> {
    DEFAULT_PALETTE[1..].iter().map(|&c| Color::from_abgr(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PalettePolicy {
        PalettePolicy::default()
    }

    // Policy constants: pinned, but tunable through PalettePolicy.
    #[test]
    fn test_similarity_threshold() {
        let p = policy();
        assert_eq!(similarity_threshold(0, &p), 7.0);
        assert_eq!(similarity_threshold(10, &p), 7.0);
        assert_eq!(similarity_threshold(11, &p), 11.0 * 0.65);
        assert_eq!(similarity_threshold(18, &p), 18.0 * 0.65);
        assert_eq!(similarity_threshold(19, &p), 12.0);
        assert_eq!(similarity_threshold(200, &p), 12.0);
    }

    #[test]
    fn test_nearest_color_index() {
        let palette = [Color::rgb(0, 0, 0), Color::rgb(100, 0, 0), Color::rgb(200, 0, 0)];
        assert_eq!(nearest_color_index(&Color::rgb(90, 0, 0), &palette), Some(1));
        assert_eq!(nearest_color_index(&Color::rgb(255, 0, 0), &palette), Some(2));
        assert_eq!(nearest_color_index(&Color::rgb(0, 0, 0), &[]), None);
    }

    #[test]
    fn test_nearest_color_index_ties_go_first() {
        let palette = [Color::rgb(0, 0, 0), Color::rgb(20, 0, 0), Color::rgb(20, 0, 0)];
        assert_eq!(nearest_color_index(&Color::rgb(10, 0, 0), &palette), Some(0));
        assert_eq!(nearest_color_index(&Color::rgb(19, 0, 0), &palette), Some(1));
    }

    #[test]
    fn test_add_grows_with_distinct_colors() {
        let mut palette = Palette::default();
        assert_eq!(palette.add_or_match(Color::rgb(255, 0, 0)), PaletteMatch::Added(0));
        assert_eq!(palette.add_or_match(Color::rgb(0, 255, 0)), PaletteMatch::Added(1));
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut palette = Palette::default();
        palette.add_or_match(Color::rgb(100, 100, 100));

        // Exactly 7 away merges
        assert_eq!(
            palette.add_or_match(Color::rgb(107, 100, 100)),
            PaletteMatch::Matched(0)
        );
        // 8 away appends
        assert_eq!(
            palette.add_or_match(Color::rgb(108, 100, 100)),
            PaletteMatch::Added(1)
        );
    }

    #[test]
    fn test_match_returns_nearest_not_first_within() {
        let mut palette = Palette::with_preset(
            &[Color::rgb(100, 100, 100), Color::rgb(106, 100, 100)],
            policy(),
        );
        // Within 7 of both; entry 1 is nearer
        assert_eq!(
            palette.add_or_match(Color::rgb(105, 100, 100)),
            PaletteMatch::Matched(1)
        );
    }

    #[test]
    fn test_full_palette_remaps() {
        let preset: Vec<Color> = (0..254u32)
            .map(|i| Color::rgb((i % 256) as u8, (i * 7 % 256) as u8, (i * 13 % 256) as u8))
            .collect();
        let mut palette = Palette::with_preset(&preset, policy());
        assert!(palette.is_full());

        let color = Color::rgb(1, 2, 3);
        let expected = nearest_color_index(&color, &preset);
        assert_eq!(
            palette.add_or_match(color).index(),
            expected.unwrap_or_default()
        );
        assert_eq!(palette.len(), 254);
    }

    #[test]
    fn test_palette_never_exceeds_capacity() {
        let mut palette = Palette::default();
        for r in (0..=255u32).step_by(15) {
            for g in (0..=255u32).step_by(15) {
                palette.add_or_match(Color::rgb(r as u8, g as u8, 0));
            }
        }
        assert_eq!(palette.len(), 254);
        assert!(palette.colors().iter().all(|c| c.a == 255));
    }

    #[test]
    fn test_default_preset() {
        let preset = default_preset();
        assert_eq!(preset.len(), 255);
        assert_eq!(preset[0], Color::rgb(255, 255, 255));
        assert_eq!(preset[254], Color::rgb(0x11, 0x11, 0x11));
        // 0xff0000ee is a red ramp entry in ABGR order
        assert_eq!(preset[215], Color::rgb(0xee, 0, 0));
    }

    #[test]
    fn test_default_preset_never_grows() {
        let mut palette = Palette::with_preset(&default_preset(), policy());
        assert_eq!(palette.len(), 255);
        let result = palette.add_or_match(Color::rgb(250, 3, 3));
        assert!(matches!(result, PaletteMatch::Remapped(_)));
        assert_eq!(palette.len(), 255);
    }

    #[test]
    fn test_preset_truncated_to_slots() {
        let preset = vec![Color::rgb(1, 1, 1); 300];
        assert_eq!(Palette::with_preset(&preset, policy()).len(), MAX_SLOTS);
    }
}
