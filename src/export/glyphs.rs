//! Glyph lookup for the export rasterizer.
//!
//! 8×8 bitmaps from `font8x8`: ASCII, Latin-1 and Greek. Each glyph is eight
//! row bytes, top row first, bit 0 = leftmost column. Punctuation the fonts
//! lack is folded to a close stand-in; anything else renders as `?`.

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};

pub const GLYPH_SIZE: usize = 8;

pub type Glyph = [u8; GLYPH_SIZE];

fn lookup(c: char) -> Option<Glyph> {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
}

/// Stand-in for characters none of the fonts carry.
pub fn fold_char(c: char) -> char {
    match c {
        '\t' | '\n' | '\r' => ' ',
        '–' | '—' | '−' | '‐' => '-',
        '≥' => '>',
        '≤' => '<',
        '•' => '·',
        '‘' | '’' => '\'',
        '“' | '”' => '"',
        _ => '?',
    }
}

/// Row bytes for `c`.
pub fn glyph(c: char) -> Glyph {
    lookup(c)
        .or_else(|| lookup(fold_char(c)))
        .unwrap_or([0; GLYPH_SIZE])
}

/// Whether the pixel at `(col, row)` of `c` is set.
pub fn is_set(c: char, col: usize, row: usize) -> bool {
    col < GLYPH_SIZE && row < GLYPH_SIZE && (glyph(c)[row] >> col) & 1 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(c: char) -> u32 {
        glyph(c).iter().map(|row| row.count_ones()).sum()
    }

    #[test]
    fn space_is_blank() {
        assert_eq!(glyph(' '), [0; GLYPH_SIZE]);
    }

    #[test]
    fn letters_have_ink() {
        for c in ('A'..='Z').chain('a'..='z').chain('0'..='9') {
            assert!(ink(c) > 0, "{c} is blank");
        }
    }

    #[test]
    fn accented_letters_have_their_own_glyphs() {
        for (plain, accented) in [('e', 'é'), ('u', 'ü'), ('n', 'ñ'), ('A', 'Å')] {
            assert!(ink(accented) > 0);
            assert_ne!(glyph(accented), glyph(plain));
            assert_ne!(glyph(accented), glyph('?'));
        }
    }

    #[test]
    fn greek_and_latin1_symbols_render() {
        for c in ['μ', 'Ω', 'β', 'µ', '°', '×', '±'] {
            assert!(ink(c) > 0, "{c} is blank");
            assert_ne!(glyph(c), glyph('?'), "{c} fell back");
        }
    }

    #[test]
    fn l_is_wider_at_the_foot() {
        let rows: Vec<u8> = glyph('L').into_iter().filter(|r| *r != 0).collect();
        let (top, foot) = (rows[0], rows[rows.len() - 1]);
        assert!(foot.count_ones() > top.count_ones());
        assert!(is_set('L', 0, 0) || is_set('L', 1, 0));
    }

    #[test]
    fn missing_punctuation_folds() {
        assert_eq!(glyph('–'), glyph('-'));
        assert_eq!(glyph('≥'), glyph('>'));
        assert_eq!(glyph('’'), glyph('\''));
    }

    #[test]
    fn unknown_characters_fall_back_to_question_mark() {
        assert_eq!(glyph('漢'), glyph('?'));
        assert!(ink('?') > 0);
    }
}
