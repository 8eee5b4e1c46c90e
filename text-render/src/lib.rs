pub mod bitmap_font;

pub use bitmap_font::{BitmapFont, Glyph, GlyphId};
