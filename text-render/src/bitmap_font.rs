use fxhash::FxHashMap;

pub type GlyphId = u32;

/// Metrics for a single glyph of a bitmap font.
///
/// Texture coordinates are expressed in texels of the backing glyph sheet,
/// with the origin at the bottom-left (the metadata's top-down `y` is
/// flipped during parsing).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Glyph {
    pub width: f64,
    pub height: f64,
    pub texture_x: f64,
    pub texture_y: f64,
    pub texture_width: f64,
    pub texture_height: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub x_advance: f64,
}

/// A bitmap font: a glyph sheet texture plus metrics parsed from a
/// line-oriented metadata blob.
///
/// The metadata format is record-per-line. The first whitespace-separated
/// token names the record kind (`info`, `common`, `char`, `kerning`); the
/// rest are `key=value` pairs with numeric values. Unknown record kinds are
/// ignored and malformed fields read as 0.0, never as an error.
///
/// Immutable after construction.
pub struct BitmapFont<T> {
    texture: T,

    size: f64,
    padding: f64,
    line_height: f64,
    base: f64,
    scale_w: f64,
    scale_h: f64,

    glyphs: FxHashMap<GlyphId, Glyph>,
    kernings: FxHashMap<(GlyphId, GlyphId), f64>,
}

impl<T> BitmapFont<T> {
    /// Builds the font from its glyph sheet and metadata. `texture_width` is
    /// the sheet's width in texels, used to rescale metadata coordinates
    /// when the sheet was resized from the grid it was authored against.
    pub fn new(texture: T, texture_width: f64, metadata: &str) -> Self {
        let mut font = Self {
            texture,
            size: 0.0,
            padding: 0.0,
            line_height: 0.0,
            base: 0.0,
            scale_w: 0.0,
            scale_h: 0.0,
            glyphs: FxHashMap::default(),
            kernings: FxHashMap::default(),
        };
        for line in metadata.lines() {
            font.parse_line(line, texture_width);
        }
        font
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Distance from the bottom of a line to the baseline.
    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn glyph(&self, id: GlyphId) -> Option<&Glyph> {
        self.glyphs.get(&id)
    }

    /// Kerning adjustment for the pair, 0.0 when the pair has no entry.
    pub fn kerning(&self, first: GlyphId, second: GlyphId) -> f64 {
        self.kernings.get(&(first, second)).copied().unwrap_or(0.0)
    }

    /// Width of a glyph run: advances plus kerning, with the final glyph
    /// contributing its own width minus the font padding instead of its
    /// advance. Glyphs the font does not cover contribute nothing.
    pub fn width(&self, glyphs: &[GlyphId]) -> f64 {
        let mut width = 0.0;
        for (i, &id) in glyphs.iter().enumerate() {
            let Some(glyph) = self.glyph(id) else {
                continue;
            };
            if i > 0 {
                width += self.kerning(glyphs[i - 1], id);
            }
            width += if i + 1 == glyphs.len() {
                glyph.width - self.padding
            } else {
                glyph.x_advance
            };
        }
        width
    }

    fn parse_line(&mut self, line: &str, texture_width: f64) {
        let mut tokens = line.split_whitespace();
        let Some(kind) = tokens.next() else {
            return;
        };

        let mut params = FxHashMap::default();
        for token in tokens {
            if let Some((key, value)) = token.split_once('=') {
                params.insert(key, value.parse::<f64>().unwrap_or(0.0));
            }
        }
        let param = |name: &str| params.get(name).copied().unwrap_or(0.0);

        match kind {
            "info" => {
                self.size = param("size");
                self.padding = param("padding");
            }
            "common" => {
                self.line_height = param("lineHeight");
                self.base = self.line_height - param("base");
                self.scale_w = param("scaleW");
                self.scale_h = param("scaleH");
            }
            "char" => {
                let texture_scale = if self.scale_w > 0.0 {
                    texture_width / self.scale_w
                } else {
                    0.0
                };

                let mut glyph = Glyph {
                    width: param("width"),
                    height: param("height"),
                    ..Glyph::default()
                };
                glyph.texture_width = glyph.width * texture_scale;
                glyph.texture_height = glyph.height * texture_scale;
                glyph.texture_x = param("x") * texture_scale;
                glyph.texture_y =
                    (self.scale_h - param("y")) * texture_scale - glyph.texture_height;
                glyph.x_offset = param("xoffset");
                glyph.y_offset = self.line_height - glyph.height - param("yoffset");
                glyph.x_advance = param("xadvance");

                self.glyphs.insert(param("id") as GlyphId, glyph);
            }
            "kerning" => {
                self.kernings.insert(
                    (param("first") as GlyphId, param("second") as GlyphId),
                    param("amount"),
                );
            }
            _ => {}
        }
    }
}
