use cosmic_text::{
    Attrs, Buffer, Family, FeatureTag, FontFeatures, FontSystem, Metrics, Shaping, SwashCache,
    SwashContent, Weight,
};
use tiny_skia::Pixmap;

use crate::config::expand_path;
use crate::layout::Rect;

pub const LINE_HEIGHT: f32 = 1.2;

// fixed-width digits keep the ticking clock from jittering
const TABULAR_FIGURES: FeatureTag = FeatureTag::new(b"tnum");

// --- Text ---

pub struct Text {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
}

impl Text {
    /// Uses the given font file if it loads, system fonts otherwise.
    pub fn new(font: Option<&str>) -> Self {
        if let Some(path) = font {
            match std::fs::read(expand_path(path)) {
                Ok(data) => {
                    let mut db = cosmic_text::fontdb::Database::new();
                    db.load_font_data(data);
                    let family = db.faces().next()
                        .and_then(|face| face.families.first())
                        .map(|(name, _)| name.clone());
                    if family.is_some() {
                        return Self {
                            font_system: FontSystem::new_with_locale_and_db("en-US".into(), db),
                            swash_cache: SwashCache::new(),
                            family,
                        };
                    }
                    log::warn!("font file {path} contains no faces");
                }
                Err(e) => log::warn!("failed to read font {path}: {e}"),
            }
        }
        Self { font_system: FontSystem::new(), swash_cache: SwashCache::new(), family: None }
    }

    pub fn measure(&mut self, text: &str, font_size: f32, weight: Weight) -> f32 {
        let attrs = make_attrs(self.family.as_deref(), weight);
        let fs = &mut self.font_system;
        let mut buf = Buffer::new(fs, Metrics::new(font_size, font_size * LINE_HEIGHT));
        buf.set_size(fs, None, None);
        buf.set_text(fs, text, &attrs, Shaping::Advanced, None);
        buf.shape_until_scroll(fs, false);
        buf.layout_runs().next().map_or(0.0, |r| r.line_w)
    }

    pub fn render(
        &mut self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32,
        font_size: f32, max_w: f32, max_h: f32, color: [u8; 3], weight: Weight,
    ) {
        let attrs = make_attrs(self.family.as_deref(), weight);
        let fs = &mut self.font_system;
        let line_h = font_size * LINE_HEIGHT;
        let mut buf = Buffer::new(fs, Metrics::new(font_size, line_h));
        buf.set_size(fs, Some(max_w), Some(max_h));
        buf.set_text(fs, text, &attrs, Shaping::Advanced, None);
        buf.shape_until_scroll(fs, false);

        let target = Target { pw: pixmap.width() as i32, ph: pixmap.height() as i32 };
        let glyphs = buf.layout_runs()
            .flat_map(|run| run.glyphs.iter().map(move |g| g.physical((x, y + run.line_y), 1.0)));
        for physical in glyphs {
            let Some(image) = self.swash_cache.get_image_uncached(fs, physical.cache_key) else {
                continue;
            };
            let place = Placement {
                x: physical.x + image.placement.left,
                y: physical.y - image.placement.top,
                w: image.placement.width as i32,
                h: image.placement.height as i32,
            };
            let data = pixmap.data_mut();
            match image.content {
                SwashContent::Mask => target.each(data, place, |px, i| {
                    blend(px, color, image.data[i] as u32);
                }),
                SwashContent::Color => target.each(data, place, |px, i| {
                    let src = &image.data[i * 4..i * 4 + 4];
                    blend(px, [src[0], src[1], src[2]], src[3] as u32);
                }),
                SwashContent::SubpixelMask => {}
            }
        }
    }

    /// Centers a single line inside `area`.
    pub fn render_centered(
        &mut self, pixmap: &mut Pixmap, text: &str, area: Rect,
        font_size: f32, color: [u8; 3], weight: Weight,
    ) {
        let w = self.measure(text, font_size, weight);
        // leave room for the last glyph's overhang
        let max_w = w.ceil() + font_size;
        self.render(pixmap, text,
            center_x(area.x as f32, area.w as f32, w),
            center_y(area.y as f32, area.h as f32, font_size),
            font_size, max_w, font_size * LINE_HEIGHT * 2.0, color, weight);
    }
}

fn make_attrs(family: Option<&str>, weight: Weight) -> Attrs<'_> {
    let family = match family {
        Some(name) => Family::Name(name),
        None => Family::SansSerif,
    };
    let mut features = FontFeatures::new();
    features.enable(TABULAR_FIGURES);
    Attrs::new().weight(weight).family(family).font_features(features)
}

pub fn center_x(area_x: f32, area_w: f32, text_w: f32) -> f32 {
    area_x + (area_w - text_w) / 2.0
}

pub fn center_y(area_y: f32, area_h: f32, font_size: f32) -> f32 {
    area_y + (area_h - font_size * LINE_HEIGHT) / 2.0
}

// --- Pixels ---

pub fn alpha_color(c: [u8; 3], a: f32) -> [u8; 3] {
    [(c[0] as f32 * a) as u8, (c[1] as f32 * a) as u8, (c[2] as f32 * a) as u8]
}

pub fn fill_rect(data: &mut [u8], pw: u32, ph: u32, r: Rect, c: [u8; 3]) {
    for py in r.y..r.y.saturating_add(r.h).min(ph) {
        for px in r.x..r.x.saturating_add(r.w).min(pw) {
            let i = (py as usize * pw as usize + px as usize) * 4;
            data[i] = c[0]; data[i + 1] = c[1]; data[i + 2] = c[2]; data[i + 3] = 0xff;
        }
    }
}

pub fn fill_rect_alpha(data: &mut [u8], pw: u32, ph: u32, r: Rect, c: [u8; 3], a: u8) {
    if a == 0xff { return fill_rect(data, pw, ph, r, c); }
    if a == 0 { return; }
    for py in r.y..r.y.saturating_add(r.h).min(ph) {
        for px in r.x..r.x.saturating_add(r.w).min(pw) {
            let i = (py as usize * pw as usize + px as usize) * 4;
            blend(&mut data[i..i + 4], c, a as u32);
        }
    }
}

/// Rectangle outline of thickness `t`, drawn inside `r`.
pub fn stroke_rect(data: &mut [u8], pw: u32, ph: u32, r: Rect, t: u32, c: [u8; 3]) {
    let t = t.min(r.w / 2).min(r.h / 2);
    fill_rect(data, pw, ph, Rect { h: t, ..r }, c);
    fill_rect(data, pw, ph, Rect { y: r.y + r.h - t, h: t, ..r }, c);
    fill_rect(data, pw, ph, Rect { w: t, ..r }, c);
    fill_rect(data, pw, ph, Rect { x: r.x + r.w - t, w: t, ..r }, c);
}

/// Source-over of `c` at coverage `a` onto one premultiplied RGBA pixel.
fn blend(px: &mut [u8], c: [u8; 3], a: u32) {
    if a == 0 { return; }
    let inv = 255 - a;
    for (dst, src) in px[..3].iter_mut().zip(c) {
        *dst = ((src as u32 * a + *dst as u32 * inv) / 255) as u8;
    }
    px[3] = (a + px[3] as u32 * inv / 255) as u8;
}

/// Glyph image position in pixmap coordinates.
#[derive(Debug, Clone, Copy)]
struct Placement {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

struct Target {
    pw: i32,
    ph: i32,
}

impl Target {
    /// Calls `f(pixel, glyph_index)` for each glyph pixel inside the pixmap.
    fn each(&self, data: &mut [u8], p: Placement, mut f: impl FnMut(&mut [u8], usize)) {
        let rows = p.y.max(0)..(p.y + p.h).min(self.ph);
        let cols = p.x.max(0)..(p.x + p.w).min(self.pw);
        for py in rows {
            for px in cols.clone() {
                let i = (py * self.pw + px) as usize * 4;
                let gi = ((py - p.y) * p.w + (px - p.x)) as usize;
                f(&mut data[i..i + 4], gi);
            }
        }
    }
}

/// RGBA premul -> BGRA (ARGB8888 on LE)
pub fn copy_to_argb(canvas: &mut [u8], pixmap: &Pixmap) {
    for (dst, src) in canvas.chunks_exact_mut(4).zip(pixmap.data().chunks_exact(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
        dst[3] = src[3];
    }
}
