use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};
use crate::layout::timeline::TextStyle;
use crate::render::surface::Sprite;

const LINE_HEIGHT_EM: f64 = 1.25;
const PLATE_PAD: f64 = 16.0;

/// One laid-out line and its measured advance in pixels.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MeasuredLine {
    pub(crate) text: String,
    pub(crate) width: f32,
}

/// Turns text layers into sprites.
///
/// Lines are broken with parley against the real font metrics, then drawn as a small SVG with
/// resvg. Both sides use the same face, taken from the system font database loaded once.
pub struct TextRasterizer {
    opts: usvg::Options<'static>,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    /// CSS family list -> family name registered with parley (`None`: nothing matched).
    families: HashMap<String, Option<String>>,
}

impl TextRasterizer {
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if db.len() == 0 {
            tracing::warn!("no system fonts found, text layers will render empty");
        } else {
            tracing::debug!(faces = db.len(), "system fonts loaded");
        }
        Self {
            opts: usvg::Options {
                fontdb: Arc::new(db),
                ..Default::default()
            },
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Rasterize `text` centered in a sprite `max_width` pixels wide, wrapped to fit inside it.
    pub fn rasterize(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: u32,
    ) -> ReelResult<Sprite> {
        let max_width = max_width.max(1);
        let family = self.resolve_family(&style.font_family);
        let lines = self.layout_lines(text, style, max_width);
        let svg = build_svg(&lines, style, family.as_deref(), max_width);
        let (width, height) = sprite_size(lines.len(), style.font_size, max_width);

        let tree = usvg::Tree::from_str(&svg, &self.opts)
            .map_err(|e| ReelError::validation(format!("text svg parse failed: {e}")))?;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ReelError::validation("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );

        Ok(Sprite {
            width,
            height,
            data: pixmap.data().to_vec(),
        })
    }

    /// Break `text` into lines no wider than the sprite minus its padding.
    ///
    /// Without a usable font the text stays on one unmeasured line (width 0).
    pub(crate) fn layout_lines(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width: u32,
    ) -> Vec<MeasuredLine> {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Vec::new();
        }
        let Some(family) = self.resolve_family(&style.font_family) else {
            return vec![MeasuredLine { text, width: 0.0 }];
        };
        let wrap_w = (f64::from(max_width.max(1)) - 2.0 * PLATE_PAD).max(1.0) as f32;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size));
        let mut layout: parley::Layout<()> = builder.build(&text);
        layout.break_all_lines(Some(wrap_w));

        layout
            .lines()
            .filter_map(|line| {
                let m = line.metrics();
                let s = text[line.text_range()].trim();
                (!s.is_empty()).then(|| MeasuredLine {
                    text: s.to_string(),
                    width: (m.advance - m.trailing_whitespace).max(0.0),
                })
            })
            .collect()
    }

    /// Register the first face matching the CSS family list with parley. Cached per list.
    pub(crate) fn resolve_family(&mut self, css: &str) -> Option<String> {
        if let Some(hit) = self.families.get(css) {
            return hit.clone();
        }
        let resolved = self.register_family(css);
        match &resolved {
            Some(name) => tracing::debug!(families = css, family = %name, "text font resolved"),
            None => tracing::warn!(families = css, "no font matches, text renders without glyphs"),
        }
        self.families.insert(css.to_string(), resolved.clone());
        resolved
    }

    fn register_family(&mut self, css: &str) -> Option<String> {
        use usvg::fontdb::{Family, Query};

        let names: Vec<&str> = css
            .split(',')
            .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|s| !s.is_empty())
            .collect();
        let families: Vec<Family<'_>> = names
            .iter()
            .map(|&n| match n.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" => Family::SansSerif,
                "monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(n),
            })
            .collect();

        let db = &self.opts.fontdb;
        let id = db.query(&Query {
            families: &families,
            ..Query::default()
        })?;
        let wanted = db
            .face(id)
            .and_then(|f| f.families.first())
            .map(|(name, _)| name.clone());
        let bytes = db.with_face_data(id, |data, _index| data.to_vec())?;

        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let mut fallback = None;
        for (family_id, _) in &registered {
            let Some(name) = self.font_ctx.collection.family_name(*family_id) else {
                continue;
            };
            if wanted.as_deref() == Some(name) {
                return Some(name.to_string());
            }
            fallback.get_or_insert_with(|| name.to_string());
        }
        fallback
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

fn sprite_size(line_count: usize, font_size: f32, max_width: u32) -> (u32, u32) {
    let line_h = f64::from(font_size) * LINE_HEIGHT_EM;
    let h = (line_count.max(1) as f64 * line_h + 2.0 * PLATE_PAD).ceil() as u32;
    (max_width, h.max(1))
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Plate width: widest measured line plus padding, or the whole sprite when nothing was measured.
fn plate_width(lines: &[MeasuredLine], sprite_w: f64) -> f64 {
    let widest = lines.iter().map(|l| f64::from(l.width)).fold(0.0, f64::max);
    if widest <= 0.0 {
        sprite_w
    } else {
        (widest + 2.0 * PLATE_PAD).min(sprite_w)
    }
}

pub(crate) fn build_svg(
    lines: &[MeasuredLine],
    style: &TextStyle,
    resolved_family: Option<&str>,
    width: u32,
) -> String {
    let fs = f64::from(style.font_size);
    let line_h = fs * LINE_HEIGHT_EM;
    let (w, h) = sprite_size(lines.len(), style.font_size, width);
    let cx = f64::from(w) / 2.0;
    let family = match resolved_family {
        Some(name) => format!("'{name}', {}", style.font_family),
        None => style.font_family.clone(),
    };

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    if style.plate {
        let plate_w = plate_width(lines, f64::from(w));
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="0" width="{plate_w:.1}" height="{h}" rx="8" fill="black" fill-opacity="0.55"/>"#,
            cx - plate_w / 2.0
        ));
    }
    svg.push_str(&format!(
        r#"<text font-family="{}" font-size="{fs}" fill="{}" text-anchor="middle">"#,
        escape_xml(&family),
        escape_xml(&style.color)
    ));
    for (i, line) in lines.iter().enumerate() {
        // Baseline sits ~0.8em below the top of each line box.
        let y = PLATE_PAD + i as f64 * line_h + fs * 0.8 + (line_h - fs) / 2.0;
        svg.push_str(&format!(
            r#"<tspan x="{cx}" y="{y:.1}">{}</tspan>"#,
            escape_xml(&line.text)
        ));
    }
    svg.push_str("</text></svg>");
    svg
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
