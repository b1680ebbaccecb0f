use super::*;

fn style(plate: bool) -> TextStyle {
    TextStyle {
        font_size: 40.0,
        color: "#FFFFFF".to_string(),
        font_family: "DejaVu Sans, sans-serif".to_string(),
        plate,
    }
}

fn line(text: &str, width: f32) -> MeasuredLine {
    MeasuredLine {
        text: text.to_string(),
        width,
    }
}

fn column_has_ink(sprite: &Sprite, x: u32) -> bool {
    (0..sprite.height).any(|y| sprite.data[((y * sprite.width + x) * 4 + 3) as usize] > 0)
}

#[test]
fn escape_xml_covers_markup_characters() {
    assert_eq!(
        escape_xml(r#"Tom & "Jerry" <3 'ok'"#),
        "Tom &amp; &quot;Jerry&quot; &lt;3 &apos;ok&apos;"
    );
}

#[test]
fn svg_has_one_tspan_per_line_and_escapes_content() {
    let svg = build_svg(&[line("a < b", 80.0), line("c", 20.0)], &style(false), None, 400);
    assert_eq!(svg.matches("<tspan").count(), 2);
    assert!(svg.contains("a &lt; b"));
    assert!(!svg.contains("<rect"));
    assert!(build_svg(&[line("x", 20.0)], &style(true), None, 400).contains("<rect"));
}

#[test]
fn svg_prefers_the_resolved_family() {
    let svg = build_svg(&[line("x", 20.0)], &style(false), Some("DejaVu Sans"), 400);
    assert!(svg.contains("font-family=\"&apos;DejaVu Sans&apos;, DejaVu Sans, sans-serif\""));
}

#[test]
fn plate_is_sized_from_measured_width() {
    assert_eq!(plate_width(&[line("ab", 100.0), line("abc", 180.5)], 600.0), 212.5);
    assert_eq!(plate_width(&[line("wide", 900.0)], 600.0), 600.0);
    assert_eq!(plate_width(&[line("unmeasured", 0.0)], 600.0), 600.0);
}

#[test]
fn sprite_height_grows_with_lines() {
    let (w1, h1) = sprite_size(1, 40.0, 600);
    let (w2, h2) = sprite_size(3, 40.0, 600);
    assert_eq!((w1, w2), (600, 600));
    assert_eq!(h2 - h1, 100);
}

#[test]
fn blank_text_has_no_lines() {
    let mut r = TextRasterizer::new();
    assert!(r.layout_lines("  \n\t ", &style(false), 600).is_empty());
}

#[test]
fn wide_glyphs_wrap_inside_the_sprite() {
    let mut r = TextRasterizer::new();
    let s = style(false);
    if r.resolve_family(&s.font_family).is_none() {
        return;
    }
    let text = "WWWW WWWW WWWW WWWW WWWW";
    let lines = r.layout_lines(text, &s, 600);
    assert!(lines.len() > 1, "{lines:?}");
    assert!(lines.iter().all(|l| f64::from(l.width) <= 600.0 - 2.0 * PLATE_PAD));
    let joined: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(joined.join(" "), text);

    let sprite = r.rasterize(text, &s, 600).unwrap();
    assert_eq!(sprite.height, sprite_size(lines.len(), 40.0, 600).1);
    assert!(!column_has_ink(&sprite, 0));
    assert!(!column_has_ink(&sprite, sprite.width - 1));
}

#[test]
fn text_without_spaces_still_wraps() {
    let mut r = TextRasterizer::new();
    let s = style(false);
    if r.resolve_family(&s.font_family).is_none() {
        return;
    }
    let text = "我是一名软件工程师我喜欢用视频讲故事".repeat(3);
    let lines = r.layout_lines(&text, &s, 400);
    assert!(lines.len() > 1, "{lines:?}");
    assert!(lines.iter().all(|l| f64::from(l.width) <= 400.0 - 2.0 * PLATE_PAD));
}

#[test]
fn plate_renders_even_without_glyphs_and_is_deterministic() {
    let mut r = TextRasterizer::new();
    let a = r.rasterize("Hello. I am testing.", &style(true), 600).unwrap();
    let b = r.rasterize("Hello. I am testing.", &style(true), 600).unwrap();
    assert_eq!(a.data, b.data);
    assert_eq!(a.width, 600);
    assert_eq!(a.data.len(), (a.width * a.height * 4) as usize);
    let cx = (a.width / 2) as usize;
    let cy = (a.height / 2) as usize;
    assert!(a.data[(cy * a.width as usize + cx) * 4 + 3] > 0);
}
