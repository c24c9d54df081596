//! Raster-to-vector conversion for inline-vector mode.
//!
//! Every non-transparent pixel becomes part of a horizontal run, and runs are grouped into one
//! stroked `<path>` per colour. The output is meant for small pixel-art canvases.

use std::collections::HashMap;
use std::fmt::Write as _;

use base64::Engine as _;

use crate::render::backend::FrameRGBA;

const DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Convert straight-alpha pixels into an SVG document.
pub fn img_to_svg(frame: &FrameRGBA) -> String {
    let mut paths = String::new();
    for (rgba, pixels) in collect_colors(frame) {
        let Some(color) = css_color(rgba) else {
            continue;
        };
        let mut data = String::new();
        let mut run: Option<(u32, u32, u32)> = None;
        for (x, y) in pixels {
            match run {
                Some((rx, ry, w)) if ry == y && rx + w == x => run = Some((rx, ry, w + 1)),
                _ => {
                    if let Some((rx, ry, w)) = run {
                        push_run(&mut data, rx, ry, w);
                    }
                    run = Some((x, y, 1));
                }
            }
        }
        if let Some((rx, ry, w)) = run {
            push_run(&mut data, rx, ry, w);
        }
        let _ = write!(paths, "<path stroke='{color}' d='{data}' />");
    }

    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 -0.5 {} {}' shape-rendering='crispEdges'>{paths}</svg>",
        frame.width, frame.height
    )
}

fn push_run(out: &mut String, x: u32, y: u32, w: u32) {
    let _ = write!(out, "M{x} {y}h{w}");
}

/// Pixels grouped by exact RGBA value, colours in first-seen row-major order.
fn collect_colors(frame: &FrameRGBA) -> Vec<([u8; 4], Vec<(u32, u32)>)> {
    let mut order: Vec<([u8; 4], Vec<(u32, u32)>)> = Vec::new();
    let mut slot_of = HashMap::<[u8; 4], usize>::new();
    let w = frame.width.max(1);
    for (i, px) in frame.data.chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let rgba = [px[0], px[1], px[2], px[3]];
        let i = i as u32;
        let slot = *slot_of.entry(rgba).or_insert_with(|| {
            order.push((rgba, Vec::new()));
            order.len() - 1
        });
        order[slot].1.push((i % w, i / w));
    }
    order
}

fn css_color([r, g, b, a]: [u8; 4]) -> Option<String> {
    match a {
        0 => None,
        255 => Some(format!("#{r:02x}{g:02x}{b:02x}")),
        _ => Some(format!("rgba({r},{g},{b},{})", f64::from(a) / 255.0)),
    }
}

/// Deterministic minification of documents produced by [`img_to_svg`].
///
/// Attribute quotes become double quotes, self-closing tags lose their padding, whitespace
/// between tags is dropped and `#rrggbb` colours collapse to `#rgb` where lossless.
pub fn optimize_svg(doc: &str) -> String {
    let mut out = String::with_capacity(doc.len());
    let mut chars = doc.chars().peekable();
    let mut in_tag = false;
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                while out.ends_with(char::is_whitespace) && !in_tag {
                    out.pop();
                }
                in_tag = true;
                out.push(c);
            }
            '>' => {
                in_tag = false;
                out.push(c);
                while chars.peek().is_some_and(|n| n.is_whitespace()) {
                    chars.next();
                }
            }
            '\'' => out.push('"'),
            ' ' if in_tag && chars.peek() == Some(&'/') => {}
            c if c.is_whitespace() && in_tag => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            _ => out.push(c),
        }
    }
    shorten_hex_colors(&out)
}

fn shorten_hex_colors(doc: &str) -> String {
    let bytes = doc.as_bytes();
    let mut out = String::with_capacity(doc.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#'
            && i + 7 <= bytes.len()
            && bytes[i + 1..i + 7].iter().all(u8::is_ascii_hexdigit)
            && !bytes.get(i + 7).is_some_and(u8::is_ascii_hexdigit)
        {
            let h = &doc[i + 1..i + 7];
            let hb = h.as_bytes();
            out.push('#');
            if hb[0] == hb[1] && hb[2] == hb[3] && hb[4] == hb[5] {
                out.push(hb[0] as char);
                out.push(hb[2] as char);
                out.push(hb[4] as char);
            } else {
                out.push_str(h);
            }
            i += 7;
            continue;
        }
        let ch = doc[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }
    out
}

/// `data:image/svg+xml;base64,...` for an SVG document.
pub fn to_base64_data_uri(doc: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(doc.as_bytes());
    format!("{DATA_URI_PREFIX}{encoded}")
}

/// Decode a URI produced by [`to_base64_data_uri`]. `None` for any other input.
pub fn decode_base64_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}

#[cfg(test)]
#[path = "../tests/unit/vector.rs"]
mod tests;
