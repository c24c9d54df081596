use super::*;

fn frame(width: u32, height: u32, pixels: &[[u8; 4]]) -> FrameRGBA {
    FrameRGBA {
        width,
        height,
        data: pixels.concat(),
    }
}

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

#[test]
fn horizontal_runs_merge_per_color() {
    let f = frame(3, 2, &[RED, RED, BLUE, BLUE, CLEAR, RED]);
    let svg = img_to_svg(&f);
    assert_eq!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 -0.5 3 2' shape-rendering='crispEdges'>\
<path stroke='#ff0000' d='M0 0h2M2 1h1' />\
<path stroke='#0000ff' d='M2 0h1M0 1h1' /></svg>"
    );
}

#[test]
fn translucent_colors_use_rgba() {
    let f = frame(1, 1, &[[10, 20, 30, 51]]);
    let svg = img_to_svg(&f);
    assert!(svg.contains("stroke='rgba(10,20,30,0.2)'"), "{svg}");
}

#[test]
fn fully_transparent_frame_has_no_paths() {
    let f = frame(2, 1, &[CLEAR, CLEAR]);
    assert!(!img_to_svg(&f).contains("<path"));
}

#[test]
fn optimize_minifies_deterministically() {
    let f = frame(2, 1, &[RED, [18, 52, 86, 255]]);
    let doc = img_to_svg(&f);
    let opt = optimize_svg(&doc);
    assert!(opt.contains(r##"stroke="#f00""##), "{opt}");
    assert!(opt.contains(r##"stroke="#123456""##), "{opt}");
    assert!(opt.contains(r#"d="M0 0h1"/>"#), "{opt}");
    assert!(!opt.contains('\''));
    assert!(opt.len() < doc.len());
    assert_eq!(optimize_svg(&doc), opt);
    assert_eq!(optimize_svg(&opt), opt);
}

#[test]
fn optimize_drops_whitespace_between_tags() {
    let opt = optimize_svg("<svg a='1'>\n  <g  b='2' />\n</svg>");
    assert_eq!(opt, r#"<svg a="1"><g b="2"/></svg>"#);
}

#[test]
fn data_uri_round_trip_and_prefix() {
    let uri = to_base64_data_uri("<svg/>");
    assert!(uri.starts_with("data:image/svg+xml;base64,"));
    assert_eq!(decode_base64_data_uri(&uri).unwrap(), b"<svg/>");
    assert!(decode_base64_data_uri("data:text/plain;base64,AAAA").is_none());
}

#[test]
fn optimized_output_parses_as_svg() {
    let f = frame(2, 2, &[RED, BLUE, CLEAR, [1, 2, 3, 128]]);
    let opt = optimize_svg(&img_to_svg(&f));
    crate::assets::decode::parse_svg(opt.as_bytes()).unwrap();
}
