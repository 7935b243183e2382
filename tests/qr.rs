//! QR generation, checked by decoding the written PNG.

use image::{GenericImageView, Rgba, RgbaImage};
use quickconvert::{generate, ConvertError, LogoOutcome, QrStyle, DEFAULT_QR_PAYLOAD};
use std::path::Path;

/// Decode the QR symbol in the PNG at `path`.
fn decode(path: &Path) -> String {
    let img = image::open(path).expect("output is a readable image").to_luma8();
    let (w, h) = img.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        img.get_pixel(x as u32, y as u32)[0]
    });
    prepared
        .detect_grids()
        .iter()
        .find_map(|grid| grid.decode().ok())
        .map(|(_meta, content)| content)
        .unwrap_or_else(|| panic!("no decodable symbol in {}", path.display()))
}

fn solid_logo(path: &Path, side: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(side, side, Rgba(color)).save(path).unwrap();
}

#[test]
fn plain_url_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("example_qr.png");

    let outcome = generate("https://example.com", None, &out, &QrStyle::default()).unwrap();

    assert_eq!(decode(&out), "https://example.com");
    assert_eq!(outcome.logo, LogoOutcome::None);
    assert_eq!(outcome.version, 4);
    // Version 4 is 33 modules; 10 px each plus a 4-module border on both sides.
    assert_eq!((outcome.width, outcome.height), (410, 410));
}

#[test]
fn non_ascii_payload_round_trips_as_utf8() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("unicode_qr.png");
    let payload = "https://example.com/café?q=日本語";

    let outcome = generate(payload, None, &out, &QrStyle::default()).unwrap();

    assert_eq!(outcome.payload, payload);
    assert_eq!(decode(&out), payload);
}

#[test]
fn empty_payload_encodes_fallback_url() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("empty_qr.png");

    let outcome = generate("", None, &out, &QrStyle::default()).unwrap();

    assert_eq!(outcome.payload, DEFAULT_QR_PAYLOAD);
    assert_eq!(decode(&out), "https://google.com");
}

#[test]
fn opaque_logo_is_badged_and_symbol_still_scans() {
    let tmp = tempfile::tempdir().unwrap();
    let logo = tmp.path().join("logo.png");
    solid_logo(&logo, 500, [200, 30, 30, 255]);
    let plain = tmp.path().join("plain.png");
    let badged = tmp.path().join("badged.png");
    let style = QrStyle::default();

    let plain_outcome = generate("https://example.com", None, &plain, &style).unwrap();
    let outcome = generate("https://example.com", Some(&logo), &badged, &style).unwrap();

    assert_eq!(decode(&badged), "https://example.com");
    let img = image::open(&badged).unwrap();
    assert_eq!(img.dimensions(), (plain_outcome.width, plain_outcome.height));

    let LogoOutcome::Embedded(badge) = outcome.logo else {
        panic!("logo not embedded: {:?}", outcome.logo);
    };
    let third = outcome.width / 3;
    assert!(badge.logo_width <= third && badge.logo_height <= third);
    assert!(badge.width * 100 <= (outcome.width - 80) * style.max_badge_coverage);
    assert_eq!(badge.width, badge.logo_width + 2 * style.badge_padding);

    // Badge centred within a pixel.
    let centre_x = badge.x + badge.width as i64 / 2;
    let centre_y = badge.y + badge.height as i64 / 2;
    assert!((centre_x - outcome.width as i64 / 2).abs() <= 1);
    assert!((centre_y - outcome.height as i64 / 2).abs() <= 1);

    // White padding just inside the badge edge, logo colour at the centre.
    let pad = img.get_pixel(badge.x as u32 + style.badge_padding / 2, centre_y as u32);
    assert_eq!(pad, Rgba([255, 255, 255, 255]));
    let mid = img.get_pixel(centre_x as u32, centre_y as u32);
    let close = mid.0.iter().zip([200u8, 30, 30, 255]).all(|(a, e)| a.abs_diff(e) <= 1);
    assert!(close, "logo colour expected at the centre, got {mid:?}");
}

#[test]
fn corrupt_logo_still_yields_scannable_code() {
    let tmp = tempfile::tempdir().unwrap();
    let logo = tmp.path().join("logo.png");
    std::fs::write(&logo, b"\x89PNG but then garbage").unwrap();
    let out = tmp.path().join("qr.png");

    let outcome = generate("https://example.com/menu", Some(&logo), &out, &QrStyle::default())
        .unwrap();

    assert!(matches!(outcome.logo, LogoOutcome::Failed(_)));
    assert_eq!(decode(&out), "https://example.com/menu");
}

#[test]
fn long_payloads_decode_at_higher_versions() {
    let tmp = tempfile::tempdir().unwrap();
    let logo = tmp.path().join("logo.png");
    solid_logo(&logo, 64, [0, 0, 0, 255]);

    for (i, len) in [1usize, 60, 300].into_iter().enumerate() {
        let payload: String = "https://example.com/?q="
            .chars()
            .chain(std::iter::repeat('x'))
            .take(len.max(23))
            .collect();
        let out = tmp.path().join(format!("qr_{i}.png"));
        let outcome = generate(&payload, Some(&logo), &out, &QrStyle::default()).unwrap();
        assert!(outcome.version >= 4);
        assert_eq!(decode(&out), payload, "payload of {} bytes", payload.len());
    }
}

#[test]
fn payload_beyond_capacity_is_rejected_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("huge.png");
    let payload = "x".repeat(4000);

    let err = generate(&payload, None, &out, &QrStyle::default()).unwrap_err();

    assert!(matches!(err, ConvertError::PayloadTooLong { len: 4000 }));
    assert!(!out.exists());
}
