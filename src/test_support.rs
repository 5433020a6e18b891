//! Fixtures shared by unit tests

#![allow(clippy::unwrap_used)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// PNG-encode a solid image
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// PNG-encode an opaque red image
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    solid_png(width, height, [255, 0, 0, 255])
}
