//! In-memory test images
//!
//! Images are synthesized with the `image` encoders. EXIF blocks are written
//! by hand as little-endian TIFF and spliced into a JPEG APP1 segment, which
//! keeps the fixtures independent of any EXIF writer.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_SOFTWARE: u16 = 0x0131;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

/// Black/white checkerboard of 8px cells (aligned with JPEG blocks so lossy
/// encoding keeps the contrast). Brightness variance is 127.5^2 when the cell
/// count is even.
pub fn checkerboard(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Alternating gray levels `a` and `b`: variance ((a - b) / 2)^2 for even pixel counts
pub fn two_tone(width: u32, height: u32, a: u8, b: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = if (x + y) % 2 == 0 { a } else { b };
        Rgb([v, v, v])
    })
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode test image");
    buf
}

pub fn png(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Png)
}

pub fn jpeg(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Jpeg)
}

pub fn webp(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::WebP)
}

pub fn bmp(img: &RgbImage) -> Vec<u8> {
    encode(img, ImageFormat::Bmp)
}

pub fn gif(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(img.clone()).to_rgba8())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)
        .expect("encode test image");
    buf
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExifFields<'a> {
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    pub software: Option<&'a str>,
    pub date_time_original: Option<&'a str>,
}

/// JPEG carrying an EXIF block with the given fields
pub fn jpeg_with_exif(img: &RgbImage, fields: &ExifFields) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend(tiff(fields));
    jpeg_with_raw_app1(img, &payload)
}

/// JPEG with an arbitrary APP1 payload inserted right after SOI
pub fn jpeg_with_raw_app1(img: &RgbImage, payload: &[u8]) -> Vec<u8> {
    let body = jpeg(img);
    assert_eq!(&body[..2], &[0xFFu8, 0xD8], "encoder output must start with SOI");

    let length = u16::try_from(payload.len() + 2).expect("APP1 payload too large");
    let mut out = Vec::with_capacity(body.len() + payload.len() + 4);
    out.extend_from_slice(&body[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&body[2..]);
    out
}

/// Little-endian TIFF: IFD0 (Make, Model, Software) plus an Exif IFD (DateTimeOriginal)
pub fn tiff(fields: &ExifFields) -> Vec<u8> {
    let ifd0: Vec<(u16, &str)> = [
        (TAG_MAKE, fields.make),
        (TAG_MODEL, fields.model),
        (TAG_SOFTWARE, fields.software),
    ]
    .into_iter()
    .filter_map(|(tag, v)| v.map(|v| (tag, v)))
    .collect();
    let exif_ifd: Vec<(u16, &str)> = fields
        .date_time_original
        .map(|v| vec![(TAG_DATE_TIME_ORIGINAL, v)])
        .unwrap_or_default();

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    let has_pointer = !exif_ifd.is_empty();
    let ifd0_count = ifd0.len() + usize::from(has_pointer);
    let ifd0_data_start = 8 + ifd_size(ifd0_count);

    let mut data = Vec::new();
    let mut entries: Vec<[u8; 12]> = ifd0
        .iter()
        .map(|(tag, text)| ascii_entry(*tag, text, ifd0_data_start, &mut data))
        .collect();

    let exif_ifd_offset = ifd0_data_start + data.len();
    if has_pointer {
        entries.push(entry(TAG_EXIF_IFD, TYPE_LONG, 1, (exif_ifd_offset as u32).to_le_bytes()));
    }
    write_ifd(&mut out, &mut entries, &data);

    if has_pointer {
        let exif_data_start = exif_ifd_offset + ifd_size(exif_ifd.len());
        let mut data = Vec::new();
        let mut entries: Vec<[u8; 12]> = exif_ifd
            .iter()
            .map(|(tag, text)| ascii_entry(*tag, text, exif_data_start, &mut data))
            .collect();
        write_ifd(&mut out, &mut entries, &data);
    }

    out
}

fn ifd_size(count: usize) -> usize {
    2 + 12 * count + 4
}

fn entry(tag: u16, kind: u16, count: u32, value: [u8; 4]) -> [u8; 12] {
    let mut e = [0u8; 12];
    e[0..2].copy_from_slice(&tag.to_le_bytes());
    e[2..4].copy_from_slice(&kind.to_le_bytes());
    e[4..8].copy_from_slice(&count.to_le_bytes());
    e[8..12].copy_from_slice(&value);
    e
}

fn ascii_entry(tag: u16, text: &str, data_start: usize, data: &mut Vec<u8>) -> [u8; 12] {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    let count = bytes.len() as u32;

    if bytes.len() <= 4 {
        let mut inline = [0u8; 4];
        inline[..bytes.len()].copy_from_slice(&bytes);
        return entry(tag, TYPE_ASCII, count, inline);
    }

    let offset = (data_start + data.len()) as u32;
    data.extend_from_slice(&bytes);
    if data.len() % 2 == 1 {
        data.push(0);
    }
    entry(tag, TYPE_ASCII, count, offset.to_le_bytes())
}

fn write_ifd(out: &mut Vec<u8>, entries: &mut [[u8; 12]], data: &[u8]) {
    entries.sort_by_key(|e| u16::from_le_bytes([e[0], e[1]]));
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for e in entries.iter() {
        out.extend_from_slice(e);
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(data);
}

#[test]
fn test_tiff_layout() {
    let t = tiff(&ExifFields {
        make: Some("Canon"),
        date_time_original: Some("2024:01:01 00:00:00"),
        ..ExifFields::default()
    });

    assert_eq!(&t[..4], b"II*\0");
    // IFD0: Make + Exif pointer
    assert_eq!(u16::from_le_bytes([t[8], t[9]]), 2);
    // "Canon\0" lands right after IFD0
    let data_start = 8 + ifd_size(2);
    assert_eq!(&t[data_start..data_start + 6], b"Canon\0");
}
