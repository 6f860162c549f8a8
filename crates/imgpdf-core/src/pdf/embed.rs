//! Image XObject construction.
//!
//! JPEG files with gray or RGB components are passed through untouched as
//! `DCTDecode` streams. Everything else is decoded and written as raw 8-bit
//! samples that `lopdf` Flate-compresses when the document is saved. An alpha
//! channel becomes a separate `SMask` image.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Object, Stream};

use crate::record::{Dimensions, ImageRecord};

/// An image ready to be added to a document.
pub struct ImageXObject {
    pub image: Stream,
    pub smask: Option<Stream>,
}

/// Build the XObject streams for `record`.
///
/// `dims` are the dimensions resolved during layout; a decoded image that
/// disagrees with them is refused.
pub fn image_xobject(record: &ImageRecord, dims: Dimensions) -> Result<ImageXObject, String> {
    if record.format() == ImageFormat::Jpeg
        && let Some(color_space) = jpeg_passthrough_color_space(record.bytes())?
    {
        let dict = image_dict(dims, color_space, Some("DCTDecode"));
        let image = Stream::new(dict, record.bytes().to_vec()).with_compression(false);
        return Ok(ImageXObject { image, smask: None });
    }

    let decoded = image::load_from_memory_with_format(record.bytes(), record.format())
        .map_err(|e| format!("failed to decode pixel data: {e}"))?;

    if decoded.width() != dims.width || decoded.height() != dims.height {
        return Err(format!(
            "decoded size {}x{} does not match header size {dims}",
            decoded.width(),
            decoded.height()
        ));
    }

    Ok(raw_xobject(&decoded, dims))
}

/// Color space for embedding a JPEG as-is, or `None` if it must be re-encoded.
fn jpeg_passthrough_color_space(bytes: &[u8]) -> Result<Option<&'static str>, String> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| format!("failed to read JPEG header: {e}"))?;

    Ok(match decoder.original_color_type() {
        ExtendedColorType::L8 => Some("DeviceGray"),
        ExtendedColorType::Rgb8 => Some("DeviceRGB"),
        // CMYK and friends need Decode arrays and inversion handling
        _ => None,
    })
}

fn raw_xobject(decoded: &DynamicImage, dims: Dimensions) -> ImageXObject {
    let color = decoded.color();

    if color.has_alpha() {
        let rgba = decoded.to_rgba8();
        let pixel_count = rgba.as_raw().len() / 4;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in rgba.as_raw().chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }

        let smask = Stream::new(image_dict(dims, "DeviceGray", None), alpha).with_compression(true);
        let image = Stream::new(image_dict(dims, "DeviceRGB", None), rgb).with_compression(true);
        return ImageXObject {
            image,
            smask: Some(smask),
        };
    }

    let (color_space, samples) = if color.has_color() {
        ("DeviceRGB", decoded.to_rgb8().into_raw())
    } else {
        ("DeviceGray", decoded.to_luma8().into_raw())
    };

    ImageXObject {
        image: Stream::new(image_dict(dims, color_space, None), samples).with_compression(true),
        smask: None,
    }
}

fn image_dict(dims: Dimensions, color_space: &str, filter: Option<&str>) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(dims.width)));
    dict.set("Height", Object::Integer(i64::from(dims.height)));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}
