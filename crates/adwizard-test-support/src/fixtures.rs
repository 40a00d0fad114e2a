//! Schema payloads and image bytes shared by tests.

use std::io::Cursor;

use adwizard_schema::CategorySchema;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Payload of the `otomobil` vehicle category.
#[must_use]
pub fn vehicle_schema_json() -> serde_json::Value {
    serde_json::json!({
        "category": "otomobil",
        "module": "vehicle",
        "core": {
            "title": { "required": true, "min_len": 5, "max_len": 100 },
            "description": { "required": false, "max_len": 5000 },
            "price": {
                "required": true,
                "min": 100.0,
                "max": 10_000_000.0,
                "decimals": 2,
                "currencies": ["EUR"]
            },
            "address_required": true
        },
        "taxonomy": { "year_min": 1950, "year_max": 2027, "trim_required": false },
        "attributes": [
            {
                "key": "fuel",
                "label": "Fuel",
                "kind": "select",
                "required": true,
                "options": ["petrol", "diesel", "electric"]
            },
            {
                "key": "mileage",
                "label": "Mileage",
                "kind": "number",
                "min": 0.0,
                "max": 2_000_000.0,
                "decimals": 0
            },
            {
                "key": "battery_kwh",
                "label": "Battery capacity",
                "kind": "number",
                "required_when": { "field": "fuel", "equals": "electric" },
                "min": 1.0,
                "max": 300.0,
                "decimals": 1
            }
        ],
        "feature_groups": [
            {
                "key": "comfort",
                "label": "Comfort",
                "options": ["navigation", "heated_seats", "sunroof"]
            },
            {
                "key": "safety",
                "label": "Safety",
                "options": ["abs", "lane_assist"]
            }
        ]
    })
}

/// Payload of the `daire` real-estate category.
#[must_use]
pub fn generic_schema_json() -> serde_json::Value {
    serde_json::json!({
        "category": "daire",
        "module": "generic",
        "module_key": "real_estate",
        "core": {
            "title": { "required": true, "min_len": 5, "max_len": 100 },
            "price": { "min": 1.0, "decimals": 0, "currencies": ["EUR", "TRY"] },
            "address_required": true
        },
        "attributes": [
            { "key": "rooms", "label": "Rooms", "kind": "number", "required": true, "min": 1.0 },
            { "key": "furnished", "label": "Furnished", "kind": "boolean" }
        ],
        "feature_groups": [
            { "key": "outdoor", "label": "Outdoor", "options": ["balcony", "garden"] }
        ]
    })
}

/// Parsed vehicle schema.
///
/// # Panics
///
/// Panics if the fixture payload is invalid.
#[must_use]
pub fn vehicle_schema() -> CategorySchema {
    CategorySchema::from_json(vehicle_schema_json()).expect("vehicle fixture schema is valid")
}

/// Parsed generic schema.
///
/// # Panics
///
/// Panics if the fixture payload is invalid.
#[must_use]
pub fn generic_schema() -> CategorySchema {
    CategorySchema::from_json(generic_schema_json()).expect("generic fixture schema is valid")
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_possible_truncation)]
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A JPEG of the given size carrying an APP1 Exif segment with a fake GPS
/// marker.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 90))
        .expect("fixture jpeg encodes");
    let encoded = encoded.into_inner();

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(b"MM\0*GPS 52.5200N 13.4050E");
    let length = u16::try_from(payload.len() + 2).expect("exif payload fits a segment");

    let mut out = Vec::with_capacity(encoded.len() + payload.len() + 4);
    out.extend_from_slice(&encoded[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&encoded[2..]);
    out
}

/// A PNG of the given size.
///
/// # Panics
///
/// Panics if encoding fails.
#[must_use]
pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut encoded, ImageFormat::Png)
        .expect("fixture png encodes");
    encoded.into_inner()
}
