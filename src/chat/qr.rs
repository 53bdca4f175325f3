//! Pairing code rendering.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::{svg, unicode};
use qrcode::types::QrError;

/// Minimum edge of the rendered SVG, in pixels.
const SVG_MIN_SIZE: u32 = 256;

/// Render `code` as an SVG `data:` URL suitable for an `<img src>`.
///
/// # Errors
/// Returns an error if the payload does not fit in a QR code.
pub fn to_data_url(code: &str) -> Result<String, QrError> {
    let qr = QrCode::new(code.as_bytes())?;
    let image = qr
        .render::<svg::Color<'_>>()
        .min_dimensions(SVG_MIN_SIZE, SVG_MIN_SIZE)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image.as_bytes())
    ))
}

/// Render `code` as block characters for a terminal.
///
/// # Errors
/// Returns an error if the payload does not fit in a QR code.
pub fn to_terminal(code: &str) -> Result<String, QrError> {
    let qr = QrCode::new(code.as_bytes())?;
    Ok(qr
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
