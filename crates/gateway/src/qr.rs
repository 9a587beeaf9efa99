//! Handshake-code rendering.
//!
//! The engine hands us an opaque code string; end users scan it with a
//! companion device, so the transport serves it as a PNG data URL that
//! drops straight into an `<img src>`.

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    image::{ExtendedColorType, ImageEncoder, Luma, codecs::png::PngEncoder},
    qrcode::QrCode,
};

const MIN_EDGE_PX: u32 = 240;

/// Render a handshake code as a `data:image/png;base64,…` URL.
pub fn handshake_data_url(code: &str) -> anyhow::Result<String> {
    let qr = QrCode::new(code.as_bytes())?;
    let img = qr
        .render::<Luma<u8>>()
        .min_dimensions(MIN_EDGE_PX, MIN_EDGE_PX)
        .build();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::L8,
    )?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}
