//! Image encoding: [`Attachment`] → base64 `ImageData` for the vision API.
//!
//! Screenshots arrive as raw PNG/JPEG bytes and are forwarded unchanged; the
//! only work is base64-wrapping them with the sniffed MIME type. `detail:
//! "high"` lets GPT-4-class models tile the image instead of reading a single
//! 512 px overview, which matters for small text in page screenshots.

use crate::pipeline::merge::Attachment;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode an attachment as inline base64 image data.
pub fn encode_attachment(attachment: &Attachment) -> ImageData {
    let b64 = STANDARD.encode(&attachment.bytes);
    debug!(
        "Encoded {} attachment → {} bytes base64",
        attachment.mime_type,
        b64.len()
    );
    ImageData::new(b64, attachment.mime_type.as_str()).with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn encode_small_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");

        let data = encode_attachment(&Attachment::from_bytes(buf.clone()));
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, buf);
    }
}
