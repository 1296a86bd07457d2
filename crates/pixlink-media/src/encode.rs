//! Raster-to-device encoding.
//!
//! Every input frame is resized to the square panel resolution and packed
//! as RGB888 (alpha dropped; the display is opaque). Stills resample with
//! Lanczos3; animation frames use nearest-neighbor to avoid smearing
//! palette colors across frames.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, GenericImageView};
use log::{debug, warn};

use pixlink_protocol::{
    DisplaySize, TimedFrame, DEFAULT_FRAME_DELAY_MS, MAX_ANIMATION_FRAMES, MAX_FRAME_DELAY_MS,
    MIN_FRAME_DELAY_MS,
};

use crate::error::CodecError;

/// Encodes raster media into device pixel buffers.
pub struct ImageCodec;

impl ImageCodec {
    /// Encode a media file for the given panel.
    ///
    /// GIF files are treated as animations, everything else as a still.
    /// A still yields exactly one frame with delay zero.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnsupportedFormat`] for unreadable or unrecognized
    /// files, [`CodecError::UnsupportedSize`] for zero-dimension rasters.
    pub fn encode_file(path: &Path, size: DisplaySize) -> Result<Vec<TimedFrame>, CodecError> {
        let data = std::fs::read(path)?;
        let is_gif = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));
        if is_gif {
            Self::encode_animation_bytes(&data, size)
        } else {
            Ok(vec![Self::encode_still_bytes(&data, size)?])
        }
    }

    /// Encode an in-memory still image.
    pub fn encode_still_bytes(data: &[u8], size: DisplaySize) -> Result<TimedFrame, CodecError> {
        let image = image::load_from_memory(data)?;
        Self::encode_still(&image, size)
    }

    /// Encode a decoded still image.
    pub fn encode_still(
        image: &DynamicImage,
        size: DisplaySize,
    ) -> Result<TimedFrame, CodecError> {
        Ok(TimedFrame {
            pixels: pack_rgb(image, size, FilterType::Lanczos3)?,
            delay_ms: 0,
        })
    }

    /// Encode an in-memory GIF animation.
    ///
    /// Authored per-frame delays are clamped to the device's supported
    /// range; frames beyond the device's cap are dropped.
    pub fn encode_animation_bytes(
        data: &[u8],
        size: DisplaySize,
    ) -> Result<Vec<TimedFrame>, CodecError> {
        let decoder = GifDecoder::new(Cursor::new(data))?;
        let frames = decoder.into_frames().collect_frames()?;

        let decoded = frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay_ms = if denom == 0 { 0 } else { numer / denom };
                (DynamicImage::ImageRgba8(frame.into_buffer()), delay_ms)
            })
            .collect();

        Self::encode_frames(decoded, size)
    }

    /// Encode a sequence of decoded raster frames with authored delays
    /// in milliseconds (zero meaning "not authored").
    pub fn encode_frames(
        frames: Vec<(DynamicImage, u32)>,
        size: DisplaySize,
    ) -> Result<Vec<TimedFrame>, CodecError> {
        if frames.is_empty() {
            return Err(CodecError::UnsupportedFormat {
                reason: "animation contains no frames".to_string(),
            });
        }

        let total = frames.len();
        if total > MAX_ANIMATION_FRAMES {
            warn!(
                "animation has {} frames, keeping the first {}",
                total, MAX_ANIMATION_FRAMES
            );
        }

        let mut out = Vec::with_capacity(total.min(MAX_ANIMATION_FRAMES));
        for (image, delay_ms) in frames.into_iter().take(MAX_ANIMATION_FRAMES) {
            out.push(TimedFrame {
                pixels: pack_rgb(&image, size, FilterType::Nearest)?,
                delay_ms: clamp_delay(delay_ms),
            });
        }
        debug!("encoded {} animation frame(s) at {}px", out.len(), size.side());
        Ok(out)
    }
}

/// Resize to the square panel resolution and pack as RGB888.
fn pack_rgb(
    image: &DynamicImage,
    size: DisplaySize,
    filter: FilterType,
) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(CodecError::UnsupportedSize { width, height });
    }

    let side = size.side();
    let resized = if (width, height) == (side, side) {
        image.clone()
    } else {
        image.resize_exact(side, side, filter)
    };
    Ok(resized.to_rgb8().into_raw())
}

/// Clamp an authored delay to the device's supported range; an unauthored
/// (zero) delay falls back to the default.
fn clamp_delay(delay_ms: u32) -> u16 {
    if delay_ms == 0 {
        return DEFAULT_FRAME_DELAY_MS;
    }
    let delay = u16::try_from(delay_ms).unwrap_or(u16::MAX);
    delay.clamp(MIN_FRAME_DELAY_MS, MAX_FRAME_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgb, RgbImage, Rgba, RgbaImage};

    fn solid_rgba(width: u32, height: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(px))
    }

    #[test]
    fn test_still_is_resized_to_panel_with_zero_delay() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([1, 2, 3])));
        let frame =
            ImageCodec::encode_still(&image, DisplaySize::Size64).expect("still should encode");
        assert_eq!(frame.pixels.len(), 64 * 64 * 3);
        assert_eq!(frame.delay_ms, 0);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let image = DynamicImage::ImageRgba8(solid_rgba(16, 16, [9, 8, 7, 0]));
        let frame =
            ImageCodec::encode_still(&image, DisplaySize::Size16).expect("still should encode");
        assert_eq!(&frame.pixels[..3], &[9, 8, 7]);
    }

    #[test]
    fn test_zero_dimension_input_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        let err = ImageCodec::encode_still(&image, DisplaySize::Size16).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedSize {
                width: 0,
                height: 10
            }
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err =
            ImageCodec::encode_still_bytes(b"definitely not an image", DisplaySize::Size16)
                .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_frame_delays_are_clamped() {
        let frames = vec![
            (DynamicImage::ImageRgba8(solid_rgba(4, 4, [1, 1, 1, 255])), 5),
            (DynamicImage::ImageRgba8(solid_rgba(4, 4, [2, 2, 2, 255])), 60_000),
            (DynamicImage::ImageRgba8(solid_rgba(4, 4, [3, 3, 3, 255])), 0),
        ];
        let encoded =
            ImageCodec::encode_frames(frames, DisplaySize::Size16).expect("frames should encode");
        assert_eq!(encoded[0].delay_ms, MIN_FRAME_DELAY_MS);
        assert_eq!(encoded[1].delay_ms, MAX_FRAME_DELAY_MS);
        assert_eq!(encoded[2].delay_ms, DEFAULT_FRAME_DELAY_MS);
    }

    #[test]
    fn test_frame_count_is_capped() {
        let frames = (0..MAX_ANIMATION_FRAMES + 6)
            .map(|_| (DynamicImage::ImageRgba8(solid_rgba(4, 4, [1, 1, 1, 255])), 100))
            .collect();
        let encoded =
            ImageCodec::encode_frames(frames, DisplaySize::Size16).expect("frames should encode");
        assert_eq!(encoded.len(), MAX_ANIMATION_FRAMES);
    }

    #[test]
    fn test_empty_animation_rejected() {
        let err = ImageCodec::encode_frames(Vec::new(), DisplaySize::Size16).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_gif_round_trip_keeps_frame_order_and_delays() {
        let mut gif_bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut gif_bytes);
            let frames = vec![
                Frame::from_parts(
                    solid_rgba(8, 8, [255, 0, 0, 255]),
                    0,
                    0,
                    Delay::from_numer_denom_ms(300, 1),
                ),
                Frame::from_parts(
                    solid_rgba(8, 8, [0, 0, 255, 255]),
                    0,
                    0,
                    Delay::from_numer_denom_ms(400, 1),
                ),
            ];
            encoder.encode_frames(frames).expect("gif should encode");
        }

        let encoded = ImageCodec::encode_animation_bytes(&gif_bytes, DisplaySize::Size16)
            .expect("gif should decode");
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0].delay_ms, 300);
        assert_eq!(encoded[1].delay_ms, 400);
        for frame in &encoded {
            assert_eq!(frame.pixels.len(), DisplaySize::Size16.frame_len());
        }
        // first frame is red-dominant, second blue-dominant
        assert!(encoded[0].pixels[0] > 200);
        assert!(encoded[1].pixels[2] > 200);
    }
}
