//! Commands that can be sent to the display.
//!
//! [`Command`] is the closed set of operation families the device
//! understands. Each variant carries typed parameters and maps onto a fixed
//! opcode/mode/payload layout; [`crate::FrameCodec::encode`] validates the
//! parameters and assembles the frame.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::types::*;

/// Commands that can be sent to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set panel brightness.
    Brightness {
        /// Brightness percentage, accepted range
        /// [`MIN_BRIGHTNESS`]..=[`MAX_BRIGHTNESS`].
        percent: u8,
    },

    /// Turn the screen on or off.
    ScreenPower {
        /// `true` to switch the panel on.
        on: bool,
    },

    /// Freeze or unfreeze the current screen content.
    ScreenFreeze,

    /// Rotate the panel output by 180 degrees.
    ScreenFlip {
        /// `true` for rotated output.
        flipped: bool,
    },

    /// Enter or leave the DIY draw buffer.
    SelectMode {
        /// Target draw mode.
        mode: DrawMode,
    },

    /// Fill the whole panel with one color.
    FullscreenColor {
        /// Fill color.
        color: Rgb,
    },

    /// Show a built-in clock face.
    Clock {
        /// Clock face to show.
        style: ClockStyle,
        /// Whether the date line is shown.
        show_date: bool,
        /// 24-hour format when `true`, 12-hour otherwise.
        hour24: bool,
        /// Digit color.
        color: Rgb,
    },

    /// Control the chronograph (stopwatch).
    Chronograph {
        /// Control action.
        action: ChronographAction,
    },

    /// Control the countdown timer.
    Countdown {
        /// Control action.
        action: CountdownAction,
        /// Minutes to count down from, 0..=59.
        minutes: u8,
        /// Seconds to count down from, 0..=59.
        seconds: u8,
    },

    /// Show the two-counter scoreboard.
    Scoreboard {
        /// First counter, at most [`MAX_SCOREBOARD_COUNT`].
        home: u16,
        /// Second counter, at most [`MAX_SCOREBOARD_COUNT`].
        away: u16,
    },

    /// Paint a single pixel on the graffiti board.
    GraffitiPixel {
        /// Pixel color.
        color: Rgb,
        /// Column, 0..panel side.
        x: u8,
        /// Row, 0..panel side.
        y: u8,
        /// Panel resolution the coordinates are validated against.
        size: DisplaySize,
    },

    /// Configure the scheduled low-brightness (eco) window.
    EcoMode {
        /// Whether the schedule is active.
        enabled: bool,
        /// Hour the window starts, 0..=23.
        start_hour: u8,
        /// Minute the window starts, 0..=59.
        start_minute: u8,
        /// Hour the window ends, 0..=23.
        end_hour: u8,
        /// Minute the window ends, 0..=59.
        end_minute: u8,
        /// Brightness inside the window.
        brightness: u8,
    },

    /// Show text on the device.
    Text {
        /// Text to display, at most [`MAX_TEXT_LEN`] UTF-8 bytes.
        text: String,
        /// Animation style.
        mode: TextMode,
        /// Animation speed.
        speed: u8,
        /// Color handling.
        color_mode: TextColorMode,
        /// Text color, used with [`TextColorMode::Fixed`].
        color: Rgb,
        /// Background color; `None` leaves the background black.
        background: Option<Rgb>,
    },

    /// Upload a still image into the DIY draw buffer.
    Image {
        /// Panel resolution the buffer is sized for.
        size: DisplaySize,
        /// RGB888 pixel data, exactly `size.frame_len()` bytes.
        pixels: Vec<u8>,
    },

    /// Upload a timed animation.
    Animation {
        /// Panel resolution the frames are sized for.
        size: DisplaySize,
        /// Frames in display order, 1..=[`MAX_ANIMATION_FRAMES`] entries.
        frames: Vec<TimedFrame>,
    },
}

impl Command {
    /// Check every parameter against its family's constraints.
    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Command::Brightness { percent } => range_check(
                "brightness percent",
                *percent as usize,
                MIN_BRIGHTNESS as usize,
                MAX_BRIGHTNESS as usize,
            ),
            Command::ScreenPower { .. }
            | Command::ScreenFreeze
            | Command::ScreenFlip { .. }
            | Command::SelectMode { .. }
            | Command::FullscreenColor { .. }
            | Command::Clock { .. }
            | Command::Chronograph { .. } => Ok(()),
            Command::Scoreboard { home, away } => {
                range_check(
                    "scoreboard home counter",
                    *home as usize,
                    0,
                    MAX_SCOREBOARD_COUNT as usize,
                )?;
                range_check(
                    "scoreboard away counter",
                    *away as usize,
                    0,
                    MAX_SCOREBOARD_COUNT as usize,
                )
            }
            Command::Countdown { minutes, seconds, .. } => {
                range_check("countdown minutes", *minutes as usize, 0, 59)?;
                range_check("countdown seconds", *seconds as usize, 0, 59)
            }
            Command::GraffitiPixel { x, y, size, .. } => {
                let max = size.side() as usize - 1;
                range_check("graffiti x", *x as usize, 0, max)?;
                range_check("graffiti y", *y as usize, 0, max)
            }
            Command::EcoMode {
                start_hour,
                start_minute,
                end_hour,
                end_minute,
                ..
            } => {
                range_check("eco start hour", *start_hour as usize, 0, 23)?;
                range_check("eco start minute", *start_minute as usize, 0, 59)?;
                range_check("eco end hour", *end_hour as usize, 0, 23)?;
                range_check("eco end minute", *end_minute as usize, 0, 59)
            }
            Command::Text { text, .. } => range_check("text length", text.len(), 1, MAX_TEXT_LEN),
            Command::Image { size, pixels } => range_check(
                "image pixel buffer length",
                pixels.len(),
                size.frame_len(),
                size.frame_len(),
            ),
            Command::Animation { size, frames } => {
                range_check("animation frame count", frames.len(), 1, MAX_ANIMATION_FRAMES)?;
                for frame in frames {
                    range_check(
                        "animation pixel buffer length",
                        frame.pixels.len(),
                        size.frame_len(),
                        size.frame_len(),
                    )?;
                    range_check(
                        "animation frame delay",
                        frame.delay_ms as usize,
                        MIN_FRAME_DELAY_MS as usize,
                        MAX_FRAME_DELAY_MS as usize,
                    )?;
                }
                Ok(())
            }
        }
    }

    /// Opcode byte of this command's family.
    pub(crate) fn opcode(&self) -> u8 {
        match self {
            Command::Image { .. } => OP_IMAGE,
            Command::Animation { .. } => OP_ANIMATION,
            Command::FullscreenColor { .. } | Command::EcoMode { .. } => OP_COLOR,
            Command::ScreenFreeze | Command::Text { .. } => OP_SCREEN,
            Command::Brightness { .. } | Command::SelectMode { .. } => OP_SETTINGS,
            Command::GraffitiPixel { .. } => OP_GRAFFITI,
            Command::Clock { .. } | Command::ScreenFlip { .. } => OP_CLOCK,
            Command::ScreenPower { .. } => OP_POWER,
            Command::Countdown { .. } => OP_COUNTDOWN,
            Command::Chronograph { .. } => OP_CHRONOGRAPH,
            Command::Scoreboard { .. } => OP_SCOREBOARD,
        }
    }

    /// Mode byte of this command's family.
    pub(crate) fn mode(&self) -> u8 {
        match self {
            Command::Image { .. } | Command::Animation { .. } => MODE_TRANSFER,
            Command::ScreenFreeze => MODE_NONE,
            Command::ScreenPower { .. }
            | Command::SelectMode { .. }
            | Command::Clock { .. }
            | Command::GraffitiPixel { .. }
            | Command::Text { .. } => MODE_FUNCTION,
            Command::FullscreenColor { .. } => MODE_COLOR_FILL,
            Command::Brightness { .. }
            | Command::ScreenFlip { .. }
            | Command::Chronograph { .. }
            | Command::Countdown { .. }
            | Command::Scoreboard { .. }
            | Command::EcoMode { .. } => MODE_SETTING,
        }
    }

    /// Build the opcode-defined payload. Assumes [`Command::validate`] passed.
    pub(crate) fn payload(&self) -> Vec<u8> {
        match self {
            Command::Brightness { percent } => vec![*percent],
            Command::ScreenPower { on } => vec![*on as u8],
            Command::ScreenFreeze => Vec::new(),
            Command::ScreenFlip { flipped } => vec![*flipped as u8],
            Command::SelectMode { mode } => vec![mode.as_byte()],
            Command::FullscreenColor { color } => vec![color.r, color.g, color.b],
            Command::Clock {
                style,
                show_date,
                hour24,
                color,
            } => {
                let mut flags = style.as_byte();
                if *show_date {
                    flags |= 0x80;
                }
                if *hour24 {
                    flags |= 0x40;
                }
                vec![flags, color.r, color.g, color.b]
            }
            Command::Chronograph { action } => vec![action.as_byte()],
            Command::Countdown {
                action,
                minutes,
                seconds,
            } => vec![action.as_byte(), *minutes, *seconds],
            Command::Scoreboard { home, away } => {
                let home = home.to_le_bytes();
                let away = away.to_le_bytes();
                vec![home[0], home[1], away[0], away[1]]
            }
            Command::GraffitiPixel { color, x, y, .. } => {
                vec![0, color.r, color.g, color.b, *x, *y]
            }
            Command::EcoMode {
                enabled,
                start_hour,
                start_minute,
                end_hour,
                end_minute,
                brightness,
            } => vec![
                *enabled as u8,
                *start_hour,
                *start_minute,
                *end_hour,
                *end_minute,
                *brightness,
            ],
            Command::Text {
                text,
                mode,
                speed,
                color_mode,
                color,
                background,
            } => {
                let char_count = (text.chars().count() as u16).to_le_bytes();
                let bg = background.unwrap_or(Rgb::BLACK);
                let mut payload = vec![
                    char_count[0],
                    char_count[1],
                    0,
                    1,
                    mode.as_byte(),
                    *speed,
                    color_mode.as_byte(),
                    color.r,
                    color.g,
                    color.b,
                    background.is_some() as u8,
                    bg.r,
                    bg.g,
                    bg.b,
                ];
                payload.extend_from_slice(text.as_bytes());
                payload
            }
            Command::Image { pixels, .. } => transfer_blocks(pixels),
            Command::Animation { frames, .. } => {
                let mut stream =
                    Vec::with_capacity(2 + frames.len() * 2 + frames.iter().map(|f| f.pixels.len()).sum::<usize>());
                stream.extend_from_slice(&(frames.len() as u16).to_le_bytes());
                for frame in frames {
                    stream.extend_from_slice(&frame.delay_ms.to_le_bytes());
                }
                for frame in frames {
                    stream.extend_from_slice(&frame.pixels);
                }
                transfer_blocks(&stream)
            }
        }
    }
}

/// Lay a media stream out as transfer blocks.
///
/// The stream is cut into blocks of at most [`TRANSFER_BLOCK_SIZE`] data
/// bytes, each prefixed with the 9-byte transfer header: block length
/// (u16 LE, header included), two reserved bytes, continuation flag, total
/// stream length (u32 LE).
fn transfer_blocks(stream: &[u8]) -> Vec<u8> {
    let total_len = (stream.len() as u32).to_le_bytes();
    let block_count = stream.len().div_ceil(TRANSFER_BLOCK_SIZE);
    let mut out = Vec::with_capacity(stream.len() + block_count * TRANSFER_BLOCK_HEADER_LEN);

    for (index, block) in stream.chunks(TRANSFER_BLOCK_SIZE).enumerate() {
        let block_len = ((block.len() + TRANSFER_BLOCK_HEADER_LEN) as u16).to_le_bytes();
        out.extend_from_slice(&block_len);
        out.extend_from_slice(&[0, 0]);
        out.push(if index == 0 {
            TRANSFER_FLAG_FIRST
        } else {
            TRANSFER_FLAG_CONTINUATION
        });
        out.extend_from_slice(&total_len);
        out.extend_from_slice(block);
    }
    out
}

fn range_check(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ProtocolError> {
    if value < min || value > max {
        return Err(ProtocolError::InvalidParameter {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
