//! Protocol constants
//!
//! Opcode and mode bytes for each command family, transfer layout sizes,
//! GATT identifiers of the device, and the limits enforced during command
//! validation.

// ============================================================================
// Frame layout
// ============================================================================

/// Size of the generic frame header: 4-byte little-endian payload length,
/// opcode byte, mode byte.
pub const FRAME_HEADER_LEN: usize = 6;

/// Default write budget per link write when the connection has not
/// negotiated anything better (common BLE 5 ATT payload).
pub const DEFAULT_MTU: usize = 244;

// ============================================================================
// Opcodes (host → device)
// ============================================================================

/// Still-image upload (DIY draw buffer).
pub const OP_IMAGE: u8 = 0;
/// Animation upload (timed frame sequence).
pub const OP_ANIMATION: u8 = 1;
/// Fullscreen color fill / eco-mode schedule (distinguished by mode byte).
pub const OP_COLOR: u8 = 2;
/// Freeze the current screen content / text upload (distinguished by mode byte).
pub const OP_SCREEN: u8 = 3;
/// Brightness / DIY draw-mode select (distinguished by mode byte).
pub const OP_SETTINGS: u8 = 4;
/// Graffiti single-pixel paint.
pub const OP_GRAFFITI: u8 = 5;
/// Clock face / screen flip (distinguished by mode byte).
pub const OP_CLOCK: u8 = 6;
/// Screen power.
pub const OP_POWER: u8 = 7;
/// Countdown timer.
pub const OP_COUNTDOWN: u8 = 8;
/// Chronograph (stopwatch).
pub const OP_CHRONOGRAPH: u8 = 9;
/// Scoreboard.
pub const OP_SCOREBOARD: u8 = 10;

// ============================================================================
// Mode bytes
// ============================================================================

/// Mode byte for media transfers (image, animation).
pub const MODE_TRANSFER: u8 = 0;
/// Mode byte for commands that carry no sub-mode.
pub const MODE_NONE: u8 = 0;
/// Mode byte for commands addressed at a built-in screen function.
pub const MODE_FUNCTION: u8 = 1;
/// Mode byte for fullscreen color fill.
pub const MODE_COLOR_FILL: u8 = 2;
/// Mode byte for device-setting commands (brightness, flip, eco, …).
pub const MODE_SETTING: u8 = 128;

// ============================================================================
// Media transfer layout
// ============================================================================

/// Media payloads are carried as a sequence of blocks of at most this many
/// data bytes, each prefixed by a [`TRANSFER_BLOCK_HEADER_LEN`]-byte header.
pub const TRANSFER_BLOCK_SIZE: usize = 4096;

/// Per-block transfer header: block length (u16 LE, header included), two
/// reserved bytes, continuation flag, total stream length (u32 LE).
pub const TRANSFER_BLOCK_HEADER_LEN: usize = 9;

/// Continuation-flag value of the first block in a transfer.
pub const TRANSFER_FLAG_FIRST: u8 = 0;
/// Continuation-flag value of every block after the first.
pub const TRANSFER_FLAG_CONTINUATION: u8 = 2;

// ============================================================================
// Validation limits
// ============================================================================

/// Lowest accepted brightness percentage. The panel blanks below this.
pub const MIN_BRIGHTNESS: u8 = 5;
/// Highest accepted brightness percentage.
pub const MAX_BRIGHTNESS: u8 = 100;

/// Maximum accepted scoreboard counter value.
pub const MAX_SCOREBOARD_COUNT: u16 = 999;

/// Maximum accepted text length in bytes (UTF-8).
pub const MAX_TEXT_LEN: usize = 512;

/// Maximum number of frames in one animation upload.
pub const MAX_ANIMATION_FRAMES: usize = 64;
/// Frame delay applied when an animation frame carries none.
pub const DEFAULT_FRAME_DELAY_MS: u16 = 200;
/// Shortest frame delay the device honors.
pub const MIN_FRAME_DELAY_MS: u16 = 20;
/// Longest frame delay the device honors.
pub const MAX_FRAME_DELAY_MS: u16 = 5000;

// ============================================================================
// GATT identifiers
// ============================================================================

/// Write characteristic carrying all host → device frames
/// (write-without-response).
pub const UUID_WRITE_DATA: &str = "0000fa02-0000-1000-8000-00805f9b34fb";
/// Notify characteristic the device pushes status on. The core never
/// subscribes; the device's reply format is not characterized.
pub const UUID_NOTIFY_DATA: &str = "0000fa03-0000-1000-8000-00805f9b34fb";

/// Advertised-name prefix the displays announce during discovery.
pub const DEVICE_NAME_PREFIX: &str = "IDM-";
