//! Tray icon drawing.

use crate::models::TimerMode;
use thiserror::Error;
use tray_icon::Icon;

/// Standard macOS tray icon size.
const ICON_SIZE: u32 = 22;

#[derive(Error, Debug)]
pub enum TrayError {
    #[error("Failed to load icon: {0}")]
    IconLoad(#[from] tray_icon::BadIcon),
}

/// Fill colour of the icon for each mode.
pub fn mode_color(mode: TimerMode) -> [u8; 3] {
    match mode {
        TimerMode::Focus => [220, 50, 47],
        TimerMode::ShortBreak => [76, 153, 0],
        TimerMode::LongBreak => [38, 139, 210],
    }
}

/// Builds a round icon tinted for `mode`.
pub fn icon_for(mode: TimerMode) -> Result<Icon, TrayError> {
    let rgba = disc_rgba(ICON_SIZE, mode_color(mode));
    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).map_err(TrayError::IconLoad)
}

/// RGBA pixels of an anti-aliased filled circle on a transparent background.
fn disc_rgba(size: u32, [r, g, b]: [u8; 3]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    let center = size as f32 / 2.0;
    let radius = center - 2.0;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let alpha = if distance <= radius {
                255
            } else if distance <= radius + 1.0 {
                ((radius + 1.0 - distance) * 255.0) as u8
            } else {
                0
            };
            rgba.extend_from_slice(&[r, g, b, alpha]);
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_for_every_mode() {
        for mode in TimerMode::ALL {
            assert!(icon_for(mode).is_ok());
        }
    }

    #[test]
    fn test_disc_is_opaque_in_center_and_clear_in_corner() {
        let rgba = disc_rgba(ICON_SIZE, [1, 2, 3]);
        assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);

        let center = ((ICON_SIZE / 2 * ICON_SIZE + ICON_SIZE / 2) * 4) as usize;
        assert_eq!(&rgba[center..center + 4], &[1, 2, 3, 255]);
        assert_eq!(rgba[3], 0);
    }

    #[test]
    fn test_modes_have_distinct_colors() {
        assert_ne!(mode_color(TimerMode::Focus), mode_color(TimerMode::ShortBreak));
        assert_ne!(mode_color(TimerMode::ShortBreak), mode_color(TimerMode::LongBreak));
    }
}
