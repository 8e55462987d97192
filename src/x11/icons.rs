//! `_NET_WM_ICON` decoding
//!
//! The property is a list of icons, each `width, height` followed by
//! `width * height` ARGB pixels. The largest complete icon wins.

use tracing::debug;

use crate::shared::IconImage;

/// Upper bound on a single embedded icon (1 megapixel)
const MAX_ICON_PIXELS: usize = 1024 * 1024;

/// Pick the largest well-formed icon from raw `_NET_WM_ICON` data
pub fn parse_net_wm_icon(data: &[u32]) -> Option<IconImage> {
    let mut best: Option<(u32, u32, &[u32])> = None;
    let mut rest = data;

    while let [width, height, tail @ ..] = rest {
        let (width, height) = (*width, *height);
        let Some(count) = (width as usize).checked_mul(height as usize) else {
            break;
        };
        if count == 0 || count > MAX_ICON_PIXELS || count > tail.len() {
            debug!(width, height, "Ignoring truncated or oversized window icon");
            break;
        }
        let (pixels, next) = tail.split_at(count);
        if best.map_or(true, |(w, h, _)| count > (w * h) as usize) {
            best = Some((width, height, pixels));
        }
        rest = next;
    }

    best.and_then(|(width, height, pixels)| IconImage::from_argb(width, height, pixels).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon(width: u32, height: u32, pixel: u32) -> Vec<u32> {
        let mut data = vec![width, height];
        data.extend(std::iter::repeat(pixel).take((width * height) as usize));
        data
    }

    #[test]
    fn test_largest_icon_is_chosen() {
        let mut data = icon(16, 16, 0xFF00_00FF);
        data.extend(icon(48, 48, 0xFFFF_0000));
        data.extend(icon(32, 32, 0xFF00_FF00));

        let image = parse_net_wm_icon(&data).unwrap();
        assert_eq!((image.width(), image.height()), (48, 48));
        assert_eq!(image.pixels().get_pixel(0, 0).0, [0xFF, 0, 0, 0xFF]);
    }

    #[test]
    fn test_truncated_trailing_icon_is_ignored() {
        let mut data = icon(2, 2, 0x8000_0000);
        data.extend([64, 64, 1, 2, 3]);
        let image = parse_net_wm_icon(&data).unwrap();
        assert_eq!(image.width(), 2);
    }

    #[test]
    fn test_empty_or_garbage_yields_none() {
        assert!(parse_net_wm_icon(&[]).is_none());
        assert!(parse_net_wm_icon(&[0, 0]).is_none());
        assert!(parse_net_wm_icon(&[u32::MAX, u32::MAX, 1]).is_none());
    }
}
