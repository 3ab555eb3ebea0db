//! # Image Filtering Module
//!
//! Noise reduction for OCR preprocessing. Screenshots recompressed by
//! Telegram pick up JPEG artifacts that adaptive thresholding amplifies; a
//! small median filter removes them without blurring glyph edges the way a
//! box blur would.

use image::GrayImage;

/// Apply a 3x3 median filter to a grayscale image.
///
/// Border pixels use the part of the window that falls inside the image.
pub fn median_filter(gray: &GrayImage) -> GrayImage {
    let width = gray.width();
    let height = gray.height();
    let mut filtered = GrayImage::new(width, height);

    let mut window = [0u8; 9];
    for y in 0..height {
        for x in 0..width {
            let mut count = 0;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height {
                        window[count] = gray.get_pixel(nx as u32, ny as u32)[0];
                        count += 1;
                    }
                }
            }
            window[..count].sort_unstable();
            filtered.put_pixel(x, y, image::Luma([window[count / 2]]));
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter_removes_single_outlier() {
        // White image with one black pixel in the middle
        let mut img = GrayImage::from_pixel(5, 5, image::Luma([255]));
        img.put_pixel(2, 2, image::Luma([0]));

        let filtered = median_filter(&img);

        // The outlier is the minority of its 3x3 window, so it disappears
        assert_eq!(filtered.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_median_filter_preserves_uniform_regions() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([77]));
        let filtered = median_filter(&img);

        for pixel in filtered.pixels() {
            assert_eq!(pixel[0], 77);
        }
    }

    #[test]
    fn test_median_filter_preserves_dimensions() {
        let img = GrayImage::new(7, 3);
        let filtered = median_filter(&img);
        assert_eq!(filtered.dimensions(), (7, 3));
    }
}
