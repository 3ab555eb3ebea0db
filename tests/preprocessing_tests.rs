//! # Preprocessing Integration Tests
//!
//! Tests the crop → grayscale → binarize chain on synthesized screenshots,
//! including the file-backed entry point used by the verifier.

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb, RgbImage};
    use tube_rewards::preprocessing::{
        binarize, crop_roi, preprocess_file, preprocess_image, PreprocessingError, RoiFractions,
        ThresholdMode,
    };

    /// A light background with a dark "badge" block in the ROI band
    fn synthetic_screenshot(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([230, 230, 230]));
        for x in (width / 10)..(width / 3) {
            for y in (height / 5)..(height / 3) {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_full_chain_produces_binary_roi() {
        let img = synthetic_screenshot(640, 480);
        let processed = preprocess_image(
            &img,
            &RoiFractions::default(),
            ThresholdMode::Fixed(128),
        )
        .expect("preprocessing should succeed");

        // Default ROI of 640x480: 512 wide, 192 tall
        assert_eq!(processed.width(), 512);
        assert_eq!(processed.height(), 192);

        let gray = processed.to_luma8();
        let mut has_black = false;
        let mut has_white = false;
        for pixel in gray.pixels() {
            match pixel[0] {
                0 => has_black = true,
                255 => has_white = true,
                other => panic!("non-binary pixel value {}", other),
            }
        }
        assert!(has_black && has_white, "both classes should survive the crop");
    }

    #[test]
    fn test_adaptive_mode_full_chain() {
        let img = synthetic_screenshot(320, 240);
        let processed = preprocess_image(&img, &RoiFractions::default(), ThresholdMode::Adaptive)
            .expect("adaptive preprocessing should succeed");

        for pixel in processed.to_luma8().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_preprocess_file_roundtrip() {
        let img = synthetic_screenshot(200, 150);
        let temp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file creation should succeed");
        img.save(temp.path()).expect("image save should succeed");

        let processed = preprocess_file(
            &temp.path().to_string_lossy(),
            &RoiFractions::default(),
            ThresholdMode::default(),
        )
        .expect("file preprocessing should succeed");

        assert!(processed.width() > 0 && processed.height() > 0);
    }

    #[test]
    fn test_preprocess_file_errors_are_typed() {
        let result = preprocess_file(
            "missing.png",
            &RoiFractions::default(),
            ThresholdMode::default(),
        );
        assert!(matches!(result, Err(PreprocessingError::ImageLoad { .. })));
    }

    #[test]
    fn test_custom_roi_is_respected() {
        let img = synthetic_screenshot(100, 100);
        let roi = RoiFractions {
            left: 0.25,
            top: 0.25,
            right: 0.75,
            bottom: 0.75,
        };
        let cropped = crop_roi(&img, &roi).expect("crop should succeed");

        assert_eq!(cropped.region, (25, 25, 50, 50));
        assert_eq!(cropped.image.width(), 50);
        assert_eq!(cropped.image.height(), 50);
    }

    #[test]
    fn test_threshold_cutoff_separates_classes() {
        // Pixels at 100 and 200; cutoffs on either side flip the result
        let mut img = image::GrayImage::new(2, 1);
        img.put_pixel(0, 0, image::Luma([100]));
        img.put_pixel(1, 0, image::Luma([200]));
        let img = DynamicImage::ImageLuma8(img);

        let low = binarize(&img, ThresholdMode::Fixed(90)).expect("binarize should succeed");
        assert!(low.image.to_luma8().pixels().all(|p| p[0] == 255));

        let mid = binarize(&img, ThresholdMode::Fixed(150)).expect("binarize should succeed");
        let pixels: Vec<u8> = mid.image.to_luma8().pixels().map(|p| p[0]).collect();
        assert_eq!(pixels, vec![0, 255]);
    }
}
