use auto_edit_mask::region::{dominant_region, RegionBias};
use auto_edit_mask::{
    decode_rgb, encode_png, generate_mask, EditParams, Error, ImageRole, MaskEngine,
};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};

fn png(img: &RgbImage) -> Vec<u8> {
    encode_png(DynamicImage::ImageRgb8(img.clone())).unwrap()
}

fn with_square(base: &RgbImage, x0: u32, y0: u32, size: u32, color: Rgb<u8>) -> RgbImage {
    let mut img = base.clone();
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            img.put_pixel(x, y, color);
        }
    }
    img
}

#[test]
fn identical_images_give_empty_mask_and_original_guide() {
    let img = RgbImage::from_fn(100, 100, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 90]));
    let artifacts = MaskEngine::default()
        .generate_from_images(&img, &img)
        .unwrap();

    assert!(artifacts.stats.is_empty());
    assert_eq!(artifacts.stats.changed_pixels, 0);
    assert!(artifacts.soft_mask.pixels().all(|p| p.0[0] == 0));
    assert_eq!(artifacts.guide, img);
}

#[test]
fn black_to_white_covers_whole_frame() {
    let black = RgbImage::new(100, 100);
    let white = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
    let artifacts = MaskEngine::default()
        .generate_from_images(&black, &white)
        .unwrap();

    assert!((artifacts.stats.threshold - 0.16).abs() < 1e-6);
    assert_eq!(artifacts.stats.region_area, 100 * 100);
    assert_eq!(artifacts.guide, white);
    for y in 20..80 {
        for x in 20..80 {
            assert!(artifacts.soft_mask.get_pixel(x, y).0[0] > 250);
        }
    }
}

#[test]
fn single_changed_square_is_selected() {
    let base = RgbImage::from_pixel(400, 300, Rgb([100, 100, 100]));
    let proposed = with_square(&base, 150, 180, 20, Rgb([240, 240, 240]));

    let artifacts = MaskEngine::default()
        .generate_from_images(&base, &proposed)
        .unwrap();
    let stats = &artifacts.stats;

    assert_eq!(stats.working, (400, 300));
    assert_eq!(stats.region_area, 400);
    let (cx, cy) = stats.region_centroid.unwrap();
    assert!((cx - 159.5).abs() < 0.5, "cx = {cx}");
    assert!((cy - 189.5).abs() < 0.5, "cy = {cy}");

    assert_eq!(artifacts.guide.get_pixel(160, 190), &Rgb([240, 240, 240]));
    assert_eq!(artifacts.guide.get_pixel(10, 10), &Rgb([100, 100, 100]));
    assert!(artifacts.soft_mask.get_pixel(160, 190).0[0] > 200);
    assert_eq!(artifacts.soft_mask.get_pixel(10, 10).0[0], 0);
}

#[test]
fn larger_change_wins_over_smaller_one_and_speckle_is_dropped() {
    let base = RgbImage::from_pixel(400, 300, Rgb([60, 80, 100]));
    let mut proposed = with_square(&base, 200, 150, 30, Rgb([220, 200, 40]));
    proposed = with_square(&proposed, 40, 40, 8, Rgb([220, 200, 40]));
    proposed.put_pixel(350, 20, Rgb([255, 255, 255]));

    let artifacts = MaskEngine::default()
        .generate_from_images(&base, &proposed)
        .unwrap();

    assert_eq!(artifacts.stats.region_area, 900);
    assert_eq!(artifacts.guide.get_pixel(44, 44), &Rgb([60, 80, 100]));
    assert_eq!(artifacts.guide.get_pixel(350, 20), &Rgb([60, 80, 100]));
    assert_eq!(artifacts.guide.get_pixel(215, 165), &Rgb([220, 200, 40]));
}

#[test]
fn soft_mask_survives_png_round_trip() {
    let base = RgbImage::from_pixel(120, 90, Rgb([30, 30, 30]));
    let proposed = with_square(&base, 40, 40, 25, Rgb([200, 180, 160]));
    let artifacts = MaskEngine::default()
        .generate_from_images(&base, &proposed)
        .unwrap();

    let bytes = encode_png(DynamicImage::ImageLuma8(artifacts.soft_mask.clone())).unwrap();
    let decoded: GrayImage = image::load_from_memory(&bytes).unwrap().to_luma8();
    assert_eq!(decoded, artifacts.soft_mask);
}

#[test]
fn generate_mask_returns_png_encoded_outputs() {
    let base = RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]));
    let proposed = with_square(&base, 20, 20, 12, Rgb([250, 240, 230]));
    let params = EditParams::new("add a pergola").with_seed(42);

    let output = generate_mask(&png(&base), &png(&proposed), &params).unwrap();

    let mask = image::load_from_memory(&output.soft_mask).unwrap();
    assert!(matches!(mask, DynamicImage::ImageLuma8(_)));
    assert_eq!((mask.width(), mask.height()), (64, 48));

    let guide = decode_rgb(&output.guide_image, ImageRole::Original).unwrap();
    assert_eq!(guide.dimensions(), (64, 48));
    assert_eq!(guide.get_pixel(25, 25), &Rgb([250, 240, 230]));

    let request = output.into_edit_request();
    assert_eq!(request.params.steps(), 35);
    assert_eq!(request.params.seed, Some(42));
    assert_eq!(request.params.instruction, "add a pergola");
}

#[test]
fn alpha_channel_is_dropped_on_decode() {
    let rgba = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 0]));
    let bytes = encode_png(DynamicImage::ImageRgba8(rgba)).unwrap();
    let rgb = decode_rgb(&bytes, ImageRole::Original).unwrap();
    assert_eq!(rgb.get_pixel(3, 3), &Rgb([10, 20, 30]));
}

#[test]
fn invalid_inputs_are_fatal() {
    let a = png(&RgbImage::new(32, 32));
    let b = png(&RgbImage::new(32, 16));
    let params = EditParams::new("x");

    assert!(matches!(
        generate_mask(b"garbage", &a, &params),
        Err(Error::Decode {
            role: ImageRole::Original,
            ..
        })
    ));
    assert!(matches!(
        generate_mask(&a, &b, &params),
        Err(Error::DimensionMismatch {
            original: (32, 32),
            proposed: (32, 16),
        })
    ));
}

#[test]
fn process_files_writes_mask_and_guide() {
    let dir = std::env::temp_dir().join(format!("auto-edit-mask-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let base = RgbImage::from_pixel(80, 60, Rgb([120, 130, 140]));
    let proposed = with_square(&base, 30, 30, 15, Rgb([0, 0, 0]));
    let original_path = dir.join("yard.png");
    let proposed_path = dir.join("yard_edit.png");
    std::fs::write(&original_path, png(&base)).unwrap();
    std::fs::write(&proposed_path, png(&proposed)).unwrap();

    let out_dir = dir.join("out");
    let result =
        MaskEngine::default().process_files(&original_path, &proposed_path, Some(&out_dir));

    assert!(result.success, "{}", result.message);
    assert!(!result.empty);
    let mask = image::open(out_dir.join("yard_mask.png")).unwrap();
    assert_eq!((mask.width(), mask.height()), (80, 60));
    assert!(out_dir.join("yard_guide.png").exists());

    let missing = MaskEngine::default().process_files(
        &dir.join("nope.png"),
        &proposed_path,
        Some(&out_dir),
    );
    assert!(!missing.success);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn region_selection_is_deterministic_on_pipeline_bitmap() {
    let bits = auto_edit_mask::Bitmap::from_fn(50, 50, |x, y| (x / 10 + y / 10) % 2 == 0);
    let first = dominant_region(&bits, &RegionBias::default());
    for _ in 0..5 {
        assert_eq!(dominant_region(&bits, &RegionBias::default()), first);
    }
}
