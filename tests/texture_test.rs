use std::io::Cursor;

use beach_scene::{
    data_structures::texture::decode_image,
    resources::texture::{image_or, load_image},
};
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

const SAND: [u8; 4] = [194, 178, 128, 255];

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[test]
fn should_fall_back_to_a_solid_pixel_for_a_missing_file() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let loaded = runtime.block_on(load_image("textures/no-such-sand.jpg"));
    assert!(loaded.is_err());

    let img = image_or(loaded, "textures/no-such-sand.jpg", SAND);
    assert_eq!(img.dimensions(), (1, 1));
    assert_eq!(img.get_pixel(0, 0), Rgba(SAND));
}

#[test]
fn should_fall_back_for_undecodable_data() {
    let broken = decode_image(b"definitely not a jpeg", "waternormals.jpg", Some("jpg"));
    assert!(broken.is_err());
    let img = image_or(broken, "waternormals.jpg", [127, 127, 255, 255]);
    assert_eq!(img.get_pixel(0, 0), Rgba([127, 127, 255, 255]));
}

#[test]
fn should_keep_a_decoded_image() {
    let decoded = decode_image(&png(4, 2, [10, 20, 30, 255]), "tiny.png", None);
    let img = image_or(decoded, "tiny.png", SAND);
    assert_eq!(img.dimensions(), (4, 2));
    assert_eq!(img.get_pixel(3, 1), Rgba([10, 20, 30, 255]));
}
