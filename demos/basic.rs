use huepick::image::{io::Reader as ImageReader, Rgb, RgbImage};

fn main() {
    // decode the image given on the command line, or fall back to a generated gradient
    let buf = match std::env::args().nth(1) {
        Some(path) => ImageReader::open(path).unwrap().decode().unwrap().to_rgb8(),
        None => RgbImage::from_fn(256, 64, |x, y| Rgb([x as u8, (y * 4) as u8, 255 - x as u8])),
    };

    let palette = huepick::Palette::from_image(buf).seed(1).generate();

    println!("{:#?}", palette);
}
