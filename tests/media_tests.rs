mod common;

use common::AppRoot;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ligoj::data::State;
use ligoj::media::image::{process_raw_images, ImageOperation, DEFAULT_SIZE};
use ligoj::media::{AudioHandler, ImageHandler, MediaKind, MediaRef};
use ligoj::Error;

fn app() -> AppRoot {
    AppRoot::new("{}")
}

fn write_png(app: &AppRoot, relative: &str, width: u32, height: u32) {
    let path = app.root().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, Rgb([200, 30, 30])).save(&path).unwrap();
}

#[test]
fn paths_follow_state_and_category() {
    let app = app();
    let settings = app.settings();
    let paths = &settings.paths;

    let raw = ImageHandler::new("x", "png", None, State::Raw, paths);
    assert_eq!(raw.path(), Some(app.root().join("images/raw/x.png")));
    let resized = ImageHandler::new("x", "png", None, State::named("resized"), paths);
    assert_eq!(resized.path(), Some(app.root().join("images/processed/resized/x.png")));
    let unset = ImageHandler::new("x", "png", None, State::Unset, paths);
    assert_eq!(unset.path(), None);

    let audio = AudioHandler::new("a1", "mp3", Some("artists"), State::named("processed"), paths);
    assert_eq!(audio.path(), Some(app.root().join("audios/processed/processed/artists/a1.mp3")));
}

#[test]
fn encoding_reads_file_bytes() {
    let app = app();
    app.write("audios/raw/artists/a1.mp3", b"abc");
    let settings = app.settings();

    let audio = AudioHandler::new("a1", "mp3", Some("artists"), State::Raw, &settings.paths);
    assert_eq!(audio.encoded_base64().unwrap(), "YWJj");
    assert_eq!(audio.data_uri().unwrap(), "data:audio/mp3;base64,YWJj");
}

#[test]
fn encoding_missing_or_unset_media_fails() {
    let app = app();
    let settings = app.settings();
    let missing = AudioHandler::new("ghost", "mp3", None, State::Raw, &settings.paths);
    assert!(matches!(missing.encoded_base64(), Err(Error::MediaNotFound(_))));
    let unset = ImageHandler::new("x", "png", None, State::Unset, &settings.paths);
    assert!(matches!(unset.encoded_base64(), Err(Error::MediaNotFound(_))));
}

#[test]
fn discover_finds_file_by_stem() {
    let app = app();
    app.write("images/processed/resized/a1.jpeg", b"jpeg bytes");
    app.write("images/processed/resized/a10.png", b"png bytes");
    app.write("images/processed/resized/j.cole.png", b"dotted");
    let settings = app.settings();

    let found = MediaRef::discover(MediaKind::Image, "a1", None, State::named("resized"), &settings.paths)
        .unwrap()
        .unwrap();
    assert_eq!(found.extension(), "jpeg");
    assert!(found.data_uri().unwrap().starts_with("data:image/jpeg;base64,"));

    let dotted = MediaRef::discover(MediaKind::Image, "j.cole", None, State::named("resized"), &settings.paths)
        .unwrap()
        .unwrap();
    assert_eq!(dotted.extension(), "png");
    assert_eq!(dotted.resolve(), Some(app.root().join("images/processed/resized/j.cole.png")));
    let prefix = MediaRef::discover(MediaKind::Image, "j", None, State::named("resized"), &settings.paths).unwrap();
    assert!(prefix.is_none());

    let none = MediaRef::discover(MediaKind::Image, "a2", None, State::named("resized"), &settings.paths).unwrap();
    assert!(none.is_none());
    let no_dir = MediaRef::discover(MediaKind::Audio, "a1", Some("artists"), State::named("processed"), &settings.paths)
        .unwrap();
    assert!(no_dir.is_none());
}

#[test]
fn resize_keeps_aspect_and_goes_grayscale() {
    let app = app();
    write_png(&app, "images/raw/x.png", 400, 100);
    let settings = app.settings();

    let mut handler = ImageHandler::new("x", "png", None, State::Raw, &settings.paths);
    handler.load().unwrap();
    handler.resize(DEFAULT_SIZE.0, DEFAULT_SIZE.1).unwrap();
    assert_eq!(handler.media().state(), &State::named("resized"));
    let saved = handler.save().unwrap();
    assert_eq!(saved, app.root().join("images/processed/resized/x.png"));

    let reloaded = image::open(&saved).unwrap();
    assert_eq!(reloaded.dimensions(), (200, 50));
    assert!(matches!(reloaded, DynamicImage::ImageLuma8(_)));
}

#[test]
fn circle_fills_frame_with_transparent_corners() {
    let app = app();
    write_png(&app, "images/raw/x.png", 300, 500);
    let settings = app.settings();

    let mut handler = ImageHandler::new("x", "png", None, State::Raw, &settings.paths);
    handler.load().unwrap();
    handler.circle(120, 120).unwrap();
    let saved = handler.save().unwrap();
    assert_eq!(saved, app.root().join("images/processed/circled/x.png"));

    let reloaded = image::open(&saved).unwrap().to_luma_alpha8();
    assert_eq!(reloaded.dimensions(), (120, 120));
    assert_eq!(reloaded.get_pixel(0, 0)[1], 0);
    assert_eq!(reloaded.get_pixel(60, 60)[1], 255);
}

#[test]
fn batch_processing_skips_hidden_files() {
    let app = app();
    write_png(&app, "images/raw/a1.png", 50, 50);
    write_png(&app, "images/raw/a2.png", 500, 250);
    write_png(&app, "images/raw/mc.solaar.png", 40, 40);
    app.write("images/raw/.gitkeep", b"");
    let settings = app.settings();

    let count = process_raw_images(&settings.paths, ImageOperation::Resize, (100, 100)).unwrap();
    assert_eq!(count, 3);
    assert!(app.root().join("images/processed/resized/mc.solaar.png").is_file());
    let a2 = image::open(app.root().join("images/processed/resized/a2.png")).unwrap();
    assert_eq!(a2.dimensions(), (100, 50));
}
