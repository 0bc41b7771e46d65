//! Folder ingestion behavior over a real temporary directory.

use image::RgbImage;

use candy_kernel::ingest::{FrameSource, SourceKind, SourceSpec};

fn write_image(dir: &std::path::Path, name: &str) {
    RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]))
        .save(dir.join(name))
        .expect("write test image");
}

#[test]
fn folder_sources_enumerate_only_recognized_images_in_stable_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_image(dir.path(), "c.png");
    write_image(dir.path(), "a.jpg");
    write_image(dir.path(), "b.bmp");
    std::fs::write(dir.path().join("notes.txt"), b"not an image").expect("write txt");
    std::fs::write(dir.path().join("clip.mp4"), b"not really a video").expect("write mp4");

    let spec = SourceSpec::parse(dir.path().to_str().expect("utf8 path")).expect("parse folder");
    assert_eq!(spec.kind(), SourceKind::Folder);

    let mut frames = 0;
    let mut source = FrameSource::open(&spec, None).expect("open folder");
    while let Some(frame) = source.next_frame().expect("read frame") {
        assert_eq!(frame.sequence, frames + 1);
        frames += 1;
    }
    assert_eq!(frames, 3, "txt and mp4 files must be skipped");

    // Re-opening the folder yields the same sequence again.
    let mut reopened = FrameSource::open(&spec, None).expect("reopen folder");
    let mut second_pass = 0;
    while reopened.next_frame().expect("read frame").is_some() {
        second_pass += 1;
    }
    assert_eq!(second_pass, frames);
}

#[test]
fn single_image_sources_deliver_exactly_one_frame() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_image(dir.path(), "only.png");
    let path = dir.path().join("only.png");

    let spec = SourceSpec::parse(path.to_str().expect("utf8 path")).expect("parse image");
    assert_eq!(spec.kind(), SourceKind::Image);

    let mut source = FrameSource::open(&spec, None).expect("open image");
    assert!(source.next_frame().expect("first read").is_some());
    assert!(source.next_frame().expect("second read").is_none());
}

#[test]
fn unsupported_file_extensions_are_rejected_at_parse_time() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("weights.pt");
    std::fs::write(&path, b"weights").expect("write file");

    let err = SourceSpec::parse(path.to_str().expect("utf8 path")).expect_err("must reject .pt");
    assert!(err.to_string().contains("not supported"));
}
