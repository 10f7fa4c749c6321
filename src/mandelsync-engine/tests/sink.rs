use std::io::Cursor;

use mandelsync_bmp::{Bitmap, Raster};
use mandelsync_engine::{
    sink::{BmpFileSink, BmpWriterSink, ImageSink, SinkError},
    Color, ImageBuffer, RunConfig, RunContext, RunCoordinator, RunOutput, Strategy, Viewport,
};

fn render() -> RunOutput {
    let config = RunConfig {
        viewport: Viewport {
            center_x: -0.5,
            center_y: 0.0,
            scale: 1.5,
            // Odd width to exercise row padding.
            width: 37,
            height: 21,
            max_iter: 40,
        },
        workers: 3,
        strategy: Strategy::DiningPhilosophers,
        mode: Default::default(),
    };

    RunCoordinator::new(config)
        .unwrap()
        .run(&RunContext::new())
        .unwrap()
}

fn assert_same_image(image: &ImageBuffer, decoded: &Bitmap) {
    assert_eq!((decoded.width(), decoded.height()), (image.width(), image.height()));

    let mut sentinels = 0;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let original = image.get(x, y);
            let restored = decoded.get(x, y);

            if original.is_black() {
                assert_eq!(restored, Color::TRANSPARENT);
                sentinels += 1;
            } else {
                assert_eq!(restored, original, "pixel ({x}, {y})");
            }
        }
    }

    // The view contains part of the set, which is stored as black.
    assert!(sentinels > 0);
}

#[test]
fn writer_round_trip() -> Result<(), SinkError> {
    let output = render();

    let mut sink = BmpWriterSink::new(Vec::new());
    output.persist(&mut sink)?;

    let data = sink.into_inner();
    let decoded = Bitmap::decode(&mut Cursor::new(data))?;
    assert_same_image(&output.image, &decoded);

    Ok(())
}

#[test]
fn file_round_trip() -> Result<(), SinkError> {
    let output = render();
    let dir = tempfile::tempdir()?;

    let mut sink = BmpFileSink::new(dir.path().join("mandel.bmp"));
    output.persist(&mut sink)?;

    let decoded = Bitmap::open(sink.path())?;
    assert_same_image(&output.image, &decoded);

    Ok(())
}

#[test]
fn failed_persist_can_be_retried() -> Result<(), SinkError> {
    let output = render();
    let dir = tempfile::tempdir()?;

    let mut missing = BmpFileSink::new(dir.path().join("missing").join("mandel.bmp"));
    assert!(matches!(output.persist(&mut missing), Err(SinkError::Io(..))));

    let path = dir.path().join("mandel.bmp");
    let mut sink: Box<dyn ImageSink> = Box::new(BmpFileSink::new(&path));
    output.persist(sink.as_mut())?;
    assert!(path.is_file());

    Ok(())
}
