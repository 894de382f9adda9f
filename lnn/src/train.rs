use crate::dataset::{DatasetSource, ImageStream, LabelStream, ScopedStream, Split};
use crate::dtype::DTypeFloat;
use crate::error::Result;
use crate::image::ImageVector;
use crate::net::{LEARNING_RATE, Layer, prediction};
use crate::scoring::{PassSummary, ProgressEvent, Scorer};
use crate::target::{check_label, target_output};
use log::{info, trace};

impl<T: DTypeFloat> Layer<T> {
    /// Runs one pass over the training split, updating the weights after every example.
    pub fn train<S, R>(&mut self, source: &mut S, scorer: &mut R) -> Result<PassSummary>
    where
        S: DatasetSource<T> + ?Sized,
        R: Scorer + ?Sized,
    {
        let learn_rate = T::from_f64(LEARNING_RATE);
        run_pass(source, Split::Training, scorer, |image, label| {
            self.forward(image.as_slice())?;
            let target = target_output::<T>(label)?;
            self.update(&target, learn_rate)?;
            Ok(self.prediction())
        })
    }

    /// Runs one pass over the testing split. The layer is not modified.
    pub fn test<S, R>(&self, source: &mut S, scorer: &mut R) -> Result<PassSummary>
    where
        S: DatasetSource<T> + ?Sized,
        R: Scorer + ?Sized,
    {
        run_pass(source, Split::Testing, scorer, |image, label| {
            check_label(label)?;
            let outputs = self.evaluate(image.as_slice())?;
            Ok(prediction(&outputs))
        })
    }
}

fn run_pass<T, S, R, F>(
    source: &mut S,
    split: Split,
    scorer: &mut R,
    mut step: F,
) -> Result<PassSummary>
where
    T: DTypeFloat,
    S: DatasetSource<T> + ?Sized,
    R: Scorer + ?Sized,
    F: FnMut(&ImageVector<T>, usize) -> Result<usize>,
{
    let count = source.example_count(split);
    info!("starting {split} pass over {count} examples");

    let mut images = ScopedStream::new(split, source.open_images(split)?);
    let mut labels = ScopedStream::new(split, source.open_labels(split)?);

    let mut errors = 0;
    for index in 0..count {
        let image = images.next_image()?;
        let label = labels.next_label()?;

        let predicted = step(&image, label)?;
        if predicted != label {
            errors += 1;
        }
        trace!("{split} example {index}: prediction {predicted}, actual {label}");

        scorer.process_example(&ProgressEvent {
            split,
            index,
            predicted,
            actual: label,
            error_count: errors,
            total: index + 1,
        });
    }

    images.close();
    labels.close();

    let summary = PassSummary {
        split,
        errors,
        total: count,
    };
    info!(
        "finished {split} pass: {errors}/{count} errors, success rate {:.2}%",
        summary.success_rate() * 100.0
    );
    scorer.finish_pass(&summary);
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::{DataStream, Example, InMemoryImages, InMemoryLabels, InMemorySource};
    use crate::error::{Error, ErrorKind};
    use crate::net::INPUT_CELLS;
    use crate::net::initializer::{ConstantInitializer, RandomInitializer};
    use crate::scoring::NoOpScorer;
    use std::cell::Cell;
    use std::rc::Rc;

    const BLOCK: usize = INPUT_CELLS / 4;

    #[derive(Default)]
    struct RecordingScorer {
        events: Vec<ProgressEvent>,
        summaries: Vec<PassSummary>,
    }

    impl Scorer for RecordingScorer {
        fn process_example(&mut self, event: &ProgressEvent) {
            self.events.push(*event);
        }
        fn finish_pass(&mut self, summary: &PassSummary) {
            self.summaries.push(*summary);
        }
    }

    #[derive(Default)]
    struct Counters {
        opened: Cell<usize>,
        closed: Cell<usize>,
    }

    /// Wraps an in-memory source and counts every open and close.
    struct RecordingSource {
        inner: InMemorySource<f64>,
        counters: Rc<Counters>,
        fail_labels: bool,
    }

    struct Recorded<S> {
        inner: S,
        counters: Rc<Counters>,
        closed: bool,
    }

    impl<S> Recorded<S> {
        fn new(inner: S, counters: &Rc<Counters>) -> Self {
            counters.opened.set(counters.opened.get() + 1);
            Recorded {
                inner,
                counters: counters.clone(),
                closed: false,
            }
        }
    }

    impl<S: DataStream> DataStream for Recorded<S> {
        fn close(&mut self) {
            assert!(!self.closed, "stream closed twice");
            self.closed = true;
            self.counters.closed.set(self.counters.closed.get() + 1);
            self.inner.close();
        }
    }

    impl<S: ImageStream<f64>> ImageStream<f64> for Recorded<S> {
        fn next_image(&mut self) -> Result<ImageVector<f64>> {
            self.inner.next_image()
        }
    }

    impl<S: LabelStream> LabelStream for Recorded<S> {
        fn next_label(&mut self) -> Result<usize> {
            self.inner.next_label()
        }
    }

    impl DatasetSource<f64> for RecordingSource {
        type Images = Recorded<InMemoryImages<f64>>;
        type Labels = Recorded<InMemoryLabels<f64>>;

        fn example_count(&self, split: Split) -> usize {
            self.inner.example_count(split)
        }

        fn open_images(&mut self, split: Split) -> Result<Self::Images> {
            Ok(Recorded::new(self.inner.open_images(split)?, &self.counters))
        }

        fn open_labels(&mut self, split: Split) -> Result<Self::Labels> {
            if self.fail_labels {
                return Err(Error::Io {
                    split,
                    operation: crate::dataset::StreamOp::OpenLabels,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(Recorded::new(self.inner.open_labels(split)?, &self.counters))
        }
    }

    fn recording(inner: InMemorySource<f64>) -> RecordingSource {
        RecordingSource {
            inner,
            counters: Rc::default(),
            fail_labels: false,
        }
    }

    fn black() -> ImageVector<f64> {
        ImageVector::binarized(&[0u8; INPUT_CELLS]).unwrap()
    }

    /// An image with only the pixels of quarter `block` set.
    fn block_image(block: usize) -> ImageVector<f64> {
        let mut pixels = [0u8; INPUT_CELLS];
        pixels[block * BLOCK..(block + 1) * BLOCK].fill(255);
        ImageVector::binarized(&pixels).unwrap()
    }

    fn synthetic_source() -> InMemorySource<f64> {
        let training: Vec<Example<f64>> = (0..4).map(|c| (block_image(c), c)).collect();
        let testing = vec![
            (block_image(0), 0),
            (block_image(1), 1),
            (block_image(2), 2),
            (black(), 5),
        ];
        InMemorySource::new(training, testing)
    }

    #[test]
    fn test_single_black_example() {
        let mut layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(0xf666)).unwrap();
        let before = layer.snapshot();
        let mut source = InMemorySource::new(vec![(black(), 3)], vec![]);
        let mut scorer = RecordingScorer::default();

        let summary = layer.train(&mut source, &mut scorer).unwrap();

        assert!(layer.outputs().iter().all(|&o| o == 0.0));
        assert_eq!(layer.snapshot(), before);
        assert_eq!(
            summary,
            PassSummary {
                split: Split::Training,
                errors: 1,
                total: 1
            }
        );
        assert_eq!(
            scorer.events,
            vec![ProgressEvent {
                split: Split::Training,
                index: 0,
                predicted: 0,
                actual: 3,
                error_count: 1,
                total: 1,
            }]
        );
        assert_eq!(scorer.summaries, vec![summary]);
    }

    #[test]
    fn test_constant_init_fixture() {
        // Identical cells tie on the first example of each class, so only the first
        // training example (label 0) is predicted correctly. Afterwards each cell favors
        // its own block, and only the black test image is mispredicted.
        let mut layer = Layer::<f64>::new(&mut ConstantInitializer(0.5)).unwrap();
        let mut source = synthetic_source();
        let mut scorer = RecordingScorer::default();

        let train = layer.train(&mut source, &mut scorer).unwrap();
        assert_eq!(train.errors, 3);
        assert_eq!(train.total, 4);
        let predicted: Vec<usize> = scorer.events.iter().map(|e| e.predicted).collect();
        assert_eq!(predicted, vec![0, 0, 0, 0]);

        let cell = &layer.cells()[2];
        approx::assert_relative_eq!(cell.weights()[2 * BLOCK], 0.5 + 0.05 * 0.875);
        approx::assert_relative_eq!(cell.weights()[0], 0.5 - 0.05 * 0.125);
        approx::assert_relative_eq!(layer.cells()[9].weights()[3 * BLOCK], 0.5 - 0.05 * 0.125);

        let test = layer.test(&mut source, &mut scorer).unwrap();
        assert_eq!(test.errors, 1);
        assert_eq!(test.total, 4);
        let predicted: Vec<usize> = scorer.events[4..].iter().map(|e| e.predicted).collect();
        assert_eq!(predicted, vec![0, 1, 2, 0]);
        assert_eq!(scorer.summaries, vec![train, test]);
    }

    #[test]
    fn test_seeded_passes_are_reproducible() {
        let run = || {
            let mut layer =
                Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(0xf1234567)).unwrap();
            let mut source = synthetic_source();
            let mut scorer = RecordingScorer::default();
            let train = layer.train(&mut source, &mut scorer).unwrap();
            let test = layer.test(&mut source, &mut scorer).unwrap();
            (train, test, scorer.events, layer.snapshot())
        };
        let (train_a, test_a, events_a, weights_a) = run();
        let (train_b, test_b, events_b, weights_b) = run();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(events_a, events_b);
        assert_eq!(weights_a, weights_b);

        // StdRng output is stable for a given seed, so the exact outcome is pinned.
        assert_eq!(train_a.errors, 4);
        assert_eq!(test_a.errors, 1);
        let predicted: Vec<usize> = events_a.iter().map(|e| e.predicted).collect();
        assert_eq!(predicted, vec![7, 9, 3, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_progress_events_are_cumulative() {
        let mut layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(1)).unwrap();
        let mut source = synthetic_source();
        let mut scorer = RecordingScorer::default();
        let summary = layer.train(&mut source, &mut scorer).unwrap();

        let mut errors = 0;
        for (i, e) in scorer.events.iter().enumerate() {
            assert_eq!(e.index, i);
            assert_eq!(e.total, i + 1);
            assert_eq!(e.actual, i);
            if !e.is_correct() {
                errors += 1;
            }
            assert_eq!(e.error_count, errors);
        }
        assert_eq!(summary.errors, errors);
    }

    #[test]
    fn test_pass_does_not_modify_layer() {
        let mut layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(2)).unwrap();
        let mut source = synthetic_source();
        layer.train(&mut source, &mut NoOpScorer).unwrap();
        let trained = layer.snapshot();
        layer.test(&mut source, &mut NoOpScorer).unwrap();
        assert_eq!(layer.snapshot(), trained);
    }

    #[test]
    fn test_streams_closed_after_each_pass() {
        let mut source = recording(synthetic_source());
        let counters = source.counters.clone();
        let mut layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(4)).unwrap();

        layer.train(&mut source, &mut NoOpScorer).unwrap();
        assert_eq!(counters.opened.get(), 2);
        assert_eq!(counters.closed.get(), 2);

        layer.test(&mut source, &mut NoOpScorer).unwrap();
        assert_eq!(counters.opened.get(), 4);
        assert_eq!(counters.closed.get(), 4);
    }

    #[test]
    fn test_early_end_of_stream_closes_streams() {
        let inner = synthetic_source().with_example_count(Split::Training, 6);
        let mut source = recording(inner);
        let counters = source.counters.clone();
        let mut layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(4)).unwrap();
        let mut scorer = RecordingScorer::default();

        let err = layer.train(&mut source, &mut scorer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EndOfStream);
        assert!(err.to_string().starts_with("training set: failed to read next image"));
        assert_eq!(scorer.events.len(), 4);
        assert!(scorer.summaries.is_empty());
        assert_eq!(counters.opened.get(), 2);
        assert_eq!(counters.closed.get(), 2);
    }

    #[test]
    fn test_failed_open_closes_opened_stream() {
        let mut source = recording(synthetic_source());
        source.fail_labels = true;
        let counters = source.counters.clone();
        let layer = Layer::<f64>::new(&mut RandomInitializer::seed_from_u64(4)).unwrap();

        let err = layer.test(&mut source, &mut NoOpScorer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(counters.opened.get(), 1);
        assert_eq!(counters.closed.get(), 1);
    }

    #[test]
    fn test_invalid_label_aborts_pass() {
        let mut source = recording(InMemorySource::new(vec![(black(), 0), (black(), 12)], vec![]));
        let counters = source.counters.clone();
        let mut layer = Layer::<f64>::new(&mut ConstantInitializer(0.2)).unwrap();

        let err = layer.train(&mut source, &mut NoOpScorer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(counters.closed.get(), 2);
    }

    #[test]
    fn test_invalid_label_aborts_testing_pass() {
        let mut source = InMemorySource::new(vec![], vec![(block_image(1), 1), (black(), 10)]);
        let layer = Layer::<f64>::new(&mut ConstantInitializer(0.2)).unwrap();
        let mut scorer = RecordingScorer::default();

        let err = layer.test(&mut source, &mut scorer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("label 10"));
        assert_eq!(scorer.events.len(), 1);
    }
}
