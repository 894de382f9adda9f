use clap::Parser;
use lnn::net::Layer;
use lnn::net::initializer::{ConstantInitializer, LayerInitializer, RandomInitializer};
use lnn::scoring::MulticlassScorer;
use lnn_mnist::console::ConsoleScorer;
use lnn_mnist::source::{MAX_TESTING_IMAGES, MAX_TRAINING_IMAGES, MnistSource};
use log::{debug, error, info};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "mnist-1lnn",
    about = "Train and test a 1-layer neural network on the MNIST handwriting images"
)]
struct Args {
    /// Directory containing the four MNIST IDX files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Number of training images to learn from
    #[arg(long, default_value_t = MAX_TRAINING_IMAGES)]
    train_count: usize,

    /// Number of testing images to evaluate
    #[arg(long, default_value_t = MAX_TESTING_IMAGES)]
    test_count: usize,

    /// Seed for the random weight initialization (random if absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Initialize every weight to this value instead of a random one
    #[arg(long, conflicts_with = "seed")]
    constant_init: Option<f64>,

    /// Refresh the progress line every N images (0 disables it)
    #[arg(long, default_value_t = 100)]
    progress_every: usize,

    /// Print the confusion matrix of the testing pass
    #[arg(long)]
    confusion: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> lnn::Result<()> {
    let start = Instant::now();
    info!("MNIST-1LNN: a simple 1-layer neural network processing the MNIST handwriting images");

    let mut initializer: Box<dyn LayerInitializer<f64>> = match (args.constant_init, args.seed) {
        (Some(value), _) => {
            debug!("initializing weights to constant {value}");
            Box::new(ConstantInitializer(value))
        }
        (None, Some(seed)) => {
            debug!("initializing weights from seed {seed:#x}");
            Box::new(RandomInitializer::seed_from_u64(seed))
        }
        (None, None) => Box::new(RandomInitializer::default()),
    };
    let mut layer = Layer::<f64>::new(initializer.as_mut())?;

    let mut source = MnistSource::new(&args.data_dir).with_counts(args.train_count, args.test_count);
    let mut console = ConsoleScorer::new(std::io::stdout(), args.progress_every);

    layer.train(&mut source, &mut console)?;
    info!("Done training");

    let mut confusion = MulticlassScorer::new();
    layer.test(&mut source, &mut (&mut console, &mut confusion))?;
    if args.confusion {
        confusion.print_report();
    }

    info!(
        "DONE! Total execution time: {:.1} sec",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
