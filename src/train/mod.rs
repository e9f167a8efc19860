pub mod data;
pub mod epoch_stats;
pub mod logger;
pub mod loop_fn;
pub mod train_config;

pub use data::{shuffle_dataset, shuffle_dataset_with_seed};
pub use epoch_stats::EpochStats;
pub use logger::{LogSink, SilentLogger, TrainingLogger};
pub use loop_fn::train_loop;
pub use train_config::TrainConfig;
