pub mod config;
pub mod error;
pub mod export;
pub mod histo;
pub mod histogram;
pub mod render;
pub mod single;
pub mod stats;
pub mod style;
pub mod table;
pub mod timeaxis;

pub use error::PlotError;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// default format of the datetime column
pub const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// initiates env_logger at info level, RUST_LOG takes precedence
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// min and max of the slice, None for an empty slice
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}
