use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

pub fn level_for(verbose: u8, quiet: u8) -> LevelFilter {
    match verbose as i16 - quiet as i16 {
        i16::MIN..=-2 => LevelFilter::Error,
        -1 => LevelFilter::Warn,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `RUST_LOG`, when set, overrides the level passed in.
pub fn init(level: LevelFilter) {
    let _ = Builder::new()
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .try_init();

    log::debug!("Logger initialized at {}.", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_counts() {
        assert_eq!(level_for(0, 0), LevelFilter::Info);
        assert_eq!(level_for(1, 0), LevelFilter::Debug);
        assert_eq!(level_for(3, 0), LevelFilter::Trace);
        assert_eq!(level_for(0, 1), LevelFilter::Warn);
        assert_eq!(level_for(0, 5), LevelFilter::Error);
        assert_eq!(level_for(2, 2), LevelFilter::Info);
    }
}
