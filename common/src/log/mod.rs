use once_cell::sync::OnceCell;
use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    RollingFile { dir: String },
}

#[derive(Debug, Clone)]
pub struct TracingFactoryOptions {
    pub level: Level,
    pub target: OutputTarget,
}

impl Default for TracingFactoryOptions {
    fn default() -> Self {
        TracingFactoryOptions::new_with_debug(false)
    }
}

impl TracingFactoryOptions {
    pub fn new_with_debug(debug: bool) -> Self {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        TracingFactoryOptions { level, target: OutputTarget::Stdout }
    }
}

/// One-shot global tracing initializer, mirrored on the teacher's
/// `TracingFactory::init_log` but without its `static mut` init flag.
pub struct TracingFactory;

impl TracingFactory {
    pub fn init_log(debug: bool) {
        TracingFactory::init_log_with_options(TracingFactoryOptions::new_with_debug(debug))
    }

    pub fn init_log_with_options(opts: TracingFactoryOptions) {
        INIT.get_or_init(|| {
            let format = tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(false)
                .with_target(false)
                .compact();

            match opts.target {
                OutputTarget::Stdout => {
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(opts.level)
                        .event_format(format)
                        .try_init();
                }
                OutputTarget::RollingFile { dir } => {
                    let file_appender = rolling::daily(&dir, "gtid.log");
                    let writer = file_appender.and(io::stdout);
                    let _ = tracing_subscriber::fmt()
                        .with_max_level(opts.level)
                        .event_format(format)
                        .with_writer(writer)
                        .try_init();
                }
            }
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tracing::{debug, info};

    #[test]
    fn init_is_idempotent() {
        TracingFactory::init_log(true);
        TracingFactory::init_log(true);
        debug!("log init test");
        info!("log init test");
    }
}
