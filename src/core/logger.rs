use flexi_logger::{
    filter::{self, LogLineFilter},
    Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming,
};

use crate::core::configuration::LogConfiguration;

/// Drops reqwest internals from the log output, they are only noise
/// at the verbosity levels this tool runs at.
pub struct IgnoreReqwest;

impl LogLineFilter for IgnoreReqwest {
    fn write(
        &self,
        now: &mut flexi_logger::DeferredNow,
        record: &log::Record,
        log_line_writer: &dyn filter::LogLineWriter,
    ) -> std::io::Result<()> {
        let path = record.module_path().unwrap_or_default();

        if path.starts_with("reqwest") || path.starts_with("hyper") {
            return Ok(());
        }

        log_line_writer.write(now, record)
    }
}

pub fn init(
    conf: &LogConfiguration,
    verbosity: Option<log::LevelFilter>,
) -> Result<LoggerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let level = verbosity
        .map(|v| v.to_string())
        .or_else(|| conf.level.to_owned())
        .unwrap_or_else(|| "info".to_string());

    let retention = conf.retention.unwrap_or(31);

    let handle = Logger::try_with_str(level)?
        .log_to_file(FileSpec::default().directory("logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(retention),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .filter(Box::new(IgnoreReqwest))
        .start()?;

    Ok(handle)
}
