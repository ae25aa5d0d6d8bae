use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "hail_lookup_broker";

/// Output shape of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 本機終端機
    Compact,
    /// CloudWatch 以 JSON 格式解析
    Json,
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> String {
    if verbose {
        format!("{}=debug,tower_http=debug,info", CRATE_TARGET)
    } else {
        format!("{}=info,tower_http=info", CRATE_TARGET)
    }
}

pub fn init_cli_logger(verbose: bool) {
    init(LogFormat::Compact, &default_directive(verbose));
}

pub fn init_lambda_logger() {
    // Lambda 自帶時間戳
    init(LogFormat::Json, &format!("{}=info", CRATE_TARGET));
}

fn init(format: LogFormat, directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Json => registry.with(layer.without_time().json()).init(),
    }
}
