use tera::Tera;

use crate::config::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::error::AppError;

/// Name the root page template is registered under
pub const INDEX_TEMPLATE: &str = "index.html";

const INDEX_SOURCE: &str = include_str!("../templates/index.html");

/// Initialize the Tera template engine with the templates compiled into the binary
pub fn init_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_template(INDEX_TEMPLATE, INDEX_SOURCE)?;
    tera.register_filter("uptime", uptime_filter);
    Ok(tera)
}

/// Format a number of seconds as a short human-readable duration
/// (e.g. "45s", "2m 15s", "1h 5m").
///
/// Hours are always shown once the duration reaches an hour; trailing zero
/// components are dropped.
pub fn format_uptime(seconds: u64) -> String {
    if seconds < SECONDS_PER_MINUTE {
        return format!("{}s", seconds);
    }

    if seconds < SECONDS_PER_HOUR {
        let (m, s) = (seconds / SECONDS_PER_MINUTE, seconds % SECONDS_PER_MINUTE);
        return if s != 0 {
            format!("{}m {}s", m, s)
        } else {
            format!("{}m", m)
        };
    }

    let h = seconds / SECONDS_PER_HOUR;
    let rest = seconds % SECONDS_PER_HOUR;
    let (m, s) = (rest / SECONDS_PER_MINUTE, rest % SECONDS_PER_MINUTE);
    if s != 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m != 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}h", h)
    }
}

/// Tera filter wrapping [`format_uptime`]
fn uptime_filter(
    value: &tera::Value,
    _args: &std::collections::HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let seconds = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("uptime filter expects a non-negative integer"))?;
    Ok(tera::Value::String(format_uptime(seconds)))
}
