//! ANSI color support for terminal output

/// ANSI color codes
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Determine if color should be used based on mode and environment
#[cfg(feature = "native")]
pub fn should_use_color(mode: &str) -> bool {
    match mode {
        "always" => true,
        "never" => false,
        _ => atty::is(atty::Stream::Stdout) && std::env::var("NO_COLOR").is_err(),
    }
}

/// Wrap `text` in `color` when enabled
pub fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled && !text.is_empty() {
        format!("{}{}{}", color, text, ansi::RESET)
    } else {
        text.to_string()
    }
}
