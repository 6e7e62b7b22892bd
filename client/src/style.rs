//! ANSI colors for terminal output

pub const BLUE: &str = "\x1b[94m";
pub const CYAN: &str = "\x1b[96m";
pub const HEADER: &str = "\x1b[92m";
pub const WARNING: &str = "\x1b[93m";
pub const FAIL: &str = "\x1b[31m";
pub const END: &str = "\x1b[0m";

pub fn paint(color: &str, text: &str) -> String {
    format!("{}{}{}", color, text, END)
}
