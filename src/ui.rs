use colored::Colorize;
use std::io::{self, IsTerminal};

/// Enable colour only when both output streams are terminals.
pub fn init_color() {
    let tty = io::stdout().is_terminal() && io::stderr().is_terminal();
    colored::control::set_override(tty);
}

/// Print a report line
pub fn message(msg: &str) {
    println!("{msg}");
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}
