//! A collection of macros for printing messages to the console with different styles.
//!
//! Callers capture the installer's stdout to learn where the SDK landed, so every status
//! line is written to stderr and stdout carries nothing but the final `bin` path.

/// A step finished, e.g. the SDK was unpacked.
#[macro_export]
macro_rules! success_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "[SUCCESS]".green().bold(), format!($($arg)*));
    };
}

/// A fatal failure; `main` prints the error chain with this before exiting 1.
#[macro_export]
macro_rules! error_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "  [ERROR]".red().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! warning_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "[WARNING]".yellow().bold(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! info_message {
    ($($arg:tt)*) => {
        eprintln!("{} {}", "   [INFO]".cyan().bold(), format!($($arg)*));
    };
}
