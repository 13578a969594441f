//! Version command implementation

/// Version line printed by the `version` command
#[must_use]
pub fn version_line() -> String {
    format!("incprev version : {}", env!("CARGO_PKG_VERSION"))
}

/// Execute the version command
pub fn execute() -> i32 {
    println!("{}", version_line());
    0
}
