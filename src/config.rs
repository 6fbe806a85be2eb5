use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dermatrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Dermatrack/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Dermatrack")
}

/// Get the session store location
pub fn store_path() -> PathBuf {
    app_data_dir().join("session.db")
}
