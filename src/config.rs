use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Clinidoc";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinidoc_lib=info"
}

/// Directory exported documents are delivered into.
/// The platform downloads folder, else ~/Downloads.
pub fn downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("Downloads")
    })
}
