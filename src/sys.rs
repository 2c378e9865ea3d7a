#[cfg(target_os = "macos")]
pub mod appkit;
