//! Platform-specific implementations.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{MacAccessibility, MacElement};

// Re-export the appropriate capability for the current platform
#[cfg(target_os = "macos")]
pub type PlatformAccessibility = MacAccessibility;

#[cfg(not(target_os = "macos"))]
pub type PlatformAccessibility = crate::memory::MemoryAccessibility;

/// Open the accessibility capability for the current platform.
pub fn open() -> crate::AxResult<PlatformAccessibility> {
    #[cfg(target_os = "macos")]
    {
        MacAccessibility::new()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Ok(crate::memory::MemoryAccessibility::new())
    }
}
