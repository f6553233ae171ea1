//! Platform-specific implementations.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::MacOSProbe;

// Re-export the appropriate probe for the current platform
#[cfg(target_os = "macos")]
pub type PlatformProbe = MacOSProbe;

#[cfg(not(target_os = "macos"))]
pub type PlatformProbe = crate::provider::NullProbe;

/// Probe for the current platform.
pub fn probe() -> PlatformProbe {
    #[cfg(target_os = "macos")]
    {
        MacOSProbe::new()
    }
    #[cfg(not(target_os = "macos"))]
    {
        crate::provider::NullProbe
    }
}
