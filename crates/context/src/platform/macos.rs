//! macOS implementation of the window probe.

use crate::app::AppInfo;
use crate::provider::WindowProbe;
use modeglue_ax::platform::MacElement;
use modeglue_ax::{ElementExt, UiElement};

// Native Cocoa imports for running application queries
use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};

/// macOS probe over NSWorkspace / NSRunningApplication and the
/// accessibility API.
#[derive(Debug, Default)]
pub struct MacOSProbe;

impl MacOSProbe {
    pub fn new() -> Self {
        Self
    }
}

impl WindowProbe for MacOSProbe {
    fn focused_app(&self) -> Option<AppInfo> {
        let pid = MacElement::focused_application()?.pid().ok()?;
        running_app_with_pid(pid)
    }

    fn frontmost_app(&self) -> Option<AppInfo> {
        unsafe {
            let workspace_class = Class::get("NSWorkspace")?;

            // [NSWorkspace sharedWorkspace]
            let shared_workspace: *mut Object = msg_send![workspace_class, sharedWorkspace];
            if shared_workspace.is_null() {
                return None;
            }

            // [workspace frontmostApplication]
            let frontmost_app: *mut Object = msg_send![shared_workspace, frontmostApplication];
            app_info(frontmost_app)
        }
    }

    fn first_window_identifier(&self, pid: i32) -> String {
        MacElement::application(pid)
            .map(|app| app.window_elements())
            .and_then(|windows| windows.into_iter().next())
            .map(|window| window.identifier())
            .unwrap_or_default()
    }

    fn running_app(&self, bundle_id: &str) -> Option<AppInfo> {
        let c_bundle_id = std::ffi::CString::new(bundle_id).ok()?;

        unsafe {
            let string_class = Class::get("NSString")?;
            let app_class = Class::get("NSRunningApplication")?;

            let ns_bundle_id: *mut Object =
                msg_send![string_class, stringWithUTF8String: c_bundle_id.as_ptr()];
            if ns_bundle_id.is_null() {
                return None;
            }

            // [NSRunningApplication runningApplicationsWithBundleIdentifier:]
            let apps: *mut Object =
                msg_send![app_class, runningApplicationsWithBundleIdentifier: ns_bundle_id];
            if apps.is_null() {
                return None;
            }

            let first: *mut Object = msg_send![apps, firstObject];
            app_info(first)
        }
    }
}

fn running_app_with_pid(pid: i32) -> Option<AppInfo> {
    unsafe {
        let app_class = Class::get("NSRunningApplication")?;
        // [NSRunningApplication runningApplicationWithProcessIdentifier:]
        let app: *mut Object = msg_send![app_class, runningApplicationWithProcessIdentifier: pid];
        app_info(app)
    }
}

/// Read pid, bundle id and localized name of an `NSRunningApplication`.
unsafe fn app_info(app: *mut Object) -> Option<AppInfo> {
    if app.is_null() {
        return None;
    }

    let pid: i32 = msg_send![app, processIdentifier];

    let bundle_id_ns: *mut Object = msg_send![app, bundleIdentifier];
    let bundle_id = nsstring_to_string(bundle_id_ns).unwrap_or_default();

    let name_ns: *mut Object = msg_send![app, localizedName];
    let name = nsstring_to_string(name_ns).unwrap_or_default();

    Some(AppInfo {
        pid,
        bundle_id,
        name,
    })
}

/// Convert NSString to Rust String.
unsafe fn nsstring_to_string(nsstring: *mut Object) -> Option<String> {
    if nsstring.is_null() {
        return None;
    }

    // Get UTF8 C string: [nsstring UTF8String]
    let c_str: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if c_str.is_null() {
        return None;
    }

    let rust_str = std::ffi::CStr::from_ptr(c_str).to_str().ok()?;
    Some(rust_str.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmost_app_smoke() {
        // Depends on whatever is focused while the test runs.
        let app = MacOSProbe::new().frontmost_app();
        println!("Frontmost app: {:?}", app);
    }
}
