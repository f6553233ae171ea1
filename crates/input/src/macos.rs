//! macOS-specific functionality for input emulation.

use std::process::Command;

use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

use crate::error::{InputError, InputResult};
use crate::shortcut::{Modifier, Shortcut, ShortcutPoster};

/// Check if the application has accessibility permissions on macOS.
pub fn has_accessibility_access() -> bool {
    // Use the AXIsProcessTrusted function from ApplicationServices
    unsafe {
        extern "C" {
            fn AXIsProcessTrusted() -> bool;
        }
        AXIsProcessTrusted()
    }
}

/// Prompt the user to grant accessibility permissions.
///
/// Opens the macOS System Settings to the Accessibility pane.
/// The user must manually add the app to the allowed list.
pub fn prompt_accessibility_access() {
    let _ = Command::new("open")
        .arg("x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility")
        .spawn();
}

/// Check if accessibility is granted, prompting if not.
pub fn ensure_accessibility_access() -> bool {
    if has_accessibility_access() {
        return true;
    }

    tracing::warn!("Accessibility permission not granted. Opening System Settings...");
    prompt_accessibility_access();
    false
}

fn event_flags(shortcut: &Shortcut) -> CGEventFlags {
    shortcut
        .modifiers
        .iter()
        .fold(CGEventFlags::empty(), |flags, modifier| {
            flags
                | match modifier {
                    Modifier::Control => CGEventFlags::CGEventFlagControl,
                    Modifier::Option => CGEventFlags::CGEventFlagAlternate,
                    Modifier::Command => CGEventFlags::CGEventFlagCommand,
                    Modifier::Shift => CGEventFlags::CGEventFlagShift,
                }
        })
}

/// Posts key events at the HID tap.
#[derive(Debug, Default)]
pub struct CGEventPoster;

impl CGEventPoster {
    pub fn new() -> Self {
        Self
    }
}

impl ShortcutPoster for CGEventPoster {
    fn post(&self, shortcut: &Shortcut) -> InputResult<()> {
        let flags = event_flags(shortcut);

        for key_down in [true, false] {
            let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState)
                .map_err(|_| InputError::EventSource)?;
            let event = CGEvent::new_keyboard_event(source, shortcut.key_code, key_down)
                .map_err(|_| InputError::KeyFailed(shortcut.key_code))?;
            event.set_flags(flags);
            event.post(CGEventTapLocation::HID);
        }

        tracing::debug!(key_code = shortcut.key_code, modifiers = ?shortcut.modifiers, "posted shortcut");
        Ok(())
    }
}
