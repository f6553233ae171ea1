//! macOS implementation over the ApplicationServices accessibility API.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{mpsc, Mutex, OnceLock};
use std::time::Duration;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, CFTypeID, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::runloop::{
    kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopRunResult, CFRunLoopSource, CFRunLoopSourceRef,
};
use core_foundation::string::{CFString, CFStringRef};

use crate::attribute::{Attribute, Notification};
use crate::element::UiElement;
use crate::error::{AxError, AxResult};
use crate::provider::{Accessibility, NotificationHandler, Subscription};
use crate::registry::{SubscriptionId, SubscriptionRegistry};

type AXUIElementRef = *const c_void;
type AXObserverRef = *const c_void;
type AXErrorCode = i32;
type AXObserverCallback =
    unsafe extern "C" fn(AXObserverRef, AXUIElementRef, CFStringRef, *mut c_void);

const AX_SUCCESS: AXErrorCode = 0;
const AX_INVALID_ELEMENT: AXErrorCode = -25202;
const AX_CANNOT_COMPLETE: AXErrorCode = -25204;
const AX_ATTRIBUTE_UNSUPPORTED: AXErrorCode = -25205;
const AX_ACTION_UNSUPPORTED: AXErrorCode = -25206;
const AX_NOTIFICATION_UNSUPPORTED: AXErrorCode = -25207;
const AX_API_DISABLED: AXErrorCode = -25211;
const AX_NO_VALUE: AXErrorCode = -25212;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXUIElementGetTypeID() -> CFTypeID;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCreateSystemWide() -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> AXErrorCode;
    fn AXUIElementIsAttributeSettable(
        element: AXUIElementRef,
        attribute: CFStringRef,
        settable: *mut u8,
    ) -> AXErrorCode;
    fn AXUIElementSetAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: CFTypeRef,
    ) -> AXErrorCode;
    fn AXUIElementPerformAction(element: AXUIElementRef, action: CFStringRef) -> AXErrorCode;
    fn AXUIElementCopyActionNames(element: AXUIElementRef, names: *mut CFArrayRef) -> AXErrorCode;
    fn AXUIElementGetPid(element: AXUIElementRef, pid: *mut i32) -> AXErrorCode;
    fn AXObserverCreate(
        application: i32,
        callback: AXObserverCallback,
        observer: *mut AXObserverRef,
    ) -> AXErrorCode;
    fn AXObserverAddNotification(
        observer: AXObserverRef,
        element: AXUIElementRef,
        notification: CFStringRef,
        refcon: *mut c_void,
    ) -> AXErrorCode;
    fn AXObserverGetRunLoopSource(observer: AXObserverRef) -> CFRunLoopSourceRef;
}

fn check(code: AXErrorCode, what: &str) -> AxResult<()> {
    match code {
        AX_SUCCESS => Ok(()),
        AX_API_DISABLED => Err(AxError::PermissionDenied),
        AX_INVALID_ELEMENT => Err(AxError::InvalidElement),
        AX_CANNOT_COMPLETE => Err(AxError::CannotComplete),
        AX_ATTRIBUTE_UNSUPPORTED | AX_ACTION_UNSUPPORTED | AX_NOTIFICATION_UNSUPPORTED => {
            Err(AxError::Unsupported(what.to_string()))
        }
        other => Err(AxError::Platform(other)),
    }
}

/// An `AXUIElementRef`, retained for as long as the handle lives.
#[derive(Clone)]
pub struct MacElement(CFType);

impl MacElement {
    /// Takes ownership of a +1 reference. Returns `None` for null.
    unsafe fn from_create(raw: AXUIElementRef) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        Some(Self(CFType::wrap_under_create_rule(raw)))
    }

    fn from_value(value: &CFType) -> Option<Self> {
        if value.type_of() != unsafe { AXUIElementGetTypeID() } {
            return None;
        }
        Some(Self(value.clone()))
    }

    fn raw(&self) -> AXUIElementRef {
        self.0.as_CFTypeRef()
    }

    pub fn application(pid: i32) -> Option<Self> {
        unsafe { Self::from_create(AXUIElementCreateApplication(pid)) }
    }

    pub fn system_wide() -> Option<Self> {
        unsafe { Self::from_create(AXUIElementCreateSystemWide()) }
    }

    /// Application receiving keyboard input, as seen by the system-wide element.
    pub fn focused_application() -> Option<Self> {
        let system = Self::system_wide()?;
        match system.element_value("AXFocusedApplication") {
            Ok(app) => app,
            Err(e) => {
                crate::element::log_failure("focused application", &e);
                None
            }
        }
    }

    fn copy_value(&self, name: &str) -> AxResult<Option<CFType>> {
        let attribute = CFString::new(name);
        let mut value: CFTypeRef = std::ptr::null();
        let code = unsafe {
            AXUIElementCopyAttributeValue(self.raw(), attribute.as_concrete_TypeRef(), &mut value)
        };

        if code == AX_NO_VALUE {
            return Ok(None);
        }
        check(code, name)?;

        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(unsafe { CFType::wrap_under_create_rule(value) }))
    }

    fn element_value(&self, name: &str) -> AxResult<Option<Self>> {
        Ok(self.copy_value(name)?.as_ref().and_then(Self::from_value))
    }

    fn element_list(&self, name: &str) -> AxResult<Vec<Self>> {
        let Some(value) = self.copy_value(name)? else {
            return Ok(Vec::new());
        };
        Ok(array_items(&value)
            .iter()
            .filter_map(Self::from_value)
            .collect())
    }
}

fn array_items(value: &CFType) -> Vec<CFType> {
    if value.type_of() != CFArray::<CFType>::type_id() {
        return Vec::new();
    }
    let array: CFArray<CFType> =
        unsafe { CFArray::wrap_under_get_rule(value.as_CFTypeRef() as CFArrayRef) };
    array.iter().map(|item| item.clone()).collect()
}

fn string_value(value: &CFType) -> Option<String> {
    if value.type_of() != CFString::type_id() {
        return None;
    }
    let string = unsafe { CFString::wrap_under_get_rule(value.as_CFTypeRef() as CFStringRef) };
    Some(string.to_string())
}

impl UiElement for MacElement {
    fn string_attribute(&self, attribute: Attribute) -> AxResult<Option<String>> {
        Ok(self
            .copy_value(attribute.as_str())?
            .as_ref()
            .and_then(string_value))
    }

    fn is_settable(&self, attribute: Attribute) -> AxResult<bool> {
        let name = CFString::new(attribute.as_str());
        let mut settable: u8 = 0;
        let code = unsafe {
            AXUIElementIsAttributeSettable(self.raw(), name.as_concrete_TypeRef(), &mut settable)
        };
        check(code, attribute.as_str())?;
        Ok(settable != 0)
    }

    fn set_bool(&self, attribute: Attribute, value: bool) -> AxResult<()> {
        let name = CFString::new(attribute.as_str());
        let flag = if value {
            CFBoolean::true_value()
        } else {
            CFBoolean::false_value()
        };
        let code = unsafe {
            AXUIElementSetAttributeValue(
                self.raw(),
                name.as_concrete_TypeRef(),
                flag.as_CFTypeRef(),
            )
        };
        check(code, attribute.as_str())
    }

    fn perform(&self, action: &str) -> AxResult<()> {
        let name = CFString::new(action);
        let code = unsafe { AXUIElementPerformAction(self.raw(), name.as_concrete_TypeRef()) };
        check(code, action)
    }

    fn actions(&self) -> AxResult<Vec<String>> {
        let mut names: CFArrayRef = std::ptr::null();
        let code = unsafe { AXUIElementCopyActionNames(self.raw(), &mut names) };
        check(code, "actions")?;
        if names.is_null() {
            return Ok(Vec::new());
        }
        let value = unsafe { CFType::wrap_under_create_rule(names as CFTypeRef) };
        Ok(array_items(&value).iter().filter_map(string_value).collect())
    }

    fn children(&self) -> AxResult<Vec<Self>> {
        self.element_list("AXChildren")
    }

    fn parent(&self) -> AxResult<Option<Self>> {
        self.element_value("AXParent")
    }

    fn focused_element(&self) -> AxResult<Option<Self>> {
        self.element_value("AXFocusedUIElement")
    }

    fn windows(&self) -> AxResult<Vec<Self>> {
        self.element_list("AXWindows")
    }

    fn menu_bar(&self) -> AxResult<Option<Self>> {
        self.element_value("AXMenuBar")
    }

    fn pid(&self) -> AxResult<i32> {
        let mut pid = 0;
        check(unsafe { AXUIElementGetPid(self.raw(), &mut pid) }, "pid")?;
        Ok(pid)
    }
}

/// Handlers are looked up here from the C callback by subscription id.
fn registry() -> &'static SubscriptionRegistry {
    static REGISTRY: OnceLock<SubscriptionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(SubscriptionRegistry::new)
}

unsafe extern "C" fn observer_callback(
    _observer: AXObserverRef,
    element: AXUIElementRef,
    notification: CFStringRef,
    refcon: *mut c_void,
) {
    let id = SubscriptionId::from_u64(refcon as u64);
    let name = CFString::wrap_under_get_rule(notification).to_string();
    let Some(notification) = Notification::from_name(&name) else {
        tracing::trace!(%name, "unexpected notification");
        return;
    };

    let mut pid = 0;
    AXUIElementGetPid(element, &mut pid);
    registry().dispatch(id, pid, notification);
}

/// Run loop of the observer thread.
struct RunLoopHandle(CFRunLoop);

// CFRunLoop add/remove source calls are thread-safe.
unsafe impl Send for RunLoopHandle {}
unsafe impl Sync for RunLoopHandle {}

struct ObserverEntry {
    _observer: CFType,
    source: CFRunLoopSource,
}

// Only retained/released and removed from the run loop, both thread-safe.
unsafe impl Send for ObserverEntry {}

/// Accessibility capability backed by the system API.
///
/// Observers are attached to a dedicated run loop thread; their callbacks
/// only forward into the registered handlers.
pub struct MacAccessibility {
    run_loop: RunLoopHandle,
    observers: Mutex<HashMap<SubscriptionId, ObserverEntry>>,
}

impl MacAccessibility {
    pub fn new() -> AxResult<Self> {
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("ax-observers".into())
            .spawn(move || {
                let _ = tx.send(RunLoopHandle(CFRunLoop::get_current()));
                loop {
                    let result = CFRunLoop::run_in_mode(
                        unsafe { kCFRunLoopDefaultMode },
                        Duration::from_secs(1),
                        false,
                    );
                    // Nothing attached yet: the call returns immediately.
                    if matches!(result, CFRunLoopRunResult::Finished) {
                        std::thread::sleep(Duration::from_millis(100));
                    }
                }
            })
            .map_err(|e| AxError::Subscription {
                notification: "run loop".into(),
                message: e.to_string(),
            })?;

        let run_loop = rx.recv().map_err(|e| AxError::Subscription {
            notification: "run loop".into(),
            message: e.to_string(),
        })?;

        Ok(Self {
            run_loop,
            observers: Mutex::new(HashMap::new()),
        })
    }
}

impl Accessibility for MacAccessibility {
    type Element = MacElement;

    fn is_trusted(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    fn application(&self, pid: i32) -> Option<MacElement> {
        MacElement::application(pid)
    }

    fn focused_application(&self) -> Option<MacElement> {
        MacElement::focused_application()
    }

    fn subscribe(
        &self,
        subscription: &Subscription,
        handler: NotificationHandler,
    ) -> AxResult<SubscriptionId> {
        let mut raw_observer: AXObserverRef = std::ptr::null();
        let code =
            unsafe { AXObserverCreate(subscription.pid, observer_callback, &mut raw_observer) };
        check(code, "observer")?;
        if raw_observer.is_null() {
            return Err(AxError::Subscription {
                notification: "observer".into(),
                message: "AXObserverCreate returned null".into(),
            });
        }
        let observer = unsafe { CFType::wrap_under_create_rule(raw_observer) };

        let id = registry().register(handler);
        let refcon = id.as_u64() as *mut c_void;

        let Some(app) = self.application(subscription.pid) else {
            registry().remove(id);
            return Err(AxError::InvalidElement);
        };
        let mut targets = vec![app.clone()];
        if subscription.include_windows {
            targets.extend(app.windows().unwrap_or_default());
        }

        let mut added = 0;
        let mut last_error = None;
        for target in &targets {
            for notification in &subscription.notifications {
                let name = CFString::new(notification.as_str());
                let code = unsafe {
                    AXObserverAddNotification(
                        observer.as_CFTypeRef(),
                        target.raw(),
                        name.as_concrete_TypeRef(),
                        refcon,
                    )
                };
                match check(code, notification.as_str()) {
                    Ok(()) => added += 1,
                    Err(e) => last_error = Some((notification.as_str(), e)),
                }
            }
        }

        if added == 0 {
            registry().remove(id);
            let (notification, error) = last_error.unwrap_or(("(none)", AxError::Platform(0)));
            return Err(AxError::Subscription {
                notification: notification.to_string(),
                message: error.to_string(),
            });
        }

        if let Some((notification, error)) = last_error {
            tracing::warn!(pid = subscription.pid, notification, error = %error, added, "some notifications could not be added");
        }

        let source = unsafe {
            CFRunLoopSource::wrap_under_get_rule(AXObserverGetRunLoopSource(
                observer.as_CFTypeRef(),
            ))
        };
        self.run_loop
            .0
            .add_source(&source, unsafe { kCFRunLoopDefaultMode });

        if let Ok(mut observers) = self.observers.lock() {
            observers.insert(
                id,
                ObserverEntry {
                    _observer: observer,
                    source,
                },
            );
        }

        tracing::debug!(pid = subscription.pid, subscription = %id, added, "observer attached");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        registry().remove(id);

        let entry = self
            .observers
            .lock()
            .ok()
            .and_then(|mut observers| observers.remove(&id));

        if let Some(entry) = entry {
            self.run_loop
                .0
                .remove_source(&entry.source, unsafe { kCFRunLoopDefaultMode });
            tracing::debug!(subscription = %id, "observer detached");
        }
    }
}
