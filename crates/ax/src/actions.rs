//! Acting on elements: press, focus, select and menu item commands.

use crate::attribute::{Attribute, PRESS_ACTION};
use crate::element::{log_failure, ElementExt, UiElement};
use crate::query::{find_menu_item, find_selectable_ancestor};
use crate::selector::{find_descendant, Selector};

fn report(what: &str, result: crate::AxResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log_failure(what, &e);
            false
        }
    }
}

pub fn press<E: UiElement>(element: &E) -> bool {
    report(PRESS_ACTION, element.perform(PRESS_ACTION))
}

/// Focus the element itself.
pub fn focus<E: UiElement>(element: &E) -> bool {
    report("focus", element.set_bool(Attribute::Focused, true))
}

/// Select the nearest selectable ancestor of the element, not the element.
pub fn select<E: UiElement>(element: &E) -> bool {
    match find_selectable_ancestor(element) {
        Some(ancestor) => report("select", ancestor.set_bool(Attribute::Selected, true)),
        None => false,
    }
}

/// Press a menu item only if its check state differs from `checked`.
pub fn set_checked<E: UiElement>(item: &E, checked: bool) -> bool {
    if item.is_checked() == checked {
        return true;
    }
    press(item)
}

/// Which element action to run on a selector match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementAction {
    Press,
    Focus,
    Select,
}

/// Find the first match for `selector` under `app` and act on it.
/// Returns `false` when nothing matched or the action failed.
pub fn act_on<E: UiElement>(app: &E, selector: &Selector, action: ElementAction) -> bool {
    let Some(element) = find_descendant(app, selector) else {
        tracing::debug!(?selector, "no element matched");
        return false;
    };

    match action {
        ElementAction::Press => press(&element),
        ElementAction::Focus => focus(&element),
        ElementAction::Select => select(&element),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Press,
    Check,
    Uncheck,
}

/// A menu path plus what to do with the item at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCommand {
    pub path: Vec<String>,
    pub action: MenuAction,
}

impl MenuCommand {
    pub fn new<I, S>(path: I, action: MenuAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            action,
        }
    }
}

fn run_menu_action<E: UiElement>(item: &E, action: MenuAction) -> bool {
    match action {
        MenuAction::Press => press(item),
        MenuAction::Check => set_checked(item, true),
        MenuAction::Uncheck => set_checked(item, false),
    }
}

/// Resolve and run each command in turn. Commands whose path does not
/// resolve are skipped; the result is `false` if any action failed.
pub fn press_menu_items<E: UiElement>(app: &E, commands: &[MenuCommand]) -> bool {
    let mut success = true;

    for command in commands {
        let Some(item) = find_menu_item(app, command.path.as_slice()) else {
            continue;
        };
        success &= run_menu_action(&item, command.action);
    }

    success
}

/// Resolve every path first, then run the actions.
///
/// Menu items may rename themselves once pressed (e.g. "Show X" / "Hide X"),
/// so both names can be listed and only the one present beforehand runs.
pub fn toggle_menu_items<E: UiElement>(app: &E, commands: &[MenuCommand]) -> bool {
    let items: Vec<Option<E>> = commands
        .iter()
        .map(|command| find_menu_item(app, command.path.as_slice()))
        .collect();

    let mut success = true;
    for (item, command) in items.iter().zip(commands) {
        if let Some(item) = item {
            success &= run_menu_action(item, command.action);
        }
    }

    success
}
