//! Ancestor, menu-path and modal queries.

use crate::attribute::roles;
use crate::element::{ElementExt, UiElement};

/// Default bound for [`find_modal`].
pub const DEFAULT_MODAL_SEARCH_DEPTH: usize = 3;

/// Walk the parent chain of `start` (excluding `start`) until `predicate` holds.
pub fn find_ancestor<E, F>(start: &E, mut predicate: F) -> Option<E>
where
    E: UiElement,
    F: FnMut(&E) -> bool,
{
    let mut current = start.parent_element();

    while let Some(element) = current {
        if predicate(&element) {
            return Some(element);
        }
        current = element.parent_element();
    }

    None
}

/// Nearest ancestor whose `AXSelected` attribute can be written.
pub fn find_selectable_ancestor<E: UiElement>(start: &E) -> Option<E> {
    find_ancestor(start, |e| e.is_selectable())
}

/// Follow `titles` through nested menus starting at `menu`.
///
/// Each segment must match a child title exactly (case-sensitive). For every
/// segment but the last, the first child of the matched item is the next menu.
pub fn find_menu_item_by_path<E, S>(menu: &E, titles: &[S]) -> Option<E>
where
    E: UiElement,
    S: AsRef<str>,
{
    let (last, interior) = titles.split_last()?;
    let mut menu = menu.clone();

    for title in interior {
        let item = child_titled(&menu, title.as_ref())?;
        menu = item.child_elements().into_iter().next()?;
    }

    child_titled(&menu, last.as_ref())
}

/// Same as [`find_menu_item_by_path`], starting from an application's menu bar.
pub fn find_menu_item<E, S>(app: &E, titles: &[S]) -> Option<E>
where
    E: UiElement,
    S: AsRef<str>,
{
    if titles.is_empty() {
        return None;
    }

    let menu_bar = match app.menu_bar() {
        Ok(Some(bar)) => bar,
        Ok(None) => return None,
        Err(e) => {
            crate::element::log_failure("menu bar", &e);
            return None;
        }
    };

    find_menu_item_by_path(&menu_bar, titles)
}

fn child_titled<E: UiElement>(menu: &E, title: &str) -> Option<E> {
    menu.child_elements().into_iter().find(|c| c.title() == title)
}

/// Sheets, dialogs and system dialogs.
pub fn is_modal<E: UiElement>(element: &E) -> bool {
    if element.role() == roles::SHEET {
        return true;
    }
    let subrole = element.subrole();
    subrole == roles::DIALOG || subrole == roles::SYSTEM_DIALOG
}

/// First modal element in pre-order among elements shallower than `max_depth`
/// (the root is depth 0).
pub fn find_modal<E: UiElement>(root: &E, max_depth: usize) -> Option<E> {
    find_modal_at(root, 0, max_depth)
}

fn find_modal_at<E: UiElement>(element: &E, depth: usize, max_depth: usize) -> Option<E> {
    if depth >= max_depth {
        return None;
    }

    if is_modal(element) {
        return Some(element.clone());
    }

    element
        .child_elements()
        .iter()
        .find_map(|child| find_modal_at(child, depth + 1, max_depth))
}
