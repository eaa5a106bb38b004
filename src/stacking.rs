//! Stacking engine: z-order commands over a (possibly multi-element) selection.
//!
//! ALGORITHM
//! =========
//! - forward: descending id order, swap z and array slot with the next
//!   element up; no-op for the topmost element.
//! - backward: ascending id order, swap with the next element down; no-op for
//!   the bottom element.
//! - front: ascending id order, `z = max + 1`, move to the end.
//! - back: descending id order, `z = min - 1`, move to the start.
//!
//! The id-ordered processing direction is fixed per command. Multi-element
//! moves depend on it to keep the selected elements in the same relative
//! order.
//!
//! One edge does not keep that order: a forward step whose selection already
//! holds the topmost element leaves the top in place and lets the other
//! selected elements climb past it, so `{B, C}` in `[A, B, C]` becomes
//! `[A, C, B]`. Backward with the bottom element selected mirrors this.
//!
//! Every command returns the ids whose `z` changed so the caller can persist
//! exactly those elements.

#[cfg(test)]
#[path = "stacking_test.rs"]
mod stacking_test;

use std::collections::HashMap;

use crate::model::{ElementId, Slide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackCommand {
    BringForward,
    BringToFront,
    SendBackward,
    SendToBack,
}

/// Apply `command` to `selection` within `slide`.
///
/// Ids not present on the slide are ignored. Returns the ids whose z changed,
/// in draw order.
pub fn apply(slide: &mut Slide, selection: &[ElementId], command: StackCommand) -> Vec<ElementId> {
    if selection.is_empty() {
        return Vec::new();
    }

    let before: HashMap<ElementId, i64> = slide.elements.iter().map(|e| (e.id, e.z)).collect();

    let mut ordered: Vec<ElementId> = selection.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    match command {
        StackCommand::BringForward | StackCommand::SendToBack => ordered.reverse(),
        StackCommand::SendBackward | StackCommand::BringToFront => {}
    }

    for id in ordered {
        match command {
            StackCommand::BringForward => bring_forward(slide, id),
            StackCommand::BringToFront => bring_to_front(slide, id),
            StackCommand::SendBackward => send_backward(slide, id),
            StackCommand::SendToBack => send_to_back(slide, id),
        }
    }

    slide
        .elements
        .iter()
        .filter(|e| before.get(&e.id) != Some(&e.z))
        .map(|e| e.id)
        .collect()
}

fn bring_forward(slide: &mut Slide, id: ElementId) {
    let Some(index) = slide.index_of(id) else {
        return;
    };
    if index + 1 >= slide.elements.len() {
        return;
    }
    swap_adjacent(slide, index, index + 1);
}

fn send_backward(slide: &mut Slide, id: ElementId) {
    let Some(index) = slide.index_of(id) else {
        return;
    };
    if index == 0 {
        return;
    }
    swap_adjacent(slide, index - 1, index);
}

fn bring_to_front(slide: &mut Slide, id: ElementId) {
    let Some(index) = slide.index_of(id) else {
        return;
    };
    let top = slide.max_z() + 1;
    let mut element = slide.elements.remove(index);
    element.z = top;
    slide.elements.push(element);
}

fn send_to_back(slide: &mut Slide, id: ElementId) {
    let Some(index) = slide.index_of(id) else {
        return;
    };
    let bottom = slide.min_z() - 1;
    let mut element = slide.elements.remove(index);
    element.z = bottom;
    slide.elements.insert(0, element);
}

fn swap_adjacent(slide: &mut Slide, lower: usize, upper: usize) {
    let lower_z = slide.elements[lower].z;
    slide.elements[lower].z = slide.elements[upper].z;
    slide.elements[upper].z = lower_z;
    slide.elements.swap(lower, upper);
}
