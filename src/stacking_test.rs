use proptest::prelude::*;

use super::*;
use crate::test_helpers::shape_element;

const A: ElementId = 1;
const B: ElementId = 2;
const C: ElementId = 3;

fn abc() -> Slide {
    Slide::from_parts(1, None, vec![shape_element(A, 0), shape_element(B, 1), shape_element(C, 2)], vec![])
}

fn order(slide: &Slide) -> Vec<ElementId> {
    slide.elements().iter().map(|e| e.id).collect()
}

fn zs(slide: &Slide) -> Vec<i64> {
    slide.elements().iter().map(|e| e.z).collect()
}

// =============================================================================
// single element
// =============================================================================

#[test]
fn bring_forward_swaps_with_next() {
    let mut slide = abc();
    let changed = apply(&mut slide, &[A], StackCommand::BringForward);
    assert_eq!(order(&slide), vec![B, A, C]);
    assert_eq!(zs(&slide), vec![0, 1, 2]);
    assert_eq!(changed, vec![B, A]);
}

#[test]
fn bring_forward_at_top_is_noop() {
    let mut slide = abc();
    let changed = apply(&mut slide, &[C], StackCommand::BringForward);
    assert_eq!(order(&slide), vec![A, B, C]);
    assert!(changed.is_empty());
}

#[test]
fn send_backward_at_bottom_is_noop() {
    let mut slide = abc();
    assert!(apply(&mut slide, &[A], StackCommand::SendBackward).is_empty());
    assert_eq!(order(&slide), vec![A, B, C]);
}

#[test]
fn send_backward_swaps_with_previous() {
    let mut slide = abc();
    apply(&mut slide, &[C], StackCommand::SendBackward);
    assert_eq!(order(&slide), vec![A, C, B]);
    assert_eq!(zs(&slide), vec![0, 1, 2]);
}

#[test]
fn bring_to_front_of_top_still_moves() {
    let mut slide = abc();
    let changed = apply(&mut slide, &[C], StackCommand::BringToFront);
    assert_eq!(order(&slide), vec![A, B, C]);
    assert_eq!(zs(&slide), vec![0, 1, 3]);
    assert_eq!(changed, vec![C]);
}

#[test]
fn send_to_back_goes_below_min() {
    let mut slide = abc();
    apply(&mut slide, &[B], StackCommand::SendToBack);
    assert_eq!(order(&slide), vec![B, A, C]);
    assert_eq!(zs(&slide), vec![-1, 0, 2]);
}

#[test]
fn empty_selection_is_noop() {
    let mut slide = abc();
    for command in [StackCommand::BringForward, StackCommand::BringToFront, StackCommand::SendBackward, StackCommand::SendToBack] {
        assert!(apply(&mut slide, &[], command).is_empty());
    }
    assert_eq!(order(&slide), vec![A, B, C]);
}

#[test]
fn unknown_id_is_ignored() {
    let mut slide = abc();
    assert!(apply(&mut slide, &[42], StackCommand::BringToFront).is_empty());
}

// =============================================================================
// multi-select order preservation
// =============================================================================

#[test]
fn bring_to_front_keeps_relative_order() {
    let mut slide = abc();
    apply(&mut slide, &[C, A], StackCommand::BringToFront);
    assert_eq!(order(&slide), vec![B, A, C]);
    assert_eq!(zs(&slide), vec![1, 3, 4]);
}

#[test]
fn send_to_back_keeps_relative_order() {
    let mut slide = abc();
    apply(&mut slide, &[A, C], StackCommand::SendToBack);
    assert_eq!(order(&slide), vec![A, C, B]);
    assert_eq!(zs(&slide), vec![-2, -1, 1]);
}

#[test]
fn bring_forward_adjacent_pair_moves_together() {
    let mut slide = Slide::from_parts(
        1,
        None,
        vec![shape_element(A, 0), shape_element(B, 1), shape_element(C, 2), shape_element(4, 3)],
        vec![],
    );
    apply(&mut slide, &[A, B], StackCommand::BringForward);
    assert_eq!(order(&slide), vec![C, A, B, 4]);
}

#[test]
fn send_backward_adjacent_pair_moves_together() {
    let mut slide = abc();
    apply(&mut slide, &[B, C], StackCommand::SendBackward);
    assert_eq!(order(&slide), vec![B, C, A]);
}

#[test]
fn forward_with_topmost_selected_passes_the_top() {
    let mut slide = abc();
    let changed = apply(&mut slide, &[B, C], StackCommand::BringForward);
    assert_eq!(order(&slide), vec![A, C, B]);
    assert_eq!(zs(&slide), vec![0, 1, 2]);
    assert_eq!(changed, vec![C, B]);
}

#[test]
fn backward_with_bottom_selected_passes_the_bottom() {
    let mut slide = abc();
    let changed = apply(&mut slide, &[A, B], StackCommand::SendBackward);
    assert_eq!(order(&slide), vec![B, A, C]);
    assert_eq!(changed, vec![B, A]);
}

// =============================================================================
// z invariant
// =============================================================================

fn command_strategy() -> impl Strategy<Value = StackCommand> {
    prop_oneof![
        Just(StackCommand::BringForward),
        Just(StackCommand::BringToFront),
        Just(StackCommand::SendBackward),
        Just(StackCommand::SendToBack),
    ]
}

proptest! {
    #[test]
    fn z_stays_sorted_and_unique(
        steps in prop::collection::vec(
            (command_strategy(), prop::collection::vec(1i64..=6, 0..4)),
            0..30,
        )
    ) {
        let mut slide = Slide::from_parts(1, None, (1..=6).map(|id| shape_element(id, id * 10)).collect(), vec![]);
        for (command, selection) in steps {
            apply(&mut slide, &selection, command);
            prop_assert!(slide.is_z_ordered());
            prop_assert_eq!(slide.elements().len(), 6);
        }
    }
}
