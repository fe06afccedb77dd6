use crate::core::ids::OutputId;
use crate::core::output::{map_outputs, MappedOutput, Output, Transform};
use crate::core::universe::Universe;
use crate::util::geometry::Rect;

fn outputs(dims: &[(u32, u32, u32)]) -> Vec<MappedOutput> {
    // Leftmost-first, the order the engine hands to the universe.
    let outs = dims
        .iter()
        .map(|&(id, w, h)| Output {
            id: OutputId(id),
            name: format!("out-{id}"),
            width: w,
            height: h,
            scale: 1,
            transform: Transform::Normal,
        })
        .rev()
        .collect();
    let mut mapped = map_outputs(0, outs);
    mapped.reverse();
    mapped
}

fn universe() -> Universe<u32> {
    let mut universe = Universe::new(["main", "alt", "scratch"]);
    universe.set_outputs(outputs(&[(1, 1920, 1080)]));
    universe
}

#[test]
fn test_new_starts_hidden() {
    let universe: Universe<u32> = Universe::new(["main", "alt"]);
    assert!(universe.screens.is_empty());
    assert_eq!(universe.hidden.len(), 2);
}

#[test]
fn test_set_outputs_draws_visible_then_hidden() {
    let mut universe = universe();
    assert_eq!(universe.screens.len(), 1);
    assert_eq!(universe.screens.focus().unwrap().workspace.tag, "main");
    assert_eq!(universe.hidden.len(), 2);

    universe.set_outputs(outputs(&[(1, 1920, 1080), (2, 1280, 720)]));
    let tags: Vec<&str> = universe
        .screens
        .iter()
        .map(|s| s.workspace.tag.as_str())
        .collect();
    assert_eq!(tags, vec!["main", "alt"]);
    assert_eq!(universe.hidden.len(), 1);
}

#[test]
fn test_set_outputs_surplus_workspaces_return_to_hidden() {
    let mut universe = universe();
    universe.set_outputs(outputs(&[(1, 1920, 1080), (2, 1280, 720)]));
    universe.set_outputs(outputs(&[(2, 1280, 720)]));
    assert_eq!(universe.screens.len(), 1);
    assert_eq!(universe.screens.focus().unwrap().workspace.tag, "main");
    assert_eq!(universe.hidden.len(), 2);
}

#[test]
fn test_set_outputs_is_idempotent() {
    let mut universe = universe();
    universe.insert(7);
    universe.float(7, Rect::new(0, 0, 9, 9));
    let os = outputs(&[(1, 1920, 1080), (2, 1280, 720)]);
    universe.set_outputs(os.clone());
    let once = universe.clone();
    universe.set_outputs(os);
    assert_eq!(universe, once);
}

#[test]
fn test_set_outputs_more_outputs_than_workspaces() {
    let mut universe: Universe<u32> = Universe::new(["only"]);
    universe.set_outputs(outputs(&[(1, 800, 600), (2, 800, 600)]));
    assert_eq!(universe.screens.len(), 1);
}

#[test]
fn test_insert_focuses_new_window() {
    let mut universe = universe();
    universe.insert(1);
    universe.insert(2);
    let windows = &universe.screens.focus().unwrap().workspace.windows;
    assert_eq!(windows.focus(), Some(&2));
    assert_eq!(windows.clone().into_vec(), vec![2, 1]);
}

#[test]
fn test_insert_without_screens_goes_to_first_hidden() {
    let mut universe: Universe<u32> = Universe::new(["main", "alt"]);
    universe.insert(1);
    assert!(universe.hidden[0].windows.contains(&1));
}

#[test]
fn test_insert_without_workspaces_is_noop() {
    let mut universe: Universe<u32> = Universe::new(Vec::<String>::new());
    universe.insert(1);
    assert!(!universe.contains(&1));
}

#[test]
fn test_insert_then_delete_restores() {
    let mut universe = universe();
    universe.insert(1);
    let before = universe.clone();
    universe.insert(2);
    universe.delete(2);
    assert_eq!(universe, before);
}

#[test]
fn test_delete_removes_floating_entry() {
    let mut universe = universe();
    universe.insert(1);
    universe.float(1, Rect::new(10, 10, 109, 109));
    universe.delete(1);
    assert!(!universe.contains(&1));
    assert!(universe.floating.is_empty());
}

#[test]
fn test_window_lives_in_one_workspace() {
    let mut universe = universe();
    universe.insert(1);
    universe.insert(2);
    let holding = universe
        .workspaces()
        .filter(|ws| ws.windows.contains(&1))
        .count();
    assert_eq!(holding, 1);
}

#[test]
fn test_filter_reaches_hidden_workspaces() {
    let mut universe: Universe<u32> = Universe::new(["main", "alt"]);
    universe.insert(1);
    universe.insert(2);
    universe.set_outputs(outputs(&[(1, 1920, 1080)]));
    universe.filter(|&w| w != 1);
    assert!(!universe.contains(&1));
    assert!(universe.contains(&2));
}

#[test]
fn test_view_swaps_hidden_workspace_in() {
    let mut universe = universe();
    universe.insert(1);
    universe.view("alt");
    assert_eq!(universe.screens.focus().unwrap().workspace.tag, "alt");
    // The previous workspace went back to hidden with its window.
    assert!(universe
        .hidden
        .iter()
        .any(|ws| ws.tag == "main" && ws.windows.contains(&1)));

    universe.view("main");
    assert_eq!(universe.screens.focus().unwrap().workspace.tag, "main");
}

#[test]
fn test_view_focuses_other_screen() {
    let mut universe = universe();
    universe.set_outputs(outputs(&[(1, 1920, 1080), (2, 1280, 720)]));
    universe.view("alt");
    let focused = universe.screens.focus().unwrap();
    assert_eq!(focused.workspace.tag, "alt");
    assert_eq!(focused.output.output.id, OutputId(2));
}

#[test]
fn test_greedy_view_steals_visible_workspace() {
    let mut universe = universe();
    universe.insert(1);
    universe.set_outputs(outputs(&[(1, 1920, 1080), (2, 1280, 720)]));
    universe.greedy_view("alt");
    let tags: Vec<&str> = universe
        .screens
        .iter()
        .map(|s| s.workspace.tag.as_str())
        .collect();
    // The workspaces traded places; the focused screen kept its output.
    assert_eq!(tags, vec!["alt", "main"]);
    let focused = universe.screens.focus().unwrap();
    assert_eq!(focused.output.output.id, OutputId(1));
    assert_eq!(focused.workspace.tag, "alt");
}

#[test]
fn test_view_unknown_tag_is_noop() {
    let mut universe = universe();
    let before = universe.clone();
    universe.view("nope");
    universe.greedy_view("nope");
    assert_eq!(universe, before);
}
