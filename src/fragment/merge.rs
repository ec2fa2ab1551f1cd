//! Folding fragment diffs into a rendered root
//!
//! A diff carrying statics replaces what it targets. Without statics, a
//! regular fragment merges its children by index and a comprehension takes
//! the new rows while keeping its statics and merging templates. A streamed
//! comprehension instead edits its rows by id as the diff's stream says.
//!
//! After every merge, components with shared statics are resolved: they take
//! the statics of the component they name (a negative id names a component
//! from before the merge) and fill in nested statics the diff left out.

use smallvec::SmallVec;

use super::error::MergeError;
use log::trace;

use super::{Child, Children, Component, ComponentDiff, ComponentStatics, Components, Fragment, Root, RootDiff, Stream};

impl Root {
    /// Fold `diff` into this root, producing the next root.
    pub fn merge(self, diff: RootDiff) -> Result<Root, MergeError> {
        let Root { fragment, components: old } = self;
        let fragment = fragment.merge(diff.fragment)?;

        let mut components = old.clone();
        for (id, update) in diff.components {
            match update {
                ComponentDiff::Replace(component) => {
                    components.insert(id, component);
                }
                ComponentDiff::Update(children) => {
                    let component = components.get_mut(&id).ok_or(MergeError::MissingComponent(id))?;
                    merge_children(&mut component.children, children)?;
                }
            }
        }
        resolve_shared(&mut components, &old)?;

        Ok(Root { fragment, components })
    }
}

impl Fragment {
    fn merge(self, diff: Fragment) -> Result<Fragment, MergeError> {
        if diff.statics().is_some() {
            return Ok(diff);
        }
        match (self, diff) {
            (Fragment::Regular { statics, mut children }, Fragment::Regular { children: updates, .. }) => {
                merge_children(&mut children, updates)?;
                Ok(Fragment::Regular { statics, children })
            }
            (
                Fragment::Comprehension {
                    statics,
                    dynamics: mut rows,
                    mut templates,
                    stream: current,
                },
                Fragment::Comprehension {
                    dynamics,
                    templates: added,
                    stream: update,
                    ..
                },
            ) => {
                templates.extend(added);
                let stream = match (current, update) {
                    (None, None) => {
                        rows = dynamics;
                        None
                    }
                    (Some(current), None) => Some(current),
                    (current, Some(update)) => {
                        if let Some(current) = current.filter(|current| current.id != update.id) {
                            return Err(MergeError::StreamIdMismatch(current.id, update.id));
                        }
                        apply_stream(&mut rows, dynamics, &update);
                        Some(update.settled())
                    }
                };
                Ok(Fragment::Comprehension {
                    statics,
                    dynamics: rows,
                    templates,
                    stream,
                })
            }
            _ => Err(MergeError::TypeMismatch),
        }
    }

    /// Copy statics from `source` wherever this fragment has none.
    fn fill_from(&mut self, source: Fragment) -> Result<(), MergeError> {
        match (self, source) {
            (Fragment::Comprehension { statics, .. }, Fragment::Comprehension { statics: shared, .. }) => {
                if statics.is_none() {
                    *statics = shared;
                }
                Ok(())
            }
            (
                Fragment::Regular { statics, children },
                Fragment::Regular {
                    statics: shared,
                    children: shared_children,
                },
            ) => {
                if statics.is_none() {
                    *statics = shared;
                }
                fill_children(children, shared_children)
            }
            _ => Err(MergeError::TypeMismatch),
        }
    }
}

impl Child {
    fn merge(self, diff: Child) -> Result<Child, MergeError> {
        match (self, diff) {
            (Child::Fragment(current), Child::Fragment(update)) => current.merge(update).map(Child::Fragment),
            (_, update) => Ok(update),
        }
    }
}

/// Edit `rows` by id: reset, then deletes, then inserts taken from `incoming`.
fn apply_stream(rows: &mut Vec<Vec<Child>>, incoming: Vec<Vec<Child>>, stream: &Stream) {
    if stream.reset {
        rows.clear();
    }
    for id in &stream.deletes {
        rows.retain(|row| row_id(row) != Some(id.as_str()));
    }

    let mut incoming: Vec<Option<Vec<Child>>> = incoming.into_iter().map(Some).collect();
    for item in &stream.inserts {
        let Some(row) = incoming
            .iter_mut()
            .find(|row| row.as_deref().and_then(row_id) == Some(item.id.as_str()))
            .and_then(Option::take)
        else {
            trace!("stream {} has no row for insert {}", stream.id, item.id);
            continue;
        };

        if let Some(existing) = rows.iter_mut().find(|row| row_id(row) == Some(item.id.as_str())) {
            *existing = row;
        } else {
            match usize::try_from(item.at) {
                Ok(at) if at < rows.len() => rows.insert(at, row),
                _ => rows.push(row),
            }
        }

        match item.limit {
            Some(limit) if limit >= 0 => rows.truncate(limit.unsigned_abs() as usize),
            Some(limit) => {
                let keep = limit.unsigned_abs() as usize;
                let excess = rows.len().saturating_sub(keep);
                rows.drain(..excess);
            }
            None => {}
        }
    }
}

/// The id a streamed row renders as ` id="..."`
fn row_id(row: &[Child]) -> Option<&str> {
    row.iter().find_map(|child| match child {
        Child::Text(text) => text.trim().strip_prefix("id=\"")?.strip_suffix('"'),
        _ => None,
    })
}

fn merge_children(children: &mut Children, updates: Children) -> Result<(), MergeError> {
    for (index, update) in updates {
        let merged = match children.remove(&index) {
            Some(current) => current.merge(update)?,
            None => update,
        };
        children.insert(index, merged);
    }
    Ok(())
}

fn fill_children(children: &mut Children, shared: Children) -> Result<(), MergeError> {
    for (index, source) in shared {
        match (children.get_mut(&index), source) {
            (Some(Child::Fragment(target)), Child::Fragment(source)) => target.fill_from(source)?,
            (Some(_), _) => {}
            (None, source) => {
                children.insert(index, source);
            }
        }
    }
    Ok(())
}

/// Resolve every component whose statics are shared with another one.
pub(super) fn resolve_shared(components: &mut Components, old: &Components) -> Result<(), MergeError> {
    let mut pending: Vec<i32> = components
        .iter()
        .filter(|(_, component)| matches!(component.statics, ComponentStatics::Shared(_)))
        .map(|(id, _)| *id)
        .collect();
    pending.sort_unstable();

    let mut visiting = SmallVec::<[i32; 8]>::new();
    for id in pending {
        resolve_one(components, old, id, &mut visiting)?;
    }
    Ok(())
}

fn resolve_one(
    components: &mut Components,
    old: &Components,
    id: i32,
    visiting: &mut SmallVec<[i32; 8]>,
) -> Result<(), MergeError> {
    let source = match components.get(&id).map(|component| &component.statics) {
        Some(ComponentStatics::Shared(source)) => *source,
        _ => return Ok(()),
    };
    if visiting.contains(&id) {
        return Err(MergeError::SharedCycle(id));
    }

    let shared: Component = if source < 0 {
        source
            .checked_neg()
            .and_then(|previous| old.get(&previous))
            .cloned()
            .ok_or(MergeError::MissingComponent(source))?
    } else {
        visiting.push(id);
        resolve_one(components, old, source, visiting)?;
        visiting.pop();
        components
            .get(&source)
            .cloned()
            .ok_or(MergeError::MissingComponent(source))?
    };

    let component = components.get_mut(&id).ok_or(MergeError::MissingComponent(id))?;
    component.statics = shared.statics;
    fill_children(&mut component.children, shared.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Statics;

    fn root(json: &str) -> Root {
        Root::from_json(json).unwrap()
    }

    fn diff(json: &str) -> RootDiff {
        RootDiff::from_json(json).unwrap()
    }

    #[test]
    fn test_merge_regular_children() {
        let merged = root(r#"{"0": "a", "1": "b", "s": ["", "", ""]}"#)
            .merge(diff(r#"{"1": "c"}"#))
            .unwrap();
        assert_eq!(merged, root(r#"{"0": "a", "1": "c", "s": ["", "", ""]}"#));
    }

    #[test]
    fn test_statics_replace_fragment() {
        let merged = root(r#"{"0": {"0": "a", "s": ["<i>", "</i>"]}, "s": ["", ""]}"#)
            .merge(diff(r#"{"0": {"0": "b", "1": "c", "s": ["<b>", "", "</b>"]}}"#))
            .unwrap();
        assert_eq!(merged, root(r#"{"0": {"0": "b", "1": "c", "s": ["<b>", "", "</b>"]}, "s": ["", ""]}"#));
    }

    #[test]
    fn test_comprehension_rows_replaced_templates_merged() {
        let merged = root(r#"{"0": {"d": [["a"], ["b"]], "s": ["<li>", "</li>"], "p": {"0": ["x"]}}, "s": ["", ""]}"#)
            .merge(diff(r#"{"0": {"d": [["c"]], "p": {"1": ["y"]}}}"#))
            .unwrap();
        let Fragment::Regular { children, .. } = &merged.fragment else {
            panic!("expected a regular fragment");
        };
        let Child::Fragment(Fragment::Comprehension {
            statics,
            dynamics,
            templates,
            ..
        }) = &children[&0]
        else {
            panic!("expected a comprehension");
        };
        assert_eq!(statics, &Some(Statics::Inline(vec!["<li>".into(), "</li>".into()])));
        assert_eq!(dynamics, &vec![vec![Child::Text("c".into())]]);
        assert_eq!(templates.len(), 2);
    }

    #[test]
    fn test_type_mismatch() {
        let err = root(r#"{"0": {"0": "a", "s": ["", ""]}, "s": ["", ""]}"#)
            .merge(diff(r#"{"0": {"d": []}}"#))
            .unwrap_err();
        assert_eq!(err, MergeError::TypeMismatch);
    }

    #[test]
    fn test_component_updates() {
        let current = root(r#"{"0": 1, "s": ["", ""], "c": {"1": {"0": "a", "s": ["<i>", "</i>"]}}}"#);

        let merged = current.clone().merge(diff(r#"{"c": {"1": {"0": "b"}}}"#)).unwrap();
        assert_eq!(merged.components[&1].children[&0], Child::Text("b".into()));

        let err = current.merge(diff(r#"{"c": {"2": {"0": "b"}}}"#)).unwrap_err();
        assert_eq!(err, MergeError::MissingComponent(2));
    }

    #[test]
    fn test_shared_statics_from_previous_component() {
        let current = root(r#"{"0": 1, "s": ["", ""], "c": {"1": {"0": "a", "s": ["<i>", "</i>"]}}}"#);
        let merged = current
            .merge(diff(r#"{"0": 2, "c": {"2": {"0": "b", "s": -1}}}"#))
            .unwrap();
        assert_eq!(
            merged.components[&2].statics,
            ComponentStatics::Inline(vec!["<i>".into(), "</i>".into()])
        );
    }

    #[test]
    fn test_shared_statics_fill_nested_fragments() {
        let root = root(
            r#"{"0": 2, "s": ["", ""], "c": {
                "1": {"0": {"d": [["x"]], "s": ["<li>", "</li>"]}, "s": ["<ul>", "</ul>"]},
                "2": {"0": {"d": [["y"]]}, "s": 1}
            }}"#,
        );
        let Child::Fragment(Fragment::Comprehension { statics, dynamics, .. }) = &root.components[&2].children[&0] else {
            panic!("expected a comprehension");
        };
        assert_eq!(statics, &Some(Statics::Inline(vec!["<li>".into(), "</li>".into()])));
        assert_eq!(dynamics, &vec![vec![Child::Text("y".into())]]);
    }

    #[test]
    fn test_shared_statics_errors() {
        let err = Root::from_json(r#"{"s": [""], "c": {"1": {"s": 2}, "2": {"s": 1}}}"#).unwrap_err();
        assert!(matches!(err, crate::fragment::FragmentError::Merge(MergeError::SharedCycle(_))));

        let err = Root::from_json(r#"{"s": [""], "c": {"1": {"s": -1}}}"#).unwrap_err();
        assert!(matches!(
            err,
            crate::fragment::FragmentError::Merge(MergeError::MissingComponent(-1))
        ));
    }

    const PLAYLIST: &str = r#"{
        "0": {
            "d": [[" id=\"songs-1\"", "One"], [" id=\"songs-2\"", "Two"]],
            "s": ["<li", ">", "</li>"],
            "stream": ["songs", [["songs-1", -1, null], ["songs-2", -1, null]], [], false]
        },
        "s": ["<ul>", "</ul>"]
    }"#;

    fn rendered(root: &Root) -> String {
        root.render().unwrap()
    }

    #[test]
    fn test_stream_insert_at() {
        let current = root(PLAYLIST);
        assert_eq!(rendered(&current), r#"<ul><li id="songs-1">One</li><li id="songs-2">Two</li></ul>"#);

        let merged = current
            .merge(diff(
                r#"{"0": {"d": [[" id=\"songs-3\"", "Three"], [" id=\"songs-4\"", "Four"]],
                          "stream": ["songs", [["songs-3", 0, null], ["songs-4", -1, null]], []]}}"#,
            ))
            .unwrap();
        assert_eq!(
            rendered(&merged),
            r#"<ul><li id="songs-3">Three</li><li id="songs-1">One</li><li id="songs-2">Two</li><li id="songs-4">Four</li></ul>"#
        );
    }

    #[test]
    fn test_stream_update_and_delete() {
        let merged = root(PLAYLIST)
            .merge(diff(
                r#"{"0": {"d": [[" id=\"songs-2\"", "Deux"]], "stream": ["songs", [["songs-2", -1, null]], ["songs-1"]]}}"#,
            ))
            .unwrap();
        assert_eq!(rendered(&merged), r#"<ul><li id="songs-2">Deux</li></ul>"#);

        let kept = merged.clone().merge(diff(r#"{"0": {"d": []}}"#)).unwrap();
        assert_eq!(rendered(&kept), rendered(&merged));
    }

    #[test]
    fn test_stream_reset_and_limit() {
        let reset = root(PLAYLIST)
            .merge(diff(
                r#"{"0": {"d": [[" id=\"songs-9\"", "Nine"]], "stream": ["songs", [["songs-9", -1, null]], [], true]}}"#,
            ))
            .unwrap();
        assert_eq!(rendered(&reset), r#"<ul><li id="songs-9">Nine</li></ul>"#);

        let limited = root(PLAYLIST)
            .merge(diff(
                r#"{"0": {"d": [[" id=\"songs-3\"", "Three"]], "stream": ["songs", [["songs-3", -1, -2]], []]}}"#,
            ))
            .unwrap();
        assert_eq!(
            rendered(&limited),
            r#"<ul><li id="songs-2">Two</li><li id="songs-3">Three</li></ul>"#
        );

        let limited = root(PLAYLIST)
            .merge(diff(
                r#"{"0": {"d": [[" id=\"songs-0\"", "Zero"]], "stream": ["songs", [["songs-0", 0, 2]], []]}}"#,
            ))
            .unwrap();
        assert_eq!(rendered(&limited), r#"<ul><li id="songs-0">Zero</li><li id="songs-1">One</li></ul>"#);
    }

    #[test]
    fn test_stream_id_mismatch() {
        let err = root(PLAYLIST)
            .merge(diff(r#"{"0": {"d": [], "stream": ["albums", [], []]}}"#))
            .unwrap_err();
        assert_eq!(err, MergeError::StreamIdMismatch("songs".into(), "albums".into()));
    }
}
