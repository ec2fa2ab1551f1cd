//! JSON decoding for rendered fragments
//!
//! Objects are read key by key: `"s"` holds statics, `"d"` marks a
//! comprehension, `"p"` holds shared templates, `"stream"` holds row edits,
//! `"c"` holds components and numeric keys are dynamic children. Other keys
//! are ignored.

use log::trace;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::error::FragmentError;
use super::{
    Child, Children, Component, ComponentDiff, ComponentStatics, Components, Fragment, Root, RootDiff, Statics, Stream,
    StreamAttribute, StreamItem, Templates,
};

type Object = Map<String, Value>;

pub(super) fn root(json: &str) -> Result<Root, FragmentError> {
    let mut object = object(serde_json::from_str(json)?, "root")?;
    let components = match object.remove("c") {
        Some(value) => components(value, component)?,
        None => Components::default(),
    };
    let fragment = fragment(object)?;
    if fragment.statics().is_none() {
        return Err(FragmentError::decode("root fragment has no statics"));
    }
    Ok(Root { fragment, components })
}

pub(super) fn root_diff(json: &str) -> Result<RootDiff, FragmentError> {
    let mut object = object(serde_json::from_str(json)?, "root diff")?;
    let components = match object.remove("c") {
        Some(value) => components(value, component_diff)?,
        None => FxHashMap::default(),
    };
    Ok(RootDiff {
        fragment: fragment(object)?,
        components,
    })
}

fn object(value: Value, what: &str) -> Result<Object, FragmentError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(FragmentError::decode(format!("{what} must be an object, found {other}"))),
    }
}

fn integer(value: &Value, what: &str) -> Result<i32, FragmentError> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| FragmentError::decode(format!("{what} must be an integer, found {value}")))
}

fn strings(value: Value, what: &str) -> Result<Vec<String>, FragmentError> {
    let Value::Array(items) = value else {
        return Err(FragmentError::decode(format!("{what} must be an array of strings")));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(FragmentError::decode(format!("{what} holds a non-string {other}"))),
        })
        .collect()
}

fn fragment(mut object: Object) -> Result<Fragment, FragmentError> {
    let statics = object.remove("s").map(statics).transpose()?;
    let stream = object.remove("stream").map(stream).transpose()?;

    if let Some(rows) = object.remove("d") {
        let templates = match object.remove("p") {
            Some(value) => templates(value)?,
            None => Templates::default(),
        };
        return Ok(Fragment::Comprehension {
            statics,
            dynamics: dynamics(rows)?,
            templates,
            stream,
        });
    }
    if stream.is_some() {
        return Err(FragmentError::decode("stream outside a comprehension"));
    }
    Ok(Fragment::Regular {
        statics,
        children: children(object)?,
    })
}

fn statics(value: Value) -> Result<Statics, FragmentError> {
    match value {
        Value::Number(_) => integer(&value, "template reference").map(Statics::Template),
        other => strings(other, "statics").map(Statics::Inline),
    }
}

fn templates(value: Value) -> Result<Templates, FragmentError> {
    let mut templates = Templates::default();
    for (key, statics) in object(value, "templates")? {
        let id = key
            .parse::<i32>()
            .map_err(|_| FragmentError::decode(format!("invalid template id {key:?}")))?;
        templates.insert(id, strings(statics, "template")?);
    }
    Ok(templates)
}

fn dynamics(value: Value) -> Result<Vec<Vec<Child>>, FragmentError> {
    let Value::Array(rows) = value else {
        return Err(FragmentError::decode("comprehension rows must be an array"));
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => cells.into_iter().map(child).collect(),
            other => Err(FragmentError::decode(format!("comprehension row must be an array, found {other}"))),
        })
        .collect()
}

fn stream(value: Value) -> Result<Stream, FragmentError> {
    let Value::Array(entries) = value else {
        return Err(FragmentError::decode(format!("stream must be an array, found {value}")));
    };
    let mut attributes = Vec::with_capacity(entries.len());
    for entry in entries {
        let attribute = match entry {
            Value::String(id) => StreamAttribute::Id(id),
            Value::Bool(reset) => StreamAttribute::Reset(reset),
            Value::Array(items) if items.is_empty() => continue,
            Value::Array(items) if items.iter().all(Value::is_array) => {
                StreamAttribute::Inserts(items.into_iter().map(stream_item).collect::<Result<_, _>>()?)
            }
            value @ Value::Array(_) => StreamAttribute::Deletes(strings(value, "stream deletes")?),
            other => return Err(FragmentError::decode(format!("invalid stream entry {other}"))),
        };
        attributes.push(attribute);
    }
    Stream::try_from(attributes)
}

/// `[row_id, at, limit]`; trailing fields are ignored
fn stream_item(value: Value) -> Result<StreamItem, FragmentError> {
    let invalid = || FragmentError::decode(format!("invalid stream insert {value}"));
    let Value::Array(fields) = &value else {
        return Err(invalid());
    };
    let id = fields.first().and_then(Value::as_str).ok_or_else(invalid)?;
    let at = fields.get(1).ok_or_else(invalid).and_then(|at| integer(at, "stream insert index"))?;
    let limit = match fields.get(2) {
        None | Some(Value::Null) => None,
        Some(limit) => Some(integer(limit, "stream limit")?),
    };
    Ok(StreamItem {
        id: id.to_owned(),
        at,
        limit,
    })
}

fn children(object: Object) -> Result<Children, FragmentError> {
    let mut children = Children::default();
    for (key, value) in object {
        match key.parse::<usize>() {
            Ok(index) => {
                children.insert(index, child(value)?);
            }
            Err(_) => trace!("ignoring fragment key {key:?}"),
        }
    }
    Ok(children)
}

fn child(value: Value) -> Result<Child, FragmentError> {
    match value {
        Value::String(text) => Ok(Child::Text(text)),
        Value::Number(_) => integer(&value, "component id").map(Child::Component),
        Value::Array(_) => strings(value, "text child").map(|parts| Child::Text(parts.concat())),
        Value::Object(object) => fragment(object).map(Child::Fragment),
        other => Err(FragmentError::decode(format!("invalid dynamic child {other}"))),
    }
}

fn components<T>(
    value: Value,
    decode: fn(Object) -> Result<T, FragmentError>,
) -> Result<FxHashMap<i32, T>, FragmentError> {
    let mut out = FxHashMap::default();
    for (key, value) in object(value, "components")? {
        let id = key
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| FragmentError::decode(format!("invalid component id {key:?}")))?;
        out.insert(id, decode(object(value, "component")?)?);
    }
    Ok(out)
}

fn component(mut object: Object) -> Result<Component, FragmentError> {
    let statics = match object.remove("s") {
        Some(value @ Value::Number(_)) => ComponentStatics::Shared(integer(&value, "shared statics")?),
        Some(value) => ComponentStatics::Inline(strings(value, "component statics")?),
        None => return Err(FragmentError::decode("component has no statics")),
    };
    Ok(Component {
        statics,
        children: children(object)?,
    })
}

fn component_diff(object: Object) -> Result<ComponentDiff, FragmentError> {
    if object.contains_key("s") {
        component(object).map(ComponentDiff::Replace)
    } else {
        children(object).map(ComponentDiff::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_regular() {
        let root = root(r#"{"0": "a", "1": ["b", "c"], "2": 3, "r": 1, "s": ["<p>", "", "", "</p>"]}"#).unwrap();
        let Fragment::Regular { statics, children } = &root.fragment else {
            panic!("expected a regular fragment");
        };
        assert_eq!(statics, &Some(Statics::Inline(vec!["<p>".into(), "".into(), "".into(), "</p>".into()])));
        assert_eq!(children[&0], Child::Text("a".into()));
        assert_eq!(children[&1], Child::Text("bc".into()));
        assert_eq!(children[&2], Child::Component(3));
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn test_decode_comprehension_with_templates() {
        let root = root(r#"{"0": {"d": [["x", {"0": "y", "s": 0}]], "s": ["", "", ""], "p": {"0": ["<b>", "</b>"]}}, "s": ["", ""]}"#)
            .unwrap();
        let Fragment::Regular { children, .. } = &root.fragment else {
            panic!("expected a regular fragment");
        };
        let Child::Fragment(Fragment::Comprehension { dynamics, templates, .. }) = &children[&0] else {
            panic!("expected a comprehension");
        };
        assert_eq!(dynamics.len(), 1);
        assert_eq!(templates[&0], vec!["<b>".to_string(), "</b>".to_string()]);
        assert!(matches!(&dynamics[0][1], Child::Fragment(f) if f.statics() == Some(&Statics::Template(0))));
    }

    #[test]
    fn test_decode_components() {
        let root = root(r#"{"0": 1, "s": ["", ""], "c": {"1": {"0": "x", "s": ["<i>", "</i>"]}, "2": {"s": -1}}}"#).unwrap();
        assert_eq!(root.components[&1].statics, ComponentStatics::Inline(vec!["<i>".into(), "</i>".into()]));
        assert_eq!(root.components[&2].statics, ComponentStatics::Shared(-1));

        let diff = root_diff(r#"{"c": {"1": {"0": "y"}, "2": {"s": ["a"]}}}"#).unwrap();
        assert!(matches!(diff.components[&1], ComponentDiff::Update(_)));
        assert!(matches!(diff.components[&2], ComponentDiff::Replace(_)));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(root("[]"), Err(FragmentError::Decode(_))));
        assert!(matches!(root("{"), Err(FragmentError::Json(_))));
        assert!(matches!(root(r#"{"0": "a"}"#), Err(FragmentError::Decode(_))));
        assert!(matches!(root(r#"{"s": [1]}"#), Err(FragmentError::Decode(_))));
        assert!(matches!(root(r#"{"0": true, "s": ["", ""]}"#), Err(FragmentError::Decode(_))));
        assert!(matches!(root(r#"{"s": [""], "c": {"x": {"s": [""]}}}"#), Err(FragmentError::Decode(_))));
        assert!(matches!(root(r#"{"s": [""], "c": {"1": {"0": "a"}}}"#), Err(FragmentError::Decode(_))));
        assert!(matches!(
            root(r#"{"0": {"0": "a", "s": ["", ""], "stream": ["0", [], []]}, "s": ["", ""]}"#),
            Err(FragmentError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_stream() {
        let diff = root_diff(
            r#"{"0": {"d": [[" id=\"s-1\""]], "stream": ["songs", [["s-1", -1, null], ["s-2", 0, 5, false]], ["s-0"], true]}}"#,
        )
        .unwrap();
        let Fragment::Regular { children, .. } = &diff.fragment else {
            panic!("expected a regular fragment");
        };
        let Child::Fragment(Fragment::Comprehension { stream: Some(stream), .. }) = &children[&0] else {
            panic!("expected a streamed comprehension");
        };
        assert_eq!(
            stream,
            &Stream {
                id: "songs".into(),
                inserts: vec![
                    StreamItem {
                        id: "s-1".into(),
                        at: -1,
                        limit: None,
                    },
                    StreamItem {
                        id: "s-2".into(),
                        at: 0,
                        limit: Some(5),
                    },
                ],
                deletes: vec!["s-0".into()],
                reset: true,
            }
        );

        let empty = root_diff(r#"{"0": {"d": [], "stream": ["songs", [], [], false]}}"#).unwrap();
        let Fragment::Regular { children, .. } = &empty.fragment else {
            panic!("expected a regular fragment");
        };
        assert!(matches!(
            &children[&0],
            Child::Fragment(Fragment::Comprehension { stream: Some(s), .. }) if s.id == "songs" && s.inserts.is_empty()
        ));
    }

    #[test]
    fn test_decode_stream_errors() {
        let bad = [
            r#"{"0": {"d": [], "stream": [[], [], false]}}"#,
            r#"{"0": {"d": [], "stream": "songs"}}"#,
            r#"{"0": {"d": [], "stream": ["songs", 3]}}"#,
            r#"{"0": {"d": [], "stream": ["songs", [["s-1"]]]}}"#,
            r#"{"0": {"d": [], "stream": ["songs", [["s-1", -1, "x"]]]}}"#,
            r#"{"0": {"d": [], "stream": ["songs", ["s-1", 2]]}}"#,
        ];
        for json in bad {
            assert!(matches!(root_diff(json), Err(FragmentError::Decode(_))), "{json}");
        }
    }
}
