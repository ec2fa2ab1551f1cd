//! Rendering a root to markup
//!
//! Statics and dynamics interleave: `statics[0]`, child 0, `statics[1]`,
//! child 1, ... up to the last static. Comprehensions repeat that for every
//! row. Templates declared on a comprehension are visible to everything
//! nested inside it.

use std::borrow::Cow;

use smallvec::SmallVec;

use super::error::RenderError;
use super::{Child, Component, ComponentStatics, Components, Fragment, Root, Statics, Templates};

impl Root {
    /// Render the full markup this root describes.
    pub fn render(&self) -> Result<String, RenderError> {
        let mut renderer = Renderer {
            components: &self.components,
            active: SmallVec::new(),
            out: String::new(),
        };
        renderer.fragment(&self.fragment, None)?;
        Ok(renderer.out)
    }
}

struct Renderer<'a> {
    components: &'a Components,
    /// Components currently being rendered, innermost last
    active: SmallVec<[i32; 8]>,
    out: String,
}

fn resolve<'t>(statics: &'t Statics, templates: Option<&'t Templates>) -> Result<&'t [String], RenderError> {
    match statics {
        Statics::Inline(statics) => Ok(statics),
        Statics::Template(id) => templates
            .and_then(|templates| templates.get(id))
            .map(Vec::as_slice)
            .ok_or(RenderError::TemplateNotFound(*id)),
    }
}

impl<'a> Renderer<'a> {
    fn fragment(&mut self, fragment: &Fragment, templates: Option<&Templates>) -> Result<(), RenderError> {
        match fragment {
            Fragment::Regular { statics, children } => {
                let statics = statics.as_ref().ok_or(RenderError::MissingStatics)?;
                let statics = resolve(statics, templates)?;
                self.interleave(statics, |i| children.get(&i), templates)
            }
            Fragment::Comprehension {
                statics,
                dynamics,
                templates: own,
                ..
            } => {
                let templates: Cow<'_, Templates> = match templates {
                    Some(outer) if !own.is_empty() => {
                        let mut merged = outer.clone();
                        merged.extend(own.iter().map(|(id, statics)| (*id, statics.clone())));
                        Cow::Owned(merged)
                    }
                    Some(outer) => Cow::Borrowed(outer),
                    None => Cow::Borrowed(own),
                };
                let templates = Some(templates.as_ref());

                match statics {
                    Some(statics) => {
                        let statics = resolve(statics, templates)?;
                        for row in dynamics {
                            self.interleave(statics, |i| row.get(i), templates)?;
                        }
                    }
                    None => {
                        for child in dynamics.iter().flatten() {
                            self.child(child, templates)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn interleave<'c>(
        &mut self,
        statics: &[String],
        child: impl Fn(usize) -> Option<&'c Child>,
        templates: Option<&Templates>,
    ) -> Result<(), RenderError> {
        let Some((first, rest)) = statics.split_first() else {
            return Ok(());
        };
        self.out.push_str(first);
        for (i, text) in rest.iter().enumerate() {
            let child = child(i).ok_or(RenderError::MissingChild(i))?;
            self.child(child, templates)?;
            self.out.push_str(text);
        }
        Ok(())
    }

    fn child(&mut self, child: &Child, templates: Option<&Templates>) -> Result<(), RenderError> {
        match child {
            Child::Text(text) => {
                self.out.push_str(text);
                Ok(())
            }
            Child::Fragment(fragment) => self.fragment(fragment, templates),
            Child::Component(id) => self.component(*id),
        }
    }

    fn component(&mut self, id: i32) -> Result<(), RenderError> {
        if self.active.contains(&id) {
            return Err(RenderError::ComponentCycle(id));
        }
        let components: &'a Components = self.components;
        let component: &'a Component = components.get(&id).ok_or(RenderError::ComponentNotFound(id))?;
        let ComponentStatics::Inline(statics) = &component.statics else {
            return Err(RenderError::UnresolvedStatics(id));
        };

        self.active.push(id);
        self.interleave(statics, |i| component.children.get(&i), None)?;
        self.active.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(json: &str) -> Result<String, RenderError> {
        Root::from_json(json).unwrap().render()
    }

    #[test]
    fn test_interleave_statics_and_components() {
        let out = render(r#"{"0": "foo", "1": 1, "s": ["1", "2", "3"], "c": {"1": {"0": "bar", "s": ["4", "5"]}}}"#);
        assert_eq!(out.unwrap(), "1foo24bar53");
    }

    #[test]
    fn test_comprehension_with_templates_and_shared_statics() {
        let json = r#"{
            "0": {
                "d": [
                    ["foo", {"d": [["0", 1], ["1", 2]], "s": 0}],
                    ["bar", {"d": [["0", 3], ["1", 4]], "s": 0}]
                ],
                "s": ["\n  <p>\n    ", "\n    ", "\n  </p>\n"],
                "p": {"0": ["<span>", ": ", "</span>"]}
            },
            "c": {
                "1": {"0": "index_1", "1": "world", "s": ["<b>FROM ", " ", "</b>"]},
                "2": {"0": "index_2", "1": "world", "s": 1},
                "3": {"0": "index_1", "1": "world", "s": 1},
                "4": {"0": "index_2", "1": "world", "s": 3}
            },
            "s": ["<div>", "</div>"]
        }"#;
        let expected = "<div>\n  <p>\n    foo\n    \
            <span>0: <b>FROM index_1 world</b></span><span>1: <b>FROM index_2 world</b></span>\n  </p>\n\n  <p>\n    bar\n    \
            <span>0: <b>FROM index_1 world</b></span><span>1: <b>FROM index_2 world</b></span>\n  </p>\n</div>";
        assert_eq!(render(json).unwrap(), expected);
    }

    #[test]
    fn test_comprehension_without_statics_concatenates() {
        let out = render(r#"{"0": {"d": [["a", "b"], ["c"]]}, "s": ["[", "]"]}"#);
        assert_eq!(out.unwrap(), "[abc]");
    }

    #[test]
    fn test_render_errors() {
        assert_eq!(render(r#"{"s": ["a", "b"]}"#), Err(RenderError::MissingChild(0)));
        assert_eq!(render(r#"{"0": 7, "s": ["", ""]}"#), Err(RenderError::ComponentNotFound(7)));
        assert_eq!(
            render(r#"{"0": {"0": "x", "s": 4}, "s": ["", ""]}"#),
            Err(RenderError::TemplateNotFound(4))
        );
        assert_eq!(render(r#"{"0": {"0": "x"}, "s": ["", ""]}"#), Err(RenderError::MissingStatics));
        assert_eq!(
            render(r#"{"0": 1, "s": ["", ""], "c": {"1": {"0": 1, "s": ["", ""]}}}"#),
            Err(RenderError::ComponentCycle(1))
        );
    }
}
