//! Context stacks (C3): the element-name path, and exactly one of the
//! namespace-binding snapshots (inject mode) or recorded segment texts
//! (wrap mode), always kept at height `depth`.

use std::collections::HashMap;

use crate::name::QName;

/// The three parallel stacks described in spec §3, minus whichever one the
/// active mode doesn't need.
#[derive(Debug, Default)]
pub struct Context {
    pub path: Vec<QName>,
    namespaces: Option<Vec<HashMap<String, String>>>,
    segments: Option<Vec<(QName, String)>>,
}

impl Context {
    pub fn new(wrap: bool) -> Self {
        Context {
            path: Vec::new(),
            namespaces: if wrap { None } else { Some(Vec::new()) },
            segments: if wrap { Some(Vec::new()) } else { None },
        }
    }

    pub fn depth(&self) -> u64 {
        self.path.len() as u64
    }

    /// Pushes the element onto `path`, and for inject mode, a fresh
    /// namespace frame = parent frame ∪ `declared` (child wins ties).
    pub fn enter(&mut self, name: QName, declared: impl IntoIterator<Item = (String, String)>) {
        if let Some(frames) = &mut self.namespaces {
            let mut frame = frames.last().cloned().unwrap_or_default();
            for (prefix, uri) in declared {
                frame.insert(prefix, uri);
            }
            frames.push(frame);
        }
        self.path.push(name);
    }

    /// Records `text` (the verbatim start-tag span) as a wrap-mode ancestor
    /// segment. No-op outside wrap mode.
    pub fn push_segment(&mut self, name: QName, text: String) {
        if let Some(segments) = &mut self.segments {
            segments.push((name, text));
        }
    }

    /// Pops one level: `path`, the namespace frame (inject mode), and in
    /// wrap mode every segment pushed since (and including) the matching
    /// entry for `name` — ordinarily exactly one.
    pub fn exit(&mut self, name: &QName) {
        self.path.pop();
        if let Some(frames) = &mut self.namespaces {
            frames.pop();
        }
        if let Some(segments) = &mut self.segments {
            while let Some((top_name, _)) = segments.pop() {
                if top_name == *name {
                    break;
                }
            }
        }
    }

    pub fn namespace_frame(&self) -> Option<&HashMap<String, String>> {
        self.namespaces.as_ref().and_then(|f| f.last())
    }

    pub fn segments(&self) -> &[(QName, String)] {
        self.segments.as_deref().unwrap_or(&[])
    }

    pub fn current_path_name(&self) -> Option<&QName> {
        self.path.last()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrap_mode_tracks_only_segments() {
        let mut ctx = Context::new(true);
        ctx.enter(QName::new("", "a", ""), []);
        ctx.push_segment(QName::new("", "a", ""), "<a>".into());
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.namespace_frame().is_none());
        ctx.exit(&QName::new("", "a", ""));
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.segments().is_empty());
    }

    #[test]
    fn inject_mode_inherits_parent_bindings() {
        let mut ctx = Context::new(false);
        ctx.enter(QName::new("u", "a", ""), [("".to_string(), "u".to_string())]);
        ctx.enter(QName::new("v", "b", ""), [("".to_string(), "v".to_string())]);
        assert_eq!(ctx.namespace_frame().unwrap().get(""), Some(&"v".to_string()));
        ctx.exit(&QName::new("v", "b", ""));
        assert_eq!(ctx.namespace_frame().unwrap().get(""), Some(&"u".to_string()));
    }
}
