//! Candidate resolution: one strategy per completion kind, all reading the
//! symbol database and returning an ordered, de-duplicated candidate list.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::symbols::{ClassId, MethodId, SymbolDatabase};
use crate::tokens::TokenKind;

use super::context::{CompletionContext, CompletionKind};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted into the buffer and matched against the filter.
    pub text: String,
    /// Label shown in the menu; may carry an owner or ambiguity annotation.
    pub label: String,
    /// Resolved method, when the candidate maps to exactly one.
    pub method: Option<MethodId>,
}

impl Candidate {
    fn plain(name: &str) -> Self {
        Self { text: name.to_owned(), label: name.to_owned(), method: None }
    }
}

/// Pseudo-variables whose class is known without any type system.
static PSEUDO_VARIABLE_CLASSES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    FxHashMap::from_iter([
        ("true", "True"),
        ("false", "False"),
        ("nil", "Nil"),
        ("inf", "Float"),
        ("thisProcess", "Main"),
        ("thisFunction", "Function"),
        ("thisFunctionDef", "FunctionDef"),
        ("thisMethod", "Method"),
        ("thisThread", "Thread"),
        ("currentEnvironment", "Environment"),
        ("topEnvironment", "Environment"),
    ])
});

/// Upper bound of the half-open prefix range `[base, bump(base))`: the last
/// character's code point bumped by one. `None` means unbounded (empty base).
fn prefix_range_end(base: &str) -> Option<String> {
    let mut end = base.to_owned();
    let last = end.pop()?;
    let bumped = char::from_u32(last as u32 + 1)?;
    end.push(bumped);
    Some(end)
}

/// Resolve candidates for a classified context. An empty result means the
/// completion degrades to a no-op; it is never an error.
pub fn resolve(db: &SymbolDatabase, context: &CompletionContext) -> Vec<Candidate> {
    match context.kind {
        CompletionKind::Class => resolve_class(db, &context.base),
        CompletionKind::ClassMethod => resolve_class_method(db, &context.base),
        CompletionKind::Method => resolve_method(db, &context.base),
        CompletionKind::InferredObjectMethod => resolve_inferred(db, context),
    }
}

/// All class names sharing the base prefix, in name order.
fn resolve_class(db: &SymbolDatabase, base: &str) -> Vec<Candidate> {
    let end = prefix_range_end(base);
    let candidates: Vec<_> = db
        .class_range(base, end.as_deref())
        .map(|(name, _)| Candidate::plain(name))
        .collect();
    if candidates.is_empty() {
        debug!(base, "completion: no class matches");
    }
    candidates
}

/// Class-side methods of the named class and its ancestors, in name order.
/// A subclass's method shadows an ancestor's of the same name; operators
/// (names not starting with a letter) are not valid in call syntax and are
/// filtered out.
fn resolve_class_method(db: &SymbolDatabase, base: &str) -> Vec<Candidate> {
    let Some(class) = db.find_class(base) else {
        debug!(class = base, "completion: class not found");
        return Vec::new();
    };

    let mut matching: Vec<(String, MethodId)> = Vec::new();
    let mut seen = FxHashSet::default();
    let mut chain = db.class(class).metaclass;
    while let Some(meta) = chain {
        let descriptor = db.class(meta);
        for &id in &descriptor.methods {
            let name = &db.method(id).name;
            let starts_with_letter = name.chars().next().is_some_and(char::is_alphabetic);
            if !starts_with_letter || seen.contains(name) {
                continue;
            }
            seen.insert(name.clone());
            matching.push((name.clone(), id));
        }
        chain = descriptor.superclass;
    }

    matching.sort_by(|a, b| a.0.cmp(&b.0));
    matching
        .into_iter()
        .map(|(name, id)| Candidate { text: name.clone(), label: name, method: Some(id) })
        .collect()
}

/// Method names sharing the base prefix across the whole flattened table,
/// grouped by name. A name unique to one owning class resolves immediately
/// and shows its owner; an ambiguous name shows the match count and defers
/// resolution to selection time.
fn resolve_method(db: &SymbolDatabase, base: &str) -> Vec<Candidate> {
    let end = prefix_range_end(base);
    let candidates: Vec<_> = db
        .method_range(base, end.as_deref())
        .map(|(name, ids)| {
            if let [only] = ids {
                Candidate {
                    text: name.to_owned(),
                    label: format!("{} [ {} ]", name, db.owner_name(*only)),
                    method: Some(*only),
                }
            } else {
                Candidate {
                    text: name.to_owned(),
                    label: format!("{} [ {} ]", name, ids.len()),
                    method: None,
                }
            }
        })
        .collect();
    if candidates.is_empty() {
        debug!(base, "completion: no method matches");
    }
    candidates
}

/// Instance methods applicable to the inferred class of the receiver.
fn resolve_inferred(db: &SymbolDatabase, context: &CompletionContext) -> Vec<Candidate> {
    let Some(class) = infer_receiver_class(db, context) else {
        debug!(receiver = %context.base, "completion: receiver class not inferable");
        return Vec::new();
    };

    db.all_methods()
        .filter(|&id| !db.is_class_method(id))
        .filter(|&id| {
            let owner = db.method(id).owner;
            class == owner || db.is_subclass_of(class, owner)
        })
        .map(|id| {
            let name = &db.method(id).name;
            Candidate {
                text: name.clone(),
                label: format!("{} [ {} ]", name, db.owner_name(id)),
                method: Some(id),
            }
        })
        .collect()
}

/// Map a receiver literal or pseudo-variable to its concrete class.
pub(crate) fn infer_receiver_class(
    db: &SymbolDatabase,
    context: &CompletionContext,
) -> Option<ClassId> {
    match context.receiver_kind? {
        // An integer-looking token gets no inference: its trailing dot is
        // indistinguishable from a method dot being typed.
        TokenKind::Float if context.base.contains('.') => db.find_class("Float"),
        TokenKind::Float => None,
        TokenKind::Char => db.find_class("Char"),
        TokenKind::String => db.find_class("String"),
        TokenKind::Symbol => db.find_class("Symbol"),
        TokenKind::Builtin => {
            let class = PSEUDO_VARIABLE_CLASSES.get(context.base.as_str())?;
            db.find_class(class)
        }
        _ => None,
    }
}

/// Walk the metaclass chain of `class` looking for a class-side method by
/// name; nearest declaration wins. Shared with the call-hint resolver.
pub(crate) fn find_class_method(
    db: &SymbolDatabase,
    class: ClassId,
    name: &str,
) -> Option<MethodId> {
    let mut chain = db.class(class).metaclass;
    while let Some(meta) = chain {
        let descriptor = db.class(meta);
        if let Some(&id) = descriptor.methods.iter().find(|&&id| db.method(id).name == name) {
            return Some(id);
        }
        chain = descriptor.superclass;
    }
    None
}
