//! Greedy token-budget allocation over referenced objects.
//!
//! The main object is always kept whole. References are considered classes
//! first, then smaller before larger, and each one is kept whole, replaced by
//! its signature-and-doc stub, or dropped, whichever is the first that still
//! fits. This is a single pass: the order of consideration decides which
//! objects survive at the margin.

use super::tokens::count_tokens;
use crate::core::CodeObject;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOutcome {
    /// Surviving references in priority order.
    pub kept: Vec<CodeObject>,
    pub token_count: usize,
    /// True when any reference was dropped or replaced by a stub.
    pub truncated: bool,
}

/// References sorted by `(kind rank, token count)`, each paired with its cost.
/// The sort is stable so equal keys keep discovery order.
pub fn priority_order(references: Vec<CodeObject>) -> Vec<(CodeObject, usize)> {
    let mut sized: Vec<(CodeObject, usize)> = references
        .into_iter()
        .map(|object| {
            let tokens = count_tokens(&object.source_text);
            (object, tokens)
        })
        .collect();
    sized.sort_by_key(|(object, tokens)| (object.kind.priority_rank(), *tokens));
    sized
}

pub fn prioritize(main: &CodeObject, references: Vec<CodeObject>, token_limit: usize) -> BudgetOutcome {
    let mut current = count_tokens(&main.source_text);
    let mut kept = Vec::new();
    let mut truncated = false;

    for (object, tokens) in priority_order(references) {
        if current + tokens <= token_limit {
            current += tokens;
            kept.push(object);
            continue;
        }

        truncated = true;
        let stub_text = object.truncated_text();
        let stub_tokens = count_tokens(&stub_text);
        if current + stub_tokens <= token_limit {
            current += stub_tokens;
            kept.push(CodeObject {
                source_text: stub_text,
                truncated: true,
                ..object
            });
        } else {
            log::debug!(
                "Dropping {} from {} ({} tokens) to stay under {}",
                object.name,
                object.file_path.display(),
                tokens,
                token_limit
            );
        }
    }

    BudgetOutcome {
        kept,
        token_count: current,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, ObjectKind, ReferenceKind};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn object(name: &str, kind: ObjectKind, words: usize) -> CodeObject {
        let keyword = if kind == ObjectKind::Class { "class" } else { "def" };
        let signature = format!("{keyword} {name}:");
        let body = vec!["x"; words.saturating_sub(2)].join(" ");
        CodeObject {
            name: name.to_string(),
            file_path: PathBuf::from(format!("/p/{name}.py")),
            start_line: 1,
            kind,
            source_text: format!("{signature}\n    {body}"),
            doc_comment: String::new(),
            reference_kind: ReferenceKind::Import,
            truncated: false,
            signature,
            language: Language::Python,
        }
    }

    fn main_object(words: usize) -> CodeObject {
        CodeObject {
            kind: ObjectKind::Module,
            reference_kind: ReferenceKind::None,
            ..object("main", ObjectKind::Module, words)
        }
    }

    #[test]
    fn classes_come_before_functions_then_size() {
        let order = priority_order(vec![
            object("small_fn", ObjectKind::Function, 5),
            object("big_class", ObjectKind::Class, 50),
            object("tiny_fn", ObjectKind::Function, 3),
            object("small_class", ObjectKind::Class, 10),
        ]);
        let names: Vec<&str> = order.iter().map(|(o, _)| o.name.as_str()).collect();
        assert_eq!(names, vec!["small_class", "big_class", "tiny_fn", "small_fn"]);
    }

    #[test]
    fn everything_fits_nothing_truncated() {
        let outcome = prioritize(
            &main_object(10),
            vec![object("f", ObjectKind::Function, 5)],
            100,
        );
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.token_count, 15);
        assert!(!outcome.truncated);
    }

    #[test]
    fn oversized_class_degrades_to_stub_before_function_is_tried() {
        // main: 20 tokens, budget leaves 100 for references
        let class = object("C", ObjectKind::Class, 200);
        let function = object("f", ObjectKind::Function, 50);
        let outcome = prioritize(&main_object(20), vec![function, class], 120);

        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.kept[0].name, "C");
        assert!(outcome.kept[0].truncated);
        assert_eq!(
            outcome.kept[0].source_text,
            "class C:\n    # ... code truncated due to token limit"
        );
        assert_eq!(outcome.kept[1].name, "f");
        assert!(!outcome.kept[1].truncated);
        // stub tokens: class C # code truncated due to token limit
        assert_eq!(outcome.token_count, 20 + 9 + 50);
        assert!(outcome.truncated);
    }

    #[test]
    fn references_that_cannot_even_stub_are_dropped() {
        let outcome = prioritize(
            &main_object(10),
            vec![object("f", ObjectKind::Function, 40)],
            12,
        );
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.token_count, 10);
        assert!(outcome.truncated);
    }

    #[test]
    fn oversized_main_keeps_no_references() {
        let outcome = prioritize(
            &main_object(500),
            vec![object("f", ObjectKind::Function, 3)],
            100,
        );
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.token_count, 500);
    }

    proptest! {
        #[test]
        fn prop_budget_is_respected_unless_main_alone_exceeds_it(
            main_words in 1usize..200,
            sizes in prop::collection::vec((any::<bool>(), 2usize..120), 0..12),
            limit in 1usize..600,
        ) {
            let references: Vec<CodeObject> = sizes
                .iter()
                .enumerate()
                .map(|(i, (is_class, words))| {
                    let kind = if *is_class { ObjectKind::Class } else { ObjectKind::Function };
                    object(&format!("o{i}"), kind, *words)
                })
                .collect();
            let main = main_object(main_words);
            let main_tokens = count_tokens(&main.source_text);
            let outcome = prioritize(&main, references, limit);

            if main_tokens > limit {
                prop_assert!(outcome.kept.is_empty());
                prop_assert_eq!(outcome.token_count, main_tokens);
            } else {
                prop_assert!(outcome.token_count <= limit);
            }
            let kept_tokens: usize = outcome.kept.iter().map(|o| count_tokens(&o.source_text)).sum();
            prop_assert_eq!(outcome.token_count, main_tokens + kept_tokens);
        }
    }
}
