//! Context-sensitive completion over a tokenized document.
//!
//! Candidates come from three places: the lexer's keyword sets (annotated
//! with display strings), the rich Arabic catalog (functions, keywords,
//! snippets), and identifiers observed in the document itself. They are
//! filtered against the word under the cursor, scored, and truncated.

use std::collections::BTreeSet;

use als_analysis::{self as analysis, Token, TokenKind, tokenize};

use crate::database::ArabicCompletionDatabase;
use crate::item::{ArabicCompletionItem, CompletionItemKind, CompletionList};

/// Where the cursor sits, per the token-balance heuristic. No parser here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    FunctionBody,
    ClassBody,
    IfCondition,
    LoopBody,
    FunctionCall,
    Assignment,
    Import,
}

impl ScopeKind {
    /// The context string matched against `ArabicCompletionItem::contexts`.
    pub fn context_name(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::FunctionBody => "function",
            ScopeKind::ClassBody => "class",
            ScopeKind::IfCondition => "condition",
            ScopeKind::LoopBody => "loop",
            ScopeKind::FunctionCall => "call",
            ScopeKind::Assignment => "assignment",
            ScopeKind::Import => "import",
        }
    }
}

/// Everything the scorer needs to know about the cursor.
#[derive(Debug, Clone)]
pub struct CompletionContext {
    pub scope: ScopeKind,
    pub available_variables: Vec<String>,
    pub available_functions: Vec<String>,
    pub available_classes: Vec<String>,
    pub cursor_line: usize,
    pub cursor_column: usize,
    pub current_word: String,
}

pub struct CompletionProvider {
    max_suggestions: usize,
    enable_snippets: bool,
}

impl Default for CompletionProvider {
    fn default() -> Self {
        CompletionProvider::new(50, true)
    }
}

impl CompletionProvider {
    pub fn new(max_suggestions: usize, enable_snippets: bool) -> Self {
        CompletionProvider {
            max_suggestions,
            enable_snippets,
        }
    }

    /// Produce the completion list for a cursor at `line`/`character`
    /// (0-based, as on the wire) in `text`.
    pub fn provide(&self, uri: &str, text: &str, line: usize, character: usize) -> CompletionList {
        let (tokens, errors) = tokenize(text);
        if !errors.is_empty() {
            log::debug!("completion for {uri}: {} lexer errors ignored", errors.len());
        }

        let cursor = offset_at(text, line, character);

        // No completions while typing inside a comment or a string.
        let suppressed = tokens.iter().any(|t| {
            matches!(t.kind, TokenKind::Comment | TokenKind::String) && t.covers_offset(cursor)
        });
        if suppressed {
            return CompletionList {
                is_incomplete: false,
                items: Vec::new(),
            };
        }

        let context = self.build_context(text, &tokens, cursor, line, character);
        log::debug!(
            "completion for {uri} at {line}:{character} scope={:?} word={:?}",
            context.scope,
            context.current_word
        );

        let mut candidates = self.collect_candidates(&tokens, &context);
        candidates = filter_candidates(candidates, &context.current_word);

        let mut scored: Vec<(i32, ArabicCompletionItem)> = candidates
            .into_iter()
            .map(|item| (score(&item, &context), item))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.priority.cmp(&a.1.priority)));
        scored.truncate(self.max_suggestions);

        CompletionList {
            is_incomplete: false,
            items: scored.into_iter().map(|(_, item)| item).collect(),
        }
    }

    /// Assemble the `CompletionContext` for a cursor byte offset.
    pub fn build_context(
        &self,
        text: &str,
        tokens: &[Token],
        cursor: usize,
        line: usize,
        character: usize,
    ) -> CompletionContext {
        let current_word = current_word_at(text, cursor);
        let scope = detect_scope(tokens, cursor);

        let mut variables = BTreeSet::new();
        let mut functions = BTreeSet::new();
        let mut classes = BTreeSet::new();
        let mut prev_keyword: Option<&str> = None;
        for token in tokens {
            match token.kind {
                TokenKind::Identifier => match prev_keyword {
                    Some("دالة") => {
                        functions.insert(token.text.clone());
                    }
                    Some("صنف") => {
                        classes.insert(token.text.clone());
                    }
                    _ => {
                        variables.insert(token.text.clone());
                    }
                },
                _ => {}
            }
            prev_keyword = if token.kind == TokenKind::Keyword {
                Some(token.text.as_str())
            } else {
                None
            };
        }

        CompletionContext {
            scope,
            available_variables: variables.into_iter().collect(),
            available_functions: functions.into_iter().collect(),
            available_classes: classes.into_iter().collect(),
            cursor_line: line,
            cursor_column: character,
            current_word,
        }
    }

    fn collect_candidates(
        &self,
        tokens: &[Token],
        context: &CompletionContext,
    ) -> Vec<ArabicCompletionItem> {
        let db = ArabicCompletionDatabase::global();
        let mut items: Vec<ArabicCompletionItem> = db.all_completions().to_vec();

        if self.enable_snippets {
            items.extend(db.builtin_snippets().iter().map(|s| s.to_completion_item()));
        }

        items.extend(keyword_completions());

        // Identifiers seen in the document, except the word being typed.
        let mut seen = BTreeSet::new();
        for token in tokens {
            if token.kind == TokenKind::Identifier && token.text != context.current_word {
                seen.insert(token.text.clone());
            }
        }
        for name in seen {
            let kind = if context.available_functions.contains(&name) {
                CompletionItemKind::Function
            } else if context.available_classes.contains(&name) {
                CompletionItemKind::Class
            } else {
                CompletionItemKind::Variable
            };
            let mut item = ArabicCompletionItem::new(name, kind);
            item.arabic_description = "معرف من المستند الحالي".to_string();
            item.priority = 40;
            items.push(item);
        }

        // The lexer sets and the catalog overlap on a few labels; the first
        // occurrence (the richer catalog entry) wins.
        let mut labels = BTreeSet::new();
        items.retain(|item| labels.insert(item.label.clone()));
        items
    }
}

/// Completion entries for the raw lexer keyword sets. These carry only a
/// short English annotation; the catalog has the rich entries.
fn keyword_completions() -> Vec<ArabicCompletionItem> {
    fn entry(label: &str, english: &str, description: &str) -> ArabicCompletionItem {
        let mut item = ArabicCompletionItem::new(label, CompletionItemKind::Keyword);
        item.english_name = english.to_string();
        item.arabic_description = description.to_string();
        item.priority = 60;
        item
    }

    let mut items = vec![
        entry("اذا", "if", "جملة شرطية"),
        entry("إذا", "if", "جملة شرطية"),
        entry("والا", "else", "البديل الافتراضي"),
        entry("وإلا", "else", "البديل الافتراضي"),
        entry("اواذا", "elif", "شرط إضافي"),
        entry("أوإذا", "elif", "شرط إضافي"),
        entry("بينما", "while", "حلقة شرطية"),
        entry("لاجل", "for", "حلقة تكرار"),
        entry("لأجل", "for", "حلقة تكرار"),
        entry("دالة", "function", "تعريف دالة"),
        entry("صنف", "class", "تعريف صنف"),
        entry("ارجع", "return", "إرجاع قيمة"),
        entry("في", "in", "عضوية في مجموعة"),
        entry("من", "from", "استيراد من وحدة"),
        entry("استورد", "import", "استيراد وحدة"),
        entry("حاول", "try", "كتلة محاولة"),
        entry("خلل", "except", "معالجة خلل"),
        entry("نهاية", "finally", "كتلة نهائية"),
        entry("توقف", "break", "إيقاف الحلقة"),
        entry("استمر", "continue", "متابعة الحلقة"),
        entry("مرر", "pass", "جملة فارغة"),
        entry("انتظر", "await", "انتظار نتيجة"),
        entry("مزامنة", "async", "تعريف غير متزامن"),
    ];

    for builtin in analysis::Lexer::builtin_keywords() {
        let mut item = entry(builtin, "builtin", "دالة مضمنة");
        item.kind = CompletionItemKind::Function;
        items.push(item);
    }
    for special in analysis::Lexer::special_keywords() {
        items.push(entry(special, "special", "معرف خاص"));
    }
    items
}

/// Prefix filter with a case-folded substring fallback: if nothing
/// prefix-matches on arabic_name, label, or filter_text, fall back to items
/// whose arabic_name contains the word.
fn filter_candidates(
    items: Vec<ArabicCompletionItem>,
    current_word: &str,
) -> Vec<ArabicCompletionItem> {
    if current_word.is_empty() {
        return items;
    }

    let prefixed: Vec<ArabicCompletionItem> = items
        .iter()
        .filter(|item| {
            item.arabic_name.starts_with(current_word)
                || item.label.starts_with(current_word)
                || item.filter_text.starts_with(current_word)
        })
        .cloned()
        .collect();
    if !prefixed.is_empty() {
        return prefixed;
    }

    let folded = current_word.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.arabic_name.to_lowercase().contains(&folded))
        .collect()
}

fn score(item: &ArabicCompletionItem, context: &CompletionContext) -> i32 {
    let mut score = item.priority;

    if item.is_applicable_in_context(context.scope.context_name()) {
        score += 20;
    }

    if item.arabic_name.starts_with(&context.current_word) {
        score += 30;
    } else if item.arabic_name.contains(&context.current_word) {
        score += 10;
    }

    if item.has_tag("basic") || item.has_tag("beginner") {
        score += 15;
    }

    score
}

/// Byte offset of a 0-based line/character cursor. Characters count
/// codepoints; positions past the end of a line clamp to the line end.
pub fn offset_at(text: &str, line: usize, character: usize) -> usize {
    let mut line_start = 0;
    if line > 0 {
        let mut seen = 0;
        let mut found = false;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                seen += 1;
                if seen == line {
                    line_start = i + 1;
                    found = true;
                    break;
                }
            }
        }
        if !found {
            return text.len();
        }
    }

    let rest = &text[line_start..];
    let mut count = 0;
    for (i, ch) in rest.char_indices() {
        if count == character || ch == '\n' {
            return line_start + i;
        }
        count += 1;
    }
    text.len()
}

/// Longest identifier-continue run ending at the cursor.
fn current_word_at(text: &str, cursor: usize) -> String {
    let cursor = cursor.min(text.len());
    let before = &text[..cursor];
    let mut start = cursor;
    for (i, ch) in before.char_indices().rev() {
        if analysis::is_identifier_continue(ch) {
            start = i;
        } else {
            break;
        }
    }
    text[start..cursor].to_string()
}

/// Token-balance scope heuristic over the tokens before the cursor.
fn detect_scope(tokens: &[Token], cursor: usize) -> ScopeKind {
    let prior: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::EndOfFile && t.range.end.offset <= cursor)
        .collect();

    if let Some(prev) = prior.last() {
        if prev.kind == TokenKind::Operator && prev.text == "=" {
            return ScopeKind::Assignment;
        }
        if prev.kind == TokenKind::Keyword && matches!(prev.text.as_str(), "استورد" | "من") {
            return ScopeKind::Import;
        }
    }

    let mut stack: Vec<Option<ScopeKind>> = Vec::new();
    for (i, token) in prior.iter().enumerate() {
        if token.kind != TokenKind::Punctuation {
            continue;
        }
        match token.text.as_str() {
            "(" => {
                let introducer = prior[..i].last();
                let scope = match introducer {
                    Some(p) if p.kind == TokenKind::Keyword
                        && matches!(p.text.as_str(), "اذا" | "إذا" | "بينما") =>
                    {
                        Some(ScopeKind::IfCondition)
                    }
                    Some(p) if matches!(
                        p.kind,
                        TokenKind::Identifier | TokenKind::Keyword1 | TokenKind::Keyword2
                    ) =>
                    {
                        Some(ScopeKind::FunctionCall)
                    }
                    _ => None,
                };
                stack.push(scope);
            }
            "{" => stack.push(brace_scope(&prior[..i])),
            ")" | "}" => {
                stack.pop();
            }
            _ => {}
        }
    }

    stack
        .iter()
        .rev()
        .find_map(|entry| *entry)
        .unwrap_or(ScopeKind::Global)
}

/// Scan backwards from an opening brace to the start of its statement and
/// classify the body it introduces.
fn brace_scope(before: &[&Token]) -> Option<ScopeKind> {
    for token in before.iter().rev() {
        match token.kind {
            TokenKind::Punctuation if matches!(token.text.as_str(), "{" | "}" | ";") => {
                return None;
            }
            TokenKind::Keyword => match token.text.as_str() {
                "دالة" => return Some(ScopeKind::FunctionBody),
                "صنف" => return Some(ScopeKind::ClassBody),
                "لاجل" | "لأجل" | "بينما" => return Some(ScopeKind::LoopBody),
                _ => {}
            },
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provide(text: &str, line: usize, character: usize) -> CompletionList {
        CompletionProvider::default().provide("file:///test.alif", text, line, character)
    }

    // ── suppression ──────────────────────────────────────────────

    #[test]
    fn no_completions_inside_comment() {
        let list = provide("# تعليق طويل", 0, 5);
        assert!(list.items.is_empty());
    }

    #[test]
    fn no_completions_inside_string() {
        let list = provide("اطبع(\"مرحبا\")", 0, 8);
        assert!(list.items.is_empty());
    }

    #[test]
    fn completions_resume_after_string() {
        let list = provide("متغير س = \"نص\" ", 0, 15);
        assert!(!list.items.is_empty());
    }

    // ── ranking ──────────────────────────────────────────────────

    #[test]
    fn print_ranks_first_for_its_prefix() {
        let list = provide("اط", 0, 2);
        assert!(!list.items.is_empty());
        let first = &list.items[0];
        assert_eq!(first.label, "اطبع");
        assert_eq!(first.kind, CompletionItemKind::Function);
        assert!(!first.arabic_description.is_empty());
    }

    #[test]
    fn empty_document_returns_full_ranked_catalog() {
        let list = provide("", 0, 0);
        assert!(!list.items.is_empty());
        assert!(list.items.len() <= 50);
        assert!(!list.is_incomplete);
        // Highest-priority basics float to the top.
        let labels: Vec<&str> = list.items.iter().take(5).map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"اطبع"), "top labels were {labels:?}");
    }

    #[test]
    fn result_is_truncated_to_the_configured_maximum() {
        let provider = CompletionProvider::new(10, true);
        let list = provider.provide("file:///t.alif", "", 0, 0);
        assert_eq!(list.items.len(), 10);
    }

    // ── filtering ────────────────────────────────────────────────

    #[test]
    fn prefix_filter_keeps_only_matching_items() {
        let list = provide("جذ", 0, 2);
        assert!(list.items.iter().all(|i| {
            i.arabic_name.starts_with("جذ")
                || i.label.starts_with("جذ")
                || i.filter_text.starts_with("جذ")
        }));
        assert_eq!(list.items[0].label, "جذر");
    }

    #[test]
    fn substring_fallback_when_nothing_prefix_matches() {
        // "طبع" is not a prefix of anything in the catalog but is inside اطبع.
        let list = provide("طبع", 0, 3);
        assert!(!list.items.is_empty());
        assert!(list
            .items
            .iter()
            .all(|i| i.arabic_name.contains("طبع")));
    }

    #[test]
    fn document_identifiers_are_offered_but_current_word_is_not() {
        let text = "متغير العداد = 5\nالع";
        let list = provide(text, 1, 3);
        let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"العداد"), "labels: {labels:?}");
        assert!(!labels.contains(&"الع"));
    }

    // ── scope detection ──────────────────────────────────────────

    fn scope_of(text: &str, line: usize, character: usize) -> ScopeKind {
        let (tokens, _) = tokenize(text);
        let cursor = offset_at(text, line, character);
        detect_scope(&tokens, cursor)
    }

    #[test]
    fn top_level_is_global() {
        assert_eq!(scope_of("متغير س = 5\n", 1, 0), ScopeKind::Global);
    }

    #[test]
    fn braces_after_function_keyword_are_function_body() {
        assert_eq!(scope_of("دالة اجمع(أ، ب) {\n    ", 1, 4), ScopeKind::FunctionBody);
    }

    #[test]
    fn braces_after_class_keyword_are_class_body() {
        assert_eq!(scope_of("صنف الشخص {\n    ", 1, 4), ScopeKind::ClassBody);
    }

    #[test]
    fn parens_after_if_are_condition() {
        assert_eq!(scope_of("اذا (", 0, 5), ScopeKind::IfCondition);
        assert_eq!(scope_of("بينما (", 0, 7), ScopeKind::IfCondition);
    }

    #[test]
    fn parens_after_identifier_are_call() {
        assert_eq!(scope_of("احسب(", 0, 5), ScopeKind::FunctionCall);
        assert_eq!(scope_of("اطبع(", 0, 5), ScopeKind::FunctionCall);
    }

    #[test]
    fn lone_equals_is_assignment() {
        assert_eq!(scope_of("متغير س = ", 0, 10), ScopeKind::Assignment);
    }

    #[test]
    fn after_import_keyword_is_import() {
        assert_eq!(scope_of("استورد ", 0, 7), ScopeKind::Import);
    }

    #[test]
    fn closed_blocks_return_to_global() {
        assert_eq!(scope_of("دالة س() {\n}\n", 2, 0), ScopeKind::Global);
    }

    #[test]
    fn loop_braces_are_loop_body() {
        assert_eq!(scope_of("بينما (صح) {\n    ", 1, 4), ScopeKind::LoopBody);
    }

    // ── context construction ─────────────────────────────────────

    #[test]
    fn context_collects_functions_classes_and_variables() {
        let text = "دالة اجمع(أ، ب) {\n    ارجع أ + ب\n}\nصنف الشخص {\n}\nمتغير العمر = 30\n";
        let provider = CompletionProvider::default();
        let (tokens, _) = tokenize(text);
        let cursor = text.len();
        let context = provider.build_context(text, &tokens, cursor, 6, 0);
        assert!(context.available_functions.contains(&"اجمع".to_string()));
        assert!(context.available_classes.contains(&"الشخص".to_string()));
        assert!(context.available_variables.contains(&"العمر".to_string()));
    }

    // ── cursor mapping ───────────────────────────────────────────

    #[test]
    fn offset_at_counts_codepoints_not_bytes() {
        let text = "اط";
        assert_eq!(offset_at(text, 0, 0), 0);
        assert_eq!(offset_at(text, 0, 1), 2);
        assert_eq!(offset_at(text, 0, 2), 4);
    }

    #[test]
    fn offset_at_clamps_past_line_end() {
        let text = "اب\nج";
        assert_eq!(offset_at(text, 0, 99), 4);
        assert_eq!(offset_at(text, 1, 0), 5);
        assert_eq!(offset_at(text, 9, 0), text.len());
    }

    #[test]
    fn current_word_stops_at_non_identifier_chars() {
        let text = "اطبع(الاسم";
        let cursor = text.len();
        assert_eq!(current_word_at(text, cursor), "الاسم");
        assert_eq!(current_word_at(text, 8), "اطبع");
    }
}
