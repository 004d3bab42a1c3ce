pub mod database;
pub mod item;
pub mod provider;

pub use database::ArabicCompletionDatabase;
pub use item::{
    ArabicCompletionItem, CodeSnippet, CompletionItemKind, CompletionList, ParameterInfo,
};
pub use provider::{CompletionContext, CompletionProvider, ScopeKind};
