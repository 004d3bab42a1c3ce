use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LSP `CompletionItemKind` values; serialized as their numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionItemKind {
    Text = 1,
    Method = 2,
    Function = 3,
    Constructor = 4,
    Field = 5,
    Variable = 6,
    Class = 7,
    Interface = 8,
    Module = 9,
    Property = 10,
    Unit = 11,
    Value = 12,
    Enum = 13,
    Keyword = 14,
    Snippet = 15,
    Color = 16,
    File = 17,
    Reference = 18,
    Folder = 19,
    EnumMember = 20,
    Constant = 21,
    Struct = 22,
    Event = 23,
    Operator = 24,
    TypeParameter = 25,
}

impl CompletionItemKind {
    pub fn from_code(code: u8) -> Option<Self> {
        use CompletionItemKind::*;
        Some(match code {
            1 => Text,
            2 => Method,
            3 => Function,
            4 => Constructor,
            5 => Field,
            6 => Variable,
            7 => Class,
            8 => Interface,
            9 => Module,
            10 => Property,
            11 => Unit,
            12 => Value,
            13 => Enum,
            14 => Keyword,
            15 => Snippet,
            16 => Color,
            17 => File,
            18 => Reference,
            19 => Folder,
            20 => EnumMember,
            21 => Constant,
            22 => Struct,
            23 => Event,
            24 => Operator,
            25 => TypeParameter,
            _ => return None,
        })
    }
}

impl Serialize for CompletionItemKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for CompletionItemKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        CompletionItemKind::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown completion kind {code}")))
    }
}

/// One parameter of a function completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub arabic_description: String,
    pub is_optional: bool,
    pub default_value: String,
}

/// A completion item carrying the full Arabic annotation set alongside the
/// plain LSP fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArabicCompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    pub insert_text: String,
    pub filter_text: String,
    pub sort_text: String,

    pub arabic_name: String,
    pub english_name: String,
    pub arabic_description: String,
    pub arabic_detailed_desc: String,
    pub usage_example: String,
    pub arabic_example: String,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
    pub arabic_return_desc: String,

    /// Relevance score, 1..=100.
    pub priority: i32,
    pub contexts: Vec<String>,
    pub tags: Vec<String>,
    pub category: String,
}

impl ArabicCompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        let label = label.into();
        ArabicCompletionItem {
            arabic_name: label.clone(),
            insert_text: label.clone(),
            filter_text: label.clone(),
            sort_text: label.clone(),
            label,
            kind,
            english_name: String::new(),
            arabic_description: String::new(),
            arabic_detailed_desc: String::new(),
            usage_example: String::new(),
            arabic_example: String::new(),
            parameters: Vec::new(),
            return_type: String::new(),
            arabic_return_desc: String::new(),
            priority: 50,
            contexts: Vec::new(),
            tags: Vec::new(),
            category: String::new(),
        }
    }

    /// An empty context list means the item applies everywhere.
    pub fn is_applicable_in_context(&self, context: &str) -> bool {
        self.contexts.is_empty() || self.contexts.iter().any(|c| c == context)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn display_text(&self) -> &str {
        if self.arabic_name.is_empty() {
            &self.label
        } else {
            &self.arabic_name
        }
    }

    pub fn detail_text(&self) -> String {
        let mut detail = self.arabic_description.clone();
        if !self.return_type.is_empty() {
            detail.push_str(" -> ");
            detail.push_str(&self.return_type);
        }
        detail
    }
}

/// A snippet template. Placeholder markers `${N:text}` and `$N` are kept
/// verbatim; expanding them is the client's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub name: String,
    pub description: String,
    pub template: String,
    pub placeholders: Vec<String>,
    pub category: String,
    pub priority: i32,
    pub contexts: Vec<String>,
}

impl CodeSnippet {
    pub fn to_completion_item(&self) -> ArabicCompletionItem {
        let mut item = ArabicCompletionItem::new(self.name.clone(), CompletionItemKind::Snippet);
        item.arabic_description = self.description.clone();
        item.insert_text = self.template.clone();
        item.category = self.category.clone();
        item.priority = self.priority;
        item.contexts = self.contexts.clone();
        item.tags.push("snippet".to_string());
        item
    }
}

/// The `textDocument/completion` result shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionList {
    pub is_incomplete: bool,
    pub items: Vec<ArabicCompletionItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_lsp_code() {
        let json = serde_json::to_value(CompletionItemKind::Function).unwrap();
        assert_eq!(json, serde_json::json!(3));
        let back: CompletionItemKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, CompletionItemKind::Function);
    }

    #[test]
    fn new_item_mirrors_label_into_text_fields() {
        let item = ArabicCompletionItem::new("اطبع", CompletionItemKind::Function);
        assert_eq!(item.arabic_name, "اطبع");
        assert_eq!(item.insert_text, "اطبع");
        assert_eq!(item.filter_text, "اطبع");
        assert_eq!(item.sort_text, "اطبع");
        assert_eq!(item.priority, 50);
    }

    #[test]
    fn empty_contexts_apply_everywhere() {
        let item = ArabicCompletionItem::new("س", CompletionItemKind::Variable);
        assert!(item.is_applicable_in_context("global"));
        assert!(item.is_applicable_in_context("class"));

        let mut scoped = item.clone();
        scoped.contexts = vec!["global".to_string()];
        assert!(scoped.is_applicable_in_context("global"));
        assert!(!scoped.is_applicable_in_context("class"));
    }

    #[test]
    fn detail_text_appends_return_type() {
        let mut item = ArabicCompletionItem::new("جذر", CompletionItemKind::Function);
        item.arabic_description = "يحسب الجذر التربيعي".to_string();
        item.return_type = "رقم_عشري".to_string();
        assert_eq!(item.detail_text(), "يحسب الجذر التربيعي -> رقم_عشري");
    }

    #[test]
    fn snippet_conversion_tags_and_inserts_template() {
        let snippet = CodeSnippet {
            name: "حلقة للعد".to_string(),
            description: "حلقة for للعد".to_string(),
            template: "لكل ${1:العداد} من ${2:1} إلى ${3:10} {\n    ${4:// الكود هنا}\n}".to_string(),
            placeholders: vec!["العداد".to_string()],
            category: "control_flow".to_string(),
            priority: 85,
            contexts: vec!["global".to_string(), "function".to_string()],
        };
        let item = snippet.to_completion_item();
        assert_eq!(item.kind, CompletionItemKind::Snippet);
        assert!(item.has_tag("snippet"));
        assert!(item.insert_text.contains("${1:العداد}"));
        assert_eq!(item.priority, 85);
    }

    #[test]
    fn wire_shape_uses_camel_case_names() {
        let mut item = ArabicCompletionItem::new("اطبع", CompletionItemKind::Function);
        item.english_name = "print".to_string();
        item.arabic_description = "يطبع النص".to_string();
        item.parameters = vec![ParameterInfo {
            name: "النص".to_string(),
            param_type: "نص".to_string(),
            arabic_description: "النص المراد طباعته".to_string(),
            is_optional: false,
            default_value: String::new(),
        }];

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["label"], "اطبع");
        assert_eq!(json["kind"], 3);
        assert_eq!(json["arabicName"], "اطبع");
        assert_eq!(json["englishName"], "print");
        assert_eq!(json["arabicDescription"], "يطبع النص");
        assert_eq!(json["insertText"], "اطبع");
        assert_eq!(json["parameters"][0]["type"], "نص");
        assert_eq!(json["parameters"][0]["isOptional"], false);
    }
}
