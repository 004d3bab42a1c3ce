//! Static catalog of Arabic keywords, built-in functions, and snippet
//! templates. Built once per process on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::item::{ArabicCompletionItem, CodeSnippet, CompletionItemKind, ParameterInfo};

static DATABASE: OnceLock<ArabicCompletionDatabase> = OnceLock::new();

pub struct ArabicCompletionDatabase {
    completions: Vec<ArabicCompletionItem>,
    by_category: HashMap<&'static str, Vec<ArabicCompletionItem>>,
    snippets: Vec<CodeSnippet>,
}

impl ArabicCompletionDatabase {
    /// The process-wide catalog, initialized lazily on first query.
    pub fn global() -> &'static ArabicCompletionDatabase {
        DATABASE.get_or_init(ArabicCompletionDatabase::build)
    }

    fn build() -> Self {
        let categories: Vec<(&'static str, Vec<ArabicCompletionItem>)> = vec![
            ("io", io_completions()),
            ("control_flow", control_flow_completions()),
            ("data_types", data_type_completions()),
            ("math", math_completions()),
            ("string", string_completions()),
            ("array", array_completions()),
            ("function", function_completions()),
            ("class", class_completions()),
            ("error_handling", error_handling_completions()),
            ("file_io", file_io_completions()),
        ];

        let mut completions = Vec::new();
        let mut by_category = HashMap::new();
        for (name, mut items) in categories {
            for item in &mut items {
                item.category = name.to_string();
                item.tags.push(name.to_string());
                if item.priority >= 85 {
                    item.tags.push("basic".to_string());
                    item.tags.push("beginner".to_string());
                }
            }
            completions.extend(items.iter().cloned());
            by_category.insert(name, items);
        }

        let snippets = [
            control_flow_snippets(),
            function_snippets(),
            class_snippets(),
            common_pattern_snippets(),
        ]
        .concat();

        ArabicCompletionDatabase {
            completions,
            by_category,
            snippets,
        }
    }

    pub fn all_completions(&self) -> &[ArabicCompletionItem] {
        &self.completions
    }

    pub fn completions_by_category(&self, category: &str) -> &[ArabicCompletionItem] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn completions_for_context(&self, context: &str) -> Vec<&ArabicCompletionItem> {
        self.completions
            .iter()
            .filter(|item| item.is_applicable_in_context(context))
            .collect()
    }

    pub fn builtin_snippets(&self) -> &[CodeSnippet] {
        &self.snippets
    }

    pub fn find_completion(&self, label: &str) -> Option<&ArabicCompletionItem> {
        self.completions
            .iter()
            .find(|item| item.label == label || item.arabic_name == label)
    }
}

// ── item builders ────────────────────────────────────────────────

fn param(name: &str, param_type: &str, description: &str) -> ParameterInfo {
    ParameterInfo {
        name: name.to_string(),
        param_type: param_type.to_string(),
        arabic_description: description.to_string(),
        is_optional: false,
        default_value: String::new(),
    }
}

fn optional_param(name: &str, param_type: &str, description: &str, default: &str) -> ParameterInfo {
    ParameterInfo {
        name: name.to_string(),
        param_type: param_type.to_string(),
        arabic_description: description.to_string(),
        is_optional: true,
        default_value: default.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn function(
    arabic_name: &str,
    english_name: &str,
    description: &str,
    detailed_desc: &str,
    parameters: Vec<ParameterInfo>,
    return_type: &str,
    return_desc: &str,
    priority: i32,
) -> ArabicCompletionItem {
    let mut item = ArabicCompletionItem::new(arabic_name, CompletionItemKind::Function);
    item.english_name = english_name.to_string();
    item.arabic_description = description.to_string();
    item.arabic_detailed_desc = detailed_desc.to_string();
    item.return_type = return_type.to_string();
    item.arabic_return_desc = return_desc.to_string();
    item.priority = priority;
    item.contexts = vec![
        "global".to_string(),
        "function".to_string(),
        "class".to_string(),
    ];

    let args: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
    item.usage_example = format!("{arabic_name}({})", args.join("، "));
    item.parameters = parameters;
    item
}

fn keyword(
    arabic_name: &str,
    english_name: &str,
    description: &str,
    detailed_desc: &str,
    example: &str,
    priority: i32,
) -> ArabicCompletionItem {
    let mut item = ArabicCompletionItem::new(arabic_name, CompletionItemKind::Keyword);
    item.english_name = english_name.to_string();
    item.arabic_description = description.to_string();
    item.arabic_detailed_desc = detailed_desc.to_string();
    item.arabic_example = example.to_string();
    item.priority = priority;
    item.contexts = vec![
        "global".to_string(),
        "function".to_string(),
        "class".to_string(),
    ];
    item
}

// ── catalog content ──────────────────────────────────────────────

fn io_completions() -> Vec<ArabicCompletionItem> {
    vec![
        function(
            "اطبع",
            "print",
            "يطبع النص أو القيم المحددة إلى وحدة التحكم",
            "دالة أساسية لطباعة النصوص والقيم. تقبل نص واحد أو أكثر وتطبعهم في سطر واحد مع إضافة سطر جديد في النهاية.",
            vec![param("النص", "نص", "النص أو القيمة المراد طباعتها")],
            "فراغ",
            "لا ترجع قيمة",
            95,
        ),
        function(
            "اقرأ",
            "read",
            "يقرأ نص من المستخدم",
            "دالة لقراءة النص من المستخدم عبر وحدة التحكم. تنتظر حتى يدخل المستخدم النص ويضغط Enter.",
            vec![optional_param("الرسالة", "نص", "رسالة تظهر للمستخدم", "\"\"")],
            "نص",
            "النص الذي أدخله المستخدم",
            90,
        ),
        function(
            "اقرأ_رقم",
            "read_number",
            "يقرأ رقم من المستخدم",
            "دالة لقراءة رقم صحيح من المستخدم. تتعامل مع الأخطاء تلقائياً وتطلب من المستخدم إعادة الإدخال إذا لم يكن الإدخال رقماً صحيحاً.",
            vec![optional_param("الرسالة", "نص", "رسالة تظهر للمستخدم", "\"\"")],
            "رقم",
            "الرقم الذي أدخله المستخدم",
            85,
        ),
        function(
            "اقرأ_رقم_عشري",
            "read_decimal",
            "يقرأ رقم عشري من المستخدم",
            "دالة لقراءة رقم عشري (فاصلة عائمة) من المستخدم. تتعامل مع الأخطاء تلقائياً.",
            vec![optional_param("الرسالة", "نص", "رسالة تظهر للمستخدم", "\"\"")],
            "رقم_عشري",
            "الرقم العشري الذي أدخله المستخدم",
            80,
        ),
    ]
}

fn control_flow_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "اذا",
            "if",
            "جملة شرطية للتحكم في تدفق البرنامج",
            "تستخدم لتنفيذ كود معين فقط عند تحقق شرط محدد. يمكن استخدامها مع 'اواذا' و 'والا' لإنشاء سلسلة شروط.",
            r#"// شرط بسيط
اذا (العمر >= 18) {
    اطبع("يمكنك التصويت")
}

// شرط مع بديل
اذا (الدرجة >= 60) {
    اطبع("نجحت")
} والا {
    اطبع("راسب")
}"#,
            90,
        ),
        keyword(
            "اواذا",
            "else if",
            "شرط إضافي في سلسلة الشروط",
            "تستخدم لإضافة شرط جديد بعد 'اذا'. يتم فحص الشرط فقط إذا لم تتحقق الشروط السابقة.",
            r#"اذا (الدرجة >= 90) {
    اطبع("ممتاز")
} اواذا (الدرجة >= 80) {
    اطبع("جيد جداً")
} اواذا (الدرجة >= 70) {
    اطبع("جيد")
} والا {
    اطبع("مقبول")
}"#,
            85,
        ),
        keyword(
            "والا",
            "else",
            "البديل الافتراضي في الشروط",
            "تستخدم لتنفيذ كود معين عندما لا تتحقق أي من الشروط السابقة في سلسلة 'اذا'.",
            r#"اذا (الطقس == "مشمس") {
    اطبع("اذهب للنزهة")
} والا {
    اطبع("ابق في المنزل")
}"#,
            85,
        ),
        keyword(
            "لكل",
            "for",
            "حلقة تكرار للعد أو التكرار عبر مجموعة",
            "تستخدم لتكرار تنفيذ كود معين عدد محدد من المرات أو للتكرار عبر عناصر مصفوفة أو قائمة.",
            r#"// حلقة للعد
لكل العداد من 1 إلى 10 {
    اطبع("العدد:", العداد)
}

// حلقة عبر مصفوفة
متغير الأسماء = ["أحمد", "فاطمة", "محمد"]
لكل الاسم في الأسماء {
    اطبع("مرحبا", الاسم)
}"#,
            88,
        ),
    ]
}

fn data_type_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "متغير",
            "var",
            "يعرف متغير جديد",
            "كلمة مفتاحية لتعريف متغير جديد. يمكن للمتغير أن يحتوي على أي نوع من البيانات.",
            r#"// تعريف متغيرات مختلفة
متغير الاسم = "أحمد"
متغير العمر = 25
متغير الراتب = 5000.50
متغير متزوج = صحيح"#,
            95,
        ),
        keyword(
            "ثابت",
            "const",
            "يعرف ثابت لا يمكن تغييره",
            "كلمة مفتاحية لتعريف ثابت. القيمة لا يمكن تغييرها بعد التعريف الأولي.",
            r#"// تعريف ثوابت
ثابت باي = 3.14159
ثابت اسم_البرنامج = "برنامجي"
ثابت الحد_الأقصى = 100"#,
            90,
        ),
        keyword(
            "نص",
            "string",
            "نوع بيانات للنصوص",
            "نوع بيانات يستخدم لتخزين النصوص والأحرف. يمكن أن يحتوي على أي عدد من الأحرف.",
            r#"نص الرسالة = "مرحبا بالعالم"
نص الاسم_الكامل = الاسم_الأول + " " + الاسم_الأخير"#,
            85,
        ),
        keyword(
            "رقم",
            "number",
            "نوع بيانات للأرقام الصحيحة",
            "نوع بيانات يستخدم لتخزين الأرقام الصحيحة (بدون فاصلة عشرية).",
            r#"رقم العمر = 25
رقم عدد_الطلاب = 150"#,
            85,
        ),
        keyword(
            "رقم_عشري",
            "decimal",
            "نوع بيانات للأرقام العشرية",
            "نوع بيانات يستخدم لتخزين الأرقام العشرية (مع فاصلة عشرية).",
            r#"رقم_عشري الراتب = 5000.50
رقم_عشري درجة_الحرارة = 23.5"#,
            85,
        ),
        keyword(
            "منطقي",
            "boolean",
            "نوع بيانات للقيم المنطقية",
            "نوع بيانات يحتوي على قيمة واحدة من اثنتين: صحيح أو خطأ.",
            r#"منطقي متزوج = صحيح
منطقي مكتمل = خطأ"#,
            85,
        ),
        keyword(
            "صحيح",
            "true",
            "القيمة المنطقية الصحيحة",
            "قيمة منطقية تمثل الحالة الصحيحة أو الإيجابية.",
            r#"متغير النتيجة = صحيح
اذا (النتيجة == صحيح) {
    اطبع("العملية نجحت")
}"#,
            80,
        ),
        keyword(
            "خطأ",
            "false",
            "القيمة المنطقية الخاطئة",
            "قيمة منطقية تمثل الحالة الخاطئة أو السلبية.",
            r#"متغير مكتمل = خطأ
اذا (مكتمل == خطأ) {
    اطبع("لم تكتمل العملية بعد")
}"#,
            80,
        ),
    ]
}

fn math_completions() -> Vec<ArabicCompletionItem> {
    vec![
        function(
            "جذر",
            "sqrt",
            "يحسب الجذر التربيعي للرقم",
            "دالة رياضية تحسب الجذر التربيعي للرقم المعطى. ترجع رقم عشري.",
            vec![param("الرقم", "رقم", "الرقم المراد حساب جذره التربيعي")],
            "رقم_عشري",
            "الجذر التربيعي للرقم",
            75,
        ),
        function(
            "قوة",
            "power",
            "يرفع رقم إلى قوة معينة",
            "دالة رياضية ترفع الرقم الأول إلى قوة الرقم الثاني.",
            vec![
                param("الأساس", "رقم", "الرقم الأساس"),
                param("الأس", "رقم", "الأس أو القوة"),
            ],
            "رقم",
            "نتيجة رفع الأساس للأس",
            75,
        ),
        function(
            "مطلق",
            "abs",
            "يحسب القيمة المطلقة للرقم",
            "دالة رياضية تحسب القيمة المطلقة (الموجبة) للرقم المعطى.",
            vec![param("الرقم", "رقم", "الرقم المراد حساب قيمته المطلقة")],
            "رقم",
            "القيمة المطلقة للرقم",
            70,
        ),
        function(
            "عشوائي",
            "random",
            "يولد رقم عشوائي",
            "دالة تولد رقم عشوائي بين 0 و 1، أو بين حدين محددين.",
            vec![
                optional_param("الحد_الأدنى", "رقم", "أصغر رقم ممكن", "0"),
                optional_param("الحد_الأعلى", "رقم", "أكبر رقم ممكن", "1"),
            ],
            "رقم_عشري",
            "رقم عشوائي ضمن النطاق المحدد",
            70,
        ),
    ]
}

fn string_completions() -> Vec<ArabicCompletionItem> {
    vec![
        function(
            "طول",
            "length",
            "يحسب طول النص",
            "دالة تحسب عدد الأحرف في النص المعطى.",
            vec![param("النص", "نص", "النص المراد حساب طوله")],
            "رقم",
            "عدد الأحرف في النص",
            80,
        ),
        function(
            "يحتوي",
            "contains",
            "يتحقق من وجود نص فرعي داخل النص",
            "دالة تتحقق من وجود نص فرعي معين داخل النص الأساسي.",
            vec![
                param("النص_الأساسي", "نص", "النص المراد البحث فيه"),
                param("النص_الفرعي", "نص", "النص المراد البحث عنه"),
            ],
            "منطقي",
            "صحيح إذا وجد النص الفرعي، خطأ إذا لم يوجد",
            75,
        ),
        function(
            "استبدل",
            "replace",
            "يستبدل نص بنص آخر",
            "دالة تستبدل جميع حالات النص القديم بالنص الجديد في النص الأساسي.",
            vec![
                param("النص_الأساسي", "نص", "النص المراد التعديل عليه"),
                param("النص_القديم", "نص", "النص المراد استبداله"),
                param("النص_الجديد", "نص", "النص البديل"),
            ],
            "نص",
            "النص بعد الاستبدال",
            75,
        ),
    ]
}

fn array_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "مصفوفة",
            "array",
            "نوع بيانات لتخزين مجموعة من القيم",
            "نوع بيانات يستخدم لتخزين مجموعة مرتبة من القيم من نفس النوع أو أنواع مختلفة.",
            r#"// إنشاء مصفوفات مختلفة
مصفوفة الأسماء = ["أحمد", "فاطمة", "محمد"]
مصفوفة الأرقام = [1, 2, 3, 4, 5]
مصفوفة مختلطة = ["نص", 123, صحيح]"#,
            85,
        ),
        function(
            "أضف",
            "add",
            "يضيف عنصر جديد للمصفوفة",
            "دالة تضيف عنصر جديد في نهاية المصفوفة.",
            vec![
                param("المصفوفة", "مصفوفة", "المصفوفة المراد الإضافة إليها"),
                param("العنصر", "أي", "العنصر المراد إضافته"),
            ],
            "فراغ",
            "لا ترجع قيمة",
            80,
        ),
        function(
            "احذف",
            "remove",
            "يحذف عنصر من المصفوفة",
            "دالة تحذف عنصر من المصفوفة بناءً على موقعه أو قيمته.",
            vec![
                param("المصفوفة", "مصفوفة", "المصفوفة المراد الحذف منها"),
                param("المؤشر", "رقم", "موقع العنصر المراد حذفه"),
            ],
            "فراغ",
            "لا ترجع قيمة",
            75,
        ),
    ]
}

fn function_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "دالة",
            "function",
            "يعرف دالة جديدة",
            "كلمة مفتاحية لتعريف دالة جديدة. الدالة هي مجموعة من الأوامر التي تنفذ مهمة محددة.",
            r#"// دالة بسيطة
دالة قل_مرحبا() {
    اطبع("مرحبا!")
}

// دالة مع معاملات
دالة اجمع(أ، ب) {
    ارجع أ + ب
}"#,
            90,
        ),
        keyword(
            "ارجع",
            "return",
            "يرجع قيمة من الدالة",
            "كلمة مفتاحية ترجع قيمة من الدالة وتنهي تنفيذها.",
            r#"دالة اضرب(أ، ب) {
    متغير النتيجة = أ * ب
    ارجع النتيجة
}"#,
            85,
        ),
    ]
}

fn class_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "فئة",
            "class",
            "يعرف فئة (كلاس) جديدة",
            "كلمة مفتاحية لتعريف فئة جديدة. الفئة هي قالب لإنشاء كائنات تحتوي على خصائص ودوال.",
            r#"فئة الشخص {
    // الخصائص
    خاص نص الاسم
    خاص رقم العمر

    // الباني
    دالة الشخص(اسم، عمر) {
        هذا.الاسم = اسم
        هذا.العمر = عمر
    }

    // دالة عامة
    عام دالة اعرض_المعلومات() {
        اطبع("الاسم:", هذا.الاسم, "العمر:", هذا.العمر)
    }
}"#,
            85,
        ),
        keyword(
            "عام",
            "public",
            "يجعل العضو متاح للوصول من خارج الفئة",
            "كلمة مفتاحية تحدد أن الخاصية أو الدالة يمكن الوصول إليها من خارج الفئة.",
            r#"فئة المثال {
    عام نص الاسم  // يمكن الوصول إليه من الخارج
    عام دالة اعرض() {
        اطبع(هذا.الاسم)
    }
}"#,
            75,
        ),
        keyword(
            "خاص",
            "private",
            "يجعل العضو متاح فقط داخل الفئة",
            "كلمة مفتاحية تحدد أن الخاصية أو الدالة يمكن الوصول إليها فقط من داخل الفئة نفسها.",
            r#"فئة المثال {
    خاص نص كلمة_المرور  // لا يمكن الوصول إليه من الخارج
    خاص دالة تحقق_من_الأمان() {
        // كود خاص بالفئة
    }
}"#,
            75,
        ),
    ]
}

fn error_handling_completions() -> Vec<ArabicCompletionItem> {
    vec![
        keyword(
            "حاول",
            "try",
            "يحاول تنفيذ كود قد يسبب خطأ",
            "كلمة مفتاحية تبدأ كتلة من الكود الذي قد يسبب خطأ. يجب استخدامها مع 'اصطد'.",
            r#"حاول {
    متغير النتيجة = 10 / 0  // قد يسبب خطأ
    اطبع(النتيجة)
} اصطد (الخطأ) {
    اطبع("حدث خطأ:", الخطأ)
}"#,
            80,
        ),
        keyword(
            "اصطد",
            "catch",
            "يصطاد الأخطاء التي تحدث في كتلة 'حاول'",
            "كلمة مفتاحية تصطاد الأخطاء التي تحدث في كتلة 'حاول' وتتعامل معها.",
            r#"حاول {
    // كود قد يسبب خطأ
} اصطد (الخطأ) {
    اطبع("تم اصطياد الخطأ:", الخطأ)
}"#,
            80,
        ),
    ]
}

fn file_io_completions() -> Vec<ArabicCompletionItem> {
    vec![
        function(
            "اقرأ_ملف",
            "read_file",
            "يقرأ محتوى ملف",
            "دالة تقرأ محتوى ملف نصي وترجعه كنص.",
            vec![param("مسار_الملف", "نص", "مسار الملف المراد قراءته")],
            "نص",
            "محتوى الملف",
            70,
        ),
        function(
            "اكتب_ملف",
            "write_file",
            "يكتب نص في ملف",
            "دالة تكتب النص المعطى في ملف. إذا كان الملف موجود، يتم استبدال محتواه.",
            vec![
                param("مسار_الملف", "نص", "مسار الملف المراد الكتابة فيه"),
                param("المحتوى", "نص", "النص المراد كتابته"),
            ],
            "منطقي",
            "صحيح إذا نجحت العملية، خطأ إذا فشلت",
            70,
        ),
    ]
}

// ── snippets ─────────────────────────────────────────────────────

fn snippet(
    name: &str,
    description: &str,
    template: &str,
    placeholders: &[&str],
    category: &str,
    priority: i32,
    contexts: &[&str],
) -> CodeSnippet {
    CodeSnippet {
        name: name.to_string(),
        description: description.to_string(),
        template: template.to_string(),
        placeholders: placeholders.iter().map(|s| s.to_string()).collect(),
        category: category.to_string(),
        priority,
        contexts: contexts.iter().map(|s| s.to_string()).collect(),
    }
}

fn control_flow_snippets() -> Vec<CodeSnippet> {
    vec![
        snippet(
            "حلقة للعد",
            "حلقة for للعد من رقم إلى آخر",
            "لكل ${1:العداد} من ${2:1} إلى ${3:10} {\n    ${4:// الكود هنا}\n}",
            &["العداد", "1", "10", "// الكود هنا"],
            "control_flow",
            85,
            &["global", "function"],
        ),
        snippet(
            "حلقة عبر مصفوفة",
            "حلقة for للتكرار عبر عناصر مصفوفة",
            "لكل ${1:العنصر} في ${2:المصفوفة} {\n    ${3:// معالجة العنصر}\n}",
            &["العنصر", "المصفوفة", "// معالجة العنصر"],
            "control_flow",
            85,
            &["global", "function"],
        ),
        snippet(
            "شرط كامل",
            "جملة شرطية كاملة مع if-else if-else",
            "اذا (${1:الشرط_الأول}) {\n    ${2:// الكود الأول}\n} اواذا (${3:الشرط_الثاني}) {\n    ${4:// الكود الثاني}\n} والا {\n    ${5:// الكود الافتراضي}\n}",
            &[
                "الشرط_الأول",
                "// الكود الأول",
                "الشرط_الثاني",
                "// الكود الثاني",
                "// الكود الافتراضي",
            ],
            "control_flow",
            80,
            &["global", "function"],
        ),
    ]
}

fn function_snippets() -> Vec<CodeSnippet> {
    vec![
        snippet(
            "دالة جديدة",
            "إنشاء دالة جديدة مع معاملات",
            "دالة ${1:اسم_الدالة}(${2:المعاملات}) {\n    ${3:// جسم الدالة}\n    ارجع ${4:القيمة}\n}",
            &["اسم_الدالة", "المعاملات", "// جسم الدالة", "القيمة"],
            "functions",
            80,
            &["global"],
        ),
        snippet(
            "دالة بدون إرجاع",
            "إنشاء دالة لا ترجع قيمة",
            "دالة ${1:اسم_الدالة}(${2:المعاملات}) {\n    ${3:// جسم الدالة}\n}",
            &["اسم_الدالة", "المعاملات", "// جسم الدالة"],
            "functions",
            75,
            &["global"],
        ),
    ]
}

fn class_snippets() -> Vec<CodeSnippet> {
    vec![snippet(
        "فئة جديدة",
        "إنشاء فئة (class) جديدة",
        "فئة ${1:اسم_الفئة} {\n    // الخصائص\n    ${2:خاص متغير القيمة}\n\n    // الباني\n    دالة ${1:اسم_الفئة}(${3:المعاملات}) {\n        ${4:// كود الباني}\n    }\n\n    // الدوال\n    ${5:// دوال الفئة}\n}",
        &[
            "اسم_الفئة",
            "خاص متغير القيمة",
            "المعاملات",
            "// كود الباني",
            "// دوال الفئة",
        ],
        "classes",
        75,
        &["global"],
    )]
}

fn common_pattern_snippets() -> Vec<CodeSnippet> {
    vec![
        snippet(
            "برنامج رئيسي",
            "هيكل البرنامج الرئيسي",
            "// ${1:اسم البرنامج}\n// ${2:وصف البرنامج}\n\nدالة رئيسية() {\n    ${3:// كود البرنامج الرئيسي}\n}\n\n// تشغيل البرنامج\nرئيسية()",
            &["اسم البرنامج", "وصف البرنامج", "// كود البرنامج الرئيسي"],
            "common",
            90,
            &["global"],
        ),
        snippet(
            "معالجة الأخطاء",
            "نمط معالجة الأخطاء الأساسي",
            "حاول {\n    ${1:// الكود الذي قد يسبب خطأ}\n} اصطد (${2:الخطأ}) {\n    اطبع(\"حدث خطأ:\", ${2:الخطأ})\n    ${3:// معالجة الخطأ}\n}",
            &["// الكود الذي قد يسبب خطأ", "الخطأ", "// معالجة الخطأ"],
            "error_handling",
            75,
            &["global", "function"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_initializes_once_and_is_nonempty() {
        let db = ArabicCompletionDatabase::global();
        assert!(db.all_completions().len() >= 30);
        assert!(db.builtin_snippets().len() >= 8);
        // Second call returns the same instance.
        assert!(std::ptr::eq(db, ArabicCompletionDatabase::global()));
    }

    #[test]
    fn print_function_is_present_with_rich_annotations() {
        let db = ArabicCompletionDatabase::global();
        let item = db.find_completion("اطبع").expect("اطبع missing");
        assert_eq!(item.kind, CompletionItemKind::Function);
        assert_eq!(item.english_name, "print");
        assert!(!item.arabic_description.is_empty());
        assert!(!item.arabic_detailed_desc.is_empty());
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.return_type, "فراغ");
        assert_eq!(item.priority, 95);
        assert!(item.has_tag("basic"));
    }

    #[test]
    fn categories_are_populated() {
        let db = ArabicCompletionDatabase::global();
        for category in [
            "io",
            "control_flow",
            "data_types",
            "math",
            "string",
            "array",
            "function",
            "class",
            "error_handling",
            "file_io",
        ] {
            assert!(
                !db.completions_by_category(category).is_empty(),
                "empty category {category}"
            );
        }
        assert!(db.completions_by_category("no_such").is_empty());
    }

    #[test]
    fn context_filter_respects_item_contexts() {
        let db = ArabicCompletionDatabase::global();
        let global_items = db.completions_for_context("global");
        assert_eq!(global_items.len(), db.all_completions().len());
    }

    #[test]
    fn usage_examples_are_generated_for_functions() {
        let db = ArabicCompletionDatabase::global();
        let item = db.find_completion("قوة").unwrap();
        assert_eq!(item.usage_example, "قوة(الأساس، الأس)");
    }

    #[test]
    fn snippets_preserve_placeholder_markers() {
        let db = ArabicCompletionDatabase::global();
        for s in db.builtin_snippets() {
            assert!(
                s.template.contains("${1:"),
                "snippet {} lost its markers",
                s.name
            );
        }
    }

    #[test]
    fn optional_parameters_carry_defaults() {
        let db = ArabicCompletionDatabase::global();
        let item = db.find_completion("عشوائي").unwrap();
        assert!(item.parameters.iter().all(|p| p.is_optional));
        assert_eq!(item.parameters[0].default_value, "0");
        assert_eq!(item.parameters[1].default_value, "1");
    }
}
