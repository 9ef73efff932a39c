//! Shared extraction schema: the closed menu-tag set, rows returned by the
//! generative service, and the prompt / response-schema builders.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dates::DateContext;

/// Closed set of menu category labels.
///
/// Single source of truth for both the Gemini `responseSchema` enum and row
/// validation, so the two can never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuTag {
    #[serde(rename = "Set A")]
    SetA,
    #[serde(rename = "Set B")]
    SetB,
    #[serde(rename = "カレー")]
    Curry,
    #[serde(rename = "丼")]
    RiceBowl,
    #[serde(rename = "中華麺")]
    ChineseNoodles,
    #[serde(rename = "和麺")]
    JapaneseNoodles,
    #[serde(rename = "ご飯")]
    Rice,
}

impl MenuTag {
    pub const ALL: [MenuTag; 7] = [
        MenuTag::SetA,
        MenuTag::SetB,
        MenuTag::Curry,
        MenuTag::RiceBowl,
        MenuTag::ChineseNoodles,
        MenuTag::JapaneseNoodles,
        MenuTag::Rice,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuTag::SetA => "Set A",
            MenuTag::SetB => "Set B",
            MenuTag::Curry => "カレー",
            MenuTag::RiceBowl => "丼",
            MenuTag::ChineseNoodles => "中華麺",
            MenuTag::JapaneseNoodles => "和麺",
            MenuTag::Rice => "ご飯",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.label()).collect()
    }
}

/// One menu entry as returned by the generative service, prior to
/// validation and persistence.
///
/// `name` and `price` are required by the response schema, but the model is
/// not trusted to honor that: both stay optional here and are enforced during
/// ingestion so a single bad row cannot fail the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tag: Option<MenuTag>,
}

/// Aggregate outcome of one ingestion batch. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    pub success: bool,
    pub inserted_count: u32,
    pub errors: Vec<String>,
}

/// Build the extraction instruction sent to the generative service.
///
/// When a date context is known from the filename, the year-month is stated
/// explicitly so the model can fill in missing per-item dates. This is
/// advisory only: the authoritative date-filling logic lives in
/// [`crate::dates::infer_dates`].
pub fn build_prompt(text: &str, ctx: Option<&DateContext>) -> String {
    let date_hint = match ctx {
        Some(ctx) => format!(
            "This menu is for {:04}-{:02}. If a date is not explicitly mentioned for an item, \
             infer it from surrounding text within that month or leave it null.",
            ctx.year, ctx.month
        ),
        None => "If a date is not explicitly mentioned for an item, infer it from surrounding \
                 text or leave it null."
            .to_string(),
    };

    format!(
        "Given the following text from a food list, extract the name, price, date (if \
         available, format as YYYY-MM-DD), and a tag from the following categories: {tags}. \
         {date_hint} If a tag cannot be determined, leave it null. Provide the output as a \
         JSON array of objects.\n\nHere is the text:\n{text}",
        tags = MenuTag::labels()
            .iter()
            .map(|l| format!("'{l}'"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Gemini `responseSchema` descriptor for the extracted row array.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "price": { "type": "NUMBER" },
                "date": { "type": "STRING", "nullable": true },
                "tag": { "type": "STRING", "enum": MenuTag::labels(), "nullable": true }
            },
            "required": ["name", "price"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_labels_round_trip() {
        for tag in MenuTag::ALL {
            assert_eq!(MenuTag::from_label(tag.label()), Some(tag));
        }
        assert_eq!(MenuTag::from_label("Set C"), None);
    }

    #[test]
    fn test_tag_serde_uses_labels() {
        let json = serde_json::to_string(&MenuTag::Curry).unwrap();
        assert_eq!(json, "\"カレー\"");
        let tag: MenuTag = serde_json::from_str("\"Set A\"").unwrap();
        assert_eq!(tag, MenuTag::SetA);
    }

    #[test]
    fn test_row_deserializes_with_missing_fields() {
        let row: ExtractedRow = serde_json::from_str(r#"{"price": 500}"#).unwrap();
        assert_eq!(row.name, None);
        assert_eq!(row.price, Some(500.0));
        assert_eq!(row.date, None);
        assert_eq!(row.tag, None);
    }

    #[test]
    fn test_row_rejects_unknown_tag() {
        let result: Result<ExtractedRow, _> =
            serde_json::from_str(r#"{"name": "Curry", "price": 650, "tag": "Dessert"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_schema_enum_matches_tags() {
        let schema = response_schema();
        let enum_values: Vec<&str> = schema["items"]["properties"]["tag"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(enum_values, MenuTag::labels());
        assert_eq!(
            schema["items"]["required"],
            serde_json::json!(["name", "price"])
        );
    }

    #[test]
    fn test_prompt_states_year_month_when_context_present() {
        let ctx = DateContext {
            year: 2025,
            month: 6,
        };
        let prompt = build_prompt("text", Some(&ctx));
        assert!(prompt.contains("2025-06"));

        let prompt = build_prompt("text", None);
        assert!(!prompt.contains("2025-06"));
    }
}
