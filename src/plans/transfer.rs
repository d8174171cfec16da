use std::{path::Path, str::FromStr};

use quick_xml::{
    events::{BytesCData, Event},
    Reader, Writer,
};
use serde::Deserialize;
use thiserror::Error;

use super::{
    items::{PlanItem, PlanKind},
    model::Plan,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("unsupported file format '{0}'")]
    UnsupportedFormat(String),
    #[error("{0}")]
    Parse(String),
    #[error("could not encode plan: {0}")]
    Encode(String),
}

/// File encodings plans travel in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Json,
    Xml,
    #[serde(alias = "yml")]
    Yaml,
}

impl FileFormat {
    /// Picks the format from the file extension.
    pub fn from_filename(filename: &str) -> Result<Self, TransferError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Xml => "xml",
            FileFormat::Yaml => "yaml",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FileFormat::Json => "application/json",
            FileFormat::Xml => "application/xml",
            FileFormat::Yaml => "application/yaml",
        }
    }
}

impl FromStr for FileFormat {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(FileFormat::Json),
            "xml" => Ok(FileFormat::Xml),
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            other => Err(TransferError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Encodes a plan for download. Identifiers stay behind.
pub fn export_plan<I: PlanItem>(plan: &Plan<I>, format: FileFormat) -> Result<Vec<u8>, TransferError> {
    let mut doc = plan.clone();
    doc.id = None;
    doc.strip_temporary_ids();

    let encode = |e: &dyn std::fmt::Display| TransferError::Encode(e.to_string());
    match format {
        FileFormat::Json => serde_json::to_vec_pretty(&doc).map_err(|e| encode(&e)),
        FileFormat::Yaml => serde_yaml::to_string(&doc)
            .map(String::into_bytes)
            .map_err(|e| encode(&e)),
        FileFormat::Xml => {
            let body = quick_xml::se::to_string_with_root("plan", &doc).map_err(|e| encode(&e))?;
            let body = shield_padded_text(&body, true).map_err(|e| encode(&e))?;
            Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n").into_bytes())
        }
    }
}

/// e.g. `training-plan-leg-day.yaml`
pub fn export_filename(kind: PlanKind, plan_name: &str, format: FileFormat) -> String {
    let mut slug = String::with_capacity(plan_name.len());
    for c in plan_name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "export" } else { slug };
    format!("{}{}.{}", kind.file_prefix(), slug, format.extension())
}

/// Reads an uploaded plan file. The format comes from the file name; ids found
/// in the file are dropped, the importer decides the identity.
pub fn parse_plan<I: PlanItem>(filename: &str, content: &[u8]) -> Result<Plan<I>, TransferError> {
    let format = FileFormat::from_filename(filename)?;
    let text = std::str::from_utf8(content)
        .map_err(|_| TransferError::Parse("file is not valid UTF-8".into()))?;
    let text = text.trim_start_matches('\u{feff}');

    let parsed: Result<Plan<I>, String> = match format {
        FileFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        FileFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        FileFormat::Xml => shield_padded_text(text, false)
            .map_err(|e| e.to_string())
            .and_then(|xml| quick_xml::de::from_str(&xml).map_err(|e| e.to_string())),
    };
    let mut plan = parsed.map_err(TransferError::Parse)?;
    plan.id = None;
    plan.strip_temporary_ids();
    Ok(plan)
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// The XML deserializer trims every text node but hands CDATA over untouched,
/// so text with leading or trailing whitespace is rewritten as CDATA sections.
/// Whitespace-only text is indentation unless `keep_blank` is set.
fn shield_padded_text(xml: &str, keep_blank: bool) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Text(text) => {
                let value = text.unescape()?.into_owned();
                let padded = value.starts_with(is_xml_space) || value.ends_with(is_xml_space);
                let blank = value.chars().all(is_xml_space);
                if padded && (keep_blank || !blank) {
                    // `]]>` cannot appear inside a section, split it across two.
                    let mut rest = value.as_str();
                    while let Some(at) = rest.find("]]>") {
                        writer.write_event(Event::CData(BytesCData::new(&rest[..at + 2])))?;
                        rest = &rest[at + 2..];
                    }
                    writer.write_event(Event::CData(BytesCData::new(rest)))?;
                } else {
                    writer.write_event(Event::Text(text))?;
                }
            }
            event => writer.write_event(event)?,
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|e| e.utf8_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        i18n::Locale,
        plans::{
            items::{CustomMeal, ItemInput, MealItem},
            model::{tests::leg_plan, tests::recipe, Day, DayOfWeek},
        },
    };
    use uuid::Uuid;

    fn diet_plan() -> Plan<MealItem> {
        let mut plan = Plan::new("Lean & Green <summer>", "high protein");
        plan.is_active = true;
        plan.add_day(Locale::Es);
        plan.days[0].add_item(ItemInput::Catalog(recipe("716429", "Pasta with Garlic")));
        plan.days[0].add_item(ItemInput::Custom(CustomMeal {
            title: "  Greek yoghurt ".into(),
            calories: Some(150.0),
            protein: Some(15.0),
            carbs: Some(8.5),
            fat: Some(0.0),
            image: String::new(),
            recipe_url: String::new(),
        }));
        plan.add_day(Locale::Es);
        plan
    }

    fn roundtrip<I: PlanItem>(plan: &Plan<I>, format: FileFormat) -> Plan<I> {
        let bytes = export_plan(plan, format).expect("export");
        let name = format!("plan.{}", format.extension());
        parse_plan(&name, &bytes).expect("import")
    }

    fn without_ids<I: PlanItem>(plan: &Plan<I>) -> Plan<I> {
        let mut plan = plan.clone();
        plan.id = None;
        plan.strip_temporary_ids();
        plan
    }

    #[test]
    fn export_then_import_is_lossless() {
        let mut training = leg_plan("Leg Day");
        training.id = Some(Uuid::new_v4());
        training.description = "  two\n  lines ".into();
        training.days[1].items[0].notes = "  pause at bottom ".into();
        let diet = diet_plan();

        for format in [FileFormat::Json, FileFormat::Yaml, FileFormat::Xml] {
            assert_eq!(roundtrip(&training, format), without_ids(&training), "{format:?}");
            assert_eq!(roundtrip(&diet, format), without_ids(&diet), "{format:?}");
        }
    }

    #[test]
    fn xml_keeps_surrounding_whitespace() {
        let mut plan = leg_plan("Leg Day");
        plan.description = " a ]]> b & c ".into();
        plan.days[0].items[0].notes = "   ".into();
        plan.days[1].items[0].notes = "\tkeep <tabs>\t".into();

        let back = roundtrip(&plan, FileFormat::Xml);
        assert_eq!(back.description, " a ]]> b & c ");
        assert_eq!(back.days[0].items[0].notes, "   ");
        assert_eq!(back.days[1].items[0].notes, "\tkeep <tabs>\t");

        let xml = "<?xml version=\"1.0\"?>\n<plan>\n  <name>Leg Day</name>\n  \
                   <description>  heavy &amp; slow </description>\n</plan>\n";
        let plan: Plan<crate::plans::items::ExerciseItem> = parse_plan("plan.xml", xml.as_bytes()).unwrap();
        assert_eq!(plan.name, "Leg Day");
        assert_eq!(plan.description, "  heavy & slow ");
        assert!(plan.days.is_empty());
    }

    #[test]
    fn export_omits_identifiers() {
        let mut plan = leg_plan("Leg Day");
        let id = Uuid::new_v4();
        plan.id = Some(id);
        plan.days[0].temp_id = Some("tmp-1".into());
        for format in [FileFormat::Json, FileFormat::Yaml, FileFormat::Xml] {
            let text = String::from_utf8(export_plan(&plan, format).unwrap()).unwrap();
            assert!(!text.contains(&id.to_string()));
            assert!(!text.contains("tmp-1"));
        }
    }

    #[test]
    fn filenames_carry_kind_prefix_and_extension() {
        assert_eq!(
            export_filename(PlanKind::Training, "Leg Day!", FileFormat::Json),
            "training-plan-leg-day.json"
        );
        assert_eq!(
            export_filename(PlanKind::Diet, "  ", FileFormat::Yaml),
            "diet-plan-export.yaml"
        );
    }

    #[test]
    fn format_comes_from_extension() {
        assert_eq!(FileFormat::from_filename("a.JSON"), Ok(FileFormat::Json));
        assert_eq!(FileFormat::from_filename("a.yml"), Ok(FileFormat::Yaml));
        assert_eq!(FileFormat::from_filename("dir/a.xml"), Ok(FileFormat::Xml));
        assert_eq!(
            FileFormat::from_filename("plan.csv"),
            Err(TransferError::UnsupportedFormat("csv".into()))
        );
        assert_eq!(
            FileFormat::from_filename("plan"),
            Err(TransferError::UnsupportedFormat(String::new()))
        );
    }

    #[test]
    fn malformed_content_is_a_parse_error() {
        let err = parse_plan::<MealItem>("plan.json", b"{\"name\": ").unwrap_err();
        assert!(matches!(err, TransferError::Parse(_)));
        let err = parse_plan::<MealItem>("plan.xml", b"<plan><name>x</plan>").unwrap_err();
        assert!(matches!(err, TransferError::Parse(_)));
    }

    #[test]
    fn imports_accept_alias_array_names_and_quoted_numbers() {
        let yaml = r#"
name: Upper body
_id: 7b0c8d0e-3c1f-4f5e-9a57-0b6a2f3d4c11
days:
  - dayOfWeek: Lunes
    name: Push
    order: "1"
    exercises:
      - sourceId: "0025"
        name: barbell bench press
        sets: "4"
        reps: 8
        weight: "62.5"
"#;
        let plan: Plan<crate::plans::items::ExerciseItem> = parse_plan("upper.yml", yaml.as_bytes()).unwrap();
        assert_eq!(plan.id, None);
        let day: &Day<_> = &plan.days[0];
        assert_eq!(day.day_of_week, Some(DayOfWeek::Monday));
        assert_eq!(day.order, Some(1));
        assert_eq!(day.items[0].sets, Some(4));
        assert_eq!(day.items[0].weight, Some(62.5));
    }
}
