//! Turns a [`Response`] into text, pretty JSON or a TypeScript literal.
//!
//! Listings are cut to the limit here and nowhere else; the JSON shapes carry
//! both `total_found` and `returned` so a consumer can tell when that happened.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

use crate::cli::OutputFormat;
use crate::command::Response;
use crate::load::LoadedDump;
use crate::model::{ClassEntry, ClassKind, DumpStats, FieldEntry, MethodEntry, Parameter, format_parameters};
use crate::modifiers::Modifiers;
use crate::search::{FieldHit, MethodHit};

#[derive(Debug, Serialize)]
struct ClassView<'a> {
    full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    interfaces: Vec<&'a str>,
    modifiers: Modifiers,
    class_type: ClassKind,
    type_def_index: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    methods: Vec<MethodView<'a>>,
}

#[derive(Debug, Serialize)]
struct FieldView<'a> {
    name: &'a str,
    type_name: &'a str,
    #[serde(skip_serializing_if = "Modifiers::is_empty")]
    modifiers: Modifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_value: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MethodView<'a> {
    name: &'a str,
    return_type: &'a str,
    #[serde(skip_serializing_if = "Modifiers::is_empty")]
    modifiers: Modifiers,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<&'a Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rva: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot: Option<u32>,
}

#[derive(Debug, Serialize)]
struct FieldMatch<'a> {
    class_name: String,
    field: FieldView<'a>,
}

#[derive(Debug, Serialize)]
struct MethodMatch<'a> {
    class_name: String,
    method: MethodView<'a>,
}

#[derive(Debug, Serialize)]
struct ClassSearchResult<'a> {
    query: &'a str,
    search_type: &'a str,
    total_found: usize,
    returned: usize,
    classes: Vec<ClassView<'a>>,
}

#[derive(Debug, Serialize)]
struct FieldSearchResult<'a> {
    query: &'a str,
    total_found: usize,
    returned: usize,
    matches: Vec<FieldMatch<'a>>,
}

#[derive(Debug, Serialize)]
struct MethodSearchResult<'a> {
    query: &'a str,
    total_found: usize,
    returned: usize,
    matches: Vec<MethodMatch<'a>>,
}

#[derive(Debug, Serialize)]
struct InheritanceChainResult<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    result_type: &'static str,
    chain: &'a [String],
}

#[derive(Debug, Serialize)]
struct ClassDetailResult<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    result_type: &'static str,
    class: ClassView<'a>,
}

#[derive(Debug, Serialize)]
struct Section<T> {
    count: usize,
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
struct SmartSearchResult<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    result_type: &'static str,
    classes: Section<ClassView<'a>>,
    methods: Section<MethodMatch<'a>>,
    fields: Section<FieldMatch<'a>>,
}

#[derive(Debug, Serialize)]
struct NamespacesResult<'a> {
    total: usize,
    namespaces: &'a [&'a str],
}

fn class_view(class: &ClassEntry) -> ClassView<'_> {
    ClassView {
        full_name: class.full_name(),
        base_class: class.base_class.as_deref(),
        interfaces: class.interfaces.iter().map(String::as_str).collect(),
        modifiers: class.modifiers,
        class_type: class.kind,
        type_def_index: class.type_def_index,
        fields: class.fields.iter().map(field_view).collect(),
        methods: class.methods.iter().map(method_view).collect(),
    }
}

fn field_view(field: &FieldEntry) -> FieldView<'_> {
    FieldView {
        name: &field.name,
        type_name: &field.type_name,
        modifiers: field.modifiers,
        offset: field.offset.as_deref(),
        default_value: field.default_value.as_deref(),
    }
}

fn method_view(method: &MethodEntry) -> MethodView<'_> {
    MethodView {
        name: &method.name,
        return_type: &method.return_type,
        modifiers: method.modifiers,
        parameters: method.parameters.iter().collect(),
        rva: method.rva.as_deref(),
        offset: method.offset.as_deref(),
        slot: method.slot,
    }
}

fn field_match<'a>(hit: &FieldHit<'a>) -> FieldMatch<'a> {
    FieldMatch {
        class_name: hit.class.full_name(),
        field: field_view(hit.field),
    }
}

fn method_match<'a>(hit: &MethodHit<'a>) -> MethodMatch<'a> {
    MethodMatch {
        class_name: hit.class.full_name(),
        method: method_view(hit.method),
    }
}

fn take<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) if n < items.len() => &items[..n],
        _ => items,
    }
}

pub fn render(response: &Response<'_>, format: OutputFormat, limit: Option<usize>) -> Result<String> {
    if format == OutputFormat::Text {
        return Ok(render_text(response, limit));
    }
    let Some((type_name, value)) = structured(response, limit)? else {
        return Ok(render_text(response, limit));
    };
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
        _ => Ok(to_typescript(type_name, &value)),
    }
}

/// The serializable shape of a response and its TypeScript type name.
///
/// Plain messages have no structured shape.
fn structured(response: &Response<'_>, limit: Option<usize>) -> Result<Option<(&'static str, Value)>> {
    let shaped = match response {
        Response::Classes {
            query,
            search_type,
            classes,
        } => {
            let shown = take(classes, limit);
            let result = ClassSearchResult {
                query,
                search_type,
                total_found: classes.len(),
                returned: shown.len(),
                classes: shown.iter().map(|c| class_view(c)).collect(),
            };
            ("ClassSearchResult", serde_json::to_value(result)?)
        }
        Response::Fields { query, hits } => {
            let shown = take(hits, limit);
            let result = FieldSearchResult {
                query,
                total_found: hits.len(),
                returned: shown.len(),
                matches: shown.iter().map(field_match).collect(),
            };
            ("FieldSearchResult", serde_json::to_value(result)?)
        }
        Response::Methods { query, hits } => {
            let shown = take(hits, limit);
            let result = MethodSearchResult {
                query,
                total_found: hits.len(),
                returned: shown.len(),
                matches: shown.iter().map(method_match).collect(),
            };
            ("MethodSearchResult", serde_json::to_value(result)?)
        }
        Response::Chain { query, chain } => {
            let result = InheritanceChainResult {
                query,
                result_type: "inheritance_chain",
                chain,
            };
            ("InheritanceChainResult", serde_json::to_value(result)?)
        }
        Response::Detail { query, class } => {
            let result = ClassDetailResult {
                query,
                result_type: "class_detail",
                class: class_view(class),
            };
            ("ClassDetailResult", serde_json::to_value(result)?)
        }
        Response::Find {
            query,
            classes,
            methods,
            fields,
        } => {
            let result = SmartSearchResult {
                query,
                result_type: "smart_search",
                classes: Section {
                    count: classes.len(),
                    items: take(classes, limit).iter().map(|c| class_view(c)).collect(),
                },
                methods: Section {
                    count: methods.len(),
                    items: take(methods, limit).iter().map(method_match).collect(),
                },
                fields: Section {
                    count: fields.len(),
                    items: take(fields, limit).iter().map(field_match).collect(),
                },
            };
            ("SmartSearchResult", serde_json::to_value(result)?)
        }
        Response::Stats(stats) => ("DumpStats", serde_json::to_value(stats)?),
        Response::Namespaces(namespaces) => {
            let result = NamespacesResult {
                total: namespaces.len(),
                namespaces: take(namespaces, limit),
            };
            ("NamespacesResult", serde_json::to_value(result)?)
        }
        Response::Message(_) => return Ok(None),
    };
    Ok(Some(shaped))
}

fn render_text(response: &Response<'_>, limit: Option<usize>) -> String {
    let mut out = String::new();
    match response {
        Response::Classes { classes, .. } => {
            let _ = writeln!(out, "Found {} results:", classes.len());
            for class in take(classes, limit) {
                let _ = writeln!(out, "{}", compact_class(class));
            }
            more(&mut out, "", classes.len(), limit);
        }
        Response::Fields { hits, .. } => {
            let _ = writeln!(out, "Found {} fields:", hits.len());
            for hit in take(hits, limit) {
                let _ = writeln!(out, "{}", field_line(hit));
            }
            more(&mut out, "", hits.len(), limit);
        }
        Response::Methods { hits, .. } => {
            let _ = writeln!(out, "Found {} methods:", hits.len());
            for hit in take(hits, limit) {
                let _ = writeln!(out, "{}", method_line(hit));
            }
            more(&mut out, "", hits.len(), limit);
        }
        Response::Chain { query, chain } => {
            let _ = writeln!(out, "Inheritance chain for '{query}':");
            for (depth, name) in chain.iter().enumerate() {
                let _ = writeln!(out, "  {}{}", "  ".repeat(depth), name);
            }
        }
        Response::Detail { class, .. } => out.push_str(&detailed_class(class)),
        Response::Find {
            classes,
            methods,
            fields,
            ..
        } => {
            if !classes.is_empty() {
                let _ = writeln!(out, "CLASSES ({}):", classes.len());
                for class in take(classes, limit) {
                    let _ = writeln!(out, "  {}", compact_class(class));
                }
                more(&mut out, "  ", classes.len(), limit);
            }
            if !methods.is_empty() {
                let _ = writeln!(out, "METHODS ({}):", methods.len());
                for hit in take(methods, limit) {
                    let _ = writeln!(out, "  {}", method_line(hit));
                }
                more(&mut out, "  ", methods.len(), limit);
            }
            if !fields.is_empty() {
                let _ = writeln!(out, "FIELDS ({}):", fields.len());
                for hit in take(fields, limit) {
                    let _ = writeln!(out, "  {}", field_line(hit));
                }
                more(&mut out, "  ", fields.len(), limit);
            }
            if out.is_empty() {
                out.push_str("No results found.\n");
            }
        }
        Response::Stats(stats) => out.push_str(&stats_text(stats)),
        Response::Namespaces(namespaces) => {
            let _ = writeln!(out, "Found {} namespaces:", namespaces.len());
            for ns in take(namespaces, limit) {
                let shown = if ns.is_empty() { "(global)" } else { *ns };
                let _ = writeln!(out, "  {shown}");
            }
            more(&mut out, "  ", namespaces.len(), limit);
        }
        Response::Message(message) => {
            out.push_str(message);
            if !message.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}

fn more(out: &mut String, indent: &str, total: usize, limit: Option<usize>) {
    if let Some(n) = limit
        && total > n
    {
        let _ = writeln!(out, "{indent}... and {} more", total - n);
    }
}

/// `[class] Game.Player (fields:3, methods:12)`
fn compact_class(class: &ClassEntry) -> String {
    format!(
        "[{}] {} (fields:{}, methods:{})",
        class.kind,
        class.full_name(),
        class.field_count(),
        class.method_count()
    )
}

fn bracketed(modifiers: Modifiers) -> String {
    if modifiers.is_empty() {
        String::new()
    } else {
        format!("[{modifiers}] ")
    }
}

fn field_line(hit: &FieldHit<'_>) -> String {
    format!(
        "{}.{}: {}{}",
        hit.class.full_name(),
        hit.field.name,
        bracketed(hit.field.modifiers),
        hit.field.type_name
    )
}

fn method_line(hit: &MethodHit<'_>) -> String {
    format!(
        "{}.{}({}): {}{}",
        hit.class.full_name(),
        hit.method.name,
        format_parameters(&hit.method.parameters),
        bracketed(hit.method.modifiers),
        hit.method.return_type
    )
}

fn detailed_class(class: &ClassEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] {}",
        class.kind.keyword().to_ascii_uppercase(),
        class.full_name()
    );
    let _ = writeln!(out, "  Modifiers: {}", class.modifiers);
    if let Some(base) = &class.base_class {
        let _ = writeln!(out, "  Inherits: {base}");
    }
    if !class.interfaces.is_empty() {
        let _ = writeln!(out, "  Implements: {}", class.interfaces.join(", "));
    }
    let _ = writeln!(out, "  TypeDefIndex: {}", class.type_def_index);
    let _ = writeln!(
        out,
        "  Fields: {} | Methods: {}",
        class.field_count(),
        class.method_count()
    );

    if !class.fields.is_empty() {
        out.push_str("\n  === FIELDS ===\n");
        for field in &class.fields {
            let _ = write!(
                out,
                "    {}{} {}",
                bracketed(field.modifiers),
                field.type_name,
                field.name
            );
            if let Some(value) = &field.default_value {
                let _ = write!(out, " = {value}");
            }
            if let Some(offset) = &field.offset {
                let _ = write!(out, " // {offset}");
            }
            out.push('\n');
        }
    }

    if !class.methods.is_empty() {
        out.push_str("\n  === METHODS ===\n");
        for method in &class.methods {
            let _ = write!(out, "    {}{}", bracketed(method.modifiers), method.signature());
            if let Some(rva) = &method.rva {
                let _ = write!(out, " // RVA: {rva}");
            }
            if let Some(offset) = &method.offset {
                let _ = write!(out, " Offset: {offset}");
            }
            if let Some(slot) = method.slot {
                let _ = write!(out, " Slot: {slot}");
            }
            out.push('\n');
        }
    }
    out
}

fn stats_text(stats: &DumpStats) -> String {
    format!(
        "Classes: {} | Methods: {} | Fields: {}\n\
         Namespaces: {} | Interfaces: {}\n\
         Enums: {} | Structs: {}\n\
         MonoBehaviours: {} | ScriptableObjects: {}\n",
        stats.total_classes,
        stats.total_methods,
        stats.total_fields,
        stats.total_namespaces,
        stats.total_interfaces,
        stats.total_enums,
        stats.total_structs,
        stats.mono_behaviours,
        stats.scriptable_objects
    )
}

/// Startup summary printed before the interactive prompt.
pub fn banner(dump: &LoadedDump, stats: &DumpStats) -> String {
    format!(
        "=== il2cpp-finder ===\n\
         Dump: {} ({} lines, {} ms)\n\
         SHA-256: {}\n\
         Loaded: {} classes, {} methods, {} fields\n\
         Types: {} interfaces, {} enums, {} structs\n\
         Unity: {} MonoBehaviours, {} ScriptableObjects\n\
         Type 'help' for commands, 'exit' to quit.\n",
        dump.path.display(),
        dump.line_count,
        dump.duration_ms,
        dump.content_hash,
        stats.total_classes,
        stats.total_methods,
        stats.total_fields,
        stats.total_interfaces,
        stats.total_enums,
        stats.total_structs,
        stats.mono_behaviours,
        stats.scriptable_objects
    )
}

/// `const result: ClassSearchResult = { ... };`
pub fn to_typescript(type_name: &str, value: &Value) -> String {
    let mut out = format!("const result: {type_name} = ");
    write_ts(&mut out, value, 0);
    out.push_str(";\n");
    out
}

fn write_ts(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    let inner = "  ".repeat(indent + 1);
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push_str(&value.to_string())
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&inner);
                write_ts(out, item, indent + 1);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                out.push_str(&inner);
                out.push_str(&ts_key(key));
                out.push_str(": ");
                write_ts(out, item, indent + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push('}');
        }
    }
}

fn ts_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        key.to_string()
    } else {
        Value::from(key).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dump;
    use crate::search::SearchIndex;

    const DUMP: &str = "// Namespace: Game
public class Player : MonoBehaviour, IDamageable // TypeDefIndex: 5
{
\tprivate int health; // 0x10
\tpublic void TakeDamage(int amount, string \"source\")
\t// RVA: 0x1A0 Offset: 0x1A0 VA: 0x1801A0 Slot: 7
}
// Namespace:
public class Program // TypeDefIndex: 1
{
}
// Namespace: Game
public enum Team // TypeDefIndex: 2
{
\tpublic const Team Red = 0;
}
";

    fn index() -> SearchIndex {
        SearchIndex::new(parse_dump(DUMP))
    }

    fn classes_response(index: &SearchIndex) -> Response<'_> {
        Response::Classes {
            query: "a".to_string(),
            search_type: "class_name",
            classes: index.by_class_name("a", false),
        }
    }

    #[test]
    fn text_listing_reports_truncation() -> Result<()> {
        let index = index();
        let out = render(&classes_response(&index), OutputFormat::Text, Some(1))?;
        assert_eq!(
            out,
            "Found 3 results:\n[class] Game.Player (fields:1, methods:1)\n... and 2 more\n"
        );
        Ok(())
    }

    #[test]
    fn json_listing_carries_totals() -> Result<()> {
        let index = index();
        let out = render(&classes_response(&index), OutputFormat::Json, Some(2))?;
        let value: Value = serde_json::from_str(&out)?;
        assert_eq!(value["search_type"], "class_name");
        assert_eq!(value["total_found"], 3);
        assert_eq!(value["returned"], 2);
        assert_eq!(value["classes"][0]["full_name"], "Game.Player");
        assert_eq!(value["classes"][0]["base_class"], "MonoBehaviour");
        assert_eq!(value["classes"][0]["fields"][0]["offset"], "0x10");
        assert_eq!(value["classes"][0]["methods"][0]["rva"], "0x1A0");
        assert_eq!(value["classes"][0]["methods"][0]["slot"], 7);
        assert!(value["classes"][1].get("fields").is_none());
        Ok(())
    }

    #[test]
    fn typescript_keeps_field_order_and_escapes() -> Result<()> {
        let index = index();
        let response = Response::Detail {
            query: "Player".to_string(),
            class: &index.classes()[0],
        };
        let out = render(&response, OutputFormat::Ts, None)?;
        assert!(out.starts_with("const result: ClassDetailResult = {\n  query: \"Player\",\n  type: \"class_detail\","));
        assert!(out.contains("name: \"\\\"source\\\"\""));
        assert!(out.ends_with("};\n"));
        Ok(())
    }

    #[test]
    fn namespaces_show_global_placeholder() -> Result<()> {
        let index = index();
        let response = Response::Namespaces(index.all_namespaces());
        let out = render(&response, OutputFormat::Text, None)?;
        assert_eq!(out, "Found 2 namespaces:\n  (global)\n  Game\n");
        Ok(())
    }

    #[test]
    fn messages_stay_plain_in_every_format() -> Result<()> {
        let response = Response::Message("Class 'Ghost' not found".to_string());
        assert_eq!(
            render(&response, OutputFormat::Json, None)?,
            "Class 'Ghost' not found\n"
        );
        Ok(())
    }

    #[test]
    fn detail_lists_members() {
        let index = index();
        let text = detailed_class(&index.classes()[0]);
        assert!(text.starts_with("[CLASS] Game.Player\n  Modifiers: public\n  Inherits: MonoBehaviour\n"));
        assert!(text.contains("  Implements: IDamageable\n"));
        assert!(text.contains("    [private] int health // 0x10\n"));
        assert!(text.contains("    [public] void TakeDamage(int amount, string \"source\") // RVA: 0x1A0 Offset: 0x1A0 Slot: 7\n"));
    }

    #[test]
    fn banner_reports_dump_fingerprint() {
        let classes = parse_dump(DUMP);
        let index = SearchIndex::new(classes.clone());
        let dump = LoadedDump {
            path: std::path::PathBuf::from("dumps/dump.cs"),
            content_hash: crate::load::hash_content(DUMP.as_bytes()),
            line_count: DUMP.lines().count(),
            classes,
            duration_ms: 3,
        };
        let text = banner(&dump, &index.stats());
        assert!(text.starts_with("=== il2cpp-finder ===\n"));
        assert!(text.contains(&format!("Dump: dumps/dump.cs ({} lines, 3 ms)\n", dump.line_count)));
        assert!(text.contains(&format!("SHA-256: {}\n", dump.content_hash)));
        assert!(text.contains("Loaded: 3 classes, 1 methods, 2 fields\n"));
    }

    #[test]
    fn empty_smart_search_says_so() -> Result<()> {
        let response = Response::Find {
            query: "zzz".to_string(),
            classes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        };
        assert_eq!(render(&response, OutputFormat::Text, None)?, "No results found.\n");
        Ok(())
    }

    #[test]
    fn ts_keys_are_quoted_only_when_needed() {
        assert_eq!(ts_key("full_name"), "full_name");
        assert_eq!(ts_key("has-dash"), "\"has-dash\"");
    }
}
