//! Line-oriented parser for IL2CPP `dump.cs` reports.
//!
//! The report is C#-looking text with no formal grammar. Each line is
//! recognized on its own, with two pieces of carried state: the sticky
//! namespace from the last `// Namespace:` marker, and one pending method
//! signature waiting for its `// RVA:` metadata line. Anything that does not
//! match is skipped, so the parser never fails.

use tracing::{debug, trace};

use crate::model::{ClassEntry, ClassKind, FieldEntry, MethodEntry, Parameter};
use crate::modifiers::{Modifier, Modifiers};

const NAMESPACE_MARKER: &str = "// Namespace:";
const TYPE_DEF_INDEX_MARKER: &str = "TypeDefIndex:";
const ENUM_CONSTANT_PREFIX: &str = "public const ";
const ENUM_FIELD_TYPE: &str = "enum";

pub fn parse_dump(content: &str) -> Vec<ClassEntry> {
    parse_lines(content.lines())
}

pub fn parse_lines<'a, I>(lines: I) -> Vec<ClassEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parser = DumpParser::new();
    for (idx, line) in lines.into_iter().enumerate() {
        parser.feed(idx + 1, line);
    }
    parser.finish()
}

/// Incremental form of [`parse_lines`] for callers that stream lines.
///
/// A class is "open" while `current` is set. It closes when its braces
/// balance back to zero or when another declaration line appears.
#[derive(Debug, Default)]
pub struct DumpParser {
    namespace: String,
    current: Option<ClassEntry>,
    depth: i32,
    pending: Option<PendingSignature>,
    classes: Vec<ClassEntry>,
    discarded_signatures: usize,
}

impl DumpParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line; `line_no` is 1-based.
    pub fn feed(&mut self, line_no: usize, line: &str) {
        let trimmed = line.trim();

        if let Some(namespace) = match_namespace(trimmed) {
            self.namespace = namespace.to_string();
            return;
        }

        if let Some(decl) = match_declaration(trimmed) {
            self.start_class(decl, line_no);
            return;
        }

        if self.current.is_none() {
            return;
        }

        match trimmed {
            "{" => {
                self.depth += 1;
                return;
            }
            "}" => {
                self.depth -= 1;
                if self.depth == 0 {
                    self.close(Some(line_no));
                }
                return;
            }
            _ => {}
        }

        let Some(class) = self.current.as_mut() else {
            return;
        };

        if let Some(field) = match_field(trimmed) {
            class.fields.push(field);
            return;
        }

        if class.kind == ClassKind::Enum
            && let Some(constant) = match_enum_constant(trimmed)
        {
            class.fields.push(constant);
            return;
        }

        if let Some(signature) = match_signature(trimmed) {
            if let Some(dropped) = self.pending.replace(signature) {
                trace!(
                    class = %class.name,
                    method = %dropped.name,
                    "signature replaced before metadata"
                );
                self.discarded_signatures += 1;
            }
            return;
        }

        if let Some(metadata) = match_metadata(trimmed)
            && let Some(signature) = self.pending.take()
        {
            class.methods.push(signature.into_method(metadata));
        }
    }

    pub fn finish(mut self) -> Vec<ClassEntry> {
        self.close(None);
        debug!(
            classes = self.classes.len(),
            discarded_signatures = self.discarded_signatures,
            "dump parse finished"
        );
        self.classes
    }

    fn start_class(&mut self, decl: Declaration<'_>, line_no: usize) {
        self.close(None);

        let mut class = ClassEntry::new(self.namespace.clone(), decl.name, decl.kind);
        class.modifiers = decl.modifiers;
        class.type_def_index = decl.type_def_index;
        class.start_line = line_no;

        if let Some(inheritance) = decl.inheritance {
            let mut parts = inheritance.split(',').map(str::trim);
            class.base_class = parts
                .next()
                .filter(|base| !base.is_empty())
                .map(str::to_string);
            class.interfaces = parts
                .filter(|iface| !iface.is_empty())
                .map(str::to_string)
                .collect();
        }

        self.current = Some(class);
        self.depth = 0;
    }

    fn close(&mut self, end_line: Option<usize>) {
        if let Some(mut class) = self.current.take() {
            if let Some(dropped) = self.pending.take() {
                trace!(
                    class = %class.name,
                    method = %dropped.name,
                    "signature without metadata at end of class"
                );
                self.discarded_signatures += 1;
            }
            class.end_line = end_line;
            self.classes.push(class);
        }
        self.depth = 0;
    }
}

#[derive(Debug)]
struct Declaration<'a> {
    modifiers: Modifiers,
    kind: ClassKind,
    name: &'a str,
    inheritance: Option<&'a str>,
    type_def_index: u32,
}

#[derive(Debug, Clone)]
struct PendingSignature {
    modifiers: Modifiers,
    return_type: String,
    name: String,
    parameters: Vec<Parameter>,
}

impl PendingSignature {
    fn into_method(self, metadata: Metadata<'_>) -> MethodEntry {
        MethodEntry {
            name: self.name,
            return_type: self.return_type,
            modifiers: self.modifiers,
            parameters: self.parameters,
            rva: Some(metadata.rva.to_string()),
            offset: Some(metadata.offset.to_string()),
            slot: metadata.slot,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Metadata<'a> {
    rva: &'a str,
    offset: &'a str,
    slot: Option<u32>,
}

fn match_namespace(line: &str) -> Option<&str> {
    line.strip_prefix(NAMESPACE_MARKER).map(str::trim)
}

/// `public sealed class Player : MonoBehaviour, IDamageable // TypeDefIndex: 5`
fn match_declaration(line: &str) -> Option<Declaration<'_>> {
    let marker = line.find(TYPE_DEF_INDEX_MARKER)?;
    let decl = line[..marker].trim_end().strip_suffix("//")?;
    let digits = leading_digits(line[marker + TYPE_DEF_INDEX_MARKER.len()..].trim_start())?;
    let type_def_index = digits.parse().ok()?;

    let (head, inheritance) = match decl.split_once(':') {
        Some((head, rest)) => (head, Some(rest.trim())),
        None => (decl, None),
    };

    let tokens: Vec<&str> = head.split_whitespace().collect();
    let (modifiers, rest) = Modifiers::split_leading(&tokens);
    let &[kind, name] = rest else {
        return None;
    };
    let kind = ClassKind::from_keyword(kind)?;

    Some(Declaration {
        modifiers,
        kind,
        name,
        inheritance,
        type_def_index,
    })
}

/// `private float speed; // 0x1C`
fn match_field(line: &str) -> Option<FieldEntry> {
    if line.contains('(') {
        return None;
    }

    let (decl, comment) = line.split_once(';')?;
    let offset = hex_literal(comment.trim_start().strip_prefix("//")?.trim_start())?;

    let tokens: Vec<&str> = decl.split_whitespace().collect();
    let (modifiers, rest) = Modifiers::split_leading(&tokens);
    let (name, type_tokens) = rest.split_last()?;
    if type_tokens.is_empty() {
        return None;
    }

    Some(FieldEntry {
        name: name.to_string(),
        type_name: type_tokens.join(" "),
        modifiers,
        offset: Some(offset.to_string()),
        default_value: None,
    })
}

/// `public const Color Red = 0;`
fn match_enum_constant(line: &str) -> Option<FieldEntry> {
    let rest = line.strip_prefix(ENUM_CONSTANT_PREFIX)?;
    let (lhs, rhs) = rest.split_once('=')?;

    let tokens: Vec<&str> = lhs.split_whitespace().collect();
    let &[_type_name, name] = tokens.as_slice() else {
        return None;
    };

    let value = rhs[..rhs.rfind(';')?].trim();
    if value.is_empty() {
        return None;
    }

    Some(FieldEntry {
        name: name.to_string(),
        type_name: ENUM_FIELD_TYPE.to_string(),
        modifiers: [Modifier::Public, Modifier::Const].into_iter().collect(),
        offset: None,
        default_value: Some(value.to_string()),
    })
}

/// `public override void OnHit(int damage, Vector3 point)` with no comment.
fn match_signature(line: &str) -> Option<PendingSignature> {
    if line.contains("//") {
        return None;
    }

    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;

    let tokens: Vec<&str> = line[..open].split_whitespace().collect();
    let (modifiers, rest) = Modifiers::split_leading(&tokens);
    let (name, return_tokens) = rest.split_last()?;
    if return_tokens.is_empty() {
        return None;
    }

    Some(PendingSignature {
        modifiers,
        return_type: return_tokens.join(" "),
        name: name.to_string(),
        parameters: parse_parameters(&line[open + 1..close]),
    })
}

/// Splits on commas, then on whitespace: the last word is the name and the
/// rest is the type. Pieces with fewer than two words are dropped.
fn parse_parameters(text: &str) -> Vec<Parameter> {
    text.split(',')
        .filter_map(|raw| {
            let words: Vec<&str> = raw.split_whitespace().collect();
            let (name, type_words) = words.split_last()?;
            if type_words.is_empty() {
                return None;
            }
            Some(Parameter {
                name: name.to_string(),
                type_name: type_words.join(" "),
            })
        })
        .collect()
}

/// `// RVA: 0x1000 Offset: 0x2000 VA: 0x3000 Slot: 4`
fn match_metadata(line: &str) -> Option<Metadata<'_>> {
    let rest = line.strip_prefix("//")?.trim_start().strip_prefix("RVA:")?;
    let (rva, rest) = address(rest.trim_start())?;

    let rest = after_whitespace(rest)?.strip_prefix("Offset:")?;
    let (offset, rest) = address(rest.trim_start())?;

    let rest = after_whitespace(rest)?.strip_prefix("VA:")?.trim_start();
    let va = hex_literal(rest)?;
    let rest = &rest[va.len()..];

    let slot = after_whitespace(rest)
        .and_then(|r| r.strip_prefix("Slot:"))
        .and_then(|r| leading_digits(r.trim_start()))
        .and_then(|digits| digits.parse().ok());

    Some(Metadata { rva, offset, slot })
}

/// A hex address or the `-1` placeholder used for abstract methods.
fn address(s: &str) -> Option<(&str, &str)> {
    if s.starts_with("-1") {
        return Some(s.split_at(2));
    }
    let hex = hex_literal(s)?;
    Some(s.split_at(hex.len()))
}

fn hex_literal(s: &str) -> Option<&str> {
    let digits = s.strip_prefix("0x")?;
    let len = digits.bytes().take_while(u8::is_ascii_hexdigit).count();
    (len > 0).then(|| &s[..2 + len])
}

fn leading_digits(s: &str) -> Option<&str> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    (len > 0).then(|| &s[..len])
}

/// Requires at least one whitespace character and skips all of it.
fn after_whitespace(s: &str) -> Option<&str> {
    let rest = s.trim_start();
    (rest.len() < s.len()).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_with_namespace_base_and_field() {
        let input = "// Namespace: Game
public class Player : MonoBehaviour // TypeDefIndex: 5
{
\tpublic int health; // 0x10
}
";
        let classes = parse_dump(input);
        assert_eq!(classes.len(), 1);

        let player = &classes[0];
        assert_eq!(player.full_name(), "Game.Player");
        assert_eq!(player.base_class.as_deref(), Some("MonoBehaviour"));
        assert_eq!(player.type_def_index, 5);
        assert_eq!(player.kind, ClassKind::Class);
        assert_eq!(player.start_line, 2);
        assert_eq!(player.end_line, Some(5));

        assert_eq!(player.fields.len(), 1);
        let health = &player.fields[0];
        assert_eq!(health.name, "health");
        assert_eq!(health.type_name, "int");
        assert_eq!(health.offset.as_deref(), Some("0x10"));
        assert!(health.is_public());
    }

    #[test]
    fn signature_pairs_with_following_metadata() {
        let input = "public class Player // TypeDefIndex: 1
{
\tpublic void Jump()
\t// RVA: 0x1000 Offset: 0x2000 VA: 0x3000 Slot: 4
}
";
        let classes = parse_dump(input);
        let methods = &classes[0].methods;
        assert_eq!(methods.len(), 1);

        let jump = &methods[0];
        assert_eq!(jump.name, "Jump");
        assert_eq!(jump.return_type, "void");
        assert_eq!(jump.rva.as_deref(), Some("0x1000"));
        assert_eq!(jump.offset.as_deref(), Some("0x2000"));
        assert_eq!(jump.slot, Some(4));
        assert!(jump.parameters.is_empty());
    }

    #[test]
    fn signature_without_metadata_before_class_end_is_dropped() {
        let input = "public class Player // TypeDefIndex: 1
{
\tpublic void Jump()
}
public class Enemy // TypeDefIndex: 2
{
\t// RVA: 0x1000 Offset: 0x2000 VA: 0x3000
}
";
        let classes = parse_dump(input);
        assert_eq!(classes.len(), 2);
        assert!(classes[0].methods.is_empty());
        assert!(classes[1].methods.is_empty());
    }

    #[test]
    fn back_to_back_signatures_keep_only_the_latest() {
        let input = "public class Player // TypeDefIndex: 1
{
\tpublic void Walk()
\tpublic void Run(float speed)
\t// RVA: 0x10 Offset: 0x10 VA: 0x180000010
}
";
        let classes = parse_dump(input);
        let methods = &classes[0].methods;
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "Run");
        assert_eq!(methods[0].slot, None);
    }

    #[test]
    fn lines_between_signature_and_metadata_do_not_clear_it() {
        let input = "public class Player // TypeDefIndex: 1
{
\tpublic void Walk()

\t[Obsolete]
\t// RVA: 0x10 Offset: 0x10 VA: 0x180000010
}
";
        let classes = parse_dump(input);
        assert_eq!(classes[0].methods.len(), 1);
    }

    #[test]
    fn parameters_split_into_type_and_name() {
        let input = "public class Weapon // TypeDefIndex: 3
{
\tpublic static bool TryFire(ref int ammo, Vector3 target, params object[] args)
\t// RVA: -1 Offset: -1 VA: 0x0
}
";
        let classes = parse_dump(input);
        let method = &classes[0].methods[0];
        assert!(method.is_static());
        assert_eq!(method.return_type, "bool");
        assert_eq!(method.rva.as_deref(), Some("-1"));
        assert_eq!(method.offset.as_deref(), Some("-1"));
        assert_eq!(
            method.parameters,
            vec![
                Parameter {
                    name: "ammo".to_string(),
                    type_name: "ref int".to_string()
                },
                Parameter {
                    name: "target".to_string(),
                    type_name: "Vector3".to_string()
                },
                Parameter {
                    name: "args".to_string(),
                    type_name: "params object[]".to_string()
                },
            ]
        );
    }

    #[test]
    fn enum_constants_become_enum_fields() {
        let input = "// Namespace: Game
public enum Team // TypeDefIndex: 9
{
\tpublic int value__; // 0x0
\tpublic const Team Red = 0;
\tpublic const Team Blue = 1;
}
";
        let classes = parse_dump(input);
        let team = &classes[0];
        assert_eq!(team.kind, ClassKind::Enum);
        assert_eq!(team.fields.len(), 3);

        let red = &team.fields[1];
        assert_eq!(red.name, "Red");
        assert_eq!(red.type_name, "enum");
        assert_eq!(red.default_value.as_deref(), Some("0"));
        assert_eq!(red.offset, None);
    }

    #[test]
    fn constants_outside_enums_are_ignored() {
        let input = "public class Limits // TypeDefIndex: 4
{
\tpublic const int Max = 10;
}
";
        let classes = parse_dump(input);
        assert!(classes[0].fields.is_empty());
    }

    #[test]
    fn inheritance_list_splits_base_and_interfaces() {
        let input =
            "internal sealed class Door : Interactable, IOpenable, ILockable // TypeDefIndex: 12";
        let classes = parse_dump(input);
        let door = &classes[0];
        assert!(door.is_sealed());
        assert_eq!(door.base_class.as_deref(), Some("Interactable"));
        assert_eq!(door.interfaces, vec!["IOpenable", "ILockable"]);
        assert_eq!(door.end_line, None);
    }

    #[test]
    fn namespace_is_sticky_until_replaced() {
        let input = "// Namespace:
public class Program // TypeDefIndex: 0
// Namespace: Game.UI
public class Menu // TypeDefIndex: 1
public class Hud // TypeDefIndex: 2
// Namespace: Game
public struct Stats // TypeDefIndex: 3
";
        let classes = parse_dump(input);
        let names: Vec<String> = classes.iter().map(ClassEntry::full_name).collect();
        assert_eq!(names, vec!["Program", "Game.UI.Menu", "Game.UI.Hud", "Game.Stats"]);
        assert_eq!(classes[3].kind, ClassKind::Struct);
    }

    #[test]
    fn new_declaration_restarts_even_with_open_braces() {
        let input = "public class A // TypeDefIndex: 1
{
\t{
\tpublic int a; // 0x10
public class B // TypeDefIndex: 2
{
\tpublic int b; // 0x10
}
";
        let classes = parse_dump(input);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, "A");
        assert_eq!(classes[0].end_line, None);
        assert_eq!(classes[0].fields.len(), 1);
        assert_eq!(classes[1].name, "B");
        assert_eq!(classes[1].fields[0].name, "b");
        assert_eq!(classes[1].end_line, Some(8));
    }

    #[test]
    fn members_after_class_end_are_ignored() {
        let input = "public class A // TypeDefIndex: 1
{
}
public int stray; // 0x10
";
        let classes = parse_dump(input);
        assert!(classes[0].fields.is_empty());
    }

    #[test]
    fn noise_lines_are_skipped() {
        let input = "garbage line
// Namespace: Game
[Serializable]
public class : Broken // TypeDefIndex: 3
public class Missing // TypeDefIndex:
public class Valid // TypeDefIndex: 4
{
\t// Fields
\tpublic int; // 0x10
\tpublic Dictionary<int, string> lookup; // 0x18
\tpublic int broken; // not-an-offset
}
";
        let classes = parse_dump(input);
        assert_eq!(classes.len(), 1);
        let valid = &classes[0];
        assert_eq!(valid.name, "Valid");
        assert_eq!(valid.fields.len(), 1);
        assert_eq!(valid.fields[0].type_name, "Dictionary<int, string>");
        assert_eq!(valid.fields[0].name, "lookup");
    }

    #[test]
    fn yields_one_class_per_declaration_in_order() {
        let mut input = String::new();
        for i in 0..25 {
            input.push_str(&format!(
                "public class C{i} // TypeDefIndex: {i}\n{{\n}}\n"
            ));
        }
        let classes = parse_dump(&input);
        assert_eq!(classes.len(), 25);
        for (i, class) in classes.iter().enumerate() {
            assert_eq!(class.name, format!("C{i}"));
            assert_eq!(class.type_def_index, i as u32);
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let input = "// Namespace: Game
public class Player : MonoBehaviour // TypeDefIndex: 5
{
\tprivate float speed; // 0x18
\tpublic void Jump()
\t// RVA: 0x1000 Offset: 0x2000 VA: 0x3000 Slot: 4
}
";
        assert_eq!(parse_dump(input), parse_dump(input));
    }

    #[test]
    fn crlf_input_is_accepted() {
        let input = "// Namespace: Game\r\npublic class Player // TypeDefIndex: 5\r\n{\r\n\tpublic int health; // 0x10\r\n}\r\n";
        let classes = parse_dump(input);
        assert_eq!(classes[0].full_name(), "Game.Player");
        assert_eq!(classes[0].fields.len(), 1);
    }

    #[test]
    fn metadata_parsing_requires_each_part() {
        assert!(match_metadata("// RVA: 0x10 Offset: 0x20 VA: 0x30").is_some());
        assert!(match_metadata("// RVA: 0x10 Offset: 0x20").is_none());
        assert!(match_metadata("// RVA: 0x10zz Offset: 0x20 VA: 0x30").is_none());
        assert!(match_metadata("// RVA:0x10 Offset:0x20 VA:0x30 Slot:7")
            .is_some_and(|m| m.slot == Some(7)));
    }
}
