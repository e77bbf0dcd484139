use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::modifiers::{Modifier, Modifiers};

const MONO_BEHAVIOUR: &str = "MonoBehaviour";
const SCRIPTABLE_OBJECT: &str = "ScriptableObject";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
    Enum,
    Interface,
}

impl ClassKind {
    pub const ALL: [ClassKind; 4] = [
        ClassKind::Class,
        ClassKind::Struct,
        ClassKind::Enum,
        ClassKind::Interface,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Struct => "struct",
            ClassKind::Enum => "enum",
            ClassKind::Interface => "interface",
        }
    }

    pub fn from_keyword(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == token)
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown type kind '{}' (expected class, struct, enum or interface)",
            self.0
        )
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ClassKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(&s.trim().to_ascii_lowercase()).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub type_name: String,
    pub modifiers: Modifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldEntry {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifier::Static)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifier::Public)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(Modifier::Private)
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers.contains(Modifier::Readonly)
    }

    pub fn is_const(&self) -> bool {
        self.modifiers.contains(Modifier::Const)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    pub name: String,
    pub type_name: String,
    pub modifiers: Modifiers,
    pub has_getter: bool,
    pub has_setter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodEntry {
    pub name: String,
    pub return_type: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rva: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
}

impl MethodEntry {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifier::Static)
    }

    pub fn is_virtual(&self) -> bool {
        self.modifiers.contains(Modifier::Virtual)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifier::Abstract)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifier::Public)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(Modifier::Private)
    }

    pub fn is_override(&self) -> bool {
        self.modifiers.contains(Modifier::Override)
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// `void Move(float x, float y)`
    pub fn signature(&self) -> String {
        format!(
            "{} {}({})",
            self.return_type,
            self.name,
            format_parameters(&self.parameters)
        )
    }
}

pub fn format_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("{} {}", p.type_name, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One type declaration recovered from the dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassEntry {
    pub namespace: String,
    pub name: String,
    pub type_def_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldEntry>,
    pub methods: Vec<MethodEntry>,
    pub properties: Vec<PropertyEntry>,
    pub modifiers: Modifiers,
    pub kind: ClassKind,
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

impl ClassEntry {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            type_def_index: 0,
            base_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            modifiers: Modifiers::empty(),
            kind,
            start_line: 0,
            end_line: None,
        }
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifier::Static)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifier::Abstract)
    }

    pub fn is_sealed(&self) -> bool {
        self.modifiers.contains(Modifier::Sealed)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifier::Public)
    }

    pub fn is_mono_behaviour(&self) -> bool {
        self.base_contains(MONO_BEHAVIOUR)
    }

    pub fn is_scriptable_object(&self) -> bool {
        self.base_contains(SCRIPTABLE_OBJECT)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn base_contains(&self, marker: &str) -> bool {
        self.base_class.as_deref().is_some_and(|b| b.contains(marker))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpStats {
    pub total_classes: usize,
    pub total_methods: usize,
    pub total_fields: usize,
    pub total_properties: usize,
    pub total_namespaces: usize,
    pub total_plain_classes: usize,
    pub total_structs: usize,
    pub total_enums: usize,
    pub total_interfaces: usize,
    pub mono_behaviours: usize,
    pub scriptable_objects: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_skips_empty_namespace() {
        let global = ClassEntry::new("", "Program", ClassKind::Class);
        assert_eq!(global.full_name(), "Program");

        let scoped = ClassEntry::new("Game.Units", "Player", ClassKind::Class);
        assert_eq!(scoped.full_name(), "Game.Units.Player");
    }

    #[test]
    fn base_markers_use_base_class_text() {
        let mut cls = ClassEntry::new("Game", "Player", ClassKind::Class);
        assert!(!cls.is_mono_behaviour());

        cls.base_class = Some("UnityEngine.MonoBehaviour".to_string());
        assert!(cls.is_mono_behaviour());
        assert!(!cls.is_scriptable_object());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Struct".parse::<ClassKind>(), Ok(ClassKind::Struct));
        assert_eq!(" enum ".parse::<ClassKind>(), Ok(ClassKind::Enum));
        assert!("record".parse::<ClassKind>().is_err());
    }

    #[test]
    fn method_signature_lists_parameters() {
        let method = MethodEntry {
            name: "Move".to_string(),
            return_type: "void".to_string(),
            modifiers: [Modifier::Public].into_iter().collect(),
            parameters: vec![
                Parameter {
                    name: "x".to_string(),
                    type_name: "float".to_string(),
                },
                Parameter {
                    name: "y".to_string(),
                    type_name: "float".to_string(),
                },
            ],
            rva: None,
            offset: None,
            slot: None,
        };
        assert_eq!(method.signature(), "void Move(float x, float y)");
        assert_eq!(method.parameter_count(), 2);
        assert!(method.is_public());
        assert!(!method.is_static());
    }
}
