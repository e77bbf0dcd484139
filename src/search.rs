//! Read-only search over the classes recovered from one dump.
//!
//! Built once from the parser output. Every query is a pure function of the
//! loaded classes and returns hits in file order; truncation is left to the
//! caller.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::model::{ClassEntry, ClassKind, DumpStats, FieldEntry, MethodEntry};

#[derive(Debug, Clone, Copy)]
pub struct FieldHit<'a> {
    pub class: &'a ClassEntry,
    pub field: &'a FieldEntry,
}

#[derive(Debug, Clone, Copy)]
pub struct MethodHit<'a> {
    pub class: &'a ClassEntry,
    pub method: &'a MethodEntry,
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    classes: Arc<[ClassEntry]>,
    full_names: Vec<String>,
    by_full_name: HashMap<String, Vec<usize>>,
    by_type_def_index: HashMap<u32, usize>,
    by_namespace: BTreeMap<String, Vec<usize>>,
}

impl SearchIndex {
    pub fn new(classes: Vec<ClassEntry>) -> Self {
        Self::from_shared(classes.into())
    }

    pub fn from_shared(classes: Arc<[ClassEntry]>) -> Self {
        let full_names: Vec<String> = classes.iter().map(ClassEntry::full_name).collect();

        let mut by_full_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_type_def_index = HashMap::with_capacity(classes.len());
        let mut by_namespace: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (pos, class) in classes.iter().enumerate() {
            by_full_name
                .entry(full_names[pos].clone())
                .or_default()
                .push(pos);
            // Later declarations overwrite earlier ones with the same index.
            by_type_def_index.insert(class.type_def_index, pos);
            by_namespace
                .entry(class.namespace.clone())
                .or_default()
                .push(pos);
        }

        Self {
            classes,
            full_names,
            by_full_name,
            by_type_def_index,
            by_namespace,
        }
    }

    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn by_class_name(&self, query: &str, exact: bool) -> Vec<&ClassEntry> {
        let needle = Needle::new(query);
        self.filter(|c| needle.matches(&c.name, exact))
    }

    pub fn by_namespace(&self, query: &str, exact: bool) -> Vec<&ClassEntry> {
        if exact && let Some(hits) = self.by_namespace.get(query) {
            return self.resolve(hits);
        }
        let needle = Needle::new(query);
        self.filter(|c| needle.matches(&c.namespace, exact))
    }

    pub fn by_full_name(&self, query: &str, exact: bool) -> Vec<&ClassEntry> {
        if exact && let Some(hits) = self.by_full_name.get(query) {
            return self.resolve(hits);
        }
        let needle = Needle::new(query);
        self.classes
            .iter()
            .zip(&self.full_names)
            .filter(|(_, full_name)| needle.matches(full_name, exact))
            .map(|(class, _)| class)
            .collect()
    }

    pub fn by_type_def_index(&self, index: u32) -> Option<&ClassEntry> {
        self.by_type_def_index
            .get(&index)
            .map(|&pos| &self.classes[pos])
    }

    pub fn by_base_class(&self, query: &str) -> Vec<&ClassEntry> {
        let needle = Needle::new(query);
        self.filter(|c| c.base_class.as_deref().is_some_and(|b| needle.found_in(b)))
    }

    pub fn by_interface(&self, query: &str) -> Vec<&ClassEntry> {
        let needle = Needle::new(query);
        self.filter(|c| c.interfaces.iter().any(|i| needle.found_in(i)))
    }

    pub fn by_kind(&self, kind: ClassKind) -> Vec<&ClassEntry> {
        self.filter(|c| c.kind == kind)
    }

    pub fn mono_behaviours(&self) -> Vec<&ClassEntry> {
        self.filter(ClassEntry::is_mono_behaviour)
    }

    pub fn scriptable_objects(&self) -> Vec<&ClassEntry> {
        self.filter(ClassEntry::is_scriptable_object)
    }

    pub fn search_fields(&self, query: &str, exact: bool) -> Vec<FieldHit<'_>> {
        let needle = Needle::new(query);
        self.field_hits()
            .filter(|hit| needle.matches(&hit.field.name, exact))
            .collect()
    }

    pub fn fields_by_type(&self, query: &str) -> Vec<FieldHit<'_>> {
        let needle = Needle::new(query);
        self.field_hits()
            .filter(|hit| needle.found_in(&hit.field.type_name))
            .collect()
    }

    /// Offsets compare as text, so `0x10` does not match `0x010`.
    pub fn fields_by_offset(&self, offset: &str) -> Vec<FieldHit<'_>> {
        let needle = Needle::new(offset);
        self.field_hits()
            .filter(|hit| hit.field.offset.as_deref().is_some_and(|o| needle.equals(o)))
            .collect()
    }

    pub fn search_methods(&self, query: &str, exact: bool) -> Vec<MethodHit<'_>> {
        let needle = Needle::new(query);
        self.method_hits()
            .filter(|hit| needle.matches(&hit.method.name, exact))
            .collect()
    }

    pub fn methods_by_return_type(&self, query: &str) -> Vec<MethodHit<'_>> {
        let needle = Needle::new(query);
        self.method_hits()
            .filter(|hit| needle.found_in(&hit.method.return_type))
            .collect()
    }

    pub fn methods_by_parameter_type(&self, query: &str) -> Vec<MethodHit<'_>> {
        let needle = Needle::new(query);
        self.method_hits()
            .filter(|hit| {
                hit.method
                    .parameters
                    .iter()
                    .any(|p| needle.found_in(&p.type_name))
            })
            .collect()
    }

    pub fn methods_by_rva(&self, rva: &str) -> Vec<MethodHit<'_>> {
        let needle = Needle::new(rva);
        self.method_hits()
            .filter(|hit| hit.method.rva.as_deref().is_some_and(|r| needle.equals(r)))
            .collect()
    }

    pub fn methods_by_offset(&self, offset: &str) -> Vec<MethodHit<'_>> {
        let needle = Needle::new(offset);
        self.method_hits()
            .filter(|hit| hit.method.offset.as_deref().is_some_and(|o| needle.equals(o)))
            .collect()
    }

    /// Classes owning at least one method that satisfies every given predicate.
    pub fn classes_with_method(
        &self,
        name: &str,
        return_type: Option<&str>,
        param_count: Option<usize>,
    ) -> Vec<&ClassEntry> {
        let name = Needle::new(name);
        let return_type = return_type.map(Needle::new);
        self.filter(|c| {
            c.methods.iter().any(|m| {
                name.found_in(&m.name)
                    && return_type
                        .as_ref()
                        .is_none_or(|rt| rt.found_in(&m.return_type))
                    && param_count.is_none_or(|n| m.parameters.len() == n)
            })
        })
    }

    pub fn classes_with_field(&self, name: &str, type_name: Option<&str>) -> Vec<&ClassEntry> {
        let name = Needle::new(name);
        let type_name = type_name.map(Needle::new);
        self.filter(|c| {
            c.fields.iter().any(|f| {
                name.found_in(&f.name)
                    && type_name
                        .as_ref()
                        .is_none_or(|t| t.found_in(&f.type_name))
            })
        })
    }

    /// Base-class text is matched by substring: `EntityBase` counts as
    /// derived from `Entity`.
    pub fn derived_classes(&self, base_name: &str) -> Vec<&ClassEntry> {
        self.by_base_class(base_name)
    }

    /// Full names from `name` up through each resolvable base class.
    ///
    /// Stops at the first base that is not a loaded class, and at any class
    /// already visited so self-referencing or cyclic bases terminate.
    pub fn inheritance_chain(&self, name: &str) -> Vec<String> {
        let start = Needle::new(name);
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.classes.iter().position(|c| start.equals(&c.name));

        while let Some(pos) = current {
            if !visited.insert(pos) {
                break;
            }
            chain.push(self.full_names[pos].clone());

            let Some(base) = self.classes[pos].base_class.as_deref() else {
                break;
            };
            let base = Needle::new(base);
            current = self
                .classes
                .iter()
                .zip(&self.full_names)
                .position(|(c, full_name)| base.equals(&c.name) || base.equals(full_name));
        }

        chain
    }

    /// Sorted, distinct; the global namespace appears as `""`.
    pub fn all_namespaces(&self) -> Vec<&str> {
        self.by_namespace.keys().map(String::as_str).collect()
    }

    pub fn stats(&self) -> DumpStats {
        let count_kind = |kind: ClassKind| self.classes.iter().filter(|c| c.kind == kind).count();
        DumpStats {
            total_classes: self.classes.len(),
            total_methods: self.classes.iter().map(ClassEntry::method_count).sum(),
            total_fields: self.classes.iter().map(ClassEntry::field_count).sum(),
            total_properties: self.classes.iter().map(ClassEntry::property_count).sum(),
            total_namespaces: self.by_namespace.len(),
            total_plain_classes: count_kind(ClassKind::Class),
            total_structs: count_kind(ClassKind::Struct),
            total_enums: count_kind(ClassKind::Enum),
            total_interfaces: count_kind(ClassKind::Interface),
            mono_behaviours: self.classes.iter().filter(|c| c.is_mono_behaviour()).count(),
            scriptable_objects: self
                .classes
                .iter()
                .filter(|c| c.is_scriptable_object())
                .count(),
        }
    }

    fn filter<F>(&self, mut predicate: F) -> Vec<&ClassEntry>
    where
        F: FnMut(&ClassEntry) -> bool,
    {
        self.classes.iter().filter(|&class| predicate(class)).collect()
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&ClassEntry> {
        positions.iter().map(|&pos| &self.classes[pos]).collect()
    }

    fn field_hits(&self) -> impl Iterator<Item = FieldHit<'_>> {
        self.classes.iter().flat_map(|class| {
            class
                .fields
                .iter()
                .map(move |field| FieldHit { class, field })
        })
    }

    fn method_hits(&self) -> impl Iterator<Item = MethodHit<'_>> {
        self.classes.iter().flat_map(|class| {
            class
                .methods
                .iter()
                .map(move |method| MethodHit { class, method })
        })
    }
}

/// Case-insensitive query text, lowered once per query.
#[derive(Debug, Clone)]
struct Needle {
    lower: String,
}

impl Needle {
    fn new(query: &str) -> Self {
        Self {
            lower: query.to_lowercase(),
        }
    }

    fn matches(&self, haystack: &str, exact: bool) -> bool {
        if exact {
            self.equals(haystack)
        } else {
            self.found_in(haystack)
        }
    }

    fn found_in(&self, haystack: &str) -> bool {
        if self.lower.is_empty() {
            return true;
        }
        if haystack.is_ascii() && self.lower.is_ascii() {
            let needle = self.lower.as_bytes();
            return haystack
                .as_bytes()
                .windows(needle.len())
                .any(|w| w.eq_ignore_ascii_case(needle));
        }
        haystack.to_lowercase().contains(&self.lower)
    }

    fn equals(&self, haystack: &str) -> bool {
        if haystack.is_ascii() && self.lower.is_ascii() {
            return haystack.eq_ignore_ascii_case(&self.lower);
        }
        haystack.to_lowercase() == self.lower
    }
}
