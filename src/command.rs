//! The analyst command language shared by `--cmd` and the REPL.
//!
//! A command is `<verb> <argument>`; the verb is case-insensitive and the
//! argument is the rest of the line.

use anyhow::Result;
use std::str::FromStr;
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::model::{ClassEntry, ClassKind, DumpStats, UnknownKind};
use crate::render;
use crate::search::{FieldHit, MethodHit, SearchIndex};

pub const HELP: &str = "COMMANDS:

CLASS: class <name>, class.exact <name>, ns <namespace>, ns.exact <namespace>
       fullname <name>, fullname.exact <name>, base <class>, impl <interface>
       type <class|struct|enum|interface>, mono, scriptable

FIELD: field <name>, field.exact <name>, field.type <type>, field.offset <0x10>

METHOD: method <name>, method.exact <name>, method.ret <type>, method.param <type>
        rva <0x123>, method.offset <0x123>

ADVANCED: find <query>, hierarchy <class>, derived <class>
          hasmeth <name> [ret:<type>] [params:<n>], hasfield <name> [type:<type>]

DETAILS: detail <class>, idx <index>

INFO: stats, namespaces, help, exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ClassName { query: String, exact: bool },
    Namespace { query: String, exact: bool },
    FullName { query: String, exact: bool },
    BaseClass(String),
    Interface(String),
    Kind(ClassKind),
    MonoBehaviours,
    ScriptableObjects,
    Field { query: String, exact: bool },
    FieldType(String),
    FieldOffset(String),
    Method { query: String, exact: bool },
    MethodReturn(String),
    MethodParam(String),
    Rva(String),
    MethodOffset(String),
    Find(String),
    Hierarchy(String),
    Derived(String),
    HasMethod {
        name: String,
        return_type: Option<String>,
        param_count: Option<usize>,
    },
    HasField {
        name: String,
        type_name: Option<String>,
    },
    Detail(String),
    TypeDefIndex(u32),
    Stats,
    Namespaces,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("Unknown command: {0}. Type 'help' for commands.")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error(transparent)]
    Kind(#[from] UnknownKind),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (verb, arg) = match input.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (input, ""),
        };
        if verb.is_empty() {
            return Err(CommandError::Empty);
        }

        let verb = verb.to_ascii_lowercase();
        let need = || {
            if arg.is_empty() {
                Err(CommandError::MissingArgument(verb.clone()))
            } else {
                Ok(arg.to_string())
            }
        };

        let command = match verb.as_str() {
            "class" => Command::ClassName {
                query: need()?,
                exact: false,
            },
            "class.exact" => Command::ClassName {
                query: need()?,
                exact: true,
            },
            "ns" | "namespace" => Command::Namespace {
                query: need()?,
                exact: false,
            },
            "ns.exact" => Command::Namespace {
                query: need()?,
                exact: true,
            },
            "fullname" | "full" => Command::FullName {
                query: need()?,
                exact: false,
            },
            "fullname.exact" => Command::FullName {
                query: need()?,
                exact: true,
            },
            "base" => Command::BaseClass(need()?),
            "impl" | "interface" => Command::Interface(need()?),
            "type" => Command::Kind(need()?.parse()?),
            "mono" | "monobehaviour" => Command::MonoBehaviours,
            "scriptable" | "scriptableobject" => Command::ScriptableObjects,
            "field" => Command::Field {
                query: need()?,
                exact: false,
            },
            "field.exact" => Command::Field {
                query: need()?,
                exact: true,
            },
            "field.type" => Command::FieldType(need()?),
            "field.offset" => Command::FieldOffset(need()?),
            "method" => Command::Method {
                query: need()?,
                exact: false,
            },
            "method.exact" => Command::Method {
                query: need()?,
                exact: true,
            },
            "method.ret" | "method.return" => Command::MethodReturn(need()?),
            "method.param" => Command::MethodParam(need()?),
            "rva" => Command::Rva(need()?),
            "method.offset" => Command::MethodOffset(need()?),
            "find" | "search" => Command::Find(need()?),
            "hierarchy" => Command::Hierarchy(need()?),
            "derived" => Command::Derived(need()?),
            "hasmeth" | "hasmethod" => parse_has_method(&need()?)?,
            "hasfield" => parse_has_field(&need()?),
            "detail" | "details" | "info" => Command::Detail(need()?),
            "idx" | "index" => Command::TypeDefIndex(parse_number(&need()?)?),
            "stats" => Command::Stats,
            "namespaces" => Command::Namespaces,
            "help" => Command::Help,
            _ => return Err(CommandError::Unknown(verb.clone())),
        };
        Ok(command)
    }
}

/// `Update ret:void params:0`: `key:value` words are predicates, the rest is
/// the method name.
fn parse_has_method(arg: &str) -> Result<Command, CommandError> {
    let mut name = Vec::new();
    let mut return_type = None;
    let mut param_count = None;
    for word in arg.split_whitespace() {
        if let Some(rt) = word.strip_prefix("ret:") {
            return_type = Some(rt.to_string());
        } else if let Some(n) = word.strip_prefix("params:") {
            param_count = Some(parse_number(n)?);
        } else {
            name.push(word);
        }
    }
    Ok(Command::HasMethod {
        name: name.join(" "),
        return_type,
        param_count,
    })
}

fn parse_has_field(arg: &str) -> Command {
    let mut name = Vec::new();
    let mut type_name = None;
    for word in arg.split_whitespace() {
        match word.strip_prefix("type:") {
            Some(t) => type_name = Some(t.to_string()),
            None => name.push(word),
        }
    }
    Command::HasField {
        name: name.join(" "),
        type_name,
    }
}

fn parse_number<T: FromStr>(s: &str) -> Result<T, CommandError> {
    s.trim()
        .parse()
        .map_err(|_| CommandError::InvalidNumber(s.to_string()))
}

/// What a command produced, borrowed from the index it ran against.
#[derive(Debug)]
pub enum Response<'a> {
    Classes {
        query: String,
        search_type: &'static str,
        classes: Vec<&'a ClassEntry>,
    },
    Fields {
        query: String,
        hits: Vec<FieldHit<'a>>,
    },
    Methods {
        query: String,
        hits: Vec<MethodHit<'a>>,
    },
    Chain {
        query: String,
        chain: Vec<String>,
    },
    Detail {
        query: String,
        class: &'a ClassEntry,
    },
    Find {
        query: String,
        classes: Vec<&'a ClassEntry>,
        methods: Vec<MethodHit<'a>>,
        fields: Vec<FieldHit<'a>>,
    },
    Stats(DumpStats),
    Namespaces(Vec<&'a str>),
    Message(String),
}

pub fn execute<'a>(index: &'a SearchIndex, command: &Command) -> Response<'a> {
    let classes = |query: &str, search_type, classes| Response::Classes {
        query: query.to_string(),
        search_type,
        classes,
    };
    let fields = |query: String, hits| Response::Fields { query, hits };
    let methods = |query: String, hits| Response::Methods { query, hits };

    match command {
        Command::ClassName { query, exact } => classes(
            query,
            if *exact { "class_name_exact" } else { "class_name" },
            index.by_class_name(query, *exact),
        ),
        Command::Namespace { query, exact } => {
            classes(query, "namespace", index.by_namespace(query, *exact))
        }
        Command::FullName { query, exact } => {
            classes(query, "full_name", index.by_full_name(query, *exact))
        }
        Command::BaseClass(query) => classes(query, "base_class", index.by_base_class(query)),
        Command::Interface(query) => classes(query, "interface", index.by_interface(query)),
        Command::Kind(kind) => classes(kind.keyword(), "class_type", index.by_kind(*kind)),
        Command::MonoBehaviours => classes("MonoBehaviour", "monobehaviour", index.mono_behaviours()),
        Command::ScriptableObjects => classes(
            "ScriptableObject",
            "scriptableobject",
            index.scriptable_objects(),
        ),
        Command::Field { query, exact } => {
            fields(query.clone(), index.search_fields(query, *exact))
        }
        Command::FieldType(query) => fields(format!("type:{query}"), index.fields_by_type(query)),
        Command::FieldOffset(query) => {
            fields(format!("offset:{query}"), index.fields_by_offset(query))
        }
        Command::Method { query, exact } => {
            methods(query.clone(), index.search_methods(query, *exact))
        }
        Command::MethodReturn(query) => methods(
            format!("return:{query}"),
            index.methods_by_return_type(query),
        ),
        Command::MethodParam(query) => methods(
            format!("param:{query}"),
            index.methods_by_parameter_type(query),
        ),
        Command::Rva(query) => methods(format!("rva:{query}"), index.methods_by_rva(query)),
        Command::MethodOffset(query) => {
            methods(format!("offset:{query}"), index.methods_by_offset(query))
        }
        Command::Find(query) => Response::Find {
            query: query.clone(),
            classes: index.by_class_name(query, false),
            methods: index.search_methods(query, false),
            fields: index.search_fields(query, false),
        },
        Command::Hierarchy(query) => Response::Chain {
            query: query.clone(),
            chain: index.inheritance_chain(query),
        },
        Command::Derived(query) => {
            classes(query, "derived_classes", index.derived_classes(query))
        }
        Command::HasMethod {
            name,
            return_type,
            param_count,
        } => classes(
            &format!("has_method:{name}"),
            "classes_with_method",
            index.classes_with_method(name, return_type.as_deref(), *param_count),
        ),
        Command::HasField { name, type_name } => classes(
            &format!("has_field:{name}"),
            "classes_with_field",
            index.classes_with_field(name, type_name.as_deref()),
        ),
        Command::Detail(name) => {
            let found = index
                .by_class_name(name, true)
                .into_iter()
                .next()
                .or_else(|| index.by_class_name(name, false).into_iter().next());
            match found {
                Some(class) => Response::Detail {
                    query: name.clone(),
                    class,
                },
                None => Response::Message(format!("Class '{name}' not found")),
            }
        }
        Command::TypeDefIndex(idx) => match index.by_type_def_index(*idx) {
            Some(class) => Response::Detail {
                query: idx.to_string(),
                class,
            },
            None => Response::Message(format!("TypeDefIndex {idx} not found")),
        },
        Command::Stats => Response::Stats(index.stats()),
        Command::Namespaces => Response::Namespaces(index.all_namespaces()),
        Command::Help => Response::Message(HELP.to_string()),
    }
}

/// Parses, executes and renders one input line.
pub fn run(
    index: &SearchIndex,
    input: &str,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<String> {
    let command: Command = input.parse()?;
    let response = execute(index, &command);
    render::render(&response, format, limit)
}
