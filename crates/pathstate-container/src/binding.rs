//! Headless form bindings.
//!
//! Each binding ties one input control to a state path: it reads the value to
//! display from a [`MethodTable`] and turns a change event into a `set`.
//! Rendering is left to the host. A binding without a path displays the
//! default value and never writes; its change handlers return `Ok(None)`.

use pathstate_types::{StatePath, Tree};
use serde_json::Number;

use crate::container::MethodTable;
use crate::error::ContainerResult;
use crate::serializer::Completion;

/// Outcome of a change handler: the pending `set`, if a path is bound.
pub type ChangeResult = ContainerResult<Option<Completion>>;

fn write(methods: &MethodTable, path: Option<&StatePath>, value: Tree) -> ChangeResult {
    match path {
        Some(path) => methods.set(path.clone(), value).map(Some),
        None => Ok(None),
    }
}

fn read(methods: &MethodTable, path: Option<&StatePath>) -> Option<Tree> {
    path.and_then(|p| methods.get(p.clone()))
}

/// Loose truthiness: `null`, `false`, `0`, and `""` are false.
fn truthy(value: Option<&Tree>) -> bool {
    match value {
        None | Some(Tree::Null) => false,
        Some(Tree::Bool(b)) => *b,
        Some(Tree::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Tree::String(s)) => !s.is_empty(),
        Some(Tree::Array(_)) | Some(Tree::Object(_)) => true,
    }
}

fn parse_number(text: &str) -> Option<Tree> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Tree::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Tree::Number)
}

/// The kind of a single-line input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Range,
    Checkbox,
}

/// A single-line input.
#[derive(Clone, Debug, Default)]
pub struct TextInput {
    pub path: Option<StatePath>,
    pub kind: InputKind,
}

impl TextInput {
    pub fn new(path: impl Into<StatePath>) -> Self {
        Self {
            path: Some(path.into()),
            kind: InputKind::Text,
        }
    }

    pub fn with_kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    /// The value to display; `""` (or `false` for checkboxes) when absent.
    pub fn value(&self, methods: &MethodTable) -> Tree {
        read(methods, self.path.as_ref()).unwrap_or_else(|| match self.kind {
            InputKind::Checkbox => Tree::Bool(false),
            _ => Tree::String(String::new()),
        })
    }

    /// Store the raw input text, converted according to the input kind.
    ///
    /// Numeric kinds store a number when the text parses and the raw text
    /// otherwise.
    pub fn on_change(&self, methods: &MethodTable, raw: &str) -> ChangeResult {
        let value = match self.kind {
            InputKind::Text => Tree::from(raw),
            InputKind::Number | InputKind::Range => {
                parse_number(raw).unwrap_or_else(|| Tree::from(raw))
            }
            InputKind::Checkbox => Tree::Bool(matches!(raw, "true" | "on" | "1")),
        };
        write(methods, self.path.as_ref(), value)
    }
}

/// A single checkbox.
#[derive(Clone, Debug, Default)]
pub struct Checkbox {
    pub path: Option<StatePath>,
}

impl Checkbox {
    pub fn new(path: impl Into<StatePath>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn checked(&self, methods: &MethodTable) -> bool {
        truthy(read(methods, self.path.as_ref()).as_ref())
    }

    pub fn on_change(&self, methods: &MethodTable, checked: bool) -> ChangeResult {
        write(methods, self.path.as_ref(), Tree::Bool(checked))
    }
}

/// One entry of a [`Checkboxes`] group.
#[derive(Clone, Debug)]
pub struct CheckboxItem {
    pub text: String,
    pub path: Option<StatePath>,
}

impl CheckboxItem {
    pub fn new(text: impl Into<String>, path: impl Into<StatePath>) -> Self {
        Self {
            text: text.into(),
            path: Some(path.into()),
        }
    }
}

/// A group of independent checkboxes, each bound to its own path.
#[derive(Clone, Debug, Default)]
pub struct Checkboxes {
    pub items: Vec<CheckboxItem>,
}

impl Checkboxes {
    pub fn new(items: Vec<CheckboxItem>) -> Self {
        Self { items }
    }

    fn item(&self, text: &str) -> Option<&CheckboxItem> {
        self.items.iter().find(|item| item.text == text)
    }

    /// Whether the item labelled `text` is checked; unknown labels are not.
    pub fn checked(&self, methods: &MethodTable, text: &str) -> bool {
        self.item(text)
            .is_some_and(|item| truthy(read(methods, item.path.as_ref()).as_ref()))
    }

    pub fn on_change(&self, methods: &MethodTable, text: &str, checked: bool) -> ChangeResult {
        let path = self.item(text).and_then(|item| item.path.as_ref());
        write(methods, path, Tree::Bool(checked))
    }
}

/// One choice of a [`RadioGroup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioOption {
    pub text: String,
    pub value: String,
}

impl RadioOption {
    /// An option whose value is its label.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: text.clone(),
            text,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// Mutually exclusive choices stored at one path.
#[derive(Clone, Debug, Default)]
pub struct RadioGroup {
    pub path: Option<StatePath>,
    pub options: Vec<RadioOption>,
}

impl RadioGroup {
    pub fn new(path: impl Into<StatePath>, options: Vec<RadioOption>) -> Self {
        Self {
            path: Some(path.into()),
            options,
        }
    }

    /// The option whose value equals the stored value.
    pub fn selected(&self, methods: &MethodTable) -> Option<&RadioOption> {
        let stored = read(methods, self.path.as_ref())?;
        self.options
            .iter()
            .find(|option| stored.as_str() == Some(option.value.as_str()))
    }

    pub fn is_selected(&self, methods: &MethodTable, value: &str) -> bool {
        self.selected(methods).is_some_and(|option| option.value == value)
    }

    pub fn on_change(&self, methods: &MethodTable, value: &str) -> ChangeResult {
        write(methods, self.path.as_ref(), Tree::from(value))
    }
}

/// A drop-down bound to a string value.
#[derive(Clone, Debug, Default)]
pub struct Select {
    pub path: Option<StatePath>,
}

impl Select {
    pub fn new(path: impl Into<StatePath>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn value(&self, methods: &MethodTable) -> Tree {
        read(methods, self.path.as_ref()).unwrap_or_else(|| Tree::String(String::new()))
    }

    pub fn on_change(&self, methods: &MethodTable, value: &str) -> ChangeResult {
        write(methods, self.path.as_ref(), Tree::from(value))
    }
}

/// A multi-line text input.
#[derive(Clone, Debug, Default)]
pub struct TextArea {
    pub path: Option<StatePath>,
}

impl TextArea {
    pub fn new(path: impl Into<StatePath>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn value(&self, methods: &MethodTable) -> Tree {
        read(methods, self.path.as_ref()).unwrap_or_else(|| Tree::String(String::new()))
    }

    pub fn on_change(&self, methods: &MethodTable, text: &str) -> ChangeResult {
        write(methods, self.path.as_ref(), Tree::from(text))
    }
}
