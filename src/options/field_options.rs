use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    options::{OptionGroup, OptionItem, RelationshipOption},
    selection::{FieldDescriptor, SelectionState},
};

/// Options for a field list, labelled `"<label> (<name>)"` and sorted by
/// label with digit runs compared numerically. With a `prefix` the values
/// become dotted paths (`Owner.Name`).
pub fn build_field_options(fields: &[FieldDescriptor], prefix: Option<&str>) -> Vec<OptionItem> {
    let mut options: Vec<OptionItem> = fields
        .iter()
        .filter(|f| !f.name.is_empty())
        .map(|f| {
            let value = match prefix {
                Some(rel) if !rel.is_empty() => format!("{rel}.{}", f.name),
                _ => f.name.clone(),
            };
            OptionItem { label: format!("{} ({})", f.display_label(), f.name), value }
        })
        .collect();

    options.sort_by(|a, b| natural_cmp(&a.label, &b.label));
    options
}

/// Child relationship field options, labelled `"<name> (<type>)"`.
pub fn child_field_options(fields: &[FieldDescriptor]) -> Vec<OptionItem> {
    fields
        .iter()
        .map(|f| OptionItem { label: format!("{} ({})", f.name, f.field_type), value: f.name.clone() })
        .collect()
}

/// What the shell needs to render one child relationship picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildFieldConfig {
    pub relationship: String,
    pub options: Vec<OptionItem>,
    pub selected: Vec<String>,
}

impl ChildFieldConfig {
    /// Nothing selected yet means `Id`.
    pub fn new(relationship: &str, fields: &[FieldDescriptor], selected: &[String]) -> Self {
        Self {
            relationship: relationship.to_string(),
            options: child_field_options(fields),
            selected: if selected.is_empty() { vec!["Id".to_string()] } else { selected.to_vec() },
        }
    }
}

/// Expandable lookup for a field that carries a relationship name.
pub fn relationship_option(field: &FieldDescriptor) -> Option<RelationshipOption> {
    let relationship = field.relationship_name.as_deref().filter(|r| !r.is_empty())?;
    Some(RelationshipOption {
        label: format!("{} ({})", field.display_label(), field.name),
        value: relationship.to_string(),
        reference_to: field.reference_to.clone().unwrap_or_default(),
    })
}

/// Object a selected lookup relationship points at.
pub fn resolve_parent_object<'a>(options: &'a [RelationshipOption], relationship: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|opt| opt.value == relationship)
        .map(|opt| opt.reference_to.as_str())
        .filter(|object| !object.is_empty())
}

/// Fields offered in the WHERE builder, grouped by origin.
///
/// With `show_all` every known field is offered; otherwise only the ones
/// already selected. Parent groups come from `parent_field_options` (keyed by
/// relationship) or from the selected parent paths.
pub fn where_field_groups(
    state: &SelectionState,
    main_field_options: &[OptionItem],
    parent_field_options: &IndexMap<String, Vec<OptionItem>>,
    show_all: bool,
) -> Vec<OptionGroup> {
    let mut groups = vec![];

    let main: Vec<OptionItem> = if show_all {
        main_field_options.to_vec()
    } else {
        state
            .main_fields
            .iter()
            .map(|name| {
                main_field_options
                    .iter()
                    .find(|opt| &opt.value == name)
                    .cloned()
                    .unwrap_or_else(|| OptionItem::same(name))
            })
            .collect()
    };
    let main: Vec<OptionItem> = main
        .into_iter()
        .map(|opt| OptionItem { label: format!("{} ({})", opt.label, opt.value), value: opt.value })
        .collect();
    if !main.is_empty() {
        groups.push(OptionGroup { label: "Main Object Fields".to_string(), options: main });
    }

    if show_all {
        for (relationship, fields) in parent_field_options {
            let options: Vec<OptionItem> = fields
                .iter()
                .map(|opt| OptionItem { label: format!("{} ({})", opt.label, opt.value), value: opt.value.clone() })
                .collect();
            push_parent_group(&mut groups, relationship, options);
        }
    } else {
        for relationship in state.parent_relationships() {
            let prefix = format!("{relationship}.");
            let options: Vec<OptionItem> = state
                .parent_field_paths
                .iter()
                .filter(|path| path.starts_with(&prefix))
                .map(|path| {
                    let leaf = path.rsplit('.').next().unwrap_or(path);
                    OptionItem { label: format!("{leaf} ({path})"), value: path.clone() }
                })
                .collect();
            push_parent_group(&mut groups, relationship, options);
        }
    }

    groups
}

fn push_parent_group(groups: &mut Vec<OptionGroup>, relationship: &str, options: Vec<OptionItem>) {
    if !options.is_empty() {
        groups.push(OptionGroup { label: format!("{relationship} (Parent)"), options });
    }
}

/// Groups collapsed into one list, each label prefixed with its group.
pub fn flat_where_field_options(groups: &[OptionGroup]) -> Vec<OptionItem> {
    groups
        .iter()
        .flat_map(|group| {
            group.options.iter().map(move |opt| OptionItem {
                label: format!("{} \u{2014} {}", group.label, opt.label),
                value: opt.value.clone(),
            })
        })
        .collect()
}

/// Case-insensitive comparison where runs of digits compare by value,
/// so `Field 2` sorts before `Field 10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let ord = ln.len().cmp(&rn.len()).then_with(|| ln.cmp(&rn));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Consume a digit run, dropping leading zeros.
fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    let trimmed = digits.trim_start_matches('0');
    trimmed.to_string()
}
