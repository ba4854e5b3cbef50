//! Structural equality and difference reports between networks.
//!
//! Two networks are equal when their header parameters match exactly and
//! every named element has a counterpart with the same kind, subtype,
//! fields and tables. File order and provenance are not compared. Values
//! compare exactly, as parsed.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use fmdat_core::{
    element::{Category, Element, ElementClass},
    field::Fields,
    value::Value,
};

use crate::network::Network;

/// The lookup group an element is compared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Category(Category),
    /// Unsupported elements, keyed by `"<name> (<KIND>)"`.
    Unsupported,
    /// Comments, rules and initial conditions, keyed by kind and occurrence.
    General,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Category(category) => write!(f, "{category}"),
            Group::Unsupported => f.write_str("unsupported"),
            Group::General => f.write_str("general"),
        }
    }
}

/// One difference between two networks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Difference {
    /// An element present only in the left network.
    OnlyInLeft { group: Group, name: String },
    /// An element present only in the right network.
    OnlyInRight { group: Group, name: String },
    /// An element present in both with a differing field, table cell or line.
    ///
    /// `field` is a path such as `weir_elevation`, `data[3].y` or
    /// `data.rows`.
    Changed {
        group: Group,
        name: String,
        field: String,
        left: Option<Value>,
        right: Option<Value>,
    },
    /// A differing header parameter.
    General {
        field: String,
        left: Option<Value>,
        right: Option<Value>,
    },
}

impl Difference {
    /// Swaps the sides of the difference.
    pub fn reversed(self) -> Self {
        match self {
            Difference::OnlyInLeft { group, name } => Difference::OnlyInRight { group, name },
            Difference::OnlyInRight { group, name } => Difference::OnlyInLeft { group, name },
            Difference::Changed {
                group,
                name,
                field,
                left,
                right,
            } => Difference::Changed {
                group,
                name,
                field,
                left: right,
                right: left,
            },
            Difference::General { field, left, right } => Difference::General {
                field,
                left: right,
                right: left,
            },
        }
    }

    /// The element name, or `None` for header differences.
    pub fn name(&self) -> Option<&str> {
        match self {
            Difference::OnlyInLeft { name, .. }
            | Difference::OnlyInRight { name, .. }
            | Difference::Changed { name, .. } => Some(name),
            Difference::General { .. } => None,
        }
    }
}

fn show(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<absent>".to_string(),
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::OnlyInLeft { group, name } => write!(f, "{group} `{name}`: only in left"),
            Difference::OnlyInRight { group, name } => write!(f, "{group} `{name}`: only in right"),
            Difference::Changed {
                group,
                name,
                field,
                left,
                right,
            } => write!(f, "{group} `{name}`: {field}: {} != {}", show(left), show(right)),
            Difference::General { field, left, right } => {
                write!(f, "general parameters: {field}: {} != {}", show(left), show(right))
            }
        }
    }
}

/// Returns `true` if the networks have the same content.
pub fn equal(left: &Network, right: &Network) -> bool {
    diff(left, right).is_empty()
}

/// Lists the differences between two networks.
///
/// Neither network is modified. `diff(b, a)` reports the same differences
/// as `diff(a, b)` with the sides swapped.
pub fn diff(left: &Network, right: &Network) -> Vec<Difference> {
    let mut out = Vec::new();
    diff_fields(left.header().fields(), right.header().fields(), "", &mut |field, l, r| {
        out.push(Difference::General { field, left: l, right: r });
    });
    diff_lines(left.header().extra_lines(), right.header().extra_lines(), "extra", &mut |field, l, r| {
        out.push(Difference::General { field, left: l, right: r });
    });

    let left_groups = grouped(left);
    let right_groups = grouped(right);
    for ((group, name), l) in &left_groups {
        match right_groups.get(&(*group, name.clone())) {
            Some(r) => diff_elements(*group, name, l, r, &mut out),
            None => out.push(Difference::OnlyInLeft {
                group: *group,
                name: name.clone(),
            }),
        }
    }
    for (group, name) in right_groups.keys() {
        if !left_groups.contains_key(&(*group, name.clone())) {
            out.push(Difference::OnlyInRight {
                group: *group,
                name: name.clone(),
            });
        }
    }
    out
}

/// Keys every element of a network by group and name.
fn grouped(network: &Network) -> IndexMap<(Group, String), &Element> {
    let mut out = IndexMap::new();
    for category in Category::ALL {
        for (name, element) in network.category(category) {
            out.insert((Group::Category(category), name.to_string()), element);
        }
    }
    for (key, element) in network.unsupported() {
        out.insert((Group::Unsupported, key.to_string()), element);
    }
    let mut seen: IndexMap<String, usize> = IndexMap::new();
    for element in network.elements() {
        let unnamed = element.category().is_some() && element.name().is_empty();
        let general = element.category().is_none() && element.class() != ElementClass::Unsupported;
        if !unnamed && !general {
            continue;
        }
        let key = element.kind().to_string();
        let count = seen.entry(key.clone()).or_default();
        *count += 1;
        out.insert((Group::General, format!("{key} #{count}")), element);
    }
    out
}

fn diff_elements(group: Group, name: &str, left: &Element, right: &Element, out: &mut Vec<Difference>) {
    let mut push = |field: String, l: Option<Value>, r: Option<Value>| {
        out.push(Difference::Changed {
            group,
            name: name.to_string(),
            field,
            left: l,
            right: r,
        });
    };

    let text = |s: String| Some(Value::Text(s));
    if left.kind() != right.kind() {
        push("kind".to_string(), text(left.kind().to_string()), text(right.kind().to_string()));
    }
    if left.subtype() != right.subtype() {
        push(
            "subtype".to_string(),
            left.subtype().map(|s| Value::Text(s.to_string())),
            right.subtype().map(|s| Value::Text(s.to_string())),
        );
    }
    if left.comment() != right.comment() {
        push("comment".to_string(), text(left.comment().to_string()), text(right.comment().to_string()));
    }
    diff_fields(left.fields(), right.fields(), "", &mut push);

    for (key, l) in left.tables() {
        let key = key.as_str();
        let Some(r) = right.table_named(key) else {
            push(format!("{key}.rows"), Some(Value::Int(l.len() as i64)), None);
            continue;
        };
        if l.len() != r.len() {
            push(format!("{key}.rows"), Some(Value::Int(l.len() as i64)), Some(Value::Int(r.len() as i64)));
        }
        for (index, (lrow, rrow)) in l.rows().iter().zip(r.rows()).enumerate() {
            let columns = l.columns().iter().map(|c| c.name().as_str());
            for (column, (lv, rv)) in columns.zip(lrow.iter().zip(rrow)) {
                if lv != rv {
                    push(format!("{key}[{index}].{column}"), Some(lv.clone()), Some(rv.clone()));
                }
            }
        }
    }
    for (key, r) in right.tables() {
        if left.table_named(key.as_str()).is_none() {
            push(format!("{key}.rows"), None, Some(Value::Int(r.len() as i64)));
        }
    }

    diff_lines(left.raw_lines(), right.raw_lines(), "raw", &mut push);
}

fn diff_fields(
    left: &Fields,
    right: &Fields,
    prefix: &str,
    push: &mut impl FnMut(String, Option<Value>, Option<Value>),
) {
    for (key, l) in left.iter() {
        let r = right.get(key.as_str());
        if r != Some(l) {
            push(format!("{prefix}{key}"), Some(l.clone()), r.cloned());
        }
    }
    for (key, r) in right.iter() {
        if !left.contains(key.as_str()) {
            push(format!("{prefix}{key}"), None, Some(r.clone()));
        }
    }
}

fn diff_lines(
    left: &[String],
    right: &[String],
    prefix: &str,
    push: &mut impl FnMut(String, Option<Value>, Option<Value>),
) {
    for index in 0..left.len().max(right.len()) {
        let l = left.get(index);
        let r = right.get(index);
        if l != r {
            push(
                format!("{prefix}[{index}]"),
                l.map(|line| Value::Text(line.clone())),
                r.map(|line| Value::Text(line.clone())),
            );
        }
    }
}

impl PartialEq for Network {
    /// Content equality, see [`equal`].
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}
