//! The in-memory network model.
//!
//! A [`Network`] owns its elements in file order. That order is the reach
//! connectivity: adjacent sections, conduits and structures are
//! hydraulically adjacent. Named lookup goes through per-category indices
//! that every edit operation keeps in step with the order.
//!
//! Elements are addressed by [`ElementId`]. Ids are never reused, so an id
//! held across edits either still names the same element or is reported as
//! not found.

use std::{
    collections::HashSet,
    ops::Deref,
    sync::{Arc, LazyLock},
};

use indexmap::{IndexMap, map::Entry};
use log::{debug, info, trace, warn};

use fmdat_core::{
    element::{Category, Element, ElementClass},
    field::FieldError,
    fixed::{self, Justify},
    general::GeneralParameters,
    table::Table,
    value::Value,
};
use fmdat_parser::{
    ParseOptions, Registry,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    header,
    variants::general::CONDITIONS_LABEL,
};

use crate::{
    FmdatError,
    config::{LineEnding, WriteConfig},
};

static DEFAULT_REGISTRY: LazyLock<Arc<Registry>> =
    LazyLock::new(|| Arc::new(Registry::with_defaults()));

/// Returns the shared registry of built-in unit variants.
pub fn default_registry() -> Arc<Registry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

const GISINFO: &str = "GISINFO";

/// Stable handle to an element of a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Where to place inserted elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Immediately before an existing element.
    Before(ElementId),
    /// Immediately after an existing element.
    After(ElementId),
    /// At an absolute index in file order; `len()` appends.
    At(usize),
    /// After the last element.
    End,
}

/// How an element is reachable by name.
enum IndexKey {
    Category(Category, String),
    Unsupported(String),
    Unindexed,
}

fn index_key(element: &Element) -> IndexKey {
    match element.category() {
        Some(category) if !element.name().is_empty() => {
            IndexKey::Category(category, element.name().to_string())
        }
        Some(_) => IndexKey::Unindexed,
        None if element.class() == ElementClass::Unsupported => {
            IndexKey::Unsupported(unsupported_key(element))
        }
        None => IndexKey::Unindexed,
    }
}

/// Key of an unsupported element: `"<name> (<KIND>)"`.
pub fn unsupported_key(element: &Element) -> String {
    format!("{} ({})", element.name(), element.kind())
}

/// Mutable access to an element that cannot change its name.
///
/// Renaming goes through [`Network::rename`] so that the name indices stay
/// consistent.
#[derive(Debug)]
pub struct ElementMut<'a> {
    element: &'a mut Element,
}

impl Deref for ElementMut<'_> {
    type Target = Element;

    fn deref(&self) -> &Element {
        self.element
    }
}

impl ElementMut<'_> {
    /// Updates a declared field.
    ///
    /// # Errors
    ///
    /// Fails for undeclared fields and incompatible value kinds.
    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.element.set_field(key, value)
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.element.set_comment(comment);
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        self.element.table_mut()
    }

    pub fn table_named_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.element.table_named_mut(name)
    }

    /// Replaces the verbatim lines of the element.
    pub fn set_raw_lines(&mut self, raw: Vec<String>) {
        self.element.set_raw_lines(raw);
    }
}

/// One parsed network file: header parameters and elements in file order.
#[derive(Debug, Clone)]
pub struct Network {
    header: GeneralParameters,
    slots: Vec<Option<Element>>,
    order: Vec<ElementId>,
    by_category: IndexMap<Category, IndexMap<String, ElementId>>,
    unsupported: IndexMap<String, ElementId>,
    registry: Arc<Registry>,
    detected_ending: &'static str,
    write_config: WriteConfig,
    warnings: Vec<Diagnostic>,
    gxy: Option<String>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Creates a blank network: default header parameters and an empty
    /// initial conditions block.
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// Creates a blank network that uses `registry` for its elements.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        let mut network = Self::empty(header::blank(), registry);
        if let Some(conditions) = network.registry.create("INITIAL CONDITIONS", None, "") {
            let id = network.allocate(conditions);
            network.order.push(id);
        }
        network
    }

    fn empty(header: GeneralParameters, registry: Arc<Registry>) -> Self {
        Self {
            header,
            slots: Vec::new(),
            order: Vec::new(),
            by_category: Category::ALL
                .into_iter()
                .map(|category| (category, IndexMap::new()))
                .collect(),
            unsupported: IndexMap::new(),
            registry,
            detected_ending: "\n",
            write_config: WriteConfig::default(),
            warnings: Vec::new(),
            gxy: None,
        }
    }

    /// Parses network text with the built-in variants and default options.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Parse`] for structural errors in the file,
    /// including duplicate names within a category.
    pub fn parse(source: &str) -> Result<Self, FmdatError> {
        Self::parse_with(source, default_registry(), &ParseOptions::default())
    }

    /// Parses network text with a custom registry and options.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::Parse`] with every fatal diagnostic found.
    pub fn parse_with(
        source: &str,
        registry: Arc<Registry>,
        options: &ParseOptions,
    ) -> Result<Self, FmdatError> {
        info!(bytes = source.len(); "Parsing network");
        let file = fmdat_parser::parse(source, &registry, options)
            .map_err(|err| FmdatError::new_parse_error(err, source))?;

        let mut network = Self::empty(file.header, registry);
        network.detected_ending = detect_ending(source);
        network.warnings = file.warnings;

        info!(elements = file.elements.len(); "Assembling network");
        let mut diagnostics = DiagnosticCollector::new();
        for element in file.elements {
            network.assemble(element, &mut diagnostics);
        }
        let warnings = diagnostics
            .finish()
            .map_err(|err| FmdatError::new_parse_error(err, source))?;
        network.warnings.extend(warnings);

        debug!(
            sections = network.by_category[&Category::Sections].len(),
            structures = network.by_category[&Category::Structures].len(),
            unsupported = network.unsupported.len();
            "Network assembled"
        );
        Ok(network)
    }

    /// Adds a parsed element at the end, reporting duplicate names.
    fn assemble(&mut self, element: Element, diagnostics: &mut DiagnosticCollector) {
        let key = index_key(&element);
        let span = element.origin().map(|origin| origin.span()).unwrap_or_default();
        let kind = element.kind();
        let id = self.allocate(element);
        self.order.push(id);

        match key {
            IndexKey::Category(category, name) => {
                let first = match self.by_category.entry(category).or_default().entry(name.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        entry.insert(id);
                        return;
                    }
                };
                let first_span = self
                    .element(first)
                    .and_then(Element::origin)
                    .map(|origin| origin.span())
                    .unwrap_or_default();
                diagnostics.emit(
                    Diagnostic::error(format!(
                        "block #{} ({kind}): duplicate name `{name}` in {category}",
                        self.order.len() - 1
                    ))
                    .with_code(ErrorCode::E300)
                    .with_label(span, "duplicate definition")
                    .with_secondary_label(first_span, "first defined here")
                    .with_help("rename one of the units"),
                );
            }
            IndexKey::Unsupported(key) => {
                if self.unsupported.contains_key(&key) {
                    warn!(key; "Duplicate unsupported unit, only the first is indexed");
                    diagnostics.emit(
                        Diagnostic::warning(format!("duplicate unsupported unit `{key}`"))
                            .with_code(ErrorCode::E301)
                            .with_label(span, "not reachable by name"),
                    );
                } else {
                    self.unsupported.insert(key, id);
                }
            }
            IndexKey::Unindexed => {}
        }
    }

    fn allocate(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.slots.len());
        self.slots.push(Some(element));
        id
    }

    /// Sets how edited and new blocks are written.
    pub fn with_write_config(mut self, config: WriteConfig) -> Self {
        self.write_config = config;
        self
    }

    pub fn set_write_config(&mut self, config: WriteConfig) {
        self.write_config = config;
    }

    pub fn write_config(&self) -> WriteConfig {
        self.write_config
    }

    /// The line ending used for re-rendered lines.
    pub fn line_ending(&self) -> &'static str {
        match self.write_config.line_ending {
            LineEnding::Auto => self.detected_ending,
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Attaches the text of the companion `.gxy` file, whose node keys
    /// follow renames.
    pub fn with_gxy(mut self, gxy: impl Into<String>) -> Self {
        self.gxy = Some(gxy.into());
        self
    }

    /// The companion `.gxy` text, if one was attached.
    pub fn gxy(&self) -> Option<&str> {
        self.gxy.as_deref()
    }

    pub fn header(&self) -> &GeneralParameters {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut GeneralParameters {
        &mut self.header
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Non-fatal diagnostics from parsing.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<ElementMut<'_>> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|element| ElementMut { element })
    }

    /// Index of an element in file order.
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    /// Iterates the elements in file order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.order
            .iter()
            .filter_map(|id| self.element(*id).map(|element| (*id, element)))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.iter().map(|(_, element)| element)
    }

    /// Looks up an element id by category and name.
    pub fn find(&self, category: Category, name: &str) -> Option<ElementId> {
        self.by_category
            .get(&category)
            .and_then(|names| names.get(name))
            .copied()
    }

    /// Looks up an element by category and name.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] if no element has that name.
    pub fn get(&self, category: Category, name: &str) -> Result<&Element, FmdatError> {
        self.find(category, name)
            .and_then(|id| self.element(id))
            .ok_or_else(|| FmdatError::NotFound(format!("{category} `{name}`")))
    }

    /// Mutable lookup by category and name.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] if no element has that name.
    pub fn get_mut(&mut self, category: Category, name: &str) -> Result<ElementMut<'_>, FmdatError> {
        let id = self
            .find(category, name)
            .ok_or_else(|| FmdatError::NotFound(format!("{category} `{name}`")))?;
        self.element_mut(id)
            .ok_or_else(|| FmdatError::NotFound(format!("{category} `{name}`")))
    }

    /// Named view of one category, in insertion order.
    pub fn category(&self, category: Category) -> impl Iterator<Item = (&str, &Element)> {
        self.by_category
            .get(&category)
            .into_iter()
            .flat_map(|names| names.iter())
            .filter_map(|(name, id)| self.element(*id).map(|element| (name.as_str(), element)))
    }

    /// Unsupported elements keyed by `"<name> (<KIND>)"`.
    pub fn unsupported(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.unsupported
            .iter()
            .filter_map(|(key, id)| self.element(*id).map(|element| (key.as_str(), element)))
    }

    /// Looks up an unsupported element by its `"<name> (<KIND>)"` key.
    pub fn get_unsupported(&self, key: &str) -> Option<&Element> {
        self.unsupported.get(key).and_then(|id| self.element(*id))
    }

    /// Elements of one class in file order.
    ///
    /// Reaches the typed classes outside the named categories, such as
    /// junctions and reservoirs.
    pub fn by_class(&self, class: ElementClass) -> impl Iterator<Item = (ElementId, &Element)> {
        self.iter().filter(move |(_, element)| element.class() == class)
    }

    /// The initial conditions block, if present.
    pub fn conditions(&self) -> Option<&Element> {
        self.elements()
            .find(|element| element.class() == ElementClass::Conditions)
    }

    /// Creates a blank element of a registered kind, using the network's
    /// registry. The element is not inserted.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] for unregistered kinds.
    pub fn create(&self, kind: &str, subtype: Option<&str>, name: &str) -> Result<Element, FmdatError> {
        self.registry.create(kind, subtype, name).ok_or_else(|| {
            FmdatError::NotFound(match subtype {
                Some(subtype) => format!("unit variant `{kind} {subtype}`"),
                None => format!("unit variant `{kind}`"),
            })
        })
    }

    fn describe(&self, id: ElementId) -> String {
        match self.element(id) {
            Some(element) if element.name().is_empty() => format!("{} element", element.kind()),
            Some(element) => format!("{} `{}`", element.kind(), element.name()),
            None => format!("element #{}", id.0),
        }
    }

    fn resolve_position(&self, position: Position) -> Result<usize, FmdatError> {
        match position {
            Position::Before(id) => self
                .position(id)
                .ok_or_else(|| FmdatError::NotFound(self.describe(id))),
            Position::After(id) => self
                .position(id)
                .map(|index| index + 1)
                .ok_or_else(|| FmdatError::NotFound(self.describe(id))),
            Position::At(index) if index <= self.order.len() => Ok(index),
            Position::At(index) => Err(FmdatError::InvalidPosition(format!(
                "index {index} is past the end ({} elements)",
                self.order.len()
            ))),
            Position::End => Ok(self.order.len()),
        }
    }

    /// Inserts one element.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NameCollision`] if the name is taken in the
    /// element's category, and [`FmdatError::NotFound`] or
    /// [`FmdatError::InvalidPosition`] for a bad position.
    pub fn insert(&mut self, element: Element, position: Position) -> Result<ElementId, FmdatError> {
        self.insert_many(vec![element], position)?
            .into_iter()
            .next()
            .ok_or_else(|| FmdatError::InvalidPosition("nothing inserted".to_string()))
    }

    /// Inserts several elements as one splice, keeping their order.
    ///
    /// Names are checked against the network and against the rest of the
    /// batch before anything is inserted.
    ///
    /// # Errors
    ///
    /// Same as [`Network::insert`]; on error nothing is inserted.
    pub fn insert_many(
        &mut self,
        elements: Vec<Element>,
        position: Position,
    ) -> Result<Vec<ElementId>, FmdatError> {
        let index = self.resolve_position(position)?;
        self.check_batch_names(&elements)?;

        let count = elements.len();
        let mut ids = Vec::with_capacity(count);
        for element in elements {
            let key = index_key(&element);
            let id = self.allocate(element);
            match key {
                IndexKey::Category(category, name) => {
                    self.by_category.entry(category).or_default().insert(name, id);
                }
                IndexKey::Unsupported(key) => {
                    if self.unsupported.contains_key(&key) {
                        warn!(key; "Duplicate unsupported unit, only the first is indexed");
                    } else {
                        self.unsupported.insert(key, id);
                    }
                }
                IndexKey::Unindexed => {}
            }
            ids.push(id);
        }
        self.order.splice(index..index, ids.iter().copied());

        info!(count, index; "Inserted elements");
        Ok(ids)
    }

    fn check_batch_names(&self, elements: &[Element]) -> Result<(), FmdatError> {
        let mut batch: HashSet<(Category, &str)> = HashSet::new();
        for element in elements {
            if let IndexKey::Category(category, _) = index_key(element) {
                let name = element.name();
                if self.find(category, name).is_some() || !batch.insert((category, name)) {
                    return Err(FmdatError::NameCollision {
                        category,
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Removes an element and returns it.
    ///
    /// Hydraulic connectivity implied by neighbouring elements (such as
    /// distances to the next section) is not repaired.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] if the element is not in the network.
    pub fn remove(&mut self, id: ElementId) -> Result<Element, FmdatError> {
        let index = self
            .position(id)
            .ok_or_else(|| FmdatError::NotFound(self.describe(id)))?;
        let element = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| FmdatError::NotFound(format!("element #{}", id.0)))?;
        self.order.remove(index);

        match index_key(&element) {
            IndexKey::Category(category, name) => {
                if let Some(names) = self.by_category.get_mut(&category) {
                    if names.get(&name) == Some(&id) {
                        names.shift_remove(&name);
                    }
                }
            }
            IndexKey::Unsupported(key) => {
                if self.unsupported.get(&key) == Some(&id) {
                    self.unsupported.shift_remove(&key);
                    self.reindex_unsupported(&key);
                }
            }
            IndexKey::Unindexed => {}
        }

        info!(kind = element.kind().to_string(), name = element.name(), index; "Removed element");
        Ok(element)
    }

    /// Makes the next unsupported element sharing `key` reachable.
    fn reindex_unsupported(&mut self, key: &str) {
        let next = self.iter().find_map(|(id, element)| {
            (element.class() == ElementClass::Unsupported && unsupported_key(element) == key)
                .then_some(id)
        });
        if let Some(id) = next {
            debug!(key; "Reindexed unsupported unit");
            self.unsupported.insert(key.to_string(), id);
        }
    }

    /// Renames an element, keeping the name indices consistent.
    ///
    /// Renaming a section, conduit or structure also renames its label in
    /// the initial conditions table. Matching entries of a `GISINFO` block
    /// and of the attached `.gxy` text are rewritten for every element in a
    /// category.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NameCollision`] if the name is taken in the
    /// element's category, and [`FmdatError::InvalidName`] if it does not
    /// fit the label column.
    pub fn rename(&mut self, id: ElementId, new_name: &str) -> Result<(), FmdatError> {
        let label_length = self.header.label_length();
        let element = self
            .element(id)
            .ok_or_else(|| FmdatError::NotFound(self.describe(id)))?;
        let old_name = element.name().to_string();
        if old_name == new_name {
            return Ok(());
        }
        if new_name.is_empty()
            || new_name.chars().count() > label_length
            || new_name.chars().any(char::is_whitespace)
        {
            return Err(FmdatError::InvalidName(new_name.to_string()));
        }
        let class = element.class();
        let category = element.category();
        if let Some(category) = category {
            if self.find(category, new_name).is_some() {
                return Err(FmdatError::NameCollision {
                    category,
                    name: new_name.to_string(),
                });
            }
        }
        let prefix = match element.subtype() {
            Some(subtype) => format!("{} {subtype}", element.kind()),
            None => element.kind().to_string(),
        };
        let gxy_prefix = format!(
            "{}_{}_",
            element.kind(),
            element.subtype().map(|s| s.to_string()).unwrap_or_default()
        );
        let old_key = index_key(element);

        // The only step that can fail runs first and is atomic.
        if class.is_reach() {
            self.rename_conditions_label(&old_name, new_name)?;
        }

        if let Some(element) = self.slots.get_mut(id.0).and_then(Option::as_mut) {
            if class == ElementClass::Unsupported {
                rename_raw(element, new_name, label_length);
            }
            element.set_name(new_name);
        }

        match old_key {
            IndexKey::Category(category, name) => {
                if let Some(names) = self.by_category.get_mut(&category) {
                    names.shift_remove(&name);
                    names.insert(new_name.to_string(), id);
                }
            }
            IndexKey::Unindexed => {
                if let Some(category) = category {
                    self.by_category
                        .entry(category)
                        .or_default()
                        .insert(new_name.to_string(), id);
                }
            }
            IndexKey::Unsupported(key) => {
                if self.unsupported.get(&key) == Some(&id) {
                    self.unsupported.shift_remove(&key);
                    self.reindex_unsupported(&key);
                }
                let new_key = self.element(id).map(unsupported_key).unwrap_or_default();
                self.unsupported.entry(new_key).or_insert(id);
            }
        }

        if category.is_some() {
            self.rename_gisinfo(&prefix, &old_name, new_name, class.is_reach());
            self.rename_gxy(&gxy_prefix, &old_name, new_name);
        }

        info!(from = old_name, to = new_name; "Renamed element");
        Ok(())
    }

    /// Renames matching labels of the initial conditions table. On error
    /// the table is unchanged.
    fn rename_conditions_label(&mut self, old_name: &str, new_name: &str) -> Result<(), FmdatError> {
        let Some(id) = self.iter().find_map(|(id, element)| {
            (element.class() == ElementClass::Conditions).then_some(id)
        }) else {
            return Ok(());
        };
        let Some(mut conditions) = self.element_mut(id) else {
            return Ok(());
        };
        let Some(table) = conditions.table_mut() else {
            return Ok(());
        };
        let rows = table.replace_all(CONDITIONS_LABEL, &Value::from(old_name), Value::from(new_name))?;
        trace!(rows = rows.len(); "Renamed initial conditions labels");
        Ok(())
    }

    /// Rewrites `<KIND>_<SUBTYPE>_<name>` node keys in the companion `.gxy`
    /// text. A key only matches when it is not followed by more label
    /// characters.
    fn rename_gxy(&mut self, prefix: &str, old_name: &str, new_name: &str) {
        let Some(gxy) = self.gxy.as_mut() else {
            return;
        };
        let old = format!("{prefix}{old_name}");
        let new = format!("{prefix}{new_name}");
        let mut out = String::with_capacity(gxy.len());
        let mut rest = gxy.as_str();
        let mut count = 0;
        while let Some(at) = rest.find(&old) {
            let after = &rest[at + old.len()..];
            let bounded = after
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace() || matches!(c, ']' | '=' | ','));
            out.push_str(&rest[..at]);
            out.push_str(if bounded { &new } else { &old });
            count += usize::from(bounded);
            rest = after;
        }
        out.push_str(rest);
        if count > 0 {
            debug!(from = old_name, to = new_name, count; "Updated .gxy labels");
            *gxy = out;
        }
    }

    fn rename_gisinfo(&mut self, prefix: &str, old_name: &str, new_name: &str, node_labels: bool) {
        let unit_old = format!("{prefix} {old_name} ");
        let unit_new = format!("{prefix} {new_name} ");
        let node_old = format!("{old_name} ");
        let node_new = format!("{new_name} ");

        let targets: Vec<ElementId> = self
            .iter()
            .filter(|(_, element)| element.kind() == GISINFO)
            .map(|(id, _)| id)
            .collect();
        for id in targets {
            let Some(mut gisinfo) = self.element_mut(id) else {
                continue;
            };
            let mut changed = false;
            let lines: Vec<String> = gisinfo
                .raw_lines()
                .iter()
                .map(|line| {
                    if line.starts_with(&unit_old) {
                        changed = true;
                        line.replacen(&unit_old, &unit_new, 1)
                    } else if node_labels && line.starts_with(&node_old) {
                        changed = true;
                        line.replacen(&node_old, &node_new, 1)
                    } else {
                        line.clone()
                    }
                })
                .collect();
            if changed {
                gisinfo.set_raw_lines(lines);
                debug!(from = old_name, to = new_name; "Updated GISINFO labels");
            }
        }
    }

    fn is_reach(&self, id: ElementId) -> bool {
        self.element(id)
            .is_some_and(|element| element.class().is_reach())
    }

    /// The next section, conduit or structure after `id` in file order.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] at the end of the reach or if `id`
    /// is not in the network.
    pub fn next(&self, id: ElementId) -> Result<ElementId, FmdatError> {
        let index = self
            .position(id)
            .ok_or_else(|| FmdatError::NotFound(self.describe(id)))?;
        self.order[index + 1..]
            .iter()
            .copied()
            .find(|other| self.is_reach(*other))
            .ok_or_else(|| FmdatError::NotFound(format!("reach element after {}", self.describe(id))))
    }

    /// The previous section, conduit or structure before `id` in file order.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] at the start of the reach or if `id`
    /// is not in the network.
    pub fn prev(&self, id: ElementId) -> Result<ElementId, FmdatError> {
        let index = self
            .position(id)
            .ok_or_else(|| FmdatError::NotFound(self.describe(id)))?;
        self.order[..index]
            .iter()
            .rev()
            .copied()
            .find(|other| self.is_reach(*other))
            .ok_or_else(|| FmdatError::NotFound(format!("reach element before {}", self.describe(id))))
    }

    /// Follows the hydraulic connection out of an element.
    ///
    /// A downstream label (`ds_label`) names the connected unit directly.
    /// Otherwise a positive distance to the next section leads to the next
    /// reach element, and a zero distance to another unit sharing the same
    /// label.
    ///
    /// # Errors
    ///
    /// Returns [`FmdatError::NotFound`] if there is no connected unit.
    pub fn downstream(&self, id: ElementId) -> Result<ElementId, FmdatError> {
        let element = self
            .element(id)
            .ok_or_else(|| FmdatError::NotFound(self.describe(id)))?;
        if let Some(label) = element.label("ds_label") {
            return self.labelled(label, id);
        }
        match element.field("dist_to_next").and_then(Value::as_f64) {
            Some(distance) if distance > 0.0 => self.next(id),
            Some(_) => self.labelled(element.name(), id),
            None => Err(FmdatError::NotFound(format!(
                "downstream connection of {}",
                self.describe(id)
            ))),
        }
    }

    /// Finds the first typed element named `label` after `from`, wrapping
    /// around to the start.
    fn labelled(&self, label: &str, from: ElementId) -> Result<ElementId, FmdatError> {
        let index = self.position(from).unwrap_or_default();
        let (before, after) = self.order.split_at(index.min(self.order.len()));
        after
            .iter()
            .skip(1)
            .chain(before)
            .copied()
            .find(|other| {
                self.element(*other).is_some_and(|element| {
                    element.category().is_some() && element.name() == label
                })
            })
            .ok_or_else(|| FmdatError::NotFound(format!("unit labelled `{label}`")))
    }

    /// Serializes the network to text.
    ///
    /// Unchanged header and elements are written exactly as read, so a
    /// network that has not been edited writes back its source text.
    pub fn write(&self) -> String {
        let ending = self.line_ending();
        let label_length = self.header.label_length();

        let mut out = header::render(&self.header, ending);
        let mut last_rendered = self.header.pristine_lines().is_none();
        for element in self.elements() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push_str(ending);
            }
            out.push_str(&self.registry.render(element, label_length, ending));
            last_rendered = element.is_modified();
        }
        if last_rendered && !self.write_config.final_newline {
            if let Some(trimmed) = out.strip_suffix(ending) {
                out.truncate(trimmed.len());
            }
        }
        info!(bytes = out.len(); "Network written");
        out
    }
}

/// Replaces the name column of an unsupported element's raw lines.
fn rename_raw(element: &mut Element, new_name: &str, label_length: usize) {
    let line = if element.subtype().is_some() { 2 } else { 1 };
    let mut raw = element.raw_lines().to_vec();
    if let Some(text) = raw.get_mut(line) {
        let renamed = format!(
            "{}{}",
            fixed::fit(new_name, label_length, Justify::Left),
            fixed::rest(text, label_length)
        );
        *text = renamed.trim_end().to_string();
        element.set_raw_lines(raw);
    }
}

fn detect_ending(source: &str) -> &'static str {
    match source.find('\n') {
        Some(index) if source[..index].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "Model\n#REVISION#1\n         3     0.750     0.900     0.100     0.001        12SI\n    10.000     0.010     0.010     0.700     0.100     0.700     0.000\nRAD FILE\n\nEND GENERAL\nQTBDY\nUP\n         1     0.000     0.000     HOURS    EXTEND    LINEAR     0.000     0.000  OVERRIDE\n    10.000     0.000\nRIVER upstream\nSECTION\nS3\n   150.000            0.000100  1000.000\n         1\n     0.000    12.000     0.035     1.000               0.000     0.000                   0\nWEIR\nS4          S5\n     1.500\n     1.000     1.000     5.000    21.000     0.700\nRIVER downstream\nSECTION\nS5\n     0.000            0.000100  1000.000\n         1\n     0.000    11.000     0.035     1.000               0.000     0.000                   0\nINITIAL CONDITIONS\n label   ?      flow     stage froude no  velocity     umode    ustate         z\nS3           y     1.000    10.500     0.000     0.000     0.000     0.000     0.000\nS4           y     1.000    10.400     0.000     0.000     0.000     0.000     0.000\nGISINFO\nRIVER SECTION S3 0 0 0 0\nS3 100 200\n";

    fn network() -> Network {
        Network::parse(SOURCE).unwrap()
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(network().write(), SOURCE);
    }

    #[test]
    fn test_lookup_by_category() {
        let network = network();

        assert_eq!(network.get(Category::Structures, "S4").unwrap().kind(), "WEIR");
        assert!(network.get(Category::Sections, "S4").is_err());
        assert_eq!(network.category(Category::Sections).count(), 2);
        assert!(network.conditions().is_some());
    }

    #[test]
    fn test_duplicate_name_is_fatal() {
        let source = SOURCE.replace("SECTION\nS5\n", "SECTION\nS3\n");

        let err = Network::parse(&source).unwrap_err();

        match err {
            FmdatError::Parse { err, .. } => {
                assert_eq!(err.diagnostics().len(), 1);
                assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E300));
                assert!(err.diagnostics()[0].message().contains("block #3 (RIVER)"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_rename_propagates() {
        let mut network = network();
        let id = network.find(Category::Sections, "S3").unwrap();

        network.rename(id, "S3A").unwrap();

        assert!(network.get(Category::Sections, "S3").is_err());
        assert_eq!(network.get(Category::Sections, "S3A").unwrap().name(), "S3A");
        let labels = network.conditions().unwrap().table().unwrap().column_values("label").unwrap();
        assert_eq!(labels[0], &Value::from("S3A"));
        let text = network.write();
        assert!(text.contains("\nS3A\n"));
        assert!(text.contains("\nRIVER SECTION S3A 0 0 0 0\nS3A 100 200\n"));
        assert!(text.contains("\nS3A          y     1.000    10.500"));
    }

    #[test]
    fn test_rename_collision_leaves_network_unchanged() {
        let mut network = network();
        let id = network.find(Category::Sections, "S3").unwrap();

        let err = network.rename(id, "S5").unwrap_err();

        assert!(matches!(err, FmdatError::NameCollision { .. }));
        assert_eq!(network.write(), SOURCE);
    }

    #[test]
    fn test_rename_with_unwritable_conditions_leaves_network_unchanged() {
        use fmdat_core::{
            element::Content,
            keyword::Keyword,
            table::Column,
            value::ValueKind,
        };

        let mut network = network();
        let (conditions, _) = network.by_class(ElementClass::Conditions).next().unwrap();
        network.remove(conditions).unwrap();
        let mut table = Table::new(vec![Column::new(CONDITIONS_LABEL, ValueKind::Float)]);
        table.push(vec![Value::Float(3.0)]).unwrap();
        let broken = Element::new(
            Keyword::new("INITIAL CONDITIONS"),
            None,
            ElementClass::Conditions,
            Content::new("").with_table("data", table),
        );
        network.insert(broken, Position::End).unwrap();
        let before = network.write();
        let s3 = network.find(Category::Sections, "S3").unwrap();

        let err = network.rename(s3, "S3A").unwrap_err();

        assert!(matches!(err, FmdatError::Field(_)));
        assert_eq!(network.find(Category::Sections, "S3"), Some(s3));
        assert!(network.find(Category::Sections, "S3A").is_none());
        assert_eq!(network.write(), before);
    }

    #[test]
    fn test_rename_updates_gxy_keys() {
        let gxy = "[RIVER_SECTION_S3]\nX=1\n[RIVER_SECTION_S3X]\nX=2\n[WEIR__S4]\nX=3\n";
        let mut network = network().with_gxy(gxy);
        let s3 = network.find(Category::Sections, "S3").unwrap();
        let s4 = network.find(Category::Structures, "S4").unwrap();

        network.rename(s3, "S3A").unwrap();
        network.rename(s4, "S4A").unwrap();

        assert_eq!(
            network.gxy(),
            Some("[RIVER_SECTION_S3A]\nX=1\n[RIVER_SECTION_S3X]\nX=2\n[WEIR__S4A]\nX=3\n")
        );
    }

    #[test]
    fn test_rename_rejects_long_names() {
        let mut network = network();
        let id = network.find(Category::Sections, "S3").unwrap();

        assert!(matches!(
            network.rename(id, "MUCH_TOO_LONG_NAME"),
            Err(FmdatError::InvalidName(_))
        ));
    }

    #[test]
    fn test_next_and_prev_skip_other_classes() {
        let network = network();
        let boundary = network.iter().next().map(|(id, _)| id).unwrap();
        let s3 = network.find(Category::Sections, "S3").unwrap();
        let s4 = network.find(Category::Structures, "S4").unwrap();
        let s5 = network.find(Category::Sections, "S5").unwrap();

        assert_eq!(network.next(boundary).unwrap(), s3);
        assert_eq!(network.next(s3).unwrap(), s4);
        assert_eq!(network.prev(s5).unwrap(), s4);
        assert!(network.prev(s3).is_err());
        assert!(network.next(s5).is_err());
    }

    #[test]
    fn test_downstream() {
        let network = network();
        let s3 = network.find(Category::Sections, "S3").unwrap();
        let s4 = network.find(Category::Structures, "S4").unwrap();
        let s5 = network.find(Category::Sections, "S5").unwrap();

        assert_eq!(network.downstream(s3).unwrap(), s4);
        assert_eq!(network.downstream(s4).unwrap(), s5);
        assert!(network.downstream(s5).is_err());
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut network = network();
        let s4 = network.find(Category::Structures, "S4").unwrap();
        let weir = network.create("WEIR", None, "W2").unwrap();

        let id = network.insert(weir, Position::After(s4)).unwrap();

        assert_eq!(network.next(s4).unwrap(), id);
        assert_eq!(network.position(id), Some(3));
    }

    #[test]
    fn test_insert_at_past_end() {
        let mut network = network();
        let weir = network.create("WEIR", None, "W2").unwrap();

        let err = network.insert(weir, Position::At(100)).unwrap_err();

        assert!(matches!(err, FmdatError::InvalidPosition(_)));
    }

    #[test]
    fn test_insert_many_checks_whole_batch() {
        let mut network = network();
        let first = network.create("WEIR", None, "W2").unwrap();
        let second = network.create("WEIR", None, "W2").unwrap();
        let before = network.len();

        let err = network.insert_many(vec![first, second], Position::End).unwrap_err();

        assert!(matches!(err, FmdatError::NameCollision { .. }));
        assert_eq!(network.len(), before);
    }

    #[test]
    fn test_insert_many_keeps_order() {
        let mut network = network();
        let s3 = network.find(Category::Sections, "S3").unwrap();
        let batch = vec![
            network.create("WEIR", None, "W1").unwrap(),
            network.create("SPILL", None, "W2").unwrap(),
        ];

        let ids = network.insert_many(batch, Position::Before(s3)).unwrap();

        assert_eq!(network.position(ids[0]), Some(1));
        assert_eq!(network.position(ids[1]), Some(2));
        assert_eq!(network.next(ids[1]).unwrap(), s3);
    }

    #[test]
    fn test_remove_keeps_indices() {
        let mut network = network();
        let boundary = network.iter().next().map(|(id, _)| id).unwrap();
        let s3 = network.find(Category::Sections, "S3").unwrap();
        let s4 = network.find(Category::Structures, "S4").unwrap();

        let removed = network.remove(s3).unwrap();

        assert_eq!(removed.name(), "S3");
        assert!(network.get(Category::Sections, "S3").is_err());
        assert_eq!(network.next(boundary).unwrap(), s4);
        assert!(network.remove(s3).is_err());
        assert!(network.element(s3).is_none());
    }

    #[test]
    fn test_new_network_writes_blank_file() {
        let network = Network::new();

        let text = network.write();

        assert!(text.starts_with("\n#REVISION#1\n"));
        assert!(text.ends_with("END GENERAL\nINITIAL CONDITIONS\n label   ?      flow     stage froude no  velocity     umode    ustate         z\n"));
        let reparsed = Network::parse(&text).unwrap();
        assert_eq!(reparsed.len(), 1);
    }

    #[test]
    fn test_edited_block_uses_source_line_ending() {
        let source = SOURCE.replace('\n', "\r\n");
        let mut network = Network::parse(&source).unwrap();
        network
            .get_mut(Category::Structures, "S4")
            .unwrap()
            .set_field("weir_elevation", 21.05)
            .unwrap();

        let text = network.write();

        assert!(text.contains("WEIR\r\nS4          S5\r\n     1.500\r\n     1.000     1.000     5.000    21.050     0.700\r\n"));
        assert_eq!(text.len(), source.len());
    }

    #[test]
    fn test_unsupported_index() {
        let network = network();

        assert!(network.get_unsupported("RIVER SECTIO (GISINFO)").is_some());
        assert_eq!(network.unsupported().count(), 1);
    }

    #[test]
    fn test_missing_final_newline_is_repaired_between_blocks() {
        let source = SOURCE.trim_end_matches('\n');
        let mut network = Network::parse(source).unwrap();
        let weir = network.create("WEIR", None, "W9").unwrap();

        network.insert(weir, Position::End).unwrap();
        let text = network.write();

        assert!(text.starts_with(source));
        assert!(text[source.len()..].starts_with("\nWEIR\nW9"));
    }
}
