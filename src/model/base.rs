use std::sync::Arc;

use serde_json::{Value, json};

use crate::{
    config::resolve::Config,
    foundation::error::{CompileError, CompileResult},
    foundation::naming::qualify,
    model::{ParentScope, SizeSignals},
    spec::model::{DataDef, SpecHeader},
    vega::spec::{DataSource, EncodeEntry, GroupFragment, Layout, Signal},
};

/// Fragments computed by a node's parse and read back during assembly.
///
/// Composite nodes fold their children's components into their own, so the root's
/// component describes the whole tree.
#[derive(Clone, Debug, Default)]
pub(crate) struct Component {
    pub(crate) selection_data: Vec<DataSource>,
    pub(crate) data: Vec<DataSource>,
    pub(crate) layout_signals: Vec<Signal>,
    pub(crate) top_signals: Vec<Signal>,
    pub(crate) group: GroupFragment,
    pub(crate) layout: Option<Layout>,
    pub(crate) parent_group_properties: EncodeEntry,
}

impl Component {
    /// Append a child's document-level fragments after the ones already collected.
    ///
    /// Selection names are global, so a store or resolve signal already contributed by
    /// an earlier child is not added again.
    pub(crate) fn absorb(&mut self, child: &Component) {
        for store in &child.selection_data {
            if !self.selection_data.iter().any(|d| d.name == store.name) {
                self.selection_data.push(store.clone());
            }
        }
        self.data.extend(child.data.iter().cloned());
        self.layout_signals.extend(child.layout_signals.iter().cloned());
        for signal in &child.top_signals {
            if !self.top_signals.iter().any(|s| s.name == signal.name) {
                self.top_signals.push(signal.clone());
            }
        }
    }
}

/// State shared by every model variant.
#[derive(Debug)]
pub struct ModelBase {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) title: Option<Value>,
    pub(crate) config: Arc<Config>,
    /// Sources this node declares itself (raw source, then derived source).
    pub(crate) own_data: Vec<DataSource>,
    /// Source this node's marks read from.
    pub(crate) data_name: Option<String>,
    /// Size signals this node draws into; the enclosing layer's when shared.
    pub(crate) size: SizeSignals,
    pub(crate) shares_size: bool,
    pub(crate) component: Option<Component>,
}

impl ModelBase {
    pub(crate) fn new(
        header: &SpecHeader,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        let name = header
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| parent_given_name.to_string());

        let mut own_data = Vec::new();
        let mut data_name = match &header.data {
            Some(DataDef::Inline { values, format }) => {
                own_data.push(DataSource {
                    name: qualify(&name, "source"),
                    values: Some(values.clone()),
                    format: format.clone(),
                    ..DataSource::default()
                });
                Some(qualify(&name, "source"))
            }
            Some(DataDef::Url { url, format }) => {
                own_data.push(DataSource {
                    name: qualify(&name, "source"),
                    url: Some(url.clone()),
                    format: format.clone(),
                    ..DataSource::default()
                });
                Some(qualify(&name, "source"))
            }
            Some(DataDef::Named { name: source }) => {
                if source.is_empty() {
                    return Err(CompileError::model(format!(
                        "view '{name}' references a named data source with an empty name"
                    )));
                }
                Some(source.clone())
            }
            None => parent.and_then(|p| p.data.clone()),
        };

        if !header.transform.is_empty() {
            let Some(upstream) = data_name.clone() else {
                return Err(CompileError::model(format!(
                    "view '{name}' has transforms but no data to apply them to"
                )));
            };
            let derived = DataSource {
                name: qualify(&name, "data"),
                source: Some(upstream),
                transform: header.transform.clone(),
                ..DataSource::default()
            };
            data_name = Some(derived.name.clone());
            own_data.push(derived);
        }

        let (size, shares_size) = match parent.and_then(|p| p.size.clone()) {
            Some(shared) => (shared, true),
            None => (
                SizeSignals {
                    width: qualify(&name, "width"),
                    height: qualify(&name, "height"),
                },
                false,
            ),
        };

        Ok(Self {
            name,
            description: header.description.clone().filter(|d| !d.is_empty()),
            title: header.title.clone(),
            config,
            own_data,
            data_name,
            size,
            shares_size,
            component: None,
        })
    }

    /// `<name>_<suffix>`, or `suffix` for an unnamed node.
    pub fn get_name(&self, suffix: &str) -> String {
        qualify(&self.name, suffix)
    }

    /// Scope handed to children built under this node.
    pub(crate) fn child_scope(&self, share_size: bool) -> ParentScope {
        ParentScope {
            data: self.data_name.clone(),
            size: share_size.then(|| self.size.clone()),
        }
    }

    /// Constant size signals for views whose size is known at compile time.
    pub(crate) fn fixed_size_signals(&self, width: Option<f64>, height: Option<f64>) -> Vec<Signal> {
        vec![
            Signal::value(
                self.size.width.clone(),
                json!(width.unwrap_or(self.config.view.width)),
            ),
            Signal::value(
                self.size.height.clone(),
                json!(height.unwrap_or(self.config.view.height)),
            ),
        ]
    }

    /// Cell fill/stroke from the view config, for views that own their plot area.
    pub(crate) fn view_group_properties(&self) -> EncodeEntry {
        let mut props = EncodeEntry::new();
        if self.shares_size {
            return props;
        }
        if let Some(fill) = &self.config.view.fill {
            props.insert("fill".to_string(), json!({ "value": fill }));
        }
        if let Some(stroke) = &self.config.view.stroke {
            props.insert("stroke".to_string(), json!({ "value": stroke }));
        }
        props
    }

    pub(crate) fn component(&self) -> CompileResult<&Component> {
        self.component.as_ref().ok_or_else(|| {
            CompileError::assembly(format!(
                "view '{}' was assembled before it was parsed",
                self.display_name()
            ))
        })
    }

    pub(crate) fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<root>"
        } else {
            &self.name
        }
    }
}
