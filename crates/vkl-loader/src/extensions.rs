//! Extension descriptors and per-instance/per-device enablement.

use std::collections::BTreeSet;

use vkl_core::config::ExtensionConfig;

/// Who implements an extension. Loader-origin extensions are terminated by
/// the loader itself; driver-origin ones are simply forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionOrigin {
    Loader,
    Icd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionProperties {
    pub name: String,
    pub spec_version: u32,
    pub description: String,
    pub origin: ExtensionOrigin,
}

impl ExtensionProperties {
    pub fn new(
        name: impl Into<String>,
        spec_version: u32,
        description: impl Into<String>,
        origin: ExtensionOrigin,
    ) -> Self {
        Self {
            name: name.into(),
            spec_version,
            description: description.into(),
            origin,
        }
    }

    pub fn is_loader_terminated(&self) -> bool {
        self.origin == ExtensionOrigin::Loader
    }
}

/// Ordered list of extension descriptors, unique by name. The first
/// descriptor added for a name wins.
#[derive(Debug, Clone, Default)]
pub struct ExtensionList {
    extensions: Vec<ExtensionProperties>,
}

impl ExtensionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, props: ExtensionProperties) {
        if !self.contains(&props.name) {
            self.extensions.push(props);
        }
    }

    pub fn extend<I>(&mut self, props: I)
    where
        I: IntoIterator<Item = ExtensionProperties>,
    {
        for p in props {
            self.add(p);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e.name == name)
    }

    /// Drop every extension the configuration disables.
    pub fn apply_config(&mut self, config: &ExtensionConfig) {
        self.extensions.retain(|e| !config.is_disabled(&e.name));
    }

    pub fn into_vec(self) -> Vec<ExtensionProperties> {
        self.extensions
    }
}

impl FromIterator<ExtensionProperties> for ExtensionList {
    fn from_iter<I: IntoIterator<Item = ExtensionProperties>>(iter: I) -> Self {
        let mut list = ExtensionList::new();
        list.extend(iter);
        list
    }
}

/// The extensions an application actually got: requested ∩ supported.
/// Fixed at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    names: BTreeSet<String>,
}

impl ExtensionSet {
    /// Intersect `requested` with `supported`. Returns the enabled set and the
    /// requested names that were dropped.
    pub fn negotiate(requested: &[String], supported: &ExtensionList) -> (Self, Vec<String>) {
        let mut names = BTreeSet::new();
        let mut dropped = Vec::new();
        for name in requested {
            if supported.contains(name) {
                names.insert(name.clone());
            } else if !dropped.contains(name) {
                dropped.push(name.clone());
            }
        }
        (Self { names }, dropped)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
