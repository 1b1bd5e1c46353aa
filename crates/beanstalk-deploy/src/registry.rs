//! Bean registry
//!
//! Dense storage of every bean record of one container, indexed by
//! [`BeanId`].

use beanstalk_model::{BeanId, BeanKind, BeanRecord, TypeName};
use std::collections::HashMap;

/// Every bean defined in one container
#[derive(Debug, Clone, Default)]
pub struct BeanRegistry {
    beans: Vec<BeanRecord>,
    by_class: HashMap<TypeName, Vec<BeanId>>,
}

impl BeanRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next added bean will get
    #[must_use]
    pub fn next_id(&self) -> BeanId {
        BeanId::new(u32::try_from(self.beans.len()).unwrap_or(u32::MAX))
    }

    /// Add a record; its id is replaced with the assigned one
    pub fn add(&mut self, mut record: BeanRecord) -> BeanId {
        let id = self.next_id();
        record.id = id;
        self.by_class.entry(record.bean_class.clone()).or_default().push(id);
        self.beans.push(record);
        id
    }

    /// Record by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: BeanId) -> Option<&BeanRecord> {
        self.beans.get(id.index())
    }

    /// Mutable record by id
    #[inline]
    pub fn get_mut(&mut self, id: BeanId) -> Option<&mut BeanRecord> {
        self.beans.get_mut(id.index())
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// Whether no bean is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// Every record, in definition order
    pub fn iter(&self) -> impl Iterator<Item = &BeanRecord> {
        self.beans.iter()
    }

    /// Mutable iteration over every record
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BeanRecord> {
        self.beans.iter_mut()
    }

    /// Enabled records
    pub fn enabled(&self) -> impl Iterator<Item = &BeanRecord> {
        self.beans.iter().filter(|b| b.enabled)
    }

    /// Records whose bean class is `class` (producers included)
    pub fn by_class<'a>(&'a self, class: &TypeName) -> impl Iterator<Item = &'a BeanRecord> + 'a {
        self.by_class
            .get(class)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id))
    }

    /// The managed or enterprise bean of a class
    #[must_use]
    pub fn class_bean(&self, class: &TypeName) -> Option<&BeanRecord> {
        self.by_class(class)
            .find(|b| matches!(b.kind, BeanKind::ManagedBean | BeanKind::Enterprise))
    }

    /// Whether any record has the class
    #[inline]
    #[must_use]
    pub fn contains_class(&self, class: &TypeName) -> bool {
        self.by_class.contains_key(class)
    }

    /// Enabled interceptors
    pub fn interceptors(&self) -> impl Iterator<Item = &BeanRecord> {
        self.enabled().filter(|b| b.kind == BeanKind::Interceptor)
    }

    /// Enabled decorators
    pub fn decorators(&self) -> impl Iterator<Item = &BeanRecord> {
        self.enabled().filter(|b| b.kind == BeanKind::Decorator)
    }

    /// Number of records per kind, in kind order
    #[must_use]
    pub fn kind_counts(&self) -> Vec<(BeanKind, usize)> {
        let kinds = [
            BeanKind::ManagedBean,
            BeanKind::Interceptor,
            BeanKind::Decorator,
            BeanKind::Producer,
            BeanKind::BuiltIn,
            BeanKind::Enterprise,
        ];
        kinds
            .into_iter()
            .map(|k| (k, self.beans.iter().filter(|b| b.kind == k).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}
