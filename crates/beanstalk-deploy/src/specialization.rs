//! Specialization
//!
//! A specializer replaces its direct superclass: the superclass bean and the
//! producers it declares are disabled, and the specializer takes over its
//! qualifiers and name. Each
//! source (classpath, declarative) is collected on its own, so a conflict
//! is only detected between specializers of the same source.

use crate::error::ContainerError;
use crate::registry::BeanRegistry;
use beanstalk_model::{SpecializationEdge, SpecializationSource, TypeName, TypeUniverse};
use std::collections::BTreeMap;
use tracing::debug;

/// Edges for a set of specializers of one source
///
/// # Errors
/// Returns [`ContainerError::Configuration`] when a specializer has no
/// superclass other than the root type, and
/// [`ContainerError::InconsistentSpecialization`] when two specializers share
/// a target.
pub fn collect<'a>(
    universe: &TypeUniverse,
    specializers: impl IntoIterator<Item = &'a TypeName>,
    source: SpecializationSource,
) -> Result<Vec<SpecializationEdge>, ContainerError> {
    let mut by_target: BTreeMap<TypeName, TypeName> = BTreeMap::new();
    let mut edges = Vec::new();
    for specializer in specializers {
        let descriptor = universe.require(specializer)?;
        let target = match descriptor.effective_superclass() {
            Some(target) if !target.is_root() => target,
            _ => {
                return Err(ContainerError::configuration(format!(
                    "{specializer} specializes the root type"
                )))
            }
        };
        if let Some(existing) = by_target.get(&target) {
            return Err(ContainerError::InconsistentSpecialization {
                target,
                specializers: vec![existing.clone(), specializer.clone()],
            });
        }
        by_target.insert(target.clone(), specializer.clone());
        edges.push(SpecializationEdge {
            specializer: specializer.clone(),
            target,
            source,
        });
    }
    Ok(edges)
}

/// Apply edges to a registry, shallowest specializer first
///
/// Specializers without a bean (vetoed, or not injectable) are skipped.
///
/// # Errors
/// Returns [`ContainerError::Configuration`] when a target has no bean or
/// when both beans declare a name.
pub fn apply(
    universe: &TypeUniverse,
    registry: &mut BeanRegistry,
    edges: &[SpecializationEdge],
) -> Result<Vec<SpecializationEdge>, ContainerError> {
    let mut ordered: Vec<_> = edges
        .iter()
        .map(|e| {
            let depth = universe.superclass_chain(&e.specializer).map_or(0, |c| c.len());
            (depth, e)
        })
        .collect();
    ordered.sort_by_key(|(depth, _)| *depth);

    let mut applied = Vec::new();
    for (_, edge) in ordered {
        let Some(specializer) = registry.class_bean(&edge.specializer).map(|b| b.id) else {
            debug!(specializer = %edge.specializer, "specializer has no bean, skipped");
            continue;
        };
        let Some(target) = registry.class_bean(&edge.target) else {
            return Err(ContainerError::configuration(format!(
                "{} specializes {}, which is not a bean",
                edge.specializer, edge.target
            )));
        };
        let target_id = target.id;
        let inherited_qualifiers = target.qualifiers.clone();
        let inherited_name = target.name.clone();

        let Some(bean) = registry.get_mut(specializer) else {
            continue;
        };
        if let (Some(own), Some(theirs)) = (&bean.name, &inherited_name) {
            return Err(ContainerError::configuration(format!(
                "{} is named {own} but specializes {}, which is named {theirs}",
                edge.specializer, edge.target
            )));
        }
        bean.qualifiers.extend(inherited_qualifiers);
        if bean.name.is_none() {
            bean.name = inherited_name;
        }

        if let Some(target) = registry.get_mut(target_id) {
            target.enabled = false;
            target.specialized_by = Some(specializer);
        }
        let mut producers = 0;
        for producer in registry
            .iter_mut()
            .filter(|b| b.producer.as_ref().is_some_and(|p| p.declaring_bean == target_id))
        {
            producer.enabled = false;
            producers += 1;
        }
        debug!(
            specializer = %edge.specializer,
            target = %edge.target,
            producers,
            "specialization applied"
        );
        applied.push(edge.clone());
    }
    Ok(applied)
}
