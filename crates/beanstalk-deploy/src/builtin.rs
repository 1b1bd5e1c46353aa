//! Container-provided beans
//!
//! The bean manager, the default contract beans every deployment gets, and
//! the platform beans a profile adds when their contracts are present.

use crate::config::PlatformProfile;
use crate::registry::BeanRegistry;
use beanstalk_model::{wellknown, BeanId, BeanRecord, TypeName, TypeRef};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Default contract beans: contract and scope
pub const DEFAULT_BEANS: [(&str, &str); 4] = [
    (wellknown::CONVERSATION, wellknown::REQUEST_SCOPED),
    (wellknown::INJECTION_POINT, wellknown::DEPENDENT),
    (wellknown::INSTANCE, wellknown::DEPENDENT),
    (wellknown::EVENT, wellknown::DEPENDENT),
];

/// Contracts a profile provides beans for
#[must_use]
pub fn platform_contracts(profile: PlatformProfile) -> &'static [&'static str] {
    match profile {
        PlatformProfile::Standalone => &[],
        PlatformProfile::Web => &[wellknown::PRINCIPAL],
        PlatformProfile::Enterprise => &[
            wellknown::PRINCIPAL,
            wellknown::VALIDATOR,
            wellknown::VALIDATOR_FACTORY,
            wellknown::USER_TRANSACTION,
        ],
    }
}

fn contract_bean(
    registry: &mut BeanRegistry,
    contract: &'static str,
    scope: &'static str,
) -> BeanId {
    let contract = TypeName::from_static(contract);
    let types = BTreeSet::from([TypeRef::Object(contract.clone()), TypeRef::root()]);
    let id = registry.next_id();
    registry.add(BeanRecord::built_in(
        id,
        contract,
        types,
        TypeName::from_static(scope),
    ))
}

/// Register the bean manager bean
pub fn register_manager(registry: &mut BeanRegistry) -> BeanId {
    let id = contract_bean(registry, wellknown::BEAN_MANAGER, wellknown::DEPENDENT);
    debug!(bean = %id, "registered bean manager");
    id
}

/// Register the default contract beans
pub fn register_defaults(registry: &mut BeanRegistry) -> Vec<BeanId> {
    DEFAULT_BEANS
        .into_iter()
        .map(|(contract, scope)| contract_bean(registry, contract, scope))
        .collect()
}

/// Register the platform beans of a profile whose contracts are known
///
/// Contracts missing from the universe are skipped with a warning.
pub fn register_platform(
    registry: &mut BeanRegistry,
    profile: PlatformProfile,
    known: impl Fn(&str) -> bool,
) -> Vec<BeanId> {
    let mut added = Vec::new();
    for contract in platform_contracts(profile) {
        if known(contract) {
            added.push(contract_bean(registry, contract, wellknown::DEPENDENT));
        } else {
            warn!(contract, ?profile, "platform contract not available, bean skipped");
        }
    }
    added
}
