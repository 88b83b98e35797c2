use crate::validator::{supports, Validator};
use dbft_types::ValidatorCategory;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks the validator workers currently registered for each category.
///
/// Registration and unregistration are idempotent per id, as required by
/// the validator worker contract: registering the same id twice simply
/// replaces the previous handle, and unregistering an unknown id is a no-op.
#[derive(Default)]
pub struct ValidatorRegistry {
    stateless: HashMap<String, Arc<dyn Validator>>,
    stateful: HashMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        ValidatorRegistry::default()
    }

    pub fn register(&mut self, validator: Arc<dyn Validator>) {
        let table = match validator.category() {
            ValidatorCategory::Stateless => &mut self.stateless,
            ValidatorCategory::Stateful => &mut self.stateful,
        };
        table.insert(validator.id().to_owned(), validator);
    }

    pub fn unregister(&mut self, id: &str) {
        self.stateless.remove(id);
        self.stateful.remove(id);
    }

    /// Whether at least one worker is registered for `category` — entries
    /// stay in their `Awaiting*` state until this is true.
    pub fn has_worker_for(&self, category: ValidatorCategory) -> bool {
        match category {
            ValidatorCategory::Stateless => !self.stateless.is_empty(),
            ValidatorCategory::Stateful => !self.stateful.is_empty(),
        }
    }

    /// Workers in `category` that declare support for `type_tag`.
    pub fn workers_for(
        &self,
        category: ValidatorCategory,
        type_tag: u8,
    ) -> Vec<Arc<dyn Validator>> {
        let table = match category {
            ValidatorCategory::Stateless => &self.stateless,
            ValidatorCategory::Stateful => &self.stateful,
        };
        table
            .values()
            .filter(|v| supports(v.as_ref(), type_tag))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbft_traits::Snapshot;
    use dbft_types::{Transaction, Verdict};
    use std::collections::HashSet;

    struct AlwaysPass {
        id: String,
        category: ValidatorCategory,
        types: HashSet<u8>,
    }

    impl Validator for AlwaysPass {
        fn id(&self) -> &str {
            &self.id
        }
        fn category(&self) -> ValidatorCategory {
            self.category
        }
        fn supported_tx_types(&self) -> &HashSet<u8> {
            &self.types
        }
        fn check(&self, _tx: &Transaction, _snapshot: &dyn Snapshot) -> Verdict {
            Verdict::Pass
        }
    }

    #[test]
    fn register_is_idempotent_per_id() {
        let mut registry = ValidatorRegistry::new();
        let v = Arc::new(AlwaysPass {
            id: "v1".into(),
            category: ValidatorCategory::Stateless,
            types: HashSet::new(),
        });
        registry.register(v.clone());
        registry.register(v);
        assert_eq!(registry.workers_for(ValidatorCategory::Stateless, 1).len(), 1);
    }

    #[test]
    fn unregister_unknown_id_is_a_no_op() {
        let mut registry = ValidatorRegistry::new();
        registry.unregister("does-not-exist");
        assert!(!registry.has_worker_for(ValidatorCategory::Stateless));
    }
}
