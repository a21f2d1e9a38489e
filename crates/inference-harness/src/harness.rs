use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::errors::HarnessError;
use crate::model::{ModelRef, ProviderId};
use crate::provider::ProviderAdapter;
use crate::run::RunBuilder;

pub(crate) struct HarnessInner {
    providers: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl HarnessInner {
    pub(crate) fn provider(&self, id: &ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers.get(id).cloned()
    }
}

/// Entry point for starting runs against registered providers.
#[derive(Clone)]
pub struct Harness {
    pub(crate) inner: Arc<HarnessInner>,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Starts building a single-turn run for the given model.
    pub fn run(&self, model: ModelRef) -> RunBuilder {
        RunBuilder::new(self.inner.clone(), model)
    }

    pub fn has_provider(&self, id: &ProviderId) -> bool {
        self.inner.providers.contains_key(id)
    }
}

/// Registers provider adapters before creating a `Harness`.
#[derive(Default)]
pub struct HarnessBuilder {
    providers: Vec<Arc<dyn ProviderAdapter>>,
}

impl HarnessBuilder {
    /// Registers a provider adapter. Ids must be unique.
    pub fn register_provider(mut self, provider: Arc<dyn ProviderAdapter>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> Result<Harness, HarnessError> {
        let mut providers = HashMap::with_capacity(self.providers.len());
        for provider in self.providers {
            match providers.entry(provider.id()) {
                Entry::Occupied(slot) => {
                    return Err(HarnessError::Config(format!(
                        "duplicate provider registration: {}",
                        slot.key()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(provider);
                }
            }
        }
        Ok(Harness {
            inner: Arc::new(HarnessInner { providers }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::provider::{ProviderRequest, ProviderStreamHandle};

    struct NamedProvider(&'static str);

    #[async_trait::async_trait]
    impl ProviderAdapter for NamedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::new(self.0)
        }

        async fn start_stream(
            &self,
            _req: ProviderRequest,
        ) -> Result<ProviderStreamHandle, ProviderError> {
            unreachable!("not used in this test")
        }
    }

    #[test]
    fn build_rejects_duplicate_provider_ids() {
        let result = Harness::builder()
            .register_provider(Arc::new(NamedProvider("azure-inference")))
            .register_provider(Arc::new(NamedProvider("azure-inference")))
            .build();
        assert!(
            matches!(result, Err(HarnessError::Config(message)) if message.contains("duplicate provider"))
        );
    }

    #[test]
    fn distinct_providers_are_all_registered() {
        let harness = Harness::builder()
            .register_provider(Arc::new(NamedProvider("a")))
            .register_provider(Arc::new(NamedProvider("b")))
            .build()
            .expect("harness");
        assert!(harness.has_provider(&ProviderId::new("a")));
        assert!(harness.has_provider(&ProviderId::new("b")));
        assert!(!harness.has_provider(&ProviderId::new("c")));
    }
}
