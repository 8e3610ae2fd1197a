//! Page descriptors and the per-page invoker cache
//!
//! Both are published as immutable snapshots through [`ArcSwap`]: readers
//! load the current snapshot without locking, writers build a new one and
//! swap it in.

use crate::descriptor::{PageActionDescriptor, PageFactory};
use crate::filters::{FilterCollection, FilterPipeline};
use arc_swap::ArcSwap;
use folio_core::logging::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// The registered pages with the version they were published under
#[derive(Debug, Default)]
pub struct ActionDescriptorCollection {
    pub version: u64,
    pub items: Vec<Arc<PageActionDescriptor>>,
}

impl ActionDescriptorCollection {
    pub fn find(&self, id: &str) -> Option<&Arc<PageActionDescriptor>> {
        self.items.iter().find(|d| d.id == id)
    }
}

/// Publishes the page descriptors; every update bumps the version
pub struct ActionDescriptorCollectionProvider {
    current: ArcSwap<ActionDescriptorCollection>,
}

impl ActionDescriptorCollectionProvider {
    pub fn new(descriptors: Vec<PageActionDescriptor>) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(ActionDescriptorCollection {
                version: 0,
                items: descriptors.into_iter().map(Arc::new).collect(),
            })),
        }
    }

    pub fn descriptors(&self) -> Arc<ActionDescriptorCollection> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Replace the registered pages
    pub fn update(&self, descriptors: Vec<PageActionDescriptor>) {
        let items: Vec<_> = descriptors.into_iter().map(Arc::new).collect();
        self.current.rcu(|current| ActionDescriptorCollection {
            version: current.version + 1,
            items: items.clone(),
        });
        debug!(version = self.version(), "Page descriptors updated");
    }
}

impl Default for ActionDescriptorCollectionProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// What the invoker needs for a page, built once per descriptor version
pub struct PageActionInvokerCacheEntry {
    pub action: Arc<PageActionDescriptor>,
    pub filters: Arc<FilterPipeline>,
    pub page_factory: PageFactory,
}

#[derive(Default)]
struct CacheSnapshot {
    version: u64,
    entries: HashMap<String, Arc<PageActionInvokerCacheEntry>>,
}

pub struct PageActionInvokerCache {
    collection: Arc<ActionDescriptorCollectionProvider>,
    global_filters: FilterCollection,
    snapshot: ArcSwap<CacheSnapshot>,
}

impl PageActionInvokerCache {
    pub fn new(
        collection: Arc<ActionDescriptorCollectionProvider>,
        global_filters: FilterCollection,
    ) -> Self {
        let version = collection.version();
        Self {
            collection,
            global_filters,
            snapshot: ArcSwap::new(Arc::new(CacheSnapshot {
                version,
                entries: HashMap::new(),
            })),
        }
    }

    pub fn collection(&self) -> &Arc<ActionDescriptorCollectionProvider> {
        &self.collection
    }

    /// The cache entry for `action`, built on first use.
    ///
    /// A changed descriptor version discards every entry of the old one.
    pub fn get_or_create(&self, action: &Arc<PageActionDescriptor>) -> Arc<PageActionInvokerCacheEntry> {
        let version = self.collection.version();
        {
            let snapshot = self.snapshot.load();
            if snapshot.version == version {
                if let Some(entry) = snapshot.entries.get(&action.id) {
                    if Arc::ptr_eq(&entry.action, action) {
                        trace!(page = %action.id, "Invoker cache hit");
                        return entry.clone();
                    }
                }
            }
        }

        let entry = Arc::new(self.build_entry(action));
        self.snapshot.rcu(|current| {
            let mut entries = if current.version == version {
                current.entries.clone()
            } else {
                HashMap::new()
            };
            entries.insert(action.id.clone(), entry.clone());
            CacheSnapshot { version, entries }
        });
        entry
    }

    /// Entries in the current snapshot
    pub fn len(&self) -> usize {
        self.snapshot.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build_entry(&self, action: &Arc<PageActionDescriptor>) -> PageActionInvokerCacheEntry {
        let filters = FilterPipeline::build(&self.global_filters, &action.filters);
        debug!(
            page = %action.id,
            authorization = %FilterPipeline::describe(&filters.authorization),
            page_filters = %FilterPipeline::describe(&filters.page),
            result = %FilterPipeline::describe(&filters.result),
            "Built page invoker cache entry"
        );
        PageActionInvokerCacheEntry {
            action: action.clone(),
            filters: Arc::new(filters),
            page_factory: action.page_factory.clone(),
        }
    }
}
