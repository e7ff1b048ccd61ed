/// Stable identity keys
///
/// A unique key names one specific logical resource (a decoded image, a
/// glyph atlas page). Higher layers build it from a domain they generated
/// once plus their own data words. The optional tag is a debugging label and
/// does not take part in equality.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DOMAIN: AtomicU32 = AtomicU32::new(1);

/// Caller-assigned, globally unique resource key
#[derive(Debug, Clone)]
pub struct UniqueKey {
    domain: u32,
    data: Vec<u32>,
    tag: Option<&'static str>,
}

impl UniqueKey {
    /// Allocate a fresh key domain
    pub fn generate_domain() -> u32 {
        NEXT_DOMAIN.fetch_add(1, Ordering::Relaxed)
    }

    /// Build a key from a domain and its data words
    pub fn new(domain: u32, data: &[u32]) -> Self {
        Self {
            domain,
            data: data.to_vec(),
            tag: None,
        }
    }

    /// Attach a debugging label
    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Key domain
    pub fn domain(&self) -> u32 {
        self.domain
    }

    /// Data words
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Debugging label, if any
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }
}

impl PartialEq for UniqueKey {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.data == other.data
    }
}

impl Eq for UniqueKey {}

impl Hash for UniqueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.domain.hash(state);
        self.data.hash(state);
    }
}
