use crate::object::{HostObject, short_name};

struct RegisteredObject {
    module: String,
    object: Box<dyn HostObject>,
}

/// Registry of host objects, filled once by the embedder before the first
/// tick. Type shapes are assumed stable for the process lifetime; nothing is
/// ever unregistered.
pub struct HostGraph {
    primary_module: String,
    objects: Vec<RegisteredObject>,
}

impl HostGraph {
    pub fn new(primary_module: impl Into<String>) -> Self {
        Self {
            primary_module: primary_module.into(),
            objects: Vec::new(),
        }
    }

    pub fn register(&mut self, module: impl Into<String>, object: Box<dyn HostObject>) {
        self.objects.push(RegisteredObject {
            module: module.into(),
            object,
        });
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolution order: exact full-qualified name preferring the primary
    /// module on collision, then short-name-only match under the same
    /// preference.
    pub(crate) fn find(&self, type_name: &str) -> Option<usize> {
        let trimmed = type_name.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.find_by(|entry| entry.object.type_name() == trimmed)
            .or_else(|| self.find_by(|entry| short_name(entry.object.type_name()) == trimmed))
    }

    fn find_by(&self, matches: impl Fn(&RegisteredObject) -> bool) -> Option<usize> {
        let mut fallback = None;
        for (slot, entry) in self.objects.iter().enumerate() {
            if !matches(entry) {
                continue;
            }
            if entry.module == self.primary_module {
                return Some(slot);
            }
            fallback.get_or_insert(slot);
        }
        fallback
    }

    pub(crate) fn object(&self, slot: usize) -> Option<&dyn HostObject> {
        self.objects.get(slot).map(|entry| entry.object.as_ref())
    }

    pub(crate) fn object_mut(&mut self, slot: usize) -> Option<&mut Box<dyn HostObject>> {
        self.objects.get_mut(slot).map(|entry| &mut entry.object)
    }

    /// Iterates `(module, object)` pairs for read-only snapshot builders.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn HostObject)> {
        self.objects
            .iter()
            .map(|entry| (entry.module.as_str(), entry.object.as_ref()))
    }
}
