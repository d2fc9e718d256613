use std::collections::HashMap;
use std::io::Write;

use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::OutputStream;

/// Tag opening a class-information record in the object stream.
pub const NEW_CLASS_TAG: u16 = 0xFFFF;

/// First count that no longer fits the single-byte small-vector
/// encoding.
pub const SMALL_VECTOR_CEILING: usize = 255;

/// Stable identity token for one object within one serialization pass.
///
/// Keys are (class tag, ordinal) pairs assigned by the document walker
/// from the host graph's ownership structure; nothing relies on address
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub class: &'static str,
    pub ordinal: u32,
}

impl ObjectKey {
    pub fn new(class: &'static str, ordinal: u32) -> Self {
        Self { class, ordinal }
    }
}

/// Serializer for an object graph with class/object deduplication.
///
/// For each distinct class, a class-information record is written once,
/// the first time an instance is serialized; every encounter (including
/// the first) is followed by the class index. For each distinct object
/// identity, the full body is written once, prefixed by its assigned
/// index; every later reference encodes as the bare index. Both maps are
/// scoped to this writer and die with it, since indices are meaningful
/// only within one stream.
pub struct ObjectWriter<W: Write> {
    out: OutputStream<W>,
    classes: HashMap<&'static str, u16>,
    objects: HashMap<ObjectKey, u32>,
}

impl<W: Write> ObjectWriter<W> {
    pub fn new(out: OutputStream<W>) -> Self {
        Self {
            out,
            classes: HashMap::new(),
            objects: HashMap::new(),
        }
    }

    /// The underlying primitive stream, for writing object field data.
    pub fn stream(&mut self) -> &mut OutputStream<W> {
        &mut self.out
    }

    pub fn into_stream(self) -> OutputStream<W> {
        self.out
    }

    /// Writes one object encounter.
    ///
    /// Emits the class reference, then either the object's assigned index
    /// followed by its body (first encounter, `body` is invoked), or a
    /// bare index reference (already seen, `body` is not invoked).
    /// Returns whether the body was written.
    pub fn write_object<F>(&mut self, key: ObjectKey, body: F) -> Result<bool>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.write_class_reference(key.class)?;

        if let Some(&index) = self.objects.get(&key) {
            self.out.write_u32(index)?;
            return Ok(false);
        }

        // A new object's token equals the running object count, which is
        // how the decoder tells bodies from back-references.
        let index = u32::try_from(self.objects.len()).map_err(|_| {
            Error::inconsistent("object index", "object table exhausted".to_string())
        })?;
        self.objects.insert(key, index);
        self.out.write_u32(index)?;
        body(self)?;
        Ok(true)
    }

    /// Writes a count prefix for a general object sequence.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count)
            .map_err(|_| Error::inconsistent("sequence count", format!("{count} exceeds u32")))?;
        self.out.write_u32(count)
    }

    /// Writes a size-bounded vector of raw bytes: a single-byte count
    /// followed by the elements contiguously.
    ///
    /// Valid only for trivially-copyable elements; routing object
    /// references through it would bypass the deduplication contract.
    /// Counts at or above [`SMALL_VECTOR_CEILING`] fail rather than
    /// truncate the count byte.
    pub fn write_small_vector(&mut self, elements: &[u8]) -> Result<()> {
        if elements.len() >= SMALL_VECTOR_CEILING {
            return Err(Error::inconsistent(
                "small vector count",
                format!("{} at or above ceiling {SMALL_VECTOR_CEILING}", elements.len()),
            ));
        }
        self.out.write_u8(elements.len() as u8)?;
        self.out.write_bytes(elements)
    }

    fn write_class_reference(&mut self, class: &'static str) -> Result<()> {
        let index = match self.classes.get(class) {
            Some(&index) => index,
            None => {
                let index = u16::try_from(self.classes.len())
                    .ok()
                    .filter(|&i| i != NEW_CLASS_TAG)
                    .ok_or_else(|| {
                        Error::inconsistent("class index", "class table exhausted".to_string())
                    })?;
                debug!("registering class {class} as index {index}");
                self.out.write_u16(NEW_CLASS_TAG)?;
                self.out.write_string(class)?;
                self.classes.insert(class, index);
                index
            }
        };
        self.out.write_u16(index)
    }
}
