use crate::{ribbon::COMPONENTS_PER_VERTEX, Result, RibbonError};

/// Flat `f32` buffer whose length is fixed at allocation time.
///
/// Writes are capacity checked and never grow or shrink the storage; a
/// different size means allocating a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    data: Box<[f32]>,
}

impl VertexBuffer {
    /// Allocates `len` zeroed scalars.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0.0; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / COMPONENTS_PER_VERTEX
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Replaces the whole contents; `values` must match the buffer length.
    pub fn overwrite(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.data.len() {
            return Err(RibbonError::msg(format!(
                "expected {} scalars, got {}",
                self.data.len(),
                values.len()
            )));
        }
        self.data.copy_from_slice(values);
        Ok(())
    }
}
