//! Flat instance transform buffer.
//!
//! # Layout
//! The buffer is a contiguous run of 16-float blocks, one per instance. Block
//! `i` occupies `[i * 16, i * 16 + 16)`. Each block holds the instance's 4x4
//! world matrix *transposed* relative to glam's column-major storage: the four
//! rows of the matrix are written one after another. This is what the instanced
//! vertex stream expects, and it puts the translation at offsets 3, 7 and 11.
//!
//! Every read and write of a block goes through [`pack`], [`unpack`] and
//! [`read_position`]. Callers never index into a block by hand.

use glam::{Mat4, Vec3};

use crate::error::BufferError;

/// Number of floats per instance block.
pub const BLOCK_LEN: usize = 16;

/// Offsets of the x, y, z translation components inside a block.
pub const TRANSLATION_OFFSETS: [usize; 3] = [3, 7, 11];

/// Float offset of instance `index`'s block.
#[inline]
pub fn block_offset(index: usize) -> usize {
    index * BLOCK_LEN
}

/// Write `matrix` into `block` in transposed order.
///
/// Panics if `block` is not exactly [`BLOCK_LEN`] floats.
#[inline]
pub fn pack(matrix: &Mat4, block: &mut [f32]) {
    block.copy_from_slice(&matrix.transpose().to_cols_array());
}

/// Rebuild the matrix stored in `block`.
#[inline]
pub fn unpack(block: &[f32]) -> Mat4 {
    Mat4::from_cols_slice(block).transpose()
}

/// Read only the translation of a block, without rebuilding the matrix.
#[inline]
pub fn read_position(block: &[f32]) -> Vec3 {
    let [x, y, z] = TRANSLATION_OFFSETS;
    Vec3::new(block[x], block[y], block[z])
}

/// Authoritative storage for every instance transform.
///
/// Fixed cardinality: once built, blocks are rewritten in place but never
/// added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformBuffer {
    data: Vec<f32>,
}

impl TransformBuffer {
    /// Empty buffer with room for `instances` blocks. Fill it with [`push`](Self::push).
    pub fn with_instance_capacity(instances: usize) -> Self {
        Self {
            data: Vec::with_capacity(instances * BLOCK_LEN),
        }
    }

    /// Wrap an existing float vector. Its length must be a multiple of 16.
    pub fn from_floats(data: Vec<f32>) -> Result<Self, BufferError> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(BufferError::RaggedLength { len: data.len() });
        }
        Ok(Self { data })
    }

    /// Append one instance.
    pub fn push(&mut self, matrix: &Mat4) {
        let start = self.data.len();
        self.data.resize(start + BLOCK_LEN, 0.0);
        pack(matrix, &mut self.data[start..]);
    }

    /// Number of instances held.
    pub fn instance_count(&self) -> usize {
        self.data.len() / BLOCK_LEN
    }

    /// Length in floats.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The packed block of instance `index`.
    #[inline]
    pub fn block(&self, index: usize) -> &[f32] {
        let start = block_offset(index);
        &self.data[start..start + BLOCK_LEN]
    }

    #[inline]
    pub fn block_mut(&mut self, index: usize) -> &mut [f32] {
        let start = block_offset(index);
        &mut self.data[start..start + BLOCK_LEN]
    }

    /// World position of instance `index`, read straight from the block.
    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        read_position(self.block(index))
    }

    /// Full world matrix of instance `index`.
    pub fn transform(&self, index: usize) -> Mat4 {
        unpack(self.block(index))
    }

    /// Overwrite instance `index` with `matrix`.
    pub fn set_transform(&mut self, index: usize, matrix: &Mat4) {
        pack(matrix, self.block_mut(index));
    }

    /// Iterate over instance positions in buffer order.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.data.chunks_exact(BLOCK_LEN).map(read_position)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
