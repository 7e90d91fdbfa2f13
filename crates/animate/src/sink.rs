/// Receiver for instance data on its way to the GPU-resident copy of the buffer.
///
/// Offsets and lengths are in floats, not bytes. `update_partial` is called once
/// per changed instance block, in increasing offset order, and `flush` once at
/// the end of each update pass.
pub trait MeshSink {
    /// Replace the whole resident buffer.
    fn upload_all(&mut self, data: &[f32]);

    /// Overwrite `data.len()` floats starting at `offset`.
    fn update_partial(&mut self, offset: usize, data: &[f32]);

    /// Push out anything still batched.
    fn flush(&mut self) {}
}

impl<S: MeshSink + ?Sized> MeshSink for &mut S {
    fn upload_all(&mut self, data: &[f32]) {
        (**self).upload_all(data);
    }

    fn update_partial(&mut self, offset: usize, data: &[f32]) {
        (**self).update_partial(offset, data);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Discards everything. For headless runs that only want the CPU-side buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MeshSink for NullSink {
    fn upload_all(&mut self, _data: &[f32]) {}

    fn update_partial(&mut self, _offset: usize, _data: &[f32]) {}
}

/// Keeps a mirror of the resident buffer and remembers the patches of the
/// most recent pass.
///
/// The patch list is reset by the first patch after a flush, so memory stays
/// bounded by one pass however many frames run. [`patch_total`](Self::patch_total)
/// counts across all passes.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    mirror: Vec<f32>,
    patches: Vec<usize>,
    patch_total: usize,
    pass_closed: bool,
    uploads: usize,
    flushes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the mirrored buffer.
    pub fn mirror(&self) -> &[f32] {
        &self.mirror
    }

    /// Float offsets of the current or last flushed pass, in arrival order.
    pub fn patches(&self) -> &[usize] {
        &self.patches
    }

    /// Partial updates received since creation or the last [`clear_patches`](Self::clear_patches).
    pub fn patch_total(&self) -> usize {
        self.patch_total
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Forget recorded patches and flush count; keeps the mirror.
    pub fn clear_patches(&mut self) {
        self.patches.clear();
        self.patch_total = 0;
        self.pass_closed = false;
        self.flushes = 0;
    }
}

impl MeshSink for RecordingSink {
    fn upload_all(&mut self, data: &[f32]) {
        self.mirror.clear();
        self.mirror.extend_from_slice(data);
        self.uploads += 1;
    }

    fn update_partial(&mut self, offset: usize, data: &[f32]) {
        let end = offset + data.len();
        if self.mirror.len() < end {
            self.mirror.resize(end, 0.0);
        }
        self.mirror[offset..end].copy_from_slice(data);
        if self.pass_closed {
            self.patches.clear();
            self.pass_closed = false;
        }
        self.patches.push(offset);
        self.patch_total += 1;
    }

    fn flush(&mut self) {
        self.pass_closed = true;
        self.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_mirrors_uploads_and_patches() {
        let mut sink = RecordingSink::new();
        sink.upload_all(&[0.0; 32]);
        sink.update_partial(16, &[1.0; 16]);
        sink.flush();

        assert_eq!(sink.uploads(), 1);
        assert_eq!(sink.patches(), &[16]);
        assert_eq!(sink.flushes(), 1);
        assert_eq!(&sink.mirror()[..16], &[0.0; 16]);
        assert_eq!(&sink.mirror()[16..], &[1.0; 16]);
    }

    #[test]
    fn patch_list_holds_only_the_last_pass() {
        let mut sink = RecordingSink::new();
        for pass in 0..100 {
            sink.update_partial(0, &[pass as f32; 16]);
            sink.update_partial(32, &[pass as f32; 16]);
            sink.flush();
        }
        assert_eq!(sink.patches(), &[0, 32]);
        assert_eq!(sink.patch_total(), 200);
        assert_eq!(sink.flushes(), 100);
        assert_eq!(sink.mirror()[0], 99.0);
    }

    #[test]
    fn empty_pass_keeps_previous_patches() {
        let mut sink = RecordingSink::new();
        sink.update_partial(16, &[1.0; 16]);
        sink.flush();
        sink.flush();
        assert_eq!(sink.patches(), &[16]);
        assert_eq!(sink.patch_total(), 1);
    }

    #[test]
    fn clear_patches_keeps_mirror() {
        let mut sink = RecordingSink::new();
        sink.update_partial(0, &[2.0; 16]);
        sink.flush();
        sink.clear_patches();
        assert!(sink.patches().is_empty());
        assert_eq!(sink.flushes(), 0);
        assert_eq!(sink.mirror().len(), 16);
    }

    #[test]
    fn mut_ref_forwards() {
        let mut sink = RecordingSink::new();
        {
            let mut borrowed = &mut sink;
            MeshSink::update_partial(&mut borrowed, 0, &[3.0; 16]);
            MeshSink::flush(&mut borrowed);
        }
        assert_eq!(sink.patches(), &[0]);
        assert_eq!(sink.flushes(), 1);
    }
}
