use cubefield_animate::MeshSink;

/// Merges block writes with adjacent offsets into contiguous runs.
///
/// A run is emitted when the next write is not adjacent, when the staging
/// area is full, or on [`RunBatcher::finish`]. Offsets are in floats.
#[derive(Debug)]
pub struct RunBatcher {
    staging: Vec<f32>,
    start: usize,
    capacity: usize,
}

impl RunBatcher {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            staging: Vec::with_capacity(capacity),
            start: 0,
            capacity,
        }
    }

    /// Stage `data` at `offset`, emitting the current run first if needed.
    pub fn push(&mut self, offset: usize, data: &[f32], emit: &mut impl FnMut(usize, &[f32])) {
        let adjacent = offset == self.start + self.staging.len();
        if !self.staging.is_empty() && (!adjacent || self.staging.len() + data.len() > self.capacity) {
            self.finish(emit);
        }
        if self.staging.is_empty() {
            self.start = offset;
        }
        self.staging.extend_from_slice(data);
    }

    /// Emit whatever is staged.
    pub fn finish(&mut self, emit: &mut impl FnMut(usize, &[f32])) {
        if self.staging.is_empty() {
            return;
        }
        emit(self.start, &self.staging);
        self.staging.clear();
    }

    pub fn pending(&self) -> usize {
        self.staging.len()
    }
}

/// Default staging size: 1024 instance blocks.
const DEFAULT_STAGING_FLOATS: usize = 1024 * 16;

/// [`MeshSink`] writing into a GPU instance buffer through the queue.
///
/// Adjacent blocks are coalesced so a mostly-visible field costs a handful
/// of `write_buffer` calls rather than one per instance.
pub struct QueueSink<'a> {
    queue: &'a wgpu::Queue,
    buffer: &'a wgpu::Buffer,
    batcher: RunBatcher,
    writes: usize,
}

impl<'a> QueueSink<'a> {
    pub fn new(queue: &'a wgpu::Queue, buffer: &'a wgpu::Buffer) -> Self {
        Self::with_staging(queue, buffer, DEFAULT_STAGING_FLOATS)
    }

    pub fn with_staging(queue: &'a wgpu::Queue, buffer: &'a wgpu::Buffer, floats: usize) -> Self {
        Self {
            queue,
            buffer,
            batcher: RunBatcher::new(floats),
            writes: 0,
        }
    }

    /// `write_buffer` calls issued so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

fn write_run(queue: &wgpu::Queue, buffer: &wgpu::Buffer, offset: usize, data: &[f32]) {
    let byte_offset = (offset * std::mem::size_of::<f32>()) as wgpu::BufferAddress;
    queue.write_buffer(buffer, byte_offset, bytemuck::cast_slice(data));
}

impl MeshSink for QueueSink<'_> {
    fn upload_all(&mut self, data: &[f32]) {
        let (queue, buffer) = (self.queue, self.buffer);
        self.batcher.finish(&mut |offset, run| write_run(queue, buffer, offset, run));
        write_run(queue, buffer, 0, data);
        self.writes += 1;
    }

    fn update_partial(&mut self, offset: usize, data: &[f32]) {
        let (queue, buffer) = (self.queue, self.buffer);
        let mut writes = 0;
        self.batcher.push(offset, data, &mut |start, run| {
            write_run(queue, buffer, start, run);
            writes += 1;
        });
        self.writes += writes;
    }

    fn flush(&mut self) {
        let (queue, buffer) = (self.queue, self.buffer);
        let mut writes = 0;
        self.batcher.finish(&mut |start, run| {
            write_run(queue, buffer, start, run);
            writes += 1;
        });
        self.writes += writes;
        tracing::trace!(writes = self.writes, "instance buffer flushed");
    }
}

impl Drop for QueueSink<'_> {
    fn drop(&mut self) {
        if self.batcher.pending() > 0 {
            self.flush();
        }
    }
}
