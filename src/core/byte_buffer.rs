//! Append-only byte accumulator for packing GPU upload blobs

use bytemuck::Pod;

/// Packs heterogeneous plain-old-data values into one contiguous byte blob.
///
/// Values are appended in their native `#[repr(C)]` layout, padding
/// included. Nothing is inserted between appended regions: the order of
/// [`add`](Self::add) / [`extend`](Self::extend) calls is the byte order of
/// the result, so it must follow the consumer's layout exactly.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Append the raw bytes of a single value
    pub fn add<T: Pod>(&mut self, value: &T) {
        self.data.extend_from_slice(bytemuck::bytes_of(value));
    }

    /// Append the raw bytes of a contiguous slice
    pub fn extend<T: Pod>(&mut self, values: &[T]) {
        self.data.extend_from_slice(bytemuck::cast_slice(values));
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Pod, Zeroable)]
    struct Header {
        a: u32,
        b: f32,
        c: [i32; 2],
    }

    #[test]
    fn test_header_then_array() {
        let header = Header { a: 7, b: 0.5, c: [-1, 2] };
        let payload: Vec<u8> = (0..13).collect();

        let mut buffer = ByteBuffer::new();
        buffer.add(&header);
        buffer.extend(&payload);

        let header_size = std::mem::size_of::<Header>();
        assert_eq!(buffer.len(), header_size + payload.len());
        assert_eq!(&buffer.as_bytes()[..header_size], bytemuck::bytes_of(&header));
        assert_eq!(&buffer.as_bytes()[header_size..], payload.as_slice());
    }

    #[test]
    fn test_extend_wide_elements() {
        let mut buffer = ByteBuffer::with_capacity(16);
        buffer.extend(&[1.0f32, 2.0, 3.0]);
        buffer.add(&0xAABBCCDDu32);

        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer.as_bytes()[4..8], &2.0f32.to_ne_bytes());
        assert_eq!(&buffer.as_bytes()[12..], &0xAABBCCDDu32.to_ne_bytes());
    }

    #[test]
    fn test_empty() {
        let mut buffer = ByteBuffer::new();
        assert!(buffer.is_empty());
        buffer.extend::<u8>(&[]);
        assert!(buffer.is_empty());
        assert!(buffer.into_vec().is_empty());
    }
}
