//! Memory-mapped numeric arrays.
//!
//! A [`MappedArray`] exposes a region of a file as a sequence of numbers without
//! copying it. The bytes carry no type information, so the element kind is set by
//! whoever describes the file (see the XDMF `DataItem` attributes).

use std::{
    fs::File, iter::FusedIterator, marker::PhantomData, mem::size_of, ops::Range, path::Path,
    slice::ChunksExact,
};

use bytemuck::Pod;
use memmap2::{Mmap, MmapOptions};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ElementKind {
    #[default]
    Float32,
    Float64,
    Int32,
    Int64,
}

impl ElementKind {
    pub fn size(self) -> usize {
        match self {
            ElementKind::Float32 | ElementKind::Int32 => 4,
            ElementKind::Float64 | ElementKind::Int64 => 8,
        }
    }
}

/// A number that can be read out of a mapped region.
pub trait Element: Pod {
    const KIND: ElementKind;

    fn to_f32(self) -> f32;

    fn to_u32(self) -> u32;
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::Float32;

    fn to_f32(self) -> f32 {
        self
    }

    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Float64;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Int32;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::Int64;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Iterator over the elements of a byte slice. Reads are alignment-agnostic.
pub struct Elements<'a, T> {
    chunks: ChunksExact<'a, u8>,
    _element: PhantomData<T>,
}

impl<'a, T: Element> Elements<'a, T> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            chunks: bytes.chunks_exact(size_of::<T>()),
            _element: PhantomData,
        }
    }
}

impl<T: Element> Iterator for Elements<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.chunks.next().map(bytemuck::pod_read_unaligned)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Element> ExactSizeIterator for Elements<'_, T> {}

impl<T: Element> FusedIterator for Elements<'_, T> {}

/// Receives the elements of a [`MappedArray`] once their concrete type is known.
pub trait ElementVisitor {
    type Output;

    fn visit<T: Element>(self, elements: Elements<'_, T>) -> Self::Output;
}

/// Read-only typed view of a file region.
///
/// Opening never fails: a file that cannot be opened or mapped yields an empty
/// array, and callers treat "no elements" as "no data".
#[derive(Debug)]
pub struct MappedArray {
    map: Option<Mmap>,
    range: Range<usize>,
    kind: ElementKind,
}

impl MappedArray {
    /// Map `span` bytes starting at `offset`. A missing or zero span maps up to the end
    /// of the file. The offset is clamped to the file size.
    pub fn open(path: &Path, offset: u64, span: Option<u64>) -> Self {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Unable to open {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        let file_size = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Unable to stat {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        log::debug!("Mapping {} ({} bytes)", path.display(), file_size);

        let offset = offset.min(file_size);
        let available = file_size - offset;
        let span = match span {
            Some(span) if span > 0 => span.min(available),
            _ => available,
        };
        if span == 0 {
            return Self::empty();
        }

        // SAFETY: the mapping is read-only and only lives as long as this view. The
        // data files are not expected to be modified while an import runs.
        let map = unsafe { MmapOptions::new().offset(offset).len(span as usize).map(&file) };
        match map {
            Ok(map) => {
                let len = map.len();
                Self {
                    map: Some(map),
                    range: 0..len,
                    kind: ElementKind::default(),
                }
            }
            Err(e) => {
                log::warn!("Unable to map {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            map: None,
            range: 0..0,
            kind: ElementKind::default(),
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.map {
            Some(map) => &map[self.range.clone()],
            None => &[],
        }
    }

    pub fn byte_len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Number of whole elements of the current kind.
    pub fn len(&self) -> usize {
        self.byte_len() / self.kind.size()
    }

    /// Narrow the view to exactly `count` elements of the current kind. Never grows
    /// past the mapped region.
    pub fn reset_span(&mut self, count: usize) {
        let bytes = count.saturating_mul(self.kind.size());
        if bytes > self.range.len() {
            log::warn!(
                "Requested {} bytes but only {} are mapped, keeping the mapped size",
                bytes,
                self.range.len()
            );
            return;
        }
        self.range = self.range.start..self.range.start + bytes;
    }

    /// Hand the elements to `visitor` as the concrete type selected by [`Self::kind`].
    pub fn interpret<V: ElementVisitor>(&self, visitor: V) -> V::Output {
        let bytes = self.bytes();
        match self.kind {
            ElementKind::Float32 => visitor.visit(Elements::<f32>::new(bytes)),
            ElementKind::Float64 => visitor.visit(Elements::<f64>::new(bytes)),
            ElementKind::Int32 => visitor.visit(Elements::<i32>::new(bytes)),
            ElementKind::Int64 => visitor.visit(Elements::<i64>::new(bytes)),
        }
    }

    /// Elements grouped by three and converted to `f32`. A trailing partial group is dropped.
    pub fn to_vec3s(&self) -> Vec<[f32; 3]> {
        struct Vec3s;
        impl ElementVisitor for Vec3s {
            type Output = Vec<[f32; 3]>;

            fn visit<T: Element>(self, elements: Elements<'_, T>) -> Self::Output {
                let mut out = Vec::with_capacity(elements.len() / 3);
                let mut elements = elements.map(T::to_f32);
                while let (Some(x), Some(y), Some(z)) =
                    (elements.next(), elements.next(), elements.next())
                {
                    out.push([x, y, z]);
                }
                out
            }
        }
        self.interpret(Vec3s)
    }

    /// Every element converted to `u32`.
    pub fn to_indices(&self) -> Vec<u32> {
        struct Indices;
        impl ElementVisitor for Indices {
            type Output = Vec<u32>;

            fn visit<T: Element>(self, elements: Elements<'_, T>) -> Self::Output {
                elements.map(T::to_u32).collect()
            }
        }
        self.interpret(Indices)
    }
}
