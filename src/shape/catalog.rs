use crate::shape::HarmonicShape;

/// Handle of a shape stored in a [`ShapeCatalog`].
///
/// Shapes are referenced by integer handle rather than by pointer so the
/// catalog can live in shared read-only memory across worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ShapeHandle(u32);

impl ShapeHandle {
    /// The position of this shape inside its catalog.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// An ordered, append-only collection of initialized shapes.
///
/// Built once at startup; never mutated afterwards. Hosts resolve the
/// handles stored per particle to borrow the shared shape data.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ShapeCatalog {
    shapes: Vec<HarmonicShape>,
}

impl ShapeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        ShapeCatalog { shapes: Vec::new() }
    }

    /// Appends a shape and returns its handle.
    pub fn push(&mut self, shape: HarmonicShape) -> ShapeHandle {
        let handle = ShapeHandle(self.shapes.len() as u32);
        self.shapes.push(shape);
        handle
    }

    /// Borrows the shape behind `handle`, if any.
    #[inline]
    pub fn get(&self, handle: ShapeHandle) -> Option<&HarmonicShape> {
        self.shapes.get(handle.index())
    }

    /// The number of registered shapes.
    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the catalog is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates over all registered shapes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HarmonicShape> {
        self.shapes.iter()
    }
}

impl std::ops::Index<ShapeHandle> for ShapeCatalog {
    type Output = HarmonicShape;

    #[inline]
    fn index(&self, handle: ShapeHandle) -> &HarmonicShape {
        &self.shapes[handle.index()]
    }
}
